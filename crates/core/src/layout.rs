use std::collections::BTreeMap;

use crate::classify::TextureRole;
use crate::graph::{GraphError, NodeId, ShaderGraph};

pub const X_OFFSET: f32 = 400.0;
pub const Y_OFFSET: f32 = 300.0;

/// Top-to-bottom order of the sampler column.
pub const PLACEMENT_ORDER: [TextureRole; 11] = [
    TextureRole::BaseColor,
    TextureRole::Ao,
    TextureRole::Metallic,
    TextureRole::Roughness,
    TextureRole::Glossy,
    TextureRole::Opacity,
    TextureRole::Normal,
    TextureRole::Bump,
    TextureRole::Specular,
    TextureRole::Displacement,
    TextureRole::Emissive,
];

/// Combinator and converter nodes sitting between a sampler and the anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SecondaryNode {
    MixAo,
    InvertGloss,
    NormalMap,
    Displacement,
}

impl SecondaryNode {
    pub const ALL: [SecondaryNode; 4] = [
        SecondaryNode::MixAo,
        SecondaryNode::InvertGloss,
        SecondaryNode::NormalMap,
        SecondaryNode::Displacement,
    ];

    /// The sampler this node is aligned with.
    pub fn source_role(self) -> TextureRole {
        match self {
            SecondaryNode::MixAo => TextureRole::Ao,
            SecondaryNode::InvertGloss => TextureRole::Glossy,
            SecondaryNode::NormalMap => TextureRole::Normal,
            SecondaryNode::Displacement => TextureRole::Displacement,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TertiaryNode {
    Bump,
}

impl TertiaryNode {
    pub const ALL: [TertiaryNode; 1] = [TertiaryNode::Bump];

    pub fn source_role(self) -> TextureRole {
        match self {
            TertiaryNode::Bump => TextureRole::Bump,
        }
    }
}

pub trait TierKey: Copy + Ord + std::fmt::Debug + 'static {
    const KEYS: &'static [Self];
}

impl TierKey for TextureRole {
    const KEYS: &'static [Self] = &TextureRole::ALL;
}

impl TierKey for SecondaryNode {
    const KEYS: &'static [Self] = &SecondaryNode::ALL;
}

impl TierKey for TertiaryNode {
    const KEYS: &'static [Self] = &TertiaryNode::ALL;
}

/// One tier of synthesized nodes. Every key of the tier is present; keys
/// whose node was not instantiated hold `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct TierMap<K: TierKey> {
    slots: BTreeMap<K, Option<NodeId>>,
}

impl<K: TierKey> Default for TierMap<K> {
    fn default() -> Self {
        Self {
            slots: K::KEYS.iter().map(|key| (*key, None)).collect(),
        }
    }
}

impl<K: TierKey> TierMap<K> {
    pub fn set(&mut self, key: K, node: NodeId) {
        self.slots.insert(key, Some(node));
    }

    pub fn get(&self, key: K) -> Option<NodeId> {
        self.slots.get(&key).copied().flatten()
    }

    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.slots.keys().copied()
    }

    pub fn count(&self) -> usize {
        self.slots.values().filter(|slot| slot.is_some()).count()
    }

    pub fn any(&self) -> bool {
        self.count() > 0
    }
}

pub type PrimaryNodes = TierMap<TextureRole>;
pub type SecondaryNodes = TierMap<SecondaryNode>;
pub type TertiaryNodes = TierMap<TertiaryNode>;

/// Places samplers in one column left of the anchor, then secondary and
/// tertiary stages in the columns between the samplers and the anchor.
pub fn layout(
    graph: &mut ShaderGraph,
    primary: &PrimaryNodes,
    secondary: &SecondaryNodes,
    tertiary: &TertiaryNodes,
    anchor: NodeId,
) -> Result<(), GraphError> {
    let [anchor_x, anchor_y] = graph
        .node_position(anchor)
        .ok_or(GraphError::MissingNode(anchor))?;

    let mut tier_count = 1.0;
    if secondary.any() {
        tier_count += 1.0;
    }
    if tertiary.any() {
        tier_count += 1.0;
    }

    let primary_x = anchor_x - X_OFFSET * tier_count;
    let placed: Vec<NodeId> = PLACEMENT_ORDER
        .iter()
        .filter_map(|role| primary.get(*role))
        .collect();
    let half_span = Y_OFFSET * (placed.len() as f32 - 1.0) / 2.0;
    for (index, node) in placed.iter().enumerate() {
        let y = anchor_y - Y_OFFSET * index as f32 + half_span;
        graph.set_node_position(*node, [primary_x, y])?;
    }

    let tertiary_x = primary_x + X_OFFSET * (tier_count - 1.0);
    for key in tertiary.keys() {
        let Some(node) = tertiary.get(key) else {
            continue;
        };
        let Some(source_y) = sampler_y(graph, primary, key.source_role()) else {
            tracing::debug!("no {:?} sampler to align {key:?} with", key.source_role());
            continue;
        };
        graph.set_node_position(node, [tertiary_x, source_y])?;
    }

    let secondary_x = primary_x + X_OFFSET;
    for key in secondary.keys() {
        let Some(node) = secondary.get(key) else {
            continue;
        };
        let Some(source_y) = sampler_y(graph, primary, key.source_role()) else {
            tracing::debug!("no {:?} sampler to align {key:?} with", key.source_role());
            continue;
        };
        let y = match key {
            SecondaryNode::MixAo => source_y + Y_OFFSET / 1.5,
            _ => source_y,
        };
        graph.set_node_position(node, [secondary_x, y])?;
    }

    Ok(())
}

fn sampler_y(graph: &ShaderGraph, primary: &PrimaryNodes, role: TextureRole) -> Option<f32> {
    primary
        .get(role)
        .and_then(|node| graph.node_position(node))
        .map(|[_, y]| y)
}
