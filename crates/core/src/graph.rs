use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::images::ImageId;
use crate::shader_nodes::ShaderNodeKind;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u64);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PinId(u64);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LinkId(u64);

/// Node tree of a single material. Nodes, pins and links are owned here and
/// addressed by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShaderGraph {
    nodes: BTreeMap<NodeId, Node>,
    pins: BTreeMap<PinId, Pin>,
    links: BTreeMap<LinkId, Link>,
    active_node: Option<NodeId>,
    next_node_id: u64,
    next_pin_id: u64,
    next_link_id: u64,
}

impl Default for ShaderGraph {
    fn default() -> Self {
        Self {
            nodes: BTreeMap::new(),
            pins: BTreeMap::new(),
            links: BTreeMap::new(),
            active_node: None,
            next_node_id: 1,
            next_pin_id: 1,
            next_link_id: 1,
        }
    }
}

impl ShaderGraph {
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .values()
            .find(|node| node.name == name)
            .map(|node| node.id)
    }

    pub fn nodes_of_kind(&self, kind: ShaderNodeKind) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|node| node.kind == kind)
            .map(|node| node.id)
            .collect()
    }

    pub fn active_node(&self) -> Option<NodeId> {
        self.active_node
    }

    pub fn set_active_node(&mut self, node_id: Option<NodeId>) -> Result<(), GraphError> {
        if let Some(id) = node_id {
            if !self.nodes.contains_key(&id) {
                return Err(GraphError::MissingNode(id));
            }
        }
        self.active_node = node_id;
        Ok(())
    }

    /// Instantiates a node of `kind`. The node takes the kind's default name,
    /// suffixed `.001`, `.002`, ... when that name is already used.
    pub fn add_node(&mut self, kind: ShaderNodeKind) -> NodeId {
        let def = kind.definition();
        let node_id = self.alloc_node_id();
        let mut input_ids = Vec::new();
        let mut output_ids = Vec::new();

        for input in def.inputs {
            let pin_id = self.alloc_pin_id();
            self.pins.insert(
                pin_id,
                Pin {
                    id: pin_id,
                    node: node_id,
                    name: input.name.to_string(),
                    kind: PinKind::Input,
                    socket_type: input.socket_type,
                },
            );
            input_ids.push(pin_id);
        }

        for output in def.outputs {
            let pin_id = self.alloc_pin_id();
            self.pins.insert(
                pin_id,
                Pin {
                    id: pin_id,
                    node: node_id,
                    name: output.name.to_string(),
                    kind: PinKind::Output,
                    socket_type: output.socket_type,
                },
            );
            output_ids.push(pin_id);
        }

        let name = batch_scene::unique_name(def.name, |candidate| {
            self.find_node(candidate).is_some()
        });
        self.nodes.insert(
            node_id,
            Node {
                id: node_id,
                name,
                kind,
                inputs: input_ids,
                outputs: output_ids,
                params: NodeParams::default(),
                position: [0.0, 0.0],
            },
        );

        node_id
    }

    pub fn remove_node(&mut self, node_id: NodeId) -> bool {
        let Some(node) = self.nodes.remove(&node_id) else {
            return false;
        };

        let mut pins_to_remove: HashSet<PinId> = node.inputs.into_iter().collect();
        pins_to_remove.extend(node.outputs);

        self.links.retain(|_, link| {
            !pins_to_remove.contains(&link.from) && !pins_to_remove.contains(&link.to)
        });

        for pin_id in pins_to_remove {
            self.pins.remove(&pin_id);
        }

        if self.active_node == Some(node_id) {
            self.active_node = None;
        }

        true
    }

    pub fn set_node_position(
        &mut self,
        node_id: NodeId,
        position: [f32; 2],
    ) -> Result<(), GraphError> {
        let node = self
            .nodes
            .get_mut(&node_id)
            .ok_or(GraphError::MissingNode(node_id))?;
        node.position = position;
        Ok(())
    }

    pub fn node_position(&self, node_id: NodeId) -> Option<[f32; 2]> {
        self.nodes.get(&node_id).map(|node| node.position)
    }

    pub fn input_pin(&self, node_id: NodeId, name: &str) -> Result<PinId, GraphError> {
        self.find_pin(node_id, name, PinKind::Input)
    }

    pub fn output_pin(&self, node_id: NodeId, name: &str) -> Result<PinId, GraphError> {
        self.find_pin(node_id, name, PinKind::Output)
    }

    fn find_pin(&self, node_id: NodeId, name: &str, kind: PinKind) -> Result<PinId, GraphError> {
        let node = self
            .nodes
            .get(&node_id)
            .ok_or(GraphError::MissingNode(node_id))?;
        let pins = match kind {
            PinKind::Input => &node.inputs,
            PinKind::Output => &node.outputs,
        };
        pins.iter()
            .copied()
            .find(|pin_id| {
                self.pins
                    .get(pin_id)
                    .map(|pin| pin.name == name)
                    .unwrap_or(false)
            })
            .ok_or_else(|| GraphError::MissingSocket {
                node: node_id,
                socket: name.to_string(),
            })
    }

    /// Links an output pin to an input pin. An input holds at most one link;
    /// an existing link into `to` is replaced.
    pub fn add_link(&mut self, from: PinId, to: PinId) -> Result<LinkId, GraphError> {
        let from_pin = self.pins.get(&from).ok_or(GraphError::MissingPin(from))?;
        let to_pin = self.pins.get(&to).ok_or(GraphError::MissingPin(to))?;

        if from_pin.kind != PinKind::Output || to_pin.kind != PinKind::Input {
            return Err(GraphError::WrongPinDirection { from, to });
        }

        if !socket_types_compatible(from_pin.socket_type, to_pin.socket_type) {
            return Err(GraphError::IncompatibleSockets {
                from: from_pin.socket_type,
                to: to_pin.socket_type,
            });
        }

        self.links.retain(|_, link| link.to != to);

        let link_id = self.alloc_link_id();
        self.links.insert(
            link_id,
            Link {
                id: link_id,
                from,
                to,
            },
        );
        Ok(link_id)
    }

    /// Links `from_node.output` to `to_node.input` by socket name.
    pub fn connect(
        &mut self,
        from_node: NodeId,
        output: &str,
        to_node: NodeId,
        input: &str,
    ) -> Result<LinkId, GraphError> {
        let from = self.output_pin(from_node, output)?;
        let to = self.input_pin(to_node, input)?;
        self.add_link(from, to)
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Returns the node and output socket name feeding `node.input`, if any.
    pub fn linked_source(&self, node_id: NodeId, input: &str) -> Option<(NodeId, &str)> {
        let to = self.input_pin(node_id, input).ok()?;
        let link = self.links.values().find(|link| link.to == to)?;
        let pin = self.pins.get(&link.from)?;
        Some((pin.node, pin.name.as_str()))
    }

    /// Stores the default value of an input socket, or a node setting such as
    /// an image or blend mode.
    pub fn set_param(
        &mut self,
        node_id: NodeId,
        key: impl Into<String>,
        value: ParamValue,
    ) -> Result<(), GraphError> {
        let node = self
            .nodes
            .get_mut(&node_id)
            .ok_or(GraphError::MissingNode(node_id))?;
        node.params.values.insert(key.into(), value);
        Ok(())
    }

    fn alloc_node_id(&mut self) -> NodeId {
        let id = self.next_node_id;
        self.next_node_id += 1;
        NodeId(id)
    }

    fn alloc_pin_id(&mut self) -> PinId {
        let id = self.next_pin_id;
        self.next_pin_id += 1;
        PinId(id)
    }

    fn alloc_link_id(&mut self) -> LinkId {
        let id = self.next_link_id;
        self.next_link_id += 1;
        LinkId(id)
    }
}

/// Data sockets convert implicitly between each other; shader sockets only
/// connect to shader sockets.
fn socket_types_compatible(from: SocketType, to: SocketType) -> bool {
    match (from, to) {
        (SocketType::Shader, SocketType::Shader) => true,
        (SocketType::Shader, _) | (_, SocketType::Shader) => false,
        _ => true,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub kind: ShaderNodeKind,
    pub inputs: Vec<PinId>,
    pub outputs: Vec<PinId>,
    pub params: NodeParams,
    #[serde(default)]
    pub position: [f32; 2],
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NodeParams {
    pub values: BTreeMap<String, ParamValue>,
}

impl NodeParams {
    pub fn get_float(&self, key: &str, default: f32) -> f32 {
        self.values
            .get(key)
            .and_then(|value| match value {
                ParamValue::Float(v) => Some(*v),
                _ => None,
            })
            .unwrap_or(default)
    }

    pub fn get_color(&self, key: &str, default: [f32; 4]) -> [f32; 4] {
        self.values
            .get(key)
            .and_then(|value| match value {
                ParamValue::Color(v) => Some(*v),
                _ => None,
            })
            .unwrap_or(default)
    }

    pub fn get_string<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.values
            .get(key)
            .and_then(|value| match value {
                ParamValue::String(v) => Some(v.as_str()),
                _ => None,
            })
            .unwrap_or(default)
    }

    pub fn get_image(&self, key: &str) -> Option<ImageId> {
        self.values.get(key).and_then(|value| match value {
            ParamValue::Image(id) => Some(*id),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ParamValue {
    Float(f32),
    Color([f32; 4]),
    String(String),
    Image(ImageId),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SocketType {
    Color,
    Float,
    Vector,
    Shader,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PinKind {
    Input,
    Output,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pin {
    pub id: PinId,
    pub node: NodeId,
    pub name: String,
    pub kind: PinKind,
    pub socket_type: SocketType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    pub id: LinkId,
    pub from: PinId,
    pub to: PinId,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum GraphError {
    #[error("node {0:?} does not exist")]
    MissingNode(NodeId),
    #[error("pin {0:?} does not exist")]
    MissingPin(PinId),
    #[error("node {node:?} has no socket named {socket:?}")]
    MissingSocket { node: NodeId, socket: String },
    #[error("link {from:?} -> {to:?} must run from an output to an input")]
    WrongPinDirection { from: PinId, to: PinId },
    #[error("cannot link a {from:?} socket to a {to:?} socket")]
    IncompatibleSockets { from: SocketType, to: SocketType },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_remove_node() {
        let mut graph = ShaderGraph::default();
        let node_id = graph.add_node(ShaderNodeKind::Invert);
        assert!(graph.node(node_id).is_some());
        assert!(graph.remove_node(node_id));
        assert!(graph.node(node_id).is_none());
        assert_eq!(graph.link_count(), 0);
    }

    #[test]
    fn duplicate_names_get_suffixes() {
        let mut graph = ShaderGraph::default();
        let a = graph.add_node(ShaderNodeKind::ImageTexture);
        let b = graph.add_node(ShaderNodeKind::ImageTexture);
        let c = graph.add_node(ShaderNodeKind::ImageTexture);
        assert_eq!(graph.node(a).unwrap().name, "Image Texture");
        assert_eq!(graph.node(b).unwrap().name, "Image Texture.001");
        assert_eq!(graph.node(c).unwrap().name, "Image Texture.002");
    }

    #[test]
    fn rejects_shader_into_data_socket() {
        let mut graph = ShaderGraph::default();
        let bsdf = graph.add_node(ShaderNodeKind::PrincipledBsdf);
        let invert = graph.add_node(ShaderNodeKind::Invert);
        let result = graph.connect(bsdf, "BSDF", invert, "Color");
        assert!(matches!(result, Err(GraphError::IncompatibleSockets { .. })));
    }

    #[test]
    fn rejects_input_to_input() {
        let mut graph = ShaderGraph::default();
        let a = graph.add_node(ShaderNodeKind::Invert);
        let b = graph.add_node(ShaderNodeKind::Invert);
        let from = graph.input_pin(a, "Color").unwrap();
        let to = graph.input_pin(b, "Color").unwrap();
        assert!(matches!(
            graph.add_link(from, to),
            Err(GraphError::WrongPinDirection { .. })
        ));
    }

    #[test]
    fn relinking_an_input_replaces_the_old_link() {
        let mut graph = ShaderGraph::default();
        let first = graph.add_node(ShaderNodeKind::ImageTexture);
        let second = graph.add_node(ShaderNodeKind::ImageTexture);
        let bsdf = graph.add_node(ShaderNodeKind::PrincipledBsdf);

        graph.connect(first, "Color", bsdf, "Base Color").unwrap();
        graph.connect(second, "Color", bsdf, "Base Color").unwrap();

        assert_eq!(graph.link_count(), 1);
        assert_eq!(graph.linked_source(bsdf, "Base Color"), Some((second, "Color")));
    }

    #[test]
    fn unknown_socket_is_reported() {
        let mut graph = ShaderGraph::default();
        let invert = graph.add_node(ShaderNodeKind::Invert);
        assert!(matches!(
            graph.input_pin(invert, "Height"),
            Err(GraphError::MissingSocket { .. })
        ));
    }
}
