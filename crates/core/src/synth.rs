use std::collections::BTreeMap;

use crate::classify::TextureRole;
use crate::graph::{GraphError, NodeId, ParamValue, ShaderGraph};
use crate::images::{ColorSpace, ImageId, ImageLibrary};
use crate::layout::{self, PrimaryNodes, SecondaryNode, SecondaryNodes, TertiaryNode, TertiaryNodes};
use crate::settings::FeatureToggles;
use crate::shader_nodes::{
    setting, socket, ShaderNodeKind, MATERIAL_OUTPUT_NAME, PRINCIPLED_BSDF_NAME,
};

/// Images found for one material, at most one per role.
pub type TextureSet = BTreeMap<TextureRole, ImageId>;

#[derive(Debug, thiserror::Error)]
pub enum SynthError {
    #[error("material graph has no {0:?} node")]
    MissingAnchorNode(&'static str),
    #[error(transparent)]
    Graph(#[from] GraphError),
}

#[derive(Debug, Clone)]
pub struct SynthesisReport {
    pub primary: PrimaryNodes,
    pub secondary: SecondaryNodes,
    pub tertiary: TertiaryNodes,
    /// Roles present in the texture set that produced no sampler.
    pub skipped: Vec<TextureRole>,
}

impl SynthesisReport {
    pub fn sampler_count(&self) -> usize {
        self.primary.count()
    }
}

#[derive(Debug, Clone, Copy)]
struct Presence {
    has_roughness: bool,
    has_glossy: bool,
    has_diffuse: bool,
    has_ao: bool,
    has_normal: bool,
    has_bump: bool,
    has_displacement: bool,
}

impl Presence {
    fn new(textures: &TextureSet, toggles: &FeatureToggles) -> Self {
        let wired = |role: TextureRole| textures.contains_key(&role) && toggles.enabled(role);
        Self {
            has_roughness: textures.contains_key(&TextureRole::Roughness),
            has_glossy: wired(TextureRole::Glossy),
            has_diffuse: wired(TextureRole::BaseColor),
            has_ao: wired(TextureRole::Ao),
            has_normal: wired(TextureRole::Normal),
            has_bump: wired(TextureRole::Bump),
            has_displacement: wired(TextureRole::Displacement),
        }
    }
}

/// An input socket on one of the nodes the synthesizer knows about.
#[derive(Debug, Clone, Copy)]
enum Target {
    Principled(&'static str),
    Output(&'static str),
    Secondary(SecondaryNode, &'static str),
    Tertiary(TertiaryNode, &'static str),
}

#[derive(Debug, Clone, Copy)]
enum Stage {
    Secondary(SecondaryNode),
    Tertiary(TertiaryNode),
}

/// Link from a combinator's output onward, made after its sampler is wired.
struct StageLink {
    from: Stage,
    output: &'static str,
    to: fn(&Presence) -> Target,
}

struct RoleWiring {
    applies: fn(&Presence) -> bool,
    sampler_input: fn(&Presence) -> Target,
    stage_link: Option<StageLink>,
    principled_defaults: &'static [(&'static str, f32)],
}

fn always(_: &Presence) -> bool {
    true
}

fn direct(sampler_input: fn(&Presence) -> Target) -> RoleWiring {
    RoleWiring {
        applies: always,
        sampler_input,
        stage_link: None,
        principled_defaults: &[],
    }
}

fn wiring(role: TextureRole) -> RoleWiring {
    match role {
        TextureRole::BaseColor => RoleWiring {
            applies: always,
            sampler_input: |p| {
                if p.has_ao {
                    Target::Secondary(SecondaryNode::MixAo, socket::COLOR1)
                } else {
                    Target::Principled(socket::BASE_COLOR)
                }
            },
            stage_link: None,
            principled_defaults: &[],
        },
        TextureRole::Ao => RoleWiring {
            applies: |p| p.has_diffuse,
            sampler_input: |_| Target::Secondary(SecondaryNode::MixAo, socket::COLOR2),
            stage_link: Some(StageLink {
                from: Stage::Secondary(SecondaryNode::MixAo),
                output: socket::COLOR,
                to: |_| Target::Principled(socket::BASE_COLOR),
            }),
            principled_defaults: &[],
        },
        TextureRole::Metallic => direct(|_| Target::Principled(socket::METALLIC)),
        TextureRole::Roughness => direct(|_| Target::Principled(socket::ROUGHNESS)),
        TextureRole::Glossy => RoleWiring {
            applies: |p| !p.has_roughness,
            sampler_input: |_| Target::Secondary(SecondaryNode::InvertGloss, socket::COLOR),
            stage_link: Some(StageLink {
                from: Stage::Secondary(SecondaryNode::InvertGloss),
                output: socket::COLOR,
                to: |_| Target::Principled(socket::ROUGHNESS),
            }),
            principled_defaults: &[],
        },
        TextureRole::Specular => direct(|_| Target::Principled(socket::SPECULAR_IOR_LEVEL)),
        TextureRole::Displacement => RoleWiring {
            applies: always,
            sampler_input: |_| Target::Secondary(SecondaryNode::Displacement, socket::HEIGHT),
            stage_link: Some(StageLink {
                from: Stage::Secondary(SecondaryNode::Displacement),
                output: socket::DISPLACEMENT,
                to: |_| Target::Output(socket::DISPLACEMENT),
            }),
            principled_defaults: &[],
        },
        TextureRole::Opacity => direct(|_| Target::Principled(socket::ALPHA)),
        TextureRole::Bump => RoleWiring {
            applies: always,
            sampler_input: |_| Target::Tertiary(TertiaryNode::Bump, socket::HEIGHT),
            stage_link: Some(StageLink {
                from: Stage::Tertiary(TertiaryNode::Bump),
                output: socket::NORMAL,
                to: |_| Target::Principled(socket::NORMAL),
            }),
            principled_defaults: &[],
        },
        TextureRole::Normal => RoleWiring {
            applies: always,
            sampler_input: |_| Target::Secondary(SecondaryNode::NormalMap, socket::COLOR),
            stage_link: Some(StageLink {
                from: Stage::Secondary(SecondaryNode::NormalMap),
                output: socket::NORMAL,
                to: |p| {
                    if p.has_bump {
                        Target::Tertiary(TertiaryNode::Bump, socket::NORMAL)
                    } else {
                        Target::Principled(socket::NORMAL)
                    }
                },
            }),
            principled_defaults: &[],
        },
        TextureRole::Emissive => RoleWiring {
            applies: always,
            sampler_input: |_| Target::Principled(socket::EMISSION_COLOR),
            stage_link: None,
            principled_defaults: &[(socket::EMISSION_STRENGTH, 1.0)],
        },
    }
}

struct Nodes {
    principled: NodeId,
    output: NodeId,
    primary: PrimaryNodes,
    secondary: SecondaryNodes,
    tertiary: TertiaryNodes,
}

impl Nodes {
    fn stage(&self, stage: Stage) -> Option<NodeId> {
        match stage {
            Stage::Secondary(key) => self.secondary.get(key),
            Stage::Tertiary(key) => self.tertiary.get(key),
        }
    }

    fn resolve(&self, target: Target) -> Option<(NodeId, &'static str)> {
        match target {
            Target::Principled(input) => Some((self.principled, input)),
            Target::Output(input) => Some((self.output, input)),
            Target::Secondary(key, input) => self.secondary.get(key).map(|node| (node, input)),
            Target::Tertiary(key, input) => self.tertiary.get(key).map(|node| (node, input)),
        }
    }
}

/// Builds image samplers and combinator nodes for `textures` inside `graph`,
/// links them into the Principled BSDF and arranges them in columns.
///
/// Every call appends a fresh set of nodes; existing samplers are left alone.
pub fn synthesize(
    graph: &mut ShaderGraph,
    images: &mut ImageLibrary,
    textures: &TextureSet,
    toggles: &FeatureToggles,
) -> Result<SynthesisReport, SynthError> {
    let principled = graph
        .find_node(PRINCIPLED_BSDF_NAME)
        .ok_or(SynthError::MissingAnchorNode(PRINCIPLED_BSDF_NAME))?;
    let output = graph
        .find_node(MATERIAL_OUTPUT_NAME)
        .ok_or(SynthError::MissingAnchorNode(MATERIAL_OUTPUT_NAME))?;

    let presence = Presence::new(textures, toggles);
    let mut nodes = Nodes {
        principled,
        output,
        primary: PrimaryNodes::default(),
        secondary: SecondaryNodes::default(),
        tertiary: TertiaryNodes::default(),
    };
    create_stage_nodes(graph, &presence, toggles, &mut nodes)?;

    let mut skipped = Vec::new();
    for (&role, &image) in textures {
        if !role.is_color_data() {
            images.set_colorspace(image, ColorSpace::NonColor);
        }

        let wiring = wiring(role);
        if !toggles.enabled(role) || !(wiring.applies)(&presence) {
            skipped.push(role);
            continue;
        }
        let Some((to_node, input)) = nodes.resolve((wiring.sampler_input)(&presence)) else {
            tracing::warn!("no node to receive the {role:?} sampler");
            skipped.push(role);
            continue;
        };

        let sampler = graph.add_node(ShaderNodeKind::ImageTexture);
        graph.set_param(sampler, setting::IMAGE, ParamValue::Image(image))?;
        graph.connect(sampler, socket::COLOR, to_node, input)?;
        nodes.primary.set(role, sampler);
        if role == TextureRole::BaseColor {
            graph.set_active_node(Some(sampler))?;
        }

        if let Some(link) = &wiring.stage_link {
            let from = nodes.stage(link.from);
            let to = nodes.resolve((link.to)(&presence));
            if let (Some(from), Some((to_node, input))) = (from, to) {
                graph.connect(from, link.output, to_node, input)?;
            }
        }
        for (input, value) in wiring.principled_defaults {
            graph.set_param(principled, *input, ParamValue::Float(*value))?;
        }
        tracing::debug!("wired {role:?} sampler {sampler:?} into {input}");
    }

    layout::layout(
        graph,
        &nodes.primary,
        &nodes.secondary,
        &nodes.tertiary,
        principled,
    )?;

    Ok(SynthesisReport {
        primary: nodes.primary,
        secondary: nodes.secondary,
        tertiary: nodes.tertiary,
        skipped,
    })
}

fn create_stage_nodes(
    graph: &mut ShaderGraph,
    presence: &Presence,
    toggles: &FeatureToggles,
    nodes: &mut Nodes,
) -> Result<(), GraphError> {
    if presence.has_normal {
        let node = graph.add_node(ShaderNodeKind::NormalMap);
        graph.set_param(node, socket::STRENGTH, ParamValue::Float(toggles.normal_strength))?;
        nodes.secondary.set(SecondaryNode::NormalMap, node);
    }
    if presence.has_bump {
        let node = graph.add_node(ShaderNodeKind::Bump);
        graph.set_param(node, socket::DISTANCE, ParamValue::Float(toggles.bump_distance))?;
        nodes.tertiary.set(TertiaryNode::Bump, node);
    }
    if presence.has_displacement {
        let node = graph.add_node(ShaderNodeKind::Displacement);
        graph.set_param(node, socket::SCALE, ParamValue::Float(toggles.displacement_scale))?;
        nodes.secondary.set(SecondaryNode::Displacement, node);
    }
    if presence.has_glossy && !presence.has_roughness {
        let node = graph.add_node(ShaderNodeKind::Invert);
        nodes.secondary.set(SecondaryNode::InvertGloss, node);
    }
    if presence.has_ao && presence.has_diffuse {
        let node = graph.add_node(ShaderNodeKind::MixRgb);
        graph.set_param(
            node,
            setting::BLEND_TYPE,
            ParamValue::String(setting::BLEND_MULTIPLY.to_string()),
        )?;
        graph.set_param(node, socket::FAC, ParamValue::Float(toggles.ao_factor))?;
        nodes.secondary.set(SecondaryNode::MixAo, node);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::layout::{PLACEMENT_ORDER, Y_OFFSET};
    use crate::material::Material;

    fn texture_set(images: &mut ImageLibrary, roles: &[TextureRole]) -> TextureSet {
        roles
            .iter()
            .map(|role| {
                let file = format!("asset_{}.png", role.synonyms()[0]);
                (*role, images.load(Path::new(&file), None))
            })
            .collect()
    }

    fn run(roles: &[TextureRole], toggles: &FeatureToggles) -> (Material, ImageLibrary, SynthesisReport) {
        let mut material = Material::new("Asset".to_string()).unwrap();
        let mut images = ImageLibrary::default();
        let textures = texture_set(&mut images, roles);
        let report = synthesize(&mut material.graph, &mut images, &textures, toggles).unwrap();
        (material, images, report)
    }

    fn anchors(graph: &ShaderGraph) -> (NodeId, NodeId) {
        (
            graph.find_node(PRINCIPLED_BSDF_NAME).unwrap(),
            graph.find_node(MATERIAL_OUTPUT_NAME).unwrap(),
        )
    }

    fn count(graph: &ShaderGraph, kind: ShaderNodeKind) -> usize {
        graph.nodes_of_kind(kind).len()
    }

    #[test]
    fn rock_folder_gets_color_roughness_and_normal() {
        let (material, _, report) = run(
            &[TextureRole::BaseColor, TextureRole::Roughness, TextureRole::Normal],
            &FeatureToggles::default(),
        );
        let graph = &material.graph;
        let (bsdf, _) = anchors(graph);

        assert_eq!(report.sampler_count(), 3);
        assert_eq!(count(graph, ShaderNodeKind::ImageTexture), 3);
        assert_eq!(count(graph, ShaderNodeKind::NormalMap), 1);
        for kind in [
            ShaderNodeKind::MixRgb,
            ShaderNodeKind::Invert,
            ShaderNodeKind::Bump,
            ShaderNodeKind::Displacement,
        ] {
            assert_eq!(count(graph, kind), 0, "{kind:?}");
        }

        let base = report.primary.get(TextureRole::BaseColor).unwrap();
        let rough = report.primary.get(TextureRole::Roughness).unwrap();
        let normal = report.primary.get(TextureRole::Normal).unwrap();
        let normal_map = report.secondary.get(SecondaryNode::NormalMap).unwrap();
        assert_eq!(graph.linked_source(bsdf, socket::BASE_COLOR), Some((base, socket::COLOR)));
        assert_eq!(graph.linked_source(bsdf, socket::ROUGHNESS), Some((rough, socket::COLOR)));
        assert_eq!(graph.linked_source(normal_map, socket::COLOR), Some((normal, socket::COLOR)));
        assert_eq!(graph.linked_source(bsdf, socket::NORMAL), Some((normal_map, socket::NORMAL)));
        assert_eq!(graph.active_node(), Some(base));
    }

    #[test]
    fn data_maps_are_non_color() {
        let (_, images, _) = run(
            &[TextureRole::BaseColor, TextureRole::Normal, TextureRole::Bump, TextureRole::Emissive],
            &FeatureToggles::default(),
        );
        let space = |file: &str| images.get(images.find(Path::new(file)).unwrap()).unwrap().colorspace;
        assert_eq!(space("asset_basecolor.png"), ColorSpace::Srgb);
        assert_eq!(space("asset_emissive.png"), ColorSpace::Srgb);
        assert_eq!(space("asset_normal.png"), ColorSpace::NonColor);
        // bump is off by default but still tagged
        assert_eq!(space("asset_bump.png"), ColorSpace::NonColor);
    }

    #[test]
    fn ambient_occlusion_multiplies_base_color() {
        let (material, _, report) = run(
            &[TextureRole::BaseColor, TextureRole::Ao],
            &FeatureToggles::default(),
        );
        let graph = &material.graph;
        let (bsdf, _) = anchors(graph);
        let base = report.primary.get(TextureRole::BaseColor).unwrap();
        let ao = report.primary.get(TextureRole::Ao).unwrap();
        let mix = report.secondary.get(SecondaryNode::MixAo).unwrap();

        assert_eq!(graph.linked_source(mix, socket::COLOR1), Some((base, socket::COLOR)));
        assert_eq!(graph.linked_source(mix, socket::COLOR2), Some((ao, socket::COLOR)));
        assert_eq!(graph.linked_source(bsdf, socket::BASE_COLOR), Some((mix, socket::COLOR)));
        let params = &graph.node(mix).unwrap().params;
        assert_eq!(params.get_string(setting::BLEND_TYPE, ""), setting::BLEND_MULTIPLY);
        assert_eq!(params.get_float(socket::FAC, 0.0), 1.0);
    }

    #[test]
    fn ambient_occlusion_alone_is_skipped() {
        let (material, _, report) = run(&[TextureRole::Ao], &FeatureToggles::default());
        assert_eq!(report.sampler_count(), 0);
        assert_eq!(report.skipped, vec![TextureRole::Ao]);
        assert_eq!(count(&material.graph, ShaderNodeKind::MixRgb), 0);
    }

    #[test]
    fn scalar_maps_feed_their_principled_inputs() {
        let toggles = FeatureToggles {
            use_specular: true,
            ..FeatureToggles::default()
        };
        let (material, _, report) = run(
            &[TextureRole::Metallic, TextureRole::Specular, TextureRole::Opacity],
            &toggles,
        );
        let graph = &material.graph;
        let (bsdf, _) = anchors(graph);
        let metallic = report.primary.get(TextureRole::Metallic).unwrap();
        let specular = report.primary.get(TextureRole::Specular).unwrap();
        let opacity = report.primary.get(TextureRole::Opacity).unwrap();

        assert_eq!(graph.linked_source(bsdf, socket::METALLIC), Some((metallic, socket::COLOR)));
        assert_eq!(
            graph.linked_source(bsdf, socket::SPECULAR_IOR_LEVEL),
            Some((specular, socket::COLOR))
        );
        assert_eq!(graph.linked_source(bsdf, socket::ALPHA), Some((opacity, socket::COLOR)));
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn specular_is_off_by_default() {
        let (material, _, report) = run(
            &[TextureRole::Metallic, TextureRole::Specular],
            &FeatureToggles::default(),
        );
        let graph = &material.graph;
        let (bsdf, _) = anchors(graph);
        assert_eq!(report.primary.get(TextureRole::Specular), None);
        assert_eq!(report.skipped, vec![TextureRole::Specular]);
        assert_eq!(graph.linked_source(bsdf, socket::SPECULAR_IOR_LEVEL), None);
        assert_eq!(count(graph, ShaderNodeKind::ImageTexture), 1);
    }

    #[test]
    fn every_role_lands_in_placement_order() {
        let toggles = FeatureToggles {
            use_bump: true,
            use_displacement: true,
            use_specular: true,
            ..FeatureToggles::default()
        };
        let (material, _, report) = run(&TextureRole::ALL, &toggles);
        let graph = &material.graph;

        // glossy is dropped in favour of roughness
        assert_eq!(report.sampler_count(), 10);
        assert_eq!(report.skipped, vec![TextureRole::Glossy]);

        let placed: Vec<[f32; 2]> = PLACEMENT_ORDER
            .iter()
            .filter_map(|role| report.primary.get(*role))
            .map(|node| graph.node_position(node).unwrap())
            .collect();
        assert_eq!(placed.len(), 10);
        for pair in placed.windows(2) {
            assert_eq!(pair[0][0], pair[1][0]);
            assert_eq!(pair[0][1] - pair[1][1], Y_OFFSET);
        }
    }

    #[test]
    fn glossy_is_inverted_into_roughness() {
        let (material, _, report) = run(&[TextureRole::Glossy], &FeatureToggles::default());
        let graph = &material.graph;
        let (bsdf, _) = anchors(graph);
        let gloss = report.primary.get(TextureRole::Glossy).unwrap();
        let invert = report.secondary.get(SecondaryNode::InvertGloss).unwrap();
        assert_eq!(graph.linked_source(invert, socket::COLOR), Some((gloss, socket::COLOR)));
        assert_eq!(graph.linked_source(bsdf, socket::ROUGHNESS), Some((invert, socket::COLOR)));
    }

    #[test]
    fn roughness_wins_over_glossy() {
        let (material, _, report) = run(
            &[TextureRole::Roughness, TextureRole::Glossy],
            &FeatureToggles::default(),
        );
        assert_eq!(count(&material.graph, ShaderNodeKind::Invert), 0);
        assert_eq!(report.primary.get(TextureRole::Glossy), None);
        assert_eq!(report.skipped, vec![TextureRole::Glossy]);
    }

    #[test]
    fn normal_feeds_bump_when_both_enabled() {
        let toggles = FeatureToggles {
            use_bump: true,
            bump_distance: 0.2,
            ..FeatureToggles::default()
        };
        let (material, _, report) = run(&[TextureRole::Normal, TextureRole::Bump], &toggles);
        let graph = &material.graph;
        let (bsdf, _) = anchors(graph);
        let bump_sampler = report.primary.get(TextureRole::Bump).unwrap();
        let normal_map = report.secondary.get(SecondaryNode::NormalMap).unwrap();
        let bump = report.tertiary.get(TertiaryNode::Bump).unwrap();

        assert_eq!(graph.linked_source(bump, socket::HEIGHT), Some((bump_sampler, socket::COLOR)));
        assert_eq!(graph.linked_source(bump, socket::NORMAL), Some((normal_map, socket::NORMAL)));
        assert_eq!(graph.linked_source(bsdf, socket::NORMAL), Some((bump, socket::NORMAL)));
        assert_eq!(graph.node(bump).unwrap().params.get_float(socket::DISTANCE, 0.0), 0.2);
    }

    #[test]
    fn displacement_drives_material_output() {
        let toggles = FeatureToggles {
            use_displacement: true,
            ..FeatureToggles::default()
        };
        let (material, _, report) = run(&[TextureRole::Displacement], &toggles);
        let graph = &material.graph;
        let (_, output) = anchors(graph);
        let disp = report.secondary.get(SecondaryNode::Displacement).unwrap();
        assert_eq!(
            graph.linked_source(output, socket::DISPLACEMENT),
            Some((disp, socket::DISPLACEMENT))
        );
        assert_eq!(graph.node(disp).unwrap().params.get_float(socket::SCALE, 0.0), 0.1);
    }

    #[test]
    fn emissive_sets_emission_color_and_strength() {
        let (material, _, report) = run(&[TextureRole::Emissive], &FeatureToggles::default());
        let graph = &material.graph;
        let (bsdf, _) = anchors(graph);
        let emit = report.primary.get(TextureRole::Emissive).unwrap();
        assert_eq!(graph.linked_source(bsdf, socket::EMISSION_COLOR), Some((emit, socket::COLOR)));
        assert_eq!(
            graph.node(bsdf).unwrap().params.get_float(socket::EMISSION_STRENGTH, 0.0),
            1.0
        );
    }

    #[test]
    fn disabled_roles_create_nothing() {
        let toggles = FeatureToggles {
            use_diffuse: false,
            use_normal: false,
            ..FeatureToggles::default()
        };
        let (material, _, report) = run(
            &[TextureRole::BaseColor, TextureRole::Ao, TextureRole::Normal],
            &toggles,
        );
        assert_eq!(report.sampler_count(), 0);
        assert_eq!(material.graph.node_count(), 2);
        assert_eq!(material.graph.active_node(), None);
    }

    #[test]
    fn second_run_appends_another_set() {
        let mut material = Material::new("Asset".to_string()).unwrap();
        let mut images = ImageLibrary::default();
        let textures = texture_set(&mut images, &[TextureRole::BaseColor, TextureRole::Metallic]);
        let toggles = FeatureToggles::default();

        synthesize(&mut material.graph, &mut images, &textures, &toggles).unwrap();
        assert_eq!(count(&material.graph, ShaderNodeKind::ImageTexture), 2);
        let second = synthesize(&mut material.graph, &mut images, &textures, &toggles).unwrap();
        assert_eq!(count(&material.graph, ShaderNodeKind::ImageTexture), 4);
        assert_eq!(images.len(), 2);

        let (bsdf, _) = anchors(&material.graph);
        let base = second.primary.get(TextureRole::BaseColor).unwrap();
        assert_eq!(
            material.graph.linked_source(bsdf, socket::BASE_COLOR),
            Some((base, socket::COLOR))
        );
    }

    #[test]
    fn layout_is_deterministic() {
        let roles = [
            TextureRole::BaseColor,
            TextureRole::Ao,
            TextureRole::Normal,
            TextureRole::Glossy,
        ];
        let (first, _, _) = run(&roles, &FeatureToggles::default());
        let (second, _, _) = run(&roles, &FeatureToggles::default());
        let positions = |material: &Material| {
            material
                .graph
                .nodes()
                .map(|node| (node.name.clone(), node.position))
                .collect::<Vec<_>>()
        };
        assert_eq!(positions(&first), positions(&second));
    }

    #[test]
    fn missing_principled_is_fatal() {
        let mut graph = ShaderGraph::default();
        graph.add_node(ShaderNodeKind::MaterialOutput);
        let mut images = ImageLibrary::default();
        let textures = texture_set(&mut images, &[TextureRole::BaseColor]);
        let result = synthesize(&mut graph, &mut images, &textures, &FeatureToggles::default());
        assert!(matches!(
            result,
            Err(SynthError::MissingAnchorNode(PRINCIPLED_BSDF_NAME))
        ));
        assert_eq!(graph.node_count(), 1);
    }
}
