use serde::{Deserialize, Serialize};

use crate::graph::SocketType;

/// Socket names shared between node definitions and the synthesizer.
pub mod socket {
    pub const BASE_COLOR: &str = "Base Color";
    pub const METALLIC: &str = "Metallic";
    pub const ROUGHNESS: &str = "Roughness";
    pub const IOR: &str = "IOR";
    pub const ALPHA: &str = "Alpha";
    pub const NORMAL: &str = "Normal";
    pub const SPECULAR_IOR_LEVEL: &str = "Specular IOR Level";
    pub const EMISSION_COLOR: &str = "Emission Color";
    pub const EMISSION_STRENGTH: &str = "Emission Strength";
    pub const BSDF: &str = "BSDF";
    pub const SURFACE: &str = "Surface";
    pub const VOLUME: &str = "Volume";
    pub const DISPLACEMENT: &str = "Displacement";
    pub const VECTOR: &str = "Vector";
    pub const COLOR: &str = "Color";
    pub const COLOR1: &str = "Color1";
    pub const COLOR2: &str = "Color2";
    pub const FAC: &str = "Fac";
    pub const STRENGTH: &str = "Strength";
    pub const DISTANCE: &str = "Distance";
    pub const HEIGHT: &str = "Height";
    pub const MIDLEVEL: &str = "Midlevel";
    pub const SCALE: &str = "Scale";
}

/// Node settings that are not socket defaults.
pub mod setting {
    pub const IMAGE: &str = "image";
    pub const BLEND_TYPE: &str = "blend_type";
    pub const BLEND_MULTIPLY: &str = "MULTIPLY";
}

pub const PRINCIPLED_BSDF_NAME: &str = "Principled BSDF";
pub const MATERIAL_OUTPUT_NAME: &str = "Material Output";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShaderNodeKind {
    PrincipledBsdf,
    MaterialOutput,
    ImageTexture,
    NormalMap,
    Bump,
    Displacement,
    Invert,
    MixRgb,
}

#[derive(Debug, Clone)]
pub struct NodeDefinition {
    pub name: &'static str,
    pub inputs: Vec<SocketDefinition>,
    pub outputs: Vec<SocketDefinition>,
}

#[derive(Debug, Clone, Copy)]
pub struct SocketDefinition {
    pub name: &'static str,
    pub socket_type: SocketType,
}

fn color(name: &'static str) -> SocketDefinition {
    SocketDefinition {
        name,
        socket_type: SocketType::Color,
    }
}

fn float(name: &'static str) -> SocketDefinition {
    SocketDefinition {
        name,
        socket_type: SocketType::Float,
    }
}

fn vector(name: &'static str) -> SocketDefinition {
    SocketDefinition {
        name,
        socket_type: SocketType::Vector,
    }
}

fn shader(name: &'static str) -> SocketDefinition {
    SocketDefinition {
        name,
        socket_type: SocketType::Shader,
    }
}

impl ShaderNodeKind {
    pub fn name(self) -> &'static str {
        match self {
            ShaderNodeKind::PrincipledBsdf => PRINCIPLED_BSDF_NAME,
            ShaderNodeKind::MaterialOutput => MATERIAL_OUTPUT_NAME,
            ShaderNodeKind::ImageTexture => "Image Texture",
            ShaderNodeKind::NormalMap => "Normal Map",
            ShaderNodeKind::Bump => "Bump",
            ShaderNodeKind::Displacement => "Displacement",
            ShaderNodeKind::Invert => "Invert Color",
            ShaderNodeKind::MixRgb => "Mix",
        }
    }

    pub fn definition(self) -> NodeDefinition {
        use socket::*;

        let (inputs, outputs) = match self {
            ShaderNodeKind::PrincipledBsdf => (
                vec![
                    color(BASE_COLOR),
                    float(METALLIC),
                    float(ROUGHNESS),
                    float(IOR),
                    float(ALPHA),
                    vector(NORMAL),
                    float(SPECULAR_IOR_LEVEL),
                    color(EMISSION_COLOR),
                    float(EMISSION_STRENGTH),
                ],
                vec![shader(BSDF)],
            ),
            ShaderNodeKind::MaterialOutput => (
                vec![shader(SURFACE), shader(VOLUME), vector(DISPLACEMENT)],
                vec![],
            ),
            ShaderNodeKind::ImageTexture => (vec![vector(VECTOR)], vec![color(COLOR), float(ALPHA)]),
            ShaderNodeKind::NormalMap => (vec![float(STRENGTH), color(COLOR)], vec![vector(NORMAL)]),
            ShaderNodeKind::Bump => (
                vec![float(STRENGTH), float(DISTANCE), float(HEIGHT), vector(NORMAL)],
                vec![vector(NORMAL)],
            ),
            ShaderNodeKind::Displacement => (
                vec![float(HEIGHT), float(MIDLEVEL), float(SCALE), vector(NORMAL)],
                vec![vector(DISPLACEMENT)],
            ),
            ShaderNodeKind::Invert => (vec![float(FAC), color(COLOR)], vec![color(COLOR)]),
            ShaderNodeKind::MixRgb => (
                vec![float(FAC), color(COLOR1), color(COLOR2)],
                vec![color(COLOR)],
            ),
        };

        NodeDefinition {
            name: self.name(),
            inputs,
            outputs,
        }
    }
}
