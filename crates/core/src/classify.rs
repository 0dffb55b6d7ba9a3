use std::path::Path;

use serde::{Deserialize, Serialize};

/// Raster formats picked up from an asset folder.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tga", "bmp", "tif", "tiff"];

/// Physical purpose of a texture. Declaration order is the matching order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TextureRole {
    BaseColor,
    Ao,
    Metallic,
    Roughness,
    Glossy,
    Normal,
    Bump,
    Displacement,
    Opacity,
    Emissive,
    Specular,
}

impl TextureRole {
    pub const ALL: [TextureRole; 11] = [
        TextureRole::BaseColor,
        TextureRole::Ao,
        TextureRole::Metallic,
        TextureRole::Roughness,
        TextureRole::Glossy,
        TextureRole::Normal,
        TextureRole::Bump,
        TextureRole::Displacement,
        TextureRole::Opacity,
        TextureRole::Emissive,
        TextureRole::Specular,
    ];

    pub fn synonyms(self) -> &'static [&'static str] {
        match self {
            TextureRole::BaseColor => &["basecolor", "albedo", "diffuse", "color", "col"],
            TextureRole::Ao => &["ao", "ambientocclusion"],
            TextureRole::Metallic => &["metallic", "metal", "metalness"],
            TextureRole::Roughness => &["roughness", "rough"],
            TextureRole::Glossy => &["glossy", "gloss"],
            TextureRole::Normal => &["normal", "nor"],
            TextureRole::Bump => &["bump"],
            TextureRole::Displacement => &["displacement", "disp"],
            TextureRole::Opacity => &["opacity", "alpha"],
            TextureRole::Emissive => &["emissive", "emit"],
            TextureRole::Specular => &["specular", "spec"],
        }
    }

    /// Data maps are sampled without gamma correction.
    pub fn is_color_data(self) -> bool {
        matches!(self, TextureRole::BaseColor | TextureRole::Emissive)
    }
}

/// Returns the role named by the last underscore-separated token of the file
/// name, ignoring case and extension.
pub fn classify(file_name: &str) -> Option<TextureRole> {
    let token = role_token(file_name).to_lowercase();
    let role = TextureRole::ALL
        .into_iter()
        .find(|role| role.synonyms().contains(&token.as_str()));
    if role.is_none() {
        tracing::debug!("no texture role for {file_name:?} (token {token:?})");
    }
    role
}

fn role_token(file_name: &str) -> &str {
    let last = file_name.rsplit('_').next().unwrap_or(file_name);
    last.split('.').next().unwrap_or(last)
}

pub fn is_supported_image(path: &Path) -> bool {
    has_extension(path, IMAGE_EXTENSIONS)
}

pub(crate) fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            extensions.iter().any(|candidate| *candidate == ext)
        })
        .unwrap_or(false)
}
