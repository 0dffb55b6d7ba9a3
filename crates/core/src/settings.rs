use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::classify::TextureRole;

pub const DEFAULT_CATALOG_FILE_NAME: &str = "blender_assets.cats.txt";

/// Display names for the texture roles, used in labels and log output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MapNames {
    pub base_color: String,
    pub ao: String,
    pub metallic: String,
    pub roughness: String,
    pub glossy: String,
    pub normal: String,
    pub bump: String,
    pub displacement: String,
    pub opacity: String,
    pub emissive: String,
    pub specular: String,
}

impl Default for MapNames {
    fn default() -> Self {
        Self {
            base_color: "basecolor".to_string(),
            ao: "ao".to_string(),
            metallic: "metallic".to_string(),
            roughness: "roughness".to_string(),
            glossy: "glossy".to_string(),
            normal: "normal".to_string(),
            bump: "bump".to_string(),
            displacement: "displacement".to_string(),
            opacity: "opacity".to_string(),
            emissive: "emissive".to_string(),
            specular: "specular".to_string(),
        }
    }
}

impl MapNames {
    pub fn get(&self, role: TextureRole) -> &str {
        match role {
            TextureRole::BaseColor => &self.base_color,
            TextureRole::Ao => &self.ao,
            TextureRole::Metallic => &self.metallic,
            TextureRole::Roughness => &self.roughness,
            TextureRole::Glossy => &self.glossy,
            TextureRole::Normal => &self.normal,
            TextureRole::Bump => &self.bump,
            TextureRole::Displacement => &self.displacement,
            TextureRole::Opacity => &self.opacity,
            TextureRole::Emissive => &self.emissive,
            TextureRole::Specular => &self.specular,
        }
    }
}

/// Which maps turn into shader nodes, and the parameters of those nodes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FeatureToggles {
    pub use_diffuse: bool,
    pub use_ao: bool,
    pub use_metallic: bool,
    /// Also gates glossy maps, which are inverted into roughness.
    pub use_roughness: bool,
    pub use_normal: bool,
    pub use_bump: bool,
    pub use_displacement: bool,
    pub use_opacity: bool,
    pub use_emissive: bool,
    pub use_specular: bool,
    pub bump_distance: f32,
    pub displacement_scale: f32,
    pub normal_strength: f32,
    pub ao_factor: f32,
}

impl Default for FeatureToggles {
    fn default() -> Self {
        Self {
            use_diffuse: true,
            use_ao: true,
            use_metallic: true,
            use_roughness: true,
            use_normal: true,
            use_bump: false,
            use_displacement: false,
            use_opacity: true,
            use_emissive: true,
            use_specular: false,
            bump_distance: 0.01,
            displacement_scale: 0.1,
            normal_strength: 1.0,
            ao_factor: 1.0,
        }
    }
}

impl FeatureToggles {
    /// Toggle controlling whether a map of `role` is wired at all.
    pub fn enabled(&self, role: TextureRole) -> bool {
        match role {
            TextureRole::BaseColor => self.use_diffuse,
            TextureRole::Ao => self.use_ao,
            TextureRole::Metallic => self.use_metallic,
            TextureRole::Roughness | TextureRole::Glossy => self.use_roughness,
            TextureRole::Normal => self.use_normal,
            TextureRole::Bump => self.use_bump,
            TextureRole::Displacement => self.use_displacement,
            TextureRole::Opacity => self.use_opacity,
            TextureRole::Emissive => self.use_emissive,
            TextureRole::Specular => self.use_specular,
        }
    }
}

/// How imported meshes are published as assets.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    /// Each mesh object gets its own collection, and the collection is marked.
    #[default]
    Collection,
    Object,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ImportSettings {
    pub map_names: MapNames,
    pub toggles: FeatureToggles,
    pub asset_type: AssetType,
    pub import_textures: bool,
    pub import_meshes: bool,
    pub apply_transforms: bool,
    pub catalog_file_name: String,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            map_names: MapNames::default(),
            toggles: FeatureToggles::default(),
            asset_type: AssetType::default(),
            import_textures: true,
            import_meshes: true,
            apply_transforms: true,
            catalog_file_name: DEFAULT_CATALOG_FILE_NAME.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read settings {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ImportSettings {
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let data = std::fs::read(path).map_err(|source| SettingsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&data).map_err(|source| SettingsError::Json {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_json(data: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let settings = ImportSettings::from_json(
            br#"{ "toggles": { "use_bump": true, "bump_distance": 0.5 }, "asset_type": "object" }"#,
        )
        .unwrap();
        assert!(settings.toggles.use_bump);
        assert_eq!(settings.toggles.bump_distance, 0.5);
        assert!(settings.toggles.use_normal);
        assert_eq!(settings.toggles.normal_strength, 1.0);
        assert_eq!(settings.asset_type, AssetType::Object);
        assert_eq!(settings.catalog_file_name, DEFAULT_CATALOG_FILE_NAME);
        assert_eq!(settings.map_names.get(TextureRole::Specular), "specular");
    }

    #[test]
    fn glossy_follows_roughness_toggle() {
        let mut toggles = FeatureToggles::default();
        assert!(toggles.enabled(TextureRole::Glossy));
        toggles.use_roughness = false;
        assert!(!toggles.enabled(TextureRole::Glossy));
        assert!(!toggles.enabled(TextureRole::Roughness));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = ImportSettings::load(&dir.path().join("missing.json"));
        assert!(matches!(result, Err(SettingsError::Io { .. })));
    }
}
