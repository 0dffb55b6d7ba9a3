use std::path::Path;

use batch_core::{AssetLibrary, BatchReport};
use batch_scene::Scene;
use serde::Serialize;

/// Everything a batch run produced, as written by `--save`.
#[derive(Debug, Serialize)]
pub(crate) struct LibrarySnapshot<'a> {
    pub scene: &'a Scene,
    pub library: &'a AssetLibrary,
    pub report: &'a BatchReport,
}

impl LibrarySnapshot<'_> {
    pub fn save(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|err| err.to_string())?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|err| err.to_string())?;
        std::fs::write(path, json).map_err(|err| err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_is_written_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/library.json");
        let scene = Scene::new();
        let library = AssetLibrary::default();
        let report = BatchReport::default();

        LibrarySnapshot {
            scene: &scene,
            library: &library,
            report: &report,
        }
        .save(&path)
        .unwrap();

        let value: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert!(value.get("scene").is_some());
        assert!(value["library"].get("materials").is_some());
        assert_eq!(value["report"]["folders"], serde_json::json!([]));
    }
}
