use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use batch_scene::{AssetMark, ObjectId, Scene, SceneError};
use serde::{Deserialize, Serialize};

use crate::catalog::{AssetCatalogFile, CatalogError};
use crate::classify::{classify, has_extension, is_supported_image, TextureRole};
use crate::images::ImageLibrary;
use crate::material::MaterialLibrary;
use crate::settings::{AssetType, ImportSettings};
use crate::synth::{synthesize, SynthError, TextureSet};


pub const MESH_EXTENSIONS: &[&str] = &["fbx", "obj", "gltf", "glb"];
pub const MODELS_CATALOG: &str = "Models";
pub const MATERIALS_CATALOG: &str = "Materials";

/// Scene-side services the batch needs from whatever hosts it.
pub trait ImportHost {
    /// Whether `import_mesh` can handle this file at all.
    fn supports_mesh(&self, _path: &Path) -> bool {
        true
    }

    /// Imports a mesh file into `scene`, returning every object it created.
    fn import_mesh(&mut self, path: &Path, scene: &mut Scene) -> Result<Vec<ObjectId>, String>;

    fn probe_image(&mut self, _path: &Path) -> Option<[u32; 2]> {
        None
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("failed to build material {material}: {source}")]
    Synthesis {
        material: String,
        #[source]
        source: SynthError,
    },
    #[error("failed to import {path}: {message}")]
    MeshImport { path: PathBuf, message: String },
    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// Materials and images shared across every folder of a batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetLibrary {
    pub materials: MaterialLibrary,
    pub images: ImageLibrary,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FolderReport {
    pub name: String,
    pub path: PathBuf,
    pub material: Option<String>,
    /// Texture file chosen for each role.
    pub textures: BTreeMap<TextureRole, String>,
    pub samplers: usize,
    pub mesh: Option<PathBuf>,
    pub mesh_skipped: bool,
    pub objects: Vec<ObjectId>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub main_catalog: String,
    pub models_catalog_id: String,
    pub materials_catalog_id: String,
    pub folders: Vec<FolderReport>,
    pub removed_collections: usize,
    pub deleted_empties: usize,
    pub marked_objects: usize,
    pub purged_materials: Vec<String>,
    pub purged_images: usize,
    pub material_assets: Vec<String>,
}

pub struct BatchImporter {
    settings: ImportSettings,
}

impl BatchImporter {
    pub fn new(settings: ImportSettings) -> Self {
        Self { settings }
    }

    /// Imports every asset folder below `folder` into `scene` and `library`
    /// and files the results in the catalog file of `library_dir`. Folders
    /// imported before an error stay imported.
    pub fn run<H: ImportHost + ?Sized>(
        &self,
        folder: &Path,
        library_dir: &Path,
        scene: &mut Scene,
        library: &mut AssetLibrary,
        host: &mut H,
    ) -> Result<BatchReport, BatchError> {
        let main_name = dir_name(folder);
        let mut report = BatchReport {
            main_catalog: main_name.clone(),
            ..BatchReport::default()
        };

        report.removed_collections = scene.remove_empty_collections();
        tracing::info!(
            "batch import of {} (removed {} empty collections)",
            folder.display(),
            report.removed_collections
        );

        let mut imported = Vec::new();
        for dir in asset_folders(folder)? {
            let folder_report = self.import_folder(&dir, scene, library, host)?;
            imported.extend(folder_report.objects.iter().copied());
            report.folders.push(folder_report);
        }

        for id in &imported {
            scene.clear_parent_keep_transform(*id)?;
        }
        let deleted = scene.delete_empties(&imported)?;
        report.deleted_empties = deleted.len();
        imported.retain(|id| !deleted.contains(id));
        if self.settings.apply_transforms {
            scene.apply_transforms(&imported)?;
        }
        tracing::info!(
            "{} objects imported, {} empties deleted",
            imported.len(),
            deleted.len()
        );

        let mut catalogs =
            AssetCatalogFile::open_with_name(library_dir, &self.settings.catalog_file_name)?;
        catalogs.ensure(&main_name, None);
        let models_path = format!("{main_name}/{MODELS_CATALOG}");
        report.models_catalog_id = catalogs
            .ensure(&format!("{main_name}-{MODELS_CATALOG}"), Some(models_path.as_str()))
            .id
            .clone();
        let materials_path = format!("{main_name}/{MATERIALS_CATALOG}");
        report.materials_catalog_id = catalogs
            .ensure(&format!("{main_name}-{MATERIALS_CATALOG}"), Some(materials_path.as_str()))
            .id
            .clone();
        catalogs.write()?;
        tracing::info!("updated catalogs in {}", catalogs.path().display());

        report.marked_objects =
            self.mark_mesh_assets(scene, &imported, &main_name, &report.models_catalog_id)?;

        report.purged_materials = library.materials.purge_unused(scene);
        let used = library.materials.referenced_images();
        report.purged_images = library.images.retain_used(&used);
        tracing::info!(
            "purged {} materials and {} images",
            report.purged_materials.len(),
            report.purged_images
        );

        for material in library.materials.iter_mut() {
            if material.fake_user && scene.material_users(&material.name) == 0 {
                material.asset = Some(AssetMark::with_preview(report.materials_catalog_id.clone()));
                report.material_assets.push(material.name.clone());
            }
        }

        Ok(report)
    }

    fn import_folder<H: ImportHost + ?Sized>(
        &self,
        dir: &Path,
        scene: &mut Scene,
        library: &mut AssetLibrary,
        host: &mut H,
    ) -> Result<FolderReport, BatchError> {
        let name = dir_name(dir);
        let files = list_files(dir)?;
        let mut report = FolderReport {
            name: name.clone(),
            path: dir.to_path_buf(),
            mesh: find_mesh_file(&files).cloned(),
            ..FolderReport::default()
        };
        tracing::info!("importing folder {name}");

        if self.settings.import_textures {
            let AssetLibrary { materials, images } = library;
            let material = materials
                .get_or_create(&name)
                .map_err(|source| BatchError::Synthesis {
                    material: name.clone(),
                    source: source.into(),
                })?;
            material.fake_user = true;

            let textures = collect_texture_set(&files, images, host);
            for (role, image) in &textures {
                if let Some(image) = images.get(*image) {
                    report.textures.insert(*role, image.name.clone());
                }
            }
            let synthesis = synthesize(&mut material.graph, images, &textures, &self.settings.toggles)
                .map_err(|source| BatchError::Synthesis {
                    material: name.clone(),
                    source,
                })?;
            for role in &synthesis.skipped {
                tracing::debug!(
                    "{name}: {} map not wired",
                    self.settings.map_names.get(*role)
                );
            }
            report.samplers = synthesis.sampler_count();
            report.material = Some(name.clone());
        }

        let mesh = report.mesh.clone().filter(|_| self.settings.import_meshes);
        if let Some(mesh) = mesh {
            if host.supports_mesh(&mesh) {
                let objects = host
                    .import_mesh(&mesh, scene)
                    .map_err(|message| BatchError::MeshImport {
                        path: mesh.clone(),
                        message,
                    })?;
                if let Some(material) = &report.material {
                    for id in &objects {
                        scene.assign_material(*id, material)?;
                    }
                }
                tracing::info!("{name}: imported {} objects from {}", objects.len(), mesh.display());
                report.objects = objects;
            } else {
                tracing::warn!("{name}: no importer for {}, skipping mesh", mesh.display());
                report.mesh_skipped = true;
            }
        }

        Ok(report)
    }

    fn mark_mesh_assets(
        &self,
        scene: &mut Scene,
        objects: &[ObjectId],
        main_name: &str,
        catalog_id: &str,
    ) -> Result<usize, BatchError> {
        let mut marked = 0;
        for id in objects {
            let Some(object) = scene.object(*id) else {
                continue;
            };
            if !object.is_mesh() {
                continue;
            }
            let object_name = object.name.clone();
            let mark = AssetMark::with_preview(catalog_id);
            match self.settings.asset_type {
                AssetType::Collection => {
                    let main = scene.ensure_collection(main_name)?;
                    let collection = scene.add_collection(&object_name, main)?;
                    scene.move_object_to_collection(*id, collection)?;
                    scene.mark_collection_asset(collection, mark)?;
                }
                AssetType::Object => scene.mark_object_asset(*id, mark)?,
            }
            tracing::debug!("marked {object_name} as asset");
            marked += 1;
        }
        Ok(marked)
    }
}

fn dir_name(dir: &Path) -> String {
    dir.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.display().to_string())
}

fn read_dir_sorted(dir: &Path) -> Result<Vec<PathBuf>, BatchError> {
    let io_error = |source| BatchError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_error)? {
        entries.push(entry.map_err(io_error)?.path());
    }
    entries.sort();
    Ok(entries)
}

/// Every directory below `root`, depth first, siblings in name order.
/// Symlinked directories are not followed.
pub fn asset_folders(root: &Path) -> Result<Vec<PathBuf>, BatchError> {
    let mut folders = Vec::new();
    for path in read_dir_sorted(root)? {
        let metadata = std::fs::symlink_metadata(&path).map_err(|source| BatchError::Io {
            path: path.clone(),
            source,
        })?;
        if metadata.is_dir() {
            folders.push(path.clone());
            folders.extend(asset_folders(&path)?);
        }
    }
    Ok(folders)
}

pub fn list_files(dir: &Path) -> Result<Vec<PathBuf>, BatchError> {
    Ok(read_dir_sorted(dir)?
        .into_iter()
        .filter(|path| path.is_file())
        .collect())
}

/// First file, in the given order, with a mesh extension.
pub fn find_mesh_file(files: &[PathBuf]) -> Option<&PathBuf> {
    files.iter().find(|path| has_extension(path, MESH_EXTENSIONS))
}

/// Loads every supported image in `files` and maps the classified ones to
/// their role. Unclassified images stay loaded.
pub fn collect_texture_set<H: ImportHost + ?Sized>(
    files: &[PathBuf],
    images: &mut ImageLibrary,
    host: &mut H,
) -> TextureSet {
    let mut textures = TextureSet::new();
    for path in files.iter().filter(|path| is_supported_image(path)) {
        let size = host.probe_image(path);
        let id = images.load(path, size);
        let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        let Some(role) = classify(file_name) else {
            continue;
        };
        if let Some(previous) = textures.insert(role, id) {
            let previous = images
                .get(previous)
                .map(|image| image.name.clone())
                .unwrap_or_default();
            tracing::warn!("{file_name} replaces {previous} as the {role:?} map");
        }
    }
    textures
}
