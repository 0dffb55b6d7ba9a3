use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ImageId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ColorSpace {
    #[default]
    Srgb,
    NonColor,
}

/// An image referenced by file path. Pixels are never decoded here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageResource {
    pub id: ImageId,
    pub name: String,
    pub path: PathBuf,
    pub colorspace: ColorSpace,
    #[serde(default)]
    pub size: Option<[u32; 2]>,
}

/// Loaded images, deduplicated by path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageLibrary {
    images: BTreeMap<ImageId, ImageResource>,
    next_id: u64,
}

impl Default for ImageLibrary {
    fn default() -> Self {
        Self {
            images: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl ImageLibrary {
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImageResource> {
        self.images.values()
    }

    pub fn get(&self, id: ImageId) -> Option<&ImageResource> {
        self.images.get(&id)
    }

    pub fn find(&self, path: &Path) -> Option<ImageId> {
        self.images
            .values()
            .find(|image| image.path == path)
            .map(|image| image.id)
    }

    /// Returns the existing entry for `path`, or registers a new one.
    pub fn load(&mut self, path: &Path, size: Option<[u32; 2]>) -> ImageId {
        if let Some(id) = self.find(path) {
            return id;
        }
        let id = ImageId(self.next_id);
        self.next_id += 1;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.images.insert(
            id,
            ImageResource {
                id,
                name,
                path: path.to_path_buf(),
                colorspace: ColorSpace::Srgb,
                size,
            },
        );
        id
    }

    pub fn set_colorspace(&mut self, id: ImageId, colorspace: ColorSpace) -> bool {
        match self.images.get_mut(&id) {
            Some(image) => {
                image.colorspace = colorspace;
                true
            }
            None => false,
        }
    }

    /// Drops every image not in `used`, returning how many were removed.
    pub fn retain_used(&mut self, used: &HashSet<ImageId>) -> usize {
        let before = self.images.len();
        self.images.retain(|id, _| used.contains(id));
        before - self.images.len()
    }
}
