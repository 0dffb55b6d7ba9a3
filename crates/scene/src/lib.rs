mod mesh;

use std::collections::BTreeMap;

use glam::Mat4;
use serde::{Deserialize, Serialize};

pub use mesh::MeshData;

pub const SCENE_COLLECTION_NAME: &str = "Scene Collection";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(u64);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CollectionId(u64);

/// Marks an object or collection as a browsable asset filed under a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetMark {
    pub catalog_id: String,
    pub preview_requested: bool,
}

impl AssetMark {
    pub fn with_preview(catalog_id: impl Into<String>) -> Self {
        Self {
            catalog_id: catalog_id.into(),
            preview_requested: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ObjectKind {
    Mesh(MeshData),
    Empty,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneObject {
    pub id: ObjectId,
    pub name: String,
    pub kind: ObjectKind,
    pub parent: Option<ObjectId>,
    /// Transform relative to the parent, or world space when unparented.
    pub transform: Mat4,
    #[serde(default)]
    pub materials: Vec<String>,
    #[serde(default)]
    pub asset: Option<AssetMark>,
}

impl SceneObject {
    pub fn is_mesh(&self) -> bool {
        matches!(self.kind, ObjectKind::Mesh(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.kind, ObjectKind::Empty)
    }

    pub fn mesh(&self) -> Option<&MeshData> {
        match &self.kind {
            ObjectKind::Mesh(mesh) => Some(mesh),
            ObjectKind::Empty => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    pub id: CollectionId,
    pub name: String,
    pub objects: Vec<ObjectId>,
    pub children: Vec<CollectionId>,
    #[serde(default)]
    pub asset: Option<AssetMark>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum SceneError {
    #[error("object {0:?} does not exist")]
    MissingObject(ObjectId),
    #[error("collection {0:?} does not exist")]
    MissingCollection(CollectionId),
}

/// Objects and the collection tree they are linked into.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    objects: BTreeMap<ObjectId, SceneObject>,
    collections: BTreeMap<CollectionId, Collection>,
    root: CollectionId,
    next_object_id: u64,
    next_collection_id: u64,
}

impl Default for Scene {
    fn default() -> Self {
        let root = CollectionId(1);
        let mut collections = BTreeMap::new();
        collections.insert(
            root,
            Collection {
                id: root,
                name: SCENE_COLLECTION_NAME.to_string(),
                objects: Vec::new(),
                children: Vec::new(),
                asset: None,
            },
        );
        Self {
            objects: BTreeMap::new(),
            collections,
            root,
            next_object_id: 1,
            next_collection_id: 2,
        }
    }
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root_collection(&self) -> CollectionId {
        self.root
    }

    pub fn objects(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.values()
    }

    pub fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.get(&id)
    }

    pub fn object_by_name(&self, name: &str) -> Option<&SceneObject> {
        self.objects.values().find(|object| object.name == name)
    }

    pub fn collections(&self) -> impl Iterator<Item = &Collection> {
        self.collections.values()
    }

    pub fn collection(&self, id: CollectionId) -> Option<&Collection> {
        self.collections.get(&id)
    }

    pub fn collection_by_name(&self, name: &str) -> Option<CollectionId> {
        self.collections
            .values()
            .find(|collection| collection.name == name)
            .map(|collection| collection.id)
    }

    /// Adds an object linked into the scene collection. Names are made unique
    /// with a numeric suffix.
    pub fn add_object(
        &mut self,
        name: &str,
        kind: ObjectKind,
        parent: Option<ObjectId>,
        transform: Mat4,
    ) -> Result<ObjectId, SceneError> {
        if let Some(parent) = parent {
            if !self.objects.contains_key(&parent) {
                return Err(SceneError::MissingObject(parent));
            }
        }
        let id = ObjectId(self.next_object_id);
        self.next_object_id += 1;
        let name = unique_name(name, |candidate| self.object_by_name(candidate).is_some());
        self.objects.insert(
            id,
            SceneObject {
                id,
                name,
                kind,
                parent,
                transform,
                materials: Vec::new(),
                asset: None,
            },
        );
        if let Some(root) = self.collections.get_mut(&self.root) {
            root.objects.push(id);
        }
        Ok(id)
    }

    pub fn add_collection(
        &mut self,
        name: &str,
        parent: CollectionId,
    ) -> Result<CollectionId, SceneError> {
        if !self.collections.contains_key(&parent) {
            return Err(SceneError::MissingCollection(parent));
        }
        let id = CollectionId(self.next_collection_id);
        self.next_collection_id += 1;
        let name = unique_name(name, |candidate| self.collection_by_name(candidate).is_some());
        self.collections.insert(
            id,
            Collection {
                id,
                name,
                objects: Vec::new(),
                children: Vec::new(),
                asset: None,
            },
        );
        if let Some(parent) = self.collections.get_mut(&parent) {
            parent.children.push(id);
        }
        Ok(id)
    }

    /// Returns the named collection below the scene collection, creating it
    /// when missing.
    pub fn ensure_collection(&mut self, name: &str) -> Result<CollectionId, SceneError> {
        if let Some(id) = self.collection_by_name(name) {
            return Ok(id);
        }
        self.add_collection(name, self.root)
    }

    /// Removes every collection below the scene collection that holds no
    /// objects and no child collections. Repeats until nothing changes so
    /// nested empty chains collapse fully.
    pub fn remove_empty_collections(&mut self) -> usize {
        let mut removed = 0;
        loop {
            let empty: Vec<CollectionId> = self
                .collections
                .values()
                .filter(|collection| {
                    collection.id != self.root
                        && collection.objects.is_empty()
                        && collection.children.is_empty()
                })
                .map(|collection| collection.id)
                .collect();
            if empty.is_empty() {
                return removed;
            }
            for id in empty {
                self.collections.remove(&id);
                for collection in self.collections.values_mut() {
                    collection.children.retain(|child| *child != id);
                }
                removed += 1;
            }
        }
    }

    pub fn users_collection(&self, object: ObjectId) -> Vec<CollectionId> {
        self.collections
            .values()
            .filter(|collection| collection.objects.contains(&object))
            .map(|collection| collection.id)
            .collect()
    }

    /// Unlinks the object from every collection and links it into `target`.
    pub fn move_object_to_collection(
        &mut self,
        object: ObjectId,
        target: CollectionId,
    ) -> Result<(), SceneError> {
        if !self.objects.contains_key(&object) {
            return Err(SceneError::MissingObject(object));
        }
        if !self.collections.contains_key(&target) {
            return Err(SceneError::MissingCollection(target));
        }
        for collection in self.collections.values_mut() {
            collection.objects.retain(|id| *id != object);
        }
        if let Some(target) = self.collections.get_mut(&target) {
            target.objects.push(object);
        }
        Ok(())
    }

    pub fn world_matrix(&self, id: ObjectId) -> Result<Mat4, SceneError> {
        let object = self.objects.get(&id).ok_or(SceneError::MissingObject(id))?;
        let mut matrix = object.transform;
        let mut cursor = object.parent;
        while let Some(parent_id) = cursor {
            let parent = self
                .objects
                .get(&parent_id)
                .ok_or(SceneError::MissingObject(parent_id))?;
            matrix = parent.transform * matrix;
            cursor = parent.parent;
        }
        Ok(matrix)
    }

    /// Unparents the object while keeping its world-space placement.
    pub fn clear_parent_keep_transform(&mut self, id: ObjectId) -> Result<(), SceneError> {
        let world = self.world_matrix(id)?;
        let object = self.objects.get_mut(&id).ok_or(SceneError::MissingObject(id))?;
        if object.parent.take().is_some() {
            object.transform = world;
        }
        Ok(())
    }

    /// Removes the object. Its children move up to its parent with their
    /// world transforms preserved.
    pub fn remove_object(&mut self, id: ObjectId) -> Result<SceneObject, SceneError> {
        if !self.objects.contains_key(&id) {
            return Err(SceneError::MissingObject(id));
        }
        let children: Vec<ObjectId> = self
            .objects
            .values()
            .filter(|object| object.parent == Some(id))
            .map(|object| object.id)
            .collect();
        let grandparent = self.objects.get(&id).and_then(|object| object.parent);
        for child in children {
            let world = self.world_matrix(child)?;
            let transform = match grandparent {
                Some(grandparent) => self.world_matrix(grandparent)?.inverse() * world,
                None => world,
            };
            if let Some(object) = self.objects.get_mut(&child) {
                object.parent = grandparent;
                object.transform = transform;
            }
        }
        for collection in self.collections.values_mut() {
            collection.objects.retain(|object| *object != id);
        }
        self.objects.remove(&id).ok_or(SceneError::MissingObject(id))
    }

    /// Deletes every empty among `ids`, returning the removed ids.
    pub fn delete_empties(&mut self, ids: &[ObjectId]) -> Result<Vec<ObjectId>, SceneError> {
        let mut removed = Vec::new();
        for id in ids {
            let is_empty = self.objects.get(id).map(SceneObject::is_empty).unwrap_or(false);
            if is_empty {
                self.remove_object(*id)?;
                removed.push(*id);
            }
        }
        Ok(removed)
    }

    /// Bakes each object's transform into its mesh data and resets it to
    /// identity. Children absorb the baked matrix so world placement holds.
    pub fn apply_transforms(&mut self, ids: &[ObjectId]) -> Result<(), SceneError> {
        for id in ids {
            let object = self.objects.get_mut(id).ok_or(SceneError::MissingObject(*id))?;
            let matrix = object.transform;
            if matrix == Mat4::IDENTITY {
                continue;
            }
            if let ObjectKind::Mesh(mesh) = &mut object.kind {
                mesh.transform(matrix);
            }
            object.transform = Mat4::IDENTITY;
            for child in self.objects.values_mut() {
                if child.parent == Some(*id) {
                    child.transform = matrix * child.transform;
                }
            }
        }
        Ok(())
    }

    /// Replaces the material slots of a mesh object. Non-mesh objects are left
    /// alone and `false` is returned.
    pub fn assign_material(&mut self, id: ObjectId, material: &str) -> Result<bool, SceneError> {
        let object = self.objects.get_mut(&id).ok_or(SceneError::MissingObject(id))?;
        if !object.is_mesh() {
            return Ok(false);
        }
        object.materials.clear();
        object.materials.push(material.to_string());
        Ok(true)
    }

    pub fn material_users(&self, material: &str) -> usize {
        self.objects
            .values()
            .filter(|object| object.materials.iter().any(|name| name == material))
            .count()
    }

    pub fn mark_object_asset(&mut self, id: ObjectId, mark: AssetMark) -> Result<(), SceneError> {
        let object = self.objects.get_mut(&id).ok_or(SceneError::MissingObject(id))?;
        object.asset = Some(mark);
        Ok(())
    }

    pub fn mark_collection_asset(
        &mut self,
        id: CollectionId,
        mark: AssetMark,
    ) -> Result<(), SceneError> {
        let collection = self
            .collections
            .get_mut(&id)
            .ok_or(SceneError::MissingCollection(id))?;
        collection.asset = Some(mark);
        Ok(())
    }
}

/// Returns `base` or the first `base.NNN` for which `taken` is false.
pub fn unique_name(base: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(base) {
        return base.to_string();
    }
    let mut index = 1u32;
    loop {
        let candidate = format!("{base}.{index:03}");
        if !taken(&candidate) {
            return candidate;
        }
        index += 1;
    }
}
