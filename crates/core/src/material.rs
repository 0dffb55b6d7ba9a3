use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashSet};

use batch_scene::{AssetMark, Scene};
use serde::{Deserialize, Serialize};

use crate::graph::{GraphError, ParamValue, ShaderGraph};
use crate::images::ImageId;
use crate::shader_nodes::{setting, socket, ShaderNodeKind};

const PRINCIPLED_POSITION: [f32; 2] = [10.0, 300.0];
const OUTPUT_POSITION: [f32; 2] = [300.0, 300.0];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    pub graph: ShaderGraph,
    /// Keeps the material alive through orphan purges.
    pub fake_user: bool,
    #[serde(default)]
    pub asset: Option<AssetMark>,
}

impl Material {
    /// A node-based material with a white Principled BSDF feeding the output.
    pub fn new(name: String) -> Result<Self, GraphError> {
        let mut graph = ShaderGraph::default();
        let bsdf = graph.add_node(ShaderNodeKind::PrincipledBsdf);
        let output = graph.add_node(ShaderNodeKind::MaterialOutput);
        graph.set_node_position(bsdf, PRINCIPLED_POSITION)?;
        graph.set_node_position(output, OUTPUT_POSITION)?;
        graph.set_param(bsdf, socket::BASE_COLOR, ParamValue::Color([1.0, 1.0, 1.0, 1.0]))?;
        graph.set_param(bsdf, socket::ROUGHNESS, ParamValue::Float(0.5))?;
        graph.set_param(bsdf, socket::METALLIC, ParamValue::Float(0.0))?;
        graph.connect(bsdf, socket::BSDF, output, socket::SURFACE)?;

        Ok(Self {
            name,
            graph,
            fake_user: false,
            asset: None,
        })
    }

    pub fn images(&self) -> impl Iterator<Item = ImageId> + '_ {
        self.graph
            .nodes()
            .filter_map(|node| node.params.get_image(setting::IMAGE))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaterialLibrary {
    materials: BTreeMap<String, Material>,
}

impl MaterialLibrary {
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn insert(&mut self, material: Material) {
        self.materials.insert(material.name.clone(), material);
    }

    pub fn get(&self, name: &str) -> Option<&Material> {
        self.materials.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Material> {
        self.materials.get_mut(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Material> {
        self.materials.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Material> {
        self.materials.values_mut()
    }

    /// Returns the material called `name`, creating it when missing. An
    /// existing material is returned as-is, graph included.
    pub fn get_or_create(&mut self, name: &str) -> Result<&mut Material, GraphError> {
        match self.materials.entry(name.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => Ok(entry.insert(Material::new(name.to_string())?)),
        }
    }

    pub fn referenced_images(&self) -> HashSet<ImageId> {
        self.materials
            .values()
            .flat_map(|material| material.images())
            .collect()
    }

    /// Removes materials that no object uses and that have no fake user.
    pub fn purge_unused(&mut self, scene: &Scene) -> Vec<String> {
        let orphans: Vec<String> = self
            .materials
            .values()
            .filter(|material| !material.fake_user && scene.material_users(&material.name) == 0)
            .map(|material| material.name.clone())
            .collect();
        for name in &orphans {
            self.materials.remove(name);
        }
        orphans
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader_nodes::{MATERIAL_OUTPUT_NAME, PRINCIPLED_BSDF_NAME};

    #[test]
    fn new_material_links_bsdf_to_output() {
        let material = Material::new("Rock".to_string()).unwrap();
        let graph = &material.graph;
        let bsdf = graph.find_node(PRINCIPLED_BSDF_NAME).unwrap();
        let output = graph.find_node(MATERIAL_OUTPUT_NAME).unwrap();
        assert_eq!(graph.linked_source(output, socket::SURFACE), Some((bsdf, socket::BSDF)));
        let params = &graph.node(bsdf).unwrap().params;
        assert_eq!(params.get_float(socket::ROUGHNESS, -1.0), 0.5);
        assert_eq!(params.get_color(socket::BASE_COLOR, [0.0; 4]), [1.0; 4]);
        assert_eq!(graph.node_position(bsdf), Some(PRINCIPLED_POSITION));
    }

    #[test]
    fn get_or_create_reuses_existing() {
        let mut library = MaterialLibrary::default();
        library.get_or_create("Rock").unwrap().fake_user = true;
        assert!(library.get_or_create("Rock").unwrap().fake_user);
        assert_eq!(library.len(), 1);
    }

    #[test]
    fn purge_keeps_fake_users_and_assigned() {
        let mut scene = Scene::new();
        let object = scene
            .add_object(
                "Mesh",
                batch_scene::ObjectKind::Mesh(batch_scene::MeshData::default()),
                None,
                glam::Mat4::IDENTITY,
            )
            .unwrap();
        scene.assign_material(object, "Used").unwrap();

        let mut library = MaterialLibrary::default();
        library.get_or_create("Used").unwrap();
        library.get_or_create("Kept").unwrap().fake_user = true;
        library.get_or_create("Orphan").unwrap();

        assert_eq!(library.purge_unused(&scene), vec!["Orphan".to_string()]);
        assert!(library.get("Used").is_some());
        assert!(library.get("Kept").is_some());
    }
}
