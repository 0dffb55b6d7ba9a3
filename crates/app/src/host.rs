use std::path::Path;

use batch_core::ImportHost;
use batch_scene::{MeshData, ObjectId, ObjectKind, Scene};
use glam::Mat4;

/// Imports meshes from disk. OBJ and glTF are read; anything else is
/// reported as unsupported.
#[derive(Debug, Default)]
pub(crate) struct FileHost;

impl ImportHost for FileHost {
    fn supports_mesh(&self, path: &Path) -> bool {
        matches!(extension(path).as_deref(), Some("obj" | "gltf" | "glb"))
    }

    fn import_mesh(&mut self, path: &Path, scene: &mut Scene) -> Result<Vec<ObjectId>, String> {
        match extension(path).as_deref() {
            Some("obj") => import_obj(path, scene),
            Some("gltf" | "glb") => import_gltf(path, scene),
            _ => Err(format!("unsupported mesh format: {}", path.display())),
        }
    }

    fn probe_image(&mut self, path: &Path) -> Option<[u32; 2]> {
        match image::image_dimensions(path) {
            Ok((width, height)) => Some([width, height]),
            Err(err) => {
                tracing::debug!("could not probe {}: {err}", path.display());
                None
            }
        }
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "mesh".to_string())
}

/// Adds an empty named after the file and one mesh object per OBJ model
/// below it.
fn import_obj(path: &Path, scene: &mut Scene) -> Result<Vec<ObjectId>, String> {
    let options = tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    };
    let (models, _) =
        tobj::load_obj(path, &options).map_err(|err| format!("OBJ load failed: {err}"))?;
    if models.is_empty() {
        return Err("OBJ has no geometry".to_string());
    }

    let stem = file_stem(path);
    let meshes = models
        .iter()
        .map(|model| {
            let name = if model.name.trim().is_empty() {
                stem.clone()
            } else {
                model.name.clone()
            };
            mesh_from_obj(&model.mesh).map(|mesh| (name, mesh))
        })
        .collect::<Result<Vec<_>, String>>()?;

    let root = scene
        .add_object(&stem, ObjectKind::Empty, None, Mat4::IDENTITY)
        .map_err(|err| err.to_string())?;
    let mut created = vec![root];
    for (name, mesh) in meshes {
        let id = scene
            .add_object(&name, ObjectKind::Mesh(mesh), Some(root), Mat4::IDENTITY)
            .map_err(|err| err.to_string())?;
        created.push(id);
    }
    Ok(created)
}

fn mesh_from_obj(mesh: &tobj::Mesh) -> Result<MeshData, String> {
    if mesh.positions.len() % 3 != 0 {
        return Err("OBJ has malformed positions".to_string());
    }
    let vertex_count = mesh.positions.len() / 3;
    let positions = mesh
        .positions
        .chunks_exact(3)
        .map(|v| [v[0], v[1], v[2]])
        .collect();
    let mut data = MeshData::with_positions_indices(positions, mesh.indices.clone());
    if mesh.normals.len() == mesh.positions.len() {
        data.normals = Some(mesh.normals.chunks_exact(3).map(|n| [n[0], n[1], n[2]]).collect());
    }
    if mesh.texcoords.len() / 2 == vertex_count && !mesh.texcoords.is_empty() {
        data.uvs = Some(mesh.texcoords.chunks_exact(2).map(|t| [t[0], t[1]]).collect());
    }
    Ok(data)
}

/// Recreates the node hierarchy of the default scene (or every root node
/// when there is none). Nodes without a mesh become empties.
fn import_gltf(path: &Path, scene: &mut Scene) -> Result<Vec<ObjectId>, String> {
    let (document, buffers, _) =
        gltf::import(path).map_err(|err| format!("glTF load failed: {err}"))?;

    let roots: Vec<gltf::Node> = match document.default_scene().or_else(|| document.scenes().next()) {
        Some(gltf_scene) => gltf_scene.nodes().collect(),
        None => document.nodes().collect(),
    };
    let stem = file_stem(path);
    let mut created = Vec::new();
    for node in roots {
        if let Err(err) = add_gltf_node(&node, None, &buffers, &stem, scene, &mut created) {
            for id in created.iter().rev() {
                let _ = scene.remove_object(*id);
            }
            return Err(err);
        }
    }
    if created.is_empty() {
        return Err("glTF has no nodes".to_string());
    }
    Ok(created)
}

fn add_gltf_node(
    node: &gltf::Node,
    parent: Option<ObjectId>,
    buffers: &[gltf::buffer::Data],
    stem: &str,
    scene: &mut Scene,
    created: &mut Vec<ObjectId>,
) -> Result<(), String> {
    let name = node
        .name()
        .map(|name| name.to_string())
        .unwrap_or_else(|| format!("{stem}_{}", node.index()));
    let kind = match node.mesh() {
        Some(mesh) => match mesh_from_gltf(&mesh, buffers)? {
            Some(data) => ObjectKind::Mesh(data),
            None => ObjectKind::Empty,
        },
        None => ObjectKind::Empty,
    };
    let transform = Mat4::from_cols_array_2d(&node.transform().matrix());
    let id = scene
        .add_object(&name, kind, parent, transform)
        .map_err(|err| err.to_string())?;
    created.push(id);
    for child in node.children() {
        add_gltf_node(&child, Some(id), buffers, stem, scene, created)?;
    }
    Ok(())
}

/// Merges the triangle primitives of one glTF mesh. Returns `None` when it
/// has no triangles.
fn mesh_from_gltf(
    mesh: &gltf::Mesh,
    buffers: &[gltf::buffer::Data],
) -> Result<Option<MeshData>, String> {
    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();
    let mut normals: Vec<[f32; 3]> = Vec::new();
    let mut uvs: Vec<[f32; 2]> = Vec::new();
    let mut include_normals = true;
    let mut include_uvs = true;

    for primitive in mesh.primitives() {
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            continue;
        }
        let reader =
            primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));
        let prim_positions: Vec<[f32; 3]> = reader
            .read_positions()
            .ok_or_else(|| "glTF primitive missing POSITION attribute".to_string())?
            .collect();
        if prim_positions.is_empty() {
            continue;
        }
        let base = positions.len() as u32;
        positions.extend(prim_positions.iter().copied());

        match reader.read_normals() {
            Some(iter) => normals.extend(iter),
            None => include_normals = false,
        }
        match reader.read_tex_coords(0) {
            Some(iter) => uvs.extend(iter.into_f32()),
            None => include_uvs = false,
        }

        let prim_indices: Vec<u32> = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..prim_positions.len() as u32).collect(),
        };
        indices.extend(prim_indices.into_iter().map(|idx| idx + base));
    }

    if positions.is_empty() {
        return Ok(None);
    }
    let mut data = MeshData::with_positions_indices(positions, indices);
    if include_normals && normals.len() == data.positions.len() {
        data.normals = Some(normals);
    }
    if include_uvs && uvs.len() == data.positions.len() {
        data.uvs = Some(uvs);
    }
    Ok(Some(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_OBJECTS: &str = "\
o Crate
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
f 1 2 3 4
o Lid
v 0 0 1
v 1 0 1
v 0 1 1
f 5 6 7
";

    #[test]
    fn obj_models_become_children_of_an_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crate.obj");
        std::fs::write(&path, TWO_OBJECTS).unwrap();

        let mut scene = Scene::new();
        let mut host = FileHost;
        let ids = host.import_mesh(&path, &mut scene).unwrap();

        assert_eq!(ids.len(), 3);
        let root = scene.object(ids[0]).unwrap();
        assert_eq!(root.name, "crate");
        assert!(root.is_empty());

        let body = scene.object_by_name("Crate").unwrap();
        assert_eq!(body.parent, Some(ids[0]));
        assert_eq!(body.mesh().unwrap().triangle_count(), 2);
        let lid = scene.object_by_name("Lid").unwrap();
        assert_eq!(lid.mesh().unwrap().vertex_count(), 3);
    }

    #[test]
    fn only_obj_and_gltf_are_supported() {
        let host = FileHost;
        assert!(host.supports_mesh(Path::new("a/rock.OBJ")));
        assert!(host.supports_mesh(Path::new("a/rock.glb")));
        assert!(!host.supports_mesh(Path::new("a/rock.fbx")));
    }

    #[test]
    fn unreadable_image_has_no_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rock_basecolor.png");
        std::fs::write(&path, b"not a png").unwrap();
        assert_eq!(FileHost.probe_image(&path), None);
    }

    #[test]
    fn malformed_obj_adds_nothing() {
        let mesh = tobj::Mesh {
            positions: vec![0.0, 0.0, 0.0, 1.0],
            ..Default::default()
        };
        assert!(mesh_from_obj(&mesh).is_err());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.obj");
        std::fs::write(&path, "# nothing here\n").unwrap();
        let mut scene = Scene::new();
        assert!(FileHost.import_mesh(&path, &mut scene).is_err());
        assert_eq!(scene.objects().count(), 0);
    }

    #[test]
    fn missing_obj_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut scene = Scene::new();
        let result = FileHost.import_mesh(&dir.path().join("missing.obj"), &mut scene);
        assert!(result.is_err());
        assert_eq!(scene.objects().count(), 0);
    }
}
