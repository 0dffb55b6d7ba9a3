use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Triangle data carried by a mesh object. Positions are in object space.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
    #[serde(default)]
    pub normals: Option<Vec<[f32; 3]>>,
    #[serde(default)]
    pub uvs: Option<Vec<[f32; 2]>>,
}

impl MeshData {
    pub fn with_positions_indices(positions: Vec<[f32; 3]>, indices: Vec<u32>) -> Self {
        Self {
            positions,
            indices,
            normals: None,
            uvs: None,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn transform(&mut self, matrix: Mat4) {
        for p in &mut self.positions {
            *p = matrix.transform_point3(Vec3::from(*p)).to_array();
        }

        if let Some(normals) = &mut self.normals {
            let normal_matrix = matrix.inverse().transpose();
            for n in normals {
                let v = normal_matrix.transform_vector3(Vec3::from(*n));
                let len = v.length();
                *n = if len > 0.0 {
                    (v / len).to_array()
                } else {
                    [0.0, 0.0, 1.0]
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_moves_points_and_renormalizes() {
        let mut mesh = MeshData::with_positions_indices(vec![[1.0, 0.0, 0.0]], vec![]);
        mesh.normals = Some(vec![[0.0, 0.0, 1.0]]);
        mesh.transform(Mat4::from_scale_rotation_translation(
            Vec3::new(2.0, 2.0, 4.0),
            glam::Quat::IDENTITY,
            Vec3::new(0.0, 1.0, 0.0),
        ));
        assert_eq!(mesh.positions[0], [2.0, 1.0, 0.0]);
        let normal = mesh.normals.expect("normals")[0];
        assert!((normal[2] - 1.0).abs() < 1.0e-6);
    }
}
