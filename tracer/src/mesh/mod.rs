use maths::Vec3;

use crate::raytracer::Triangle;

pub mod shapes;

/// Indexed object-space mesh, as produced by a loader.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub positions: Vec<Vec3>,
    /// Per-vertex normals. Empty means "use the face normal".
    pub normals: Vec<Vec3>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new(positions: Vec<Vec3>, normals: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self {
            positions,
            normals,
            indices,
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Expands the index list into standalone triangles.
    ///
    /// A trailing partial triangle is dropped, as is any triangle with an
    /// index past the end of `positions` (or of `normals`, when present).
    pub fn to_triangles(&self, material_id: i32) -> Vec<Triangle> {
        let has_normals = !self.normals.is_empty();
        let vertex_count = if has_normals {
            self.positions.len().min(self.normals.len())
        } else {
            self.positions.len()
        };

        let mut triangles = Vec::with_capacity(self.triangle_count());
        let mut skipped = 0;

        for face in self.indices.chunks_exact(3) {
            let [i0, i1, i2] = [face[0] as usize, face[1] as usize, face[2] as usize];
            if i0 >= vertex_count || i1 >= vertex_count || i2 >= vertex_count {
                skipped += 1;
                continue;
            }

            let positions = [self.positions[i0], self.positions[i1], self.positions[i2]];
            let triangle = if has_normals {
                Triangle::new(
                    positions,
                    [self.normals[i0], self.normals[i1], self.normals[i2]],
                    material_id,
                )
            } else {
                Triangle::flat(positions, material_id)
            };
            triangles.push(triangle);
        }

        if skipped > 0 {
            log::warn!("Skipped {skipped} triangles with out-of-range indices");
        }

        triangles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_normal_fallback() {
        let mesh = MeshData::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![], vec![0, 1, 2]);
        let triangles = mesh.to_triangles(4);

        assert_eq!(triangles.len(), 1);
        assert_eq!(triangles[0].normal(1), Vec3::Z);
        assert_eq!(triangles[0].material_id, 4);
    }

    #[test]
    fn test_vertex_normals_are_kept() {
        let mesh = MeshData::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            vec![Vec3::X, Vec3::Y, Vec3::Z],
            vec![0, 1, 2],
        );
        let triangle = mesh.to_triangles(0)[0];

        assert_eq!(triangle.normal(0), Vec3::X);
        assert_eq!(triangle.normal(2), Vec3::Z);
    }

    #[test]
    fn test_skips_bad_indices_and_partial_faces() {
        let mesh = MeshData::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::Z],
            vec![],
            vec![0, 1, 2, 0, 1, 9, 1, 2, 3, 0, 1],
        );
        let triangles = mesh.to_triangles(0);

        assert_eq!(triangles.len(), 2);
        assert_eq!(triangles[1].position(2), Vec3::Z);
    }
}
