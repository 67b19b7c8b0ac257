use maths::Vec3;

use super::MeshData;

/// Single triangle in the z = 0 plane.
pub fn triangle() -> MeshData {
    MeshData::new(
        vec![
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
        ],
        vec![Vec3::Z; 3],
        vec![0, 1, 2],
    )
}

/// Unit quad in the z = 0 plane, facing +z, spanning [0, 1] on x and y.
pub fn quad() -> MeshData {
    MeshData::new(
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ],
        vec![Vec3::Z; 4],
        vec![0, 1, 2, 0, 2, 3],
    )
}

/// Unit cube centered at the origin: 24 vertices, 12 triangles, outward normals.
pub fn cube() -> MeshData {
    // (normal, tangent u, tangent v) per face, with u x v = normal.
    const FACES: [(Vec3, Vec3, Vec3); 6] = [
        (Vec3::X, Vec3::Y, Vec3::Z),
        (Vec3::new(-1.0, 0.0, 0.0), Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::Z, Vec3::X),
        (Vec3::new(0.0, -1.0, 0.0), Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::new(0.0, 0.0, -1.0), Vec3::Y, Vec3::X),
    ];

    let mut positions = Vec::with_capacity(24);
    let mut normals = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);

    for (normal, u, v) in FACES {
        let base = positions.len() as u32;
        let center = normal * 0.5;
        for (su, sv) in [(-0.5_f32, -0.5_f32), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)] {
            positions.push(center + u * su + v * sv);
            normals.push(normal);
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    MeshData::new(positions, normals, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_winding_matches_normals() {
        let triangles = cube().to_triangles(0);
        assert_eq!(triangles.len(), 12);

        for triangle in &triangles {
            let [p0, p1, p2] = triangle.vertex_positions();
            let face_normal = (p1 - p0).cross(p2 - p0).normalized();
            assert!(face_normal.dot(triangle.normal(0)) > 0.99);
            for p in [p0, p1, p2] {
                assert!(p.x.abs() == 0.5 || p.y.abs() == 0.5 || p.z.abs() == 0.5);
            }
        }
    }

    #[test]
    fn test_quad() {
        let triangles = quad().to_triangles(1);
        assert_eq!(triangles.len(), 2);
        assert_eq!(triangle().triangle_count(), 1);
    }
}
