use std::mem::{offset_of, size_of};

use maths::{Mat3, Mat4, Vec3};

pub mod aabb;
pub mod bvh;

pub use aabb::Aabb;

/// World-space triangle as laid out in the shader's triangle buffer.
///
/// Positions and normals are padded to 16 bytes with `w = 0`. `centroid`
/// caches the vertex average and is rewritten whenever positions change.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Triangle {
    pub positions: [[f32; 4]; 3],
    pub normals: [[f32; 4]; 3],
    pub material_id: i32,
    pub centroid: [f32; 3],
}

const _: () = assert!(size_of::<Triangle>() == 112);

// Triangle buffer layout, in f32 words.
pub const TRIANGLE_STRIDE: u32 = (size_of::<Triangle>() / size_of::<f32>()) as u32;
pub const TRIANGLE_NORMAL_OFFSET: u32 = (offset_of!(Triangle, normals) / size_of::<f32>()) as u32;
pub const TRIANGLE_MATERIAL_OFFSET: u32 =
    (offset_of!(Triangle, material_id) / size_of::<f32>()) as u32;
pub const TRIANGLE_CENTROID_OFFSET: u32 =
    (offset_of!(Triangle, centroid) / size_of::<f32>()) as u32;

impl Triangle {
    pub fn new(positions: [Vec3; 3], normals: [Vec3; 3], material_id: i32) -> Self {
        let mut triangle = Self {
            positions: [[0.0; 4]; 3],
            normals: normals.map(|n| n.to_padded(0.0)),
            material_id,
            centroid: [0.0; 3],
        };
        triangle.set_positions(positions);
        triangle
    }

    /// Triangle with the face normal on all three vertices.
    pub fn flat(positions: [Vec3; 3], material_id: i32) -> Self {
        let [p0, p1, p2] = positions;
        let normal = (p1 - p0).cross(p2 - p0).normalized();
        Self::new(positions, [normal; 3], material_id)
    }

    pub fn position(&self, vertex: usize) -> Vec3 {
        Vec3::from_padded(&self.positions[vertex])
    }

    pub fn vertex_positions(&self) -> [Vec3; 3] {
        [self.position(0), self.position(1), self.position(2)]
    }

    pub fn normal(&self, vertex: usize) -> Vec3 {
        Vec3::from_padded(&self.normals[vertex])
    }

    pub fn centroid(&self) -> Vec3 {
        Vec3::from_array(&self.centroid)
    }

    /// Vertex average, computed from the current positions.
    pub fn vertex_average(&self) -> Vec3 {
        let [p0, p1, p2] = self.vertex_positions();
        (p0 + p1 + p2) / 3.0
    }

    pub fn set_positions(&mut self, positions: [Vec3; 3]) {
        self.positions = positions.map(|p| p.to_padded(0.0));
        self.centroid = self.vertex_average().to_array();
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(&self.vertex_positions())
    }

    /// Applies a model matrix to the positions and its normal matrix to the
    /// normals. `normal_matrix` is passed in so batches compute it once.
    pub fn transformed(&self, model: &Mat4, normal_matrix: &Mat3) -> Self {
        let positions = self.vertex_positions().map(|p| model.transform_point(p));
        let normals = [self.normal(0), self.normal(1), self.normal(2)]
            .map(|n| (*normal_matrix * n).normalized());
        Self::new(positions, normals, self.material_id)
    }

    /// Möller-Trumbore. Returns `(t, u, v)` for hits with `t` in `(epsilon, t_max)`.
    pub fn intersect(&self, ray: &Ray, t_max: f32) -> Option<(f32, f32, f32)> {
        const EPSILON: f32 = 1e-7;

        let [p0, p1, p2] = self.vertex_positions();
        let edge1 = p1 - p0;
        let edge2 = p2 - p0;
        let h = ray.direction.cross(edge2);
        let det = edge1.dot(h);
        if det.abs() < EPSILON {
            return None;
        }

        let inv_det = 1.0 / det;
        let s = ray.origin - p0;
        let u = inv_det * s.dot(h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = inv_det * ray.direction.dot(q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = inv_det * edge2.dot(q);
        if t > EPSILON && t < t_max {
            Some((t, u, v))
        } else {
            None
        }
    }
}

pub fn triangle_bytes(triangles: &[Triangle]) -> &[u8] {
    bytemuck::cast_slice(triangles)
}

#[derive(Clone, Copy, Debug)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    inv_direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        let direction = direction.normalized();
        Self {
            origin,
            direction,
            inv_direction: Vec3::new(1.0 / direction.x, 1.0 / direction.y, 1.0 / direction.z),
        }
    }

    pub fn inv_direction(&self) -> Vec3 {
        self.inv_direction
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    pub t: f32,
    /// Index into the triangle array the BVH was built over.
    pub triangle_index: usize,
    pub barycentric: (f32, f32),
    pub material_id: i32,
}
