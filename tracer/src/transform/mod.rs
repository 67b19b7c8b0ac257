use maths::{Mat3, Mat4, Vec3};

use crate::raytracer::Triangle;

/// Position, rotation and scale of a mesh instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    /// Euler angles in radians, applied X, then Y, then Z.
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_uniform_scale(self, scale: f32) -> Self {
        self.with_scale(Vec3::splat(scale))
    }

    /// `translation * rotation * scale`.
    pub fn get_matrix(&self) -> Mat4 {
        let translation_matrix = Mat4::from_translation(self.position);
        let rotation_matrix = Mat4::from_euler(self.rotation);
        let scale_matrix = Mat4::from_scale(self.scale);
        translation_matrix * rotation_matrix * scale_matrix
    }
}

/// Writes `source` transformed by `model` into `target`, which must be the
/// same length. Positions get the full affine matrix; normals get the
/// inverse-transpose of its linear part and are renormalized. Every
/// centroid is recomputed.
pub fn apply_transform(source: &[Triangle], model: &Mat4, target: &mut [Triangle]) {
    assert_eq!(
        source.len(),
        target.len(),
        "transform source and target slices differ in length"
    );

    let normal_matrix = Mat3::normal_matrix(model);
    for (src, dst) in source.iter().zip(target.iter_mut()) {
        *dst = src.transformed(model, &normal_matrix);
    }
}

/// Allocating variant of [`apply_transform`].
pub fn transformed(source: &[Triangle], model: &Mat4) -> Vec<Triangle> {
    let mut target = vec![Triangle::default(); source.len()];
    apply_transform(source, model, &mut target);
    target
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f32::consts::FRAC_PI_2;

    fn assert_vec3_eq(a: Vec3, b: Vec3) {
        assert_abs_diff_eq!(a.x, b.x, epsilon = 1e-5);
        assert_abs_diff_eq!(a.y, b.y, epsilon = 1e-5);
        assert_abs_diff_eq!(a.z, b.z, epsilon = 1e-5);
    }

    fn sample_triangle() -> Triangle {
        Triangle::new(
            [Vec3::ZERO, Vec3::X, Vec3::Y],
            [Vec3::Z, Vec3::Y, Vec3::X],
            2,
        )
    }

    #[test]
    fn test_identity_is_noop() {
        let source = [sample_triangle()];
        let result = transformed(&source, &Transform::default().get_matrix());
        assert_eq!(result[0], source[0]);
    }

    #[test]
    fn test_translation_moves_positions_only() {
        let source = [sample_triangle()];
        let offset = Vec3::new(3.0, -2.0, 7.5);
        let result = transformed(&source, &Transform::new(offset).get_matrix());

        for vertex in 0..3 {
            assert_vec3_eq(result[0].position(vertex), source[0].position(vertex) + offset);
            assert_eq!(result[0].normal(vertex), source[0].normal(vertex));
        }
        assert_vec3_eq(result[0].centroid(), source[0].centroid() + offset);
        assert_eq!(result[0].material_id, 2);
    }

    #[test]
    fn test_rotation_and_scale() {
        let transform = Transform::default()
            .with_rotation(Vec3::new(0.0, 0.0, FRAC_PI_2))
            .with_scale(Vec3::new(2.0, 1.0, 1.0));
        let result = transformed(&[sample_triangle()], &transform.get_matrix());

        // Scale x by 2, then rotate a quarter turn about z.
        assert_vec3_eq(result[0].position(1), Vec3::new(0.0, 2.0, 0.0));
        assert_vec3_eq(result[0].position(2), Vec3::new(-1.0, 0.0, 0.0));
        assert_vec3_eq(result[0].normal(0), Vec3::Z);
        assert_vec3_eq(result[0].normal(1), -Vec3::X);
        assert_vec3_eq(result[0].normal(2), Vec3::Y);
    }

    #[test]
    fn test_non_uniform_scale_keeps_normals_perpendicular() {
        let source = Triangle::flat(
            [Vec3::ZERO, Vec3::new(1.0, 0.0, 1.0), Vec3::Y],
            0,
        );
        let transform = Transform::default().with_scale(Vec3::new(4.0, 1.0, 0.5));
        let result = transformed(&[source], &transform.get_matrix())[0];

        let [p0, p1, p2] = result.vertex_positions();
        let normal = result.normal(0);
        assert_abs_diff_eq!(normal.dot(p1 - p0), 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(normal.dot(p2 - p0), 0.0, epsilon = 1e-5);
    }

    #[test]
    #[should_panic]
    fn test_mismatched_lengths_panic() {
        let source = [sample_triangle(); 2];
        let mut target = [Triangle::default(); 1];
        apply_transform(&source, &Mat4::IDENTITY, &mut target);
    }
}
