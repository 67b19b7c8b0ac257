use core::ops::{Add, Div, Index, Mul, Neg, Sub};

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    pub const ONE: Self = Self::new(1.0, 1.0, 1.0);
    pub const X: Self = Self::new(1.0, 0.0, 0.0);
    pub const Y: Self = Self::new(0.0, 1.0, 0.0);
    pub const Z: Self = Self::new(0.0, 0.0, 1.0);
    pub const INFINITY: Self = Self::splat(f32::INFINITY);
    pub const NEG_INFINITY: Self = Self::splat(f32::NEG_INFINITY);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub const fn splat(value: f32) -> Self {
        Self::new(value, value, value)
    }

    pub const fn from_array(arr: &[f32; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }

    /// Drops the `w` component of a padded `[f32; 4]` GPU vector.
    pub const fn from_padded(arr: &[f32; 4]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }

    pub const fn to_array(&self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    /// Pads to a `[f32; 4]` with the given `w`, for 16-byte aligned buffers.
    pub const fn to_padded(&self, w: f32) -> [f32; 4] {
        [self.x, self.y, self.z, w]
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn normalized(&self) -> Self {
        let length = self.length();
        if length == 0.0 {
            return Self::ZERO;
        }

        Self::new(self.x / length, self.y / length, self.z / length)
    }

    pub const fn dot(&self, rhs: Self) -> f32 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    pub const fn cross(&self, rhs: Self) -> Self {
        Self::new(
            self.y * rhs.z - self.z * rhs.y,
            -(self.x * rhs.z - self.z * rhs.x),
            self.x * rhs.y - self.y * rhs.x,
        )
    }

    pub const fn min(a: Self, b: Self) -> Self {
        Self::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z))
    }

    pub const fn max(a: Self, b: Self) -> Self {
        Self::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z))
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Component access by axis: 0 = x, 1 = y, anything else = z.
impl Index<usize> for Vec3 {
    type Output = f32;

    fn index(&self, axis: usize) -> &Self::Output {
        match axis {
            0 => &self.x,
            1 => &self.y,
            _ => &self.z,
        }
    }
}

impl Add for Vec3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self::Output {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Div<f32> for Vec3 {
    type Output = Self;

    fn div(self, rhs: f32) -> Self::Output {
        Self::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl Neg for Vec3 {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y, -self.z)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Vec4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Vec4 {
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    pub const fn from_point(point: Vec3) -> Self {
        Self::new(point.x, point.y, point.z, 1.0)
    }

    pub const fn from_direction(vector: Vec3) -> Self {
        Self::new(vector.x, vector.y, vector.z, 0.0)
    }

    pub const fn to_array(&self) -> [f32; 4] {
        [self.x, self.y, self.z, self.w]
    }

    pub const fn truncate(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    pub const fn dot(&self, rhs: Self) -> f32 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z + self.w * rhs.w
    }
}

impl Mul<f32> for Vec4 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self::Output {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs, self.w * rhs)
    }
}

/// Column-major 3x3 matrix. Only used for the linear part of affine transforms.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mat3 {
    pub x_axis: Vec3,
    pub y_axis: Vec3,
    pub z_axis: Vec3,
}

impl Mat3 {
    pub const IDENTITY: Self = Self::from_cols(Vec3::X, Vec3::Y, Vec3::Z);

    pub const fn from_cols(x_axis: Vec3, y_axis: Vec3, z_axis: Vec3) -> Self {
        Self {
            x_axis,
            y_axis,
            z_axis,
        }
    }

    /// Upper-left 3x3 block of a 4x4 matrix.
    pub const fn from_mat4(mat: &Mat4) -> Self {
        Self::from_cols(
            mat.x_axis.truncate(),
            mat.y_axis.truncate(),
            mat.z_axis.truncate(),
        )
    }

    pub const fn transpose(&self) -> Self {
        Self::from_cols(
            Vec3::new(self.x_axis.x, self.y_axis.x, self.z_axis.x),
            Vec3::new(self.x_axis.y, self.y_axis.y, self.z_axis.y),
            Vec3::new(self.x_axis.z, self.y_axis.z, self.z_axis.z),
        )
    }

    pub const fn determinant(&self) -> f32 {
        self.z_axis.dot(self.x_axis.cross(self.y_axis))
    }

    /// Returns the identity for singular matrices, like [`Mat4::inverse`].
    pub fn inverse(&self) -> Self {
        let det = self.determinant();
        if det == 0.0 {
            return Self::IDENTITY;
        }

        // Rows of the inverse are the cross products of the columns.
        let row0 = self.y_axis.cross(self.z_axis);
        let row1 = self.z_axis.cross(self.x_axis);
        let row2 = self.x_axis.cross(self.y_axis);
        let inv_det = 1.0 / det;

        Self::from_cols(row0 * inv_det, row1 * inv_det, row2 * inv_det).transpose()
    }

    /// Matrix for transforming normals: the inverse-transpose.
    pub fn normal_matrix(mat: &Mat4) -> Self {
        Self::from_mat4(mat).inverse().transpose()
    }
}

impl Mul<Vec3> for Mat3 {
    type Output = Vec3;

    fn mul(self, rhs: Vec3) -> Self::Output {
        self.x_axis * rhs.x + self.y_axis * rhs.y + self.z_axis * rhs.z
    }
}

impl Mul<Mat3> for Mat3 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Self::from_cols(self * rhs.x_axis, self * rhs.y_axis, self * rhs.z_axis)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mat4 {
    pub x_axis: Vec4,
    pub y_axis: Vec4,
    pub z_axis: Vec4,
    pub w_axis: Vec4,
}

impl Mat4 {
    pub const IDENTITY: Self = Self::from_cols(
        Vec4::new(1.0, 0.0, 0.0, 0.0),
        Vec4::new(0.0, 1.0, 0.0, 0.0),
        Vec4::new(0.0, 0.0, 1.0, 0.0),
        Vec4::new(0.0, 0.0, 0.0, 1.0),
    );

    pub const fn from_cols(x_axis: Vec4, y_axis: Vec4, z_axis: Vec4, w_axis: Vec4) -> Self {
        Self {
            x_axis,
            y_axis,
            z_axis,
            w_axis,
        }
    }

    const fn row(&self, index: usize) -> Vec4 {
        match index {
            0 => Vec4::new(self.x_axis.x, self.y_axis.x, self.z_axis.x, self.w_axis.x),
            1 => Vec4::new(self.x_axis.y, self.y_axis.y, self.z_axis.y, self.w_axis.y),
            2 => Vec4::new(self.x_axis.z, self.y_axis.z, self.z_axis.z, self.w_axis.z),
            _ => Vec4::new(self.x_axis.w, self.y_axis.w, self.z_axis.w, self.w_axis.w),
        }
    }

    pub const fn transpose(&self) -> Self {
        Self::from_cols(self.row(0), self.row(1), self.row(2), self.row(3))
    }

    pub const fn determinant(&self) -> f32 {
        let [a1, a2, a3, a4] = self.x_axis.to_array();
        let [b1, b2, b3, b4] = self.y_axis.to_array();
        let [c1, c2, c3, c4] = self.z_axis.to_array();
        let [d1, d2, d3, d4] = self.w_axis.to_array();

        a1 * Self::det3(b2, b3, b4, c2, c3, c4, d2, d3, d4)
            - a2 * Self::det3(b1, b3, b4, c1, c3, c4, d1, d3, d4)
            + a3 * Self::det3(b1, b2, b4, c1, c2, c4, d1, d2, d4)
            - a4 * Self::det3(b1, b2, b3, c1, c2, c3, d1, d2, d3)
    }

    pub const fn cofactor(&self) -> Self {
        let [a1, a2, a3, a4] = self.x_axis.to_array();
        let [b1, b2, b3, b4] = self.y_axis.to_array();
        let [c1, c2, c3, c4] = self.z_axis.to_array();
        let [d1, d2, d3, d4] = self.w_axis.to_array();

        let coa1 = Self::det3(b2, b3, b4, c2, c3, c4, d2, d3, d4);
        let coa2 = -Self::det3(b1, b3, b4, c1, c3, c4, d1, d3, d4);
        let coa3 = Self::det3(b1, b2, b4, c1, c2, c4, d1, d2, d4);
        let coa4 = -Self::det3(b1, b2, b3, c1, c2, c3, d1, d2, d3);

        let cob1 = -Self::det3(a2, a3, a4, c2, c3, c4, d2, d3, d4);
        let cob2 = Self::det3(a1, a3, a4, c1, c3, c4, d1, d3, d4);
        let cob3 = -Self::det3(a1, a2, a4, c1, c2, c4, d1, d2, d4);
        let cob4 = Self::det3(a1, a2, a3, c1, c2, c3, d1, d2, d3);

        let coc1 = Self::det3(a2, a3, a4, b2, b3, b4, d2, d3, d4);
        let coc2 = -Self::det3(a1, a3, a4, b1, b3, b4, d1, d3, d4);
        let coc3 = Self::det3(a1, a2, a4, b1, b2, b4, d1, d2, d4);
        let coc4 = -Self::det3(a1, a2, a3, b1, b2, b3, d1, d2, d3);

        let cod1 = -Self::det3(a2, a3, a4, b2, b3, b4, c2, c3, c4);
        let cod2 = Self::det3(a1, a3, a4, b1, b3, b4, c1, c3, c4);
        let cod3 = -Self::det3(a1, a2, a4, b1, b2, b4, c1, c2, c4);
        let cod4 = Self::det3(a1, a2, a3, b1, b2, b3, c1, c2, c3);

        Self::from_cols(
            Vec4::new(coa1, coa2, coa3, coa4),
            Vec4::new(cob1, cob2, cob3, cob4),
            Vec4::new(coc1, coc2, coc3, coc4),
            Vec4::new(cod1, cod2, cod3, cod4),
        )
    }

    pub const fn adjugate(&self) -> Self {
        self.cofactor().transpose()
    }

    pub fn inverse(&self) -> Self {
        let det = self.determinant();
        if det == 0.0 {
            return Self::IDENTITY;
        }

        self.adjugate() * (1.0 / det)
    }

    pub fn from_translation(translation: Vec3) -> Self {
        Self::from_cols(
            Vec4::new(1.0, 0.0, 0.0, 0.0),
            Vec4::new(0.0, 1.0, 0.0, 0.0),
            Vec4::new(0.0, 0.0, 1.0, 0.0),
            Vec4::new(translation.x, translation.y, translation.z, 1.0),
        )
    }

    pub fn from_rotation(quat: Quat) -> Self {
        let (x, y, z, w) = (quat.x, quat.y, quat.z, quat.w);
        let (x2, y2, z2) = (x + x, y + y, z + z);

        let xx2 = x * x2;
        let yy2 = y * y2;
        let zz2 = z * z2;
        let xy2 = x * y2;
        let xz2 = x * z2;
        let yz2 = y * z2;
        let wx2 = w * x2;
        let wy2 = w * y2;
        let wz2 = w * z2;

        Self::from_cols(
            Vec4::new(1.0 - (yy2 + zz2), xy2 + wz2, xz2 - wy2, 0.0),
            Vec4::new(xy2 - wz2, 1.0 - (xx2 + zz2), yz2 + wx2, 0.0),
            Vec4::new(xz2 + wy2, yz2 - wx2, 1.0 - (xx2 + yy2), 0.0),
            Vec4::new(0.0, 0.0, 0.0, 1.0),
        )
    }

    /// Euler angles in radians, applied X first, then Y, then Z.
    pub fn from_euler(euler: Vec3) -> Self {
        Self::from_rotation(Quat::from_euler(euler))
    }

    pub fn from_scale(scale: Vec3) -> Self {
        Self::from_cols(
            Vec4::new(scale.x, 0.0, 0.0, 0.0),
            Vec4::new(0.0, scale.y, 0.0, 0.0),
            Vec4::new(0.0, 0.0, scale.z, 0.0),
            Vec4::new(0.0, 0.0, 0.0, 1.0),
        )
    }

    /// Transforms a point (`w = 1`) without a perspective divide.
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        (*self * Vec4::from_point(point)).truncate()
    }

    /// Transforms a direction (`w = 0`), ignoring translation.
    pub fn transform_vector(&self, vector: Vec3) -> Vec3 {
        (*self * Vec4::from_direction(vector)).truncate()
    }

    #[allow(clippy::too_many_arguments)]
    const fn det3(
        a1: f32,
        a2: f32,
        a3: f32,
        b1: f32,
        b2: f32,
        b3: f32,
        c1: f32,
        c2: f32,
        c3: f32,
    ) -> f32 {
        a1 * (b2 * c3 - b3 * c2) - a2 * (b1 * c3 - b3 * c1) + a3 * (b1 * c2 - b2 * c1)
    }
}

impl Mul<f32> for Mat4 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self::Output {
        Self::from_cols(
            self.x_axis * rhs,
            self.y_axis * rhs,
            self.z_axis * rhs,
            self.w_axis * rhs,
        )
    }
}

impl Mul<Vec4> for Mat4 {
    type Output = Vec4;

    fn mul(self, rhs: Vec4) -> Self::Output {
        Vec4::new(
            self.row(0).dot(rhs),
            self.row(1).dot(rhs),
            self.row(2).dot(rhs),
            self.row(3).dot(rhs),
        )
    }
}

impl Mul<Mat4> for Mat4 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Self::from_cols(
            self * rhs.x_axis,
            self * rhs.y_axis,
            self * rhs.z_axis,
            self * rhs.w_axis,
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Quat {
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    pub fn normalize(&self) -> Self {
        let length = (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt();
        if length == 0.0 {
            return Self::IDENTITY;
        }

        Self::new(
            self.x / length,
            self.y / length,
            self.z / length,
            self.w / length,
        )
    }

    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        let (sin_half_angle, cos_half_angle) = (angle * 0.5).sin_cos();

        Self::new(
            axis.x * sin_half_angle,
            axis.y * sin_half_angle,
            axis.z * sin_half_angle,
            cos_half_angle,
        )
        .normalize()
    }

    /// Euler angles in radians. The resulting rotation is `Rz * Ry * Rx`.
    pub fn from_euler(euler: Vec3) -> Self {
        let qx = Self::from_axis_angle(Vec3::X, euler.x);
        let qy = Self::from_axis_angle(Vec3::Y, euler.y);
        let qz = Self::from_axis_angle(Vec3::Z, euler.z);
        qz * qy * qx
    }

    pub const fn inverse(self) -> Self {
        // The inverse of a unit quaternion is its conjugate
        Self::new(-self.x, -self.y, -self.z, self.w)
    }
}

impl Mul<Quat> for Quat {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Self::new(
            self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            self.w * rhs.y + self.y * rhs.w + self.z * rhs.x - self.x * rhs.z,
            self.w * rhs.z + self.z * rhs.w + self.x * rhs.y - self.y * rhs.x,
            self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
        )
    }
}

impl Mul<Vec3> for Quat {
    type Output = Vec3;

    fn mul(self, rhs: Vec3) -> Self::Output {
        let v = Quat::new(rhs.x, rhs.y, rhs.z, 0.0);
        let rotated = self * v * self.inverse();
        Vec3::new(rotated.x, rotated.y, rotated.z)
    }
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

    #[test]
    fn test_mat4_inverse_roundtrip() {
        let m = Mat4::from_translation(Vec3::new(1.0, -2.0, 3.0))
            * Mat4::from_euler(Vec3::new(0.3, 1.1, -0.4))
            * Mat4::from_scale(Vec3::new(2.0, 0.5, 4.0));
        let p = Vec3::new(0.25, 7.0, -1.5);

        assert_vec3_eq(m.inverse().transform_point(m.transform_point(p)), p);
    }

    #[test]
    fn test_mat3_inverse() {
        let m = Mat3::from_mat4(&(Mat4::from_euler(Vec3::new(0.7, 0.2, 1.3))
            * Mat4::from_scale(Vec3::new(3.0, 1.0, 0.5))));
        let product = m * m.inverse();

        assert_vec3_eq(product.x_axis, Vec3::X);
        assert_vec3_eq(product.y_axis, Vec3::Y);
        assert_vec3_eq(product.z_axis, Vec3::Z);
    }

    #[test]
    fn test_euler_axis_order() {
        // X first: +Y goes to +Z, then Z rotation leaves +Z alone.
        let m = Mat4::from_euler(Vec3::new(FRAC_PI_2, 0.0, FRAC_PI_2));
        assert_vec3_eq(m.transform_vector(Vec3::Y), Vec3::Z);

        // +X is untouched by the X rotation and then turned to +Y.
        assert_vec3_eq(m.transform_vector(Vec3::X), Vec3::Y);
    }

    #[test]
    fn test_quat_matches_matrix() {
        let q = Quat::from_euler(Vec3::new(0.4, -0.9, 2.0));
        let v = Vec3::new(1.0, 2.0, 3.0);

        assert_vec3_eq(q * v, Mat4::from_rotation(q).transform_vector(v));
    }

    #[test]
    fn test_normal_matrix_non_uniform_scale() {
        // A plane tilted 45 degrees stays perpendicular to its normal after scaling.
        let m = Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0));
        let tangent = Vec3::new(1.0, -1.0, 0.0);
        let normal = Vec3::new(1.0, 1.0, 0.0);

        let n = Mat3::normal_matrix(&m) * normal;
        let t = m.transform_vector(tangent);
        assert_abs_diff_eq!(n.dot(t), 0.0, epsilon = 1e-5);
    }
}
