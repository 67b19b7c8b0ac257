use maths::Vec3;

/// Axis-aligned bounding box.
///
/// The empty box has `min = +inf` and `max = -inf` so that expanding it by
/// anything yields exactly that thing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

impl Aabb {
    pub const fn empty() -> Self {
        Self {
            min: Vec3::INFINITY,
            max: Vec3::NEG_INFINITY,
        }
    }

    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn from_points(points: &[Vec3]) -> Self {
        let mut bounds = Self::empty();
        for &point in points {
            bounds.expand(point);
        }
        bounds
    }

    pub fn expand(&mut self, point: Vec3) {
        self.min = Vec3::min(self.min, point);
        self.max = Vec3::max(self.max, point);
    }

    pub fn grow_with(&mut self, other: &Aabb) {
        self.min = Vec3::min(self.min, other.min);
        self.max = Vec3::max(self.max, other.max);
    }

    pub fn union(mut self, other: &Aabb) -> Self {
        self.grow_with(other);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    /// Relative cost signal for the SAH. Empty boxes report zero.
    pub fn surface_area(&self) -> f32 {
        if self.is_empty() {
            return 0.0;
        }

        let d = self.extent();
        2.0 * (d.x * d.y + d.y * d.z + d.x * d.z)
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x
            && point.y >= self.min.y
            && point.z >= self.min.z
            && point.x <= self.max.x
            && point.y <= self.max.y
            && point.z <= self.max.z
    }

    pub fn contains(&self, other: &Aabb) -> bool {
        other.is_empty() || (self.contains_point(other.min) && self.contains_point(other.max))
    }

    /// Slab test. Returns the entry distance if the ray hits within `[0, t_max)`.
    pub fn intersect_ray(&self, origin: Vec3, inv_direction: Vec3, t_max: f32) -> Option<f32> {
        let mut t_near = 0.0_f32;
        let mut t_far = t_max;

        for axis in 0..3 {
            let t0 = (self.min[axis] - origin[axis]) * inv_direction[axis];
            let t1 = (self.max[axis] - origin[axis]) * inv_direction[axis];
            let (t0, t1) = if t0 > t1 { (t1, t0) } else { (t0, t1) };

            // NaN from 0 * inf (ray on the slab plane) must not reject the box.
            if !t0.is_nan() {
                t_near = t_near.max(t0);
            }
            if !t1.is_nan() {
                t_far = t_far.min(t1);
            }

            if t_near > t_far {
                return None;
            }
        }

        Some(t_near)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_merge_identity() {
        let unit = Aabb::new(Vec3::ZERO, Vec3::ONE);
        assert_eq!(Aabb::empty().union(&unit), unit);
        assert_eq!(unit.union(&Aabb::empty()), unit);
        assert!(Aabb::empty().is_empty());
        assert_eq!(Aabb::empty().surface_area(), 0.0);
    }

    #[test]
    fn test_expand_point() {
        let mut bounds = Aabb::empty();
        bounds.expand(Vec3::new(1.0, -2.0, 3.0));
        assert_eq!(bounds.min, bounds.max);

        bounds.expand(Vec3::new(-1.0, 2.0, 0.0));
        assert_eq!(bounds.min, Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(bounds.max, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_surface_area_and_center() {
        let bounds = Aabb::new(Vec3::ZERO, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(bounds.surface_area(), 2.0 * (2.0 + 6.0 + 3.0));
        assert_eq!(bounds.center(), Vec3::new(0.5, 1.0, 1.5));

        let flat = Aabb::new(Vec3::ZERO, Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(flat.surface_area(), 2.0);
    }

    #[test]
    fn test_ray_slab() {
        let bounds = Aabb::new(Vec3::splat(-1.0), Vec3::ONE);
        let inv = |d: Vec3| Vec3::new(1.0 / d.x, 1.0 / d.y, 1.0 / d.z);

        let hit = bounds.intersect_ray(Vec3::new(-5.0, 0.0, 0.0), inv(Vec3::X), f32::INFINITY);
        assert_eq!(hit, Some(4.0));

        let miss = bounds.intersect_ray(Vec3::new(-5.0, 3.0, 0.0), inv(Vec3::X), f32::INFINITY);
        assert_eq!(miss, None);

        let too_far = bounds.intersect_ray(Vec3::new(-5.0, 0.0, 0.0), inv(Vec3::X), 2.0);
        assert_eq!(too_far, None);

        let inside = bounds.intersect_ray(Vec3::ZERO, inv(Vec3::Y), f32::INFINITY);
        assert_eq!(inside, Some(0.0));
    }
}
