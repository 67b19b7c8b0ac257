use std::{collections::VecDeque, mem::size_of};

use maths::Vec3;

use super::{Aabb, Ray, RayHit, Triangle};
use crate::{config::BvhConfig, error::BvhError};

/// Flat BVH node as read by the traversal shader.
///
/// Interior nodes store two child node indices. Leaves store
/// `left_child = -(first_primitive + 1)` and `right_child = primitive_count`,
/// so a negative `left_child` is the leaf marker and offset 0 stays
/// representable.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BvhNode {
    pub bounds_min: [f32; 4],
    pub bounds_max: [f32; 4],
    pub left_child: i32,
    pub right_child: i32,
    pub _padding: [i32; 2],
}

const _: () = assert!(size_of::<BvhNode>() == 48);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Interior {
        left: usize,
        right: usize,
    },
    Leaf {
        first_primitive: usize,
        primitive_count: usize,
    },
}

impl BvhNode {
    fn new_leaf(bounds: &Aabb, first_primitive: usize, primitive_count: usize) -> Self {
        Self {
            bounds_min: bounds.min.to_padded(0.0),
            bounds_max: bounds.max.to_padded(0.0),
            left_child: -(first_primitive as i32 + 1),
            right_child: primitive_count as i32,
            _padding: [0; 2],
        }
    }

    fn new_interior(bounds: &Aabb, left_child: usize, right_child: usize) -> Self {
        Self {
            bounds_min: bounds.min.to_padded(0.0),
            bounds_max: bounds.max.to_padded(0.0),
            left_child: left_child as i32,
            right_child: right_child as i32,
            _padding: [0; 2],
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.left_child < 0
    }

    pub fn kind(&self) -> NodeKind {
        if self.is_leaf() {
            NodeKind::Leaf {
                first_primitive: (-(self.left_child + 1)) as usize,
                primitive_count: self.right_child.max(0) as usize,
            }
        } else {
            NodeKind::Interior {
                left: self.left_child as usize,
                right: self.right_child.max(0) as usize,
            }
        }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::new(
            Vec3::from_padded(&self.bounds_min),
            Vec3::from_padded(&self.bounds_max),
        )
    }

    fn set_bounds(&mut self, bounds: &Aabb) {
        self.bounds_min = bounds.min.to_padded(0.0);
        self.bounds_max = bounds.max.to_padded(0.0);
    }
}

/// Per-triangle record used only while building.
#[derive(Clone, Copy, Debug)]
struct BvhPrimitive {
    index: u32,
    bounds: Aabb,
    centroid: Vec3,
}

impl BvhPrimitive {
    fn from_triangle(index: usize, triangle: &Triangle) -> Self {
        Self {
            index: index as u32,
            bounds: triangle.bounds(),
            // Split decisions use the vertex average, not the box center.
            centroid: triangle.vertex_average(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct Bucket {
    count: usize,
    bounds: Aabb,
}

/// Winning SAH candidate: split `axis` at the lower edge of `bucket`.
#[derive(Clone, Copy, Debug)]
struct SplitCandidate {
    cost: f64,
    axis: usize,
    bucket: usize,
    centroid_min: f32,
    centroid_max: f32,
}

/// Surface area in f64. Extents near `f32::MAX` overflow the f32 product.
fn sah_area(bounds: &Aabb) -> f64 {
    if bounds.is_empty() {
        return 0.0;
    }

    let d = [0, 1, 2].map(|axis| f64::from(bounds.max[axis]) - f64::from(bounds.min[axis]));
    2.0 * (d[0] * d[1] + d[1] * d[2] + d[0] * d[2])
}

fn bucket_index(value: f32, min: f32, max: f32, bucket_count: usize) -> usize {
    let relative = (value - min) / (max - min);
    ((bucket_count as f32 * relative) as usize).min(bucket_count - 1)
}

impl SplitCandidate {
    fn goes_left(&self, primitive: &BvhPrimitive, bucket_count: usize) -> bool {
        bucket_index(
            primitive.centroid[self.axis],
            self.centroid_min,
            self.centroid_max,
            bucket_count,
        ) < self.bucket
    }
}

/// Moves every item matching `pred` to the front, keeping their relative
/// order. Returns the number of matching items.
fn partition_in_place<T>(items: &mut [T], pred: impl Fn(&T) -> bool) -> usize {
    let mut split = 0;
    for i in 0..items.len() {
        if pred(&items[i]) {
            items.swap(split, i);
            split += 1;
        }
    }
    split
}

/// Bounding volume hierarchy over a triangle array.
///
/// The node array and the primitive index array are flat and pointer-free,
/// so both can be uploaded as-is. Node 0 is the root. Children always have
/// a larger index than their parent.
#[derive(Clone, Debug, Default)]
pub struct Bvh {
    nodes: Vec<BvhNode>,
    primitive_indices: Vec<u32>,
    triangle_count: usize,
    config: BvhConfig,
}

impl Bvh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: BvhConfig) -> Result<Self, BvhError> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    /// Builds a hierarchy over `triangles` with the default config.
    pub fn from_triangles(triangles: &[Triangle]) -> Self {
        let mut bvh = Self::new();
        bvh.build(triangles);
        bvh
    }

    pub fn config(&self) -> &BvhConfig {
        &self.config
    }

    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes
    }

    pub fn primitive_indices(&self) -> &[u32] {
        &self.primitive_indices
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of triangles the current topology was built over.
    pub fn triangle_count(&self) -> usize {
        self.triangle_count
    }

    pub fn node_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.nodes)
    }

    pub fn primitive_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.primitive_indices)
    }

    pub fn root_bounds(&self) -> Option<Aabb> {
        self.nodes.first().map(BvhNode::bounds)
    }

    /// Primitive indices referenced by a leaf. Empty for interior nodes.
    pub fn leaf_primitives(&self, node: &BvhNode) -> &[u32] {
        match node.kind() {
            NodeKind::Leaf {
                first_primitive,
                primitive_count,
            } => &self.primitive_indices[first_primitive..first_primitive + primitive_count],
            NodeKind::Interior { .. } => &[],
        }
    }

    /// Discards the current hierarchy and builds a new one over `triangles`.
    /// An empty slice leaves both arrays empty.
    pub fn build(&mut self, triangles: &[Triangle]) {
        self.nodes.clear();
        self.primitive_indices.clear();
        self.triangle_count = triangles.len();

        if triangles.is_empty() {
            log::warn!("No triangles to build BVH for");
            return;
        }

        let mut primitives: Vec<BvhPrimitive> = triangles
            .iter()
            .enumerate()
            .map(|(index, triangle)| BvhPrimitive::from_triangle(index, triangle))
            .collect();

        // The number of nodes in the worst case (when every leaf holds a single
        // triangle) is 2 * triangle_count - 1.
        self.nodes.reserve(2 * triangles.len());
        self.primitive_indices.reserve(triangles.len());

        self.build_recursive(&mut primitives);

        if log::log_enabled!(log::Level::Debug) {
            let stats = self.stats();
            log::debug!(
                "BVH built with {} nodes ({} leaves, depth {}) for {} triangles",
                stats.node_count,
                stats.leaf_count,
                stats.max_depth,
                triangles.len()
            );
        }
    }

    fn build_recursive(&mut self, primitives: &mut [BvhPrimitive]) -> usize {
        let node_index = self.nodes.len();
        self.nodes.push(BvhNode::default());

        let mut bounds = Aabb::empty();
        for primitive in primitives.iter() {
            bounds.grow_with(&primitive.bounds);
        }

        if primitives.len() <= self.config.max_leaf_size {
            self.emit_leaf(node_index, &bounds, primitives);
            return node_index;
        }

        let split = match self.find_best_split(primitives, &bounds) {
            Some(split) if split.cost < f64::from(self.config.leaf_cost(primitives.len())) => {
                split
            }
            _ => {
                self.emit_leaf(node_index, &bounds, primitives);
                return node_index;
            }
        };

        let bucket_count = self.config.bucket_count;
        let mid = partition_in_place(primitives, |p| split.goes_left(p, bucket_count))
            .clamp(1, primitives.len() - 1);

        let (left, right) = primitives.split_at_mut(mid);
        let left_child = self.build_recursive(left);
        let right_child = self.build_recursive(right);

        self.nodes[node_index] = BvhNode::new_interior(&bounds, left_child, right_child);
        node_index
    }

    fn emit_leaf(&mut self, node_index: usize, bounds: &Aabb, primitives: &[BvhPrimitive]) {
        let first_primitive = self.primitive_indices.len();
        self.primitive_indices
            .extend(primitives.iter().map(|primitive| primitive.index));
        self.nodes[node_index] = BvhNode::new_leaf(bounds, first_primitive, primitives.len());
    }

    /// Binned SAH search over all three axes. Returns `None` when no axis
    /// has a centroid spread or no boundary leaves both sides non-empty.
    fn find_best_split(&self, primitives: &[BvhPrimitive], bounds: &Aabb) -> Option<SplitCandidate> {
        let bucket_count = self.config.bucket_count;
        // Flat clusters still split; the children are just as flat.
        let parent_area = sah_area(bounds).max(f64::MIN_POSITIVE);
        let traversal_cost = f64::from(self.config.traversal_cost);
        let intersection_cost = f64::from(self.config.intersection_cost);

        let mut buckets = vec![Bucket::default(); bucket_count];
        let mut right_area_counts = vec![0.0_f64; bucket_count];
        let mut best: Option<SplitCandidate> = None;

        for axis in 0..3 {
            let mut centroid_min = f32::INFINITY;
            let mut centroid_max = f32::NEG_INFINITY;
            for primitive in primitives {
                centroid_min = centroid_min.min(primitive.centroid[axis]);
                centroid_max = centroid_max.max(primitive.centroid[axis]);
            }

            let span = centroid_max - centroid_min;
            if !(span > 0.0) || !span.is_finite() {
                continue;
            }

            buckets.fill(Bucket::default());
            for primitive in primitives {
                let bucket = &mut buckets[bucket_index(
                    primitive.centroid[axis],
                    centroid_min,
                    centroid_max,
                    bucket_count,
                )];
                bucket.count += 1;
                bucket.bounds.grow_with(&primitive.bounds);
            }

            let mut right_bounds = Aabb::empty();
            let mut right_count = 0;
            for boundary in (1..bucket_count).rev() {
                right_bounds.grow_with(&buckets[boundary].bounds);
                right_count += buckets[boundary].count;
                right_area_counts[boundary] = right_count as f64 * sah_area(&right_bounds);
            }

            let mut left_bounds = Aabb::empty();
            let mut left_count = 0;
            for boundary in 1..bucket_count {
                left_bounds.grow_with(&buckets[boundary - 1].bounds);
                left_count += buckets[boundary - 1].count;

                if left_count == 0 || left_count == primitives.len() {
                    continue;
                }

                let cost = traversal_cost
                    + intersection_cost
                        * (left_count as f64 * sah_area(&left_bounds) + right_area_counts[boundary])
                        / parent_area;

                if !cost.is_finite() {
                    continue;
                }

                if best.is_none_or(|best| cost < best.cost) {
                    best = Some(SplitCandidate {
                        cost,
                        axis,
                        bucket: boundary,
                        centroid_min,
                        centroid_max,
                    });
                }
            }
        }

        best
    }

    /// Recomputes every node's bounds from the current triangle positions
    /// without touching the topology.
    ///
    /// `triangles` must be the array the hierarchy was built over, with only
    /// positions changed. The triangle count is checked; which triangle sits
    /// at which index is the caller's contract.
    pub fn refit(&mut self, triangles: &[Triangle]) -> Result<(), BvhError> {
        if triangles.len() != self.triangle_count {
            return Err(BvhError::TriangleCountMismatch {
                expected: self.triangle_count,
                actual: triangles.len(),
            });
        }

        // Children sit after their parent, so a reverse sweep visits every
        // child before the node that unions it.
        for node_index in (0..self.nodes.len()).rev() {
            let bounds = match self.nodes[node_index].kind() {
                NodeKind::Leaf {
                    first_primitive,
                    primitive_count,
                } => {
                    let mut bounds = Aabb::empty();
                    for &triangle_index in
                        &self.primitive_indices[first_primitive..first_primitive + primitive_count]
                    {
                        bounds.grow_with(&triangles[triangle_index as usize].bounds());
                    }
                    bounds
                }
                NodeKind::Interior { left, right } => {
                    debug_assert!(left > node_index && right > node_index);
                    self.nodes[left].bounds().union(&self.nodes[right].bounds())
                }
            };

            self.nodes[node_index].set_bounds(&bounds);
        }

        log::debug!("BVH refit {} nodes", self.nodes.len());
        Ok(())
    }

    /// Checks the structural invariants and, when `triangles` is given,
    /// that every leaf box contains its triangles.
    pub fn validate(&self, triangles: Option<&[Triangle]>) -> Result<(), BvhError> {
        let invalid = |message: String| Err(BvhError::Invalid(message));

        if self.nodes.is_empty() {
            if !self.primitive_indices.is_empty() || self.triangle_count != 0 {
                return invalid("empty node array with primitives".to_string());
            }
            return Ok(());
        }

        if self.primitive_indices.len() != self.triangle_count {
            return invalid(format!(
                "{} primitive indices for {} triangles",
                self.primitive_indices.len(),
                self.triangle_count
            ));
        }

        let mut parent_count = vec![0_u32; self.nodes.len()];
        let mut seen = vec![false; self.triangle_count];

        for (node_index, node) in self.nodes.iter().enumerate() {
            match node.kind() {
                NodeKind::Interior { left, right } => {
                    for child in [left, right] {
                        if child <= node_index || child >= self.nodes.len() {
                            return invalid(format!(
                                "node {node_index} has out-of-order child {child}"
                            ));
                        }
                        parent_count[child] += 1;
                    }

                    let union = self.nodes[left].bounds().union(&self.nodes[right].bounds());
                    if union != node.bounds() {
                        return invalid(format!(
                            "node {node_index} bounds differ from the union of its children"
                        ));
                    }
                }
                NodeKind::Leaf {
                    first_primitive,
                    primitive_count,
                } => {
                    if primitive_count == 0
                        || first_primitive + primitive_count > self.primitive_indices.len()
                    {
                        return invalid(format!(
                            "leaf {node_index} references primitives \
                             {first_primitive}..{}",
                            first_primitive + primitive_count
                        ));
                    }

                    let bounds = node.bounds();
                    for &triangle_index in self.leaf_primitives(node) {
                        let triangle_index = triangle_index as usize;
                        match seen.get_mut(triangle_index) {
                            Some(seen) if !*seen => *seen = true,
                            _ => {
                                return invalid(format!(
                                    "triangle {triangle_index} is out of range or referenced twice"
                                ));
                            }
                        }

                        if let Some(triangles) = triangles {
                            let contained = triangles
                                .get(triangle_index)
                                .is_some_and(|t| bounds.contains(&t.bounds()));
                            if !contained {
                                return invalid(format!(
                                    "leaf {node_index} does not contain triangle {triangle_index}"
                                ));
                            }
                        }
                    }
                }
            }
        }

        if let Some(orphan) = parent_count
            .iter()
            .enumerate()
            .skip(1)
            .position(|(_, &count)| count != 1)
        {
            return invalid(format!("node {} has no single parent", orphan + 1));
        }

        if parent_count[0] != 0 {
            return invalid("root is referenced as a child".to_string());
        }

        Ok(())
    }

    pub fn stats(&self) -> BvhStats {
        let mut stats = BvhStats {
            node_count: self.nodes.len(),
            root_bounds: self.root_bounds(),
            ..BvhStats::default()
        };

        if self.nodes.is_empty() {
            return stats;
        }

        let mut total_leaf_primitives = 0;
        let mut queue = VecDeque::from([(0_usize, 1_usize)]);
        while let Some((node_index, depth)) = queue.pop_front() {
            stats.max_depth = stats.max_depth.max(depth);
            match self.nodes[node_index].kind() {
                NodeKind::Interior { left, right } => {
                    queue.push_back((left, depth + 1));
                    queue.push_back((right, depth + 1));
                }
                NodeKind::Leaf {
                    primitive_count, ..
                } => {
                    stats.leaf_count += 1;
                    stats.max_leaf_size = stats.max_leaf_size.max(primitive_count);
                    total_leaf_primitives += primitive_count;
                }
            }
        }

        stats.average_leaf_size = total_leaf_primitives as f32 / stats.leaf_count as f32;
        stats
    }

    /// Closest hit against the triangles the hierarchy was built over.
    ///
    /// `triangles` should be that same array. Leaf entries past its end are
    /// skipped, so a shorter slice only loses hits.
    pub fn intersect(&self, triangles: &[Triangle], ray: &Ray) -> Option<RayHit> {
        let mut closest: Option<RayHit> = None;
        let mut closest_t = f32::INFINITY;
        let mut stack = Vec::with_capacity(64);

        if !self.nodes.is_empty() {
            stack.push(0_usize);
        }

        while let Some(node_index) = stack.pop() {
            let node = &self.nodes[node_index];
            if node
                .bounds()
                .intersect_ray(ray.origin, ray.inv_direction(), closest_t)
                .is_none()
            {
                continue;
            }

            match node.kind() {
                NodeKind::Interior { left, right } => {
                    stack.push(right);
                    stack.push(left);
                }
                NodeKind::Leaf { .. } => {
                    for &triangle_index in self.leaf_primitives(node) {
                        let Some(triangle) = triangles.get(triangle_index as usize) else {
                            continue;
                        };
                        if let Some((t, u, v)) = triangle.intersect(ray, closest_t) {
                            closest_t = t;
                            closest = Some(RayHit {
                                t,
                                triangle_index: triangle_index as usize,
                                barycentric: (u, v),
                                material_id: triangle.material_id,
                            });
                        }
                    }
                }
            }
        }

        closest
    }

    /// Twelve box edges per node with finite bounds, for wireframe overlays.
    pub fn debug_lines(&self) -> Vec<BvhDebugLine> {
        const EDGE_INDICES: [(usize, usize); 12] = [
            (0, 1), // bottom face
            (1, 3),
            (3, 2),
            (2, 0),
            (4, 5), // top face
            (5, 7),
            (7, 6),
            (6, 4),
            (0, 4), // pillars
            (1, 5),
            (2, 6),
            (3, 7),
        ];

        let mut lines = Vec::with_capacity(self.nodes.len() * EDGE_INDICES.len());
        for node in &self.nodes {
            let Aabb { min, max } = node.bounds();
            if !min.is_finite() || !max.is_finite() {
                continue;
            }

            let corners = [
                Vec3::new(min.x, min.y, min.z),
                Vec3::new(max.x, min.y, min.z),
                Vec3::new(min.x, max.y, min.z),
                Vec3::new(max.x, max.y, min.z),
                Vec3::new(min.x, min.y, max.z),
                Vec3::new(max.x, min.y, max.z),
                Vec3::new(min.x, max.y, max.z),
                Vec3::new(max.x, max.y, max.z),
            ];

            lines.extend(EDGE_INDICES.iter().map(|&(start, end)| BvhDebugLine {
                start: corners[start],
                end: corners[end],
                is_leaf: node.is_leaf(),
            }));
        }

        lines
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BvhStats {
    pub node_count: usize,
    pub leaf_count: usize,
    pub max_depth: usize,
    pub max_leaf_size: usize,
    pub average_leaf_size: f32,
    pub root_bounds: Option<Aabb>,
}

#[derive(Clone, Copy, Debug)]
pub struct BvhDebugLine {
    pub start: Vec3,
    pub end: Vec3,
    pub is_leaf: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_triangle_at(offset: Vec3) -> Triangle {
        Triangle::flat([offset, offset + Vec3::X, offset + Vec3::Y], 0)
    }

    fn row_of_triangles(count: usize) -> Vec<Triangle> {
        (0..count)
            .map(|i| unit_triangle_at(Vec3::new(i as f32 * 3.0, 0.0, 0.0)))
            .collect()
    }

    #[test]
    fn test_node_layout() {
        let node = BvhNode::new_leaf(&Aabb::new(Vec3::ZERO, Vec3::ONE), 0, 3);
        assert_eq!(node.left_child, -1);
        assert_eq!(node.right_child, 3);
        assert_eq!(
            node.kind(),
            NodeKind::Leaf {
                first_primitive: 0,
                primitive_count: 3
            }
        );

        let node = BvhNode::new_interior(&Aabb::new(Vec3::ZERO, Vec3::ONE), 1, 2);
        assert!(!node.is_leaf());
        assert_eq!(node.kind(), NodeKind::Interior { left: 1, right: 2 });
        assert_eq!(bytemuck::bytes_of(&node).len(), 48);
    }

    #[test]
    fn test_empty_input() {
        let bvh = Bvh::from_triangles(&[]);
        assert!(bvh.is_empty());
        assert!(bvh.primitive_indices().is_empty());
        assert!(bvh.validate(None).is_ok());
        assert_eq!(bvh.stats(), BvhStats::default());
    }

    #[test]
    fn test_small_input_is_single_leaf() {
        let triangles = row_of_triangles(3);
        let bvh = Bvh::from_triangles(&triangles);

        assert_eq!(bvh.nodes().len(), 1);
        assert!(bvh.nodes()[0].is_leaf());
        assert_eq!(bvh.primitive_indices(), &[0, 1, 2]);
        assert!(bvh.validate(Some(&triangles)).is_ok());
    }

    #[test]
    fn test_split_partitions_by_centroid() {
        let triangles = row_of_triangles(16);
        let bvh = Bvh::from_triangles(&triangles);
        bvh.validate(Some(&triangles)).unwrap();

        let NodeKind::Interior { left, right } = bvh.nodes()[0].kind() else {
            panic!("root should be interior");
        };
        let left_max = bvh.nodes()[left].bounds().max.x;
        let right_min = bvh.nodes()[right].bounds().min.x;
        assert!(left_max <= right_min);
    }

    #[test]
    fn test_find_best_split_skips_zero_span() {
        let bvh = Bvh::new();
        let primitives: Vec<BvhPrimitive> = (0..8)
            .map(|i| BvhPrimitive {
                index: i,
                bounds: Aabb::new(Vec3::ZERO, Vec3::ONE),
                centroid: Vec3::splat(0.5),
            })
            .collect();

        assert!(
            bvh.find_best_split(&primitives, &Aabb::new(Vec3::ZERO, Vec3::ONE))
                .is_none()
        );
    }

    #[test]
    fn test_partition_is_stable_on_the_left() {
        let mut items = [5, 2, 8, 1, 9, 4];
        let split = partition_in_place(&mut items, |&x| x < 5);
        assert_eq!(split, 3);
        assert_eq!(&items[..split], &[2, 1, 4]);
    }

    #[test]
    fn test_refit_checks_triangle_count() {
        let triangles = row_of_triangles(8);
        let mut bvh = Bvh::from_triangles(&triangles);

        let result = bvh.refit(&triangles[..7]);
        assert!(matches!(
            result,
            Err(BvhError::TriangleCountMismatch {
                expected: 8,
                actual: 7
            })
        ));
    }

    #[test]
    fn test_refit_tracks_moved_triangle() {
        let mut triangles = row_of_triangles(12);
        let mut bvh = Bvh::from_triangles(&triangles);
        let topology: Vec<(i32, i32)> = bvh
            .nodes()
            .iter()
            .map(|n| (n.left_child, n.right_child))
            .collect();

        let moved = triangles[5].vertex_positions().map(|p| p + Vec3::new(0.0, 50.0, 0.0));
        triangles[5].set_positions(moved);
        bvh.refit(&triangles).unwrap();

        assert_eq!(bvh.root_bounds().unwrap().max.y, 51.0);
        bvh.validate(Some(&triangles)).unwrap();
        let after: Vec<(i32, i32)> = bvh
            .nodes()
            .iter()
            .map(|n| (n.left_child, n.right_child))
            .collect();
        assert_eq!(topology, after);
    }

    #[test]
    fn test_custom_leaf_size() {
        let triangles = row_of_triangles(16);
        let mut bvh = Bvh::with_config(BvhConfig::default().with_max_leaf_size(1)).unwrap();
        bvh.build(&triangles);

        let stats = bvh.stats();
        assert_eq!(stats.leaf_count, 16);
        assert_eq!(stats.node_count, 31);
        assert_eq!(stats.max_leaf_size, 1);
        bvh.validate(Some(&triangles)).unwrap();
    }

    #[test]
    fn test_intersect_finds_closest() {
        let triangles: Vec<Triangle> = (0..10)
            .map(|i| {
                let z = -(i as f32) * 2.0;
                Triangle::flat(
                    [
                        Vec3::new(-1.0, -1.0, z),
                        Vec3::new(1.0, -1.0, z),
                        Vec3::new(0.0, 1.0, z),
                    ],
                    i,
                )
            })
            .collect();
        let bvh = Bvh::from_triangles(&triangles);

        let hit = bvh
            .intersect(&triangles, &Ray::new(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z))
            .unwrap();
        assert_eq!(hit.triangle_index, 0);
        assert_eq!(hit.material_id, 0);

        let hit = bvh
            .intersect(&triangles, &Ray::new(Vec3::new(0.0, 0.0, -25.0), Vec3::Z))
            .unwrap();
        assert_eq!(hit.triangle_index, 9);

        assert!(
            bvh.intersect(&triangles, &Ray::new(Vec3::new(5.0, 5.0, 5.0), -Vec3::Z))
                .is_none()
        );
    }

    #[test]
    fn test_intersect_skips_missing_triangles() {
        let triangles = row_of_triangles(8);
        let bvh = Bvh::from_triangles(&triangles);
        let ray = Ray::new(Vec3::new(18.25, 0.25, 1.0), -Vec3::Z);

        let hit = bvh.intersect(&triangles, &ray).unwrap();
        assert_eq!(hit.triangle_index, 6);
        assert!(bvh.intersect(&triangles[..4], &ray).is_none());
    }

    #[test]
    fn test_stats_after_single_split() {
        let triangles = row_of_triangles(5);
        let bvh = Bvh::from_triangles(&triangles);

        let stats = bvh.stats();
        assert_eq!(stats.node_count, 3);
        assert_eq!(stats.leaf_count, 2);
        assert_eq!(stats.max_depth, 2);
        assert_eq!(stats.average_leaf_size, 2.5);
        assert_eq!(stats.root_bounds, bvh.root_bounds());
    }

    #[test]
    fn test_huge_extents_still_split() {
        // Root surface area overflows f32 here.
        let triangles: Vec<Triangle> = (0..20)
            .map(|i| {
                let b = i as f32 * 1e36;
                Triangle::new(
                    [
                        Vec3::new(b, b, 0.0),
                        Vec3::new(b, b, 1.0),
                        Vec3::new(b, b, 2.0),
                    ],
                    [Vec3::X; 3],
                    0,
                )
            })
            .collect();
        assert!(bvh_root_area_overflows(&triangles));

        let bvh = Bvh::from_triangles(&triangles);
        let stats = bvh.stats();
        assert!(stats.node_count > 1);
        assert!(stats.max_leaf_size <= 4);
        bvh.validate(Some(&triangles)).unwrap();
    }

    fn bvh_root_area_overflows(triangles: &[Triangle]) -> bool {
        let mut bounds = Aabb::empty();
        for triangle in triangles {
            bounds.grow_with(&triangle.bounds());
        }
        bounds.surface_area().is_infinite() && sah_area(&bounds).is_finite()
    }

    #[test]
    fn test_debug_lines() {
        let triangles = row_of_triangles(8);
        let bvh = Bvh::from_triangles(&triangles);

        let lines = bvh.debug_lines();
        assert_eq!(lines.len(), bvh.nodes().len() * 12);
        assert_eq!(
            lines.iter().filter(|line| line.is_leaf).count(),
            bvh.stats().leaf_count * 12
        );
    }
}
