/// What changed in the scene since the last update.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DirtyFlags {
    /// Instances were added or removed: the triangle layout and the BVH
    /// topology are stale.
    pub geometry: bool,
    /// Some instance moved or changed material: triangle slices and BVH
    /// bounds are stale.
    pub transforms: bool,
}

impl DirtyFlags {
    pub fn any(&self) -> bool {
        self.geometry || self.transforms
    }
}
