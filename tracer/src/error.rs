use thiserror::Error;

use crate::scene::InstanceId;

#[derive(Debug, Error)]
pub enum BvhError {
    /// Refit needs the exact triangle set the hierarchy was built over.
    #[error("refit expected {expected} triangles but got {actual}")]
    TriangleCountMismatch { expected: usize, actual: usize },
    #[error("invalid BVH config: {0}")]
    InvalidConfig(String),
    #[error("malformed BVH: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("instance {0:?} does not exist")]
    UnknownInstance(InstanceId),
    #[error("mesh has no triangles")]
    EmptyMesh,
    #[error(transparent)]
    Bvh(#[from] BvhError),
}
