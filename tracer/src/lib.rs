pub mod config;
pub mod core;
pub mod error;
pub mod mesh;
pub mod raytracer;
pub mod scene;
pub mod transform;

pub use config::BvhConfig;
pub use error::{BvhError, SceneError};
pub use raytracer::{Aabb, Ray, RayHit, Triangle, bvh::Bvh};
pub use scene::{InstanceId, Scene, SceneUpdate};
pub use transform::Transform;
