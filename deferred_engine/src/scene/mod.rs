//! Scene module
//!
//! Scene objects with their transforms, light components stored per object,
//! and the registry the lighting pass forwards from.

mod scene_object;
mod light_registry;
mod scene;

pub use scene_object::{SceneObject, Transform, MeshId, ObjectKey, LightKey};
pub use light_registry::{LightRegistry, LightLimits};
pub use scene::{Scene, LightForwardStats};
