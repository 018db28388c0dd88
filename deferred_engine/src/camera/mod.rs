//! Camera module - low-level passive camera.
//!
//! The engine does NOT store or manage cameras: they are owned and driven
//! by the caller and handed to the pipeline each frame.

mod camera;

pub use camera::Camera;
