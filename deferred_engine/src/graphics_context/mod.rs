/// Graphics context module - the binding-context seam between the pipeline
/// and the immediate-mode graphics API

pub mod graphics_context;
pub mod uniform;
pub mod uniform_reflection;
pub mod recording_context;

pub use graphics_context::*;
pub use uniform::*;
pub use uniform_reflection::reflect_uniforms;
pub use recording_context::{RecordingContext, ContextCommand};
