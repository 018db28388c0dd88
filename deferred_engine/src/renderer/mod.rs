/// Renderer module - render targets, G-buffer, programs, lights and the
/// deferred pipeline built on top of them

// Module declarations
pub mod render_target;
pub mod g_buffer;
pub mod shader_program;
pub mod light;
pub mod deferred_pipeline;

// Re-export everything
pub use render_target::*;
pub use g_buffer::*;
pub use shader_program::*;
pub use light::*;
pub use deferred_pipeline::*;
