/*!
# Deferred Engine

Deferred shading core: G-buffer construction, shader programs with uniform
reflection, point and directional lights, and the per-frame geometry /
lighting / composition flow.

The engine talks to the graphics API through the [`GraphicsContext`] trait
(one binding context, immediate-mode style). The `deferred_engine_gl` crate
implements it over OpenGL; [`RecordingContext`] is a complete in-memory
implementation used by the tests and the headless demo.

## Architecture

- **RenderTarget**: one color texture attached to a G-buffer slot
- **GBuffer**: offscreen framebuffer, depth texture and full-screen quad,
  with a `Building -> Ready -> Begun -> Ended` state machine
- **ShaderProgram**: compiled and linked program, typed uniform upload
- **Light**: point or directional light owned by a scene object
- **Scene**: objects, lights and the registry the lighting pass forwards
- **DeferredPipeline**: one frame, from geometry pass to composition

[`GraphicsContext`]: crate::graphics_context::GraphicsContext
[`RecordingContext`]: crate::graphics_context::RecordingContext
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod graphics_context;
pub mod renderer;
pub mod scene;
pub mod camera;

// Main deferred namespace module
pub mod deferred {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine singleton (global logger)
    pub use crate::engine::Engine;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger, SeverityFilter};
    }

    // Graphics API seam and its in-memory implementation
    pub mod context {
        pub use crate::graphics_context::*;
    }

    // Render targets, G-buffer, programs, lights, pipeline
    pub mod render {
        pub use crate::renderer::*;
    }

    // Scene sub-module
    pub mod scene {
        pub use crate::scene::*;
    }

    // Camera sub-module
    pub mod camera {
        pub use crate::camera::*;
    }
}

// Re-export math library at crate root
pub use glam;
