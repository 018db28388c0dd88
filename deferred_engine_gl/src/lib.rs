/*!
# Deferred Engine - OpenGL Backend

OpenGL implementation of the `deferred_engine` binding context, built on
`glow`.

Window and GL context creation stay with the application: it loads a
`glow::Context` for a 3.3+ core context and wraps it in [`GlContext`],
which every engine component then receives as `&mut dyn GraphicsContext`.

```no_run
use deferred_engine::deferred::context::{GraphicsContext, RecordingContext};
use deferred_engine_gl::GlContext;
use winit::dpi::PhysicalSize;

fn context(gl: Option<glow::Context>) -> Box<dyn GraphicsContext> {
    match gl {
        Some(gl) => Box::new(GlContext::new(gl, PhysicalSize::new(1280, 720))),
        None => Box::new(RecordingContext::new(1280, 720)),
    }
}
```
*/

mod gl_context;
mod gl_format;

pub use gl_context::GlContext;
