/// GBuffer - off-screen surface with N color attachments and a depth texture
///
/// Lifecycle:
///
/// ```text
/// Building --finish_init--> Ready --begin--> Begun --end--> Ended
///                                              ^              |
///                                              +----begin-----+
/// ```
///
/// Attachment slot `i` is bound to texture unit `i` both while the geometry
/// pass writes it and while the lighting pass samples it, so slot order is
/// also the sampler index order of the lighting program.
///
/// Depth is a texture attachment (not a renderbuffer) so it can be copied
/// into the default surface after composition with `blit_depth_to_default`.

use winit::dpi::PhysicalSize;
use crate::error::{Error, Result};
use crate::graphics_context::{
    GraphicsContext, FramebufferHandle, TextureHandle, VertexArrayHandle, TextureDesc,
    Attachment, ClearFlags, InternalFormat, PixelFormat, ComponentType,
    PrimitiveTopology, VertexAttribute, VertexLayout,
};
use crate::renderer::RenderTarget;
use crate::{engine_debug, engine_error, engine_info};

/// Full-screen quad as a 4-vertex triangle strip: position (xyz) + uv
const QUAD_VERTICES: [f32; 20] = [
    -1.0,  1.0, 0.0,   0.0, 1.0,
    -1.0, -1.0, 0.0,   0.0, 0.0,
     1.0,  1.0, 0.0,   1.0, 1.0,
     1.0, -1.0, 0.0,   1.0, 0.0,
];

const QUAD_VERTEX_COUNT: u32 = 4;

/// Lifecycle state of a G-buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GBufferState {
    /// Attachments can still be added
    Building,
    /// Draw buffers declared, quad built
    Ready,
    /// Bound as the draw surface for the geometry pass
    Begun,
    /// Geometry pass done, default surface bound
    Ended,
}

/// Deferred-shading geometry buffer
#[derive(Debug)]
pub struct GBuffer {
    framebuffer: FramebufferHandle,
    depth: TextureHandle,
    size: PhysicalSize<u32>,
    targets: Vec<RenderTarget>,
    draw_buffers: Vec<u32>,
    quad: Option<VertexArrayHandle>,
    state: GBufferState,
}

impl GBuffer {
    /// Create the surface and its depth texture at the current screen size
    ///
    /// Completeness is checked once here. An incomplete surface is logged
    /// as an error and construction continues.
    ///
    /// Leaves the default surface bound.
    pub fn new(ctx: &mut dyn GraphicsContext) -> Result<Self> {
        let size = ctx.screen_size();
        let framebuffer = ctx.create_framebuffer()?;

        let depth = match ctx.create_texture_2d(TextureDesc {
            width: size.width,
            height: size.height,
            internal_format: InternalFormat::Depth24,
            pixel_format: PixelFormat::Depth,
            component_type: ComponentType::Float,
        }) {
            Ok(texture) => texture,
            Err(e) => {
                engine_error!("deferred::GBuffer", "Failed to allocate depth texture: {}", e);
                ctx.delete_framebuffer(framebuffer);
                return Err(e);
            }
        };

        ctx.bind_draw_framebuffer(Some(framebuffer));
        ctx.framebuffer_texture_2d(Attachment::Depth, depth);

        let status = ctx.check_framebuffer_status();
        if !status.is_complete() {
            engine_error!("deferred::GBuffer", "G-buffer surface is not complete: {:?}", status);
        }

        ctx.bind_draw_framebuffer(None);

        engine_debug!("deferred::GBuffer",
            "Created G-buffer surface {} ({}x{})", framebuffer.0, size.width, size.height);

        Ok(Self {
            framebuffer,
            depth,
            size,
            targets: Vec::new(),
            draw_buffers: Vec::new(),
            quad: None,
            state: GBufferState::Building,
        })
    }

    /// Attach `target` at color slot `target_count()`
    ///
    /// The G-buffer takes ownership of the target. A rejected target is
    /// released.
    ///
    /// # Errors
    ///
    /// - `InvalidState` once `finish_init` has been called
    /// - `InvalidResource` if the target's size differs from the surface
    pub fn add_target(&mut self, ctx: &mut dyn GraphicsContext, target: RenderTarget) -> Result<()> {
        if self.state != GBufferState::Building {
            let label = target.label().to_string();
            target.destroy(ctx);
            return Err(Error::InvalidState(format!(
                "cannot add target '{}' to a G-buffer in state {:?}", label, self.state
            )));
        }

        if target.width() != self.size.width || target.height() != self.size.height {
            let message = format!(
                "target '{}' is {}x{}, G-buffer is {}x{}",
                target.label(), target.width(), target.height(),
                self.size.width, self.size.height
            );
            engine_error!("deferred::GBuffer", "{}", message);
            target.destroy(ctx);
            return Err(Error::InvalidResource(message));
        }

        let slot = self.targets.len() as u32;
        ctx.bind_draw_framebuffer(Some(self.framebuffer));
        ctx.framebuffer_texture_2d(Attachment::Color(slot), target.texture_handle());
        ctx.bind_draw_framebuffer(None);

        engine_debug!("deferred::GBuffer", "Attached '{}' at slot {}", target.label(), slot);
        self.targets.push(target);
        Ok(())
    }

    /// Declare draw buffers `0..N-1` and build the full-screen quad
    ///
    /// Building -> Ready. Leaves the default surface bound.
    pub fn finish_init(&mut self, ctx: &mut dyn GraphicsContext) -> Result<()> {
        if self.state != GBufferState::Building {
            return Err(Error::InvalidState(format!(
                "finish_init called twice (state {:?})", self.state
            )));
        }

        self.draw_buffers = (0..self.targets.len() as u32).collect();
        ctx.bind_draw_framebuffer(Some(self.framebuffer));
        ctx.draw_buffers(&self.draw_buffers);
        ctx.bind_draw_framebuffer(None);

        let layout = VertexLayout {
            stride: (5 * std::mem::size_of::<f32>()) as u32,
            attributes: vec![
                VertexAttribute { location: 0, components: 3, offset: 0 },
                VertexAttribute { location: 1, components: 2, offset: 12 },
            ],
        };
        let quad = ctx
            .create_vertex_array(&layout, bytemuck::cast_slice(&QUAD_VERTICES))
            .map_err(|e| {
                engine_error!("deferred::GBuffer", "Failed to build full-screen quad: {}", e);
                e
            })?;
        self.quad = Some(quad);
        self.state = GBufferState::Ready;

        engine_info!("deferred::GBuffer",
            "G-buffer ready with {} attachment(s)", self.targets.len());
        Ok(())
    }

    /// Bind the surface for the geometry pass
    ///
    /// Ready | Ended -> Begun. Attachment `i` is bound on texture unit `i`
    /// (applying its own clear-on-bind), then the surface's color and depth
    /// are cleared.
    pub fn begin(&mut self, ctx: &mut dyn GraphicsContext) -> Result<()> {
        match self.state {
            GBufferState::Ready | GBufferState::Ended => {}
            state => {
                return Err(Error::InvalidState(format!("begin called in state {:?}", state)));
            }
        }

        ctx.bind_draw_framebuffer(Some(self.framebuffer));
        for (unit, target) in self.targets.iter().enumerate() {
            ctx.active_texture_unit(unit as u32);
            target.begin(ctx);
        }
        ctx.clear(ClearFlags::COLOR | ClearFlags::DEPTH);

        self.state = GBufferState::Begun;
        Ok(())
    }

    /// Finish the geometry pass
    ///
    /// Begun -> Ended. Every attachment's unit is left empty and the default
    /// surface is bound.
    pub fn end(&mut self, ctx: &mut dyn GraphicsContext) -> Result<()> {
        if self.state != GBufferState::Begun {
            return Err(Error::InvalidState(format!("end called in state {:?}", self.state)));
        }

        for (unit, target) in self.targets.iter().enumerate() {
            ctx.active_texture_unit(unit as u32);
            target.end(ctx);
        }
        ctx.bind_draw_framebuffer(None);

        self.state = GBufferState::Ended;
        Ok(())
    }

    /// Bind attachment `i` on texture unit `i` for sampling
    ///
    /// Call with the default surface bound and the lighting program in use.
    pub fn bind_textures(&self, ctx: &mut dyn GraphicsContext) -> Result<()> {
        match self.state {
            GBufferState::Ready | GBufferState::Ended => {}
            state => {
                return Err(Error::InvalidState(format!(
                    "bind_textures called in state {:?}", state
                )));
            }
        }

        for (unit, target) in self.targets.iter().enumerate() {
            ctx.active_texture_unit(unit as u32);
            target.begin(ctx);
        }
        Ok(())
    }

    /// Clear the texture units filled by `bind_textures`
    pub fn unbind_textures(&self, ctx: &mut dyn GraphicsContext) {
        for (unit, target) in self.targets.iter().enumerate() {
            ctx.active_texture_unit(unit as u32);
            target.end(ctx);
        }
    }

    /// Draw the full-screen quad (4-vertex triangle strip)
    pub fn render_quad(&self, ctx: &mut dyn GraphicsContext) -> Result<()> {
        let quad = self.quad.ok_or_else(|| {
            Error::InvalidState("render_quad called before finish_init".to_string())
        })?;
        ctx.draw_arrays(quad, PrimitiveTopology::TriangleStrip, 0, QUAD_VERTEX_COUNT);
        Ok(())
    }

    /// Copy the geometry pass depth into the default surface
    ///
    /// Lets forward-rendered overlays drawn after composition depth-test
    /// against the deferred geometry.
    pub fn blit_depth_to_default(&self, ctx: &mut dyn GraphicsContext) -> Result<()> {
        match self.state {
            GBufferState::Ready | GBufferState::Ended => {}
            state => {
                return Err(Error::InvalidState(format!(
                    "blit_depth_to_default called in state {:?}", state
                )));
            }
        }
        ctx.blit_framebuffer(Some(self.framebuffer), None, self.size, ClearFlags::DEPTH);
        Ok(())
    }

    /// Release the surface, depth texture, attachments and quad
    pub fn destroy(self, ctx: &mut dyn GraphicsContext) {
        if let Some(quad) = self.quad {
            ctx.delete_vertex_array(quad);
        }
        for target in self.targets {
            target.destroy(ctx);
        }
        ctx.delete_texture(self.depth);
        ctx.delete_framebuffer(self.framebuffer);
    }

    // ===== ACCESSORS =====

    pub fn state(&self) -> GBufferState {
        self.state
    }

    /// Attachments in slot order
    pub fn targets(&self) -> &[RenderTarget] {
        &self.targets
    }

    pub fn target(&self, slot: usize) -> Option<&RenderTarget> {
        self.targets.get(slot)
    }

    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    pub fn depth_texture(&self) -> TextureHandle {
        self.depth
    }

    pub fn framebuffer(&self) -> FramebufferHandle {
        self.framebuffer
    }

    /// Color attachment indices declared by `finish_init` (empty before)
    pub fn draw_buffers(&self) -> &[u32] {
        &self.draw_buffers
    }

    /// Size of every attachment
    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }
}

#[cfg(test)]
#[path = "g_buffer_tests.rs"]
mod tests;
