/// GlContext - GraphicsContext over a live OpenGL 3.3+ context
///
/// The application creates the window and the GL context (glutin, sdl2,
/// a browser canvas, ...), loads the function pointers into a
/// `glow::Context` and hands it over here. Engine handles are small
/// integers mapped to the driver's object names.

use deferred_engine::deferred::{Error, Result};
use deferred_engine::deferred::context::{
    Attachment, ClearFlags, FramebufferHandle, FramebufferStatus, GraphicsContext, PrimitiveTopology,
    ProgramHandle, ShaderHandle, ShaderStage, TextureDesc, TextureHandle, UniformLocation,
    UniformValue, VertexArrayHandle, VertexLayout,
};
use deferred_engine::{engine_bail, engine_debug, engine_err, engine_error, engine_warn};
use glam::Vec4;
use glow::HasContext;
use rustc_hash::FxHashMap;
use winit::dpi::PhysicalSize;
use crate::gl_format::{
    framebuffer_status, gl_attachment, gl_blit_filter, gl_clear_mask, gl_component_type,
    gl_internal_format, gl_pixel_format, gl_shader_stage, gl_topology, matrix_upload,
};

struct GlVertexArray {
    vertex_array: glow::VertexArray,
    buffer: glow::Buffer,
}

/// OpenGL implementation of `GraphicsContext`
pub struct GlContext {
    gl: glow::Context,
    screen_size: PhysicalSize<u32>,
    next_name: u32,

    textures: FxHashMap<TextureHandle, glow::Texture>,
    framebuffers: FxHashMap<FramebufferHandle, glow::Framebuffer>,
    shaders: FxHashMap<ShaderHandle, glow::Shader>,
    programs: FxHashMap<ProgramHandle, glow::Program>,
    vertex_arrays: FxHashMap<VertexArrayHandle, GlVertexArray>,

    /// Driver locations; `UniformLocation` indexes this table
    uniform_locations: Vec<glow::UniformLocation>,
    uniform_lookup: FxHashMap<(ProgramHandle, String), UniformLocation>,

    bound_draw_framebuffer: Option<FramebufferHandle>,
}

impl GlContext {
    /// Wrap a loaded context whose default surface is `screen_size`
    pub fn new(gl: glow::Context, screen_size: PhysicalSize<u32>) -> Self {
        let mut context = Self {
            gl,
            screen_size,
            next_name: 1,
            textures: FxHashMap::default(),
            framebuffers: FxHashMap::default(),
            shaders: FxHashMap::default(),
            programs: FxHashMap::default(),
            vertex_arrays: FxHashMap::default(),
            uniform_locations: Vec::new(),
            uniform_lookup: FxHashMap::default(),
            bound_draw_framebuffer: None,
        };
        context.set_screen_size(screen_size);
        context
    }

    /// Follow a window resize (the caller recreates screen-sized images)
    pub fn set_screen_size(&mut self, size: PhysicalSize<u32>) {
        self.screen_size = size;
        // SAFETY: plain state call on the context owned by self.
        unsafe {
            self.gl.viewport(0, 0, size.width as i32, size.height as i32);
            self.gl.enable(glow::DEPTH_TEST);
        }
    }

    /// The wrapped context, for calls the engine doesn't cover
    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }

    fn next_name(&mut self) -> u32 {
        let name = self.next_name;
        self.next_name += 1;
        name
    }

    fn framebuffer(&self, handle: Option<FramebufferHandle>) -> Option<glow::Framebuffer> {
        handle.and_then(|h| self.framebuffers.get(&h).copied())
    }

    /// Drain the driver error queue; true if memory ran out
    fn take_out_of_memory(&self) -> bool {
        let mut out_of_memory = false;
        // SAFETY: glGetError has no preconditions.
        unsafe {
            loop {
                match self.gl.get_error() {
                    glow::NO_ERROR => break,
                    glow::OUT_OF_MEMORY => out_of_memory = true,
                    code => engine_warn!("deferred::GlContext", "GL error 0x{:04X}", code),
                }
            }
        }
        out_of_memory
    }
}

impl GraphicsContext for GlContext {
    fn screen_size(&self) -> PhysicalSize<u32> {
        self.screen_size
    }

    // ===== TEXTURES =====

    fn create_texture_2d(&mut self, desc: TextureDesc) -> Result<TextureHandle> {
        if desc.width == 0 || desc.height == 0 {
            engine_bail!("deferred::GlContext", "Invalid texture size {}x{}", desc.width, desc.height);
        }

        // SAFETY: the texture is created, filled and unbound before any
        // other call can observe the binding.
        let texture = unsafe {
            let texture = self.gl.create_texture()
                .map_err(|e| engine_err!("deferred::GlContext", "Failed to create texture: {}", e))?;
            self.gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                gl_internal_format(desc.internal_format) as i32,
                desc.width as i32,
                desc.height as i32,
                0,
                gl_pixel_format(desc.pixel_format),
                gl_component_type(desc.component_type),
                None,
            );
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::NEAREST as i32);
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::NEAREST as i32);
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE as i32);
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32);
            self.gl.bind_texture(glow::TEXTURE_2D, None);
            texture
        };

        if self.take_out_of_memory() {
            // SAFETY: texture was created above and is not bound anywhere.
            unsafe { self.gl.delete_texture(texture) };
            return Err(Error::OutOfMemory);
        }

        let handle = TextureHandle(self.next_name());
        self.textures.insert(handle, texture);
        Ok(handle)
    }

    fn delete_texture(&mut self, texture: TextureHandle) {
        if let Some(native) = self.textures.remove(&texture) {
            // SAFETY: native is a live texture owned by this context.
            unsafe { self.gl.delete_texture(native) };
        }
    }

    fn active_texture_unit(&mut self, unit: u32) {
        // SAFETY: unit offsets TEXTURE0 as the API defines.
        unsafe { self.gl.active_texture(glow::TEXTURE0 + unit) };
    }

    fn bind_texture_2d(&mut self, texture: Option<TextureHandle>) {
        let native = texture.and_then(|t| self.textures.get(&t).copied());
        // SAFETY: native is None or a live texture.
        unsafe { self.gl.bind_texture(glow::TEXTURE_2D, native) };
    }

    // ===== SURFACES =====

    fn create_framebuffer(&mut self) -> Result<FramebufferHandle> {
        // SAFETY: creation has no preconditions.
        let native = unsafe { self.gl.create_framebuffer() }
            .map_err(|e| engine_err!("deferred::GlContext", "Failed to create framebuffer: {}", e))?;
        let handle = FramebufferHandle(self.next_name());
        self.framebuffers.insert(handle, native);
        Ok(handle)
    }

    fn delete_framebuffer(&mut self, framebuffer: FramebufferHandle) {
        if let Some(native) = self.framebuffers.remove(&framebuffer) {
            // SAFETY: native is a live framebuffer owned by this context.
            unsafe { self.gl.delete_framebuffer(native) };
        }
        if self.bound_draw_framebuffer == Some(framebuffer) {
            self.bound_draw_framebuffer = None;
        }
    }

    fn bind_draw_framebuffer(&mut self, framebuffer: Option<FramebufferHandle>) {
        let native = self.framebuffer(framebuffer);
        // SAFETY: native is None (default surface) or a live framebuffer.
        unsafe { self.gl.bind_framebuffer(glow::DRAW_FRAMEBUFFER, native) };
        self.bound_draw_framebuffer = framebuffer;
    }

    fn framebuffer_texture_2d(&mut self, attachment: Attachment, texture: TextureHandle) {
        let Some(native) = self.textures.get(&texture).copied() else {
            engine_error!("deferred::GlContext", "Cannot attach unknown texture {}", texture.0);
            return;
        };
        // SAFETY: attaches a live texture to the bound draw surface.
        unsafe {
            self.gl.framebuffer_texture_2d(
                glow::DRAW_FRAMEBUFFER,
                gl_attachment(attachment),
                glow::TEXTURE_2D,
                Some(native),
                0,
            );
        }
    }

    fn draw_buffers(&mut self, color_attachments: &[u32]) {
        let buffers: Vec<u32> = color_attachments
            .iter()
            .map(|index| gl_attachment(Attachment::Color(*index)))
            .collect();
        // SAFETY: applies to the bound draw surface.
        unsafe { self.gl.draw_buffers(&buffers) };
    }

    fn check_framebuffer_status(&mut self) -> FramebufferStatus {
        // SAFETY: queries the bound draw surface.
        let status = unsafe { self.gl.check_framebuffer_status(glow::DRAW_FRAMEBUFFER) };
        framebuffer_status(status)
    }

    fn blit_framebuffer(
        &mut self,
        src: Option<FramebufferHandle>,
        dst: Option<FramebufferHandle>,
        size: PhysicalSize<u32>,
        mask: ClearFlags,
    ) {
        let (width, height) = (size.width as i32, size.height as i32);
        let restore = self.framebuffer(self.bound_draw_framebuffer);
        // SAFETY: both surfaces are None (default) or live; the previous
        // draw binding is restored afterwards.
        unsafe {
            self.gl.bind_framebuffer(glow::READ_FRAMEBUFFER, self.framebuffer(src));
            self.gl.bind_framebuffer(glow::DRAW_FRAMEBUFFER, self.framebuffer(dst));
            self.gl.blit_framebuffer(
                0, 0, width, height,
                0, 0, width, height,
                gl_clear_mask(mask),
                gl_blit_filter(mask),
            );
            self.gl.bind_framebuffer(glow::READ_FRAMEBUFFER, None);
            self.gl.bind_framebuffer(glow::DRAW_FRAMEBUFFER, restore);
        }
    }

    // ===== CLEARING =====

    fn set_clear_color(&mut self, color: Vec4) {
        // SAFETY: plain state call.
        unsafe { self.gl.clear_color(color.x, color.y, color.z, color.w) };
    }

    fn clear(&mut self, mask: ClearFlags) {
        // SAFETY: clears the bound draw surface.
        unsafe { self.gl.clear(gl_clear_mask(mask)) };
    }

    // ===== PROGRAMS =====

    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderHandle> {
        // SAFETY: the shader object is deleted on failure and owned by self otherwise.
        let native = unsafe {
            let shader = self.gl.create_shader(gl_shader_stage(stage)).map_err(|e| {
                engine_err!("deferred::GlContext", "Failed to create {} shader: {}", stage.label(), e)
            })?;
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);
            if !self.gl.get_shader_compile_status(shader) {
                let log = self.gl.get_shader_info_log(shader);
                self.gl.delete_shader(shader);
                return Err(Error::BackendError(log));
            }
            shader
        };
        let handle = ShaderHandle(self.next_name());
        self.shaders.insert(handle, native);
        Ok(handle)
    }

    fn delete_shader(&mut self, shader: ShaderHandle) {
        if let Some(native) = self.shaders.remove(&shader) {
            // SAFETY: native is a live shader owned by this context.
            unsafe { self.gl.delete_shader(native) };
        }
    }

    fn link_program(&mut self, stages: &[ShaderHandle]) -> Result<ProgramHandle> {
        let mut natives = Vec::with_capacity(stages.len());
        for stage in stages {
            let native = self.shaders.get(stage).copied().ok_or_else(|| {
                Error::BackendError(format!("error: shader {} is not compiled", stage.0))
            })?;
            natives.push(native);
        }

        // SAFETY: every attached shader is live; they are detached again so
        // the caller can delete them right after linking.
        let program = unsafe {
            let program = self.gl.create_program()
                .map_err(|e| engine_err!("deferred::GlContext", "Failed to create program: {}", e))?;
            for native in &natives {
                self.gl.attach_shader(program, *native);
            }
            self.gl.link_program(program);
            for native in &natives {
                self.gl.detach_shader(program, *native);
            }
            if !self.gl.get_program_link_status(program) {
                let log = self.gl.get_program_info_log(program);
                self.gl.delete_program(program);
                return Err(Error::BackendError(log));
            }
            program
        };
        let handle = ProgramHandle(self.next_name());
        self.programs.insert(handle, program);
        Ok(handle)
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        if let Some(native) = self.programs.remove(&program) {
            // SAFETY: native is a live program owned by this context.
            unsafe { self.gl.delete_program(native) };
        }
        self.uniform_lookup.retain(|(owner, _), _| *owner != program);
    }

    fn use_program(&mut self, program: Option<ProgramHandle>) {
        let native = program.and_then(|p| self.programs.get(&p).copied());
        // SAFETY: native is None or a live, linked program.
        unsafe { self.gl.use_program(native) };
    }

    fn uniform_location(&mut self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        let key = (program, name.to_string());
        if let Some(location) = self.uniform_lookup.get(&key) {
            return Some(*location);
        }

        let native = *self.programs.get(&program)?;
        // SAFETY: native is a live, linked program.
        let driver_location = unsafe { self.gl.get_uniform_location(native, name) }?;
        let location = UniformLocation(self.uniform_locations.len() as i32);
        self.uniform_locations.push(driver_location);
        self.uniform_lookup.insert(key, location);
        Some(location)
    }

    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue) {
        let Some(native) = self.uniform_locations.get(location.0 as usize) else {
            engine_warn!("deferred::GlContext", "Unknown uniform location {}", location.0);
            return;
        };
        let loc = Some(native);

        if let Some((dimension, transpose, values)) = matrix_upload(&value) {
            // SAFETY: uploads to the program in use; the slice length matches the dimension.
            unsafe {
                match dimension {
                    2 => self.gl.uniform_matrix_2_f32_slice(loc, transpose, values),
                    3 => self.gl.uniform_matrix_3_f32_slice(loc, transpose, values),
                    _ => self.gl.uniform_matrix_4_f32_slice(loc, transpose, values),
                }
            }
            return;
        }

        // SAFETY: uploads to the program in use.
        unsafe {
            match value {
                UniformValue::Int(v) => self.gl.uniform_1_i32(loc, v),
                UniformValue::Float(v) => self.gl.uniform_1_f32(loc, v),
                UniformValue::Vec2(v) => self.gl.uniform_2_f32(loc, v.x, v.y),
                UniformValue::Vec3(v) => self.gl.uniform_3_f32(loc, v.x, v.y, v.z),
                UniformValue::Vec4(v) => self.gl.uniform_4_f32(loc, v.x, v.y, v.z, v.w),
                UniformValue::Mat2 { .. } | UniformValue::Mat3 { .. } | UniformValue::Mat4 { .. } => {}
            }
        }
    }

    // ===== GEOMETRY =====

    fn create_vertex_array(&mut self, layout: &VertexLayout, data: &[u8]) -> Result<VertexArrayHandle> {
        if layout.stride == 0 || data.len() % layout.stride as usize != 0 {
            engine_bail!("deferred::GlContext",
                "Vertex data of {} bytes doesn't match stride {}", data.len(), layout.stride);
        }

        // SAFETY: objects are created and configured while bound, then unbound.
        let (vertex_array, buffer) = unsafe {
            let vertex_array = self.gl.create_vertex_array()
                .map_err(|e| engine_err!("deferred::GlContext", "Failed to create vertex array: {}", e))?;
            let buffer = match self.gl.create_buffer() {
                Ok(buffer) => buffer,
                Err(message) => {
                    self.gl.delete_vertex_array(vertex_array);
                    engine_bail!("deferred::GlContext", "Failed to create vertex buffer: {}", message);
                }
            };
            self.gl.bind_vertex_array(Some(vertex_array));
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffer));
            self.gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, data, glow::STATIC_DRAW);
            for attribute in &layout.attributes {
                self.gl.enable_vertex_attrib_array(attribute.location);
                self.gl.vertex_attrib_pointer_f32(
                    attribute.location,
                    attribute.components as i32,
                    glow::FLOAT,
                    false,
                    layout.stride as i32,
                    attribute.offset as i32,
                );
            }
            self.gl.bind_vertex_array(None);
            self.gl.bind_buffer(glow::ARRAY_BUFFER, None);
            (vertex_array, buffer)
        };

        if self.take_out_of_memory() {
            // SAFETY: both objects were created above and are unbound.
            unsafe {
                self.gl.delete_vertex_array(vertex_array);
                self.gl.delete_buffer(buffer);
            }
            return Err(Error::OutOfMemory);
        }

        let handle = VertexArrayHandle(self.next_name());
        engine_debug!("deferred::GlContext",
            "Vertex array {} uploaded ({} bytes, stride {})", handle.0, data.len(), layout.stride);
        self.vertex_arrays.insert(handle, GlVertexArray { vertex_array, buffer });
        Ok(handle)
    }

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayHandle) {
        if let Some(native) = self.vertex_arrays.remove(&vertex_array) {
            // SAFETY: both objects are live and owned by this context.
            unsafe {
                self.gl.delete_vertex_array(native.vertex_array);
                self.gl.delete_buffer(native.buffer);
            }
        }
    }

    fn draw_arrays(
        &mut self,
        vertex_array: VertexArrayHandle,
        topology: PrimitiveTopology,
        first: u32,
        count: u32,
    ) {
        let Some(native) = self.vertex_arrays.get(&vertex_array) else {
            engine_warn!("deferred::GlContext", "Draw with unknown vertex array {}", vertex_array.0);
            return;
        };
        // SAFETY: the vertex array is live; it is unbound after the draw.
        unsafe {
            self.gl.bind_vertex_array(Some(native.vertex_array));
            self.gl.draw_arrays(gl_topology(topology), first as i32, count as i32);
            self.gl.bind_vertex_array(None);
        }
    }
}

impl Drop for GlContext {
    fn drop(&mut self) {
        let leaked = self.textures.len() + self.framebuffers.len() + self.programs.len()
            + self.vertex_arrays.len();
        if leaked > 0 {
            engine_warn!("deferred::GlContext",
                "Context dropped with {} live object(s); the driver reclaims them", leaked);
        }
    }
}
