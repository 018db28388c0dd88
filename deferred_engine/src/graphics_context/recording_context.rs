/// RecordingContext - GPU-less GraphicsContext that records every call
///
/// Tracks the same bindings a real immediate-mode context keeps (draw
/// surface, active unit and per-unit textures, program in use, per-program
/// uniform storage) so pipeline ordering can be asserted without a window.
/// Used by unit tests, integration tests and the headless demo.

use std::collections::BTreeMap;
use glam::Vec4;
use rustc_hash::FxHashMap;
use winit::dpi::PhysicalSize;
use crate::error::{Error, Result};
use crate::graphics_context::{
    GraphicsContext, UniformValue, reflect_uniforms,
    TextureHandle, FramebufferHandle, ShaderHandle, ProgramHandle, VertexArrayHandle,
    UniformLocation, TextureDesc, Attachment, FramebufferStatus, ClearFlags,
    ShaderStage, PrimitiveTopology, VertexLayout,
};

/// One recorded context call
///
/// Draw and clear commands capture the bindings in effect when they were issued.
#[derive(Debug, Clone, PartialEq)]
pub enum ContextCommand {
    CreateTexture { texture: TextureHandle, desc: TextureDesc },
    DeleteTexture(TextureHandle),
    ActiveTextureUnit(u32),
    BindTexture2d { unit: u32, texture: Option<TextureHandle> },
    CreateFramebuffer(FramebufferHandle),
    DeleteFramebuffer(FramebufferHandle),
    BindDrawFramebuffer(Option<FramebufferHandle>),
    FramebufferTexture2d { framebuffer: Option<FramebufferHandle>, attachment: Attachment, texture: TextureHandle },
    DrawBuffers { framebuffer: Option<FramebufferHandle>, attachments: Vec<u32> },
    CheckFramebufferStatus { framebuffer: Option<FramebufferHandle>, status: FramebufferStatus },
    BlitFramebuffer { src: Option<FramebufferHandle>, dst: Option<FramebufferHandle>, size: PhysicalSize<u32>, mask: ClearFlags },
    SetClearColor(Vec4),
    Clear { framebuffer: Option<FramebufferHandle>, mask: ClearFlags, color: Vec4 },
    CompileShader { shader: ShaderHandle, stage: ShaderStage },
    DeleteShader(ShaderHandle),
    LinkProgram { program: ProgramHandle, stages: Vec<ShaderHandle> },
    DeleteProgram(ProgramHandle),
    UseProgram(Option<ProgramHandle>),
    SetUniform { program: Option<ProgramHandle>, name: String, value: UniformValue },
    CreateVertexArray { vertex_array: VertexArrayHandle, vertex_count: u32 },
    DeleteVertexArray(VertexArrayHandle),
    DrawArrays {
        vertex_array: VertexArrayHandle,
        topology: PrimitiveTopology,
        first: u32,
        count: u32,
        framebuffer: Option<FramebufferHandle>,
        program: Option<ProgramHandle>,
    },
}

#[derive(Debug, Default, Clone)]
struct FramebufferState {
    color: BTreeMap<u32, TextureHandle>,
    depth: Option<TextureHandle>,
    draw_buffers: Vec<u32>,
}

#[derive(Debug)]
struct ShaderState {
    uniforms: Vec<String>,
}

#[derive(Debug)]
struct ProgramState {
    /// Active uniform names; the index is the location
    uniforms: Vec<String>,
    values: FxHashMap<i32, UniformValue>,
}

#[derive(Debug)]
struct VertexArrayState {
    vertex_count: u32,
}

/// Recording implementation of `GraphicsContext`
#[derive(Debug)]
pub struct RecordingContext {
    screen_size: PhysicalSize<u32>,
    next_name: u32,
    commands: Vec<ContextCommand>,

    textures: FxHashMap<TextureHandle, TextureDesc>,
    framebuffers: FxHashMap<FramebufferHandle, FramebufferState>,
    shaders: FxHashMap<ShaderHandle, ShaderState>,
    programs: FxHashMap<ProgramHandle, ProgramState>,
    vertex_arrays: FxHashMap<VertexArrayHandle, VertexArrayState>,

    bound_draw_framebuffer: Option<FramebufferHandle>,
    active_unit: u32,
    unit_bindings: BTreeMap<u32, TextureHandle>,
    current_program: Option<ProgramHandle>,
    clear_color: Vec4,

    pending_link_failure: Option<String>,
    fail_next_texture: bool,
}

impl RecordingContext {
    /// Create a context whose window has the given drawable size
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            screen_size: PhysicalSize::new(width, height),
            next_name: 1,
            commands: Vec::new(),
            textures: FxHashMap::default(),
            framebuffers: FxHashMap::default(),
            shaders: FxHashMap::default(),
            programs: FxHashMap::default(),
            vertex_arrays: FxHashMap::default(),
            bound_draw_framebuffer: None,
            active_unit: 0,
            unit_bindings: BTreeMap::new(),
            current_program: None,
            clear_color: Vec4::ZERO,
            pending_link_failure: None,
            fail_next_texture: false,
        }
    }

    fn next_name(&mut self) -> u32 {
        let name = self.next_name;
        self.next_name += 1;
        name
    }

    // ===== TEST CONTROLS =====

    /// Simulate a window resize (existing textures keep their size)
    pub fn set_screen_size(&mut self, width: u32, height: u32) {
        self.screen_size = PhysicalSize::new(width, height);
    }

    /// Make the next `link_program` fail with the given diagnostic
    pub fn fail_next_link(&mut self, log: &str) {
        self.pending_link_failure = Some(log.to_string());
    }

    /// Make the next `create_texture_2d` fail
    pub fn fail_next_texture_allocation(&mut self) {
        self.fail_next_texture = true;
    }

    // ===== RECORDED CALLS =====

    pub fn commands(&self) -> &[ContextCommand] {
        &self.commands
    }

    /// Forget recorded calls (bindings and resources are kept)
    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Names of every uniform write, in issue order
    pub fn uniform_writes(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                ContextCommand::SetUniform { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Number of draw calls recorded
    pub fn draw_call_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, ContextCommand::DrawArrays { .. }))
            .count()
    }

    // ===== BINDING STATE =====

    pub fn bound_draw_framebuffer(&self) -> Option<FramebufferHandle> {
        self.bound_draw_framebuffer
    }

    pub fn active_unit(&self) -> u32 {
        self.active_unit
    }

    pub fn texture_bound_to_unit(&self, unit: u32) -> Option<TextureHandle> {
        self.unit_bindings.get(&unit).copied()
    }

    /// Number of units that currently have a texture bound
    pub fn bound_texture_count(&self) -> usize {
        self.unit_bindings.len()
    }

    pub fn current_program(&self) -> Option<ProgramHandle> {
        self.current_program
    }

    pub fn clear_color(&self) -> Vec4 {
        self.clear_color
    }

    // ===== RESOURCES =====

    pub fn texture_desc(&self, texture: TextureHandle) -> Option<TextureDesc> {
        self.textures.get(&texture).copied()
    }

    pub fn live_texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn live_framebuffer_count(&self) -> usize {
        self.framebuffers.len()
    }

    pub fn live_program_count(&self) -> usize {
        self.programs.len()
    }

    pub fn live_vertex_array_count(&self) -> usize {
        self.vertex_arrays.len()
    }

    /// Color attachments of a surface, ordered by attachment index
    pub fn color_attachments(&self, framebuffer: FramebufferHandle) -> Vec<(u32, TextureHandle)> {
        self.framebuffers
            .get(&framebuffer)
            .map(|fb| fb.color.iter().map(|(i, t)| (*i, *t)).collect())
            .unwrap_or_default()
    }

    pub fn depth_attachment(&self, framebuffer: FramebufferHandle) -> Option<TextureHandle> {
        self.framebuffers.get(&framebuffer).and_then(|fb| fb.depth)
    }

    pub fn draw_buffers_of(&self, framebuffer: FramebufferHandle) -> Vec<u32> {
        self.framebuffers
            .get(&framebuffer)
            .map(|fb| fb.draw_buffers.clone())
            .unwrap_or_default()
    }

    /// Active uniform names of a linked program
    pub fn active_uniforms(&self, program: ProgramHandle) -> Vec<String> {
        self.programs
            .get(&program)
            .map(|p| p.uniforms.clone())
            .unwrap_or_default()
    }

    /// Last value uploaded to `name` in `program`
    pub fn uniform_value(&self, program: ProgramHandle, name: &str) -> Option<UniformValue> {
        let state = self.programs.get(&program)?;
        let location = state.uniforms.iter().position(|u| u == name)? as i32;
        state.values.get(&location).copied()
    }

    /// Every uniform of `program` that holds a value, by name
    pub fn uniform_values(&self, program: ProgramHandle) -> BTreeMap<String, UniformValue> {
        let mut out = BTreeMap::new();
        if let Some(state) = self.programs.get(&program) {
            for (location, value) in &state.values {
                if let Some(name) = state.uniforms.get(*location as usize) {
                    out.insert(name.clone(), *value);
                }
            }
        }
        out
    }

    /// Size of a surface, taken from its first attachment
    pub fn framebuffer_dimensions(&self, framebuffer: FramebufferHandle) -> Option<PhysicalSize<u32>> {
        let fb = self.framebuffers.get(&framebuffer)?;
        fb.color
            .values()
            .chain(fb.depth.iter())
            .filter_map(|t| self.textures.get(t))
            .map(|d| PhysicalSize::new(d.width, d.height))
            .next()
    }
}

impl GraphicsContext for RecordingContext {
    fn screen_size(&self) -> PhysicalSize<u32> {
        self.screen_size
    }

    fn create_texture_2d(&mut self, desc: TextureDesc) -> Result<TextureHandle> {
        if std::mem::take(&mut self.fail_next_texture) {
            return Err(Error::OutOfMemory);
        }
        if desc.width == 0 || desc.height == 0 {
            return Err(Error::BackendError(format!(
                "invalid texture size {}x{}", desc.width, desc.height
            )));
        }
        let texture = TextureHandle(self.next_name());
        self.textures.insert(texture, desc);
        self.commands.push(ContextCommand::CreateTexture { texture, desc });
        Ok(texture)
    }

    fn delete_texture(&mut self, texture: TextureHandle) {
        self.textures.remove(&texture);
        self.unit_bindings.retain(|_, t| *t != texture);
        self.commands.push(ContextCommand::DeleteTexture(texture));
    }

    fn active_texture_unit(&mut self, unit: u32) {
        self.active_unit = unit;
        self.commands.push(ContextCommand::ActiveTextureUnit(unit));
    }

    fn bind_texture_2d(&mut self, texture: Option<TextureHandle>) {
        match texture {
            Some(t) => {
                self.unit_bindings.insert(self.active_unit, t);
            }
            None => {
                self.unit_bindings.remove(&self.active_unit);
            }
        }
        self.commands.push(ContextCommand::BindTexture2d { unit: self.active_unit, texture });
    }

    fn create_framebuffer(&mut self) -> Result<FramebufferHandle> {
        let framebuffer = FramebufferHandle(self.next_name());
        self.framebuffers.insert(framebuffer, FramebufferState::default());
        self.commands.push(ContextCommand::CreateFramebuffer(framebuffer));
        Ok(framebuffer)
    }

    fn delete_framebuffer(&mut self, framebuffer: FramebufferHandle) {
        self.framebuffers.remove(&framebuffer);
        if self.bound_draw_framebuffer == Some(framebuffer) {
            self.bound_draw_framebuffer = None;
        }
        self.commands.push(ContextCommand::DeleteFramebuffer(framebuffer));
    }

    fn bind_draw_framebuffer(&mut self, framebuffer: Option<FramebufferHandle>) {
        self.bound_draw_framebuffer = framebuffer;
        self.commands.push(ContextCommand::BindDrawFramebuffer(framebuffer));
    }

    fn framebuffer_texture_2d(&mut self, attachment: Attachment, texture: TextureHandle) {
        if let Some(fb) = self.bound_draw_framebuffer.and_then(|h| self.framebuffers.get_mut(&h)) {
            match attachment {
                Attachment::Color(index) => {
                    fb.color.insert(index, texture);
                }
                Attachment::Depth => fb.depth = Some(texture),
            }
        }
        self.commands.push(ContextCommand::FramebufferTexture2d {
            framebuffer: self.bound_draw_framebuffer,
            attachment,
            texture,
        });
    }

    fn draw_buffers(&mut self, color_attachments: &[u32]) {
        if let Some(fb) = self.bound_draw_framebuffer.and_then(|h| self.framebuffers.get_mut(&h)) {
            fb.draw_buffers = color_attachments.to_vec();
        }
        self.commands.push(ContextCommand::DrawBuffers {
            framebuffer: self.bound_draw_framebuffer,
            attachments: color_attachments.to_vec(),
        });
    }

    fn check_framebuffer_status(&mut self) -> FramebufferStatus {
        let status = match self.bound_draw_framebuffer {
            None => FramebufferStatus::Complete,
            Some(handle) => match self.framebuffers.get(&handle) {
                None => FramebufferStatus::Incomplete("unknown framebuffer".to_string()),
                Some(fb) => {
                    let sizes: Vec<(u32, u32)> = fb
                        .color
                        .values()
                        .chain(fb.depth.iter())
                        .filter_map(|t| self.textures.get(t))
                        .map(|d| (d.width, d.height))
                        .collect();
                    if sizes.is_empty() {
                        FramebufferStatus::Incomplete("missing attachment".to_string())
                    } else if sizes.iter().any(|s| *s != sizes[0]) {
                        FramebufferStatus::Incomplete("attachment dimensions differ".to_string())
                    } else if fb.draw_buffers.iter().any(|i| !fb.color.contains_key(i)) {
                        FramebufferStatus::Incomplete("draw buffer without attachment".to_string())
                    } else {
                        FramebufferStatus::Complete
                    }
                }
            },
        };
        self.commands.push(ContextCommand::CheckFramebufferStatus {
            framebuffer: self.bound_draw_framebuffer,
            status: status.clone(),
        });
        status
    }

    fn blit_framebuffer(
        &mut self,
        src: Option<FramebufferHandle>,
        dst: Option<FramebufferHandle>,
        size: PhysicalSize<u32>,
        mask: ClearFlags,
    ) {
        self.commands.push(ContextCommand::BlitFramebuffer { src, dst, size, mask });
    }

    fn set_clear_color(&mut self, color: Vec4) {
        self.clear_color = color;
        self.commands.push(ContextCommand::SetClearColor(color));
    }

    fn clear(&mut self, mask: ClearFlags) {
        self.commands.push(ContextCommand::Clear {
            framebuffer: self.bound_draw_framebuffer,
            mask,
            color: self.clear_color,
        });
    }

    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderHandle> {
        if !(source.contains("main(") || source.contains("main (")) {
            return Err(Error::BackendError(
                "0:1: error: missing entry point 'main'".to_string(),
            ));
        }
        let shader = ShaderHandle(self.next_name());
        self.shaders.insert(shader, ShaderState { uniforms: reflect_uniforms(source) });
        self.commands.push(ContextCommand::CompileShader { shader, stage });
        Ok(shader)
    }

    fn delete_shader(&mut self, shader: ShaderHandle) {
        self.shaders.remove(&shader);
        self.commands.push(ContextCommand::DeleteShader(shader));
    }

    fn link_program(&mut self, stages: &[ShaderHandle]) -> Result<ProgramHandle> {
        if let Some(log) = self.pending_link_failure.take() {
            return Err(Error::BackendError(log));
        }
        let mut uniforms: Vec<String> = Vec::new();
        for stage in stages {
            let state = self.shaders.get(stage).ok_or_else(|| {
                Error::BackendError(format!("error: shader {} is not compiled", stage.0))
            })?;
            for name in &state.uniforms {
                if !uniforms.contains(name) {
                    uniforms.push(name.clone());
                }
            }
        }
        let program = ProgramHandle(self.next_name());
        self.programs.insert(program, ProgramState { uniforms, values: FxHashMap::default() });
        self.commands.push(ContextCommand::LinkProgram { program, stages: stages.to_vec() });
        Ok(program)
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        self.programs.remove(&program);
        self.commands.push(ContextCommand::DeleteProgram(program));
    }

    fn use_program(&mut self, program: Option<ProgramHandle>) {
        self.current_program = program;
        self.commands.push(ContextCommand::UseProgram(program));
    }

    fn uniform_location(&mut self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        let state = self.programs.get(&program)?;
        state
            .uniforms
            .iter()
            .position(|u| u == name)
            .map(|i| UniformLocation(i as i32))
    }

    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue) {
        let mut name = String::new();
        if let Some(state) = self.current_program.and_then(|p| self.programs.get_mut(&p)) {
            if let Some(n) = state.uniforms.get(location.0 as usize) {
                name = n.clone();
                state.values.insert(location.0, value);
            }
        }
        self.commands.push(ContextCommand::SetUniform {
            program: self.current_program,
            name,
            value,
        });
    }

    fn create_vertex_array(&mut self, layout: &VertexLayout, data: &[u8]) -> Result<VertexArrayHandle> {
        if layout.stride == 0 || data.len() % layout.stride as usize != 0 {
            return Err(Error::BackendError(format!(
                "vertex data of {} bytes doesn't match stride {}", data.len(), layout.stride
            )));
        }
        let vertex_array = VertexArrayHandle(self.next_name());
        let vertex_count = (data.len() / layout.stride as usize) as u32;
        self.vertex_arrays.insert(vertex_array, VertexArrayState { vertex_count });
        self.commands.push(ContextCommand::CreateVertexArray { vertex_array, vertex_count });
        Ok(vertex_array)
    }

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayHandle) {
        self.vertex_arrays.remove(&vertex_array);
        self.commands.push(ContextCommand::DeleteVertexArray(vertex_array));
    }

    fn draw_arrays(
        &mut self,
        vertex_array: VertexArrayHandle,
        topology: PrimitiveTopology,
        first: u32,
        count: u32,
    ) {
        if let Some(state) = self.vertex_arrays.get(&vertex_array) {
            debug_assert!(
                first + count <= state.vertex_count,
                "draw of {}..{} exceeds {} vertices", first, first + count, state.vertex_count
            );
        }
        self.commands.push(ContextCommand::DrawArrays {
            vertex_array,
            topology,
            first,
            count,
            framebuffer: self.bound_draw_framebuffer,
            program: self.current_program,
        });
    }
}

#[cfg(test)]
#[path = "recording_context_tests.rs"]
mod tests;
