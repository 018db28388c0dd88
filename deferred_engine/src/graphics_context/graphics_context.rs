/// GraphicsContext trait - explicit binding context for an immediate-mode API
///
/// All state that an immediate-mode API keeps globally (program in use,
/// bound draw surface, active texture unit and its binding) lives behind this
/// trait. Components receive `&mut dyn GraphicsContext` and document which
/// bindings they expect on entry and leave on exit.

use glam::Vec4;
use winit::dpi::PhysicalSize;
use crate::error::Result;
use crate::graphics_context::UniformValue;

// ============================================================================
// Handles
// ============================================================================

/// Opaque name of a 2D texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub u32);

/// Opaque name of an off-screen render surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FramebufferHandle(pub u32);

/// Opaque name of a compiled shader stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderHandle(pub u32);

/// Opaque name of a linked program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramHandle(pub u32);

/// Opaque name of a vertex array (buffer + attribute layout)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexArrayHandle(pub u32);

/// Location of an active uniform inside one program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UniformLocation(pub i32);

// ============================================================================
// Texture description
// ============================================================================

/// Internal storage format of a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InternalFormat {
    /// 8-bit normalized RGBA
    Rgba8,
    /// 16-bit float RGBA
    Rgba16F,
    /// 32-bit float RGBA
    Rgba32F,
    /// 16-bit float RGB
    Rgb16F,
    /// 24-bit depth
    Depth24,
    /// 32-bit float depth
    Depth32F,
}

impl InternalFormat {
    /// Whether this format can back a depth attachment
    pub fn is_depth(&self) -> bool {
        matches!(self, InternalFormat::Depth24 | InternalFormat::Depth32F)
    }
}

/// Channel layout of the (null) pixel data passed at allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Rgba,
    Rgb,
    Depth,
}

/// Component type of the pixel data passed at allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    UnsignedByte,
    Float,
}

/// Descriptor for a 2D texture allocation (contents are left uninitialized)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub internal_format: InternalFormat,
    pub pixel_format: PixelFormat,
    pub component_type: ComponentType,
}

// ============================================================================
// Surfaces
// ============================================================================

/// Attachment point on a render surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attachment {
    /// Color attachment `i`
    Color(u32),
    /// Depth attachment
    Depth,
}

/// Completeness status returned by `check_framebuffer_status`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FramebufferStatus {
    Complete,
    /// Incomplete, with a backend reason
    Incomplete(String),
}

impl FramebufferStatus {
    pub fn is_complete(&self) -> bool {
        matches!(self, FramebufferStatus::Complete)
    }
}

bitflags::bitflags! {
    /// Buffers affected by `clear` and `blit_framebuffer`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u32 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
        const STENCIL = 1 << 2;
    }
}

// ============================================================================
// Shaders and geometry
// ============================================================================

/// Shader stage kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Geometry,
    Fragment,
    Compute,
}

impl ShaderStage {
    /// Lowercase label used in stage names ("deferred vertex")
    pub fn label(&self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Geometry => "geometry",
            ShaderStage::Fragment => "fragment",
            ShaderStage::Compute => "compute",
        }
    }
}

/// Primitive topology for `draw_arrays`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveTopology {
    Triangles,
    TriangleStrip,
    Lines,
    Points,
}

/// One float attribute in an interleaved vertex buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Shader input location
    pub location: u32,
    /// Number of f32 components
    pub components: u32,
    /// Byte offset inside one vertex
    pub offset: u32,
}

/// Interleaved vertex layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexLayout {
    /// Bytes between consecutive vertices
    pub stride: u32,
    pub attributes: Vec<VertexAttribute>,
}

// ============================================================================
// GraphicsContext trait
// ============================================================================

/// Immediate-mode graphics context bound to one window
///
/// Implemented over OpenGL by `GlContext` (the `deferred_engine_gl` crate)
/// and by `RecordingContext` for tests and headless runs. Calls are issued
/// from a single thread, in order; the context serializes them.
pub trait GraphicsContext {
    // ===== WINDOW =====

    /// Current drawable size of the window (sizes every screen-sized image)
    fn screen_size(&self) -> PhysicalSize<u32>;

    // ===== TEXTURES =====

    /// Allocate a 2D texture with uninitialized contents
    fn create_texture_2d(&mut self, desc: TextureDesc) -> Result<TextureHandle>;

    fn delete_texture(&mut self, texture: TextureHandle);

    /// Select which texture unit subsequent `bind_texture_2d` calls affect
    fn active_texture_unit(&mut self, unit: u32);

    /// Bind a texture to the active unit (`None` unbinds)
    fn bind_texture_2d(&mut self, texture: Option<TextureHandle>);

    // ===== SURFACES =====

    fn create_framebuffer(&mut self) -> Result<FramebufferHandle>;

    fn delete_framebuffer(&mut self, framebuffer: FramebufferHandle);

    /// Bind a draw surface (`None` = default window surface)
    fn bind_draw_framebuffer(&mut self, framebuffer: Option<FramebufferHandle>);

    /// Attach a texture to the bound draw surface
    fn framebuffer_texture_2d(&mut self, attachment: Attachment, texture: TextureHandle);

    /// Declare which color attachments of the bound surface receive fragment outputs
    fn draw_buffers(&mut self, color_attachments: &[u32]);

    /// Completeness of the bound draw surface
    fn check_framebuffer_status(&mut self) -> FramebufferStatus;

    /// Copy a region of `src` into `dst` (`None` = default surface)
    fn blit_framebuffer(
        &mut self,
        src: Option<FramebufferHandle>,
        dst: Option<FramebufferHandle>,
        size: PhysicalSize<u32>,
        mask: ClearFlags,
    );

    // ===== CLEARING =====

    fn set_clear_color(&mut self, color: Vec4);

    /// Clear buffers of the bound draw surface
    fn clear(&mut self, mask: ClearFlags);

    // ===== PROGRAMS =====

    /// Compile one stage. Failure carries the compiler diagnostic text.
    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderHandle>;

    fn delete_shader(&mut self, shader: ShaderHandle);

    /// Link stages into a program. Failure carries the linker diagnostic text.
    fn link_program(&mut self, stages: &[ShaderHandle]) -> Result<ProgramHandle>;

    fn delete_program(&mut self, program: ProgramHandle);

    /// Make a program current (`None` = no program)
    fn use_program(&mut self, program: Option<ProgramHandle>);

    /// Resolve an active uniform by name; `None` if the program doesn't declare it
    fn uniform_location(&mut self, program: ProgramHandle, name: &str) -> Option<UniformLocation>;

    /// Upload a uniform to the program currently in use
    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue);

    // ===== GEOMETRY =====

    /// Upload static vertex data with its layout
    fn create_vertex_array(&mut self, layout: &VertexLayout, data: &[u8]) -> Result<VertexArrayHandle>;

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayHandle);

    fn draw_arrays(
        &mut self,
        vertex_array: VertexArrayHandle,
        topology: PrimitiveTopology,
        first: u32,
        count: u32,
    );
}
