/// Conversions from engine enums to OpenGL enums
///
/// Pure functions, kept apart from `GlContext` so they can be checked
/// without a live context.

use deferred_engine::deferred::context::{
    Attachment, ClearFlags, ComponentType, FramebufferStatus, InternalFormat, PixelFormat,
    PrimitiveTopology, ShaderStage, UniformValue,
};

pub(crate) fn gl_internal_format(format: InternalFormat) -> u32 {
    match format {
        InternalFormat::Rgba8 => glow::RGBA8,
        InternalFormat::Rgba16F => glow::RGBA16F,
        InternalFormat::Rgba32F => glow::RGBA32F,
        InternalFormat::Rgb16F => glow::RGB16F,
        InternalFormat::Depth24 => glow::DEPTH_COMPONENT24,
        InternalFormat::Depth32F => glow::DEPTH_COMPONENT32F,
    }
}

pub(crate) fn gl_pixel_format(format: PixelFormat) -> u32 {
    match format {
        PixelFormat::Rgba => glow::RGBA,
        PixelFormat::Rgb => glow::RGB,
        PixelFormat::Depth => glow::DEPTH_COMPONENT,
    }
}

pub(crate) fn gl_component_type(component: ComponentType) -> u32 {
    match component {
        ComponentType::UnsignedByte => glow::UNSIGNED_BYTE,
        ComponentType::Float => glow::FLOAT,
    }
}

pub(crate) fn gl_attachment(attachment: Attachment) -> u32 {
    match attachment {
        Attachment::Color(index) => glow::COLOR_ATTACHMENT0 + index,
        Attachment::Depth => glow::DEPTH_ATTACHMENT,
    }
}

pub(crate) fn gl_clear_mask(mask: ClearFlags) -> u32 {
    let mut bits = 0;
    if mask.contains(ClearFlags::COLOR) {
        bits |= glow::COLOR_BUFFER_BIT;
    }
    if mask.contains(ClearFlags::DEPTH) {
        bits |= glow::DEPTH_BUFFER_BIT;
    }
    if mask.contains(ClearFlags::STENCIL) {
        bits |= glow::STENCIL_BUFFER_BIT;
    }
    bits
}

/// Blit filter for a mask; depth and stencil copies only allow NEAREST
pub(crate) fn gl_blit_filter(mask: ClearFlags) -> u32 {
    if mask.intersects(ClearFlags::DEPTH | ClearFlags::STENCIL) {
        glow::NEAREST
    } else {
        glow::LINEAR
    }
}

pub(crate) fn gl_shader_stage(stage: ShaderStage) -> u32 {
    match stage {
        ShaderStage::Vertex => glow::VERTEX_SHADER,
        ShaderStage::Geometry => glow::GEOMETRY_SHADER,
        ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        ShaderStage::Compute => glow::COMPUTE_SHADER,
    }
}

pub(crate) fn gl_topology(topology: PrimitiveTopology) -> u32 {
    match topology {
        PrimitiveTopology::Triangles => glow::TRIANGLES,
        PrimitiveTopology::TriangleStrip => glow::TRIANGLE_STRIP,
        PrimitiveTopology::Lines => glow::LINES,
        PrimitiveTopology::Points => glow::POINTS,
    }
}

pub(crate) fn framebuffer_status(status: u32) -> FramebufferStatus {
    let reason = match status {
        glow::FRAMEBUFFER_COMPLETE => return FramebufferStatus::Complete,
        glow::FRAMEBUFFER_INCOMPLETE_ATTACHMENT => "incomplete attachment",
        glow::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT => "missing attachment",
        glow::FRAMEBUFFER_INCOMPLETE_DRAW_BUFFER => "draw buffer without attachment",
        glow::FRAMEBUFFER_INCOMPLETE_READ_BUFFER => "read buffer without attachment",
        glow::FRAMEBUFFER_UNSUPPORTED => "unsupported attachment combination",
        glow::FRAMEBUFFER_INCOMPLETE_MULTISAMPLE => "mismatched sample counts",
        _ => return FramebufferStatus::Incomplete(format!("status 0x{status:04X}")),
    };
    FramebufferStatus::Incomplete(reason.to_string())
}

// ===== MATRIX UPLOADS =====

/// Matrix upload arguments: dimension, transpose flag, elements
///
/// Row-major element order is sent with `transpose = true` so the driver
/// rebuilds the same matrix.
pub(crate) fn matrix_upload(value: &UniformValue) -> Option<(u32, bool, &[f32])> {
    match value {
        UniformValue::Mat2 { values, row_major } => Some((2, *row_major, &values[..])),
        UniformValue::Mat3 { values, row_major } => Some((3, *row_major, &values[..])),
        UniformValue::Mat4 { values, row_major } => Some((4, *row_major, &values[..])),
        _ => None,
    }
}

#[cfg(test)]
#[path = "gl_format_tests.rs"]
mod tests;
