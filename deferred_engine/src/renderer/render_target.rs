/// RenderTarget - one screen-sized image buffer used as a G-buffer attachment
///
/// A render target owns a single 2D texture allocated at the window's size
/// when it is created. It doesn't follow window resizes: a resize means
/// building a new target.

use glam::Vec4;
use crate::error::Result;
use crate::graphics_context::{
    GraphicsContext, TextureHandle, TextureDesc, ClearFlags,
    InternalFormat, PixelFormat, ComponentType,
};
use crate::engine_error;

/// Render target descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct RenderTargetDesc {
    /// Debug label ("position", "normal", ...)
    pub label: String,
    /// Clear the currently bound surface when this target is bound
    pub clear_on_bind: bool,
    /// Clear color used when `clear_on_bind` is set
    pub clear_value: Vec4,
    /// Storage format of the texture
    pub internal_format: InternalFormat,
    /// Channel layout of the allocation
    pub pixel_format: PixelFormat,
    /// Component type of the allocation
    pub component_type: ComponentType,
}

impl RenderTargetDesc {
    /// RGBA 16-bit float target (positions, normals)
    pub fn rgba16f(label: &str) -> Self {
        Self {
            label: label.to_string(),
            clear_on_bind: false,
            clear_value: Vec4::ZERO,
            internal_format: InternalFormat::Rgba16F,
            pixel_format: PixelFormat::Rgba,
            component_type: ComponentType::Float,
        }
    }

    /// RGBA 8-bit normalized target (albedo + specular)
    pub fn rgba8(label: &str) -> Self {
        Self {
            label: label.to_string(),
            clear_on_bind: false,
            clear_value: Vec4::ZERO,
            internal_format: InternalFormat::Rgba8,
            pixel_format: PixelFormat::Rgba,
            component_type: ComponentType::UnsignedByte,
        }
    }

    /// Enable clear-on-bind with the given clear color
    pub fn with_clear(mut self, clear_value: Vec4) -> Self {
        self.clear_on_bind = true;
        self.clear_value = clear_value;
        self
    }
}

/// Screen-sized 2D image buffer
#[derive(Debug)]
pub struct RenderTarget {
    desc: RenderTargetDesc,
    texture: TextureHandle,
    width: u32,
    height: u32,
}

impl RenderTarget {
    /// Allocate the texture at the current screen size
    ///
    /// # Errors
    ///
    /// Returns the context error if the allocation fails (the failure is
    /// also logged).
    pub fn new(ctx: &mut dyn GraphicsContext, desc: RenderTargetDesc) -> Result<Self> {
        let size = ctx.screen_size();
        let texture = ctx
            .create_texture_2d(TextureDesc {
                width: size.width,
                height: size.height,
                internal_format: desc.internal_format,
                pixel_format: desc.pixel_format,
                component_type: desc.component_type,
            })
            .map_err(|e| {
                engine_error!("deferred::RenderTarget",
                    "Failed to allocate render target '{}' ({}x{}): {}",
                    desc.label, size.width, size.height, e);
                e
            })?;

        Ok(Self {
            desc,
            texture,
            width: size.width,
            height: size.height,
        })
    }

    /// Bind for use on the active texture unit
    ///
    /// If clear-on-bind is set, the *currently bound* surface is cleared
    /// (color and depth) with the target's clear value first.
    pub fn begin(&self, ctx: &mut dyn GraphicsContext) {
        if self.desc.clear_on_bind {
            ctx.set_clear_color(self.desc.clear_value);
            ctx.clear(ClearFlags::COLOR | ClearFlags::DEPTH);
        }
        ctx.bind_texture_2d(Some(self.texture));
    }

    /// Unbind the texture from the active unit
    pub fn end(&self, ctx: &mut dyn GraphicsContext) {
        ctx.bind_texture_2d(None);
    }

    /// Release the texture
    pub fn destroy(self, ctx: &mut dyn GraphicsContext) {
        ctx.delete_texture(self.texture);
    }

    // ===== ACCESSORS =====

    /// Texture handle (stable for the target's lifetime)
    pub fn texture_handle(&self) -> TextureHandle {
        self.texture
    }

    pub fn label(&self) -> &str {
        &self.desc.label
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn desc(&self) -> &RenderTargetDesc {
        &self.desc
    }
}

#[cfg(test)]
#[path = "render_target_tests.rs"]
mod tests;
