/// Unit tests for render_target.rs
///
/// Uses RecordingContext, no GPU required.

use super::*;
use crate::error::Error;
use crate::graphics_context::{RecordingContext, ContextCommand};

// ============================================================================
// CREATION
// ============================================================================

#[test]
fn test_new_uses_screen_size() {
    let mut ctx = RecordingContext::new(1280, 720);
    let target = RenderTarget::new(&mut ctx, RenderTargetDesc::rgba16f("position")).unwrap();

    assert_eq!(target.width(), 1280);
    assert_eq!(target.height(), 720);
    assert_eq!(target.label(), "position");

    let desc = ctx.texture_desc(target.texture_handle()).unwrap();
    assert_eq!(desc.width, 1280);
    assert_eq!(desc.height, 720);
    assert_eq!(desc.internal_format, InternalFormat::Rgba16F);
}

#[test]
fn test_component_type_is_honoured() {
    let mut ctx = RecordingContext::new(64, 64);
    let target = RenderTarget::new(&mut ctx, RenderTargetDesc::rgba8("albedo")).unwrap();

    let desc = ctx.texture_desc(target.texture_handle()).unwrap();
    assert_eq!(desc.component_type, ComponentType::UnsignedByte);
    assert_eq!(desc.internal_format, InternalFormat::Rgba8);
}

#[test]
fn test_size_is_fixed_at_creation() {
    let mut ctx = RecordingContext::new(640, 480);
    let target = RenderTarget::new(&mut ctx, RenderTargetDesc::rgba16f("normal")).unwrap();
    ctx.set_screen_size(1920, 1080);

    assert_eq!(target.width(), 640);
    assert_eq!(ctx.texture_desc(target.texture_handle()).unwrap().height, 480);
}

#[test]
fn test_allocation_failure_is_returned() {
    let mut ctx = RecordingContext::new(64, 64);
    ctx.fail_next_texture_allocation();

    let result = RenderTarget::new(&mut ctx, RenderTargetDesc::rgba16f("position"));
    assert!(matches!(result, Err(Error::OutOfMemory)));
    assert_eq!(ctx.live_texture_count(), 0);
}

// ============================================================================
// BINDING
// ============================================================================

#[test]
fn test_begin_binds_on_active_unit() {
    let mut ctx = RecordingContext::new(64, 64);
    let target = RenderTarget::new(&mut ctx, RenderTargetDesc::rgba16f("position")).unwrap();

    ctx.active_texture_unit(2);
    target.begin(&mut ctx);
    assert_eq!(ctx.texture_bound_to_unit(2), Some(target.texture_handle()));

    target.end(&mut ctx);
    assert_eq!(ctx.texture_bound_to_unit(2), None);
}

#[test]
fn test_begin_without_clear_issues_no_clear() {
    let mut ctx = RecordingContext::new(64, 64);
    let target = RenderTarget::new(&mut ctx, RenderTargetDesc::rgba16f("position")).unwrap();
    ctx.clear_commands();

    target.begin(&mut ctx);
    assert!(!ctx.commands().iter().any(|c| matches!(c, ContextCommand::Clear { .. })));
}

#[test]
fn test_clear_on_bind_clears_bound_surface_first() {
    let mut ctx = RecordingContext::new(64, 64);
    let clear = Vec4::new(0.1, 0.2, 0.3, 1.0);
    let target = RenderTarget::new(
        &mut ctx,
        RenderTargetDesc::rgba16f("position").with_clear(clear),
    ).unwrap();
    ctx.clear_commands();

    target.begin(&mut ctx);

    let commands = ctx.commands();
    assert_eq!(commands[0], ContextCommand::SetClearColor(clear));
    assert_eq!(
        commands[1],
        ContextCommand::Clear {
            framebuffer: None,
            mask: ClearFlags::COLOR | ClearFlags::DEPTH,
            color: clear,
        }
    );
    assert!(matches!(commands[2], ContextCommand::BindTexture2d { texture: Some(_), .. }));
}

#[test]
fn test_destroy_releases_texture() {
    let mut ctx = RecordingContext::new(64, 64);
    let target = RenderTarget::new(&mut ctx, RenderTargetDesc::rgba16f("position")).unwrap();
    target.destroy(&mut ctx);

    assert_eq!(ctx.live_texture_count(), 0);
}
