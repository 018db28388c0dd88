//! Integration tests for the deferred pipeline
//!
//! These tests build a G-buffer and run whole frames through the public API
//! on a RecordingContext, checking the state the context is left in.
//!
//! Run with: cargo test --test pipeline_integration_tests


use deferred_engine::deferred::Error;
use deferred_engine::deferred::context::{
    RecordingContext, ContextCommand, InternalFormat, ClearFlags, PrimitiveTopology,
};
use deferred_engine::deferred::render::{
    GBuffer, GBufferState, RenderTarget, RenderTargetDesc, DeferredPipeline, GBufferLayout,
    PipelineConfig, Light,
};
use deferred_engine::deferred::scene::{Scene, SceneObject, Transform, MeshId};
use deferred_engine::glam::{Vec3, Vec4};
use test_utils::*;

// ============================================================================
// G-BUFFER
// ============================================================================

fn standard_gbuffer(ctx: &mut RecordingContext) -> GBuffer {
    let mut gbuffer = GBuffer::new(ctx).unwrap();
    for desc in [
        RenderTargetDesc::rgba16f("position"),
        RenderTargetDesc::rgba16f("normal"),
        RenderTargetDesc::rgba8("albedo_spec"),
    ] {
        let target = RenderTarget::new(ctx, desc).unwrap();
        gbuffer.add_target(ctx, target).unwrap();
    }
    gbuffer.finish_init(ctx).unwrap();
    gbuffer
}

#[test]
fn test_integration_gbuffer_attachments_match_screen() {
    let mut ctx = RecordingContext::new(SCREEN_WIDTH, SCREEN_HEIGHT);
    let gbuffer = standard_gbuffer(&mut ctx);

    let handles: Vec<_> = gbuffer.targets().iter().map(|t| t.texture_handle()).collect();
    assert_eq!(handles.len(), 3);
    assert_ne!(handles[0], handles[1]);
    assert_ne!(handles[1], handles[2]);
    assert_ne!(handles[0], handles[2]);

    let formats = [InternalFormat::Rgba16F, InternalFormat::Rgba16F, InternalFormat::Rgba8];
    for (handle, format) in handles.iter().zip(formats) {
        let desc = ctx.texture_desc(*handle).unwrap();
        assert_eq!((desc.width, desc.height), (SCREEN_WIDTH, SCREEN_HEIGHT));
        assert_eq!(desc.internal_format, format);
    }

    // Handles are stable across frames
    let mut gbuffer = gbuffer;
    gbuffer.begin(&mut ctx).unwrap();
    gbuffer.end(&mut ctx).unwrap();
    let after: Vec<_> = gbuffer.targets().iter().map(|t| t.texture_handle()).collect();
    assert_eq!(handles, after);
}

#[test]
fn test_integration_gbuffer_draw_buffers_follow_insertion_order() {
    let mut ctx = RecordingContext::new(SCREEN_WIDTH, SCREEN_HEIGHT);
    let gbuffer = standard_gbuffer(&mut ctx);

    assert_eq!(gbuffer.draw_buffers(), &[0, 1, 2]);
    assert_eq!(ctx.draw_buffers_of(gbuffer.framebuffer()), vec![0, 1, 2]);

    let attachments = ctx.color_attachments(gbuffer.framebuffer());
    for (slot, target) in gbuffer.targets().iter().enumerate() {
        assert!(attachments.contains(&(slot as u32, target.texture_handle())));
    }
    assert_eq!(ctx.depth_attachment(gbuffer.framebuffer()), Some(gbuffer.depth_texture()));
}

#[test]
fn test_integration_empty_frames_are_idempotent() {
    let mut ctx = RecordingContext::new(SCREEN_WIDTH, SCREEN_HEIGHT);
    let mut gbuffer = standard_gbuffer(&mut ctx);

    for _ in 0..4 {
        gbuffer.begin(&mut ctx).unwrap();
        assert_eq!(ctx.bound_draw_framebuffer(), Some(gbuffer.framebuffer()));
        gbuffer.end(&mut ctx).unwrap();

        assert_eq!(gbuffer.state(), GBufferState::Ended);
        assert_eq!(ctx.bound_draw_framebuffer(), None);
        assert_eq!(ctx.bound_texture_count(), 0);
    }
}

#[test]
fn test_integration_gbuffer_misuse_is_reported() {
    let mut ctx = RecordingContext::new(SCREEN_WIDTH, SCREEN_HEIGHT);
    let mut gbuffer = standard_gbuffer(&mut ctx);

    // Targets can't be added once the surface is ready
    let late = RenderTarget::new(&mut ctx, RenderTargetDesc::rgba8("late")).unwrap();
    assert!(matches!(gbuffer.add_target(&mut ctx, late), Err(Error::InvalidState(_))));

    assert!(matches!(gbuffer.end(&mut ctx), Err(Error::InvalidState(_))));
    gbuffer.begin(&mut ctx).unwrap();
    assert!(matches!(gbuffer.begin(&mut ctx), Err(Error::InvalidState(_))));
    assert!(gbuffer.bind_textures(&mut ctx).is_err());
}

#[test]
fn test_integration_gbuffer_destroy_releases_resources() {
    let mut ctx = RecordingContext::new(SCREEN_WIDTH, SCREEN_HEIGHT);
    let gbuffer = standard_gbuffer(&mut ctx);
    assert_eq!(ctx.live_texture_count(), 4);

    gbuffer.destroy(&mut ctx);

    assert_eq!(ctx.live_texture_count(), 0);
    assert_eq!(ctx.live_framebuffer_count(), 0);
    assert_eq!(ctx.live_vertex_array_count(), 0);
}

// ============================================================================
// FRAMES
// ============================================================================

fn demo_scene() -> Scene {
    let mut scene = Scene::new();
    for i in 0..3 {
        let position = Vec3::new(i as f32 * 2.0 - 2.0, 0.0, 0.0);
        scene.add_object(SceneObject::with_mesh(&format!("cube{}", i), Transform::from_position(position), MeshId(1)));
    }
    let sun = scene.add_object(SceneObject::new("sun", Transform::default()));
    scene
        .attach_light(Light::directional(sun, Vec3::new(-0.2, -1.0, -0.3), Vec4::splat(0.4), Vec4::splat(0.05), Vec4::splat(0.5), 1.0))
        .unwrap();
    for i in 0..2 {
        let lamp = scene.add_object(SceneObject::new(
            &format!("lamp{}", i),
            Transform::from_position(Vec3::new(i as f32, 1.0, 1.0)),
        ));
        scene
            .attach_light(Light::point(lamp, Vec4::ONE, Vec4::splat(0.1), Vec4::ONE, 1.0))
            .unwrap();
    }
    scene
}

#[test]
fn test_integration_full_frame() {
    let mut ctx = RecordingContext::new(SCREEN_WIDTH, SCREEN_HEIGHT);
    let mut pipeline = DeferredPipeline::new(&mut ctx, GBufferLayout::default(), PipelineConfig::default()).unwrap();
    let geometry = geometry_program(&mut ctx);
    let lighting = lighting_programs(&mut ctx);
    let scene = demo_scene();
    let camera = test_camera();
    let mut meshes_drawn = 0;

    let stats = pipeline
        .render_frame(&mut ctx, &scene, &camera, &geometry, &lighting, |_ctx, _key, object| {
            assert_eq!(object.mesh, Some(MeshId(1)));
            meshes_drawn += 1;
        })
        .unwrap();

    assert_eq!(meshes_drawn, 3);
    assert_eq!(stats.objects_drawn, 3);
    assert_eq!(stats.point_lights_forwarded, 2);
    assert_eq!(stats.directional_lights_forwarded, 1);
    assert_eq!(stats.lights_dropped, 0);

    // One composition draw, on the default surface
    let quads: Vec<_> = ctx
        .commands()
        .iter()
        .filter(|c| matches!(c, ContextCommand::DrawArrays { topology: PrimitiveTopology::TriangleStrip, .. }))
        .collect();
    assert_eq!(quads.len(), 1);
    assert!(matches!(quads[0], ContextCommand::DrawArrays { framebuffer: None, count: 4, .. }));

    // Depth copied back for overlays
    let fb = pipeline.gbuffer().framebuffer();
    assert!(ctx.commands().iter().any(|c| matches!(
        c, ContextCommand::BlitFramebuffer { src: Some(src), dst: None, mask, .. }
            if *src == fb && *mask == ClearFlags::DEPTH
    )));

    // Clean state for whatever draws next
    assert_eq!(ctx.bound_draw_framebuffer(), None);
    assert_eq!(ctx.bound_texture_count(), 0);
}

#[test]
fn test_integration_frames_reuse_resources() {
    let mut ctx = RecordingContext::new(SCREEN_WIDTH, SCREEN_HEIGHT);
    let mut pipeline = DeferredPipeline::new(&mut ctx, GBufferLayout::default(), PipelineConfig::default()).unwrap();
    let geometry = geometry_program(&mut ctx);
    let lighting = lighting_programs(&mut ctx);
    let scene = demo_scene();
    let camera = test_camera();

    let textures = ctx.live_texture_count();
    let vertex_arrays = ctx.live_vertex_array_count();

    for _ in 0..5 {
        pipeline.advance_time(1.0 / 60.0);
        pipeline
            .render_frame(&mut ctx, &scene, &camera, &geometry, &lighting, |_, _, _| {})
            .unwrap();
    }

    assert_eq!(pipeline.frame_index(), 5);
    assert_eq!(ctx.live_texture_count(), textures);
    assert_eq!(ctx.live_vertex_array_count(), vertex_arrays);
}

#[test]
fn test_integration_pipeline_teardown() {
    let mut ctx = RecordingContext::new(SCREEN_WIDTH, SCREEN_HEIGHT);
    let pipeline = DeferredPipeline::new(&mut ctx, GBufferLayout::default(), PipelineConfig::default()).unwrap();
    let geometry = geometry_program(&mut ctx);
    let lighting = lighting_programs(&mut ctx);

    pipeline.destroy(&mut ctx);
    geometry.destroy(&mut ctx);
    lighting.destroy(&mut ctx);

    assert_eq!(ctx.live_texture_count(), 0);
    assert_eq!(ctx.live_framebuffer_count(), 0);
    assert_eq!(ctx.live_program_count(), 0);
}
