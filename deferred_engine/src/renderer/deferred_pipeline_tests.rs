/// Unit tests for deferred_pipeline.rs
///
/// Runs whole frames on a RecordingContext and checks the command order.

use super::*;
use glam::{Mat4, Vec2, Vec3};
use crate::graphics_context::{RecordingContext, ContextCommand, UniformValue, PrimitiveTopology, InternalFormat};
use crate::renderer::{Light, GBufferState};
use crate::scene::{Transform, MeshId};

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

const GEOMETRY_VS: &str = "
    uniform mat4 mvp;
    uniform mat4 model;
    uniform float time;
    void main() {}
";

const GEOMETRY_FS: &str = "
    uniform sampler2D texture_diffuse;
    void main() {}
";

const LIGHTING_VS: &str = "void main() {}";

const LIGHTING_FS: &str = "
    struct PointLight { vec3 position; vec4 ambient; vec4 diffuse; vec4 specular;
                        float constant; float linear; float quadratic; float radius; };
    struct DirLight { vec3 direction; vec4 ambient; vec4 diffuse; vec4 specular; float radius; };
    #define NR_POINT_LIGHTS 32
    #define NR_DIR_LIGHTS 4
    uniform sampler2D gPosition;
    uniform sampler2D gNormal;
    uniform sampler2D gAlbedoSpec;
    uniform PointLight pointLights[NR_POINT_LIGHTS];
    uniform DirLight dirLights[NR_DIR_LIGHTS];
    uniform int pointLightCount;
    uniform int dirLightCount;
    uniform vec3 viewPos;
    uniform int toon_color_levels;
    void main() {}
";

struct Fixture {
    ctx: RecordingContext,
    pipeline: DeferredPipeline,
    geometry: ShaderProgram,
    lighting: CompositionShaders,
    scene: Scene,
    camera: Camera,
}

fn fixture(config: PipelineConfig) -> Fixture {
    let mut ctx = RecordingContext::new(800, 600);
    let pipeline = DeferredPipeline::new(&mut ctx, GBufferLayout::default(), config).unwrap();
    let geometry = ShaderProgram::from_sources(&mut ctx, "g_buffer", GEOMETRY_VS, GEOMETRY_FS).unwrap();
    let mut lighting = CompositionShaders::new(
        ShaderProgram::from_sources(&mut ctx, "deferred", LIGHTING_VS, LIGHTING_FS).unwrap(),
    );
    lighting.toon = Some(ShaderProgram::from_sources(&mut ctx, "toon", LIGHTING_VS, LIGHTING_FS).unwrap());

    let mut scene = Scene::new();
    scene.add_object(SceneObject::with_mesh("cube", Transform::from_position(Vec3::X), MeshId(7)));
    let lamp = scene.add_object(SceneObject::new("lamp", Transform::from_position(Vec3::new(0.0, 2.0, 0.0))));
    scene
        .attach_light(Light::point(lamp, Vec4::ONE, Vec4::splat(0.5), Vec4::splat(0.5), 1.0))
        .unwrap();

    let camera = Camera::look_at_perspective(
        std::f32::consts::FRAC_PI_2,
        Vec2::new(800.0, 600.0),
        0.1,
        100.0,
        Vec3::new(0.0, 0.0, 2.0),
        Vec3::ZERO,
    );

    Fixture { ctx, pipeline, geometry, lighting, scene, camera }
}

fn render(f: &mut Fixture) -> Result<FrameStats> {
    f.pipeline.render_frame(
        &mut f.ctx,
        &f.scene,
        &f.camera,
        &f.geometry,
        &f.lighting,
        |_ctx, _key, _object| {},
    )
}

fn position_of(commands: &[ContextCommand], predicate: impl Fn(&ContextCommand) -> bool) -> usize {
    commands.iter().position(predicate).unwrap()
}

// ============================================================================
// CONSTRUCTION
// ============================================================================

#[test]
fn test_new_builds_default_layout() {
    let mut ctx = RecordingContext::new(320, 240);
    let pipeline = DeferredPipeline::new(&mut ctx, GBufferLayout::default(), PipelineConfig::default()).unwrap();

    let gbuffer = pipeline.gbuffer();
    assert_eq!(gbuffer.state(), GBufferState::Ready);
    assert_eq!(gbuffer.target_count(), 3);
    assert_eq!(gbuffer.target(0).unwrap().desc().internal_format, InternalFormat::Rgba16F);
    assert_eq!(gbuffer.target(2).unwrap().desc().internal_format, InternalFormat::Rgba8);
    assert_eq!(pipeline.layout().attachments[1].sampler, "gNormal");
}

#[test]
fn test_new_failure_releases_everything() {
    let mut ctx = RecordingContext::new(320, 240);
    ctx.fail_next_texture_allocation();

    let pipeline = DeferredPipeline::new(&mut ctx, GBufferLayout::default(), PipelineConfig::default());

    assert!(matches!(pipeline, Err(Error::OutOfMemory)));
    assert_eq!(ctx.live_texture_count(), 0);
    assert_eq!(ctx.live_framebuffer_count(), 0);
}

#[test]
fn test_new_with_empty_layout() {
    let mut ctx = RecordingContext::new(320, 240);
    let layout = GBufferLayout { attachments: Vec::new() };
    let pipeline = DeferredPipeline::new(&mut ctx, layout, PipelineConfig::default()).unwrap();

    assert_eq!(pipeline.gbuffer().target_count(), 0);
    assert!(pipeline.gbuffer().draw_buffers().is_empty());
}

#[test]
fn test_default_config() {
    let config = PipelineConfig::default();
    assert_eq!(config.clear_color, Vec4::new(0.2, 0.3, 0.3, 1.0));
    assert_eq!(config.composition_mode, CompositionMode::Deferred);
    assert_eq!(config.light_limits, LightLimits::default());
    assert!(config.blit_depth_after_composite);
}

// ============================================================================
// FRAME
// ============================================================================

#[test]
fn test_frame_command_order() {
    let mut f = fixture(PipelineConfig::default());
    f.ctx.clear_commands();

    render(&mut f).unwrap();

    let fb = f.pipeline.gbuffer().framebuffer();
    let deferred = f.lighting.deferred.handle();
    let commands = f.ctx.commands();

    let bind_gbuffer = position_of(commands, |c| *c == ContextCommand::BindDrawFramebuffer(Some(fb)));
    let unbind_gbuffer = position_of(commands, |c| *c == ContextCommand::BindDrawFramebuffer(None));
    let light_upload = position_of(commands, |c| matches!(
        c, ContextCommand::SetUniform { name, .. } if name.starts_with("pointLights[0]")
    ));
    let default_clear = position_of(commands, |c| matches!(
        c, ContextCommand::Clear { framebuffer: None, .. }
    ));
    let quad = position_of(commands, |c| matches!(
        c, ContextCommand::DrawArrays { topology: PrimitiveTopology::TriangleStrip, .. }
    ));
    let blit = position_of(commands, |c| matches!(c, ContextCommand::BlitFramebuffer { .. }));

    assert!(bind_gbuffer < unbind_gbuffer);
    assert!(unbind_gbuffer < light_upload);
    assert!(light_upload < default_clear);
    assert!(default_clear < quad);
    assert!(quad < blit);

    // The quad is drawn on the default surface with the lighting program
    assert!(matches!(
        commands[quad],
        ContextCommand::DrawArrays { framebuffer: None, program: Some(p), count: 4, .. } if p == deferred
    ));
}

#[test]
fn test_frame_binds_attachments_on_matching_units() {
    let mut f = fixture(PipelineConfig::default());
    f.ctx.clear_commands();
    render(&mut f).unwrap();

    let commands = f.ctx.commands();
    let quad = position_of(commands, |c| matches!(
        c, ContextCommand::DrawArrays { topology: PrimitiveTopology::TriangleStrip, .. }
    ));

    // Replay unit bindings up to the quad draw
    let mut unit = 0;
    let mut bound = std::collections::BTreeMap::new();
    for command in &commands[..quad] {
        match command {
            ContextCommand::ActiveTextureUnit(u) => unit = *u,
            ContextCommand::BindTexture2d { texture: Some(t), .. } => {
                bound.insert(unit, *t);
            }
            ContextCommand::BindTexture2d { texture: None, .. } => {
                bound.remove(&unit);
            }
            _ => {}
        }
    }
    for (slot, target) in f.pipeline.gbuffer().targets().iter().enumerate() {
        assert_eq!(bound.get(&(slot as u32)), Some(&target.texture_handle()));
    }

    // Frame ends with no texture bound and the default surface active
    assert_eq!(f.ctx.bound_texture_count(), 0);
    assert_eq!(f.ctx.bound_draw_framebuffer(), None);
}

#[test]
fn test_frame_sets_samplers_by_slot() {
    let mut f = fixture(PipelineConfig::default());
    render(&mut f).unwrap();

    let handle = f.lighting.deferred.handle();
    assert_eq!(f.ctx.uniform_value(handle, "gPosition"), Some(UniformValue::Int(0)));
    assert_eq!(f.ctx.uniform_value(handle, "gNormal"), Some(UniformValue::Int(1)));
    assert_eq!(f.ctx.uniform_value(handle, "gAlbedoSpec"), Some(UniformValue::Int(2)));
}

#[test]
fn test_geometry_pass_uploads_transforms_and_calls_back() {
    let mut f = fixture(PipelineConfig::default());
    let mut drawn = Vec::new();

    let stats = f.pipeline.render_frame(
        &mut f.ctx,
        &f.scene,
        &f.camera,
        &f.geometry,
        &f.lighting,
        |ctx, _key, object| {
            // Marker command to see which surface the callback draws into
            ctx.clear(ClearFlags::STENCIL);
            drawn.push((object.name.clone(), object.mesh));
        },
    ).unwrap();

    assert_eq!(stats.objects_drawn, 1);
    assert_eq!(drawn, vec![("cube".to_string(), Some(MeshId(7)))]);
    let fb = f.pipeline.gbuffer().framebuffer();
    assert!(f.ctx.commands().iter().any(|c| matches!(
        c, ContextCommand::Clear { framebuffer: Some(target), mask: ClearFlags::STENCIL, .. } if *target == fb
    )));

    let model = Mat4::from_translation(Vec3::X);
    let handle = f.geometry.handle();
    assert_eq!(f.ctx.uniform_value(handle, "model").and_then(|v| v.as_mat4()), Some(model));
    assert_eq!(
        f.ctx.uniform_value(handle, "mvp").and_then(|v| v.as_mat4()),
        Some(f.camera.view_projection() * model)
    );
}

#[test]
fn test_hidden_objects_are_skipped() {
    let mut f = fixture(PipelineConfig::default());
    let keys: Vec<_> = f.scene.objects().map(|(k, _)| k).collect();
    for key in keys {
        f.scene.object_mut(key).unwrap().hidden = true;
    }

    let stats = render(&mut f).unwrap();
    assert_eq!(stats.objects_drawn, 0);
}

#[test]
fn test_frame_forwards_lights_and_counts() {
    let mut f = fixture(PipelineConfig::default());
    let stats = render(&mut f).unwrap();

    assert_eq!(stats.point_lights_forwarded, 1);
    assert_eq!(stats.directional_lights_forwarded, 0);
    let handle = f.lighting.deferred.handle();
    assert_eq!(f.ctx.uniform_value(handle, "pointLightCount"), Some(UniformValue::Int(1)));
    assert_eq!(
        f.ctx.uniform_value(handle, "pointLights[0].position"),
        Some(UniformValue::Vec3(Vec3::new(0.0, 2.0, 0.0)))
    );
    assert_eq!(
        f.ctx.uniform_value(handle, "viewPos"),
        Some(UniformValue::Vec3(Vec3::new(0.0, 0.0, 2.0)))
    );
}

#[test]
fn test_time_is_uploaded_to_programs_that_read_it() {
    let mut f = fixture(PipelineConfig::default());
    f.pipeline.advance_time(0.5);
    f.pipeline.advance_time(0.25);
    render(&mut f).unwrap();

    assert_eq!(f.pipeline.time(), 0.75);
    assert_eq!(f.ctx.uniform_value(f.geometry.handle(), "time"), Some(UniformValue::Float(0.75)));
}

#[test]
fn test_clear_color_from_config() {
    let config = PipelineConfig { clear_color: Vec4::new(1.0, 0.0, 1.0, 1.0), ..PipelineConfig::default() };
    let mut f = fixture(config);
    render(&mut f).unwrap();

    assert!(f.ctx.commands().iter().any(|c| *c == ContextCommand::Clear {
        framebuffer: None,
        mask: ClearFlags::COLOR | ClearFlags::DEPTH,
        color: Vec4::new(1.0, 0.0, 1.0, 1.0),
    }));
}

#[test]
fn test_blit_can_be_disabled() {
    let config = PipelineConfig { blit_depth_after_composite: false, ..PipelineConfig::default() };
    let mut f = fixture(config);
    render(&mut f).unwrap();

    assert!(!f.ctx.commands().iter().any(|c| matches!(c, ContextCommand::BlitFramebuffer { .. })));
}

#[test]
fn test_repeated_frames() {
    let mut f = fixture(PipelineConfig::default());
    for _ in 0..3 {
        render(&mut f).unwrap();
    }

    assert_eq!(f.pipeline.frame_index(), 3);
    assert_eq!(f.pipeline.gbuffer().state(), GBufferState::Ended);
}

// ============================================================================
// COMPOSITION MODES
// ============================================================================

#[test]
fn test_toon_mode_uses_toon_program() {
    let config = PipelineConfig { toon_color_levels: 5, ..PipelineConfig::default() };
    let mut f = fixture(config);
    f.pipeline.set_composition_mode(CompositionMode::Toon);
    f.ctx.clear_commands();

    render(&mut f).unwrap();

    let toon = f.lighting.toon.as_ref().unwrap().handle();
    assert_eq!(f.ctx.uniform_value(toon, "toon_color_levels"), Some(UniformValue::Int(5)));
    assert_eq!(f.ctx.uniform_value(toon, "gAlbedoSpec"), Some(UniformValue::Int(2)));
    assert!(f.ctx.commands().iter().any(|c| matches!(
        c, ContextCommand::DrawArrays { program: Some(p), .. } if *p == toon
    )));
    // The deferred program received nothing this frame
    assert!(f.ctx.uniform_values(f.lighting.deferred.handle()).is_empty());
}

#[test]
fn test_missing_mode_program_fails_before_drawing() {
    let mut f = fixture(PipelineConfig::default());
    f.pipeline.set_composition_mode(CompositionMode::Gooch);
    f.ctx.clear_commands();

    let result = render(&mut f);

    assert!(matches!(result, Err(Error::InvalidResource(_))));
    assert!(f.ctx.commands().is_empty());
    assert_eq!(f.pipeline.gbuffer().state(), GBufferState::Ready);
}

#[test]
fn test_select_program() {
    let f = fixture(PipelineConfig::default());
    assert_eq!(f.lighting.select(CompositionMode::Deferred).unwrap().name(), "deferred");
    assert_eq!(f.lighting.select(CompositionMode::Toon).unwrap().name(), "toon");
    assert!(f.lighting.select(CompositionMode::Gooch).is_err());
}
