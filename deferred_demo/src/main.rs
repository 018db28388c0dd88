//! # Deferred Demo
//!
//! Runs the deferred pipeline headless on a `RecordingContext`:
//! - G-buffer with position / normal / albedo attachments
//! - One textured room mesh, an orbiting point light and a sun
//! - Composition cycling through Blinn-Phong, Gooch and toon programs
//!
//! Each frame prints what the pipeline did and how many context commands
//! it issued.

mod mesh;

use std::f32::consts::{FRAC_PI_2, TAU};
use std::path::{Path, PathBuf};

use deferred_engine::deferred::{Engine, Result};
use deferred_engine::deferred::log::{DefaultLogger, LogSeverity, SeverityFilter};
use deferred_engine::deferred::context::RecordingContext;
use deferred_engine::deferred::render::{
    CompositionMode, CompositionShaders, DeferredPipeline, GBufferLayout, Light, PipelineConfig,
    ShaderProgram,
};
use deferred_engine::deferred::scene::{MeshId, ObjectKey, Scene, SceneObject, Transform};
use deferred_engine::deferred::camera::Camera;
use glam::{EulerRot, Quat, Vec2, Vec3, Vec4};
use mesh::Mesh;

// Demo configuration constants
const SCREEN_WIDTH: u32 = 800;
const SCREEN_HEIGHT: u32 = 600;
const FRAMES_PER_MODE: u32 = 4;
const FRAME_TIME: f32 = 1.0 / 60.0;
const TOON_COLOR_LEVELS: i32 = 4;
const LAMP_ORBIT_RADIUS: f32 = 1.5;

fn shader_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("shaders")
}

fn load_program(ctx: &mut RecordingContext, name: &str, vertex: &str, fragment: &str) -> Result<ShaderProgram> {
    let dir = shader_dir();
    ShaderProgram::load(ctx, name, dir.join(vertex), dir.join(fragment))
}

fn build_scene() -> Result<(Scene, ObjectKey)> {
    let mut scene = Scene::new();

    let room = Transform {
        position: Vec3::ZERO,
        rotation: Quat::from_euler(EulerRot::XYZ, 0.0, -FRAC_PI_2, -FRAC_PI_2),
        scale: Vec3::ONE,
    };
    scene.add_object(SceneObject::with_mesh("Viking room", room, MeshId(0)));

    let lamp = scene.add_object(SceneObject::new("Light", Transform::from_position(Vec3::new(0.0, 2.0, 0.0))));
    let point = Light::point(lamp, Vec4::ONE, Vec4::new(0.5, 0.5, 0.5, 1.0), Vec4::new(0.5, 0.5, 0.5, 1.0), 1.0);
    scene.attach_light(point)?;

    let sun = scene.add_object(SceneObject::new("Sun", Transform::default()));
    scene.attach_light(Light::directional(
        sun,
        Vec3::new(-0.2, -1.0, -0.3),
        Vec4::splat(0.4),
        Vec4::splat(0.05),
        Vec4::splat(0.5),
        0.5,
    ))?;

    Ok((scene, lamp))
}

fn main() -> Result<()> {
    Engine::set_logger(SeverityFilter::new(LogSeverity::Info, DefaultLogger));

    let mut ctx = RecordingContext::new(SCREEN_WIDTH, SCREEN_HEIGHT);

    let geometry = load_program(&mut ctx, "g_buffer", "g_buffer.vs", "g_buffer.fs")?;
    let mut lighting = CompositionShaders::new(load_program(&mut ctx, "deferred", "quad.vs", "deferred.fs")?);
    lighting.gooch = Some(load_program(&mut ctx, "gooched", "quad.vs", "gooch.fs")?);
    lighting.toon = Some(load_program(&mut ctx, "tooned", "quad.vs", "toon.fs")?);

    let config = PipelineConfig {
        toon_color_levels: TOON_COLOR_LEVELS,
        ..PipelineConfig::default()
    };
    let mut pipeline = DeferredPipeline::new(&mut ctx, GBufferLayout::default(), config)?;

    let meshes = vec![Mesh::upload(&mut ctx, "cube", &mesh::cube_vertices())?];
    let (mut scene, lamp) = build_scene()?;
    let camera = Camera::look_at_perspective(
        FRAC_PI_2,
        Vec2::new(SCREEN_WIDTH as f32, SCREEN_HEIGHT as f32),
        0.1,
        100.0,
        Vec3::new(0.0, 0.0, 2.0),
        Vec3::ZERO,
    );

    let modes = [CompositionMode::Deferred, CompositionMode::Gooch, CompositionMode::Toon];
    for mode in modes {
        pipeline.set_composition_mode(mode);

        for _ in 0..FRAMES_PER_MODE {
            pipeline.advance_time(FRAME_TIME);
            let angle = pipeline.time() * TAU;
            if let Some(object) = scene.object_mut(lamp) {
                object.transform.position = Vec3::new(
                    LAMP_ORBIT_RADIUS * angle.cos(),
                    2.0,
                    LAMP_ORBIT_RADIUS * angle.sin(),
                );
            }

            ctx.clear_commands();
            let stats = pipeline.render_frame(&mut ctx, &scene, &camera, &geometry, &lighting, |ctx, _key, object| {
                if let Some(mesh) = object.mesh.and_then(|id| meshes.get(id.0 as usize)) {
                    mesh.draw(ctx);
                }
            })?;

            println!(
                "frame {:>2} [{:?}] objects={} point={} directional={} dropped={} commands={} draws={}",
                pipeline.frame_index() - 1,
                mode,
                stats.objects_drawn,
                stats.point_lights_forwarded,
                stats.directional_lights_forwarded,
                stats.lights_dropped,
                ctx.commands().len(),
                ctx.draw_call_count(),
            );
        }
    }

    for mesh in meshes {
        println!("releasing mesh '{}'", mesh.name);
        mesh.destroy(&mut ctx);
    }
    pipeline.destroy(&mut ctx);
    geometry.destroy(&mut ctx);
    lighting.destroy(&mut ctx);

    println!(
        "live resources after teardown: textures={} framebuffers={} programs={} vertex arrays={}",
        ctx.live_texture_count(),
        ctx.live_framebuffer_count(),
        ctx.live_program_count(),
        ctx.live_vertex_array_count(),
    );

    Engine::reset_logger();
    Ok(())
}
