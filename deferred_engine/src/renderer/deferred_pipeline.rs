/// DeferredPipeline - per-frame geometry pass, light forwarding and composition
///
/// One frame:
///
/// 1. G-buffer `begin`, geometry program draws every drawable object
///    (`mvp`, `model`) into the attachments
/// 2. G-buffer `end` (default surface bound, attachment units empty)
/// 3. Lighting program for the composition mode: samplers, camera, lights
/// 4. Default surface cleared, attachments bound on units `0..N`,
///    full-screen quad drawn once
/// 5. Optional depth blit so later overlays depth-test against the scene
///
/// Meshes live outside the engine: the geometry pass calls back into the
/// caller for each drawable object, with the geometry program current and
/// its transforms uploaded.

use glam::Vec4;
use crate::error::{Error, Result};
use crate::graphics_context::{GraphicsContext, ClearFlags};
use crate::renderer::{GBuffer, RenderTarget, RenderTargetDesc, ShaderProgram, ShaderCapabilities};
use crate::scene::{Scene, SceneObject, ObjectKey, LightLimits};
use crate::camera::Camera;
use crate::{engine_error, engine_info, engine_trace};

// ===== CONFIGURATION =====

/// Lighting program used to composite the G-buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompositionMode {
    /// Blinn-Phong lighting
    #[default]
    Deferred,
    /// Gooch cool-to-warm shading
    Gooch,
    /// Quantized toon shading (`toon_color_levels`)
    Toon,
}

/// One G-buffer attachment and the sampler that reads it
#[derive(Debug, Clone, PartialEq)]
pub struct GBufferAttachment {
    pub desc: RenderTargetDesc,
    /// Sampler uniform name in the lighting programs
    pub sampler: String,
}

/// Attachments of the G-buffer, in slot order
#[derive(Debug, Clone, PartialEq)]
pub struct GBufferLayout {
    pub attachments: Vec<GBufferAttachment>,
}

impl Default for GBufferLayout {
    /// Position (RGBA16F), normal (RGBA16F), albedo + specular (RGBA8)
    fn default() -> Self {
        Self {
            attachments: vec![
                GBufferAttachment {
                    desc: RenderTargetDesc::rgba16f("position"),
                    sampler: "gPosition".to_string(),
                },
                GBufferAttachment {
                    desc: RenderTargetDesc::rgba16f("normal"),
                    sampler: "gNormal".to_string(),
                },
                GBufferAttachment {
                    desc: RenderTargetDesc::rgba8("albedo_spec"),
                    sampler: "gAlbedoSpec".to_string(),
                },
            ],
        }
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Clear color of the default surface before composition
    pub clear_color: Vec4,
    /// Capacity of the lighting programs' light arrays
    pub light_limits: LightLimits,
    pub composition_mode: CompositionMode,
    /// Copy G-buffer depth to the default surface after composition
    pub blit_depth_after_composite: bool,
    /// Color bands of the toon program
    pub toon_color_levels: i32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            clear_color: Vec4::new(0.2, 0.3, 0.3, 1.0),
            light_limits: LightLimits::default(),
            composition_mode: CompositionMode::Deferred,
            blit_depth_after_composite: true,
            toon_color_levels: 1,
        }
    }
}

/// Lighting programs, one per composition mode
///
/// Only `deferred` is required. Selecting a mode whose program is missing
/// fails the frame before anything is drawn.
#[derive(Debug)]
pub struct CompositionShaders {
    pub deferred: ShaderProgram,
    pub gooch: Option<ShaderProgram>,
    pub toon: Option<ShaderProgram>,
}

impl CompositionShaders {
    pub fn new(deferred: ShaderProgram) -> Self {
        Self { deferred, gooch: None, toon: None }
    }

    /// Program for `mode`
    pub fn select(&self, mode: CompositionMode) -> Result<&ShaderProgram> {
        let program = match mode {
            CompositionMode::Deferred => Some(&self.deferred),
            CompositionMode::Gooch => self.gooch.as_ref(),
            CompositionMode::Toon => self.toon.as_ref(),
        };
        program.ok_or_else(|| {
            Error::InvalidResource(format!("no lighting program for composition mode {:?}", mode))
        })
    }

    pub fn destroy(self, ctx: &mut dyn GraphicsContext) {
        self.deferred.destroy(ctx);
        if let Some(program) = self.gooch {
            program.destroy(ctx);
        }
        if let Some(program) = self.toon {
            program.destroy(ctx);
        }
    }
}

/// What one `render_frame` call did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    pub point_lights_forwarded: usize,
    pub directional_lights_forwarded: usize,
    /// Registered lights past the configured limits
    pub lights_dropped: usize,
    pub objects_drawn: usize,
}

// ===== PIPELINE =====

/// Deferred shading pipeline over one G-buffer
#[derive(Debug)]
pub struct DeferredPipeline {
    gbuffer: GBuffer,
    layout: GBufferLayout,
    config: PipelineConfig,
    time: f32,
    frame_index: u64,
}

impl DeferredPipeline {
    /// Build the G-buffer described by `layout` at the current screen size
    pub fn new(ctx: &mut dyn GraphicsContext, layout: GBufferLayout, config: PipelineConfig) -> Result<Self> {
        let mut gbuffer = GBuffer::new(ctx)?;

        if let Err(e) = Self::populate(ctx, &mut gbuffer, &layout) {
            engine_error!("deferred::DeferredPipeline", "Failed to build G-buffer: {}", e);
            gbuffer.destroy(ctx);
            return Err(e);
        }

        engine_info!("deferred::DeferredPipeline",
            "Pipeline ready: {} attachment(s), mode {:?}",
            layout.attachments.len(), config.composition_mode);

        Ok(Self {
            gbuffer,
            layout,
            config,
            time: 0.0,
            frame_index: 0,
        })
    }

    fn populate(ctx: &mut dyn GraphicsContext, gbuffer: &mut GBuffer, layout: &GBufferLayout) -> Result<()> {
        for attachment in &layout.attachments {
            let target = RenderTarget::new(ctx, attachment.desc.clone())?;
            gbuffer.add_target(ctx, target)?;
        }
        gbuffer.finish_init(ctx)
    }

    /// Render one frame to the default surface
    ///
    /// `draw_mesh` is called once per drawable object, inside the geometry
    /// pass, with the geometry program current.
    pub fn render_frame<F>(
        &mut self,
        ctx: &mut dyn GraphicsContext,
        scene: &Scene,
        camera: &Camera,
        geometry: &ShaderProgram,
        lighting: &CompositionShaders,
        mut draw_mesh: F,
    ) -> Result<FrameStats>
    where
        F: FnMut(&mut dyn GraphicsContext, ObjectKey, &SceneObject),
    {
        let lighting_program = lighting.select(self.config.composition_mode)?;
        let mut stats = FrameStats::default();

        // Geometry pass
        self.gbuffer.begin(ctx)?;
        geometry.use_program(ctx);
        camera.send_to_shader(ctx, geometry);
        self.send_time(ctx, geometry);

        let view_projection = camera.view_projection();
        for (key, object) in scene.objects() {
            if !object.is_drawable() {
                continue;
            }
            let model = object.transform.matrix();
            geometry.set_uniform(ctx, "mvp", view_projection * model);
            geometry.set_uniform(ctx, "model", model);
            draw_mesh(&mut *ctx, key, object);
            stats.objects_drawn += 1;
        }
        self.gbuffer.end(ctx)?;

        // Lighting inputs
        if self.config.composition_mode == CompositionMode::Toon {
            lighting_program.set_uniform(ctx, "toon_color_levels", self.config.toon_color_levels);
        }
        for (unit, attachment) in self.layout.attachments.iter().enumerate() {
            lighting_program.set_uniform(ctx, &attachment.sampler, unit as i32);
        }
        lighting_program.use_program(ctx);
        camera.send_to_shader(ctx, lighting_program);
        self.send_time(ctx, lighting_program);
        let lights = scene.apply_lights(ctx, lighting_program, self.config.light_limits);
        stats.point_lights_forwarded = lights.point_lights_forwarded;
        stats.directional_lights_forwarded = lights.directional_lights_forwarded;
        stats.lights_dropped = lights.lights_dropped;

        // Composition
        ctx.set_clear_color(self.config.clear_color);
        ctx.clear(ClearFlags::COLOR | ClearFlags::DEPTH);
        self.gbuffer.bind_textures(ctx)?;
        lighting_program.use_program(ctx);
        self.gbuffer.render_quad(ctx)?;
        self.gbuffer.unbind_textures(ctx);

        if self.config.blit_depth_after_composite {
            self.gbuffer.blit_depth_to_default(ctx)?;
        }

        engine_trace!("deferred::DeferredPipeline",
            "Frame {}: {} object(s), {} point / {} directional light(s), {} dropped",
            self.frame_index, stats.objects_drawn, stats.point_lights_forwarded,
            stats.directional_lights_forwarded, stats.lights_dropped);
        self.frame_index += 1;

        Ok(stats)
    }

    fn send_time(&self, ctx: &mut dyn GraphicsContext, program: &ShaderProgram) {
        if program.has_capability(ShaderCapabilities::TIME) {
            program.set_uniform(ctx, "time", self.time);
        }
    }

    // ===== STATE =====

    /// Advance the `time` uniform by `delta` seconds
    pub fn advance_time(&mut self, delta: f32) {
        self.time += delta;
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    /// Number of frames rendered so far
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn set_composition_mode(&mut self, mode: CompositionMode) {
        self.config.composition_mode = mode;
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut PipelineConfig {
        &mut self.config
    }

    pub fn gbuffer(&self) -> &GBuffer {
        &self.gbuffer
    }

    pub fn layout(&self) -> &GBufferLayout {
        &self.layout
    }

    /// Release the G-buffer
    pub fn destroy(self, ctx: &mut dyn GraphicsContext) {
        self.gbuffer.destroy(ctx);
    }
}

#[cfg(test)]
#[path = "deferred_pipeline_tests.rs"]
mod tests;
