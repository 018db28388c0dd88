/// ShaderProgram - a linked program plus the optional inputs it declares
///
/// At build time each stage's source is scanned for a small set of optional
/// uniforms (`viewPos`, `pointLightCount`, `dirLightCount`, `time`).
/// The union is kept as `ShaderCapabilities` so callers can skip uploads a
/// program would never read instead of producing missing-uniform warnings.
///
/// Uniforms are resolved by name on every `set_uniform` call. A name the
/// program doesn't declare is a logged warning, never an error.

use std::path::Path;
use crate::error::{Error, Result};
use crate::graphics_context::{
    GraphicsContext, ProgramHandle, ShaderHandle, ShaderStage, UniformData, reflect_uniforms,
};
use crate::{engine_error, engine_info, engine_warn};

bitflags::bitflags! {
    /// Optional program inputs detected in the stage sources
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShaderCapabilities: u32 {
        /// `viewPos` - camera position in world space
        const VIEW_POS = 1 << 0;
        /// `pointLightCount` - number of forwarded point lights
        const POINT_LIGHT_COUNT = 1 << 1;
        /// `dirLightCount` - number of forwarded directional lights
        const DIR_LIGHT_COUNT = 1 << 2;
        /// `time` - seconds since start
        const TIME = 1 << 3;
    }
}

impl ShaderCapabilities {
    /// Identifier that marks each capability in GLSL source
    const IDENTIFIERS: [(&'static str, ShaderCapabilities); 4] = [
        ("viewPos", ShaderCapabilities::VIEW_POS),
        ("pointLightCount", ShaderCapabilities::POINT_LIGHT_COUNT),
        ("dirLightCount", ShaderCapabilities::DIR_LIGHT_COUNT),
        ("time", ShaderCapabilities::TIME),
    ];

    /// Scan one stage's source for capability uniforms
    ///
    /// Only uniform declarations count, matched by whole name: `runtime`,
    /// a local `float time` or a `// time` comment don't set `TIME`.
    pub fn scan(source: &str) -> Self {
        let mut caps = ShaderCapabilities::empty();
        for uniform in reflect_uniforms(source) {
            for (identifier, cap) in Self::IDENTIFIERS {
                if uniform == identifier {
                    caps |= cap;
                }
            }
        }
        caps
    }
}

/// Linked shader program
#[derive(Debug)]
pub struct ShaderProgram {
    name: String,
    handle: ProgramHandle,
    capabilities: ShaderCapabilities,
}

impl ShaderProgram {
    /// Compile and link a vertex + fragment program from source text
    ///
    /// # Errors
    ///
    /// `ShaderCompilationFailed` or `ShaderLinkFailed` carrying the
    /// diagnostic text. Both are also logged at error level.
    pub fn from_sources(
        ctx: &mut dyn GraphicsContext,
        name: &str,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self> {
        Self::from_stages(ctx, name, &[
            (ShaderStage::Vertex, vertex_source),
            (ShaderStage::Fragment, fragment_source),
        ])
    }

    /// Read both stages from disk, then build as `from_sources`
    pub fn load(
        ctx: &mut dyn GraphicsContext,
        name: &str,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> Result<Self> {
        let vertex_source = read_source(vertex_path.as_ref())?;
        let fragment_source = read_source(fragment_path.as_ref())?;
        Self::from_sources(ctx, name, &vertex_source, &fragment_source)
    }

    /// Compile and link an arbitrary set of stages
    pub fn from_stages(
        ctx: &mut dyn GraphicsContext,
        name: &str,
        stages: &[(ShaderStage, &str)],
    ) -> Result<Self> {
        let mut compiled: Vec<ShaderHandle> = Vec::with_capacity(stages.len());
        let mut capabilities = ShaderCapabilities::empty();

        for (stage, source) in stages {
            match ctx.compile_shader(*stage, source) {
                Ok(shader) => compiled.push(shader),
                Err(e) => {
                    release_stages(ctx, &compiled);
                    let stage_name = format!("{} {}", name, stage.label());
                    let log = diagnostic(e);
                    engine_error!("deferred::ShaderProgram",
                        "Failed to compile shader {}: {}", stage_name, log);
                    return Err(Error::ShaderCompilationFailed { name: stage_name, log });
                }
            }
            capabilities |= ShaderCapabilities::scan(source);
        }

        let linked = ctx.link_program(&compiled);
        release_stages(ctx, &compiled);

        let handle = match linked {
            Ok(handle) => handle,
            Err(e) => {
                let log = diagnostic(e);
                engine_error!("deferred::ShaderProgram",
                    "Failed to link shader program {}: {}", name, log);
                return Err(Error::ShaderLinkFailed { name: name.to_string(), log });
            }
        };

        engine_info!("deferred::ShaderProgram",
            "Linked program '{}' ({} stage(s), capabilities {:?})", name, stages.len(), capabilities);

        Ok(Self {
            name: name.to_string(),
            handle,
            capabilities,
        })
    }

    /// Make this program current
    pub fn use_program(&self, ctx: &mut dyn GraphicsContext) {
        ctx.use_program(Some(self.handle));
    }

    /// Make no program current
    pub fn unuse(&self, ctx: &mut dyn GraphicsContext) {
        ctx.use_program(None);
    }

    /// Whether any stage declares the input behind `capability`
    pub fn has_capability(&self, capability: ShaderCapabilities) -> bool {
        self.capabilities.contains(capability)
    }

    pub fn capabilities(&self) -> ShaderCapabilities {
        self.capabilities
    }

    /// Upload one uniform by name
    ///
    /// Binds the program first, so this leaves it current. Matrices go up
    /// row-major. Unknown names log a warning and change nothing.
    pub fn set_uniform(&self, ctx: &mut dyn GraphicsContext, name: &str, value: impl UniformData) {
        ctx.use_program(Some(self.handle));
        match ctx.uniform_location(self.handle, name) {
            Some(location) => ctx.set_uniform(location, value.to_uniform_value()),
            None => {
                engine_warn!("deferred::ShaderProgram",
                    "Uniform '{}' not found in program '{}'", name, self.name);
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handle(&self) -> ProgramHandle {
        self.handle
    }

    /// Release the program
    pub fn destroy(self, ctx: &mut dyn GraphicsContext) {
        ctx.delete_program(self.handle);
    }
}

fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        let err = Error::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        };
        engine_error!("deferred::ShaderProgram", "{}", err);
        err
    })
}

fn release_stages(ctx: &mut dyn GraphicsContext, stages: &[ShaderHandle]) {
    for shader in stages {
        ctx.delete_shader(*shader);
    }
}

/// Diagnostic text of a context failure
fn diagnostic(error: Error) -> String {
    match error {
        Error::BackendError(log) => log,
        other => other.to_string(),
    }
}

#[cfg(test)]
#[path = "shader_program_tests.rs"]
mod tests;
