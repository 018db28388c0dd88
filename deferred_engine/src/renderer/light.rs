/// Light - point and directional light sources
///
/// The set of kinds is closed, so lights are a plain struct with a tagged
/// `LightKind` instead of a trait object. Every light belongs to one scene
/// object (`owner`); point lights read their position from that object's
/// transform when they are forwarded.
///
/// Forwarding writes one element of the lighting program's uniform arrays:
///
/// ```text
/// pointLights[i].{position, ambient, diffuse, specular, constant, linear, quadratic, radius}
/// dirLights[i].{direction, ambient, diffuse, specular, radius}
/// ```

use glam::{Vec3, Vec4};
use crate::graphics_context::GraphicsContext;
use crate::renderer::ShaderProgram;
use crate::scene::ObjectKey;

/// Influence radius of a light of the given intensity: `10 * sqrt(intensity)`
///
/// Negative intensities are treated as 0.
pub fn radius_for_intensity(intensity: f32) -> f32 {
    10.0 * intensity.max(0.0).sqrt()
}

/// Point light attenuation (`1 / (constant + linear*d + quadratic*d^2)`)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            constant: 1.0,
            linear: 0.0,
            quadratic: 0.0,
        }
    }
}

/// Light shining along a fixed direction from infinitely far away
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub direction: Vec3,
}

/// Kind-specific light data
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    Point(PointLight),
    Directional(DirectionalLight),
}

/// Light kind without its data (registry lists, logs)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightKindTag {
    Point,
    Directional,
}

impl LightKindTag {
    /// Name of the lighting program's uniform array for this kind
    pub fn uniform_array_name(&self) -> &'static str {
        match self {
            LightKindTag::Point => "pointLights",
            LightKindTag::Directional => "dirLights",
        }
    }
}

/// A light component
///
/// The kind is fixed at construction; a registered light is always
/// forwarded into its own kind's array. Kind data stays editable through
/// `as_point_mut` / `as_directional_mut`.
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    owner: ObjectKey,
    pub ambient: Vec4,
    pub diffuse: Vec4,
    pub specular: Vec4,
    intensity: f32,
    radius_override: Option<f32>,
    kind: LightKind,
}

impl Light {
    /// Point light with no distance attenuation (constant 1, linear 0, quadratic 0)
    pub fn point(owner: ObjectKey, diffuse: Vec4, ambient: Vec4, specular: Vec4, intensity: f32) -> Self {
        Self::point_with_attenuation(owner, diffuse, ambient, specular, intensity, PointLight::default())
    }

    pub fn point_with_attenuation(
        owner: ObjectKey,
        diffuse: Vec4,
        ambient: Vec4,
        specular: Vec4,
        intensity: f32,
        attenuation: PointLight,
    ) -> Self {
        Self {
            owner,
            ambient,
            diffuse,
            specular,
            intensity: intensity.max(0.0),
            radius_override: None,
            kind: LightKind::Point(attenuation),
        }
    }

    pub fn directional(
        owner: ObjectKey,
        direction: Vec3,
        diffuse: Vec4,
        ambient: Vec4,
        specular: Vec4,
        intensity: f32,
    ) -> Self {
        Self {
            owner,
            ambient,
            diffuse,
            specular,
            intensity: intensity.max(0.0),
            radius_override: None,
            kind: LightKind::Directional(DirectionalLight { direction }),
        }
    }

    // ===== INTENSITY / RADIUS =====

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    /// Change the intensity (clamped to >= 0); the radius follows
    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity = intensity.max(0.0);
    }

    /// Influence radius: the override if set, otherwise derived from intensity
    pub fn radius(&self) -> f32 {
        self.radius_override
            .unwrap_or_else(|| radius_for_intensity(self.intensity))
    }

    /// Pin the radius regardless of intensity
    pub fn set_radius_override(&mut self, radius: f32) {
        self.radius_override = Some(radius.max(0.0));
    }

    pub fn clear_radius_override(&mut self) {
        self.radius_override = None;
    }

    pub fn radius_override(&self) -> Option<f32> {
        self.radius_override
    }

    // ===== KIND =====

    /// Object this light is attached to
    pub fn owner(&self) -> ObjectKey {
        self.owner
    }

    pub fn kind_tag(&self) -> LightKindTag {
        match self.kind {
            LightKind::Point(_) => LightKindTag::Point,
            LightKind::Directional(_) => LightKindTag::Directional,
        }
    }

    /// "pointLights" or "dirLights"
    pub fn uniform_array_name(&self) -> &'static str {
        self.kind_tag().uniform_array_name()
    }

    pub fn as_point(&self) -> Option<&PointLight> {
        match &self.kind {
            LightKind::Point(point) => Some(point),
            LightKind::Directional(_) => None,
        }
    }

    pub fn as_directional(&self) -> Option<&DirectionalLight> {
        match &self.kind {
            LightKind::Directional(directional) => Some(directional),
            LightKind::Point(_) => None,
        }
    }

    /// Kind-specific data
    pub fn kind(&self) -> &LightKind {
        &self.kind
    }

    /// Attenuation of a point light
    pub fn as_point_mut(&mut self) -> Option<&mut PointLight> {
        match &mut self.kind {
            LightKind::Point(point) => Some(point),
            LightKind::Directional(_) => None,
        }
    }

    /// Direction of a directional light
    pub fn as_directional_mut(&mut self) -> Option<&mut DirectionalLight> {
        match &mut self.kind {
            LightKind::Directional(directional) => Some(directional),
            LightKind::Point(_) => None,
        }
    }

    // ===== FORWARDING =====

    /// Write this light into element `index` of its uniform array
    ///
    /// `owner_position` is the owner's current world position (ignored for
    /// directional lights). The index is not checked against the program's
    /// array capacity; the caller bounds it.
    pub fn forward_to_shader(
        &self,
        ctx: &mut dyn GraphicsContext,
        program: &ShaderProgram,
        index: usize,
        owner_position: Vec3,
    ) {
        let base = format!("{}[{}].", self.uniform_array_name(), index);
        let field = |name: &str| format!("{}{}", base, name);

        match &self.kind {
            LightKind::Point(point) => {
                program.set_uniform(ctx, &field("position"), owner_position);
                program.set_uniform(ctx, &field("ambient"), self.ambient);
                program.set_uniform(ctx, &field("diffuse"), self.diffuse);
                program.set_uniform(ctx, &field("specular"), self.specular);
                program.set_uniform(ctx, &field("constant"), point.constant);
                program.set_uniform(ctx, &field("linear"), point.linear);
                program.set_uniform(ctx, &field("quadratic"), point.quadratic);
                program.set_uniform(ctx, &field("radius"), self.radius());
            }
            LightKind::Directional(directional) => {
                program.set_uniform(ctx, &field("direction"), directional.direction);
                program.set_uniform(ctx, &field("ambient"), self.ambient);
                program.set_uniform(ctx, &field("diffuse"), self.diffuse);
                program.set_uniform(ctx, &field("specular"), self.specular);
                program.set_uniform(ctx, &field("radius"), self.radius());
            }
        }
    }
}

#[cfg(test)]
#[path = "light_tests.rs"]
mod tests;
