/// Scene - scene objects, their light components, and the light registry.
///
/// Objects and lights are stored in SlotMaps with stable keys. Each light
/// is owned by the scene on behalf of its object (listed in the object's
/// components); the registry only references it.
///
/// Registration is explicit. `attach_light` stores and registers in one
/// call; `register_light` / `unregister_light` allow two-phase use, e.g.
/// keeping a light attached but excluded from lighting.

use glam::Vec3;
use slotmap::SlotMap;
use crate::error::{Error, Result};
use crate::graphics_context::GraphicsContext;
use crate::renderer::{Light, LightKindTag, ShaderProgram, ShaderCapabilities};
use crate::engine_warn;
use super::light_registry::{LightRegistry, LightLimits};
use super::scene_object::{SceneObject, ObjectKey, LightKey};

/// Light counts from one `apply_lights` call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LightForwardStats {
    pub point_lights_forwarded: usize,
    pub directional_lights_forwarded: usize,
    /// Registered lights past the program's capacity (not forwarded)
    pub lights_dropped: usize,
}

/// A scene: objects, light storage and light registry
#[derive(Debug, Default)]
pub struct Scene {
    objects: SlotMap<ObjectKey, SceneObject>,
    lights: SlotMap<LightKey, Light>,
    registry: LightRegistry,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    // ===== OBJECTS =====

    /// Add an object; returns its stable key
    ///
    /// The object starts with no lights: light keys carried by a clone of
    /// another object belong to that object and are dropped here.
    pub fn add_object(&mut self, mut object: SceneObject) -> ObjectKey {
        object.clear_lights();
        self.objects.insert(object)
    }

    /// Remove an object, detaching (and dropping) its lights first
    pub fn remove_object(&mut self, key: ObjectKey) -> Option<SceneObject> {
        let light_keys = self.objects.get(key)?.lights().to_vec();
        for light_key in light_keys {
            self.detach_light(light_key);
        }
        self.objects.remove(key)
    }

    pub fn object(&self, key: ObjectKey) -> Option<&SceneObject> {
        self.objects.get(key)
    }

    pub fn object_mut(&mut self, key: ObjectKey) -> Option<&mut SceneObject> {
        self.objects.get_mut(key)
    }

    /// Iterate over all objects
    pub fn objects(&self) -> impl Iterator<Item = (ObjectKey, &SceneObject)> + '_ {
        self.objects.iter()
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    // ===== LIGHTS =====

    /// Store `light` under its owner and register it
    ///
    /// # Errors
    ///
    /// `InvalidResource` if the owner isn't in this scene.
    pub fn attach_light(&mut self, light: Light) -> Result<LightKey> {
        let owner = light.owner();
        if !self.objects.contains_key(owner) {
            return Err(Error::InvalidResource(format!(
                "cannot attach a {:?} light to an object that is not in the scene",
                light.kind_tag()
            )));
        }

        let kind = light.kind_tag();
        let key = self.lights.insert(light);
        if let Some(object) = self.objects.get_mut(owner) {
            object.push_light(key);
        }
        self.registry.register(key, kind);
        Ok(key)
    }

    /// Unregister and drop a light, removing it from its owner
    pub fn detach_light(&mut self, key: LightKey) -> Option<Light> {
        self.unregister_light(key);
        let light = self.lights.remove(key)?;
        if let Some(object) = self.objects.get_mut(light.owner()) {
            object.remove_light(key);
        }
        Some(light)
    }

    /// Add a stored light to the registry (no-op if already registered)
    ///
    /// # Errors
    ///
    /// `InvalidResource` if the key doesn't name a light of this scene.
    pub fn register_light(&mut self, key: LightKey) -> Result<()> {
        let kind = self
            .lights
            .get(key)
            .map(|light| light.kind_tag())
            .ok_or_else(|| Error::InvalidResource("unknown light key".to_string()))?;
        self.registry.register(key, kind);
        Ok(())
    }

    /// Remove a light from the registry; it stays attached to its owner
    ///
    /// Returns false if it wasn't registered.
    pub fn unregister_light(&mut self, key: LightKey) -> bool {
        self.registry.unregister(key)
    }

    pub fn light(&self, key: LightKey) -> Option<&Light> {
        self.lights.get(key)
    }

    pub fn light_mut(&mut self, key: LightKey) -> Option<&mut Light> {
        self.lights.get_mut(key)
    }

    /// Registered point lights, in forwarding order
    pub fn point_lights(&self) -> &[LightKey] {
        self.registry.point_lights()
    }

    /// Registered directional lights, in forwarding order
    pub fn directional_lights(&self) -> &[LightKey] {
        self.registry.directional_lights()
    }

    /// Number of stored lights (registered or not)
    pub fn light_count(&self) -> usize {
        self.lights.len()
    }

    pub fn registry(&self) -> &LightRegistry {
        &self.registry
    }

    // ===== LIGHTING =====

    /// Forward every registered light into `program`
    ///
    /// Each kind is forwarded with indices `0..n`, in registration order.
    /// Point light positions are read from their owners now. Lights past
    /// `limits` are dropped with one warning for the call. The forwarded
    /// counts are uploaded as `pointLightCount` / `dirLightCount` when the
    /// program declares them.
    pub fn apply_lights(
        &self,
        ctx: &mut dyn GraphicsContext,
        program: &ShaderProgram,
        limits: LightLimits,
    ) -> LightForwardStats {
        let (point, point_dropped) = self.forward_kind(ctx, program, LightKindTag::Point, limits);
        let (directional, directional_dropped) =
            self.forward_kind(ctx, program, LightKindTag::Directional, limits);

        let dropped = point_dropped + directional_dropped;
        if dropped > 0 {
            engine_warn!("deferred::Scene",
                "{} light(s) not forwarded to program '{}': point {}/{}, directional {}/{}",
                dropped, program.name(),
                self.point_lights().len(), limits.max_point_lights,
                self.directional_lights().len(), limits.max_directional_lights);
        }

        if program.has_capability(ShaderCapabilities::POINT_LIGHT_COUNT) {
            program.set_uniform(ctx, "pointLightCount", point as i32);
        }
        if program.has_capability(ShaderCapabilities::DIR_LIGHT_COUNT) {
            program.set_uniform(ctx, "dirLightCount", directional as i32);
        }

        LightForwardStats {
            point_lights_forwarded: point,
            directional_lights_forwarded: directional,
            lights_dropped: dropped,
        }
    }

    /// Forward the registered lights of one kind; returns (forwarded, dropped)
    ///
    /// Indices are dense over the lights actually written. A key whose light
    /// is gone, or no longer of this kind, takes no index.
    fn forward_kind(
        &self,
        ctx: &mut dyn GraphicsContext,
        program: &ShaderProgram,
        kind: LightKindTag,
        limits: LightLimits,
    ) -> (usize, usize) {
        let capacity = limits.capacity(kind);
        let mut forwarded = 0;
        let mut dropped = 0;

        let lights = self
            .registry
            .lights(kind)
            .iter()
            .filter_map(|key| self.lights.get(*key))
            .filter(|light| light.kind_tag() == kind);
        for light in lights {
            if forwarded < capacity {
                light.forward_to_shader(ctx, program, forwarded, self.owner_position(light));
                forwarded += 1;
            } else {
                dropped += 1;
            }
        }
        (forwarded, dropped)
    }

    fn owner_position(&self, light: &Light) -> Vec3 {
        self.objects
            .get(light.owner())
            .map(|object| object.transform.position)
            .unwrap_or(Vec3::ZERO)
    }
}

#[cfg(test)]
#[path = "scene_tests.rs"]
mod tests;
