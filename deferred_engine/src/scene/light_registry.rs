/// LightRegistry - ordered, non-owning lists of the lights to forward
///
/// One list per light kind, in registration order. The order is the index
/// order used when the lights are forwarded to a lighting program.

use crate::renderer::LightKindTag;
use super::scene_object::LightKey;

/// Fixed capacity of a lighting program's light arrays
///
/// Lights registered past these counts are not forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightLimits {
    /// Size of the program's `pointLights[]` array
    pub max_point_lights: usize,
    /// Size of the program's `dirLights[]` array
    pub max_directional_lights: usize,
}

impl Default for LightLimits {
    fn default() -> Self {
        Self {
            max_point_lights: 32,
            max_directional_lights: 4,
        }
    }
}

impl LightLimits {
    pub fn capacity(&self, kind: LightKindTag) -> usize {
        match kind {
            LightKindTag::Point => self.max_point_lights,
            LightKindTag::Directional => self.max_directional_lights,
        }
    }
}

/// Registered lights, per kind
#[derive(Debug, Default, Clone)]
pub struct LightRegistry {
    point: Vec<LightKey>,
    directional: Vec<LightKey>,
}

impl LightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn list_mut(&mut self, kind: LightKindTag) -> &mut Vec<LightKey> {
        match kind {
            LightKindTag::Point => &mut self.point,
            LightKindTag::Directional => &mut self.directional,
        }
    }

    /// Append `key` to its kind's list
    ///
    /// Returns false (and changes nothing) if it is already registered,
    /// under either kind.
    pub fn register(&mut self, key: LightKey, kind: LightKindTag) -> bool {
        if self.contains(key) {
            return false;
        }
        self.list_mut(kind).push(key);
        true
    }

    /// Remove `key` from whichever list holds it, keeping the order of the others
    ///
    /// Returns false if it wasn't registered.
    pub fn unregister(&mut self, key: LightKey) -> bool {
        for list in [&mut self.point, &mut self.directional] {
            if let Some(index) = list.iter().position(|k| *k == key) {
                list.remove(index);
                return true;
            }
        }
        false
    }

    /// Registered lights of one kind, in registration order
    pub fn lights(&self, kind: LightKindTag) -> &[LightKey] {
        match kind {
            LightKindTag::Point => &self.point,
            LightKindTag::Directional => &self.directional,
        }
    }

    pub fn point_lights(&self) -> &[LightKey] {
        &self.point
    }

    pub fn directional_lights(&self) -> &[LightKey] {
        &self.directional
    }

    pub fn contains(&self, key: LightKey) -> bool {
        self.point.contains(&key) || self.directional.contains(&key)
    }

    pub fn len(&self) -> usize {
        self.point.len() + self.directional.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "light_registry_tests.rs"]
mod tests;
