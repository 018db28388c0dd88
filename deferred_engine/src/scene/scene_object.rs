/// SceneObject - a named, transformed node that owns light components.

use glam::{Mat4, Quat, Vec3};
use slotmap::new_key_type;

// ===== SLOT MAP KEYS =====

new_key_type! {
    /// Stable key for a SceneObject within a Scene.
    ///
    /// Keys remain valid even after other objects are removed.
    pub struct ObjectKey;

    /// Stable key for a Light stored in a Scene.
    ///
    /// The light registry holds these as non-owning references.
    pub struct LightKey;
}

// ===== TRANSFORM =====

/// Translation, rotation and scale of an object
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Identity rotation and unit scale at `position`
    pub fn from_position(position: Vec3) -> Self {
        Self { position, ..Self::default() }
    }

    /// Model matrix (scale, then rotate, then translate)
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

// ===== MESH REFERENCE =====

/// Caller-side mesh identifier
///
/// Meshes live outside the engine. The geometry pass hands this id back to
/// the caller's draw callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshId(pub u32);

// ===== SCENE OBJECT =====

/// An object in the scene graph
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub name: String,
    pub transform: Transform,
    /// Mesh drawn by the geometry pass (`None` = not drawn)
    pub mesh: Option<MeshId>,
    /// Skipped by the geometry pass when true
    pub hidden: bool,
    lights: Vec<LightKey>,
}

impl SceneObject {
    /// Object with no mesh (a light holder, a pivot, ...)
    pub fn new(name: &str, transform: Transform) -> Self {
        Self {
            name: name.to_string(),
            transform,
            mesh: None,
            hidden: false,
            lights: Vec::new(),
        }
    }

    /// Object drawn with `mesh`
    pub fn with_mesh(name: &str, transform: Transform, mesh: MeshId) -> Self {
        Self {
            mesh: Some(mesh),
            ..Self::new(name, transform)
        }
    }

    /// Whether the geometry pass draws this object
    pub fn is_drawable(&self) -> bool {
        !self.hidden && self.mesh.is_some()
    }

    /// Lights attached to this object, in attach order
    pub fn lights(&self) -> &[LightKey] {
        &self.lights
    }

    pub(crate) fn push_light(&mut self, key: LightKey) {
        self.lights.push(key);
    }

    pub(crate) fn remove_light(&mut self, key: LightKey) {
        self.lights.retain(|k| *k != key);
    }

    pub(crate) fn clear_lights(&mut self) {
        self.lights.clear();
    }
}
