/// Camera - low-level passive data container.
///
/// The Camera stores what the caller computed: world position, view
/// matrix, projection matrix and screen size. `look_at_perspective` is a
/// convenience for the common case.

use glam::{Mat4, Vec2, Vec3};
use crate::graphics_context::GraphicsContext;
use crate::renderer::{ShaderProgram, ShaderCapabilities};

/// Low-level camera. A passive data container.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    position: Vec3,
    view_matrix: Mat4,
    projection_matrix: Mat4,
    screen_size: Vec2,
}

impl Camera {
    /// Create a camera from precomputed matrices
    pub fn new(position: Vec3, view: Mat4, projection: Mat4, screen_size: Vec2) -> Self {
        Self {
            position,
            view_matrix: view,
            projection_matrix: projection,
            screen_size,
        }
    }

    /// Right-handed perspective camera at `position` looking at `target` (+Y up)
    ///
    /// # Arguments
    ///
    /// * `fov_y` - Vertical field of view in radians
    /// * `screen_size` - Viewport size in pixels (sets the aspect ratio)
    /// * `near` / `far` - Clip distances
    pub fn look_at_perspective(
        fov_y: f32,
        screen_size: Vec2,
        near: f32,
        far: f32,
        position: Vec3,
        target: Vec3,
    ) -> Self {
        let aspect = if screen_size.y > 0.0 { screen_size.x / screen_size.y } else { 1.0 };
        Self {
            position,
            view_matrix: Mat4::look_at_rh(position, target, Vec3::Y),
            projection_matrix: Mat4::perspective_rh_gl(fov_y, aspect, near, far),
            screen_size,
        }
    }

    // ===== GETTERS =====

    /// World-space position (uploaded as `viewPos`)
    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn view_matrix(&self) -> &Mat4 {
        &self.view_matrix
    }

    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection_matrix
    }

    /// Combined projection * view
    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix * self.view_matrix
    }

    pub fn screen_size(&self) -> Vec2 {
        self.screen_size
    }

    // ===== SETTERS =====

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn set_view(&mut self, matrix: Mat4) {
        self.view_matrix = matrix;
    }

    pub fn set_projection(&mut self, matrix: Mat4) {
        self.projection_matrix = matrix;
    }

    pub fn set_screen_size(&mut self, screen_size: Vec2) {
        self.screen_size = screen_size;
    }

    // ===== SHADER =====

    /// Upload `viewPos` if the program declares it
    pub fn send_to_shader(&self, ctx: &mut dyn GraphicsContext, program: &ShaderProgram) {
        if program.has_capability(ShaderCapabilities::VIEW_POS) {
            program.set_uniform(ctx, "viewPos", self.position);
        }
    }
}

#[cfg(test)]
#[path = "camera_tests.rs"]
mod tests;
