use glam::{Mat4, Vec3};

use crate::coords::Viewport;

/// Perspective camera looking at a fixed target.
///
/// Matrices follow OpenGL conventions: right-handed view space, clip-space
/// depth in `[-1, 1]`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view, in degrees.
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, 5.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y_degrees: 45.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl Camera {
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    /// Projection for `viewport`'s aspect ratio.
    pub fn projection(&self, viewport: Viewport) -> Mat4 {
        Mat4::perspective_rh_gl(
            self.fov_y_degrees.to_radians(),
            viewport.aspect(),
            self.near,
            self.far,
        )
    }
}
