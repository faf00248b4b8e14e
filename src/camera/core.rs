use glam::{Mat4, Vec3};

use crate::options::CameraOptions;

/// Perspective camera defined by eye position, target, and projection
/// parameters.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Eye (camera) position in world space.
    pub eye: Vec3,
    /// Look-at target position.
    pub target: Vec3,
    /// Up direction vector.
    pub up: Vec3,
    /// Viewport aspect ratio (width / height).
    pub aspect: f32,
    /// Vertical field of view in degrees.
    pub fovy: f32,
    /// Near clipping plane distance.
    pub znear: f32,
    /// Far clipping plane distance.
    pub zfar: f32,
}

impl Camera {
    /// Camera looking at the origin with projection parameters taken from
    /// the options.
    #[must_use]
    pub fn from_options(options: &CameraOptions, aspect: f32) -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, options.distance),
            target: Vec3::ZERO,
            up: Vec3::Y,
            aspect,
            fovy: options.fovy,
            znear: options.znear,
            zfar: options.zfar,
        }
    }

    /// The view matrix.
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    /// The projection matrix.
    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        // perspective_rh already uses [0,1] depth range (wgpu/Vulkan
        // convention)
        Mat4::perspective_rh(
            self.fovy.to_radians(),
            self.aspect,
            self.znear,
            self.zfar,
        )
    }

    /// The combined view-projection matrix.
    #[must_use]
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

/// GPU uniform buffer holding the view-projection matrix and splat
/// parameters.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    /// Combined view-projection matrix.
    pub view_proj: [[f32; 4]; 4],
    /// Camera world-space position.
    pub position: [f32; 3],
    /// Global multiplier applied to splat extents in the shader.
    pub splat_scale: f32,
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraUniform {
    /// Camera uniform with an identity view-projection.
    #[must_use]
    pub fn new() -> Self {
        Self {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            position: [0.0; 3],
            splat_scale: 1.0,
        }
    }

    /// Update uniform fields from the given camera's current state.
    pub fn update_view_proj(&mut self, camera: &Camera, splat_scale: f32) {
        self.view_proj = camera.view_projection_matrix().to_cols_array_2d();
        self.position = camera.eye.to_array();
        self.splat_scale = splat_scale;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_projection_is_projection_times_view() {
        let camera = Camera {
            eye: Vec3::new(0.0, 2.0, 5.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            aspect: 1.5,
            fovy: 45.0,
            znear: 0.1,
            zfar: 100.0,
        };
        let combined = camera.view_projection_matrix();
        let manual = camera.projection_matrix() * camera.view_matrix();
        assert_eq!(combined, manual);
    }

    #[test]
    fn test_uniform_update() {
        let camera = Camera::from_options(&CameraOptions::default(), 1.0);
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(&camera, 2.0);

        assert_eq!(uniform.splat_scale, 2.0);
        assert_eq!(uniform.position, camera.eye.to_array());
        assert_eq!(
            uniform.view_proj,
            camera.view_projection_matrix().to_cols_array_2d()
        );
    }
}
