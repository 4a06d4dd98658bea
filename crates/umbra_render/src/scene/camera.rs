//! Camera
//!
//! Right-handed, looking down -Z in view space. Projections use reversed
//! depth: the near plane maps to 1 and the far plane to 0.

use glam::{Mat4, Quat, Vec3};

use super::ALL_LAYERS;

#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub translation: Vec3,
    pub rotation: Quat,
    /// Vertical field of view in radians
    pub vertical_fov: f32,
    /// Width over height
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
    pub layer_mask: u32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            vertical_fov: 60f32.to_radians(),
            aspect_ratio: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
            layer_mask: ALL_LAYERS,
        }
    }
}

impl Camera {
    /// Place the camera at `eye` looking at `target`
    pub fn looking_at(eye: Vec3, target: Vec3, up: Vec3) -> Self {
        let view = Mat4::look_at_rh(eye, target, up);
        let (_, rotation, _) = view.inverse().to_scale_rotation_translation();
        Self {
            translation: eye,
            rotation: rotation.normalize(),
            ..Default::default()
        }
    }

    /// World-space viewing direction
    #[inline]
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// Camera-to-world transform
    #[inline]
    pub fn inverse_view(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.translation)
    }

    /// World-to-camera transform
    #[inline]
    pub fn view(&self) -> Mat4 {
        let inverse_rotation = self.rotation.conjugate();
        Mat4::from_rotation_translation(inverse_rotation, inverse_rotation * -self.translation)
    }

    /// Reversed-depth perspective projection over `[near, far]`
    #[inline]
    pub fn reversed_projection(&self, near: f32, far: f32) -> Mat4 {
        Mat4::perspective_rh(self.vertical_fov, self.aspect_ratio, far, near)
    }

    /// Reversed-depth projection over the camera's own clip range
    pub fn projection(&self) -> Mat4 {
        self.reversed_projection(self.near, self.far)
    }
}
