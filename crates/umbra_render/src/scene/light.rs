//! Lights
//!
//! Lights form a closed set of variants. Only directional lights carry
//! cascade state; point and spot lights are shadowed by other stages.

use glam::{Mat4, Quat, Vec3};

use super::ALL_LAYERS;
use crate::pipeline::FramebufferId;
use crate::shadow::atlas::AtlasLayout;
use crate::shadow::config::CascadeSettings;

/// Depth target a light renders its shadow atlas into
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ShadowTarget {
    pub framebuffer: FramebufferId,
    /// Atlas width and height in texels
    pub resolution: u32,
}

impl ShadowTarget {
    pub fn new(framebuffer: FramebufferId, resolution: u32) -> Self {
        Self { framebuffer, resolution }
    }
}

/// Directional light with cascaded shadow output
#[derive(Clone, Debug)]
pub struct DirectionalLight {
    /// Orientation; the light shines along `rotation * -Z`
    pub rotation: Quat,
    pub layer_mask: u32,
    pub shadow_caster: bool,
    pub shadow_target: Option<ShadowTarget>,
    settings: CascadeSettings,
    cascade_distances: Vec<f32>,
    cascade_matrices: Vec<Mat4>,
    cascade_scale_bias: Vec<Mat4>,
    cascade_revision: u64,
}

impl DirectionalLight {
    /// Create a shadow-casting light; the cascade count is fixed from here on
    pub fn new(mut settings: CascadeSettings) -> Self {
        settings.validate();
        let count = settings.cascade_count as usize;

        Self {
            rotation: Quat::IDENTITY,
            layer_mask: ALL_LAYERS,
            shadow_caster: true,
            shadow_target: None,
            settings,
            cascade_distances: vec![0.0; count],
            cascade_matrices: vec![Mat4::IDENTITY; count],
            cascade_scale_bias: (0..count).map(AtlasLayout::scale_bias).collect(),
            cascade_revision: 0,
        }
    }

    /// Orient the light to shine along `direction`
    pub fn with_direction(mut self, direction: Vec3) -> Self {
        self.rotation = Quat::from_rotation_arc(Vec3::NEG_Z, direction.normalize());
        self
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_shadow_target(mut self, target: ShadowTarget) -> Self {
        self.shadow_target = Some(target);
        self
    }

    pub fn with_layer_mask(mut self, layer_mask: u32) -> Self {
        self.layer_mask = layer_mask;
        self
    }

    pub fn with_shadow_caster(mut self, shadow_caster: bool) -> Self {
        self.shadow_caster = shadow_caster;
        self
    }

    /// World-space direction the light travels
    #[inline]
    pub fn direction(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// Up vector of the light's view basis
    #[inline]
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    pub fn settings(&self) -> &CascadeSettings {
        &self.settings
    }

    #[inline]
    pub fn cascade_count(&self) -> usize {
        self.settings.cascade_count as usize
    }

    #[inline]
    pub fn max_distance(&self) -> f32 {
        self.settings.max_distance
    }

    pub fn set_max_distance(&mut self, max_distance: f32) {
        self.settings.max_distance = max_distance;
    }

    #[inline]
    pub fn distribution(&self) -> f32 {
        self.settings.distribution
    }

    /// Set the linear/logarithmic split blend. Values outside [0, 1] are kept
    /// as given and extrapolate the split scheme.
    pub fn set_distribution(&mut self, distribution: f32) {
        self.settings.distribution = distribution;
        self.settings.warn_distribution();
    }

    #[inline]
    pub fn bias(&self) -> f32 {
        self.settings.bias
    }

    pub fn set_bias(&mut self, bias: f32) {
        self.settings.bias = bias;
    }

    /// Far distance of each cascade, ascending
    pub fn cascade_distances(&self) -> &[f32] {
        &self.cascade_distances
    }

    /// View space -> atlas texture coordinates and depth, per cascade
    pub fn cascade_matrices(&self) -> &[Mat4] {
        &self.cascade_matrices
    }

    /// NDC -> atlas tile transform, per cascade
    pub fn cascade_scale_bias(&self) -> &[Mat4] {
        &self.cascade_scale_bias
    }

    /// Incremented every time the cascades are rewritten
    pub fn cascade_revision(&self) -> u64 {
        self.cascade_revision
    }

    pub(crate) fn store_cascades(&mut self, distances: &[f32], matrices: &[Mat4]) {
        debug_assert_eq!(distances.len(), self.cascade_count());
        debug_assert_eq!(matrices.len(), self.cascade_count());

        self.cascade_distances.clear();
        self.cascade_distances.extend_from_slice(distances);
        self.cascade_matrices.clear();
        self.cascade_matrices.extend_from_slice(matrices);
        self.cascade_revision += 1;
    }
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self::new(CascadeSettings::default())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub range: f32,
    pub layer_mask: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SpotLight {
    pub position: Vec3,
    pub rotation: Quat,
    pub range: f32,
    /// Outer cone half-angle in radians
    pub outer_angle: f32,
    pub layer_mask: u32,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            range: 10.0,
            layer_mask: ALL_LAYERS,
        }
    }
}

impl Default for SpotLight {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            range: 10.0,
            outer_angle: std::f32::consts::FRAC_PI_4,
            layer_mask: ALL_LAYERS,
        }
    }
}

/// Any light in the scene collection
#[derive(Clone, Debug)]
pub enum Light {
    Directional(DirectionalLight),
    Point(PointLight),
    Spot(SpotLight),
}

impl Light {
    pub fn layer_mask(&self) -> u32 {
        match self {
            Self::Directional(light) => light.layer_mask,
            Self::Point(light) => light.layer_mask,
            Self::Spot(light) => light.layer_mask,
        }
    }

    pub fn as_directional(&self) -> Option<&DirectionalLight> {
        match self {
            Self::Directional(light) => Some(light),
            Self::Point(_) | Self::Spot(_) => None,
        }
    }

    pub fn as_directional_mut(&mut self) -> Option<&mut DirectionalLight> {
        match self {
            Self::Directional(light) => Some(light),
            Self::Point(_) | Self::Spot(_) => None,
        }
    }
}

impl From<DirectionalLight> for Light {
    fn from(light: DirectionalLight) -> Self {
        Self::Directional(light)
    }
}

impl From<PointLight> for Light {
    fn from(light: PointLight) -> Self {
        Self::Point(light)
    }
}

impl From<SpotLight> for Light {
    fn from(light: SpotLight) -> Self {
        Self::Spot(light)
    }
}
