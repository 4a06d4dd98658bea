//! Scene Interfaces
//!
//! The slice of scene state the shadow stage consumes: objects with world
//! bounds, a layer mask and a kind tag, plus a closed set of light variants.

pub mod camera;
pub mod light;
pub mod material;

pub use camera::Camera;
pub use light::{DirectionalLight, Light, PointLight, ShadowTarget, SpotLight};
pub use material::{Material, ShadowMode};

use crate::bounds::Aabb;
use crate::operation::RenderOperation;

/// Layer mask matching every layer
pub const ALL_LAYERS: u32 = u32::MAX;

/// What a scene object is
#[derive(Clone, Debug)]
pub enum ObjectKind {
    /// Renderable geometry
    Mesh(Vec<RenderOperation>),
    Camera,
    Light,
}

/// An object in the scene collection
#[derive(Clone, Debug)]
pub struct SceneObject {
    /// World-space bounds
    pub bounds: Aabb,
    pub layer_mask: u32,
    pub kind: ObjectKind,
}

impl SceneObject {
    /// Create a mesh object on every layer
    pub fn mesh(bounds: Aabb, operations: Vec<RenderOperation>) -> Self {
        Self {
            bounds,
            layer_mask: ALL_LAYERS,
            kind: ObjectKind::Mesh(operations),
        }
    }

    pub fn with_layer_mask(mut self, layer_mask: u32) -> Self {
        self.layer_mask = layer_mask;
        self
    }

    /// Draw operations of a mesh (empty for cameras and lights)
    pub fn operations(&self) -> &[RenderOperation] {
        match &self.kind {
            ObjectKind::Mesh(operations) => operations,
            ObjectKind::Camera | ObjectKind::Light => &[],
        }
    }
}

/// Objects and lights visible to the render stages this frame
#[derive(Clone, Debug, Default)]
pub struct SceneCollection {
    pub objects: Vec<SceneObject>,
    pub lights: Vec<Light>,
}

impl SceneCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_object(&mut self, object: SceneObject) -> usize {
        self.objects.push(object);
        self.objects.len() - 1
    }

    pub fn add_light(&mut self, light: impl Into<Light>) -> usize {
        self.lights.push(light.into());
        self.lights.len() - 1
    }

    /// Iterate directional lights in collection order
    pub fn directional_lights(&self) -> impl Iterator<Item = &DirectionalLight> {
        self.lights.iter().filter_map(Light::as_directional)
    }
}
