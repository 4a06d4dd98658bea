//! # umbra_render - Cascaded Shadow Maps
//!
//! Backend-agnostic shadow rendering for directional lights:
//! - Practical split scheme for cascade distances
//! - Texel-stable light-space fitting with reversed depth
//! - Light-frustum culling of scene objects
//! - State-sorted submission through an abstract pipeline
//!
//! ## Architecture
//!
//! ```text
//! SceneCollection ──► CascadedShadowStage ──► ShadowPipeline (backend)
//!                          │
//!                          ├─ split_distances     (per light)
//!                          ├─ CascadeFitter       (per cascade)
//!                          ├─ ShadowFrustum       (per cascade)
//!                          └─ ShadowShaderManager (static / skeletal programs)
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use umbra_render::prelude::*;
//!
//! let mut stage = CascadedShadowStage::new(ShadowStageConfig::default());
//!
//! // Per frame
//! let stats = stage.execute(&mut backend, &camera, &mut scene);
//! log::debug!("{} shadow draws", stats.draws);
//!
//! // Lighting pass
//! for light in scene.directional_lights() {
//!     upload(light.cascade_distances(), light.cascade_matrices());
//! }
//! ```

pub mod bounds;
pub mod culling;
pub mod operation;
pub mod pipeline;
pub mod scene;
pub mod shadow;

pub use umbra_shader;

/// Prelude for common imports
pub mod prelude {
    pub use crate::bounds::Aabb;
    pub use crate::culling::{Plane, ShadowFrustum};
    pub use crate::operation::{PrimitiveTopology, RenderOperation, VertexSource};
    pub use crate::pipeline::{
        CompareFunction, CullMode, DepthState, FramebufferId, ShadowPipeline, UniformValue, Viewport,
    };
    pub use crate::scene::{
        Camera, DirectionalLight, Light, Material, ObjectKind, PointLight, SceneCollection, SceneObject,
        ShadowMode, ShadowTarget, SpotLight,
    };
    pub use crate::shadow::{
        CascadeFit, CascadeSettings, CascadedShadowStage, ShadowQuality, ShadowShaderManager,
        ShadowStageConfig, ShadowStageStats,
    };
}
