//! Cascaded Shadow Maps
//!
//! Directional light shadows split the camera's view range into up to four
//! cascades, each rendered into one tile of a 2x2 depth atlas.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                 CascadedShadowStage                  │
//! ├──────────────────────────────────────────────────────┤
//! │  splits   │ practical split distances                │
//! │  fit      │ texel-snapped light view + projection    │
//! │  atlas    │ tile viewports, texture scale/bias       │
//! │  batch    │ sort keys, lazy cull/program state       │
//! │  shaders  │ static and skeletal caster programs      │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! Depth is reversed: the near plane maps to 1, the far plane to 0, the atlas
//! is cleared to 0 and the depth test is `Greater`.
//!
//! # Usage
//!
//! ```ignore
//! let config = ShadowStageConfig::default().with_fit(CascadeFit::BoundingSphere);
//! let mut stage = CascadedShadowStage::new(config);
//!
//! let light = DirectionalLight::new(ShadowQuality::High.to_settings())
//!     .with_direction(Vec3::new(-0.3, -1.0, -0.2))
//!     .with_shadow_target(ShadowTarget::new(framebuffer, ShadowQuality::High.atlas_resolution()));
//! scene.add_light(light);
//!
//! stage.execute(&mut backend, &camera, &mut scene);
//! ```

pub mod atlas;
pub mod batch;
pub mod config;
pub mod fit;
pub mod shaders;
pub mod splits;
pub mod stage;

pub use atlas::AtlasLayout;
pub use batch::{BatchKey, SubmissionState};
pub use config::{CascadeFit, CascadeSettings, ShadowQuality, ShadowStageConfig, MAX_CASCADES};
pub use fit::{Cascade, CascadeFitter};
pub use shaders::{ShadowShaderManager, ShadowVariantKind};
pub use splits::split_distances;
pub use stage::{CascadedShadowStage, ShadowStageStats};
