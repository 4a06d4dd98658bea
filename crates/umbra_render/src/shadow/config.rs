//! Shadow Configuration
//!
//! Stage-wide and per-light cascade settings with serde support for
//! hot-reload.

use serde::{Deserialize, Serialize};

/// Maximum supported cascade count (2x2 atlas tiling)
pub const MAX_CASCADES: usize = 4;

/// How a cascade's light-space volume is fitted to its subfrustum
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CascadeFit {
    /// Light-space AABB of the subfrustum corners, widened to whole texels
    #[default]
    FrustumBounds,
    /// Minimal bounding sphere of the subfrustum; rotation invariant
    BoundingSphere,
}

/// Stage-wide shadow configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShadowStageConfig {
    /// Enable the stage
    pub enabled: bool,

    /// Skinning palette length compiled into the skeletal program
    pub max_bone_count: u32,

    /// Cascade volume fitting strategy
    pub fit: CascadeFit,

    /// Clamp depth so casters between the light and the volume still rasterize
    pub depth_clamp: bool,
}

impl Default for ShadowStageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_bone_count: 64,
            fit: CascadeFit::FrustumBounds,
            depth_clamp: true,
        }
    }
}

impl ShadowStageConfig {
    /// Create a configuration with shadows disabled
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    pub fn with_fit(mut self, fit: CascadeFit) -> Self {
        self.fit = fit;
        self
    }

    pub fn with_max_bone_count(mut self, max_bone_count: u32) -> Self {
        self.max_bone_count = max_bone_count;
        self
    }

    /// Validate configuration and clamp values to valid ranges
    pub fn validate(&mut self) {
        self.max_bone_count = self.max_bone_count.clamp(1, 256);
    }
}

/// Per-light cascade settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CascadeSettings {
    /// Distance from the camera covered by the last cascade
    pub max_distance: f32,

    /// Cascade count (1-4), fixed once the light is created
    pub cascade_count: u32,

    /// Split blend (0 = linear, 1 = logarithmic); not clamped
    pub distribution: f32,

    /// Depth bias applied by the lighting pass
    pub bias: f32,
}

impl Default for CascadeSettings {
    fn default() -> Self {
        Self {
            max_distance: 100.0,
            cascade_count: 4,
            distribution: 0.8,
            bias: 0.001,
        }
    }
}

impl CascadeSettings {
    /// Create high-quality settings
    pub fn high_quality() -> Self {
        Self {
            max_distance: 150.0,
            distribution: 0.85,
            ..Default::default()
        }
    }

    /// Create low-quality settings for performance
    pub fn low_quality() -> Self {
        Self {
            max_distance: 50.0,
            cascade_count: 2,
            distribution: 0.5,
            bias: 0.002,
        }
    }

    pub fn with_max_distance(mut self, max_distance: f32) -> Self {
        self.max_distance = max_distance;
        self
    }

    pub fn with_cascade_count(mut self, cascade_count: u32) -> Self {
        self.cascade_count = cascade_count;
        self
    }

    pub fn with_distribution(mut self, distribution: f32) -> Self {
        self.distribution = distribution;
        self
    }

    /// Clamp cascade count and distance. The distribution is left as given.
    pub fn validate(&mut self) {
        self.cascade_count = self.cascade_count.clamp(1, MAX_CASCADES as u32);
        self.max_distance = self.max_distance.max(0.0);
        self.bias = self.bias.max(0.0);
        self.warn_distribution();
    }

    pub(crate) fn warn_distribution(&self) {
        if !(0.0..=1.0).contains(&self.distribution) {
            log::warn!(
                "Cascade distribution {} is outside [0, 1]; splits will extrapolate",
                self.distribution
            );
        }
    }
}

/// Shadow quality preset
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShadowQuality {
    Low,
    Medium,
    High,
}

impl ShadowQuality {
    /// Convert to cascade settings
    pub fn to_settings(self) -> CascadeSettings {
        match self {
            Self::Low => CascadeSettings::low_quality(),
            Self::Medium => CascadeSettings::default(),
            Self::High => CascadeSettings::high_quality(),
        }
    }

    /// Suggested atlas resolution
    pub fn atlas_resolution(self) -> u32 {
        match self {
            Self::Low => 1024,
            Self::Medium => 2048,
            Self::High => 4096,
        }
    }
}
