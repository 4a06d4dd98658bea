//! Material properties relevant to shadow casting

use serde::{Deserialize, Serialize};

/// Whether a surface writes into shadow maps
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShadowMode {
    #[default]
    Casts,
    None,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Material {
    /// Render both faces (disables back-face culling)
    pub two_sided: bool,
    pub shadow_mode: ShadowMode,
}

impl Material {
    pub fn double_sided() -> Self {
        Self {
            two_sided: true,
            ..Default::default()
        }
    }

    pub fn no_shadows() -> Self {
        Self {
            shadow_mode: ShadowMode::None,
            ..Default::default()
        }
    }

    #[inline]
    pub fn casts_shadows(&self) -> bool {
        self.shadow_mode == ShadowMode::Casts
    }
}
