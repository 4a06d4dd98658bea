//! Shadow Atlas Tiling
//!
//! Every directional light renders its cascades into one square depth
//! target split into a fixed 2x2 grid. Cascade `i` occupies tile
//! `(i % 2, i / 2)`.
//!
//! ```text
//! +-----+-----+
//! |  0  |  1  |
//! +-----+-----+
//! |  2  |  3  |
//! +-----+-----+
//! ```
//!
//! Texture coordinates follow the viewport convention: tile `(0, 0)` covers
//! `[0, 0.5]^2`.

use glam::{Mat4, Vec3};

use crate::pipeline::Viewport;

/// Tiles per atlas row
pub const ATLAS_TILES_PER_ROW: usize = 2;

/// Tile layout for one atlas resolution
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AtlasLayout {
    resolution: u32,
}

impl AtlasLayout {
    pub fn new(resolution: u32) -> Self {
        Self { resolution }
    }

    /// Full atlas width and height
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Width and height of one cascade tile
    #[inline]
    pub fn cascade_resolution(&self) -> u32 {
        self.resolution >> 1
    }

    /// Tile coordinates of a cascade
    #[inline]
    pub fn tile(index: usize) -> (u32, u32) {
        (
            (index % ATLAS_TILES_PER_ROW) as u32,
            (index / ATLAS_TILES_PER_ROW) as u32,
        )
    }

    /// Viewport of a cascade's tile
    pub fn viewport(&self, index: usize) -> Viewport {
        let size = self.cascade_resolution();
        let (x, y) = Self::tile(index);
        Viewport::new(x * size, y * size, size, size)
    }

    /// Map clip-space x/y of a cascade into its atlas tile; depth passes
    /// through unchanged.
    pub fn scale_bias(index: usize) -> Mat4 {
        let (x, y) = Self::tile(index);
        let scale = 1.0 / (2.0 * ATLAS_TILES_PER_ROW as f32);
        let offset = Vec3::new(
            (2.0 * x as f32 + 1.0) * scale,
            (2.0 * y as f32 + 1.0) * scale,
            0.0,
        );

        Mat4::from_translation(offset) * Mat4::from_scale(Vec3::new(scale, scale, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_tiles() {
        let atlas = AtlasLayout::new(4096);
        assert_eq!(atlas.cascade_resolution(), 2048);
        assert_eq!(atlas.viewport(0), Viewport::new(0, 0, 2048, 2048));
        assert_eq!(atlas.viewport(1), Viewport::new(2048, 0, 2048, 2048));
        assert_eq!(atlas.viewport(2), Viewport::new(0, 2048, 2048, 2048));
        assert_eq!(atlas.viewport(3), Viewport::new(2048, 2048, 2048, 2048));
    }

    #[test]
    fn test_scale_bias_maps_clip_to_tile() {
        for index in 0..4 {
            let (x, y) = AtlasLayout::tile(index);
            let sb = AtlasLayout::scale_bias(index);

            let low = sb.transform_point3(Vec3::new(-1.0, -1.0, 0.25));
            let high = sb.transform_point3(Vec3::new(1.0, 1.0, 0.75));

            assert!((low.x - 0.5 * x as f32).abs() < 1e-6);
            assert!((low.y - 0.5 * y as f32).abs() < 1e-6);
            assert!((high.x - (0.5 * x as f32 + 0.5)).abs() < 1e-6);
            assert!((high.y - (0.5 * y as f32 + 0.5)).abs() < 1e-6);
            assert_eq!(low.z, 0.25);
            assert_eq!(high.z, 0.75);
        }
    }
}
