//! Render Operations
//!
//! Immutable draw descriptors produced by scene traversal each frame. An
//! operation is "skinned" exactly when its skinning palette is non-empty.

use std::sync::Arc;

use glam::Mat4;
use serde::{Deserialize, Serialize};

use crate::scene::Material;

/// Primitive assembly mode
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveTopology {
    PointList,
    LineList,
    LineStrip,
    #[default]
    TriangleList,
    TriangleStrip,
}

/// Where an operation's vertices come from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VertexSource {
    /// Vertex array (layout object) id, also the batching identity
    pub array: u64,
    /// Vertex buffer id
    pub buffer: u64,
    /// Byte offset into the buffer
    pub offset: u64,
    /// Byte stride between vertices
    pub stride: u32,
}

impl VertexSource {
    pub fn new(array: u64, buffer: u64, stride: u32) -> Self {
        Self {
            array,
            buffer,
            offset: 0,
            stride,
        }
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }
}

/// A single draw of a mesh primitive
#[derive(Clone, Debug)]
pub struct RenderOperation {
    /// World transform
    pub transform: Mat4,
    /// Vertex data binding
    pub vertex_source: VertexSource,
    /// Primitive assembly
    pub topology: PrimitiveTopology,
    /// First vertex to draw
    pub first_vertex: u32,
    /// Number of vertices to draw
    pub vertex_count: u32,
    /// Surface material (None = one-sided shadow caster)
    pub material: Option<Arc<Material>>,
    /// Bone transforms (empty for static meshes)
    pub skinning_matrices: Vec<Mat4>,
}

impl RenderOperation {
    /// Create a static triangle-list operation with an identity transform
    pub fn new(vertex_source: VertexSource, vertex_count: u32) -> Self {
        Self {
            transform: Mat4::IDENTITY,
            vertex_source,
            topology: PrimitiveTopology::TriangleList,
            first_vertex: 0,
            vertex_count,
            material: None,
            skinning_matrices: Vec::new(),
        }
    }

    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_topology(mut self, topology: PrimitiveTopology) -> Self {
        self.topology = topology;
        self
    }

    pub fn with_first_vertex(mut self, first_vertex: u32) -> Self {
        self.first_vertex = first_vertex;
        self
    }

    pub fn with_material(mut self, material: Arc<Material>) -> Self {
        self.material = Some(material);
        self
    }

    pub fn with_skinning(mut self, palette: Vec<Mat4>) -> Self {
        self.skinning_matrices = palette;
        self
    }

    #[inline]
    pub fn is_skinned(&self) -> bool {
        !self.skinning_matrices.is_empty()
    }

    #[inline]
    pub fn is_two_sided(&self) -> bool {
        self.material.as_ref().is_some_and(|m| m.two_sided)
    }

    /// Whether this operation contributes to shadow maps
    #[inline]
    pub fn casts_shadows(&self) -> bool {
        self.material.as_ref().map_or(true, |m| m.casts_shadows())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::ShadowMode;

    #[test]
    fn test_skinned_is_palette_driven() {
        let op = RenderOperation::new(VertexSource::new(1, 1, 32), 36);
        assert!(!op.is_skinned());

        let op = op.with_skinning(vec![Mat4::IDENTITY]);
        assert!(op.is_skinned());
    }

    #[test]
    fn test_material_flags() {
        let op = RenderOperation::new(VertexSource::new(1, 1, 32), 36);
        assert!(!op.is_two_sided());
        assert!(op.casts_shadows());

        let material = Arc::new(Material {
            two_sided: true,
            shadow_mode: ShadowMode::None,
        });
        let op = op.with_material(material);
        assert!(op.is_two_sided());
        assert!(!op.casts_shadows());
    }
}
