//! Abstract GPU pipeline
//!
//! The narrow set of commands the shadow stage issues. Backends implement
//! [`ShadowPipeline`] on top of their own command encoders; the stage never
//! sees API-specific binding mechanics.

use glam::Mat4;
use serde::{Deserialize, Serialize};
use umbra_shader::{ShaderProgram, UniformHandle};

use crate::operation::{PrimitiveTopology, VertexSource};

/// Backend framebuffer handle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FramebufferId(pub u64);

/// Face culling mode
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CullMode {
    /// No culling
    None,
    /// Cull back faces (default)
    #[default]
    Back,
    /// Cull front faces
    Front,
}

/// Depth comparison function
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareFunction {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

/// Depth test configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthState {
    pub test_enabled: bool,
    pub write_enabled: bool,
    pub compare: CompareFunction,
}

impl DepthState {
    /// Depth test and write with reversed depth (near = 1, far = 0)
    pub const REVERSED: Self = Self {
        test_enabled: true,
        write_enabled: true,
        compare: CompareFunction::Greater,
    };
}

/// Pixel rectangle within the bound framebuffer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }
}

/// Value uploaded to a uniform binding
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue<'a> {
    Mat4(&'a Mat4),
    Mat4Array(&'a [Mat4]),
}

/// Commands consumed by the shadow stage
pub trait ShadowPipeline {
    fn bind_framebuffer(&mut self, framebuffer: FramebufferId);

    /// Clear the bound framebuffer's depth attachment
    fn clear_depth(&mut self, depth: f32);

    fn set_viewport(&mut self, viewport: Viewport);

    fn set_cull_mode(&mut self, mode: CullMode);

    fn set_depth_state(&mut self, state: DepthState);

    /// Clamp fragment depth instead of clipping against near/far
    fn set_depth_clamp_enabled(&mut self, enabled: bool);

    fn set_blend_enabled(&mut self, enabled: bool);

    fn bind_shader_program(&mut self, program: &ShaderProgram);

    fn update_uniform(&mut self, handle: UniformHandle, value: UniformValue<'_>);

    fn set_primitive_topology(&mut self, topology: PrimitiveTopology);

    /// Bind vertex array and buffer of an operation
    fn bind_vertex_source(&mut self, source: &VertexSource);

    fn draw(&mut self, first_vertex: u32, vertex_count: u32);
}
