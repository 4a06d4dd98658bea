//! Shadow Batching
//!
//! Operations are sorted once per light so that every cascade submits them
//! grouped by pipeline state:
//!
//! 1. unskinned before skinned (program swap)
//! 2. one-sided before two-sided (cull mode toggle)
//! 3. ascending vertex array (vertex binding reuse)
//!
//! [`SubmissionState`] tracks what is currently bound so state commands are
//! issued only when the next operation needs something different.

use umbra_shader::ProgramId;

use crate::operation::RenderOperation;
use crate::pipeline::{CullMode, ShadowPipeline};

/// Sort key for shadow operations
///
/// The derived ordering compares fields in declaration order, which is the
/// state-change priority.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BatchKey {
    pub skinned: bool,
    pub two_sided: bool,
    /// Vertex array identity
    pub vertex_array: u64,
}

impl BatchKey {
    pub fn new(skinned: bool, two_sided: bool, vertex_array: u64) -> Self {
        Self {
            skinned,
            two_sided,
            vertex_array,
        }
    }

    /// Key of a render operation
    pub fn for_operation(operation: &RenderOperation) -> Self {
        Self::new(
            operation.is_skinned(),
            operation.is_two_sided(),
            operation.vertex_source.array,
        )
    }
}

/// Reference to an operation queued for a light
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueuedOperation {
    /// Index into the scene's object list
    pub object: usize,
    /// Index into the object's operations
    pub operation: usize,
    pub key: BatchKey,
}

/// Stable sort by batch key; equal keys keep their queue order
pub fn sort_operations(queue: &mut [QueuedOperation]) {
    queue.sort_by_key(|queued| queued.key);
}

/// Pipeline state bound during submission
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SubmissionState {
    pub active_program: Option<ProgramId>,
    pub two_sided: bool,
}

impl SubmissionState {
    /// State after the stage resets culling to back faces
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle culling if sidedness differs. Returns true if a command was issued.
    pub fn apply_sidedness<P: ShadowPipeline + ?Sized>(&mut self, pipeline: &mut P, two_sided: bool) -> bool {
        if self.two_sided == two_sided {
            return false;
        }

        pipeline.set_cull_mode(if two_sided { CullMode::None } else { CullMode::Back });
        self.two_sided = two_sided;
        true
    }

    /// Record a program bind. Returns true if the program differs from the bound one.
    pub fn switch_program(&mut self, program: ProgramId) -> bool {
        if self.active_program == Some(program) {
            return false;
        }

        self.active_program = Some(program);
        true
    }
}
