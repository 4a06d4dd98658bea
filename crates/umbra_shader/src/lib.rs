//! # Umbra Shader
//!
//! Shader program building for Umbra render stages:
//! - WGSL templates with `{{NAME}}` define substitution
//! - WGSL parsing and validation via naga
//! - SPIR-V and WGSL compilation
//! - Reflection of named uniform bindings
//!
//! ## Architecture
//!
//! ```text
//! ShaderTemplate + ShaderDefines ──► WGSL ──► naga::Module ──► Validator ──► Compiler ──► GPU Bytecode
//!                                                  │
//!                                                  ▼
//!                                            Reflector ──► UniformHandle lookup
//! ```

pub mod compiler;
pub mod program;
pub mod reflect;
pub mod template;

pub use compiler::{CompileTarget, CompiledShader, ShaderCompiler};
pub use program::{ProgramId, ShaderProgram};
pub use reflect::{BindingInfo, BindingType, ShaderReflection, UniformHandle};
pub use template::{ShaderDefine, ShaderDefines, ShaderTemplate};

use thiserror::Error;

/// Errors from the shader pipeline
#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("Failed to read shader file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Undefined template placeholder: {0}")]
    UndefinedPlaceholder(String),

    #[error("Unterminated template placeholder at byte {0}")]
    UnterminatedPlaceholder(usize),

    #[error("WGSL parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Compilation error: {0}")]
    CompileError(String),

    #[error("Uniform not found: {0}")]
    MissingUniform(String),
}
