//! Shader compilation using naga
//!
//! Supports:
//! - WGSL parsing
//! - Module validation
//! - SPIR-V and WGSL output

use naga::back::spv;
use naga::front::wgsl;
use naga::valid::{Capabilities, ModuleInfo, ValidationFlags, Validator};
use serde::{Deserialize, Serialize};

use crate::ShaderError;

/// Compilation target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompileTarget {
    /// SPIR-V bytecode
    SpirV,
    /// WGSL (WebGPU)
    Wgsl,
}

/// Compiled shader output
#[derive(Debug, Clone)]
pub enum CompiledShader {
    /// SPIR-V bytecode
    SpirV(Vec<u32>),
    /// WGSL source
    Wgsl(String),
}

impl CompiledShader {
    /// Get as SPIR-V words
    pub fn as_spirv(&self) -> Option<&[u32]> {
        match self {
            Self::SpirV(words) => Some(words),
            _ => None,
        }
    }

    /// Get as WGSL source
    pub fn as_wgsl(&self) -> Option<&str> {
        match self {
            Self::Wgsl(source) => Some(source),
            _ => None,
        }
    }

    /// Get size in bytes
    pub fn size_bytes(&self) -> usize {
        match self {
            Self::SpirV(words) => words.len() * 4,
            Self::Wgsl(source) => source.len(),
        }
    }
}

/// Shader compiler
pub struct ShaderCompiler {
    capabilities: Capabilities,
    flags: ValidationFlags,
}

impl ShaderCompiler {
    /// Create a new compiler with full validation
    pub fn new() -> Self {
        Self {
            capabilities: Capabilities::all(),
            flags: ValidationFlags::all(),
        }
    }

    fn spirv_options(&self) -> spv::Options {
        spv::Options {
            lang_version: (1, 0),
            flags: spv::WriterFlags::empty(),
            binding_map: Default::default(),
            capabilities: None,
            bounds_check_policies: Default::default(),
            zero_initialize_workgroup_memory: spv::ZeroInitializeWorkgroupMemoryMode::None,
            debug_info: None,
        }
    }

    /// Parse WGSL source into a naga module
    pub fn parse_wgsl(&self, source: &str) -> Result<naga::Module, ShaderError> {
        wgsl::parse_str(source).map_err(|e| ShaderError::ParseError(format!("{:?}", e)))
    }

    /// Validate a parsed module
    pub fn validate(&self, module: &naga::Module) -> Result<ModuleInfo, ShaderError> {
        Validator::new(self.flags, self.capabilities)
            .validate(module)
            .map_err(|e| ShaderError::ValidationError(format!("{:?}", e)))
    }

    /// Validate and compile a module to the specified target
    pub fn compile(&self, module: &naga::Module, target: CompileTarget) -> Result<CompiledShader, ShaderError> {
        let info = self.validate(module)?;
        self.compile_validated(module, &info, target)
    }

    /// Compile a module that already passed validation
    pub fn compile_validated(
        &self,
        module: &naga::Module,
        info: &ModuleInfo,
        target: CompileTarget,
    ) -> Result<CompiledShader, ShaderError> {
        match target {
            CompileTarget::SpirV => {
                let words = spv::write_vec(module, info, &self.spirv_options(), None)
                    .map_err(|e| ShaderError::CompileError(format!("SPIR-V compilation failed: {:?}", e)))?;
                Ok(CompiledShader::SpirV(words))
            }
            CompileTarget::Wgsl => {
                let source = naga::back::wgsl::write_string(module, info, naga::back::wgsl::WriterFlags::empty())
                    .map_err(|e| ShaderError::CompileError(format!("WGSL compilation failed: {:?}", e)))?;
                Ok(CompiledShader::Wgsl(source))
            }
        }
    }
}

impl Default for ShaderCompiler {
    fn default() -> Self {
        Self::new()
    }
}
