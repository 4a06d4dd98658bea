//! Shader programs
//!
//! A program is a template configured with a define set, parsed, validated,
//! reflected and compiled for every requested target. Building either yields a
//! complete program or a [`ShaderError`] whose message is the build log.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::compiler::{CompileTarget, CompiledShader, ShaderCompiler};
use crate::reflect::{reflect_module, ShaderReflection, UniformHandle};
use crate::template::{ShaderDefines, ShaderTemplate};
use crate::ShaderError;

static NEXT_PROGRAM_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a built program
///
/// Every successful build receives a fresh id, so a rebuilt variant never
/// compares equal to the program it replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProgramId(u64);

impl ProgramId {
    fn next() -> Self {
        Self(NEXT_PROGRAM_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get raw ID value
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// A built shader program
#[derive(Debug)]
pub struct ShaderProgram {
    id: ProgramId,
    name: String,
    source: String,
    defines: ShaderDefines,
    module: naga::Module,
    reflection: ShaderReflection,
    compiled: HashMap<CompileTarget, CompiledShader>,
}

impl ShaderProgram {
    /// Configure, validate and compile a template
    pub fn build(
        compiler: &ShaderCompiler,
        template: &ShaderTemplate,
        defines: &ShaderDefines,
        targets: &[CompileTarget],
    ) -> Result<Self, ShaderError> {
        let source = template.configure(defines)?;
        let module = compiler.parse_wgsl(&source)?;
        let info = compiler.validate(&module)?;
        let reflection = reflect_module(&module);

        let mut compiled = HashMap::new();
        for &target in targets {
            compiled.insert(target, compiler.compile_validated(&module, &info, target)?);
        }

        let program = Self {
            id: ProgramId::next(),
            name: template.name().to_string(),
            source,
            defines: defines.clone(),
            module,
            reflection,
            compiled,
        };

        log::debug!("Built shader program '{}' -> {:?}", program.name, program.id);
        Ok(program)
    }

    pub fn id(&self) -> ProgramId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Configured WGSL source
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Defines the program was built with
    pub fn defines(&self) -> &ShaderDefines {
        &self.defines
    }

    pub fn module(&self) -> &naga::Module {
        &self.module
    }

    pub fn reflection(&self) -> &ShaderReflection {
        &self.reflection
    }

    /// Get compiled output for a target
    pub fn compiled(&self, target: CompileTarget) -> Option<&CompiledShader> {
        self.compiled.get(&target)
    }

    /// Look up a uniform by variable name
    pub fn uniform(&self, name: &str) -> Option<UniformHandle> {
        self.reflection.uniform(name)
    }

    /// Look up a uniform that the program must declare
    pub fn require_uniform(&self, name: &str) -> Result<UniformHandle, ShaderError> {
        self.uniform(name)
            .ok_or_else(|| ShaderError::MissingUniform(format!("{} in '{}'", name, self.name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = r#"
        @group(0) @binding(0)
        var<uniform> model_view_projection: mat4x4<f32>;

        @vertex
        fn vs_main(@location({{VERTEX_POSITION}}) position: vec3<f32>) -> @builtin(position) vec4<f32> {
            return model_view_projection * vec4<f32>(position, 1.0);
        }
    "#;

    fn defines() -> ShaderDefines {
        ShaderDefines::new().with("VERTEX_POSITION", 2)
    }

    #[test]
    fn test_build_program() {
        let compiler = ShaderCompiler::new();
        let template = ShaderTemplate::new("depth", TEMPLATE);
        let program = ShaderProgram::build(&compiler, &template, &defines(), &[CompileTarget::SpirV]).unwrap();

        assert_eq!(program.name(), "depth");
        assert!(program.source().contains("@location(2)"));
        assert!(program.compiled(CompileTarget::SpirV).is_some());
        assert!(program.compiled(CompileTarget::Wgsl).is_none());
        assert!(program.reflection().uses_location(2));
        assert_eq!(
            program.uniform("model_view_projection"),
            Some(UniformHandle { group: 0, binding: 0 })
        );
    }

    #[test]
    fn test_rebuild_gets_new_id() {
        let compiler = ShaderCompiler::new();
        let template = ShaderTemplate::new("depth", TEMPLATE);
        let first = ShaderProgram::build(&compiler, &template, &defines(), &[]).unwrap();
        let second = ShaderProgram::build(&compiler, &template, &defines(), &[]).unwrap();

        assert_ne!(first.id(), second.id());
        assert!(second.id().raw() > first.id().raw());
    }

    #[test]
    fn test_require_missing_uniform() {
        let compiler = ShaderCompiler::new();
        let template = ShaderTemplate::new("depth", TEMPLATE);
        let program = ShaderProgram::build(&compiler, &template, &defines(), &[]).unwrap();

        assert!(program.require_uniform("model_view_projection").is_ok());
        assert!(matches!(
            program.require_uniform("skinning_matrices"),
            Err(ShaderError::MissingUniform(_))
        ));
    }

    #[test]
    fn test_build_fails_on_missing_define() {
        let compiler = ShaderCompiler::new();
        let template = ShaderTemplate::new("depth", TEMPLATE);
        let result = ShaderProgram::build(&compiler, &template, &ShaderDefines::new(), &[]);

        assert!(matches!(result, Err(ShaderError::UndefinedPlaceholder(_))));
    }
}
