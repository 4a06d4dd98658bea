//! Shadow caster programs
//!
//! Two depth-only variants: static meshes and skinned meshes. The skeletal
//! variant bakes the palette length into its uniform array, so changing the
//! maximum bone count rebuilds it. A failed build leaves the variant without
//! a program; operations needing it are skipped until a later rebuild works.

use std::fmt;

use umbra_shader::{
    CompileTarget, ShaderCompiler, ShaderDefines, ShaderError, ShaderProgram, ShaderTemplate, UniformHandle,
};

/// Built-in static caster template
pub const STATIC_TEMPLATE: &str = include_str!("../../shaders/shadow_static.wgsl");

/// Built-in skinned caster template
pub const SKELETAL_TEMPLATE: &str = include_str!("../../shaders/shadow_skeletal.wgsl");

/// Uniform holding the per-draw model-view-projection
pub const MODEL_VIEW_PROJECTION: &str = "model_view_projection";

/// Uniform holding the skinning palette
pub const SKINNING_MATRICES: &str = "skinning_matrices";

/// Define naming the palette length
pub const MAX_BONE_COUNT: &str = "MAX_BONE_COUNT";

/// Vertex attribute locations shared with mesh vertex layouts
pub mod attribute {
    pub const POSITION: u32 = 0;
    pub const NORMAL: u32 = 1;
    pub const TANGENT: u32 = 2;
    pub const TEXCOORD: u32 = 3;
    pub const BONE_INDEX: u32 = 4;
    pub const BONE_WEIGHT: u32 = 5;
}

/// Defines for every vertex attribute location
pub fn vertex_attribute_defines() -> ShaderDefines {
    ShaderDefines::new()
        .with("VERTEX_POSITION", attribute::POSITION)
        .with("VERTEX_NORMAL", attribute::NORMAL)
        .with("VERTEX_TANGENT", attribute::TANGENT)
        .with("VERTEX_TEXCOORD", attribute::TEXCOORD)
        .with("VERTEX_BONE_INDEX", attribute::BONE_INDEX)
        .with("VERTEX_BONE_WEIGHT", attribute::BONE_WEIGHT)
}

/// Which caster program an operation needs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShadowVariantKind {
    Static,
    Skeletal,
}

impl fmt::Display for ShadowVariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static => f.write_str("static"),
            Self::Skeletal => f.write_str("skeletal"),
        }
    }
}

/// Resolved uniform handles of a built variant
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VariantUniforms {
    pub model_view_projection: UniformHandle,
    /// Present for the skeletal variant only
    pub skinning_matrices: Option<UniformHandle>,
}

/// One caster program and its build state
#[derive(Debug)]
pub struct ShadowVariant {
    kind: ShadowVariantKind,
    template: ShaderTemplate,
    program: Option<ShaderProgram>,
    uniforms: Option<VariantUniforms>,
    build_count: u32,
}

impl ShadowVariant {
    fn new(kind: ShadowVariantKind, template: ShaderTemplate) -> Self {
        Self {
            kind,
            template,
            program: None,
            uniforms: None,
            build_count: 0,
        }
    }

    pub fn kind(&self) -> ShadowVariantKind {
        self.kind
    }

    pub fn template(&self) -> &ShaderTemplate {
        &self.template
    }

    pub fn program(&self) -> Option<&ShaderProgram> {
        self.program.as_ref()
    }

    pub fn uniforms(&self) -> Option<VariantUniforms> {
        self.uniforms
    }

    /// Number of build attempts, successful or not
    pub fn build_count(&self) -> u32 {
        self.build_count
    }

    /// Program and uniforms, if the last build succeeded
    pub fn bound(&self) -> Option<(&ShaderProgram, VariantUniforms)> {
        Some((self.program.as_ref()?, self.uniforms?))
    }

    pub fn is_ready(&self) -> bool {
        self.program.is_some() && self.uniforms.is_some()
    }

    fn rebuild(&mut self, compiler: &ShaderCompiler, defines: &ShaderDefines) -> bool {
        self.build_count += 1;

        match self.try_build(compiler, defines) {
            Ok((program, uniforms)) => {
                log::debug!("Built {} shadow program {:?}", self.kind, program.id());
                self.program = Some(program);
                self.uniforms = Some(uniforms);
                true
            }
            Err(e) => {
                log::error!(
                    "Failed to build {} shadow program '{}': {}",
                    self.kind,
                    self.template.name(),
                    e
                );
                self.program = None;
                self.uniforms = None;
                false
            }
        }
    }

    fn try_build(
        &self,
        compiler: &ShaderCompiler,
        defines: &ShaderDefines,
    ) -> Result<(ShaderProgram, VariantUniforms), ShaderError> {
        let program = ShaderProgram::build(compiler, &self.template, defines, &[CompileTarget::SpirV])?;

        let model_view_projection = program.require_uniform(MODEL_VIEW_PROJECTION)?;
        let skinning_matrices = match self.kind {
            ShadowVariantKind::Static => None,
            ShadowVariantKind::Skeletal => Some(program.require_uniform(SKINNING_MATRICES)?),
        };

        Ok((
            program,
            VariantUniforms {
                model_view_projection,
                skinning_matrices,
            },
        ))
    }
}

/// Owns the static and skeletal caster programs
pub struct ShadowShaderManager {
    compiler: ShaderCompiler,
    defines: ShaderDefines,
    static_variant: ShadowVariant,
    skeletal_variant: ShadowVariant,
    max_bone_count: u32,
}

impl ShadowShaderManager {
    /// Build both variants. Failures are logged and leave that variant unusable.
    pub fn new(static_template: ShaderTemplate, skeletal_template: ShaderTemplate, max_bone_count: u32) -> Self {
        let compiler = ShaderCompiler::new();
        let defines = vertex_attribute_defines().with(MAX_BONE_COUNT, max_bone_count);

        let mut static_variant = ShadowVariant::new(ShadowVariantKind::Static, static_template);
        let mut skeletal_variant = ShadowVariant::new(ShadowVariantKind::Skeletal, skeletal_template);
        static_variant.rebuild(&compiler, &defines);
        skeletal_variant.rebuild(&compiler, &defines);

        Self {
            compiler,
            defines,
            static_variant,
            skeletal_variant,
            max_bone_count,
        }
    }

    /// Build the templates shipped with the crate
    pub fn with_builtin_templates(max_bone_count: u32) -> Self {
        Self::new(
            ShaderTemplate::new("shadow_static", STATIC_TEMPLATE),
            ShaderTemplate::new("shadow_skeletal", SKELETAL_TEMPLATE),
            max_bone_count,
        )
    }

    pub fn max_bone_count(&self) -> u32 {
        self.max_bone_count
    }

    /// Change the palette length, rebuilding only the skeletal variant.
    ///
    /// Returns true if a rebuild happened. Must not be called while a
    /// submission is in flight.
    pub fn set_max_bone_count(&mut self, max_bone_count: u32) -> bool {
        if max_bone_count == self.max_bone_count {
            return false;
        }

        log::debug!(
            "Max bone count {} -> {}, rebuilding skeletal shadow program",
            self.max_bone_count,
            max_bone_count
        );

        self.max_bone_count = max_bone_count;
        self.defines = vertex_attribute_defines().with(MAX_BONE_COUNT, max_bone_count);
        self.skeletal_variant.rebuild(&self.compiler, &self.defines);
        true
    }

    pub fn variant(&self, kind: ShadowVariantKind) -> &ShadowVariant {
        match kind {
            ShadowVariantKind::Static => &self.static_variant,
            ShadowVariantKind::Skeletal => &self.skeletal_variant,
        }
    }

    /// Variant drawing an operation with or without a skinning palette
    #[inline]
    pub fn variant_for(&self, skinned: bool) -> &ShadowVariant {
        if skinned {
            &self.skeletal_variant
        } else {
            &self.static_variant
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_variants_build() {
        let manager = ShadowShaderManager::with_builtin_templates(64);

        let static_variant = manager.variant(ShadowVariantKind::Static);
        assert!(static_variant.is_ready());
        assert!(static_variant.uniforms().unwrap().skinning_matrices.is_none());

        let skeletal = manager.variant(ShadowVariantKind::Skeletal);
        assert!(skeletal.is_ready());
        let uniforms = skeletal.uniforms().unwrap();
        assert_ne!(uniforms.model_view_projection, uniforms.skinning_matrices.unwrap());

        let palette = skeletal.program().unwrap().reflection().binding_by_name(SKINNING_MATRICES).unwrap();
        assert_eq!(palette.size, Some(64 * 64));
    }

    #[test]
    fn test_bone_count_rebuilds_only_skeletal() {
        let mut manager = ShadowShaderManager::with_builtin_templates(32);
        let static_id = manager.variant(ShadowVariantKind::Static).program().unwrap().id();
        let skeletal_id = manager.variant(ShadowVariantKind::Skeletal).program().unwrap().id();

        assert!(!manager.set_max_bone_count(32));
        assert_eq!(manager.variant(ShadowVariantKind::Skeletal).build_count(), 1);

        assert!(manager.set_max_bone_count(48));
        assert_eq!(manager.max_bone_count(), 48);
        assert_eq!(manager.variant(ShadowVariantKind::Static).program().unwrap().id(), static_id);
        assert_eq!(manager.variant(ShadowVariantKind::Static).build_count(), 1);

        let skeletal = manager.variant(ShadowVariantKind::Skeletal);
        assert_ne!(skeletal.program().unwrap().id(), skeletal_id);
        assert_eq!(skeletal.build_count(), 2);
    }

    #[test]
    fn test_failed_build_invalidates_and_recovers() {
        let mut manager = ShadowShaderManager::with_builtin_templates(16);

        assert!(manager.set_max_bone_count(0));
        let skeletal = manager.variant(ShadowVariantKind::Skeletal);
        assert!(!skeletal.is_ready());
        assert!(skeletal.bound().is_none());
        assert!(skeletal.uniforms().is_none());
        assert!(manager.variant(ShadowVariantKind::Static).is_ready());

        assert!(manager.set_max_bone_count(16));
        assert!(manager.variant(ShadowVariantKind::Skeletal).is_ready());
    }

    #[test]
    fn test_missing_uniform_fails_variant() {
        let template = ShaderTemplate::new(
            "no_palette",
            r#"
            @group(0) @binding(0)
            var<uniform> model_view_projection: mat4x4<f32>;

            @vertex
            fn vs_main(@location({{VERTEX_POSITION}}) position: vec3<f32>) -> @builtin(position) vec4<f32> {
                return model_view_projection * vec4<f32>(position, 1.0);
            }
            "#,
        );
        let manager = ShadowShaderManager::new(
            ShaderTemplate::new("shadow_static", STATIC_TEMPLATE),
            template,
            8,
        );

        assert!(manager.variant(ShadowVariantKind::Static).is_ready());
        assert!(!manager.variant_for(true).is_ready());
    }
}
