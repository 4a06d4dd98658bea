//! Shader reflection
//!
//! Extracts resource bindings from a validated module so callers can resolve
//! uniforms by name instead of hard-coding group/binding pairs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Resolved location of a uniform in the bind layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UniformHandle {
    /// Binding group
    pub group: u32,
    /// Binding index within group
    pub binding: u32,
}

/// Information about a binding
#[derive(Debug, Clone, PartialEq)]
pub struct BindingInfo {
    /// Location of the binding
    pub handle: UniformHandle,
    /// Binding type
    pub binding_type: BindingType,
    /// Variable name (if available)
    pub name: Option<String>,
    /// Size in bytes for sized uniform types
    pub size: Option<u32>,
}

/// Type of binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingType {
    /// Uniform buffer
    UniformBuffer,
    /// Storage buffer
    StorageBuffer { read_only: bool },
    /// Sampler
    Sampler,
    /// Texture of any kind
    Texture,
}

/// Vertex input attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexInput {
    /// Location index
    pub location: u32,
    /// Attribute name
    pub name: Option<String>,
}

/// Full shader reflection information
#[derive(Debug, Clone, Default)]
pub struct ShaderReflection {
    /// Bindings ordered by (group, binding)
    pub bindings: BTreeMap<UniformHandle, BindingInfo>,
    /// Vertex inputs of every vertex entry point
    pub vertex_inputs: Vec<VertexInput>,
    /// Entry point names
    pub entry_points: Vec<String>,
}

impl ShaderReflection {
    /// Find a binding by its variable name
    pub fn binding_by_name(&self, name: &str) -> Option<&BindingInfo> {
        self.bindings
            .values()
            .find(|info| info.name.as_deref() == Some(name))
    }

    /// Resolve a uniform handle by variable name
    pub fn uniform(&self, name: &str) -> Option<UniformHandle> {
        self.binding_by_name(name)
            .filter(|info| info.binding_type == BindingType::UniformBuffer)
            .map(|info| info.handle)
    }

    /// Check whether a vertex attribute location is consumed
    pub fn uses_location(&self, location: u32) -> bool {
        self.vertex_inputs.iter().any(|input| input.location == location)
    }
}

/// Reflect a naga module to extract binding information
pub fn reflect_module(module: &naga::Module) -> ShaderReflection {
    let mut reflection = ShaderReflection::default();

    for (_, gv) in module.global_variables.iter() {
        let Some(binding) = &gv.binding else {
            continue;
        };

        let ty = &module.types[gv.ty];
        let handle = UniformHandle {
            group: binding.group,
            binding: binding.binding,
        };

        let binding_type = match gv.space {
            naga::AddressSpace::Uniform => BindingType::UniformBuffer,
            naga::AddressSpace::Storage { access } => BindingType::StorageBuffer {
                read_only: !access.contains(naga::StorageAccess::STORE),
            },
            _ => match ty.inner {
                naga::TypeInner::Sampler { .. } => BindingType::Sampler,
                _ => BindingType::Texture,
            },
        };

        let size = match binding_type {
            BindingType::UniformBuffer => Some(ty.inner.size(module.to_ctx())),
            _ => None,
        };

        reflection.bindings.insert(
            handle,
            BindingInfo {
                handle,
                binding_type,
                name: gv.name.clone(),
                size,
            },
        );
    }

    for ep in &module.entry_points {
        reflection.entry_points.push(ep.name.clone());

        if ep.stage != naga::ShaderStage::Vertex {
            continue;
        }

        for arg in &ep.function.arguments {
            match &arg.binding {
                Some(naga::Binding::Location { location, .. }) => {
                    reflection.vertex_inputs.push(VertexInput {
                        location: *location,
                        name: arg.name.clone(),
                    });
                }
                None => {
                    // Struct arguments carry bindings on their members
                    if let naga::TypeInner::Struct { members, .. } = &module.types[arg.ty].inner {
                        for member in members {
                            if let Some(naga::Binding::Location { location, .. }) = &member.binding {
                                reflection.vertex_inputs.push(VertexInput {
                                    location: *location,
                                    name: member.name.clone(),
                                });
                            }
                        }
                    }
                }
                _ => {}
            }
        }
    }

    reflection.vertex_inputs.sort_by_key(|input| input.location);
    reflection
}

#[cfg(test)]
mod tests {
    use super::*;
    use naga::front::wgsl;

    const SHADER_WITH_BINDINGS: &str = r#"
        @group(0) @binding(0)
        var<uniform> model_view_projection: mat4x4<f32>;

        @group(0) @binding(1)
        var<uniform> skinning_matrices: array<mat4x4<f32>, 4>;

        @group(1) @binding(0)
        var shadow_sampler: sampler;

        struct VertexInput {
            @location(3) bone_index: vec4<u32>,
            @location(0) position: vec3<f32>,
        }

        @vertex
        fn vs_main(in: VertexInput) -> @builtin(position) vec4<f32> {
            let skin = skinning_matrices[in.bone_index.x];
            return model_view_projection * skin * vec4<f32>(in.position, 1.0);
        }
    "#;

    #[test]
    fn test_reflect_uniforms_by_name() {
        let module = wgsl::parse_str(SHADER_WITH_BINDINGS).unwrap();
        let reflection = reflect_module(&module);

        assert_eq!(
            reflection.uniform("model_view_projection"),
            Some(UniformHandle { group: 0, binding: 0 })
        );
        assert_eq!(
            reflection.uniform("skinning_matrices"),
            Some(UniformHandle { group: 0, binding: 1 })
        );
        assert_eq!(reflection.uniform("missing"), None);
    }

    #[test]
    fn test_sampler_is_not_a_uniform() {
        let module = wgsl::parse_str(SHADER_WITH_BINDINGS).unwrap();
        let reflection = reflect_module(&module);

        let sampler = reflection.binding_by_name("shadow_sampler").unwrap();
        assert_eq!(sampler.binding_type, BindingType::Sampler);
        assert_eq!(reflection.uniform("shadow_sampler"), None);
    }

    #[test]
    fn test_uniform_sizes() {
        let module = wgsl::parse_str(SHADER_WITH_BINDINGS).unwrap();
        let reflection = reflect_module(&module);

        assert_eq!(reflection.binding_by_name("model_view_projection").unwrap().size, Some(64));
        assert_eq!(reflection.binding_by_name("skinning_matrices").unwrap().size, Some(256));
    }

    #[test]
    fn test_reflect_struct_vertex_inputs() {
        let module = wgsl::parse_str(SHADER_WITH_BINDINGS).unwrap();
        let reflection = reflect_module(&module);

        assert_eq!(reflection.vertex_inputs.len(), 2);
        assert_eq!(reflection.vertex_inputs[0].location, 0);
        assert_eq!(reflection.vertex_inputs[1].location, 3);
        assert!(reflection.uses_location(3));
        assert_eq!(reflection.entry_points, vec!["vs_main".to_string()]);
    }
}
