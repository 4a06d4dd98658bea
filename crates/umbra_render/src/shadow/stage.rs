//! Cascaded Shadow Stage
//!
//! Per frame, for every eligible directional light:
//!
//! ```text
//! splits ──► queue + sort ──► for each cascade (near to far):
//!                                 fit ──► cull ──► viewport ──► submit
//!        ──► write distances/matrices back to the light
//! ```
//!
//! Lights are skipped, never failed: non-casters, lights on other layers,
//! lights without a shadow target and degenerate ranges produce no work.

use std::collections::HashSet;

use glam::Mat4;
use serde::{Deserialize, Serialize};

use super::atlas::AtlasLayout;
use super::batch::{sort_operations, BatchKey, QueuedOperation, SubmissionState};
use super::config::ShadowStageConfig;
use super::fit::{Cascade, CascadeFitter};
use super::shaders::ShadowShaderManager;
use super::splits::split_distances;
use crate::culling::ShadowCuller;
use crate::pipeline::{CullMode, DepthState, ShadowPipeline, UniformValue};
use crate::scene::{Camera, DirectionalLight, Light, SceneCollection, SceneObject};

/// Counters for one `execute` call
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShadowStageStats {
    /// Directional lights whose cascades were rendered
    pub lights_rendered: u32,
    /// Directional lights skipped as ineligible
    pub lights_skipped: u32,
    pub cascades_fitted: u32,
    /// Cascades with at least one visible operation
    pub cascades_submitted: u32,
    /// Operations queued across all lights
    pub operations_queued: u32,
    /// Queued operations rejected by cascade frusta
    pub operations_culled: u32,
    /// Visible operations skipped because their program is unusable
    pub operations_skipped: u32,
    pub draws: u32,
    pub cull_mode_changes: u32,
    pub program_binds: u32,
}

/// Renders directional light shadow cascades into per-light atlases
pub struct CascadedShadowStage {
    config: ShadowStageConfig,
    fitter: CascadeFitter,
    shaders: ShadowShaderManager,
    /// Operations of the current light, sorted by batch key
    queue: Vec<QueuedOperation>,
    /// Queue slots visible to the current cascade
    visible: Vec<usize>,
    matrices: Vec<Mat4>,
    warned_palette_sizes: HashSet<usize>,
    stats: ShadowStageStats,
}

impl CascadedShadowStage {
    /// Create a stage using the built-in caster templates
    pub fn new(mut config: ShadowStageConfig) -> Self {
        config.validate();
        let shaders = ShadowShaderManager::with_builtin_templates(config.max_bone_count);
        Self::with_shaders(config, shaders)
    }

    /// Create a stage with an existing program manager
    pub fn with_shaders(config: ShadowStageConfig, shaders: ShadowShaderManager) -> Self {
        Self {
            fitter: CascadeFitter::new(config.fit),
            config,
            shaders,
            queue: Vec::new(),
            visible: Vec::new(),
            matrices: Vec::new(),
            warned_palette_sizes: HashSet::new(),
            stats: ShadowStageStats::default(),
        }
    }

    pub fn config(&self) -> &ShadowStageConfig {
        &self.config
    }

    pub fn shaders(&self) -> &ShadowShaderManager {
        &self.shaders
    }

    /// Statistics of the last `execute` call
    pub fn stats(&self) -> &ShadowStageStats {
        &self.stats
    }

    /// Change the skinning palette length; rebuilds the skeletal program
    pub fn set_max_bone_count(&mut self, max_bone_count: u32) -> bool {
        self.config.max_bone_count = max_bone_count;
        self.shaders.set_max_bone_count(max_bone_count)
    }

    /// Render every eligible directional light's cascades
    pub fn execute<P: ShadowPipeline + ?Sized>(
        &mut self,
        pipeline: &mut P,
        camera: &Camera,
        scene: &mut SceneCollection,
    ) -> ShadowStageStats {
        let mut stats = ShadowStageStats::default();

        if self.config.enabled {
            let SceneCollection { objects, lights } = scene;
            let objects: &[SceneObject] = objects;

            for light in lights.iter_mut() {
                let Light::Directional(light) = light else {
                    continue;
                };

                if self.is_eligible(camera, light) {
                    self.render_light(pipeline, camera, objects, light, &mut stats);
                } else {
                    stats.lights_skipped += 1;
                }
            }
        }

        self.stats = stats.clone();
        stats
    }

    fn is_eligible(&self, camera: &Camera, light: &DirectionalLight) -> bool {
        if !light.shadow_caster {
            log::trace!("Skipping directional light: not a shadow caster");
            return false;
        }
        if light.layer_mask & camera.layer_mask == 0 {
            log::trace!("Skipping directional light: no layer shared with camera");
            return false;
        }
        if light.shadow_target.is_none() {
            log::trace!("Skipping directional light: no shadow target");
            return false;
        }
        if camera.near <= 0.0 || light.max_distance() <= camera.near {
            log::trace!(
                "Skipping directional light: degenerate range {}..{}",
                camera.near,
                light.max_distance()
            );
            return false;
        }
        true
    }

    fn render_light<P: ShadowPipeline + ?Sized>(
        &mut self,
        pipeline: &mut P,
        camera: &Camera,
        objects: &[SceneObject],
        light: &mut DirectionalLight,
        stats: &mut ShadowStageStats,
    ) {
        let Some(target) = light.shadow_target else {
            return;
        };
        let atlas = AtlasLayout::new(target.resolution);
        let distances = split_distances(camera.near, light.max_distance(), light.cascade_count(), light.distribution());

        pipeline.set_blend_enabled(false);
        pipeline.set_depth_state(DepthState::REVERSED);
        if self.config.depth_clamp {
            pipeline.set_depth_clamp_enabled(true);
        }
        pipeline.set_cull_mode(CullMode::Back);
        pipeline.bind_framebuffer(target.framebuffer);
        pipeline.clear_depth(0.0);

        self.build_queue(objects, &ShadowCuller::new(camera.layer_mask, light.layer_mask));
        stats.operations_queued += self.queue.len() as u32;

        let mut state = SubmissionState::new();
        let mut near = camera.near;
        self.matrices.clear();

        for (index, &far) in distances.iter().enumerate() {
            let cascade = self.fitter.fit(camera, light, index, near, far, &atlas);
            stats.cascades_fitted += 1;
            self.matrices.push(cascade.atlas_matrix(camera));
            near = far;

            self.cull(objects, &cascade);
            stats.operations_culled += (self.queue.len() - self.visible.len()) as u32;

            if self.visible.is_empty() {
                continue;
            }

            pipeline.set_viewport(cascade.viewport);
            self.submit(pipeline, objects, &cascade, &mut state, stats);
            stats.cascades_submitted += 1;
        }

        light.store_cascades(&distances, &self.matrices);
        stats.lights_rendered += 1;

        log::debug!(
            "Rendered {} shadow cascades for {} queued operations",
            distances.len(),
            self.queue.len()
        );

        self.queue.clear();
        self.visible.clear();

        if self.config.depth_clamp {
            pipeline.set_depth_clamp_enabled(false);
        }
    }

    /// Collect and sort shadow-casting operations of candidate objects
    fn build_queue(&mut self, objects: &[SceneObject], culler: &ShadowCuller) {
        self.queue.clear();

        for (object_index, object) in objects.iter().enumerate() {
            if !culler.is_candidate(object) {
                continue;
            }

            for (operation_index, operation) in object.operations().iter().enumerate() {
                if !operation.casts_shadows() {
                    continue;
                }

                self.queue.push(QueuedOperation {
                    object: object_index,
                    operation: operation_index,
                    key: BatchKey::for_operation(operation),
                });
            }
        }

        sort_operations(&mut self.queue);
    }

    /// Select queue slots whose object intersects the cascade, keeping order
    fn cull(&mut self, objects: &[SceneObject], cascade: &Cascade) {
        let frustum = cascade.frustum();

        self.visible.clear();
        self.visible.extend(
            self.queue
                .iter()
                .enumerate()
                .filter(|(_, queued)| frustum.intersects(&objects[queued.object].bounds))
                .map(|(slot, _)| slot),
        );
    }

    fn submit<P: ShadowPipeline + ?Sized>(
        &mut self,
        pipeline: &mut P,
        objects: &[SceneObject],
        cascade: &Cascade,
        state: &mut SubmissionState,
        stats: &mut ShadowStageStats,
    ) {
        let max_bones = self.shaders.max_bone_count() as usize;

        for &slot in &self.visible {
            let queued = self.queue[slot];
            let operation = &objects[queued.object].operations()[queued.operation];

            let Some((program, uniforms)) = self.shaders.variant_for(queued.key.skinned).bound() else {
                stats.operations_skipped += 1;
                continue;
            };

            if state.apply_sidedness(pipeline, queued.key.two_sided) {
                stats.cull_mode_changes += 1;
            }
            if state.switch_program(program.id()) {
                pipeline.bind_shader_program(program);
                stats.program_binds += 1;
            }

            let model_view_projection = cascade.model_view_projection(&operation.transform);
            pipeline.update_uniform(uniforms.model_view_projection, UniformValue::Mat4(&model_view_projection));

            if let Some(handle) = uniforms.skinning_matrices {
                let palette = clamp_palette(&operation.skinning_matrices, max_bones, &mut self.warned_palette_sizes);
                pipeline.update_uniform(handle, UniformValue::Mat4Array(palette));
            }

            pipeline.set_primitive_topology(operation.topology);
            pipeline.bind_vertex_source(&operation.vertex_source);
            pipeline.draw(operation.first_vertex, operation.vertex_count);
            stats.draws += 1;
        }
    }
}

/// Truncate a palette to the compiled bone limit, warning once per length
fn clamp_palette<'a>(palette: &'a [Mat4], max_bones: usize, warned: &mut HashSet<usize>) -> &'a [Mat4] {
    if palette.len() <= max_bones {
        return palette;
    }

    if warned.insert(palette.len()) {
        log::warn!(
            "Skinning palette of {} bones exceeds shadow limit of {}; extra bones ignored",
            palette.len(),
            max_bones
        );
    }
    &palette[..max_bones]
}
