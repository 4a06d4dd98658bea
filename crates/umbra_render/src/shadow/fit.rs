//! Cascade Volume Fitting
//!
//! Builds the light-space orthographic volume of one cascade. Both fitting
//! strategies anchor the light view at a texel-snapped origin so the shadow
//! map grid stays fixed in world space while the camera moves.
//!
//! All projections use reversed depth: the face nearest the light maps to
//! depth 1, the furthest to depth 0.

use glam::{Mat4, Quat, Vec3};

use super::atlas::AtlasLayout;
use super::config::CascadeFit;
use crate::bounds::Aabb;
use crate::culling::ShadowFrustum;
use crate::pipeline::Viewport;
use crate::scene::{Camera, DirectionalLight};

/// Reversed-depth NDC cube: z = 1 on the near plane, z = 0 on the far plane
const NDC_CORNERS: [Vec3; 8] = [
    Vec3::new(-1.0, -1.0, 1.0),
    Vec3::new(1.0, -1.0, 1.0),
    Vec3::new(-1.0, 1.0, 1.0),
    Vec3::new(1.0, 1.0, 1.0),
    Vec3::new(-1.0, -1.0, 0.0),
    Vec3::new(1.0, -1.0, 0.0),
    Vec3::new(-1.0, 1.0, 0.0),
    Vec3::new(1.0, 1.0, 0.0),
];

/// A fitted cascade, valid for one frame
#[derive(Clone, Debug)]
pub struct Cascade {
    pub index: usize,
    /// View distance where the cascade starts
    pub near: f32,
    /// View distance where the cascade ends
    pub far: f32,
    pub light_view: Mat4,
    pub light_projection: Mat4,
    pub light_view_projection: Mat4,
    /// Texel-snapped world position the light view is anchored at
    pub light_origin: Vec3,
    /// World to light-space rotation
    pub view_rotation: Quat,
    /// Radius of the subfrustum's bounding sphere
    pub radius: f32,
    /// World-space width of one shadow texel
    pub texel_size: f32,
    /// Atlas tile
    pub viewport: Viewport,
}

impl Cascade {
    /// Model-view-projection for an object transform.
    ///
    /// The light origin is subtracted from the object translation before any
    /// rotation is applied, so large world coordinates never pass through a
    /// combined matrix product.
    pub fn model_view_projection(&self, transform: &Mat4) -> Mat4 {
        let mut model_view = *transform;
        model_view.w_axis -= self.light_origin.extend(0.0);
        self.light_projection * (Mat4::from_quat(self.view_rotation) * model_view)
    }

    /// Camera view space to atlas texture coordinates and depth.
    ///
    /// Built from the light origin relative to the camera, so the lighting
    /// pass can sample without reconstructing world positions.
    pub fn atlas_matrix(&self, camera: &Camera) -> Mat4 {
        let view_origin = camera.rotation.conjugate() * (self.light_origin - camera.translation);
        let view_to_light = self.view_rotation * camera.rotation;
        let light_view = Mat4::from_quat(view_to_light) * Mat4::from_translation(-view_origin);

        AtlasLayout::scale_bias(self.index) * self.light_projection * light_view
    }

    /// Culling planes of the fitted volume
    pub fn frustum(&self) -> ShadowFrustum {
        ShadowFrustum::from_view_projection(&self.light_view_projection)
    }
}

/// Fits cascade volumes with a fixed strategy
#[derive(Clone, Copy, Debug, Default)]
pub struct CascadeFitter {
    strategy: CascadeFit,
}

impl CascadeFitter {
    pub fn new(strategy: CascadeFit) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> CascadeFit {
        self.strategy
    }

    /// Fit cascade `index` covering view distances `[near, far)`
    pub fn fit(
        &self,
        camera: &Camera,
        light: &DirectionalLight,
        index: usize,
        near: f32,
        far: f32,
        atlas: &AtlasLayout,
    ) -> Cascade {
        let resolution = atlas.cascade_resolution().max(1) as f32;
        let (sphere_center, radius) = bounding_sphere(camera, near, far);
        let texel_size = 2.0 * radius / resolution;
        let view_rotation = light.rotation.conjugate();

        let anchor = match self.strategy {
            CascadeFit::FrustumBounds => camera.translation + camera.forward() * ((near + far) * 0.5),
            CascadeFit::BoundingSphere => camera.inverse_view().transform_point3(sphere_center),
        };

        let light_origin = light.rotation * snap_to_texel(view_rotation * anchor, texel_size);
        let light_view = Mat4::look_at_rh(light_origin, light_origin + light.direction(), light.up());

        let light_projection = match self.strategy {
            CascadeFit::FrustumBounds => {
                let to_light = light_view * subfrustum_to_world(camera, near, far);
                let corners = NDC_CORNERS.map(|ndc| to_light.project_point3(ndc));
                let bounds = Aabb::from_points(&corners);

                let min = (bounds.min / texel_size).floor() * texel_size;
                let max = (bounds.max / texel_size).ceil() * texel_size;
                Mat4::orthographic_rh(min.x, max.x, min.y, max.y, -bounds.min.z, -bounds.max.z)
            }
            CascadeFit::BoundingSphere => {
                Mat4::orthographic_rh(-radius, radius, -radius, radius, radius, -radius)
            }
        };

        Cascade {
            index,
            near,
            far,
            light_view,
            light_projection,
            light_view_projection: light_projection * light_view,
            light_origin,
            view_rotation,
            radius,
            texel_size,
            viewport: atlas.viewport(index),
        }
    }
}

/// Reversed-depth NDC of the subfrustum `[near, far]` to world space
pub fn subfrustum_to_world(camera: &Camera, near: f32, far: f32) -> Mat4 {
    camera.inverse_view() * camera.reversed_projection(near, far).inverse()
}

/// World-space corners of the subfrustum `[near, far]`, near face first
pub fn subfrustum_corners(camera: &Camera, near: f32, far: f32) -> [Vec3; 8] {
    let to_world = subfrustum_to_world(camera, near, far);
    NDC_CORNERS.map(|ndc| to_world.project_point3(ndc))
}

/// Minimal bounding sphere of the subfrustum `[near, far]` in camera view
/// space. Returns (center, radius).
pub fn bounding_sphere(camera: &Camera, near: f32, far: f32) -> (Vec3, f32) {
    let k = (1.0 + camera.aspect_ratio * camera.aspect_ratio).sqrt() * (camera.vertical_fov * 0.5).tan();
    let k2 = k * k;

    if k2 >= (far - near) / (far + near) {
        // The far face's circumcircle already encloses the near face
        (Vec3::new(0.0, 0.0, -far), far * k)
    } else {
        let k4 = k2 * k2;
        let center = -0.5 * (far + near) * (1.0 + k2);
        let radius = 0.5
            * ((k4 + 2.0 * k2 + 1.0) * (far * far + near * near) + 2.0 * far * (k4 - 1.0) * near).sqrt();
        (Vec3::new(0.0, 0.0, center), radius)
    }
}

/// Floor light-space x/y to the texel grid, leaving depth untouched
#[inline]
fn snap_to_texel(position: Vec3, texel_size: f32) -> Vec3 {
    Vec3::new(
        (position.x / texel_size).floor() * texel_size,
        (position.y / texel_size).floor() * texel_size,
        position.z,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shadow::splits::split_distances;

    fn camera() -> Camera {
        Camera::looking_at(Vec3::new(12.5, 8.0, -30.25), Vec3::new(40.0, 0.0, 10.0), Vec3::Y)
    }

    fn light() -> DirectionalLight {
        DirectionalLight::default().with_direction(Vec3::new(-0.3, -1.0, 0.2))
    }

    fn cascades(fit: CascadeFit) -> Vec<Cascade> {
        let camera = camera();
        let light = light();
        let atlas = AtlasLayout::new(2048);
        let fitter = CascadeFitter::new(fit);
        let splits = split_distances(camera.near, light.max_distance(), light.cascade_count(), light.distribution());

        let mut near = camera.near;
        splits
            .iter()
            .enumerate()
            .map(|(i, &far)| {
                let cascade = fitter.fit(&camera, &light, i, near, far, &atlas);
                near = far;
                cascade
            })
            .collect()
    }

    fn assert_in_clip_volume(point: Vec3, slack: f32) {
        assert!(point.x.abs() <= 1.0 + slack, "x out of range: {:?}", point);
        assert!(point.y.abs() <= 1.0 + slack, "y out of range: {:?}", point);
        assert!(point.z >= -slack && point.z <= 1.0 + slack, "z out of range: {:?}", point);
    }

    #[test]
    fn test_frustum_bounds_round_trip() {
        let camera = camera();
        for cascade in cascades(CascadeFit::FrustumBounds) {
            for corner in subfrustum_corners(&camera, cascade.near, cascade.far) {
                assert_in_clip_volume(cascade.light_view_projection.project_point3(corner), 1e-4);
            }
        }
    }

    #[test]
    fn test_bounding_sphere_round_trip() {
        let camera = camera();
        for cascade in cascades(CascadeFit::BoundingSphere) {
            // The snap moves the sphere by less than one texel
            let slack = 2.0 * cascade.texel_size / cascade.radius + 1e-4;
            for corner in subfrustum_corners(&camera, cascade.near, cascade.far) {
                assert_in_clip_volume(cascade.light_view_projection.project_point3(corner), slack);
            }
        }
    }

    #[test]
    fn test_bounding_sphere_encloses_corners() {
        let wide = camera();
        let narrow = Camera {
            vertical_fov: 10f32.to_radians(),
            aspect_ratio: 1.0,
            ..camera()
        };

        for camera in [wide, narrow] {
            for &(near, far) in &[(0.1, 2.0), (0.1, 100.0), (20.0, 25.0)] {
                let (center, radius) = bounding_sphere(&camera, near, far);
                let center = camera.inverse_view().transform_point3(center);
                for corner in subfrustum_corners(&camera, near, far) {
                    assert!(corner.distance(center) <= radius * (1.0 + 1e-4));
                }
            }
        }
    }

    #[test]
    fn test_bounding_sphere_narrow_fov_centers_inside_slice() {
        let camera = Camera {
            vertical_fov: 10f32.to_radians(),
            aspect_ratio: 1.0,
            ..Default::default()
        };
        let (center, radius) = bounding_sphere(&camera, 10.0, 20.0);

        assert!(-center.z > 10.0 && -center.z < 20.0);
        assert!(radius < 10.0);
    }

    #[test]
    fn test_snapped_origin_is_stable() {
        for fit in [CascadeFit::FrustumBounds, CascadeFit::BoundingSphere] {
            let first = cascades(fit);
            let second = cascades(fit);

            for (a, b) in first.iter().zip(&second) {
                assert!(a.light_origin.abs_diff_eq(b.light_origin, 1e-5));
                assert!(a.light_view_projection.abs_diff_eq(b.light_view_projection, 1e-6));
            }
        }
    }

    #[test]
    fn test_origin_lies_on_texel_grid() {
        for cascade in cascades(CascadeFit::FrustumBounds) {
            let light_space = cascade.view_rotation * cascade.light_origin;
            for value in [light_space.x, light_space.y] {
                let texels = value / cascade.texel_size;
                assert!((texels - texels.round()).abs() < 1e-2);
            }
        }
    }

    #[test]
    fn test_small_camera_motion_keeps_grid() {
        let light = light();
        let atlas = AtlasLayout::new(2048);
        let fitter = CascadeFitter::default();

        let camera = camera();
        let base = fitter.fit(&camera, &light, 0, 0.1, 10.0, &atlas);

        let mut moved = camera.clone();
        moved.translation += light.rotation * Vec3::new(base.texel_size * 0.25, 0.0, 0.0);
        let shifted = fitter.fit(&moved, &light, 0, 0.1, 10.0, &atlas);

        // Origins differ by a whole number of texels
        let delta = shifted.view_rotation * (shifted.light_origin - base.light_origin);
        for value in [delta.x, delta.y] {
            let texels = value / base.texel_size;
            assert!((texels - texels.round()).abs() < 1e-2);
        }
        assert_eq!(shifted.texel_size, base.texel_size);
    }

    #[test]
    fn test_model_view_projection_matches_combined_matrix() {
        let transform = Mat4::from_scale_rotation_translation(
            Vec3::splat(2.0),
            Quat::from_rotation_y(0.7),
            Vec3::new(30.0, 1.0, 12.0),
        );

        for cascade in cascades(CascadeFit::FrustumBounds) {
            let stable = cascade.model_view_projection(&transform);
            let combined = cascade.light_view_projection * transform;
            let point = Vec3::new(0.5, -1.0, 0.25);

            let a = stable.project_point3(point);
            let b = combined.project_point3(point);
            assert!(a.abs_diff_eq(b, 1e-3), "{:?} vs {:?}", a, b);
        }
    }

    #[test]
    fn test_atlas_matrix_matches_world_path() {
        let camera = camera();
        for cascade in cascades(CascadeFit::FrustumBounds) {
            let expected = AtlasLayout::scale_bias(cascade.index)
                * cascade.light_view_projection
                * camera.inverse_view();
            let actual = cascade.atlas_matrix(&camera);

            let view_point = Vec3::new(1.0, -0.5, -0.5 * (cascade.near + cascade.far));
            let a = actual.project_point3(view_point);
            let b = expected.project_point3(view_point);
            assert!(a.abs_diff_eq(b, 1e-3), "{:?} vs {:?}", a, b);
        }
    }

    #[test]
    fn test_reversed_depth() {
        let cascade = &cascades(CascadeFit::BoundingSphere)[0];
        let toward_light = cascade.light_origin - cascade.radius * 0.5 * light().direction();
        let away_from_light = cascade.light_origin + cascade.radius * 0.5 * light().direction();

        let near = cascade.light_view_projection.project_point3(toward_light);
        let far = cascade.light_view_projection.project_point3(away_from_light);
        assert!(near.z > far.z);
    }
}
