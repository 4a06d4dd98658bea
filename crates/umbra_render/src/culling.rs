//! Shadow frustum culling
//!
//! Planes are extracted from a cascade's light view-projection with the
//! Gribb/Hartmann method. Under reversed depth the volume spans clip z in
//! [0, 1] with 1 nearest the light. Only the four side planes and the z = 0
//! plane (furthest from the light) are tested: casters between the light and
//! the volume must still be drawn, and depth clamping flattens them onto the
//! near face.

use glam::{Mat4, Vec3, Vec4};

use crate::bounds::Aabb;
use crate::scene::{ObjectKind, SceneObject};

/// Plane in 3D space (normal . p + distance = 0)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
    /// Plane normal (unit vector), pointing into the kept half-space
    pub normal: Vec3,
    /// Distance from origin along normal
    pub distance: f32,
}

impl Plane {
    /// Create from the coefficients `(a, b, c, d)` of `ax + by + cz + d = 0`
    pub fn from_coefficients(coefficients: Vec4) -> Self {
        let normal = coefficients.truncate();
        let len = normal.length();
        if len > 1e-10 {
            Self {
                normal: normal / len,
                distance: coefficients.w / len,
            }
        } else {
            Self {
                normal: Vec3::Y,
                distance: 0.0,
            }
        }
    }

    /// Signed distance; negative means outside
    #[inline]
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.distance
    }
}

/// Culling volume of one cascade
#[derive(Clone, Debug)]
pub struct ShadowFrustum {
    /// left, right, bottom, top, far
    pub planes: [Plane; 5],
}

impl ShadowFrustum {
    pub const LEFT: usize = 0;
    pub const RIGHT: usize = 1;
    pub const BOTTOM: usize = 2;
    pub const TOP: usize = 3;
    pub const FAR: usize = 4;

    /// Extract planes from a reversed-depth light view-projection
    pub fn from_view_projection(view_projection: &Mat4) -> Self {
        let row0 = view_projection.row(0);
        let row1 = view_projection.row(1);
        let row2 = view_projection.row(2);
        let row3 = view_projection.row(3);

        Self {
            planes: [
                Plane::from_coefficients(row3 + row0),
                Plane::from_coefficients(row3 - row0),
                Plane::from_coefficients(row3 + row1),
                Plane::from_coefficients(row3 - row1),
                // clip z >= 0
                Plane::from_coefficients(row2),
            ],
        }
    }

    /// Positive-vertex test; boundary contact counts as intersecting
    pub fn intersects(&self, aabb: &Aabb) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.distance_to_point(aabb.support(plane.normal)) >= 0.0)
    }

    /// True when every corner of the box is on the kept side of every plane
    pub fn contains(&self, aabb: &Aabb) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.distance_to_point(aabb.support(-plane.normal)) >= 0.0)
    }
}

/// Candidate filter applied before any frustum test
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShadowCuller {
    layer_mask: u32,
}

impl ShadowCuller {
    /// Objects must share a layer with both the camera and the light
    pub fn new(camera_mask: u32, light_mask: u32) -> Self {
        Self {
            layer_mask: camera_mask & light_mask,
        }
    }

    pub fn layer_mask(&self) -> u32 {
        self.layer_mask
    }

    /// Layer and kind filter
    pub fn is_candidate(&self, object: &SceneObject) -> bool {
        object.layer_mask & self.layer_mask != 0 && matches!(object.kind, ObjectKind::Mesh(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_ortho() -> Mat4 {
        // Light at the origin looking down -Z, volume x/y in [-8, 8], z in [-16, 0]
        Mat4::orthographic_rh(-8.0, 8.0, -8.0, 8.0, 16.0, 0.0)
    }

    fn cube(center: Vec3, half: f32) -> Aabb {
        Aabb::from_center_half_extents(center, Vec3::splat(half))
    }

    #[test]
    fn test_inside_and_outside() {
        let frustum = ShadowFrustum::from_view_projection(&unit_ortho());

        assert!(frustum.intersects(&cube(Vec3::new(0.0, 0.0, -8.0), 1.0)));
        assert!(frustum.contains(&cube(Vec3::new(0.0, 0.0, -8.0), 1.0)));

        assert!(!frustum.intersects(&cube(Vec3::new(15.0, 0.0, -8.0), 1.0)));
        assert!(!frustum.intersects(&cube(Vec3::new(0.0, -15.0, -8.0), 1.0)));
        assert!(!frustum.intersects(&cube(Vec3::new(0.0, 0.0, -30.0), 1.0)));
    }

    #[test]
    fn test_casters_toward_light_are_kept() {
        let frustum = ShadowFrustum::from_view_projection(&unit_ortho());
        assert!(frustum.intersects(&cube(Vec3::new(0.0, 0.0, 50.0), 1.0)));
    }

    #[test]
    fn test_boundary_contact_is_kept() {
        let frustum = ShadowFrustum::from_view_projection(&unit_ortho());
        let touching = Aabb::new(Vec3::new(8.0, -1.0, -5.0), Vec3::new(10.0, 1.0, -4.0));
        assert!(frustum.intersects(&touching));
        assert!(!frustum.contains(&touching));
    }

    #[test]
    fn test_fitted_cascade_planes() {
        use crate::scene::{Camera, DirectionalLight};
        use crate::shadow::{AtlasLayout, CascadeFit, CascadeFitter};

        let camera = Camera::looking_at(Vec3::new(5.0, 3.0, 8.0), Vec3::new(-20.0, 0.0, -40.0), Vec3::Y);
        let light = DirectionalLight::default().with_direction(Vec3::new(-0.4, -1.0, 0.3));
        let atlas = AtlasLayout::new(2048);

        for fit in [CascadeFit::FrustumBounds, CascadeFit::BoundingSphere] {
            let cascade = CascadeFitter::new(fit).fit(&camera, &light, 1, 5.0, 20.0, &atlas);
            let frustum = cascade.frustum();

            let corners = crate::shadow::fit::subfrustum_corners(&camera, cascade.near, cascade.far);
            let center = corners.iter().copied().sum::<Vec3>() / corners.len() as f32;
            let reach = 10.0 * cascade.radius;
            let side = light.rotation * Vec3::X;

            assert!(frustum.intersects(&cube(center, 0.1)));
            assert!(frustum.contains(&cube(center, 0.1)));
            assert!(!frustum.intersects(&cube(center + side * reach, 0.1)));
            assert!(!frustum.intersects(&cube(center - side * reach, 0.1)));
            assert!(!frustum.intersects(&cube(center + light.direction() * reach, 0.1)));
            assert!(frustum.intersects(&cube(center - light.direction() * reach, 0.1)));
        }
    }

    #[test]
    fn test_candidate_filter() {
        let culler = ShadowCuller::new(0b0110, 0b0011);
        assert_eq!(culler.layer_mask(), 0b0010);

        let mesh = SceneObject::mesh(Aabb::default(), Vec::new());
        assert!(culler.is_candidate(&mesh.clone().with_layer_mask(0b0010)));
        assert!(!culler.is_candidate(&mesh.with_layer_mask(0b0100)));

        let camera = SceneObject {
            bounds: Aabb::default(),
            layer_mask: u32::MAX,
            kind: ObjectKind::Camera,
        };
        assert!(!culler.is_candidate(&camera));
    }
}
