//! Camera description and view-frustum culling.

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::aabb::Aabb;
use crate::plane::{box_on_plane_side, Plane, SIDE_BACK};

/// Viewpoint used for marking and culling.
///
/// `forward`, `right` and `up` are expected to be an orthonormal basis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub position: Point3<f32>,
    pub forward: Vector3<f32>,
    pub right: Vector3<f32>,
    pub up: Vector3<f32>,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Width over height.
    pub aspect: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Point3::origin(),
            forward: -Vector3::z(),
            right: Vector3::x(),
            up: Vector3::y(),
            fov_y: std::f32::consts::FRAC_PI_2,
            aspect: 16.0 / 9.0,
        }
    }
}

impl Camera {
    /// Builds a camera at `position` looking at `target`.
    ///
    /// Falls back to the default orientation when `target` coincides with
    /// `position` or the view direction is parallel to `world_up`.
    pub fn look_at(
        position: Point3<f32>,
        target: Point3<f32>,
        world_up: Vector3<f32>,
        fov_y: f32,
        aspect: f32,
    ) -> Self {
        let fallback = Self {
            position,
            fov_y,
            aspect,
            ..Self::default()
        };

        let Some(forward) = (target - position).try_normalize(f32::EPSILON) else {
            return fallback;
        };
        let Some(right) = forward.cross(&world_up).try_normalize(f32::EPSILON) else {
            return fallback;
        };
        let up = right.cross(&forward);

        Self {
            position,
            forward,
            right,
            up,
            fov_y,
            aspect,
        }
    }
}

/// Index of each plane in [`Frustum::planes`].
pub const FRUSTUM_LEFT: usize = 0;
pub const FRUSTUM_RIGHT: usize = 1;
pub const FRUSTUM_BOTTOM: usize = 2;
pub const FRUSTUM_TOP: usize = 3;
pub const FRUSTUM_NEAR: usize = 4;
pub const FRUSTUM_FAR: usize = 5;

/// Six clip planes with normals pointing into the view volume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frustum {
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Derives the frustum for `camera` with the given clip distances.
    ///
    /// The side planes pass through the eye, tilted inwards by the half field
    /// of view (the horizontal one derived from `fov_y` and `aspect`).
    pub fn extract(camera: &Camera, near_clip: f32, far_clip: f32) -> Self {
        let half_y = camera.fov_y * 0.5;
        let half_x = (half_y.tan() * camera.aspect).atan();
        let (sin_x, cos_x) = half_x.sin_cos();
        let (sin_y, cos_y) = half_y.sin_cos();

        let forward = camera.forward;
        let eye = camera.position;

        let side = |normal: Vector3<f32>| through(eye, normal);

        let planes = [
            side(camera.right * cos_x + forward * sin_x),
            side(-camera.right * cos_x + forward * sin_x),
            side(camera.up * cos_y + forward * sin_y),
            side(-camera.up * cos_y + forward * sin_y),
            through(eye + forward * near_clip, forward),
            through(eye + forward * far_clip, -forward),
        ];

        Self { planes }
    }

    /// Returns false only when the box is entirely behind some plane.
    pub fn is_aabb_visible(&self, mins: &Point3<f32>, maxs: &Point3<f32>) -> bool {
        self.planes
            .iter()
            .all(|plane| box_on_plane_side(mins, maxs, plane) != SIDE_BACK)
    }

    /// Box test for node bounds. Empty bounds are kept.
    pub fn is_bounds_visible(&self, bounds: &Aabb) -> bool {
        bounds.is_empty() || self.is_aabb_visible(&bounds.mins, &bounds.maxs)
    }
}

/// Plane through `point` with `normal`. A degenerate camera basis yields a
/// plane every finite box is in front of.
fn through(point: Point3<f32>, normal: Vector3<f32>) -> Plane {
    Plane::from_point_and_normal(point, normal)
        .unwrap_or_else(|| Plane::from_unit(Vector3::x(), f32::MIN))
}

/// Derives the six frustum planes for `camera`.
pub fn extract_frustum_planes(camera: &Camera, near_clip: f32, far_clip: f32) -> Frustum {
    Frustum::extract(camera, near_clip, far_clip)
}

/// Returns false only when the box is entirely behind one of the planes.
pub fn is_aabb_visible_in_frustum(frustum: &Frustum, mins: &Point3<f32>, maxs: &Point3<f32>) -> bool {
    frustum.is_aabb_visible(mins, maxs)
}
