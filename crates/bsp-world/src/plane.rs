//! Plane representation and box/point classification.

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Default epsilon for plane classification.
/// Points within this distance of the plane are considered "on" the plane.
pub const PLANE_EPSILON: f32 = 1e-5;

/// `box_on_plane_side` bit: some part of the box is in front of the plane.
pub const SIDE_FRONT: u8 = 1;
/// `box_on_plane_side` bit: some part of the box is behind the plane.
pub const SIDE_BACK: u8 = 2;
/// `box_on_plane_side` result for a box straddling the plane.
pub const SIDE_CROSS: u8 = SIDE_FRONT | SIDE_BACK;

/// Which side of a plane a point lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneSide {
    /// Point is in front of the plane (positive side of normal)
    Front,
    /// Point is behind the plane (negative side of normal)
    Back,
    /// Point lies on the plane (within epsilon tolerance)
    OnPlane,
}

/// Classification of a face relative to a plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// All vertices are in front of (or on) the plane
    Front,
    /// All vertices are behind (or on) the plane
    Back,
    /// All vertices are on the plane
    Coplanar,
    /// Vertices are on both sides
    Spanning,
}

/// Axial classification of a plane normal.
///
/// Only normals equal to a positive unit axis are axial; everything else,
/// including negative axes, goes through the signbits path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum PlaneType {
    AxialX = 0,
    AxialY = 1,
    AxialZ = 2,
    NonAxial = 3,
}

impl PlaneType {
    fn for_normal(normal: &Vector3<f32>) -> Self {
        if normal.x == 1.0 {
            PlaneType::AxialX
        } else if normal.y == 1.0 {
            PlaneType::AxialY
        } else if normal.z == 1.0 {
            PlaneType::AxialZ
        } else {
            PlaneType::NonAxial
        }
    }

    /// The axis index for axial planes.
    #[inline]
    pub fn axis(self) -> Option<usize> {
        match self {
            PlaneType::NonAxial => None,
            axial => Some(axial as usize),
        }
    }
}

/// A plane in 3D space, represented as `normal · point = dist`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    normal: Vector3<f32>,
    dist: f32,
    plane_type: PlaneType,
    signbits: u8,
}

impl Plane {
    /// Creates a plane from a normal vector and distance.
    /// The normal is normalized; returns `None` if it has zero length.
    pub fn new(normal: Vector3<f32>, dist: f32) -> Option<Self> {
        let norm = normal.norm();
        if norm <= f32::EPSILON || !norm.is_finite() {
            return None;
        }
        Some(Self::from_unit(normal / norm, dist / norm))
    }

    /// Creates a plane from a point on the plane and a normal vector.
    pub fn from_point_and_normal(point: Point3<f32>, normal: Vector3<f32>) -> Option<Self> {
        let norm = normal.norm();
        if norm <= f32::EPSILON || !norm.is_finite() {
            return None;
        }
        let unit = normal / norm;
        Some(Self::from_unit(unit, unit.dot(&point.coords)))
    }

    /// Creates a plane from three non-collinear points.
    /// The normal direction follows the right-hand rule: (b - a) × (c - a).
    pub fn from_three_points(a: Point3<f32>, b: Point3<f32>, c: Point3<f32>) -> Option<Self> {
        Self::from_point_and_normal(a, (b - a).cross(&(c - a)))
    }

    /// `normal` must already be unit length.
    pub(crate) fn from_unit(normal: Vector3<f32>, dist: f32) -> Self {
        let mut signbits = 0u8;
        for axis in 0..3 {
            if normal[axis] < 0.0 {
                signbits |= 1 << axis;
            }
        }
        Self {
            normal,
            dist,
            plane_type: PlaneType::for_normal(&normal),
            signbits,
        }
    }

    /// Returns the unit normal vector of the plane.
    #[inline]
    pub fn normal(&self) -> Vector3<f32> {
        self.normal
    }

    /// Returns the signed distance from the origin to the plane along the normal.
    #[inline]
    pub fn dist(&self) -> f32 {
        self.dist
    }

    #[inline]
    pub fn plane_type(&self) -> PlaneType {
        self.plane_type
    }

    /// Bit `j` is set when `normal[j]` is negative.
    #[inline]
    pub fn signbits(&self) -> u8 {
        self.signbits
    }

    /// Computes the signed distance from a point to the plane.
    /// Positive in front, negative behind.
    #[inline]
    pub fn signed_distance(&self, point: &Point3<f32>) -> f32 {
        self.normal.dot(&point.coords) - self.dist
    }

    /// Classifies which side of the plane a point lies on using `PLANE_EPSILON`.
    #[inline]
    pub fn classify_point(&self, point: &Point3<f32>) -> PlaneSide {
        self.classify_point_with_epsilon(point, PLANE_EPSILON)
    }

    /// Classifies which side of the plane a point lies on, with a custom epsilon.
    pub fn classify_point_with_epsilon(&self, point: &Point3<f32>, epsilon: f32) -> PlaneSide {
        let dist = self.signed_distance(point);
        if dist > epsilon {
            PlaneSide::Front
        } else if dist < -epsilon {
            PlaneSide::Back
        } else {
            PlaneSide::OnPlane
        }
    }

    /// Returns a new plane facing the opposite direction.
    #[inline]
    pub fn flipped(&self) -> Self {
        Self::from_unit(-self.normal, -self.dist)
    }

    /// Projects a point onto the plane.
    #[inline]
    pub fn project_point(&self, point: &Point3<f32>) -> Point3<f32> {
        point - self.normal * self.signed_distance(point)
    }
}

/// Tests an axis-aligned box against a plane.
///
/// Returns a mask: [`SIDE_FRONT`] if any part of the box is in front,
/// [`SIDE_BACK`] if any part is behind, both when it straddles.
/// Axial planes compare a single coordinate; other planes use the signbits
/// to pick the two box corners farthest along and against the normal.
pub fn box_on_plane_side(mins: &Point3<f32>, maxs: &Point3<f32>, plane: &Plane) -> u8 {
    if let Some(axis) = plane.plane_type.axis() {
        if plane.dist <= mins[axis] {
            return SIDE_FRONT;
        }
        if plane.dist >= maxs[axis] {
            return SIDE_BACK;
        }
        return SIDE_CROSS;
    }

    // corners[0] is used where the normal is positive, corners[1] where negative
    let corners = [maxs, mins];
    let mut far = Point3::origin();
    let mut near = Point3::origin();
    for axis in 0..3 {
        let bit = ((plane.signbits >> axis) & 1) as usize;
        far[axis] = corners[bit][axis];
        near[axis] = corners[bit ^ 1][axis];
    }

    let mut sides = 0;
    if plane.normal.dot(&far.coords) >= plane.dist {
        sides |= SIDE_FRONT;
    }
    if plane.normal.dot(&near.coords) < plane.dist {
        sides |= SIDE_BACK;
    }
    sides
}
