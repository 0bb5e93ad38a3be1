//! Axis-aligned bounding boxes for nodes and clusters.

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box.
///
/// A freshly created box is *empty* (mins above maxs) so that encapsulating
/// the first point collapses it onto that point.
///
/// Serialized as `null` when empty and as `[mins, maxs]` otherwise, since the
/// infinities of the empty state have no portable encoding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "Option<Corners>", into = "Option<Corners>")]
pub struct Aabb {
    pub mins: Point3<f32>,
    pub maxs: Point3<f32>,
}

type Corners = (Point3<f32>, Point3<f32>);

impl From<Option<Corners>> for Aabb {
    fn from(corners: Option<Corners>) -> Self {
        match corners {
            Some((mins, maxs)) => Self::new(mins, maxs),
            None => Self::empty(),
        }
    }
}

impl From<Aabb> for Option<Corners> {
    fn from(aabb: Aabb) -> Self {
        (!aabb.is_empty()).then_some((aabb.mins, aabb.maxs))
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

impl Aabb {
    /// Creates a box from its corners.
    #[inline]
    pub fn new(mins: Point3<f32>, maxs: Point3<f32>) -> Self {
        Self { mins, maxs }
    }

    /// A box containing nothing.
    #[inline]
    pub fn empty() -> Self {
        Self {
            mins: Point3::from(Vector3::repeat(f32::INFINITY)),
            maxs: Point3::from(Vector3::repeat(f32::NEG_INFINITY)),
        }
    }

    /// Builds the smallest box around `points`. Empty if there are none.
    pub fn from_points<'a, I>(points: I) -> Self
    where
        I: IntoIterator<Item = &'a Point3<f32>>,
    {
        let mut aabb = Self::empty();
        for point in points {
            aabb.encapsulate(point);
        }
        aabb
    }

    /// Returns true if no point has been added yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mins.x > self.maxs.x || self.mins.y > self.maxs.y || self.mins.z > self.maxs.z
    }

    /// Grows the box to include `point`.
    #[inline]
    pub fn encapsulate(&mut self, point: &Point3<f32>) {
        self.mins = self.mins.inf(point);
        self.maxs = self.maxs.sup(point);
    }

    /// Grows the box to include `other`. Empty boxes are ignored.
    #[inline]
    pub fn union_with(&mut self, other: &Aabb) {
        if other.is_empty() {
            return;
        }
        self.encapsulate(&other.mins);
        self.encapsulate(&other.maxs);
    }

    /// Returns true if `other` lies entirely inside this box.
    pub fn contains(&self, other: &Aabb) -> bool {
        if other.is_empty() {
            return true;
        }
        (0..3).all(|i| self.mins[i] <= other.mins[i] && self.maxs[i] >= other.maxs[i])
    }

    /// Returns true if `point` is inside or on the box.
    pub fn contains_point(&self, point: &Point3<f32>) -> bool {
        (0..3).all(|i| point[i] >= self.mins[i] && point[i] <= self.maxs[i])
    }

    /// Size along each axis. Zero for an empty box.
    pub fn extent(&self) -> Vector3<f32> {
        if self.is_empty() {
            Vector3::zeros()
        } else {
            self.maxs - self.mins
        }
    }

    /// Center of the box.
    pub fn center(&self) -> Point3<f32> {
        nalgebra::center(&self.mins, &self.maxs)
    }
}
