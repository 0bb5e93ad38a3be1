//! Level faces: the planar polygons a world is built from.

use bitflags::bitflags;
use nalgebra::{Point3, Vector2, Vector3};
use serde::{Deserialize, Serialize};

use crate::aabb::Aabb;
use crate::plane::{Classification, Plane, PlaneSide};

/// Index of a face in [`World::faces`](crate::World::faces).
pub type FaceIndex = usize;

/// Opaque handle to a material owned by the asset layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MaterialId(pub u32);

/// How the renderer should blend a face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RenderMode {
    #[default]
    Opaque,
    AlphaTest,
    Blended,
    Sky,
}

bitflags! {
    /// Per-face hints passed through to the renderer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct FaceFlags: u32 {
        const TWO_SIDED = 1 << 0;
        const NO_DRAW = 1 << 1;
        const NO_COLLIDE = 1 << 2;
        const DETAIL = 1 << 3;
    }
}

/// A convex planar polygon in world space.
///
/// Vertices should be coplanar and wound counter-clockwise when viewed from
/// the front. The unit normal is cached at construction; degenerate faces
/// (fewer than 3 vertices or zero area) get a zero normal and are otherwise
/// carried through the build untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Face {
    vertices: Vec<Point3<f32>>,
    uvs: Vec<Vector2<f32>>,
    normal: Vector3<f32>,
    pub material: MaterialId,
    pub render_mode: RenderMode,
    pub flags: FaceFlags,
}

impl Face {
    /// Creates an opaque face with zeroed UVs.
    pub fn new(vertices: Vec<Point3<f32>>, material: MaterialId) -> Self {
        let uvs = vec![Vector2::zeros(); vertices.len()];
        Self::with_uvs(vertices, uvs, material)
    }

    /// Creates a face with per-vertex UVs.
    /// Missing UVs are zero-filled and extra ones are dropped.
    pub fn with_uvs(
        vertices: Vec<Point3<f32>>,
        mut uvs: Vec<Vector2<f32>>,
        material: MaterialId,
    ) -> Self {
        uvs.resize(vertices.len(), Vector2::zeros());
        let normal = compute_normal(&vertices);
        Self {
            vertices,
            uvs,
            normal,
            material,
            render_mode: RenderMode::Opaque,
            flags: FaceFlags::empty(),
        }
    }

    pub fn with_render_mode(mut self, render_mode: RenderMode) -> Self {
        self.render_mode = render_mode;
        self
    }

    pub fn with_flags(mut self, flags: FaceFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Returns the vertices of the face.
    #[inline]
    pub fn vertices(&self) -> &[Point3<f32>] {
        &self.vertices
    }

    /// Returns the per-vertex UVs. Always the same length as `vertices()`.
    #[inline]
    pub fn uvs(&self) -> &[Vector2<f32>] {
        &self.uvs
    }

    /// Replaces the vertices and recomputes the cached normal.
    pub fn set_vertices(&mut self, vertices: Vec<Point3<f32>>) {
        self.uvs.resize(vertices.len(), Vector2::zeros());
        self.normal = compute_normal(&vertices);
        self.vertices = vertices;
    }

    /// Returns the number of vertices.
    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Cached unit normal, or the zero vector for a degenerate face.
    #[inline]
    pub fn normal(&self) -> Vector3<f32> {
        self.normal
    }

    /// True when the face has fewer than 3 vertices or no area.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.normal == Vector3::zeros()
    }

    /// Tight bounds of the vertices. Empty for a face without vertices.
    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(&self.vertices)
    }

    /// Average of the vertices.
    pub fn centroid(&self) -> Option<Point3<f32>> {
        if self.vertices.is_empty() {
            return None;
        }
        let sum: Vector3<f32> = self.vertices.iter().map(|p| p.coords).sum();
        Some(Point3::from(sum / self.vertices.len() as f32))
    }

    /// Builds a face sharing this one's material and render state.
    pub(crate) fn fragment(&self, vertices: Vec<Point3<f32>>, uvs: Vec<Vector2<f32>>) -> Self {
        Self {
            normal: self.normal,
            vertices,
            uvs,
            material: self.material,
            render_mode: self.render_mode,
            flags: self.flags,
        }
    }
}

/// Newell's method, so that the first three vertices being collinear does
/// not make an otherwise valid polygon degenerate.
fn compute_normal(vertices: &[Point3<f32>]) -> Vector3<f32> {
    if vertices.len() < 3 {
        return Vector3::zeros();
    }

    let mut normal = Vector3::<f32>::zeros();
    for (i, current) in vertices.iter().enumerate() {
        let next = &vertices[(i + 1) % vertices.len()];
        normal.x += (current.y - next.y) * (current.z + next.z);
        normal.y += (current.z - next.z) * (current.x + next.x);
        normal.z += (current.x - next.x) * (current.y + next.y);
    }

    let len = normal.norm();
    if len > f32::EPSILON && len.is_finite() {
        normal / len
    } else {
        Vector3::zeros()
    }
}

/// Returns the plane a face lies on, or `None` for a degenerate face.
///
/// The plane passes through the vertex centroid along the cached normal.
pub fn plane_from_face(face: &Face) -> Option<Plane> {
    if face.is_degenerate() {
        return None;
    }
    Plane::from_point_and_normal(face.centroid()?, face.normal())
}

/// Classifies a face relative to a plane.
///
/// Returns:
/// - `Front` if no vertex is behind the plane
/// - `Back` if no vertex is in front of the plane
/// - `Coplanar` if every vertex is on the plane (also for a face with no vertices)
/// - `Spanning` if vertices are on both sides
pub fn classify_face(face: &Face, plane: &Plane) -> Classification {
    let mut front = 0;
    let mut back = 0;

    for vertex in face.vertices() {
        match plane.classify_point(vertex) {
            PlaneSide::Front => front += 1,
            PlaneSide::Back => back += 1,
            PlaneSide::OnPlane => {}
        }
    }

    match (front, back) {
        (0, 0) => Classification::Coplanar,
        (_, 0) => Classification::Front,
        (0, _) => Classification::Back,
        _ => Classification::Spanning,
    }
}

/// Returns true if the face's normal points the same way as the plane's.
#[inline]
pub fn faces_same_direction(face: &Face, plane: &Plane) -> bool {
    face.normal().dot(&plane.normal()) > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn make_face(points: &[[f32; 3]]) -> Face {
        Face::new(
            points.iter().map(|p| Point3::new(p[0], p[1], p[2])).collect(),
            MaterialId(0),
        )
    }

    #[test]
    fn normal_follows_winding() {
        let face = make_face(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        assert_relative_eq!(face.normal(), Vector3::z());

        let reversed = make_face(&[[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]]);
        assert_relative_eq!(reversed.normal(), -Vector3::z());
    }

    #[test]
    fn normal_survives_collinear_leading_vertices() {
        // first three vertices are collinear
        let face = make_face(&[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [2.0, 0.0, 0.0],
            [2.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ]);
        assert!(!face.is_degenerate());
        assert_relative_eq!(face.normal(), Vector3::z());
    }

    #[test]
    fn degenerate_faces_have_zero_normal() {
        let coincident = make_face(&[[1.0, 1.0, 1.0], [1.0, 1.0, 1.0], [1.0, 1.0, 1.0]]);
        assert!(coincident.is_degenerate());
        assert_eq!(coincident.bounds().extent(), Vector3::zeros());
        assert!(plane_from_face(&coincident).is_none());

        let line = make_face(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
        assert!(line.is_degenerate());

        let nothing = make_face(&[]);
        assert!(nothing.is_degenerate());
        assert!(nothing.bounds().is_empty());
        assert!(nothing.centroid().is_none());
    }

    #[test]
    fn set_vertices_recomputes_normal() {
        let mut face = make_face(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        face.set_vertices(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, -1.0),
        ]);
        assert_relative_eq!(face.normal(), Vector3::y());
        assert_eq!(face.uvs().len(), 4);
    }

    #[test]
    fn uvs_are_padded_to_vertex_count() {
        let face = Face::with_uvs(
            vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)],
            vec![Vector2::new(0.5, 0.5)],
            MaterialId(3),
        );
        assert_eq!(face.uvs().len(), 3);
        assert_eq!(face.uvs()[0], Vector2::new(0.5, 0.5));
        assert_eq!(face.uvs()[2], Vector2::zeros());
        assert_eq!(face.material, MaterialId(3));
    }

    #[test]
    fn plane_from_face_contains_vertices() {
        let face = make_face(&[[0.0, 2.0, 0.0], [0.0, 2.0, 1.0], [1.0, 2.0, 0.0]]);
        let plane = plane_from_face(&face).unwrap();
        for v in face.vertices() {
            assert_eq!(plane.classify_point(v), PlaneSide::OnPlane);
        }
        assert!(faces_same_direction(&face, &plane));
    }

    #[test]
    fn classify_face_cases() {
        let plane = Plane::new(Vector3::z(), 0.0).unwrap();

        let front = make_face(&[[0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [0.0, 1.0, 2.0]]);
        let back = make_face(&[[0.0, 0.0, -1.0], [1.0, 0.0, -1.0], [0.0, 1.0, -2.0]]);
        let coplanar = make_face(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        let spanning = make_face(&[[0.0, 0.0, -1.0], [1.0, 0.0, 1.0], [0.0, 1.0, 1.0]]);
        let touching = make_face(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 1.0]]);

        assert_eq!(classify_face(&front, &plane), Classification::Front);
        assert_eq!(classify_face(&back, &plane), Classification::Back);
        assert_eq!(classify_face(&coplanar, &plane), Classification::Coplanar);
        assert_eq!(classify_face(&spanning, &plane), Classification::Spanning);
        assert_eq!(classify_face(&touching, &plane), Classification::Front);
    }

    #[test]
    fn flags_and_render_mode() {
        let face = make_face(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]])
            .with_render_mode(RenderMode::Blended)
            .with_flags(FaceFlags::TWO_SIDED | FaceFlags::DETAIL);
        assert_eq!(face.render_mode, RenderMode::Blended);
        assert!(face.flags.contains(FaceFlags::TWO_SIDED));
        assert!(!face.flags.contains(FaceFlags::NO_DRAW));
    }
}
