//! Face cutting for the recursive builder.

use nalgebra::{Point3, Vector2};

use crate::face::{classify_face, Face};
use crate::plane::{Classification, Plane, PlaneSide};

/// Cuts a face by a plane.
///
/// Returns `(front, back)`:
///
/// - **Front** / **Coplanar**: `(Some(face), None)`
/// - **Back**: `(None, Some(face))`
/// - **Spanning**: the two clipped pieces. A piece with fewer than 3
///   vertices is dropped.
///
/// New vertices are inserted where edges cross the plane, with their UVs
/// interpolated along the edge.
pub fn split_face_by_plane(face: &Face, plane: &Plane) -> (Option<Face>, Option<Face>) {
    match classify_face(face, plane) {
        Classification::Front | Classification::Coplanar => (Some(face.clone()), None),
        Classification::Back => (None, Some(face.clone())),
        Classification::Spanning => split_spanning(face, plane),
    }
}

/// Sutherland-Hodgman style walk over the edges, building both vertex lists
/// at once.
fn split_spanning(face: &Face, plane: &Plane) -> (Option<Face>, Option<Face>) {
    let vertices = face.vertices();
    let uvs = face.uvs();
    let n = vertices.len();

    let mut front_verts: Vec<Point3<f32>> = Vec::with_capacity(n + 1);
    let mut front_uvs: Vec<Vector2<f32>> = Vec::with_capacity(n + 1);
    let mut back_verts: Vec<Point3<f32>> = Vec::with_capacity(n + 1);
    let mut back_uvs: Vec<Vector2<f32>> = Vec::with_capacity(n + 1);

    let dists: Vec<f32> = vertices.iter().map(|v| plane.signed_distance(v)).collect();
    let sides: Vec<PlaneSide> = vertices.iter().map(|v| plane.classify_point(v)).collect();

    for i in 0..n {
        let j = (i + 1) % n;

        match sides[i] {
            PlaneSide::Front => {
                front_verts.push(vertices[i]);
                front_uvs.push(uvs[i]);
            }
            PlaneSide::Back => {
                back_verts.push(vertices[i]);
                back_uvs.push(uvs[i]);
            }
            PlaneSide::OnPlane => {
                front_verts.push(vertices[i]);
                front_uvs.push(uvs[i]);
                back_verts.push(vertices[i]);
                back_uvs.push(uvs[i]);
            }
        }

        let crosses = matches!(
            (sides[i], sides[j]),
            (PlaneSide::Front, PlaneSide::Back) | (PlaneSide::Back, PlaneSide::Front)
        );
        if crosses {
            // dists have opposite signs here so the denominator is non-zero
            let t = dists[i] / (dists[i] - dists[j]);
            let point = vertices[i] + (vertices[j] - vertices[i]) * t;
            let uv = uvs[i] + (uvs[j] - uvs[i]) * t;

            front_verts.push(point);
            front_uvs.push(uv);
            back_verts.push(point);
            back_uvs.push(uv);
        }
    }

    let front = (front_verts.len() >= 3).then(|| face.fragment(front_verts, front_uvs));
    let back = (back_verts.len() >= 3).then(|| face.fragment(back_verts, back_uvs));

    (front, back)
}
