//! Splitting-face selection strategies for recursive builds.
//!
//! The choice of splitting plane affects tree balance and how many faces get
//! cut during construction.

use crate::config::SplitterHeuristic;
use crate::face::{classify_face, plane_from_face, Face};
use crate::plane::Classification;

/// Weight of one cut face against one face of front/back imbalance.
pub const SPLIT_COST: usize = 8;

/// Strategy for selecting which face's plane splits a node.
pub trait SplitterSelector {
    /// Picks the index of a splitter among `faces` whose `candidates[i]` is true.
    ///
    /// Returns `None` if no candidate has a usable plane.
    fn select(&self, faces: &[Face], candidates: &[bool]) -> Option<usize>;
}

/// Selects the first usable face.
///
/// Fast, but tree quality depends entirely on input order.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstFace;

impl SplitterSelector for FirstFace {
    fn select(&self, faces: &[Face], candidates: &[bool]) -> Option<usize> {
        faces
            .iter()
            .zip(candidates)
            .position(|(face, &candidate)| candidate && !face.is_degenerate())
    }
}

/// Selects the face whose plane minimises `SPLIT_COST * splits + |front - back|`.
///
/// Quadratic in the face count, which is fine for a load-time build.
#[derive(Debug, Clone, Copy, Default)]
pub struct BalancedSplitter;

impl SplitterSelector for BalancedSplitter {
    fn select(&self, faces: &[Face], candidates: &[bool]) -> Option<usize> {
        let mut best: Option<(usize, usize)> = None;

        for (index, face) in faces.iter().enumerate() {
            if !candidates[index] {
                continue;
            }
            let Some(plane) = plane_from_face(face) else {
                continue;
            };

            let mut front = 0usize;
            let mut back = 0usize;
            let mut splits = 0usize;
            for (other_index, other) in faces.iter().enumerate() {
                if other_index == index {
                    continue;
                }
                match classify_face(other, &plane) {
                    Classification::Front => front += 1,
                    Classification::Back => back += 1,
                    Classification::Spanning => splits += 1,
                    Classification::Coplanar => {}
                }
            }

            let cost = SPLIT_COST * splits + front.abs_diff(back);
            if best.is_none_or(|(_, best_cost)| cost < best_cost) {
                best = Some((index, cost));
            }
        }

        best.map(|(index, _)| index)
    }
}

/// Picks a splitting face with the default heuristic.
///
/// Every face is a candidate. Returns `None` when all faces are degenerate.
pub fn choose_splitter_face(faces: &[Face]) -> Option<usize> {
    BalancedSplitter.select(faces, &vec![true; faces.len()])
}

impl SplitterHeuristic {
    /// Returns the selector this heuristic names.
    pub fn selector(self) -> &'static dyn SplitterSelector {
        match self {
            SplitterHeuristic::First => &FirstFace,
            SplitterHeuristic::Balanced => &BalancedSplitter,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::face::MaterialId;
    use nalgebra::Point3;

    fn make_triangle(a: [f32; 3], b: [f32; 3], c: [f32; 3]) -> Face {
        Face::new(
            vec![
                Point3::new(a[0], a[1], a[2]),
                Point3::new(b[0], b[1], b[2]),
                Point3::new(c[0], c[1], c[2]),
            ],
            MaterialId(0),
        )
    }

    fn degenerate() -> Face {
        make_triangle([1.0, 1.0, 1.0], [1.0, 1.0, 1.0], [1.0, 1.0, 1.0])
    }

    #[test]
    fn empty_list_has_no_splitter() {
        assert!(choose_splitter_face(&[]).is_none());
        assert!(FirstFace.select(&[], &[]).is_none());
    }

    #[test]
    fn all_degenerate_has_no_splitter() {
        let faces = vec![degenerate(), degenerate()];
        assert!(choose_splitter_face(&faces).is_none());
        assert!(FirstFace.select(&faces, &[true, true]).is_none());
    }

    #[test]
    fn first_face_skips_non_candidates_and_degenerate() {
        let faces = vec![
            make_triangle([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            degenerate(),
            make_triangle([0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [0.0, 1.0, 1.0]),
        ];
        assert_eq!(FirstFace.select(&faces, &[true, true, true]), Some(0));
        assert_eq!(FirstFace.select(&faces, &[false, true, true]), Some(2));
    }

    #[test]
    fn balanced_prefers_the_middle_plane() {
        // three parallel triangles at z = 0, 1, 2
        let faces = vec![
            make_triangle([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            make_triangle([0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [0.0, 1.0, 1.0]),
            make_triangle([0.0, 0.0, 2.0], [1.0, 0.0, 2.0], [0.0, 1.0, 2.0]),
        ];
        assert_eq!(choose_splitter_face(&faces), Some(1));
    }

    #[test]
    fn balanced_avoids_splitting() {
        // face 0 is a vertical wall at x = 0.5 that would cut face 1 (floor)
        let faces = vec![
            make_triangle([0.5, 0.0, 0.0], [0.5, 1.0, 0.0], [0.5, 0.0, 1.0]),
            make_triangle([0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]),
        ];
        assert_eq!(choose_splitter_face(&faces), Some(1));
    }

    #[test]
    fn heuristic_maps_to_selector() {
        let faces = vec![
            make_triangle([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            make_triangle([0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [0.0, 1.0, 1.0]),
            make_triangle([0.0, 0.0, 2.0], [1.0, 0.0, 2.0], [0.0, 1.0, 2.0]),
        ];
        let all = [true, true, true];
        assert_eq!(SplitterHeuristic::First.selector().select(&faces, &all), Some(0));
        assert_eq!(SplitterHeuristic::Balanced.selector().select(&faces, &all), Some(1));
    }
}
