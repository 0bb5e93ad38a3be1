//! Tree construction from a flat face list.

use tracing::debug;

use crate::aabb::Aabb;
use crate::config::{BuildPolicy, VisConfig};
use crate::face::{classify_face, faces_same_direction, plane_from_face, Face, FaceIndex};
use crate::plane::Classification;
use crate::split::split_face_by_plane;

use super::node::{subtree_depth, BspNode, NodeIndex, NodeKind};
use super::selector::SplitterSelector;

/// Output of a build: the node arena and the faces the leaves index into.
///
/// Under the single-leaf policy `faces` is the input in its original order.
/// Recursive builds may replace a face with the fragments it was cut into.
#[derive(Debug, Clone)]
pub struct BuiltTree {
    pub root: NodeIndex,
    pub nodes: Vec<BspNode>,
    pub faces: Vec<Face>,
}

/// Builds BSP trees according to a [`BuildPolicy`].
pub struct BspBuilder<'a> {
    policy: BuildPolicy,
    selector: &'a dyn SplitterSelector,
}

impl<'a> BspBuilder<'a> {
    pub fn new(policy: BuildPolicy, selector: &'a dyn SplitterSelector) -> Self {
        Self { policy, selector }
    }

    /// Builds a tree. Returns `None` for an empty face list.
    pub fn build(&self, faces: Vec<Face>) -> Option<BuiltTree> {
        if faces.is_empty() {
            return None;
        }

        let tree = match self.policy {
            BuildPolicy::SingleLeaf => build_single_leaf(faces),
            BuildPolicy::Recursive { max_depth } => {
                let mut state = RecursiveBuild {
                    nodes: Vec::new(),
                    faces: Vec::with_capacity(faces.len()),
                    selector: self.selector,
                    max_depth: max_depth.max(1),
                };
                let candidates = vec![true; faces.len()];
                let root = state.build_node(faces, candidates, None, 1);
                BuiltTree {
                    root,
                    nodes: state.nodes,
                    faces: state.faces,
                }
            }
        };

        debug!(
            nodes = tree.nodes.len(),
            leaves = tree.nodes.iter().filter(|n| n.is_leaf()).count(),
            faces = tree.faces.len(),
            depth = subtree_depth(&tree.nodes, tree.root),
            "built BSP tree"
        );

        Some(tree)
    }
}

/// Builds a tree using the policy and splitter named in `config`.
pub fn build_bsp_tree(faces: Vec<Face>, config: &VisConfig) -> Option<BuiltTree> {
    BspBuilder::new(config.build_policy, config.splitter.selector()).build(faces)
}

/// Places every face in one leaf.
fn build_single_leaf(faces: Vec<Face>) -> BuiltTree {
    let mut bounds = Aabb::empty();
    for face in &faces {
        for vertex in face.vertices() {
            bounds.encapsulate(vertex);
        }
    }

    let indices: Vec<FaceIndex> = (0..faces.len()).collect();
    BuiltTree {
        root: 0,
        nodes: vec![BspNode::leaf(None, bounds, indices)],
        faces,
    }
}

struct RecursiveBuild<'a> {
    nodes: Vec<BspNode>,
    faces: Vec<Face>,
    selector: &'a dyn SplitterSelector,
    max_depth: usize,
}

impl RecursiveBuild<'_> {
    /// `candidates[i]` is false once face `i`'s plane has been used on the
    /// path from the root, which guarantees progress even without the depth cap.
    fn build_node(
        &mut self,
        faces: Vec<Face>,
        candidates: Vec<bool>,
        parent: Option<NodeIndex>,
        depth: usize,
    ) -> NodeIndex {
        if faces.is_empty() || depth >= self.max_depth {
            return self.push_leaf(faces, parent);
        }

        let Some(plane) = self
            .selector
            .select(&faces, &candidates)
            .and_then(|index| plane_from_face(&faces[index]))
        else {
            return self.push_leaf(faces, parent);
        };

        let mut front = (Vec::new(), Vec::new());
        let mut back = (Vec::new(), Vec::new());

        for (face, candidate) in faces.into_iter().zip(candidates) {
            match classify_face(&face, &plane) {
                Classification::Front => {
                    front.0.push(face);
                    front.1.push(candidate);
                }
                Classification::Back => {
                    back.0.push(face);
                    back.1.push(candidate);
                }
                Classification::Coplanar => {
                    if faces_same_direction(&face, &plane) {
                        front.0.push(face);
                        front.1.push(false);
                    } else {
                        back.0.push(face);
                        back.1.push(false);
                    }
                }
                Classification::Spanning => {
                    let (front_part, back_part) = split_face_by_plane(&face, &plane);
                    if let Some(f) = front_part {
                        front.0.push(f);
                        front.1.push(candidate);
                    }
                    if let Some(b) = back_part {
                        back.0.push(b);
                        back.1.push(candidate);
                    }
                }
            }
        }

        let index = self.nodes.len();
        self.nodes
            .push(BspNode::internal(parent, Aabb::empty(), Some(plane), [index, index]));

        let front_child = self.build_node(front.0, front.1, Some(index), depth + 1);
        let back_child = self.build_node(back.0, back.1, Some(index), depth + 1);

        let mut bounds = self.nodes[front_child].bounds;
        bounds.union_with(&self.nodes[back_child].bounds);

        let node = &mut self.nodes[index];
        node.bounds = bounds;
        node.kind = NodeKind::Internal {
            plane: Some(plane),
            children: [front_child, back_child],
        };

        index
    }

    fn push_leaf(&mut self, faces: Vec<Face>, parent: Option<NodeIndex>) -> NodeIndex {
        let mut bounds = Aabb::empty();
        let mut indices = Vec::with_capacity(faces.len());
        for face in faces {
            for vertex in face.vertices() {
                bounds.encapsulate(vertex);
            }
            indices.push(self.faces.len());
            self.faces.push(face);
        }

        let index = self.nodes.len();
        self.nodes.push(BspNode::leaf(parent, bounds, indices));
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsp::selector::{BalancedSplitter, FirstFace};
    use crate::face::MaterialId;
    use crate::plane::PlaneSide;
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

    fn recursive(max_depth: usize) -> BspBuilder<'static> {
        BspBuilder::new(BuildPolicy::Recursive { max_depth }, &BalancedSplitter)
    }

    fn leaf_face_count(tree: &BuiltTree) -> usize {
        tree.nodes
            .iter()
            .filter_map(|n| n.as_leaf())
            .map(|leaf| leaf.faces.len())
            .sum()
    }

    #[test]
    fn build_empty() {
        let builder = BspBuilder::new(BuildPolicy::SingleLeaf, &FirstFace);
        assert!(builder.build(vec![]).is_none());
        assert!(recursive(8).build(vec![]).is_none());
    }

    #[test]
    fn build_single_face() {
        let face = make_triangle([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        let tree = build_bsp_tree(vec![face.clone()], &VisConfig::default()).unwrap();

        assert_eq!(tree.nodes.len(), 1);
        assert_eq!(tree.root, 0);
        let leaf = tree.nodes[0].as_leaf().unwrap();
        assert_eq!(leaf.faces, vec![0]);
        assert_eq!(tree.faces, vec![face]);
    }

    #[test]
    fn single_leaf_keeps_order_and_bounds() {
        let faces = vec![
            make_triangle([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            make_triangle([0.0, 0.0, 5.0], [1.0, 0.0, 5.0], [0.0, -2.0, 5.0]),
            make_triangle([-3.0, 0.0, 0.0], [-3.0, 1.0, 0.0], [-3.0, 0.0, 1.0]),
        ];
        let tree = build_bsp_tree(faces.clone(), &VisConfig::default()).unwrap();

        assert_eq!(tree.nodes.len(), 1);
        assert_eq!(tree.faces, faces);
        assert_eq!(tree.nodes[0].as_leaf().unwrap().faces, vec![0, 1, 2]);
        assert_eq!(tree.nodes[0].bounds.mins, Point3::new(-3.0, -2.0, 0.0));
        assert_eq!(tree.nodes[0].bounds.maxs, Point3::new(1.0, 1.0, 5.0));
    }

    #[test]
    fn degenerate_faces_are_tolerated() {
        let faces = vec![
            make_triangle([2.0, 2.0, 2.0], [2.0, 2.0, 2.0], [2.0, 2.0, 2.0]),
            Face::new(vec![], MaterialId(1)),
        ];
        let tree = build_bsp_tree(faces.clone(), &VisConfig::default()).unwrap();
        let bounds = tree.nodes[0].bounds;
        assert_eq!(bounds.mins, Point3::new(2.0, 2.0, 2.0));
        assert_eq!(bounds.maxs, Point3::new(2.0, 2.0, 2.0));

        let tree = recursive(8).build(faces).unwrap();
        assert_eq!(leaf_face_count(&tree), 2);
    }

    #[test]
    fn recursive_separates_parallel_faces() {
        let faces = vec![
            make_triangle([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            make_triangle([0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [0.0, 1.0, 1.0]),
            make_triangle([0.0, 0.0, 2.0], [1.0, 0.0, 2.0], [0.0, 1.0, 2.0]),
        ];
        let tree = recursive(16).build(faces).unwrap();

        assert_eq!(tree.faces.len(), 3);
        assert_eq!(leaf_face_count(&tree), 3);
        assert!(!tree.nodes[tree.root].is_leaf());
        assert!(subtree_depth(&tree.nodes, tree.root) >= 2);
    }

    #[test]
    fn recursive_splits_spanning_faces() {
        let splitter = make_triangle([0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]);
        let spanning = make_triangle([-0.5, -1.0, 0.5], [0.5, 1.0, 0.5], [0.5, -1.0, 0.5]);

        // depth 2 stops right after the first split
        let builder = BspBuilder::new(BuildPolicy::Recursive { max_depth: 2 }, &FirstFace);
        let tree = builder.build(vec![splitter, spanning]).unwrap();

        // the spanning triangle became two fragments
        assert_eq!(tree.faces.len(), 3);
        assert_eq!(leaf_face_count(&tree), 3);
    }

    #[test]
    fn every_face_lands_in_exactly_one_leaf() {
        let faces = vec![
            make_triangle([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            make_triangle([0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
            make_triangle([0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]),
            make_triangle([-1.0, -1.0, 0.5], [2.0, -1.0, 0.5], [-1.0, 2.0, 0.5]),
        ];
        let tree = recursive(16).build(faces).unwrap();

        let mut seen = vec![0usize; tree.faces.len()];
        for leaf in tree.nodes.iter().filter_map(|n| n.as_leaf()) {
            for &face in &leaf.faces {
                seen[face] += 1;
            }
        }
        assert!(seen.iter().all(|&count| count == 1));
    }

    #[test]
    fn parents_and_bounds_are_consistent() {
        let faces = vec![
            make_triangle([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            make_triangle([0.0, 0.0, 3.0], [1.0, 0.0, 3.0], [0.0, 1.0, 3.0]),
            make_triangle([4.0, 0.0, 0.0], [4.0, 1.0, 0.0], [4.0, 0.0, 1.0]),
        ];
        let tree = recursive(16).build(faces).unwrap();

        assert_eq!(tree.nodes[tree.root].parent, None);
        for (index, node) in tree.nodes.iter().enumerate() {
            if let Some(children) = node.children() {
                for child in children {
                    assert_eq!(tree.nodes[child].parent, Some(index));
                    assert!(node.bounds.contains(&tree.nodes[child].bounds));
                }
            }
        }
    }

    #[test]
    fn recursive_leaves_sit_on_the_correct_side() {
        let faces = vec![
            make_triangle([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            make_triangle([0.0, 0.0, 2.0], [1.0, 0.0, 2.0], [0.0, 1.0, 2.0]),
            make_triangle([0.0, 0.0, -2.0], [1.0, 0.0, -2.0], [0.0, 1.0, -2.0]),
        ];
        let tree = recursive(16).build(faces).unwrap();

        let root = &tree.nodes[tree.root];
        let plane = root.plane().unwrap();
        let [front, back] = root.children().unwrap();

        for (child, side) in [(front, PlaneSide::Front), (back, PlaneSide::Back)] {
            let mut stack = vec![child];
            while let Some(index) = stack.pop() {
                match tree.nodes[index].children() {
                    Some(children) => stack.extend(children),
                    None => {
                        for &face in &tree.nodes[index].as_leaf().unwrap().faces {
                            for v in tree.faces[face].vertices() {
                                let got = plane.classify_point(v);
                                assert!(got == side || got == PlaneSide::OnPlane);
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn depth_cap_is_honoured() {
        let faces: Vec<Face> = (0..10)
            .map(|i| {
                let z = i as f32;
                make_triangle([0.0, 0.0, z], [1.0, 0.0, z], [0.0, 1.0, z])
            })
            .collect();
        let builder = BspBuilder::new(BuildPolicy::Recursive { max_depth: 3 }, &FirstFace);
        let tree = builder.build(faces).unwrap();

        assert!(subtree_depth(&tree.nodes, tree.root) <= 3);
        assert_eq!(leaf_face_count(&tree), 10);
    }
}
