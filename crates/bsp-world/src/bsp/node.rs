//! BSP node arena types.

use serde::{Deserialize, Serialize};

use crate::aabb::Aabb;
use crate::face::FaceIndex;
use crate::plane::Plane;
use crate::vis::ClusterId;

/// Index of a node in [`World::nodes`](crate::World::nodes).
pub type NodeIndex = usize;

/// `contents` value reported by internal nodes.
pub const CONTENTS_NODE: i32 = -1;
/// `contents` value of an ordinary empty-space leaf.
pub const CONTENTS_EMPTY: i32 = 0;

/// A node in the BSP arena.
///
/// Parents are stored as indices so the arena can be moved or serialized as
/// a plain vector. Only `visframe` changes after the build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BspNode {
    /// `None` for the root.
    pub parent: Option<NodeIndex>,
    /// Encloses every vertex of every face below this node.
    pub bounds: Aabb,
    /// Last visibility frame this node was marked in.
    pub visframe: u32,
    pub kind: NodeKind,
}

/// What a node holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    /// A split. `children` are `[front, back]`.
    /// Nodes built without a splitting plane have `plane: None`.
    Internal {
        plane: Option<Plane>,
        children: [NodeIndex; 2],
    },
    Leaf(BspLeaf),
}

/// The terminal part of a BSP node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BspLeaf {
    /// Non-negative contents classification.
    pub contents: i32,
    /// Assigned by clustering; `None` until then.
    pub cluster: Option<ClusterId>,
    pub faces: Vec<FaceIndex>,
}

impl BspNode {
    /// Creates a leaf node owning `faces`.
    pub fn leaf(parent: Option<NodeIndex>, bounds: Aabb, faces: Vec<FaceIndex>) -> Self {
        Self {
            parent,
            bounds,
            visframe: 0,
            kind: NodeKind::Leaf(BspLeaf {
                contents: CONTENTS_EMPTY,
                cluster: None,
                faces,
            }),
        }
    }

    /// Creates an internal node.
    pub fn internal(
        parent: Option<NodeIndex>,
        bounds: Aabb,
        plane: Option<Plane>,
        children: [NodeIndex; 2],
    ) -> Self {
        Self {
            parent,
            bounds,
            visframe: 0,
            kind: NodeKind::Internal { plane, children },
        }
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }

    /// `-1` for internal nodes, the leaf's contents otherwise.
    #[inline]
    pub fn contents(&self) -> i32 {
        match &self.kind {
            NodeKind::Internal { .. } => CONTENTS_NODE,
            NodeKind::Leaf(leaf) => leaf.contents,
        }
    }

    #[inline]
    pub fn as_leaf(&self) -> Option<&BspLeaf> {
        match &self.kind {
            NodeKind::Leaf(leaf) => Some(leaf),
            NodeKind::Internal { .. } => None,
        }
    }

    #[inline]
    pub fn as_leaf_mut(&mut self) -> Option<&mut BspLeaf> {
        match &mut self.kind {
            NodeKind::Leaf(leaf) => Some(leaf),
            NodeKind::Internal { .. } => None,
        }
    }

    /// `[front, back]` for internal nodes.
    #[inline]
    pub fn children(&self) -> Option<[NodeIndex; 2]> {
        match self.kind {
            NodeKind::Internal { children, .. } => Some(children),
            NodeKind::Leaf(_) => None,
        }
    }

    /// The splitting plane, if this is an internal node that has one.
    #[inline]
    pub fn plane(&self) -> Option<&Plane> {
        match &self.kind {
            NodeKind::Internal { plane, .. } => plane.as_ref(),
            NodeKind::Leaf(_) => None,
        }
    }

    /// The leaf's cluster.
    #[inline]
    pub fn cluster(&self) -> Option<ClusterId> {
        self.as_leaf().and_then(|leaf| leaf.cluster)
    }
}

/// Maximum depth of the subtree under `root` (1 for a lone leaf).
pub fn subtree_depth(nodes: &[BspNode], root: NodeIndex) -> usize {
    let mut max_depth = 0;
    let mut stack = vec![(root, 1)];
    while let Some((index, depth)) = stack.pop() {
        max_depth = max_depth.max(depth);
        if let Some([front, back]) = nodes[index].children() {
            stack.push((front, depth + 1));
            stack.push((back, depth + 1));
        }
    }
    max_depth
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Point3, Vector3};

    fn unit_box() -> Aabb {
        Aabb::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn new_leaf_is_unassigned() {
        let node = BspNode::leaf(None, unit_box(), vec![0, 1]);

        assert!(node.is_leaf());
        assert_eq!(node.contents(), CONTENTS_EMPTY);
        assert_eq!(node.cluster(), None);
        assert_eq!(node.visframe, 0);
        assert_eq!(node.as_leaf().unwrap().faces, vec![0, 1]);
        assert!(node.children().is_none());
    }

    #[test]
    fn internal_reports_contents_and_children() {
        let plane = Plane::new(Vector3::y(), 0.0);
        let node = BspNode::internal(None, unit_box(), plane, [1, 2]);

        assert!(!node.is_leaf());
        assert_eq!(node.contents(), CONTENTS_NODE);
        assert_eq!(node.children(), Some([1, 2]));
        assert!(node.plane().is_some());
        assert!(node.as_leaf().is_none());
    }

    #[test]
    fn depth_calculation() {
        let b = unit_box();
        // 0 -> (1 leaf, 2 -> (3 leaf, 4 leaf))
        let nodes = vec![
            BspNode::internal(None, b, None, [1, 2]),
            BspNode::leaf(Some(0), b, vec![]),
            BspNode::internal(Some(0), b, None, [3, 4]),
            BspNode::leaf(Some(2), b, vec![]),
            BspNode::leaf(Some(2), b, vec![]),
        ];
        assert_eq!(subtree_depth(&nodes, 0), 3);
        assert_eq!(subtree_depth(&nodes, 2), 2);
        assert_eq!(subtree_depth(&nodes, 4), 1);
    }
}
