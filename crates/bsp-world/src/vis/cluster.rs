//! Grouping leaves into visibility clusters.

use serde::{Deserialize, Serialize};

use crate::aabb::Aabb;
use crate::bsp::{BspNode, NodeIndex};

use super::ClusterId;

/// A visibility cell made of one or more leaves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: ClusterId,
    /// Union of the member leaves' bounds.
    pub bounds: Aabb,
    pub leaves: Vec<NodeIndex>,
}

/// Collects leaf indices in pre-order (front child before back child).
pub fn collect_leaves(nodes: &[BspNode], root: NodeIndex) -> Vec<NodeIndex> {
    let mut leaves = Vec::new();
    let mut stack = vec![root];
    while let Some(index) = stack.pop() {
        match nodes[index].children() {
            Some([front, back]) => {
                stack.push(back);
                stack.push(front);
            }
            None => leaves.push(index),
        }
    }
    leaves
}

/// Gives every leaf under `root` its own cluster, numbered in pre-order.
///
/// Writes the id into each leaf and returns the clusters, whose ids are
/// exactly `0..clusters.len()`.
pub fn assign_clusters(nodes: &mut [BspNode], root: NodeIndex) -> Vec<Cluster> {
    let leaves = collect_leaves(nodes, root);
    let mut clusters = Vec::with_capacity(leaves.len());

    for (id, &leaf_index) in leaves.iter().enumerate() {
        let id = id as ClusterId;
        let node = &mut nodes[leaf_index];
        if let Some(leaf) = node.as_leaf_mut() {
            leaf.cluster = Some(id);
        }
        clusters.push(Cluster {
            id,
            bounds: node.bounds,
            leaves: vec![leaf_index],
        });
    }

    clusters
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn make_tree() -> Vec<BspNode> {
        let b = Aabb::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        // 0 -> (1 -> (2 leaf, 3 leaf), 4 leaf)
        vec![
            BspNode::internal(None, b, None, [1, 4]),
            BspNode::internal(Some(0), b, None, [2, 3]),
            BspNode::leaf(Some(1), b, vec![0]),
            BspNode::leaf(Some(1), b, vec![1]),
            BspNode::leaf(Some(0), b, vec![2]),
        ]
    }

    #[test]
    fn leaves_come_out_in_pre_order() {
        let nodes = make_tree();
        assert_eq!(collect_leaves(&nodes, 0), vec![2, 3, 4]);
        assert_eq!(collect_leaves(&nodes, 1), vec![2, 3]);
        assert_eq!(collect_leaves(&nodes, 4), vec![4]);
    }

    #[test]
    fn one_cluster_per_leaf_with_dense_ids() {
        let mut nodes = make_tree();
        let clusters = assign_clusters(&mut nodes, 0);

        assert_eq!(clusters.len(), 3);
        for (expected, cluster) in clusters.iter().enumerate() {
            assert_eq!(cluster.id as usize, expected);
            assert_eq!(cluster.leaves.len(), 1);
            assert_eq!(nodes[cluster.leaves[0]].cluster(), Some(cluster.id));
        }
        assert_eq!(nodes[0].cluster(), None);
    }
}
