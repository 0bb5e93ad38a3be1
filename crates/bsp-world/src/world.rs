//! The loaded level: BSP arena, clusters, PVS and per-frame visibility state.

use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace, warn};

use crate::bsp::{build_bsp_tree, BspNode, FaceVisitor, NodeIndex, NodeKind};
use crate::config::VisConfig;
use crate::error::{Result, WorldError};
use crate::face::Face;
use crate::vis::{assign_clusters, row_contains, Camera, Cluster, ClusterId, Frustum, PvsTable};

/// Counters from one [`World::traverse_for_rendering`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraversalStats {
    /// Nodes that passed the visframe check and were descended into.
    pub nodes_visited: usize,
    /// Subtrees dropped because their root was not marked this frame.
    pub nodes_skipped: usize,
    /// Nodes whose bounds were outside the frustum, whether or not that
    /// rejection was enforced.
    pub frustum_rejects: usize,
    pub faces_emitted: usize,
}

/// A static level prepared for visibility queries.
///
/// Built once by [`World::load`]. After that only the visibility stamps
/// change: [`World::mark_leaves`] advances the frame counter and stamps every
/// node that might be seen, and [`World::traverse_for_rendering`] hands the
/// faces under stamped nodes to a [`FaceVisitor`].
///
/// ```ignore
/// let mut world = World::load(faces);
/// loop {
///     world.mark_leaves(&camera.position);
///     world.traverse_for_rendering(&camera, &mut renderer);
/// }
/// ```
///
/// Deserialized worlds are checked with [`World::validate`] before use.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "StoredWorld")]
pub struct World {
    root: Option<NodeIndex>,
    nodes: Vec<BspNode>,
    faces: Vec<Face>,
    /// Every leaf, in cluster order.
    leaves: Vec<NodeIndex>,
    clusters: Vec<Cluster>,
    num_clusters: usize,
    cluster_bytes: usize,
    pvs: PvsTable,
    vis_count: u32,
    config: VisConfig,
}

/// Unchecked serialized form of [`World`].
#[derive(Deserialize)]
struct StoredWorld {
    root: Option<NodeIndex>,
    nodes: Vec<BspNode>,
    faces: Vec<Face>,
    leaves: Vec<NodeIndex>,
    clusters: Vec<Cluster>,
    num_clusters: usize,
    cluster_bytes: usize,
    pvs: PvsTable,
    vis_count: u32,
    config: VisConfig,
}

impl TryFrom<StoredWorld> for World {
    type Error = WorldError;

    fn try_from(stored: StoredWorld) -> Result<Self> {
        let world = Self {
            root: stored.root,
            nodes: stored.nodes,
            faces: stored.faces,
            leaves: stored.leaves,
            clusters: stored.clusters,
            num_clusters: stored.num_clusters,
            cluster_bytes: stored.cluster_bytes,
            pvs: stored.pvs,
            vis_count: stored.vis_count,
            config: stored.config,
        };
        world.validate()?;
        Ok(world)
    }
}

fn malformed(message: String) -> WorldError {
    WorldError::MalformedWorld(message)
}

impl World {
    /// Builds a world with the default configuration.
    ///
    /// An empty face list yields an invalid world; see [`World::is_valid`].
    pub fn load(faces: Vec<Face>) -> Self {
        Self::load_with(faces, VisConfig::default())
    }

    /// Builds a world: tree, then clusters, then the PVS.
    ///
    /// Never fails on degenerate geometry. An empty face list yields an
    /// invalid world on which marking and traversal do nothing.
    #[instrument(skip_all, fields(faces = faces.len()))]
    pub fn load_with(faces: Vec<Face>, config: VisConfig) -> Self {
        let Some(tree) = build_bsp_tree(faces, &config) else {
            warn!("no faces to build a world from");
            return Self {
                config,
                ..Self::default()
            };
        };

        let mut world = Self {
            root: Some(tree.root),
            nodes: tree.nodes,
            faces: tree.faces,
            config,
            ..Self::default()
        };
        world.build_clusters_from_leaves();
        world.generate_pvs_data();

        debug!(
            nodes = world.nodes.len(),
            leaves = world.leaves.len(),
            clusters = world.num_clusters,
            pvs_bytes = world.pvs.as_bytes().len(),
            "world loaded"
        );

        world
    }

    /// Like [`World::load_with`], but reports empty input and bad
    /// configuration as errors.
    pub fn try_load(faces: Vec<Face>, config: VisConfig) -> Result<Self> {
        config.validate()?;
        if faces.is_empty() {
            return Err(WorldError::EmptyInput);
        }
        Ok(Self::load_with(faces, config))
    }

    /// Checks that every index in the world is in range and the tree is
    /// acyclic.
    ///
    /// Builds write nodes in pre-order, so a child always has a larger index
    /// than its parent. That ordering is what rules out cycles here. A PVS
    /// with no clusters counts as unresolved and is accepted.
    pub fn validate(&self) -> Result<()> {
        let node_count = self.nodes.len();
        match self.root {
            Some(root) if root >= node_count => {
                return Err(malformed(format!("root {root} out of {node_count} nodes")));
            }
            None if node_count > 0 => {
                return Err(malformed("nodes without a root".to_string()));
            }
            _ => {}
        }

        for (index, node) in self.nodes.iter().enumerate() {
            if node.parent.is_some_and(|parent| parent >= index) {
                return Err(malformed(format!("node {index} has parent {:?}", node.parent)));
            }
            match &node.kind {
                NodeKind::Internal { children, .. } => {
                    for &child in children {
                        if child <= index || child >= node_count {
                            return Err(malformed(format!("node {index} has child {child}")));
                        }
                        if self.nodes[child].parent != Some(index) {
                            return Err(malformed(format!(
                                "node {child} does not point back to {index}"
                            )));
                        }
                    }
                }
                NodeKind::Leaf(leaf) => {
                    if let Some(face) = leaf.faces.iter().find(|&&face| face >= self.faces.len()) {
                        return Err(malformed(format!("leaf {index} references face {face}")));
                    }
                    if leaf.cluster.is_some_and(|cluster| cluster as usize >= self.num_clusters) {
                        return Err(malformed(format!(
                            "leaf {index} is in cluster {:?}",
                            leaf.cluster
                        )));
                    }
                }
            }
        }

        let not_a_leaf = |leaf: NodeIndex| self.nodes.get(leaf).is_none_or(|node| !node.is_leaf());
        if let Some(leaf) = self.leaves.iter().find(|&&leaf| not_a_leaf(leaf)) {
            return Err(malformed(format!("leaf list names node {leaf}")));
        }
        for cluster in &self.clusters {
            if let Some(leaf) = cluster.leaves.iter().find(|&&leaf| not_a_leaf(leaf)) {
                return Err(malformed(format!("cluster {} names node {leaf}", cluster.id)));
            }
        }

        if self.cluster_bytes != crate::vis::cluster_bytes(self.num_clusters) {
            return Err(malformed(format!(
                "{} bytes per PVS row for {} clusters",
                self.cluster_bytes, self.num_clusters
            )));
        }
        let pvs_clusters = self.pvs.num_clusters();
        if pvs_clusters != 0 && pvs_clusters != self.num_clusters {
            return Err(WorldError::PvsClusterCount {
                expected: self.num_clusters,
                actual: pvs_clusters,
            });
        }
        Ok(())
    }

    /// Returns `true` if the world has a tree.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.root.is_some()
    }

    #[inline]
    pub fn root(&self) -> Option<NodeIndex> {
        self.root
    }

    #[inline]
    pub fn nodes(&self) -> &[BspNode] {
        &self.nodes
    }

    /// The flattened face array that leaves index into.
    #[inline]
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    #[inline]
    pub fn leaves(&self) -> &[NodeIndex] {
        &self.leaves
    }

    #[inline]
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    #[inline]
    pub fn num_clusters(&self) -> usize {
        self.num_clusters
    }

    /// Bytes per PVS row.
    #[inline]
    pub fn cluster_bytes(&self) -> usize {
        self.cluster_bytes
    }

    #[inline]
    pub fn pvs(&self) -> &PvsTable {
        &self.pvs
    }

    /// The current visibility frame. Starts at 0.
    #[inline]
    pub fn vis_count(&self) -> u32 {
        self.vis_count
    }

    #[inline]
    pub fn config(&self) -> &VisConfig {
        &self.config
    }

    /// Assigns one cluster per leaf in pre-order and returns the ids.
    ///
    /// Invalidates the PVS; call [`World::generate_pvs_data`] or
    /// [`World::set_pvs`] afterwards.
    pub fn build_clusters_from_leaves(&mut self) -> Vec<ClusterId> {
        let Some(root) = self.root else {
            return Vec::new();
        };

        self.clusters = assign_clusters(&mut self.nodes, root);
        self.leaves = self
            .clusters
            .iter()
            .flat_map(|cluster| cluster.leaves.iter().copied())
            .collect();
        self.num_clusters = self.clusters.len();
        self.cluster_bytes = crate::vis::cluster_bytes(self.num_clusters);

        self.clusters.iter().map(|cluster| cluster.id).collect()
    }

    /// Fills the PVS so every cluster sees every cluster.
    pub fn generate_pvs_data(&mut self) {
        self.pvs = PvsTable::all_visible(self.num_clusters);
    }

    /// Installs visibility data compiled elsewhere.
    pub fn set_pvs(&mut self, pvs: PvsTable) -> Result<()> {
        if pvs.num_clusters() != self.num_clusters {
            return Err(WorldError::PvsClusterCount {
                expected: self.num_clusters,
                actual: pvs.num_clusters(),
            });
        }
        self.pvs = pvs;
        Ok(())
    }

    /// The PVS row for `cluster`, or `None` if it is out of range.
    pub fn cluster_pvs(&self, cluster: ClusterId) -> Option<&[u8]> {
        self.pvs.row(cluster)
    }

    /// Returns true if `to` may be seen from `from`. Unknown ids count as visible.
    pub fn is_cluster_visible(&self, from: ClusterId, to: ClusterId) -> bool {
        self.pvs.is_visible(from, to)
    }

    /// Descends from the root to the leaf containing `point`.
    ///
    /// Points on a plane go to the front child; nodes without a plane send
    /// everything to their first child.
    pub fn find_leaf_for_point(&self, point: &Point3<f32>) -> Option<NodeIndex> {
        let mut index = self.root?;
        // a well-formed arena never needs more steps than it has nodes
        for _ in 0..=self.nodes.len() {
            match &self.nodes.get(index)?.kind {
                NodeKind::Leaf(_) => return Some(index),
                NodeKind::Internal { plane, children } => {
                    index = match plane {
                        Some(plane) if plane.signed_distance(point) < 0.0 => children[1],
                        _ => children[0],
                    };
                }
            }
        }
        None
    }

    /// Starts a new visibility frame and stamps every node that may be seen
    /// from `position`.
    ///
    /// Each leaf in the PVS of the camera's cluster is stamped together with
    /// its ancestors. If the camera leaf or its PVS row cannot be resolved,
    /// every node is stamped instead.
    ///
    /// The frame counter wraps after `u32::MAX` frames without any special
    /// handling.
    #[instrument(level = "trace", skip_all)]
    pub fn mark_leaves(&mut self, position: &Point3<f32>) {
        if self.root.is_none() {
            return;
        }

        self.vis_count = self.vis_count.wrapping_add(1);
        let frame = self.vis_count;

        let camera_cluster = self
            .find_leaf_for_point(position)
            .and_then(|leaf| self.nodes.get(leaf))
            .and_then(BspNode::cluster);
        let Some(row) = camera_cluster.and_then(|cluster| self.pvs.row(cluster)) else {
            warn!(?camera_cluster, "camera cluster has no PVS row, marking everything");
            for node in &mut self.nodes {
                node.visframe = frame;
            }
            return;
        };

        let mut stamped = 0;
        for &leaf in &self.leaves {
            let visible = self
                .nodes
                .get(leaf)
                .and_then(BspNode::cluster)
                .is_none_or(|cluster| row_contains(row, cluster));
            if visible {
                stamped += stamp_upwards(&mut self.nodes, leaf, frame);
            }
        }

        trace!(frame, ?camera_cluster, stamped, "marked leaves");
    }

    /// Walks the tree front to back and passes every face under a node
    /// stamped this frame to `visitor`.
    ///
    /// Node bounds are tested against the camera frustum on the way down.
    /// The result is counted always but only prunes the walk when
    /// [`VisConfig::frustum_culling`] is set.
    #[instrument(level = "trace", skip_all)]
    pub fn traverse_for_rendering<V>(&self, camera: &Camera, visitor: &mut V) -> TraversalStats
    where
        V: FaceVisitor + ?Sized,
    {
        let mut stats = TraversalStats::default();
        let Some(root) = self.root else {
            return stats;
        };

        let frustum = Frustum::extract(camera, self.config.near_clip, self.config.far_clip);
        let mut stack = vec![root];

        while let Some(index) = stack.pop() {
            let Some(node) = self.nodes.get(index) else {
                continue;
            };
            if node.visframe != self.vis_count {
                stats.nodes_skipped += 1;
                continue;
            }
            if !frustum.is_bounds_visible(&node.bounds) {
                stats.frustum_rejects += 1;
                if self.config.frustum_culling {
                    continue;
                }
            }
            stats.nodes_visited += 1;

            match &node.kind {
                NodeKind::Internal {
                    children: [front, back],
                    ..
                } => {
                    stack.push(*back);
                    stack.push(*front);
                }
                NodeKind::Leaf(leaf) => {
                    for &face_index in &leaf.faces {
                        if let Some(face) = self.faces.get(face_index) {
                            visitor.visit(face_index, face);
                            stats.faces_emitted += 1;
                        }
                    }
                }
            }
        }

        trace!(frame = self.vis_count, ?stats, "traversed world");
        stats
    }
}

/// Stamps `leaf` and its ancestors up to the first one already stamped with
/// `frame`. Returns how many nodes changed.
fn stamp_upwards(nodes: &mut [BspNode], leaf: NodeIndex, frame: u32) -> usize {
    let mut stamped = 0;
    let mut current = Some(leaf);
    while let Some(index) = current {
        let Some(node) = nodes.get_mut(index) else {
            break;
        };
        if node.visframe == frame {
            break;
        }
        node.visframe = frame;
        stamped += 1;
        current = node.parent;
    }
    stamped
}
