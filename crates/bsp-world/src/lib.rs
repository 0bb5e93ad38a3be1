//! Static-world visibility: BSP partitioning, cluster PVS and frustum culling.
//!
//! A level is handed over once as a flat list of [`Face`]s. [`World::load`]
//! builds a BSP arena over them, groups its leaves into clusters and fills a
//! cluster-to-cluster PVS. Every frame the caller stamps what the camera may
//! see with [`World::mark_leaves`] and then collects the faces to draw with
//! [`World::traverse_for_rendering`].
//!
//! ```ignore
//! use bsp_world::{Camera, CollectingVisitor, World};
//!
//! let mut world = World::load(faces);
//! world.mark_leaves(&camera.position);
//!
//! let mut visitor = CollectingVisitor::new();
//! world.traverse_for_rendering(&camera, &mut visitor);
//! ```

pub mod aabb;
pub mod bsp;
pub mod config;
pub mod error;
pub mod face;
pub mod plane;
pub mod split;
pub mod vis;
mod world;

pub use aabb::Aabb;
pub use bsp::{BspNode, CollectingVisitor, FaceVisitor, FnVisitor, NodeIndex, SplitterSelector};
pub use config::{BuildPolicy, SplitterHeuristic, VisConfig};
pub use error::{Result, WorldError};
pub use face::{
    classify_face, plane_from_face, Face, FaceFlags, FaceIndex, MaterialId, RenderMode,
};
pub use plane::{
    box_on_plane_side, Classification, Plane, PlaneSide, PlaneType, PLANE_EPSILON, SIDE_BACK,
    SIDE_CROSS, SIDE_FRONT,
};
pub use split::split_face_by_plane;
pub use vis::{Camera, Cluster, ClusterId, Frustum, PvsTable};
pub use world::{TraversalStats, World};
