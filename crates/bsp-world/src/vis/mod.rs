//! Visibility data: clusters, the cluster PVS and frustum culling.

mod cluster;
mod frustum;
mod pvs;

/// Dense cluster id in `0..num_clusters`.
pub type ClusterId = u32;

pub use cluster::{assign_clusters, collect_leaves, Cluster};
pub use frustum::{
    extract_frustum_planes, is_aabb_visible_in_frustum, Camera, Frustum, FRUSTUM_BOTTOM,
    FRUSTUM_FAR, FRUSTUM_LEFT, FRUSTUM_NEAR, FRUSTUM_RIGHT, FRUSTUM_TOP,
};
pub use pvs::{cluster_bytes, row_contains, PvsTable};
