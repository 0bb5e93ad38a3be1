//! Build and culling configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Result, WorldError};

/// How the builder partitions faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BuildPolicy {
    /// Every face goes into a single leaf. No splitting happens.
    #[default]
    SingleLeaf,
    /// Classic recursive partitioning on face planes, capped at `max_depth`.
    Recursive { max_depth: usize },
}

/// Heuristic used to pick the splitting face in recursive builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SplitterHeuristic {
    /// First usable face in the list.
    First,
    /// Lowest `8 * splits + |front - back|` cost.
    #[default]
    Balanced,
}

/// Settings for building a [`World`](crate::World) and culling it each frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisConfig {
    pub build_policy: BuildPolicy,
    pub splitter: SplitterHeuristic,
    /// Distance from the eye to the near frustum plane.
    pub near_clip: f32,
    /// Distance from the eye to the far frustum plane.
    pub far_clip: f32,
    /// When false the frustum test is evaluated and counted but never rejects a node.
    pub frustum_culling: bool,
}

impl Default for VisConfig {
    fn default() -> Self {
        Self {
            build_policy: BuildPolicy::SingleLeaf,
            splitter: SplitterHeuristic::Balanced,
            near_clip: 0.1,
            far_clip: 4096.0,
            frustum_culling: false,
        }
    }
}

impl VisConfig {
    /// Checks that clip distances are usable and the build policy terminates.
    pub fn validate(&self) -> Result<()> {
        if !self.near_clip.is_finite() || self.near_clip < 0.0 {
            return Err(WorldError::InvalidConfig(format!(
                "near_clip must be finite and non-negative, got {}",
                self.near_clip
            )));
        }
        if !self.far_clip.is_finite() || self.far_clip <= 0.0 {
            return Err(WorldError::InvalidConfig(format!(
                "far_clip must be finite and positive, got {}",
                self.far_clip
            )));
        }
        if self.near_clip >= self.far_clip {
            return Err(WorldError::InvalidConfig(format!(
                "near_clip ({}) must be less than far_clip ({})",
                self.near_clip, self.far_clip
            )));
        }
        if let BuildPolicy::Recursive { max_depth: 0 } = self.build_policy {
            return Err(WorldError::InvalidConfig(
                "recursive build needs max_depth of at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
