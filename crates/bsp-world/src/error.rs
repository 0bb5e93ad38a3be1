//! Error types for world construction.

use thiserror::Error;

/// Errors raised while building or configuring a [`World`](crate::World).
///
/// Per-frame visibility never fails; only construction-time input is checked.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WorldError {
    /// No faces were supplied.
    #[error("cannot build a world from an empty face list")]
    EmptyInput,

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Visibility data has the wrong byte length for its cluster count.
    #[error("PVS buffer is {actual} bytes, expected {expected}")]
    PvsSize { expected: usize, actual: usize },

    /// Visibility data was compiled for a different number of clusters.
    #[error("PVS table covers {actual} clusters, world has {expected}")]
    PvsClusterCount { expected: usize, actual: usize },

    /// Stored world data does not describe a well-formed node arena.
    #[error("malformed world: {0}")]
    MalformedWorld(String),
}

/// Result type alias using [`WorldError`].
pub type Result<T> = std::result::Result<T, WorldError>;
