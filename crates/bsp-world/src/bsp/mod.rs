//! Binary Space Partitioning tree over level faces.
//!
//! The tree lives in a flat arena of [`BspNode`]s addressed by index, with
//! parent links stored as indices. Internal nodes carry an optional
//! splitting plane; leaves own face indices and a visibility cluster.
//!
//! # Example
//!
//! ```ignore
//! use bsp_world::bsp::build_bsp_tree;
//! use bsp_world::VisConfig;
//!
//! let faces: Vec<Face> = /* from the level loader */;
//! let tree = build_bsp_tree(faces, &VisConfig::default()).expect("non-empty");
//! assert!(tree.nodes[tree.root].is_leaf());
//! ```
//!
//! # Architecture
//!
//! - [`BspBuilder`]: turns faces into an arena according to a [`BuildPolicy`](crate::BuildPolicy)
//! - [`BspNode`]: internal split or leaf
//! - [`SplitterSelector`]: strategy trait for choosing splitting faces
//! - [`FaceVisitor`]: receives faces during rendering traversal

mod builder;
mod node;
mod selector;
mod visitor;

pub use builder::{build_bsp_tree, BspBuilder, BuiltTree};
pub use node::{subtree_depth, BspLeaf, BspNode, NodeIndex, NodeKind, CONTENTS_EMPTY, CONTENTS_NODE};
pub use selector::{choose_splitter_face, BalancedSplitter, FirstFace, SplitterSelector, SPLIT_COST};
pub use visitor::{CollectingVisitor, FaceVisitor, FnVisitor};
