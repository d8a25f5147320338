//! Hierarchical task tree, effective-status semantics, and
//! availability queries.
//!
//! [`TaskTree`] is the immutable read model over a flat collection of
//! [`astrotask_core::Task`]s: navigation, traversal, path queries, and
//! the cascading effective-status rule. [`TrackingTaskTree`] overlays
//! it with in-place-applied, recorded structural and field edits, plus
//! an optionally attached [`astrotask_graph::TrackingDependencyGraph`]
//! for availability and next-task queries.

mod error;
mod tracking;
mod tree;

pub use error::{Error, Result};
pub use tracking::TrackingTaskTree;
pub use tree::{TaskTree, TreeNode};
