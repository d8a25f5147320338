//! Error types for task-tree operations.

use astrotask_core::{NodeId, TaskId};
use miette::Diagnostic;
use thiserror::Error;

/// Result type for `astrotask-tree` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the task tree and its tracking overlay.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// A task referenced a parent id not present in the tree.
    #[error("task {task} names parent {parent}, which is not in this tree")]
    #[diagnostic(code(astrotask::tree::missing_parent))]
    MissingParent {
        /// The task with the dangling parent reference.
        task: TaskId,
        /// The missing parent id.
        parent: TaskId,
    },

    /// Two tasks in the same build shared an id.
    #[error("duplicate task id {id} while building the tree")]
    #[diagnostic(code(astrotask::tree::duplicate_id))]
    DuplicateId {
        /// The repeated id.
        id: TaskId,
    },

    /// A query or mutation referenced an id absent from the tree.
    #[error("no task {id} in this tree")]
    #[diagnostic(code(astrotask::tree::not_found))]
    NotFound {
        /// The missing id.
        id: NodeId,
    },

    /// `startWork` was attempted on a task with incomplete dependencies.
    #[error("task {task} is blocked by incomplete dependencies: {blocked_by:?}")]
    #[diagnostic(code(astrotask::tree::blocked))]
    Blocked {
        /// The task that cannot start.
        task: NodeId,
        /// The dependencies currently blocking it.
        blocked_by: Vec<NodeId>,
    },

    /// A dependency-graph operation was attempted before
    /// `withDependencyGraph` attached one.
    #[error("no dependency graph attached to this tree")]
    #[diagnostic(code(astrotask::tree::no_dependency_graph))]
    NoDependencyGraph,

    /// An error from the shared core vocabulary.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Core(#[from] astrotask_core::Error),
}
