//! Error types for dependency-graph operations.

use astrotask_core::TaskId;
use miette::Diagnostic;
use thiserror::Error;

/// Result type for `astrotask-graph` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the dependency graph and its tracking overlay.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// A proposed edge was rejected because it would create a cycle.
    #[error("adding dependency {dependent} -> {dependency} would create a cycle: {cycle:?}")]
    #[diagnostic(
        code(astrotask::graph::would_cycle),
        help("remove a conflicting edge, or drop this one, before retrying")
    )]
    WouldCreateCycle {
        /// The task that would depend on `dependency`.
        dependent: TaskId,
        /// The task that would become a dependency.
        dependency: TaskId,
        /// The cycle that would result, as a path of ids.
        cycle: Vec<TaskId>,
    },

    /// A self-edge was rejected (a task cannot depend on itself).
    #[error("task {task} cannot depend on itself")]
    #[diagnostic(code(astrotask::graph::self_edge))]
    SelfDependency {
        /// The offending task.
        task: TaskId,
    },

    /// Topological ordering failed because the graph contains a cycle.
    #[error("cannot compute a topological order: the graph contains a cycle")]
    #[diagnostic(code(astrotask::graph::cyclic))]
    TopologicalSortFailed {
        /// One of the cycles blocking the sort.
        cycle: Vec<TaskId>,
    },

    /// An error from the shared core vocabulary (identifiers, etc).
    #[error(transparent)]
    #[diagnostic(transparent)]
    Core(#[from] astrotask_core::Error),
}
