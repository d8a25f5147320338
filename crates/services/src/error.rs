//! Error types for reconciliation and availability services.

use miette::Diagnostic;
use thiserror::Error;

/// Result type for `astrotask-services` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced while orchestrating a flush or answering an
/// availability query.
///
/// Each variant wraps the originating layer's own error rather than
/// flattening it, so a caller can match on where a failure came from.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// An error from the shared core vocabulary, including a
    /// reconciliation failure raised by this crate when a store call
    /// fails (carrying the attempted operations).
    #[error(transparent)]
    #[diagnostic(transparent)]
    Core(#[from] astrotask_core::Error),

    /// An error from the tracking task tree.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Tree(#[from] astrotask_tree::Error),

    /// An error from the dependency graph.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] astrotask_graph::Error),

    /// An error surfaced directly by a `Store` implementation.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] astrotask_store::Error),

    /// The dependency-reconciliation service rejected a flush.
    #[error("dependency flush failed: {message}")]
    #[diagnostic(code(astrotask::services::dependency_flush))]
    DependencyFlush {
        /// Description of the failure, taken from the service's own error.
        message: String,
    },
}
