//! Error types for `Store` implementations.

use miette::Diagnostic;
use thiserror::Error;

/// Result type for `astrotask-store` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by a [`crate::Store`] implementation.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// The store rejected a reconciliation plan, in whole or in part.
    #[error("reconciliation rejected: {message}")]
    #[diagnostic(code(astrotask::store::reconciliation))]
    Reconciliation {
        /// Description of the failure.
        message: String,
    },

    /// An error from the shared core vocabulary (validation, conflict,
    /// not-found raised explicitly by a backend).
    #[error(transparent)]
    #[diagnostic(transparent)]
    Core(#[from] astrotask_core::Error),
}
