//! Shared error taxonomy for the Astrotask core.

use crate::ops::PendingOperation;
use miette::Diagnostic;
use thiserror::Error;

/// Result type used throughout `astrotask-core`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the core data model and mutation-tracking engine.
///
/// Read operations never produce this type directly (they return `None`
/// or empty collections per the propagation policy); this is for
/// operations that require existence, validity, or store round-trips.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// A referenced task, edge, or node does not exist where existence
    /// was required.
    #[error("not found: {message}")]
    #[diagnostic(code(astrotask::core::not_found))]
    NotFound {
        /// Description of what was missing.
        message: String,
    },

    /// Identifier syntax, enum value, priority bounds, empty required
    /// field, disallowed status transition, or a proposed cycle.
    #[error("validation failed: {message}")]
    #[diagnostic(
        code(astrotask::core::validation),
        help("check the value against the documented grammar or invariant")
    )]
    Validation {
        /// Description of the violated constraint.
        message: String,
    },

    /// A structural conflict: a task would become its own ancestor, a
    /// duplicate edge was proposed, or similar.
    #[error("conflict: {message}")]
    #[diagnostic(code(astrotask::core::conflict))]
    Conflict {
        /// Description of the conflict.
        message: String,
    },

    /// The store rejected a reconciliation plan, in whole or in part.
    ///
    /// Carries the full attempted operation list and the subset the
    /// store confirmed as applied, so a caller can retry just the
    /// remainder after resolving the underlying cause.
    #[error("reconciliation failed: {message}")]
    #[diagnostic(
        code(astrotask::core::reconciliation),
        help("resolve the underlying store error and retry with the unapplied operations")
    )]
    Reconciliation {
        /// Description of the failure.
        message: String,
        /// Every operation that was part of the attempted plan.
        attempted: Vec<PendingOperation>,
        /// The subset of `attempted` the store confirmed as applied.
        applied: Vec<PendingOperation>,
    },

    /// An invariant violation that should be unreachable; used defensively.
    #[error("internal invariant violated: {message}")]
    #[diagnostic(code(astrotask::core::internal))]
    Internal {
        /// Description of the violated invariant.
        message: String,
    },
}

impl Error {
    /// Construct a [`Error::NotFound`].
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Construct a [`Error::Validation`].
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Construct a [`Error::Conflict`].
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Construct a [`Error::Reconciliation`].
    #[must_use]
    pub fn reconciliation(
        message: impl Into<String>,
        attempted: Vec<PendingOperation>,
        applied: Vec<PendingOperation>,
    ) -> Self {
        Self::Reconciliation {
            message: message.into(),
            attempted,
            applied,
        }
    }

    /// Construct a [`Error::Internal`].
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
