//! The `Store` contract: the persistence boundary the core consumes
//! but never implements in production.
//!
//! Mirrors the shape of the teacher's own `TaskBackend` trait — an
//! `async_trait` abstraction defined once, implemented by whichever
//! concrete engine an embedder chooses. No concrete engine lives in
//! this crate; [`memory::InMemoryStore`] behind the `test-support`
//! feature exists only for the workspace's own tests, the way the
//! teacher ships an in-crate `test_utils` module rather than a second
//! production backend.

mod error;
#[cfg(feature = "test-support")]
pub mod memory;
mod types;

pub use error::{Error, Result};
pub use types::{CreateTask, ReconciliationOutcome, ReconciliationPlan, TaskFilter};

use astrotask_core::{ContextSlice, Task, TaskId, TaskUpdateFields};
use async_trait::async_trait;

/// Persistent, queryable collection of tasks, dependencies, and
/// context slices.
///
/// The core depends on this contract, never on a concrete engine.
/// Implementations are expected to enforce referential integrity and
/// the atomicity of [`Store::execute_reconciliation_operations`]; the
/// core does not double-check those invariants, it treats a failure as
/// a reconciliation error.
#[async_trait]
pub trait Store: Send + Sync {
    /// Create a task and return it with its store-assigned stable id.
    ///
    /// # Errors
    ///
    /// Returns an error if `create.parent_id` names an unknown task.
    async fn add_task(&self, create: CreateTask) -> Result<Task>;

    /// Look up a task by id.
    ///
    /// # Errors
    ///
    /// Implementations may surface transport/storage failures; an
    /// unknown id is `Ok(None)`, never an error.
    async fn get_task(&self, id: &TaskId) -> Result<Option<Task>>;

    /// List tasks matching `filter`.
    ///
    /// # Errors
    ///
    /// Implementations may surface transport/storage failures.
    async fn list_tasks(&self, filter: TaskFilter) -> Result<Vec<Task>>;

    /// Apply a partial update to a task.
    ///
    /// # Errors
    ///
    /// Returns `Ok(None)` for an unknown id; other failures propagate.
    async fn update_task(&self, id: &TaskId, updates: TaskUpdateFields) -> Result<Option<Task>>;

    /// Delete a task, optionally cascading to its descendants.
    ///
    /// # Errors
    ///
    /// Implementations may surface transport/storage failures.
    async fn delete_task(&self, id: &TaskId, cascade: bool) -> Result<bool>;

    /// List the context slices attached to a task.
    ///
    /// # Errors
    ///
    /// Implementations may surface transport/storage failures.
    async fn list_context_slices(&self, task_id: &TaskId) -> Result<Vec<ContextSlice>>;

    /// Record a `dependent -> dependency` edge.
    ///
    /// # Errors
    ///
    /// Returns an error if either id is unknown, the edge already
    /// exists, or it would create a cycle.
    async fn add_dependency(&self, dependent: &TaskId, dependency: &TaskId) -> Result<()>;

    /// Remove a `dependent -> dependency` edge.
    ///
    /// # Errors
    ///
    /// Implementations may surface transport/storage failures.
    async fn remove_dependency(&self, dependent: &TaskId, dependency: &TaskId) -> Result<()>;

    /// List the ids `id` depends on.
    ///
    /// # Errors
    ///
    /// Implementations may surface transport/storage failures.
    async fn list_dependencies(&self, id: &TaskId) -> Result<Vec<TaskId>>;

    /// Atomically apply an ordered reconciliation plan.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Reconciliation`] if any operation in the plan
    /// is rejected; no partial application is exposed as success.
    async fn execute_reconciliation_operations(
        &self,
        plan: ReconciliationPlan,
    ) -> Result<ReconciliationOutcome>;
}
