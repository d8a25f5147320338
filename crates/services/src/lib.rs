//! Orchestration layer over `astrotask-tree` and `astrotask-graph`:
//! turning a tracking tree's recorded mutations into a submitted,
//! reconciled plan, and answering read-only availability queries
//! against the result.
//!
//! This crate owns no storage of its own; `astrotask-store`'s [`Store`]
//! trait is the only thing it talks to across a process boundary.
//!
//! [`Store`]: astrotask_store::Store

mod availability;
mod error;
mod reconcile;

pub use availability::{
    get_available_tasks, get_next_task, get_task_with_context, TaskContext, TaskQueryFilter,
    TaskSummary,
};
pub use error::{Error, Result};
pub use reconcile::{build_plan, flush_tree, flush_with_dependencies};
