//! Shared identifiers, task model, pending-operation vocabulary, and
//! error types for the Astrotask core.
//!
//! This crate has no knowledge of trees, dependency graphs, or stores —
//! it is the vocabulary [`astrotask_graph`](../astrotask_graph/index.html)
//! and [`astrotask_tree`](../astrotask_tree/index.html) build on so
//! neither depends on the other.

pub mod context;
pub mod error;
pub mod ids;
pub mod ops;
pub mod task;

pub use context::ContextSlice;
pub use error::{Error, Result};
pub use ids::{
    letters_to_number, number_to_letters, validate_id_str, validate_subtask_id, NodeId,
    ParsedTaskId, ProvisionalId, TaskId,
};
pub use ops::{
    expect_stable, next_op_timestamp, PendingOperation, PendingSubtree, TaskContent,
    TaskUpdateFields,
};
pub use task::{validate_status_transition, PriorityLevel, Status, Task, TransitionCheck};
