//! Wire-adjacent types exchanged with a [`crate::Store`].

use astrotask_core::{NodeId, PendingOperation, Status, TaskId};
use astrotask_tree::TaskTree;
use std::collections::HashMap;

/// The fields needed to create a new task.
#[derive(Debug, Clone)]
pub struct CreateTask {
    /// Parent task id; `None` for a root.
    pub parent_id: Option<TaskId>,
    /// Non-empty title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Priority score, 0-100.
    pub priority_score: u8,
    /// Optional PRD text.
    pub prd: Option<String>,
    /// Optional context digest.
    pub context_digest: Option<String>,
}

impl CreateTask {
    /// A root-level task with the given title and the default priority.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            parent_id: None,
            title: title.into(),
            description: None,
            priority_score: 50,
            prd: None,
            context_digest: None,
        }
    }
}

/// A query filter over [`crate::Store::list_tasks`].
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    /// Restrict to this status.
    pub status: Option<Status>,
    /// Restrict to direct children of this parent (`Some(None)` means
    /// roots only; `None` means unfiltered on parent).
    pub parent_id: Option<Option<TaskId>>,
    /// Restrict to tasks with at least this priority score.
    pub min_priority: Option<u8>,
}

/// A consolidated, ordered batch of operations ready to submit to a
/// [`crate::Store`].
#[derive(Debug, Clone)]
pub struct ReconciliationPlan {
    /// The id of the tree's root, identifying which tree this plan
    /// applies to.
    pub tree_id: TaskId,
    /// The tracking overlay's base version when this plan was built.
    pub base_version: u64,
    /// The ordered operations (see `astrotask_services::reconcile` for
    /// the consolidation/ordering algorithm that produces this list).
    pub operations: Vec<PendingOperation>,
}

/// The result of successfully executing a [`ReconciliationPlan`].
#[derive(Debug, Clone)]
pub struct ReconciliationOutcome {
    /// The freshly materialized tree after applying the plan.
    pub tree: TaskTree,
    /// Provisional-to-stable id assignments made while applying the plan.
    pub id_mappings: HashMap<NodeId, TaskId>,
}
