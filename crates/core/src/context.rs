//! Context slices: auxiliary, opaque-to-the-core payloads attached to tasks.

use crate::ids::TaskId;
use serde::{Deserialize, Serialize};

/// An auxiliary record attached to a task.
///
/// The core carries this payload through queries but never interprets
/// its contents — not even `digest`, which downstream task-producer/
/// analyzer components use for their own cache-invalidation purposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextSlice {
    /// The slice's own id (opaque, not a [`TaskId`]).
    pub id: String,
    /// The task this slice is attached to.
    pub task_id: TaskId,
    /// Short title.
    pub title: String,
    /// Optional body text.
    pub description: Option<String>,
    /// Optional content digest, opaque to the core.
    pub digest: Option<String>,
}
