//! Pending mutations recorded by tracking trees and tracking graphs.
//!
//! Every mutator on a tracking type both applies its effect in place
//! *and* records one of these variants, timestamped by the process-wide
//! monotonic [`next_op_timestamp`] counter (never wall-clock — see
//! `SPEC_FULL.md` §3 on timestamp semantics).

use crate::ids::{NodeId, TaskId};
use crate::task::Status;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

static OPERATION_CLOCK: AtomicU64 = AtomicU64::new(0);

/// The next tick of the process-wide monotonic operation clock.
///
/// Used for ordering and consolidating pending operations within a
/// single process; never compared against wall-clock time.
pub fn next_op_timestamp() -> u64 {
    OPERATION_CLOCK.fetch_add(1, Ordering::SeqCst)
}

/// An explicit, field-by-field partial update to a task.
///
/// Modeled as a struct of `Option<T>` rather than a dynamic
/// string-keyed map (per the design note in `SPEC_FULL.md` §9), so
/// consolidation is a compiler-checked, field-by-field merge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskUpdateFields {
    /// New title, if set.
    pub title: Option<String>,
    /// New description, if set.
    pub description: Option<String>,
    /// New status, if set.
    pub status: Option<Status>,
    /// New priority score, if set.
    pub priority_score: Option<u8>,
    /// New PRD text, if set.
    pub prd: Option<String>,
    /// New context digest, if set.
    pub context_digest: Option<String>,
}

impl TaskUpdateFields {
    /// Whether this update touches no fields at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Right-biased merge: fields set on `later` win; fields `later`
    /// leaves unset keep `self`'s value.
    ///
    /// Folding a timestamp-ordered sequence of updates with this method
    /// (oldest first) implements the consolidation rule in
    /// `SPEC_FULL.md` §4.5: "later timestamps overwrite earlier field
    /// values of the same key".
    #[must_use]
    pub fn merged_with(self, later: Self) -> Self {
        Self {
            title: later.title.or(self.title),
            description: later.description.or(self.description),
            status: later.status.or(self.status),
            priority_score: later.priority_score.or(self.priority_score),
            prd: later.prd.or(self.prd),
            context_digest: later.context_digest.or(self.context_digest),
        }
    }
}

/// The mutable content fields of a task, shared between [`crate::Task`]
/// (materialized, with an id and parent) and [`PendingSubtree`]
/// (in-flight, identified only by its position in a tracking tree).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskContent {
    /// Title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Status.
    pub status: Status,
    /// Priority score, 0-100.
    pub priority_score: u8,
    /// Optional PRD text.
    pub prd: Option<String>,
    /// Optional context digest.
    pub context_digest: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-modified timestamp.
    pub updated_at: DateTime<Utc>,
}

impl TaskContent {
    /// Construct content with both timestamps set to `now`.
    #[must_use]
    pub fn new(title: impl Into<String>, priority_score: u8) -> Self {
        let now = Utc::now();
        Self {
            title: title.into(),
            description: None,
            status: Status::Pending,
            priority_score,
            prd: None,
            context_digest: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a [`TaskUpdateFields`] in place, bumping `updated_at`.
    pub fn apply_update(&mut self, update: &TaskUpdateFields) {
        if let Some(title) = &update.title {
            self.title = title.clone();
        }
        if let Some(description) = &update.description {
            self.description = Some(description.clone());
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(score) = update.priority_score {
            self.priority_score = score;
        }
        if let Some(prd) = &update.prd {
            self.prd = Some(prd.clone());
        }
        if let Some(digest) = &update.context_digest {
            self.context_digest = Some(digest.clone());
        }
        self.updated_at = Utc::now();
    }

    /// Coerce `created_at`/`updated_at` into a valid ordering: if
    /// `created_at` is after `updated_at`, or either is implausibly in
    /// the future relative to `now`, both are replaced with `now`.
    ///
    /// This is the typed-Rust form of the source's "coerce strings and
    /// numbers into valid timestamps" normalization: our fields are
    /// already well-typed `DateTime<Utc>`, so the only remaining
    /// invalid state is a nonsensical ordering, which this repairs.
    pub fn normalize_timestamps(&mut self, now: DateTime<Utc>) {
        if self.created_at > self.updated_at || self.created_at > now || self.updated_at > now {
            tracing::warn!(
                created_at = %self.created_at,
                updated_at = %self.updated_at,
                "normalizing invalid task timestamps to now"
            );
            self.created_at = now;
            self.updated_at = now;
        }
    }
}

/// The full payload of a subtree added via [`PendingOperation::ChildAdd`]:
/// the new node's content plus its own (already-pending) descendants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingSubtree {
    /// The provisional id assigned to this node before flush.
    pub provisional_id: NodeId,
    /// The node's content.
    pub content: TaskContent,
    /// Nested subtrees added in the same batch.
    pub children: Vec<PendingSubtree>,
}

impl PendingSubtree {
    /// Recursively normalize every node's timestamps in place.
    pub fn normalize_timestamps(&mut self, now: DateTime<Utc>) {
        self.content.normalize_timestamps(now);
        for child in &mut self.children {
            child.normalize_timestamps(now);
        }
    }
}

/// A recorded, not-yet-persisted mutation to tree or dependency-graph
/// state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PendingOperation {
    /// A partial update to an existing task's fields.
    TaskUpdate {
        /// The task being updated.
        task_id: NodeId,
        /// The fields to merge in.
        updates: TaskUpdateFields,
        /// Recording timestamp (process-monotonic).
        ts: u64,
    },
    /// A new subtree added under `parent_id`.
    ChildAdd {
        /// The parent the subtree was added under.
        parent_id: NodeId,
        /// The subtree payload.
        child: PendingSubtree,
        /// Recording timestamp (process-monotonic).
        ts: u64,
    },
    /// An existing child removed from `parent_id`.
    ChildRemove {
        /// The parent the child is removed from.
        parent_id: NodeId,
        /// The child being removed.
        child_id: NodeId,
        /// Recording timestamp (process-monotonic).
        ts: u64,
    },
    /// A dependency edge added.
    DependencyAdd {
        /// The dependent task (cannot start until `dependency` is done).
        dependent: NodeId,
        /// The dependency task.
        dependency: NodeId,
        /// Recording timestamp (process-monotonic).
        ts: u64,
    },
    /// A dependency edge removed.
    DependencyRemove {
        /// The dependent task.
        dependent: NodeId,
        /// The dependency task.
        dependency: NodeId,
        /// Recording timestamp (process-monotonic).
        ts: u64,
    },
}

impl PendingOperation {
    /// The recording timestamp, common to every variant.
    #[must_use]
    pub fn timestamp(&self) -> u64 {
        match self {
            Self::TaskUpdate { ts, .. }
            | Self::ChildAdd { ts, .. }
            | Self::ChildRemove { ts, .. }
            | Self::DependencyAdd { ts, .. }
            | Self::DependencyRemove { ts, .. } => *ts,
        }
    }
}

/// A task id known to be stable (used once a [`NodeId`] has been
/// confirmed not provisional, e.g. after a successful flush).
#[must_use]
pub fn expect_stable(id: &NodeId) -> Option<&TaskId> {
    match id {
        NodeId::Stable(id) => Some(id),
        NodeId::Provisional(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_is_right_biased_over_time() {
        let first = TaskUpdateFields {
            title: Some("A".into()),
            priority_score: Some(10),
            ..Default::default()
        };
        let second = TaskUpdateFields {
            title: Some("B".into()),
            ..Default::default()
        };
        let merged = first.merged_with(second);
        assert_eq!(merged.title, Some("B".into()));
        assert_eq!(merged.priority_score, Some(10));
    }

    #[test]
    fn clock_is_strictly_increasing() {
        let a = next_op_timestamp();
        let b = next_op_timestamp();
        assert!(b > a);
    }

    #[test]
    fn normalizes_inverted_timestamps() {
        let now = Utc::now();
        let mut content = TaskContent::new("x", 10);
        content.created_at = now;
        content.updated_at = now - chrono::Duration::seconds(10);
        content.normalize_timestamps(now);
        assert_eq!(content.created_at, now);
        assert_eq!(content.updated_at, now);
    }
}
