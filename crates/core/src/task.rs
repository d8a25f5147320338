//! The `Task` entity, its status enum, and status-transition rules.

use crate::error::{Error, Result};
use crate::ids::TaskId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The closed set of task statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    /// Not started, not blocked from being started.
    Pending,
    /// Actively being worked.
    InProgress,
    /// Finished. Propagates as the effective status of all descendants.
    Done,
    /// Abandoned. Propagates as the effective status of all descendants.
    Cancelled,
    /// Retired from active consideration. Propagates like `Done`/`Cancelled`.
    Archived,
}

impl Status {
    /// The statuses that, when held by an ancestor, override a
    /// descendant's own status for the purposes of [`crate::Status`]
    /// effective-status computation.
    #[must_use]
    pub fn is_terminal_for_descendants(self) -> bool {
        matches!(self, Self::Done | Self::Cancelled | Self::Archived)
    }

    /// The statuses directly reachable from this one, ignoring
    /// dependency blocking (see [`validate_status_transition`] for the
    /// blocking rule layered on top).
    #[must_use]
    pub fn allowed_transitions(self) -> &'static [Status] {
        match self {
            Self::Pending => &[Status::InProgress, Status::Cancelled],
            Self::InProgress => &[Status::Done, Status::Pending, Status::Cancelled],
            Self::Done => &[Status::InProgress],
            Self::Cancelled => &[Status::Pending],
            Self::Archived => &[],
        }
    }

    /// The wire string for this status (`"in-progress"`, not `"InProgress"`).
    #[must_use]
    pub fn as_wire_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Done => "done",
            Self::Cancelled => "cancelled",
            Self::Archived => "archived",
        }
    }
}

/// The outcome of validating a proposed status transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionCheck {
    /// Whether the transition is allowed.
    pub allowed: bool,
    /// Human-readable reason when `allowed` is `false`.
    pub reason: Option<String>,
    /// The dependencies currently blocking the task, if blocking was the
    /// reason for rejection (or would have been, for `in-progress`).
    pub blocked_by: Vec<TaskId>,
}

/// Validate a proposed status transition, independent of dependency
/// blocking except for the `-> in-progress` rule.
///
/// A transition to [`Status::InProgress`] is rejected whenever `blocked_by`
/// is non-empty, regardless of whether `from` would otherwise allow it.
#[must_use]
pub fn validate_status_transition(
    from: Status,
    to: Status,
    blocked_by: &[TaskId],
) -> TransitionCheck {
    if to == Status::InProgress && !blocked_by.is_empty() {
        return TransitionCheck {
            allowed: false,
            reason: Some(format!(
                "blocked by incomplete dependencies: {}",
                blocked_by
                    .iter()
                    .map(TaskId::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
            blocked_by: blocked_by.to_vec(),
        };
    }

    if from.allowed_transitions().contains(&to) {
        TransitionCheck {
            allowed: true,
            reason: None,
            blocked_by: Vec::new(),
        }
    } else {
        TransitionCheck {
            allowed: false,
            reason: Some(format!(
                "{} cannot transition to {}; allowed: {}",
                from.as_wire_str(),
                to.as_wire_str(),
                from.allowed_transitions()
                    .iter()
                    .map(|s| s.as_wire_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
            blocked_by: Vec::new(),
        }
    }
}

/// The derived priority bucket for a [`Task::priority_score`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityLevel {
    /// Score < 20.
    Low,
    /// 20 <= score <= 70.
    Medium,
    /// Score > 70.
    High,
}

impl PriorityLevel {
    /// Derive the level bucket for a raw 0-100 score.
    ///
    /// The score is authoritative (per the design note retiring the
    /// legacy `low`/`medium`/`high` enum field); this is always derived,
    /// never stored.
    #[must_use]
    pub fn from_score(score: u8) -> Self {
        if score < 20 {
            Self::Low
        } else if score <= 70 {
            Self::Medium
        } else {
            Self::High
        }
    }
}

/// A single task in the hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Stable, hierarchical identifier.
    pub id: TaskId,
    /// Parent task id; `None` for roots.
    pub parent_id: Option<TaskId>,
    /// Non-empty title.
    pub title: String,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Current status.
    pub status: Status,
    /// Priority score, 0-100 inclusive.
    pub priority_score: u8,
    /// Optional product-requirements text.
    pub prd: Option<String>,
    /// Optional digest of associated context.
    pub context_digest: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-modified timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Construct a task, validating the title and priority bounds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if `title` is empty or
    /// `priority_score` exceeds 100.
    pub fn new(
        id: TaskId,
        parent_id: Option<TaskId>,
        title: impl Into<String>,
        priority_score: u8,
    ) -> Result<Self> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(Error::validation("task title must not be empty"));
        }
        if priority_score > 100 {
            return Err(Error::validation(format!(
                "priority score {priority_score} exceeds the 0-100 range"
            )));
        }
        let now = Utc::now();
        Ok(Self {
            id,
            parent_id,
            title,
            description: None,
            status: Status::Pending,
            priority_score,
            prd: None,
            context_digest: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// The derived priority level for this task's score.
    #[must_use]
    pub fn priority_level(&self) -> PriorityLevel {
        PriorityLevel::from_score(self.priority_score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> TaskId {
        TaskId::parse(s).unwrap()
    }

    #[test]
    fn rejects_empty_title() {
        assert!(Task::new(id("A"), None, "   ", 10).is_err());
    }

    #[test]
    fn rejects_out_of_range_priority() {
        assert!(Task::new(id("A"), None, "root", 101).is_err());
        assert!(Task::new(id("A"), None, "root", 100).is_ok());
    }

    #[test]
    fn derives_priority_levels() {
        assert_eq!(PriorityLevel::from_score(0), PriorityLevel::Low);
        assert_eq!(PriorityLevel::from_score(19), PriorityLevel::Low);
        assert_eq!(PriorityLevel::from_score(20), PriorityLevel::Medium);
        assert_eq!(PriorityLevel::from_score(70), PriorityLevel::Medium);
        assert_eq!(PriorityLevel::from_score(71), PriorityLevel::High);
        assert_eq!(PriorityLevel::from_score(100), PriorityLevel::High);
    }

    #[test]
    fn transition_table_matches_spec() {
        use Status::{Archived, Cancelled, Done, InProgress, Pending};

        assert!(validate_status_transition(Pending, InProgress, &[]).allowed);
        assert!(validate_status_transition(Pending, Cancelled, &[]).allowed);
        assert!(!validate_status_transition(Pending, Done, &[]).allowed);

        assert!(validate_status_transition(InProgress, Done, &[]).allowed);
        assert!(validate_status_transition(InProgress, Pending, &[]).allowed);
        assert!(validate_status_transition(InProgress, Cancelled, &[]).allowed);

        assert!(validate_status_transition(Done, InProgress, &[]).allowed);
        assert!(!validate_status_transition(Done, Pending, &[]).allowed);

        assert!(validate_status_transition(Cancelled, Pending, &[]).allowed);
        assert!(!validate_status_transition(Cancelled, Done, &[]).allowed);

        assert!(!validate_status_transition(Archived, Pending, &[]).allowed);
        assert!(!validate_status_transition(Archived, InProgress, &[]).allowed);
    }

    #[test]
    fn blocked_dependency_rejects_in_progress() {
        let blocking = vec![id("Y")];
        let check = validate_status_transition(Status::Pending, Status::InProgress, &blocking);
        assert!(!check.allowed);
        assert!(check.reason.unwrap().contains("blocked"));
        assert_eq!(check.blocked_by, blocking);

        let check = validate_status_transition(Status::Pending, Status::InProgress, &[]);
        assert!(check.allowed);
    }

    #[test]
    fn wire_strings_match_spec() {
        assert_eq!(Status::Pending.as_wire_str(), "pending");
        assert_eq!(Status::InProgress.as_wire_str(), "in-progress");
        assert_eq!(Status::Done.as_wire_str(), "done");
        assert_eq!(Status::Cancelled.as_wire_str(), "cancelled");
        assert_eq!(Status::Archived.as_wire_str(), "archived");
    }
}
