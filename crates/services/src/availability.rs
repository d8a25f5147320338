//! Read-only projections over a [`TrackingTaskTree`]: per-task context,
//! filtered availability listings, and next-task selection.
//!
//! Grounded on the teacher's lightweight `IndexedTask`/`TaskPath`
//! projection pattern — a small, cheaply cloned summary type for
//! callers that don't need the full tree.

use astrotask_core::{NodeId, PriorityLevel, Status};
use astrotask_tree::TrackingTaskTree;

/// A per-task read-only projection: effective status, priority level,
/// and whether anything currently blocks it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSummary {
    /// The task's id.
    pub id: NodeId,
    /// Title at the time this summary was computed.
    pub title: String,
    /// The first terminal status found walking ancestors, or the
    /// task's own status.
    pub effective_status: Status,
    /// The derived bucket for the task's raw priority score.
    pub priority_level: PriorityLevel,
    /// Whether any dependency is currently incomplete.
    pub is_blocked: bool,
}

impl TaskSummary {
    fn of(tree: &TrackingTaskTree, id: &NodeId) -> Option<Self> {
        let content = tree.get_content(id)?;
        Some(Self {
            id: id.clone(),
            title: content.title.clone(),
            effective_status: tree.effective_status(id)?,
            priority_level: PriorityLevel::from_score(content.priority_score),
            is_blocked: tree.is_blocked(id),
        })
    }
}

/// The full navigational and dependency context for one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskContext {
    /// The task itself.
    pub id: NodeId,
    /// Ancestors, root-to-parent order (excludes `id`).
    pub ancestors: Vec<NodeId>,
    /// Every descendant, depth-first order.
    pub descendants: Vec<NodeId>,
    /// The topmost ancestor, or `id` itself if it is a root.
    pub root: Option<NodeId>,
    /// Ids this task directly depends on.
    pub dependencies: Vec<NodeId>,
    /// Ids that directly depend on this task.
    pub dependents: Vec<NodeId>,
    /// Whether any dependency is currently incomplete.
    pub is_blocked: bool,
    /// The dependencies currently responsible for `is_blocked`.
    pub blocked_by: Vec<NodeId>,
}

/// A filter over [`get_available_tasks`]/[`get_next_task`].
#[derive(Debug, Clone, Default)]
pub struct TaskQueryFilter {
    /// Restrict to this effective status.
    pub status: Option<Status>,
    /// Restrict to tasks with at least this priority score.
    pub min_priority: Option<u8>,
    /// Restrict to direct children of this parent.
    pub parent_id: Option<NodeId>,
}

/// Ancestors, descendants, root, dependency edges, and blocking state
/// for `id`, or `None` if `id` is not in `tree`.
#[must_use]
pub fn get_task_with_context(tree: &TrackingTaskTree, id: &NodeId) -> Option<TaskContext> {
    tree.get_content(id)?;
    let mut path = tree.get_path(id);
    path.pop();
    let ancestors = path;

    let (dependencies, dependents) = tree
        .dependency_graph()
        .map(|graph| (graph.get_dependencies(id), graph.get_dependents(id)))
        .unwrap_or_default();

    Some(TaskContext {
        id: id.clone(),
        ancestors,
        descendants: tree.get_all_descendants(id),
        root: tree.get_root(id),
        dependencies,
        dependents,
        is_blocked: tree.is_blocked(id),
        blocked_by: tree.blocked_by(id),
    })
}

/// Every task under `root` (inclusive) matching `filter`, excluding any
/// whose effective status is terminal or whose `blocked_by` is
/// non-empty.
#[must_use]
pub fn get_available_tasks(
    tree: &TrackingTaskTree,
    root: &NodeId,
    filter: &TaskQueryFilter,
) -> Vec<TaskSummary> {
    let mut candidates = vec![root.clone()];
    candidates.extend(tree.get_all_descendants(root));

    let mut summaries: Vec<TaskSummary> = candidates
        .into_iter()
        .filter(|id| {
            filter
                .parent_id
                .as_ref()
                .is_none_or(|parent| tree.get_parent(id).as_ref() == Some(parent))
        })
        .filter(|id| {
            filter
                .min_priority
                .is_none_or(|min| tree.get_content(id).is_some_and(|c| c.priority_score >= min))
        })
        .filter_map(|id| TaskSummary::of(tree, &id))
        .filter(|summary| !summary.effective_status.is_terminal_for_descendants())
        .filter(|summary| !summary.is_blocked)
        .filter(|summary| filter.status.is_none_or(|s| summary.effective_status == s))
        .collect();

    summaries.sort_by(|a, b| a.id.cmp(&b.id));
    summaries
}

/// Among [`get_available_tasks`], the highest `priorityScore`; ties
/// broken by ascending id.
#[must_use]
pub fn get_next_task(
    tree: &TrackingTaskTree,
    root: &NodeId,
    filter: &TaskQueryFilter,
) -> Option<TaskSummary> {
    get_available_tasks(tree, root, filter)
        .into_iter()
        .filter_map(|summary| {
            let score = tree.get_content(&summary.id)?.priority_score;
            Some((score, summary))
        })
        .max_by_key(|(score, summary)| (*score, std::cmp::Reverse(summary.id.clone())))
        .map(|(_, summary)| summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use astrotask_core::{Task, TaskId};
    use astrotask_graph::DependencyGraph;
    use astrotask_tree::TaskTree;

    fn id(s: &str) -> TaskId {
        TaskId::parse(s).unwrap()
    }

    fn node(s: &str) -> NodeId {
        NodeId::Stable(id(s))
    }

    fn task(tid: &str, parent: Option<&str>, priority: u8) -> Task {
        Task::new(id(tid), parent.map(id), tid, priority).unwrap()
    }

    fn sample() -> TrackingTaskTree {
        let base = TaskTree::build([
            task("A", None, 50),
            task("A-A", Some("A"), 80),
            task("A-B", Some("A"), 20),
        ])
        .unwrap();
        TrackingTaskTree::new(&base, 0)
    }

    #[test]
    fn context_reports_ancestors_and_descendants() {
        let tree = sample();
        let context = get_task_with_context(&tree, &node("A-A")).unwrap();
        assert_eq!(context.ancestors, vec![node("A")]);
        assert!(context.descendants.is_empty());
        assert_eq!(context.root, Some(node("A")));
    }

    #[test]
    fn context_is_none_for_unknown_id() {
        let tree = sample();
        assert!(get_task_with_context(&tree, &node("Z")).is_none());
    }

    #[test]
    fn available_tasks_excludes_done_and_blocked() {
        let mut tree = sample();
        tree.mark_done(node("A-B")).unwrap();

        let available = get_available_tasks(&tree, &node("A"), &TaskQueryFilter::default());
        let ids: Vec<&NodeId> = available.iter().map(|s| &s.id).collect();
        assert!(ids.contains(&&node("A")));
        assert!(ids.contains(&&node("A-A")));
        assert!(!ids.contains(&&node("A-B")));
    }

    #[test]
    fn available_tasks_excludes_dependency_blocked() {
        let base = TaskTree::build([
            task("A", None, 50),
            task("A-A", Some("A"), 80),
            task("A-B", Some("A"), 20),
        ])
        .unwrap();
        let graph = DependencyGraph::build(
            [(id("A-A"), Status::Pending), (id("A-B"), Status::Pending)],
            [(id("A-B"), id("A-A"))],
        );
        let tree = TrackingTaskTree::new(&base, 0)
            .with_dependency_graph(astrotask_graph::TrackingDependencyGraph::new(graph));

        let available = get_available_tasks(&tree, &node("A"), &TaskQueryFilter::default());
        let ids: Vec<&NodeId> = available.iter().map(|s| &s.id).collect();
        assert!(!ids.contains(&&node("A-B")));
    }

    #[test]
    fn next_task_picks_highest_priority() {
        let tree = sample();
        let next = get_next_task(&tree, &node("A"), &TaskQueryFilter::default()).unwrap();
        assert_eq!(next.id, node("A-A"));
    }

    #[test]
    fn next_task_breaks_ties_by_ascending_id() {
        let base = TaskTree::build([
            task("A", None, 50),
            task("A-A", Some("A"), 50),
            task("A-B", Some("A"), 50),
        ])
        .unwrap();
        let tree = TrackingTaskTree::new(&base, 0);
        let next = get_next_task(&tree, &node("A"), &TaskQueryFilter::default()).unwrap();
        assert_eq!(next.id, node("A"));
    }
}
