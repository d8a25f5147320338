//! Collection, consolidation, ordering, and submission of a tracking
//! tree's pending operations, plus the joint tree-and-dependency-graph
//! flush protocol.
//!
//! The shape — walk a structure, consolidate per key, emit an ordered
//! plan — mirrors the teacher's own multi-pass collect-then-resolve
//! algorithm over task names in its dependency-graph crate.

use crate::error::{Error, Result};
use astrotask_core::{NodeId, PendingOperation, TaskId, TaskUpdateFields};
use astrotask_graph::DependencyReconciliationService;
use astrotask_store::{ReconciliationPlan, Store};
use astrotask_tree::TrackingTaskTree;
use chrono::Utc;
use std::cmp::Reverse;
use std::collections::HashMap;

/// Build an ordered [`ReconciliationPlan`] from `tree`'s pending log,
/// without submitting it anywhere.
///
/// Consolidates per-task updates (later timestamps win field-by-field),
/// then orders consolidated updates by timestamp, child adds by their
/// parent's depth ascending, and child removes by their parent's depth
/// descending — so a subtree is always inserted top-down and pruned
/// bottom-up.
#[must_use]
pub fn build_plan(tree: &TrackingTaskTree, tree_id: TaskId) -> ReconciliationPlan {
    let mut ops: Vec<PendingOperation> = tree.pending_operations().to_vec();
    ops.sort_by_key(PendingOperation::timestamp);

    ReconciliationPlan {
        tree_id,
        base_version: tree.base_version(),
        operations: consolidate_and_order(ops, tree),
    }
}

fn consolidate_and_order(ops: Vec<PendingOperation>, tree: &TrackingTaskTree) -> Vec<PendingOperation> {
    let mut updates: HashMap<NodeId, TaskUpdateFields> = HashMap::new();
    let mut update_order: Vec<(NodeId, u64)> = Vec::new();
    let mut child_adds: Vec<(NodeId, astrotask_core::PendingSubtree, u64)> = Vec::new();
    let mut child_removes: Vec<(NodeId, NodeId, u64)> = Vec::new();

    for op in ops {
        match op {
            PendingOperation::TaskUpdate { task_id, updates: fields, ts } => {
                match updates.remove(&task_id) {
                    Some(earlier) => updates.insert(task_id.clone(), earlier.merged_with(fields)),
                    None => {
                        update_order.push((task_id.clone(), ts));
                        updates.insert(task_id.clone(), fields)
                    }
                };
            }
            PendingOperation::ChildAdd { parent_id, mut child, ts } => {
                child.normalize_timestamps(Utc::now());
                child_adds.push((parent_id, child, ts));
            }
            PendingOperation::ChildRemove { parent_id, child_id, ts } => {
                child_removes.push((parent_id, child_id, ts));
            }
            other @ (PendingOperation::DependencyAdd { .. } | PendingOperation::DependencyRemove { .. }) => {
                tracing::warn!(
                    ?other,
                    "dependency operation found in a tree's pending log; routed separately through the dependency graph, dropping here"
                );
            }
        }
    }

    // update_order records each id's earliest occurrence, so the final
    // sort-by-timestamp reflects when the field first changed, not when
    // the merge happened to finish.
    let mut consolidated: Vec<PendingOperation> = update_order
        .into_iter()
        .map(|(task_id, ts)| {
            let fields = updates.remove(&task_id).expect("inserted above for every recorded id");
            PendingOperation::TaskUpdate { task_id, updates: fields, ts }
        })
        .collect();
    consolidated.sort_by_key(PendingOperation::timestamp);

    child_adds.sort_by_key(|(parent_id, _, ts)| (tree.get_depth(parent_id), *ts));
    child_removes.sort_by_key(|(parent_id, _, ts)| (Reverse(tree.get_depth(parent_id)), *ts));

    consolidated.extend(
        child_adds
            .into_iter()
            .map(|(parent_id, child, ts)| PendingOperation::ChildAdd { parent_id, child, ts }),
    );
    consolidated.extend(
        child_removes
            .into_iter()
            .map(|(parent_id, child_id, ts)| PendingOperation::ChildRemove { parent_id, child_id, ts }),
    );
    consolidated
}

/// Flush `tree`'s pending operations through `store`, replacing `tree`
/// in place with the freshly materialized result on success.
///
/// Returns the provisional-to-stable id mappings assigned by the
/// store, for a caller that also needs to rewrite a companion
/// dependency graph (see [`flush_with_dependencies`]).
///
/// # Errors
///
/// If the store rejects the plan, `tree` is left untouched (its
/// pending operations are preserved for retry) and the failure is
/// raised as [`astrotask_core::Error::Reconciliation`], carrying the
/// full attempted operation list.
pub async fn flush_tree(
    tree: &mut TrackingTaskTree,
    store: &dyn Store,
    tree_id: TaskId,
) -> Result<HashMap<NodeId, TaskId>> {
    if tree.pending_operations().is_empty() {
        return Ok(HashMap::new());
    }

    let plan = build_plan(tree, tree_id);
    let submitted = plan.operations.len() as u64;
    let attempted = plan.operations.clone();
    let dependency_graph = tree.dependency_graph().cloned();

    match store.execute_reconciliation_operations(plan).await {
        Ok(outcome) => {
            let mut fresh = TrackingTaskTree::new(&outcome.tree, tree.base_version() + submitted);
            if let Some(graph) = dependency_graph {
                fresh = fresh.with_dependency_graph(graph);
            }
            *tree = fresh;
            Ok(outcome.id_mappings)
        }
        Err(e) => Err(Error::Core(astrotask_core::Error::reconciliation(
            e.to_string(),
            attempted,
            Vec::new(),
        ))),
    }
}

/// Flush the task tree, then the dependency graph attached to it,
/// rewriting the graph's pending operations through the id mappings the
/// task-tree flush produced, and finally recompute `getAvailableSubtasks`
/// against the refreshed state.
///
/// # Errors
///
/// Propagates the task-tree flush's error directly (leaving the
/// dependency graph untouched); if the task-tree half succeeds but the
/// dependency half fails, the unsubmitted dependency operations remain
/// pending on the (now-rebuilt) tree's attached graph for retry.
pub async fn flush_with_dependencies(
    tree: &mut TrackingTaskTree,
    store: &dyn Store,
    dependency_service: &dyn DependencyReconciliationService,
    tree_id: TaskId,
) -> Result<Vec<NodeId>> {
    let id_mappings = flush_tree(tree, store, tree_id.clone()).await?;

    if let Some(mut graph) = tree.dependency_graph().cloned() {
        graph.apply_id_mappings(&id_mappings);
        graph
            .flush(dependency_service)
            .await
            .map_err(|e| Error::DependencyFlush { message: e.to_string() })?;
        tree.set_dependency_graph(graph);
    }

    let root = tree
        .roots()
        .first()
        .cloned()
        .unwrap_or(NodeId::Stable(tree_id));
    Ok(tree.get_available_subtasks(&root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use astrotask_core::{Task, TaskContent};
    use astrotask_graph::DependencyGraph;
    use astrotask_store::memory::InMemoryStore;
    use astrotask_tree::TaskTree;

    fn id(s: &str) -> TaskId {
        TaskId::parse(s).unwrap()
    }

    fn node(s: &str) -> NodeId {
        NodeId::Stable(id(s))
    }

    fn task(tid: &str, parent: Option<&str>) -> Task {
        Task::new(id(tid), parent.map(id), tid, 50).unwrap()
    }

    fn sample() -> TrackingTaskTree {
        let base =
            TaskTree::build([task("A", None), task("A-A", Some("A")), task("A-B", Some("A"))])
                .unwrap();
        TrackingTaskTree::new(&base, 0)
    }

    #[test]
    fn consolidates_repeated_updates_right_biased() {
        let mut tree = sample();
        tree.with_title(node("A-A"), "first").unwrap();
        tree.with_priority(node("A-A"), 90).unwrap();
        tree.with_title(node("A-A"), "second").unwrap();

        let plan = build_plan(&tree, id("A"));
        let updates: Vec<_> = plan
            .operations
            .iter()
            .filter(|op| matches!(op, PendingOperation::TaskUpdate { .. }))
            .collect();
        assert_eq!(updates.len(), 1);
        let PendingOperation::TaskUpdate { updates: fields, .. } = updates[0] else {
            unreachable!()
        };
        assert_eq!(fields.title, Some("second".to_string()));
        assert_eq!(fields.priority_score, Some(90));
    }

    #[test]
    fn orders_child_adds_by_parent_depth_then_timestamp() {
        let mut tree = sample();
        let grandchild_parent = tree
            .add_child(node("A"), TaskContent::new("mid", 50))
            .unwrap();
        tree.add_child(grandchild_parent.clone(), TaskContent::new("leaf", 50))
            .unwrap();

        let plan = build_plan(&tree, id("A"));
        let adds: Vec<&NodeId> = plan
            .operations
            .iter()
            .filter_map(|op| match op {
                PendingOperation::ChildAdd { parent_id, .. } => Some(parent_id),
                _ => None,
            })
            .collect();
        assert_eq!(adds, vec![&node("A"), &grandchild_parent]);
    }

    #[tokio::test]
    async fn flush_tree_materializes_and_clears_pending() {
        let store = InMemoryStore::new();
        let root = store.add_task(astrotask_store::CreateTask::new("A")).await.unwrap();
        let mut child = astrotask_store::CreateTask::new("A-A");
        child.parent_id = Some(root.id.clone());
        let child = store.add_task(child).await.unwrap();

        let base = TaskTree::build([
            Task::new(root.id.clone(), None, "A", 50).unwrap(),
            Task::new(child.id.clone(), Some(root.id.clone()), "A-A", 50).unwrap(),
        ])
        .unwrap();
        let mut tree = TrackingTaskTree::new(&base, 0);
        tree.with_title(NodeId::Stable(child.id.clone()), "renamed").unwrap();

        flush_tree(&mut tree, &store, root.id.clone()).await.unwrap();
        assert!(!tree.has_pending_changes());
        let updated = store.get_task(&child.id).await.unwrap().unwrap();
        assert_eq!(updated.title, "renamed");
    }

    #[test]
    fn dependency_graph_dropped_from_tree_plan() {
        let base = TaskTree::build([task("A", None)]).unwrap();
        let graph = DependencyGraph::build([(id("A"), astrotask_core::Status::Pending)], []);
        let mut tree = TrackingTaskTree::new(&base, 0)
            .with_dependency_graph(astrotask_graph::TrackingDependencyGraph::new(graph));
        tree.with_title(node("A"), "renamed").unwrap();

        let plan = build_plan(&tree, id("A"));
        assert!(plan
            .operations
            .iter()
            .all(|op| !matches!(op, PendingOperation::DependencyAdd { .. } | PendingOperation::DependencyRemove { .. })));
    }
}
