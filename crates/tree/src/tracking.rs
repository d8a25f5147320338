//! [`TrackingTaskTree`]: a mutable tree overlay that records every edit
//! as a [`PendingOperation`] while applying it in place, so queries
//! always see post-mutation state immediately.

use crate::error::{Error, Result};
use crate::tree::TaskTree;
use astrotask_core::{
    next_op_timestamp, NodeId, PendingOperation, PendingSubtree, ProvisionalId, Status,
    TaskContent, TaskUpdateFields,
};
use astrotask_graph::TrackingDependencyGraph;
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};

static PROVISIONAL_TAG: AtomicU64 = AtomicU64::new(0);

fn next_provisional_tag() -> ProvisionalId {
    let n = PROVISIONAL_TAG.fetch_add(1, Ordering::SeqCst);
    ProvisionalId::new(format!("pending-{n}"))
}

#[derive(Debug, Clone)]
struct TrackingNode {
    content: TaskContent,
    children: Vec<NodeId>,
}

/// A [`TaskTree`] overlaid with not-yet-persisted structural and field
/// edits, plus an optionally attached [`TrackingDependencyGraph`] for
/// availability queries.
///
/// `!Sync` by convention: this type does no internal locking, exactly
/// as [`TrackingDependencyGraph`] leaves locking to its caller. Share
/// one across tasks behind a `Mutex`/`RwLock` you own.
#[derive(Debug, Clone)]
pub struct TrackingTaskTree {
    nodes: HashMap<NodeId, TrackingNode>,
    parent: HashMap<NodeId, NodeId>,
    roots: Vec<NodeId>,
    pending: Vec<PendingOperation>,
    base_version: u64,
    dependency_graph: Option<TrackingDependencyGraph>,
}

impl TrackingTaskTree {
    /// Wrap a base [`TaskTree`] with an empty pending-operation log.
    #[must_use]
    pub fn new(base: &TaskTree, base_version: u64) -> Self {
        let mut nodes = HashMap::new();
        let mut parent = HashMap::new();
        let mut roots = Vec::new();

        for (id, node) in &base.nodes {
            let node_id = NodeId::Stable(id.clone());
            nodes.insert(
                node_id.clone(),
                TrackingNode {
                    content: TaskContent {
                        title: node.task.title.clone(),
                        description: node.task.description.clone(),
                        status: node.task.status,
                        priority_score: node.task.priority_score,
                        prd: node.task.prd.clone(),
                        context_digest: node.task.context_digest.clone(),
                        created_at: node.task.created_at,
                        updated_at: node.task.updated_at,
                    },
                    children: node
                        .children
                        .iter()
                        .map(|c| NodeId::Stable(c.clone()))
                        .collect(),
                },
            );
        }
        for id in base.parent.keys() {
            parent.insert(
                NodeId::Stable(id.clone()),
                NodeId::Stable(base.parent[id].clone()),
            );
        }
        for id in &base.roots {
            roots.push(NodeId::Stable(id.clone()));
        }

        Self {
            nodes,
            parent,
            roots,
            pending: Vec::new(),
            base_version,
            dependency_graph: None,
        }
    }

    /// Attach a dependency-graph overlay for availability queries.
    #[must_use]
    pub fn with_dependency_graph(mut self, graph: TrackingDependencyGraph) -> Self {
        self.dependency_graph = Some(graph);
        self
    }

    /// Replace the attached dependency-graph overlay in place, e.g.
    /// after flushing it independently of the tree itself.
    pub fn set_dependency_graph(&mut self, graph: TrackingDependencyGraph) {
        self.dependency_graph = Some(graph);
    }

    /// Whether any edit is pending (tree or attached dependency graph).
    #[must_use]
    pub fn has_pending_changes(&self) -> bool {
        !self.pending.is_empty()
            || self
                .dependency_graph
                .as_ref()
                .is_some_and(TrackingDependencyGraph::has_pending_changes)
    }

    /// The accumulated, not-yet-flushed tree operations, oldest first.
    #[must_use]
    pub fn pending_operations(&self) -> &[PendingOperation] {
        &self.pending
    }

    /// The base version this overlay was built from.
    #[must_use]
    pub fn base_version(&self) -> u64 {
        self.base_version
    }

    /// The attached dependency-graph overlay, if any.
    #[must_use]
    pub fn dependency_graph(&self) -> Option<&TrackingDependencyGraph> {
        self.dependency_graph.as_ref()
    }

    /// The top-level root ids of this tree, in insertion order.
    #[must_use]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    fn exists(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    fn require(&self, id: &NodeId) -> Result<()> {
        if self.exists(id) {
            Ok(())
        } else {
            Err(Error::NotFound { id: id.clone() })
        }
    }

    // ---- navigation -----------------------------------------------

    /// This node's content, if present.
    #[must_use]
    pub fn get_content(&self, id: &NodeId) -> Option<&TaskContent> {
        self.nodes.get(id).map(|n| &n.content)
    }

    /// The parent of `id`, or `None` for a root or unknown id.
    #[must_use]
    pub fn get_parent(&self, id: &NodeId) -> Option<NodeId> {
        self.parent.get(id).cloned()
    }

    /// The direct children of `id`, in insertion order.
    #[must_use]
    pub fn get_children(&self, id: &NodeId) -> Vec<NodeId> {
        self.nodes.get(id).map(|n| n.children.clone()).unwrap_or_default()
    }

    /// The other children of `id`'s parent (or the other roots).
    #[must_use]
    pub fn get_siblings(&self, id: &NodeId) -> Vec<NodeId> {
        let siblings = match self.parent.get(id) {
            Some(parent_id) => self.get_children(parent_id),
            None => self.roots.clone(),
        };
        siblings.into_iter().filter(|s| s != id).collect()
    }

    /// The topmost ancestor of `id`.
    #[must_use]
    pub fn get_root(&self, id: &NodeId) -> Option<NodeId> {
        if !self.exists(id) {
            return None;
        }
        let mut current = id.clone();
        while let Some(parent_id) = self.parent.get(&current) {
            current = parent_id.clone();
        }
        Some(current)
    }

    // ---- traversal ---------------------------------------------------

    /// Depth-first walk starting at `id`; `visit` returning `false` cuts
    /// off descent past that node.
    pub fn walk_depth_first(&self, id: &NodeId, visit: &mut dyn FnMut(usize, &NodeId) -> bool) {
        self.walk_depth_first_rec(id, 0, visit);
    }

    fn walk_depth_first_rec(
        &self,
        id: &NodeId,
        depth: usize,
        visit: &mut dyn FnMut(usize, &NodeId) -> bool,
    ) {
        if !self.exists(id) || !visit(depth, id) {
            return;
        }
        for child in self.get_children(id) {
            self.walk_depth_first_rec(&child, depth + 1, visit);
        }
    }

    /// Breadth-first walk starting at `id`.
    pub fn walk_breadth_first(&self, id: &NodeId, mut visit: impl FnMut(usize, &NodeId) -> bool) {
        if !self.exists(id) {
            return;
        }
        let mut queue: VecDeque<(usize, NodeId)> = VecDeque::new();
        queue.push_back((0, id.clone()));
        while let Some((depth, node)) = queue.pop_front() {
            if !visit(depth, &node) {
                continue;
            }
            for child in self.get_children(&node) {
                queue.push_back((depth + 1, child));
            }
        }
    }

    /// The path from the tree root down to `id`, inclusive.
    #[must_use]
    pub fn get_path(&self, id: &NodeId) -> Vec<NodeId> {
        if !self.exists(id) {
            return Vec::new();
        }
        let mut path = vec![id.clone()];
        let mut current = id.clone();
        while let Some(parent_id) = self.parent.get(&current) {
            path.push(parent_id.clone());
            current = parent_id.clone();
        }
        path.reverse();
        path
    }

    /// The depth of `id` (0 for a root).
    #[must_use]
    pub fn get_depth(&self, id: &NodeId) -> usize {
        self.get_path(id).len().saturating_sub(1)
    }

    /// Every descendant of `id`, excluding itself, in depth-first order.
    #[must_use]
    pub fn get_all_descendants(&self, id: &NodeId) -> Vec<NodeId> {
        let mut descendants = Vec::new();
        self.walk_depth_first(id, &mut |_, candidate| {
            if candidate != id {
                descendants.push(candidate.clone());
            }
            true
        });
        descendants
    }

    /// The number of descendants of `id`.
    #[must_use]
    pub fn get_descendant_count(&self, id: &NodeId) -> usize {
        self.get_all_descendants(id).len()
    }

    /// Whether `ancestor` is a (possibly indirect) ancestor of `id`.
    #[must_use]
    pub fn is_ancestor_of(&self, ancestor: &NodeId, id: &NodeId) -> bool {
        let mut current = match self.parent.get(id) {
            Some(p) => p.clone(),
            None => return false,
        };
        let mut guard = HashSet::new();
        loop {
            if &current == ancestor {
                return true;
            }
            if !guard.insert(current.clone()) {
                return false;
            }
            match self.parent.get(&current) {
                Some(p) => current = p.clone(),
                None => return false,
            }
        }
    }

    /// Whether `a` and `b` share the same parent (or are both roots).
    #[must_use]
    pub fn is_sibling_of(&self, a: &NodeId, b: &NodeId) -> bool {
        a != b && self.parent.get(a) == self.parent.get(b)
    }

    /// The effective status of `id`: the first of
    /// `{done, cancelled, archived}` found walking ancestors toward the
    /// root, or `id`'s own status if no ancestor is terminal.
    #[must_use]
    pub fn effective_status(&self, id: &NodeId) -> Option<Status> {
        let own = self.get_content(id)?.status;
        let mut current = self.parent.get(id).cloned();
        let mut guard = HashSet::new();
        while let Some(ancestor) = current {
            if !guard.insert(ancestor.clone()) {
                break;
            }
            if let Some(content) = self.get_content(&ancestor)
                && content.status.is_terminal_for_descendants()
            {
                return Some(content.status);
            }
            current = self.parent.get(&ancestor).cloned();
        }
        Some(own)
    }

    // ---- mutators: content ------------------------------------------

    /// Merge `updates` into `id`'s content in place, recording a
    /// [`PendingOperation::TaskUpdate`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `id` is not in this tree.
    pub fn with_task(&mut self, id: NodeId, updates: TaskUpdateFields) -> Result<()> {
        self.require(&id)?;
        if let Some(node) = self.nodes.get_mut(&id) {
            node.content.apply_update(&updates);
        }
        self.pending.push(PendingOperation::TaskUpdate {
            task_id: id,
            updates,
            ts: next_op_timestamp(),
        });
        Ok(())
    }

    /// Set `id`'s title.
    pub fn with_title(&mut self, id: NodeId, title: impl Into<String>) -> Result<()> {
        self.with_task(
            id,
            TaskUpdateFields {
                title: Some(title.into()),
                ..Default::default()
            },
        )
    }

    /// Set `id`'s description.
    pub fn with_description(&mut self, id: NodeId, description: impl Into<String>) -> Result<()> {
        self.with_task(
            id,
            TaskUpdateFields {
                description: Some(description.into()),
                ..Default::default()
            },
        )
    }

    /// Set `id`'s priority score.
    pub fn with_priority(&mut self, id: NodeId, priority_score: u8) -> Result<()> {
        self.with_task(
            id,
            TaskUpdateFields {
                priority_score: Some(priority_score),
                ..Default::default()
            },
        )
    }

    fn set_status(&mut self, id: NodeId, status: Status) -> Result<()> {
        self.with_task(
            id,
            TaskUpdateFields {
                status: Some(status),
                ..Default::default()
            },
        )
    }

    /// Mark `id` pending.
    pub fn mark_pending(&mut self, id: NodeId) -> Result<()> {
        self.set_status(id, Status::Pending)
    }

    /// Mark `id` in progress.
    pub fn mark_in_progress(&mut self, id: NodeId) -> Result<()> {
        self.set_status(id, Status::InProgress)
    }

    /// Mark `id` done.
    pub fn mark_done(&mut self, id: NodeId) -> Result<()> {
        self.set_status(id, Status::Done)
    }

    /// Mark `id` cancelled, cascading to descendants but skipping any
    /// already marked `done` (the cascade asymmetry recorded in
    /// `DESIGN.md`: a finished descendant is not retroactively
    /// cancelled).
    pub fn mark_cancelled(&mut self, id: NodeId) -> Result<()> {
        self.require(&id)?;
        let descendants = self.get_all_descendants(&id);
        self.set_status(id, Status::Cancelled)?;
        for descendant in descendants {
            let already_done = self
                .get_content(&descendant)
                .is_some_and(|c| c.status == Status::Done);
            if !already_done {
                self.set_status(descendant, Status::Cancelled)?;
            }
        }
        Ok(())
    }

    /// Mark `id` archived, cascading unconditionally to every
    /// descendant regardless of its current status.
    pub fn mark_archived(&mut self, id: NodeId) -> Result<()> {
        self.require(&id)?;
        let descendants = self.get_all_descendants(&id);
        self.set_status(id, Status::Archived)?;
        for descendant in descendants {
            self.set_status(descendant, Status::Archived)?;
        }
        Ok(())
    }

    // ---- mutators: structure -----------------------------------------

    /// Add a new child under `parent` with the given content, returning
    /// its provisional id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `parent` is not in this tree.
    pub fn add_child(&mut self, parent: NodeId, content: TaskContent) -> Result<NodeId> {
        self.require(&parent)?;
        let child_id = NodeId::Provisional(next_provisional_tag());
        self.nodes.insert(
            child_id.clone(),
            TrackingNode {
                content: content.clone(),
                children: Vec::new(),
            },
        );
        self.parent.insert(child_id.clone(), parent.clone());
        self.nodes
            .get_mut(&parent)
            .expect("just checked parent exists")
            .children
            .push(child_id.clone());

        self.pending.push(PendingOperation::ChildAdd {
            parent_id: parent,
            child: PendingSubtree {
                provisional_id: child_id.clone(),
                content,
                children: Vec::new(),
            },
            ts: next_op_timestamp(),
        });
        Ok(child_id)
    }

    /// Remove `child` (and its whole subtree) from `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `parent`/`child` are not in this
    /// tree, or aren't in a parent/child relationship.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.require(&parent)?;
        self.require(&child)?;
        if self.parent.get(&child) != Some(&parent) {
            return Err(Error::NotFound { id: child });
        }

        let mut to_remove = vec![child.clone()];
        to_remove.extend(self.get_all_descendants(&child));
        for id in &to_remove {
            self.nodes.remove(id);
            self.parent.remove(id);
        }
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.retain(|c| c != &child);
        }
        self.roots.retain(|r| r != &child);

        self.pending.push(PendingOperation::ChildRemove {
            parent_id: parent,
            child_id: child,
            ts: next_op_timestamp(),
        });
        Ok(())
    }

    // ---- dependency edits ----------------------------------------------

    /// Declare that `dependent` depends on `dependency`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoDependencyGraph`] if none is attached, or
    /// propagates the attached graph's validation error.
    pub fn depends_on(&mut self, dependent: NodeId, dependency: NodeId) -> Result<()> {
        self.dependency_graph
            .as_mut()
            .ok_or(Error::NoDependencyGraph)?
            .add_dependency(dependent, dependency)
            .map_err(|e| match e {
                astrotask_graph::Error::SelfDependency { task } => {
                    Error::Core(astrotask_core::Error::validation(format!(
                        "task {task} cannot depend on itself"
                    )))
                }
                astrotask_graph::Error::WouldCreateCycle { .. }
                | astrotask_graph::Error::TopologicalSortFailed { .. } => Error::Core(
                    astrotask_core::Error::conflict(e.to_string()),
                ),
                astrotask_graph::Error::Core(core_err) => Error::Core(core_err),
            })
    }

    /// Remove the `dependent -> dependency` edge.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoDependencyGraph`] if none is attached.
    pub fn unblock_by(&mut self, dependent: NodeId, dependency: NodeId) -> Result<()> {
        self.dependency_graph
            .as_mut()
            .ok_or(Error::NoDependencyGraph)?
            .remove_dependency(dependent, dependency);
        Ok(())
    }

    /// The dependencies currently blocking `id` — every dependency whose
    /// status is not `done` specifically, distinct from the three-way
    /// terminal set `effective_status` uses.
    #[must_use]
    pub fn blocked_by(&self, id: &NodeId) -> Vec<NodeId> {
        let Some(graph) = &self.dependency_graph else {
            return Vec::new();
        };
        graph
            .get_dependencies(id)
            .into_iter()
            .filter(|dep| !self.get_content(dep).is_some_and(|c| c.status == Status::Done))
            .collect()
    }

    /// Whether `id` is currently unblocked with respect to `dependency`
    /// specifically (the edge doesn't exist, or it's complete).
    #[must_use]
    pub fn is_unblocked_by(&self, id: &NodeId, dependency: &NodeId) -> bool {
        !self.blocked_by(id).iter().any(|d| d == dependency)
    }

    // ---- availability --------------------------------------------------

    /// Whether `id` has any incomplete dependency.
    #[must_use]
    pub fn is_blocked(&self, id: &NodeId) -> bool {
        !self.blocked_by(id).is_empty()
    }

    /// Alias of [`Self::blocked_by`], matching the spec's availability
    /// vocabulary.
    #[must_use]
    pub fn get_blocking_tasks(&self, id: &NodeId) -> Vec<NodeId> {
        self.blocked_by(id)
    }

    /// Whether `id` can be started: not blocked, and currently `pending`
    /// or `in-progress`.
    #[must_use]
    pub fn can_start(&self, id: &NodeId) -> bool {
        self.get_content(id)
            .is_some_and(|c| matches!(c.status, Status::Pending | Status::InProgress))
            && !self.is_blocked(id)
    }

    fn is_available(&self, id: &NodeId) -> bool {
        self.get_content(id)
            .is_some_and(|c| !c.status.is_terminal_for_descendants())
            && !self.is_blocked(id)
    }

    fn sorted_by_priority(&self, mut ids: Vec<NodeId>) -> Vec<NodeId> {
        ids.sort_by_key(|id| {
            let priority = self.get_content(id).map(|c| c.priority_score).unwrap_or(0);
            (Reverse(priority), id.clone())
        });
        ids
    }

    /// Descendants of `id` (including `id` itself) that are not
    /// `{done, cancelled, archived}` and not blocked, ordered by
    /// descending priority then ascending id.
    #[must_use]
    pub fn get_available_subtasks(&self, id: &NodeId) -> Vec<NodeId> {
        let mut candidates: Vec<NodeId> = self
            .get_all_descendants(id)
            .into_iter()
            .filter(|d| self.is_available(d))
            .collect();
        if self.is_available(id) {
            candidates.push(id.clone());
        }
        self.sorted_by_priority(candidates)
    }

    /// Immediate children of `id` matching the same availability
    /// predicate as [`Self::get_available_subtasks`].
    #[must_use]
    pub fn get_available_children(&self, id: &NodeId) -> Vec<NodeId> {
        let candidates = self
            .get_children(id)
            .into_iter()
            .filter(|c| self.is_available(c))
            .collect();
        self.sorted_by_priority(candidates)
    }

    /// `id` itself if it [`Self::can_start`]; otherwise the highest-
    /// priority available child, ties broken by ascending id.
    #[must_use]
    pub fn get_next_available_task(&self, id: &NodeId) -> Option<NodeId> {
        if self.can_start(id) {
            return Some(id.clone());
        }
        self.get_available_children(id).into_iter().next()
    }

    /// Transition `id` to `in-progress`.
    ///
    /// Returns `false` without mutating anything if `id` is blocked or
    /// in a status that cannot start; `true` if `id` was already
    /// `in-progress` or was `pending` and is now `in-progress`.
    pub fn start_work(&mut self, id: NodeId) -> bool {
        if self.is_blocked(&id) {
            return false;
        }
        match self.get_content(&id).map(|c| c.status) {
            Some(Status::InProgress) => true,
            Some(Status::Pending) => self.mark_in_progress(id).is_ok(),
            _ => false,
        }
    }

    /// Mark `id` done, then call [`Self::start_work`] on every available
    /// child, returning those that successfully transitioned.
    ///
    /// # Errors
    ///
    /// Propagates [`Error::NotFound`] if `id` is not in this tree.
    pub fn complete_and_start_next(&mut self, id: NodeId) -> Result<Vec<NodeId>> {
        self.mark_done(id.clone())?;
        let candidates = self.get_available_children(&id);
        Ok(candidates
            .into_iter()
            .filter(|child| self.start_work(child.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::TaskTree;
    use astrotask_core::{Task, TaskId};
    use astrotask_graph::DependencyGraph;

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
        TrackingTaskTree::new(&base, 1)
    }

    #[test]
    fn with_task_applies_and_records() {
        let mut tree = sample();
        tree.with_title(node("A-A"), "renamed").unwrap();
        assert_eq!(tree.get_content(&node("A-A")).unwrap().title, "renamed");
        assert_eq!(tree.pending_operations().len(), 1);
    }

    #[test]
    fn add_child_is_queryable_immediately() {
        let mut tree = sample();
        let child = tree
            .add_child(node("A-A"), TaskContent::new("new", 10))
            .unwrap();
        assert_eq!(tree.get_parent(&child), Some(node("A-A")));
        assert_eq!(tree.get_children(&node("A-A")), vec![child]);
        assert!(tree.has_pending_changes());
    }

    #[test]
    fn remove_child_drops_subtree() {
        let mut tree = sample();
        let child = tree
            .add_child(node("A-A"), TaskContent::new("new", 10))
            .unwrap();
        tree.remove_child(node("A-A"), child.clone()).unwrap();
        assert!(tree.get_content(&child).is_none());
        assert!(tree.get_children(&node("A-A")).is_empty());
    }

    #[test]
    fn mark_cancelled_skips_done_descendants() {
        let mut tree = sample();
        tree.mark_done(node("A-B")).unwrap();
        tree.mark_cancelled(node("A")).unwrap();
        assert_eq!(tree.get_content(&node("A")).unwrap().status, Status::Cancelled);
        assert_eq!(tree.get_content(&node("A-A")).unwrap().status, Status::Cancelled);
        assert_eq!(tree.get_content(&node("A-B")).unwrap().status, Status::Done);
    }

    #[test]
    fn mark_archived_cascades_unconditionally() {
        let mut tree = sample();
        tree.mark_done(node("A-B")).unwrap();
        tree.mark_archived(node("A")).unwrap();
        assert_eq!(tree.get_content(&node("A-B")).unwrap().status, Status::Archived);
    }

    #[test]
    fn availability_respects_dependencies() {
        let base = TaskTree::build([task("A", None), task("A-A", Some("A")), task("A-B", Some("A"))])
            .unwrap();
        let graph = DependencyGraph::build(
            [(id("A-A"), Status::Pending), (id("A-B"), Status::Pending)],
            [(id("A-B"), id("A-A"))],
        );
        let mut tree =
            TrackingTaskTree::new(&base, 1).with_dependency_graph(TrackingDependencyGraph::new(graph));

        assert!(tree.is_blocked(&node("A-B")));
        assert!(!tree.is_blocked(&node("A-A")));
        assert_eq!(tree.get_available_children(&node("A")), vec![node("A-A")]);

        assert!(tree.start_work(node("A-A")));
        tree.mark_done(node("A-A")).unwrap();
        assert!(!tree.is_blocked(&node("A-B")));
        assert!(tree.start_work(node("A-B")));
    }

    #[test]
    fn cancelled_dependency_still_blocks() {
        let base = TaskTree::build([task("A", None), task("A-A", Some("A")), task("A-B", Some("A"))])
            .unwrap();
        let graph = DependencyGraph::build(
            [(id("A-A"), Status::Pending), (id("A-B"), Status::Pending)],
            [(id("A-B"), id("A-A"))],
        );
        let mut tree =
            TrackingTaskTree::new(&base, 1).with_dependency_graph(TrackingDependencyGraph::new(graph));

        tree.set_status(node("A-A"), Status::Cancelled).unwrap();
        assert!(tree.is_blocked(&node("A-B")));
        assert_eq!(tree.blocked_by(&node("A-B")), vec![node("A-A")]);
    }

    #[test]
    fn start_work_rejects_when_blocked() {
        let base = TaskTree::build([task("A", None), task("A-A", Some("A")), task("A-B", Some("A"))])
            .unwrap();
        let graph = DependencyGraph::build(
            [(id("A-A"), Status::Pending), (id("A-B"), Status::Pending)],
            [(id("A-B"), id("A-A"))],
        );
        let mut tree =
            TrackingTaskTree::new(&base, 1).with_dependency_graph(TrackingDependencyGraph::new(graph));
        assert!(!tree.start_work(node("A-B")));
        assert_eq!(
            tree.get_content(&node("A-B")).unwrap().status,
            Status::Pending
        );
    }

    #[test]
    fn next_available_task_prefers_self_then_highest_priority_child() {
        let mut tree = sample();
        tree.with_priority(node("A-A"), 80).unwrap();
        tree.with_priority(node("A-B"), 20).unwrap();
        assert_eq!(tree.get_next_available_task(&node("A")), Some(node("A")));

        tree.mark_in_progress(node("A")).unwrap();
        assert_eq!(tree.get_next_available_task(&node("A")), Some(node("A")));
    }

    #[test]
    fn complete_and_start_next_starts_every_available_child() {
        let mut tree = sample();
        tree.with_priority(node("A-A"), 80).unwrap();
        tree.with_priority(node("A-B"), 20).unwrap();
        tree.mark_in_progress(node("A")).unwrap();

        let started = tree.complete_and_start_next(node("A")).unwrap();
        assert_eq!(started, vec![node("A-A"), node("A-B")]);
        assert_eq!(
            tree.get_content(&node("A-A")).unwrap().status,
            Status::InProgress
        );
        assert_eq!(
            tree.get_content(&node("A-B")).unwrap().status,
            Status::InProgress
        );
    }
}
