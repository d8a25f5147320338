//! The immutable [`TaskTree`]: a parent/child hierarchy over
//! [`Task`]s, arena-indexed by [`TaskId`] rather than linked through
//! `Rc<RefCell<_>>` back-pointers (per the design note in
//! `SPEC_FULL.md` §9).

use crate::error::{Error, Result};
use astrotask_core::{Status, Task, TaskId};
use std::collections::{HashMap, HashSet, VecDeque};

/// One node's content plus its ordered children, keyed elsewhere by id.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    /// The task itself.
    pub task: Task,
    /// Child ids, in the order they were added.
    pub children: Vec<TaskId>,
}

/// An immutable hierarchy of tasks.
#[derive(Debug, Clone, Default)]
pub struct TaskTree {
    pub(crate) nodes: HashMap<TaskId, TreeNode>,
    pub(crate) parent: HashMap<TaskId, TaskId>,
    pub(crate) roots: Vec<TaskId>,
}

impl TaskTree {
    /// An empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from a flat collection of tasks, deriving
    /// parent/child structure from each [`Task::parent_id`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateId`] if two tasks share an id, or
    /// [`Error::MissingParent`] if a task names a parent not present
    /// in `tasks`.
    pub fn build(tasks: impl IntoIterator<Item = Task>) -> Result<Self> {
        let mut nodes = HashMap::new();
        let mut parent = HashMap::new();
        let mut roots = Vec::new();
        let mut order = Vec::new();

        for task in tasks {
            if nodes.contains_key(&task.id) {
                return Err(Error::DuplicateId { id: task.id });
            }
            order.push(task.id.clone());
            if let Some(parent_id) = &task.parent_id {
                parent.insert(task.id.clone(), parent_id.clone());
            } else {
                roots.push(task.id.clone());
            }
            nodes.insert(
                task.id.clone(),
                TreeNode {
                    task,
                    children: Vec::new(),
                },
            );
        }

        for id in &order {
            if let Some(parent_id) = parent.get(id) {
                let Some(parent_node) = nodes.get_mut(parent_id) else {
                    return Err(Error::MissingParent {
                        task: id.clone(),
                        parent: parent_id.clone(),
                    });
                };
                parent_node.children.push(id.clone());
            }
        }

        Ok(Self {
            nodes,
            parent,
            roots,
        })
    }

    /// Borrow a read-only view for navigation/traversal queries.
    pub(crate) fn view(&self) -> TreeView<'_> {
        TreeView {
            nodes: &self.nodes,
            parent: &self.parent,
            roots: &self.roots,
        }
    }

    /// The task content for `id`, if present.
    #[must_use]
    pub fn get_task(&self, id: &TaskId) -> Option<&Task> {
        self.nodes.get(id).map(|n| &n.task)
    }

    /// The parent id of `id`, or `None` for a root or unknown id.
    #[must_use]
    pub fn get_parent(&self, id: &TaskId) -> Option<TaskId> {
        self.view().get_parent(id)
    }

    /// The direct children of `id`, in insertion order.
    #[must_use]
    pub fn get_children(&self, id: &TaskId) -> Vec<TaskId> {
        self.view().get_children(id)
    }

    /// The other children of `id`'s parent (or the other roots, if `id`
    /// is itself a root).
    #[must_use]
    pub fn get_siblings(&self, id: &TaskId) -> Vec<TaskId> {
        self.view().get_siblings(id)
    }

    /// The topmost ancestor of `id` (itself, if `id` is a root).
    #[must_use]
    pub fn get_root(&self, id: &TaskId) -> Option<TaskId> {
        self.view().get_root(id)
    }

    /// Depth-first walk starting at `id`. `visit(depth, id)` returning
    /// `false` cuts off descent past that node.
    pub fn walk_depth_first(&self, id: &TaskId, visit: &mut dyn FnMut(usize, &TaskId) -> bool) {
        self.view().walk_depth_first(id, visit);
    }

    /// Breadth-first walk starting at `id`.
    pub fn walk_breadth_first(&self, id: &TaskId, visit: impl FnMut(usize, &TaskId) -> bool) {
        self.view().walk_breadth_first(id, visit);
    }

    /// The first descendant (including `id` itself) matching `predicate`,
    /// in depth-first order.
    #[must_use]
    pub fn find(&self, id: &TaskId, predicate: impl Fn(&Task) -> bool) -> Option<TaskId> {
        self.view().find(id, predicate)
    }

    /// Every descendant (including `id` itself) matching `predicate`,
    /// in depth-first order.
    #[must_use]
    pub fn filter(&self, id: &TaskId, predicate: impl Fn(&Task) -> bool) -> Vec<TaskId> {
        self.view().filter(id, predicate)
    }

    /// The path from this tree's root down to `id`, inclusive.
    #[must_use]
    pub fn get_path(&self, id: &TaskId) -> Vec<TaskId> {
        self.view().get_path(id)
    }

    /// The depth of `id` (0 for a root).
    #[must_use]
    pub fn get_depth(&self, id: &TaskId) -> usize {
        self.view().get_depth(id)
    }

    /// The number of descendants of `id` (excluding itself).
    #[must_use]
    pub fn get_descendant_count(&self, id: &TaskId) -> usize {
        self.view().get_descendant_count(id)
    }

    /// Every descendant of `id`, excluding itself, in depth-first order.
    #[must_use]
    pub fn get_all_descendants(&self, id: &TaskId) -> Vec<TaskId> {
        self.view().get_all_descendants(id)
    }

    /// Whether `ancestor` is a (possibly indirect) ancestor of `id`.
    #[must_use]
    pub fn is_ancestor_of(&self, ancestor: &TaskId, id: &TaskId) -> bool {
        self.view().is_ancestor_of(ancestor, id)
    }

    /// Whether `id` is a (possibly indirect) descendant of `ancestor`.
    #[must_use]
    pub fn is_descendant_of(&self, id: &TaskId, ancestor: &TaskId) -> bool {
        self.view().is_ancestor_of(ancestor, id)
    }

    /// Whether `a` and `b` share the same parent (or are both roots).
    #[must_use]
    pub fn is_sibling_of(&self, a: &TaskId, b: &TaskId) -> bool {
        self.view().is_sibling_of(a, b)
    }

    /// The effective status of `id`: the first of
    /// `{done, cancelled, archived}` found walking ancestors toward the
    /// root, or `id`'s own status if no ancestor is terminal.
    #[must_use]
    pub fn effective_status(&self, id: &TaskId) -> Option<Status> {
        self.view().effective_status(id)
    }

    /// The nearest ancestor of `id` with exactly `status`, if any.
    #[must_use]
    pub fn get_ancestor_with_status(&self, id: &TaskId, status: Status) -> Option<TaskId> {
        self.view().get_ancestor_with_status(id, status)
    }
}

/// A borrowed, read-only view over tree structure, shared between
/// [`TaskTree`] and `astrotask_tree::tracking::TrackingTaskTree` so
/// both expose identical navigation/traversal semantics without
/// duplicating the algorithms.
pub(crate) struct TreeView<'a> {
    pub(crate) nodes: &'a HashMap<TaskId, TreeNode>,
    pub(crate) parent: &'a HashMap<TaskId, TaskId>,
    pub(crate) roots: &'a [TaskId],
}

impl TreeView<'_> {
    pub(crate) fn get_task(&self, id: &TaskId) -> Option<&Task> {
        self.nodes.get(id).map(|n| &n.task)
    }

    pub(crate) fn get_parent(&self, id: &TaskId) -> Option<TaskId> {
        self.parent.get(id).cloned()
    }

    pub(crate) fn get_children(&self, id: &TaskId) -> Vec<TaskId> {
        self.nodes
            .get(id)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    pub(crate) fn get_siblings(&self, id: &TaskId) -> Vec<TaskId> {
        let siblings = match self.parent.get(id) {
            Some(parent_id) => self.get_children(parent_id),
            None => self.roots.to_vec(),
        };
        siblings.into_iter().filter(|sid| sid != id).collect()
    }

    pub(crate) fn get_root(&self, id: &TaskId) -> Option<TaskId> {
        if !self.nodes.contains_key(id) {
            return None;
        }
        let mut current = id.clone();
        while let Some(parent_id) = self.parent.get(&current) {
            current = parent_id.clone();
        }
        Some(current)
    }

    pub(crate) fn walk_depth_first(
        &self,
        id: &TaskId,
        visit: &mut dyn FnMut(usize, &TaskId) -> bool,
    ) {
        self.walk_depth_first_rec(id, 0, visit);
    }

    fn walk_depth_first_rec(
        &self,
        id: &TaskId,
        depth: usize,
        visit: &mut dyn FnMut(usize, &TaskId) -> bool,
    ) {
        if !self.nodes.contains_key(id) {
            return;
        }
        if !visit(depth, id) {
            return;
        }
        for child in self.get_children(id) {
            self.walk_depth_first_rec(&child, depth + 1, visit);
        }
    }

    pub(crate) fn walk_breadth_first(
        &self,
        id: &TaskId,
        mut visit: impl FnMut(usize, &TaskId) -> bool,
    ) {
        if !self.nodes.contains_key(id) {
            return;
        }
        let mut queue: VecDeque<(usize, TaskId)> = VecDeque::new();
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

    pub(crate) fn find(&self, id: &TaskId, predicate: impl Fn(&Task) -> bool) -> Option<TaskId> {
        let mut found = None;
        self.walk_depth_first(id, &mut |_, candidate| {
            if found.is_some() {
                return false;
            }
            if let Some(task) = self.get_task(candidate)
                && predicate(task)
            {
                found = Some(candidate.clone());
                return false;
            }
            true
        });
        found
    }

    pub(crate) fn filter(&self, id: &TaskId, predicate: impl Fn(&Task) -> bool) -> Vec<TaskId> {
        let mut matches = Vec::new();
        self.walk_depth_first(id, &mut |_, candidate| {
            if let Some(task) = self.get_task(candidate)
                && predicate(task)
            {
                matches.push(candidate.clone());
            }
            true
        });
        matches
    }

    pub(crate) fn get_path(&self, id: &TaskId) -> Vec<TaskId> {
        if !self.nodes.contains_key(id) {
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

    pub(crate) fn get_depth(&self, id: &TaskId) -> usize {
        self.get_path(id).len().saturating_sub(1)
    }

    pub(crate) fn get_all_descendants(&self, id: &TaskId) -> Vec<TaskId> {
        let mut descendants = Vec::new();
        self.walk_depth_first(id, &mut |_, candidate| {
            if candidate != id {
                descendants.push(candidate.clone());
            }
            true
        });
        descendants
    }

    pub(crate) fn get_descendant_count(&self, id: &TaskId) -> usize {
        self.get_all_descendants(id).len()
    }

    pub(crate) fn is_ancestor_of(&self, ancestor: &TaskId, id: &TaskId) -> bool {
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

    pub(crate) fn is_sibling_of(&self, a: &TaskId, b: &TaskId) -> bool {
        if a == b {
            return false;
        }
        self.parent.get(a) == self.parent.get(b)
    }

    pub(crate) fn effective_status(&self, id: &TaskId) -> Option<Status> {
        let own = self.get_task(id)?.status;
        let mut current = self.parent.get(id).cloned();
        let mut guard = HashSet::new();
        while let Some(ancestor) = current {
            if !guard.insert(ancestor.clone()) {
                break;
            }
            if let Some(task) = self.get_task(&ancestor)
                && task.status.is_terminal_for_descendants()
            {
                return Some(task.status);
            }
            current = self.parent.get(&ancestor).cloned();
        }
        Some(own)
    }

    pub(crate) fn get_ancestor_with_status(&self, id: &TaskId, status: Status) -> Option<TaskId> {
        let mut current = self.parent.get(id).cloned();
        let mut guard = HashSet::new();
        while let Some(ancestor) = current {
            if !guard.insert(ancestor.clone()) {
                return None;
            }
            if self.get_task(&ancestor).is_some_and(|t| t.status == status) {
                return Some(ancestor);
            }
            current = self.parent.get(&ancestor).cloned();
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, parent: Option<&str>, status: Status) -> Task {
        let mut t = Task::new(
            TaskId::parse(id).unwrap(),
            parent.map(|p| TaskId::parse(p).unwrap()),
            id,
            50,
        )
        .unwrap();
        t.status = status;
        t
    }

    fn id(s: &str) -> TaskId {
        TaskId::parse(s).unwrap()
    }

    fn sample() -> TaskTree {
        TaskTree::build([
            task("A", None, Status::Pending),
            task("A-A", Some("A"), Status::Pending),
            task("A-B", Some("A"), Status::Pending),
            task("A-A-A", Some("A-A"), Status::Pending),
        ])
        .unwrap()
    }

    #[test]
    fn navigation_basics() {
        let t = sample();
        assert_eq!(t.get_parent(&id("A-A")), Some(id("A")));
        assert_eq!(t.get_children(&id("A")), vec![id("A-A"), id("A-B")]);
        assert_eq!(t.get_siblings(&id("A-A")), vec![id("A-B")]);
        assert_eq!(t.get_root(&id("A-A-A")), Some(id("A")));
    }

    #[test]
    fn path_and_depth() {
        let t = sample();
        assert_eq!(t.get_path(&id("A-A-A")), vec![id("A"), id("A-A"), id("A-A-A")]);
        assert_eq!(t.get_depth(&id("A-A-A")), 2);
        assert_eq!(t.get_depth(&id("A")), 0);
    }

    #[test]
    fn descendants_and_relations() {
        let t = sample();
        assert_eq!(t.get_descendant_count(&id("A")), 3);
        assert!(t.is_ancestor_of(&id("A"), &id("A-A-A")));
        assert!(t.is_descendant_of(&id("A-A-A"), &id("A")));
        assert!(t.is_sibling_of(&id("A-A"), &id("A-B")));
        assert!(!t.is_sibling_of(&id("A"), &id("A-A")));
    }

    #[test]
    fn rejects_missing_parent() {
        let err = TaskTree::build([task("A-A", Some("A"), Status::Pending)]);
        assert!(err.is_err());
    }

    #[test]
    fn effective_status_propagates_from_ancestor() {
        let t = TaskTree::build([
            task("A", None, Status::Done),
            task("A-A", Some("A"), Status::Pending),
        ])
        .unwrap();
        assert_eq!(t.effective_status(&id("A-A")), Some(Status::Done));
        assert_eq!(t.effective_status(&id("A")), Some(Status::Done));
    }

    #[test]
    fn effective_status_falls_back_to_own_status() {
        let t = sample();
        assert_eq!(t.effective_status(&id("A-A-A")), Some(Status::Pending));
    }

    #[test]
    fn get_ancestor_with_status_finds_nearest_match() {
        let t = TaskTree::build([
            task("A", None, Status::Cancelled),
            task("A-A", Some("A"), Status::Done),
            task("A-A-A", Some("A-A"), Status::Pending),
        ])
        .unwrap();
        assert_eq!(
            t.get_ancestor_with_status(&id("A-A-A"), Status::Done),
            Some(id("A-A"))
        );
        assert_eq!(
            t.get_ancestor_with_status(&id("A-A-A"), Status::Cancelled),
            Some(id("A"))
        );
    }
}
