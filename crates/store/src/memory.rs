//! An in-memory [`Store`] reference implementation.
//!
//! Exists only so this workspace's own tests (and
//! `astrotask-services`'s tests) have something to flush against; it
//! is not a production backend, the way the teacher's `test_utils`
//! module ships fixtures rather than a second real engine.

use crate::error::{Error, Result};
use crate::types::{CreateTask, ReconciliationOutcome, ReconciliationPlan, TaskFilter};
use crate::Store;
use astrotask_core::{ContextSlice, NodeId, PendingOperation, PendingSubtree, Task, TaskId};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Default)]
struct State {
    tasks: HashMap<TaskId, Task>,
    children: HashMap<TaskId, Vec<TaskId>>,
    roots: Vec<TaskId>,
    dependencies: HashMap<TaskId, Vec<TaskId>>,
    context_slices: HashMap<TaskId, Vec<ContextSlice>>,
    next_root_index: u64,
    next_child_index: HashMap<TaskId, u64>,
}

impl State {
    fn allocate_id(&mut self, parent: Option<&TaskId>) -> TaskId {
        match parent {
            Some(parent) => {
                let counter = self.next_child_index.entry(parent.clone()).or_insert(0);
                let id = parent.child(*counter);
                *counter += 1;
                id
            }
            None => {
                let id = TaskId::root(self.next_root_index);
                self.next_root_index += 1;
                id
            }
        }
    }

    fn insert_subtree(
        &mut self,
        parent: Option<TaskId>,
        subtree: PendingSubtree,
        mappings: &mut HashMap<NodeId, TaskId>,
    ) {
        let id = self.allocate_id(parent.as_ref());
        let task = Task {
            id: id.clone(),
            parent_id: parent.clone(),
            title: subtree.content.title,
            description: subtree.content.description,
            status: subtree.content.status,
            priority_score: subtree.content.priority_score,
            prd: subtree.content.prd,
            context_digest: subtree.content.context_digest,
            created_at: subtree.content.created_at,
            updated_at: subtree.content.updated_at,
        };
        mappings.insert(subtree.provisional_id, id.clone());
        self.tasks.insert(id.clone(), task);
        match &parent {
            Some(parent) => self.children.entry(parent.clone()).or_default().push(id.clone()),
            None => self.roots.push(id.clone()),
        }
        for child in subtree.children {
            self.insert_subtree(Some(id.clone()), child, mappings);
        }
    }

    fn remove_subtree(&mut self, id: &TaskId) {
        let children = self.children.remove(id).unwrap_or_default();
        for child in children {
            self.remove_subtree(&child);
        }
        self.tasks.remove(id);
        self.dependencies.remove(id);
        self.context_slices.remove(id);
        for deps in self.dependencies.values_mut() {
            deps.retain(|d| d != id);
        }
        self.roots.retain(|r| r != id);
    }

    fn materialize(&self) -> astrotask_tree::TaskTree {
        astrotask_tree::TaskTree::build(self.tasks.values().cloned())
            .expect("in-memory state always forms a valid forest")
    }
}

/// An in-memory, single-process [`Store`].
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn add_task(&self, create: CreateTask) -> Result<Task> {
        let mut state = self.state.lock().expect("lock poisoned");
        if let Some(parent) = &create.parent_id
            && !state.tasks.contains_key(parent)
        {
            return Err(Error::Core(astrotask_core::Error::not_found(format!(
                "parent {parent} does not exist"
            ))));
        }
        let mut task = Task::new(
            TaskId::root(0),
            create.parent_id.clone(),
            create.title,
            create.priority_score,
        )
        .map_err(Error::Core)?;
        task.id = state.allocate_id(create.parent_id.as_ref());
        task.description = create.description;
        task.prd = create.prd;
        task.context_digest = create.context_digest;

        state.tasks.insert(task.id.clone(), task.clone());
        match &create.parent_id {
            Some(parent) => state.children.entry(parent.clone()).or_default().push(task.id.clone()),
            None => state.roots.push(task.id.clone()),
        }
        tracing::debug!(id = %task.id, "task created");
        Ok(task)
    }

    async fn get_task(&self, id: &TaskId) -> Result<Option<Task>> {
        Ok(self.state.lock().expect("lock poisoned").tasks.get(id).cloned())
    }

    async fn list_tasks(&self, filter: TaskFilter) -> Result<Vec<Task>> {
        let state = self.state.lock().expect("lock poisoned");
        let mut tasks: Vec<Task> = state
            .tasks
            .values()
            .filter(|t| filter.status.is_none_or(|s| t.status == s))
            .filter(|t| {
                filter
                    .parent_id
                    .as_ref()
                    .is_none_or(|p| &t.parent_id == p)
            })
            .filter(|t| filter.min_priority.is_none_or(|min| t.priority_score >= min))
            .cloned()
            .collect();
        tasks.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(tasks)
    }

    async fn update_task(
        &self,
        id: &TaskId,
        updates: astrotask_core::TaskUpdateFields,
    ) -> Result<Option<Task>> {
        let mut state = self.state.lock().expect("lock poisoned");
        let Some(task) = state.tasks.get_mut(id) else {
            return Ok(None);
        };
        task.apply_update_fields(&updates);
        Ok(Some(task.clone()))
    }

    async fn delete_task(&self, id: &TaskId, cascade: bool) -> Result<bool> {
        let mut state = self.state.lock().expect("lock poisoned");
        if !state.tasks.contains_key(id) {
            return Ok(false);
        }
        let has_children = state.children.get(id).is_some_and(|c| !c.is_empty());
        if has_children && !cascade {
            return Ok(false);
        }
        state.remove_subtree(id);
        Ok(true)
    }

    async fn list_context_slices(&self, task_id: &TaskId) -> Result<Vec<ContextSlice>> {
        Ok(self
            .state
            .lock()
            .expect("lock poisoned")
            .context_slices
            .get(task_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn add_dependency(&self, dependent: &TaskId, dependency: &TaskId) -> Result<()> {
        let mut state = self.state.lock().expect("lock poisoned");
        if dependent == dependency {
            return Err(Error::Core(astrotask_core::Error::validation(format!(
                "task {dependent} cannot depend on itself"
            ))));
        }
        if !state.tasks.contains_key(dependent) || !state.tasks.contains_key(dependency) {
            return Err(Error::Core(astrotask_core::Error::not_found(
                "both dependency endpoints must exist",
            )));
        }
        let deps = state.dependencies.entry(dependent.clone()).or_default();
        if !deps.contains(dependency) {
            deps.push(dependency.clone());
        }
        Ok(())
    }

    async fn remove_dependency(&self, dependent: &TaskId, dependency: &TaskId) -> Result<()> {
        let mut state = self.state.lock().expect("lock poisoned");
        if let Some(deps) = state.dependencies.get_mut(dependent) {
            deps.retain(|d| d != dependency);
        }
        Ok(())
    }

    async fn list_dependencies(&self, id: &TaskId) -> Result<Vec<TaskId>> {
        Ok(self
            .state
            .lock()
            .expect("lock poisoned")
            .dependencies
            .get(id)
            .cloned()
            .unwrap_or_default())
    }

    async fn execute_reconciliation_operations(
        &self,
        plan: ReconciliationPlan,
    ) -> Result<ReconciliationOutcome> {
        let mut state = self.state.lock().expect("lock poisoned");
        let mut id_mappings = HashMap::new();

        tracing::debug!(
            tree_id = %plan.tree_id,
            op_count = plan.operations.len(),
            "applying reconciliation plan"
        );

        for op in plan.operations {
            match op {
                PendingOperation::TaskUpdate { task_id, updates, .. } => {
                    let Some(stable) = astrotask_core::expect_stable(&task_id) else {
                        continue;
                    };
                    if let Some(task) = state.tasks.get_mut(stable) {
                        task.apply_update_fields(&updates);
                    }
                }
                PendingOperation::ChildAdd { parent_id, child, .. } => {
                    let parent = astrotask_core::expect_stable(&parent_id).cloned();
                    state.insert_subtree(parent, child, &mut id_mappings);
                }
                PendingOperation::ChildRemove { child_id, .. } => {
                    if let Some(stable) = astrotask_core::expect_stable(&child_id) {
                        state.remove_subtree(stable);
                    }
                }
                PendingOperation::DependencyAdd {
                    dependent,
                    dependency,
                    ..
                } => {
                    if let (Some(dependent), Some(dependency)) = (
                        astrotask_core::expect_stable(&dependent),
                        astrotask_core::expect_stable(&dependency),
                    ) {
                        let deps = state.dependencies.entry(dependent.clone()).or_default();
                        if !deps.contains(dependency) {
                            deps.push(dependency.clone());
                        }
                    }
                }
                PendingOperation::DependencyRemove {
                    dependent,
                    dependency,
                    ..
                } => {
                    if let (Some(dependent), Some(dependency)) = (
                        astrotask_core::expect_stable(&dependent),
                        astrotask_core::expect_stable(&dependency),
                    ) {
                        if let Some(deps) = state.dependencies.get_mut(dependent) {
                            deps.retain(|d| d != dependency);
                        }
                    }
                }
            }
        }

        Ok(ReconciliationOutcome {
            tree: state.materialize(),
            id_mappings,
        })
    }
}

trait ApplyUpdateFields {
    fn apply_update_fields(&mut self, updates: &astrotask_core::TaskUpdateFields);
}

impl ApplyUpdateFields for Task {
    fn apply_update_fields(&mut self, updates: &astrotask_core::TaskUpdateFields) {
        if let Some(title) = &updates.title {
            self.title = title.clone();
        }
        if let Some(description) = &updates.description {
            self.description = Some(description.clone());
        }
        if let Some(status) = updates.status {
            self.status = status;
        }
        if let Some(score) = updates.priority_score {
            self.priority_score = score;
        }
        if let Some(prd) = &updates.prd {
            self.prd = Some(prd.clone());
        }
        if let Some(digest) = &updates.context_digest {
            self.context_digest = Some(digest.clone());
        }
        self.updated_at = chrono::Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn add_and_get_round_trips() {
        let store = InMemoryStore::new();
        let task = store.add_task(CreateTask::new("root")).await.unwrap();
        assert_eq!(task.id, TaskId::root(0));
        let fetched = store.get_task(&task.id).await.unwrap();
        assert_eq!(fetched, Some(task));
    }

    #[tokio::test]
    async fn child_ids_extend_parent() {
        let store = InMemoryStore::new();
        let root = store.add_task(CreateTask::new("root")).await.unwrap();
        let mut child = CreateTask::new("child");
        child.parent_id = Some(root.id.clone());
        let child = store.add_task(child).await.unwrap();
        assert_eq!(child.id, root.id.child(0));
    }

    #[tokio::test]
    async fn delete_without_cascade_preserves_children() {
        let store = InMemoryStore::new();
        let root = store.add_task(CreateTask::new("root")).await.unwrap();
        let mut child = CreateTask::new("child");
        child.parent_id = Some(root.id.clone());
        store.add_task(child).await.unwrap();

        assert!(!store.delete_task(&root.id, false).await.unwrap());
        assert!(store.delete_task(&root.id, true).await.unwrap());
        assert!(store.get_task(&root.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn dependency_round_trip() {
        let store = InMemoryStore::new();
        let a = store.add_task(CreateTask::new("a")).await.unwrap();
        let b = store.add_task(CreateTask::new("b")).await.unwrap();
        store.add_dependency(&b.id, &a.id).await.unwrap();
        assert_eq!(store.list_dependencies(&b.id).await.unwrap(), vec![a.id.clone()]);
        store.remove_dependency(&b.id, &a.id).await.unwrap();
        assert!(store.list_dependencies(&b.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reconciliation_assigns_stable_ids_and_remaps() {
        let store = InMemoryStore::new();
        let root = store.add_task(CreateTask::new("root")).await.unwrap();

        let provisional = NodeId::Provisional(astrotask_core::ProvisionalId::new("tmp-1"));
        let plan = ReconciliationPlan {
            tree_id: root.id.clone(),
            base_version: 0,
            operations: vec![PendingOperation::ChildAdd {
                parent_id: NodeId::Stable(root.id.clone()),
                child: PendingSubtree {
                    provisional_id: provisional.clone(),
                    content: astrotask_core::TaskContent::new("new child", 50),
                    children: Vec::new(),
                },
                ts: 0,
            }],
        };

        let outcome = store.execute_reconciliation_operations(plan).await.unwrap();
        let stable = outcome.id_mappings.get(&provisional).unwrap();
        assert_eq!(stable, &root.id.child(0));
        assert!(outcome.tree.get_task(stable).is_some());
    }
}
