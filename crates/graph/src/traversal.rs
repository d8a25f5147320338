//! Supporting result types for dependency-graph queries.

use astrotask_core::TaskId;

/// A topologically sorted sequence of task ids (dependencies before dependents).
pub type TopologicalOrder = Vec<TaskId>;

/// The dependency/dependent/blocking projection for a single task, as
/// returned by [`crate::DependencyGraph::task_dependency_info`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDependencyInfo {
    /// The task this projection is about.
    pub id: TaskId,
    /// Tasks this one directly depends on, in insertion order.
    pub dependencies: Vec<TaskId>,
    /// Tasks that directly depend on this one, in insertion order.
    pub dependents: Vec<TaskId>,
    /// Whether any dependency is not yet `done`/`cancelled`/`archived`.
    pub is_blocked: bool,
    /// The dependencies currently responsible for `is_blocked`.
    pub blocked_by: Vec<TaskId>,
}

/// The outcome of a cycle search: either the graph is acyclic, or one or
/// more cycles were found, each reported as the ordered path of ids that
/// forms the cycle (first id repeats at the end).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Every distinct cycle found.
    pub cycles: Vec<Vec<TaskId>>,
}

impl CycleReport {
    /// Whether any cycle was found.
    #[must_use]
    pub fn has_cycles(&self) -> bool {
        !self.cycles.is_empty()
    }
}

/// Aggregate structural metrics over a dependency graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphMetrics {
    /// Total number of distinct task ids appearing in the graph.
    pub total_tasks: usize,
    /// Tasks with no dependencies.
    pub root_count: usize,
    /// Tasks with no dependents.
    pub leaf_count: usize,
    /// The longest dependency chain ending at any task (0 for an empty graph).
    pub max_depth: usize,
    /// Mean number of direct dependencies per task.
    pub avg_dependencies: f64,
    /// Whether the graph currently contains a cycle.
    pub has_cycles: bool,
    /// Number of strongly connected components (equals `total_tasks` in an
    /// acyclic graph; smaller when cycles collapse nodes into one component).
    pub scc_count: usize,
}
