//! [`TrackingDependencyGraph`]: the mutable overlay that accumulates
//! dependency edits against a base [`DependencyGraph`] and submits them
//! as a batch.

use crate::error::{Error, Result};
use crate::graph::DependencyGraph;
use astrotask_core::{NodeId, PendingOperation, TaskId, next_op_timestamp};
use std::collections::HashMap;

/// Bridges [`TrackingDependencyGraph::flush`] to whatever persists
/// dependency edits (an `astrotask-store`-backed service in the full
/// system). Defined here, at the consumer end, so this crate never
/// depends on the store crate.
#[async_trait::async_trait]
pub trait DependencyReconciliationService {
    /// Persist `operations` and report which ones were actually applied.
    ///
    /// # Errors
    ///
    /// Implementations return an error on any failure to persist.
    async fn apply(
        &self,
        operations: Vec<PendingOperation>,
    ) -> std::result::Result<DependencyFlushOutcome, Box<dyn std::error::Error + Send + Sync>>;
}

/// The result of a successful [`TrackingDependencyGraph::flush`].
#[derive(Debug, Clone)]
pub struct DependencyFlushOutcome {
    /// The operations the service actually applied.
    pub applied: Vec<PendingOperation>,
}

/// A [`DependencyGraph`] overlaid with not-yet-persisted edge edits.
///
/// Endpoints of a pending edit are [`NodeId`]s, not bare [`TaskId`]s,
/// because a dependency can be declared against a task added earlier in
/// the same batch and not yet flushed (see `SPEC_FULL.md` §9 on joint
/// flush ordering).
#[derive(Debug, Clone)]
pub struct TrackingDependencyGraph {
    base: DependencyGraph,
    pending: Vec<PendingOperation>,
    deps_of: HashMap<NodeId, Vec<NodeId>>,
    dependents_of: HashMap<NodeId, Vec<NodeId>>,
}

impl TrackingDependencyGraph {
    /// Wrap a base graph with an empty pending-operation log.
    #[must_use]
    pub fn new(base: DependencyGraph) -> Self {
        let mut deps_of = HashMap::new();
        let mut dependents_of = HashMap::new();
        for id in base.nodes() {
            let node = NodeId::Stable(id.clone());
            let deps: Vec<NodeId> = base
                .get_dependencies(id)
                .into_iter()
                .map(NodeId::Stable)
                .collect();
            let dependents: Vec<NodeId> = base
                .get_dependents(id)
                .into_iter()
                .map(NodeId::Stable)
                .collect();
            deps_of.insert(node.clone(), deps);
            dependents_of.insert(node, dependents);
        }
        Self {
            base,
            pending: Vec::new(),
            deps_of,
            dependents_of,
        }
    }

    /// The underlying, not-yet-flushed base graph.
    #[must_use]
    pub fn base(&self) -> &DependencyGraph {
        &self.base
    }

    /// Whether any edit is pending.
    #[must_use]
    pub fn has_pending_changes(&self) -> bool {
        !self.pending.is_empty()
    }

    /// The accumulated, not-yet-flushed operations, oldest first.
    #[must_use]
    pub fn pending_operations(&self) -> &[PendingOperation] {
        &self.pending
    }

    /// Dependencies of `id` under the current-plus-pending state.
    #[must_use]
    pub fn get_dependencies(&self, id: &NodeId) -> Vec<NodeId> {
        self.deps_of.get(id).cloned().unwrap_or_default()
    }

    /// Dependents of `id` under the current-plus-pending state.
    #[must_use]
    pub fn get_dependents(&self, id: &NodeId) -> Vec<NodeId> {
        self.dependents_of.get(id).cloned().unwrap_or_default()
    }

    fn register(&mut self, id: &NodeId) {
        self.deps_of.entry(id.clone()).or_default();
        self.dependents_of.entry(id.clone()).or_default();
    }

    /// Record a new `dependent -> dependency` edge, validating eagerly
    /// that it is not a self-edge and would not create a cycle in the
    /// effective (current-plus-pending) graph.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SelfDependency`] or [`Error::WouldCreateCycle`]
    /// when either endpoint resolves to a known, stable id and the check
    /// fails. Edges naming a still-provisional endpoint are trusted
    /// (they cannot yet be cycle-checked against the stable graph) and
    /// re-validated once flushed.
    pub fn add_dependency(&mut self, dependent: NodeId, dependency: NodeId) -> Result<()> {
        if dependent == dependency {
            if let NodeId::Stable(task) = &dependent {
                return Err(Error::SelfDependency { task: task.clone() });
            }
        }

        if let (NodeId::Stable(dependent_id), NodeId::Stable(dependency_id)) =
            (&dependent, &dependency)
        {
            let report = self.base.would_create_cycle(dependent_id, dependency_id);
            if report.has_cycles() {
                return Err(Error::WouldCreateCycle {
                    dependent: dependent_id.clone(),
                    dependency: dependency_id.clone(),
                    cycle: report.cycles.into_iter().next().unwrap_or_default(),
                });
            }
        }

        self.register(&dependent);
        self.register(&dependency);
        let deps = self.deps_of.entry(dependent.clone()).or_default();
        if !deps.contains(&dependency) {
            deps.push(dependency.clone());
            self.dependents_of
                .entry(dependency.clone())
                .or_default()
                .push(dependent.clone());
        }

        self.pending.push(PendingOperation::DependencyAdd {
            dependent,
            dependency,
            ts: next_op_timestamp(),
        });
        Ok(())
    }

    /// Record removal of a `dependent -> dependency` edge. Never fails:
    /// removing an edge can never introduce a cycle, and removing an
    /// edge that does not exist is a no-op against the overlay (the
    /// removal is still recorded, since the base may have it).
    pub fn remove_dependency(&mut self, dependent: NodeId, dependency: NodeId) {
        if let Some(deps) = self.deps_of.get_mut(&dependent) {
            deps.retain(|d| d != &dependency);
        }
        if let Some(dependents) = self.dependents_of.get_mut(&dependency) {
            dependents.retain(|d| d != &dependent);
        }
        self.pending.push(PendingOperation::DependencyRemove {
            dependent,
            dependency,
            ts: next_op_timestamp(),
        });
    }

    /// Rewrite pending-operation and overlay endpoints from provisional
    /// to stable ids, after a companion tree flush has materialized them.
    pub fn apply_id_mappings(&mut self, mappings: &HashMap<NodeId, TaskId>) {
        let resolve = |id: &NodeId| -> NodeId {
            mappings
                .get(id)
                .cloned()
                .map(NodeId::Stable)
                .unwrap_or_else(|| id.clone())
        };

        self.pending = std::mem::take(&mut self.pending)
            .into_iter()
            .map(|op| match op {
                PendingOperation::DependencyAdd {
                    dependent,
                    dependency,
                    ts,
                } => PendingOperation::DependencyAdd {
                    dependent: resolve(&dependent),
                    dependency: resolve(&dependency),
                    ts,
                },
                PendingOperation::DependencyRemove {
                    dependent,
                    dependency,
                    ts,
                } => PendingOperation::DependencyRemove {
                    dependent: resolve(&dependent),
                    dependency: resolve(&dependency),
                    ts,
                },
                other => other,
            })
            .collect();

        let remap_map = |map: &HashMap<NodeId, Vec<NodeId>>| -> HashMap<NodeId, Vec<NodeId>> {
            map.iter()
                .map(|(k, v)| (resolve(k), v.iter().map(resolve).collect()))
                .collect()
        };
        self.deps_of = remap_map(&self.deps_of);
        self.dependents_of = remap_map(&self.dependents_of);
    }

    /// Submit pending operations through `service`, then fold the
    /// applied ones into a fresh base graph and clear the pending log.
    ///
    /// # Errors
    ///
    /// Propagates whatever the service reports; on error, pending
    /// operations are left untouched so the caller can retry.
    pub async fn flush(
        &mut self,
        service: &dyn DependencyReconciliationService,
    ) -> std::result::Result<DependencyFlushOutcome, Box<dyn std::error::Error + Send + Sync>>
    {
        if self.pending.is_empty() {
            return Ok(DependencyFlushOutcome { applied: Vec::new() });
        }
        let operations = std::mem::take(&mut self.pending);
        let outcome = service.apply(operations).await?;

        let mut base = self.base.clone();
        for op in &outcome.applied {
            match op {
                PendingOperation::DependencyAdd {
                    dependent,
                    dependency,
                    ..
                } => {
                    if let (Some(dependent), Some(dependency)) =
                        (astrotask_core::expect_stable(dependent), astrotask_core::expect_stable(dependency))
                    {
                        base = base.with_dependency(dependent.clone(), dependency.clone());
                    }
                }
                PendingOperation::DependencyRemove {
                    dependent,
                    dependency,
                    ..
                } => {
                    if let (Some(dependent), Some(dependency)) =
                        (astrotask_core::expect_stable(dependent), astrotask_core::expect_stable(dependency))
                    {
                        base = base.without_dependency(dependent, dependency);
                    }
                }
                _ => {}
            }
        }
        *self = Self::new(base);
        Ok(outcome)
    }
}
