//! Property-based tests for `DependencyGraph` invariants:
//! topological order respects every edge, and cycle detection is
//! accurate against randomly generated DAGs.

use astrotask_core::{Status, TaskId};
use astrotask_graph::DependencyGraph;
use proptest::prelude::*;
use std::collections::HashMap;

fn tid(n: usize) -> TaskId {
    TaskId::root(n as u64)
}

/// Generate a DAG: each task may depend only on tasks with a strictly
/// lower index, so the construction can never introduce a cycle.
fn dag_strategy(max_tasks: usize) -> impl Strategy<Value = Vec<(usize, Vec<usize>)>> {
    (1..=max_tasks).prop_flat_map(|task_count| {
        let dep_strategies: Vec<_> = (0..task_count)
            .map(|i| {
                if i == 0 {
                    Just(Vec::<usize>::new()).boxed()
                } else {
                    proptest::collection::vec(0..i, 0..=i.min(3))
                        .prop_map(|deps| {
                            deps.into_iter()
                                .collect::<std::collections::HashSet<_>>()
                                .into_iter()
                                .collect()
                        })
                        .boxed()
                }
            })
            .collect();
        dep_strategies
            .into_iter()
            .collect::<Vec<_>>()
            .prop_map(move |all_deps| (0..task_count).zip(all_deps).collect())
    })
}

fn build(spec: &[(usize, Vec<usize>)]) -> DependencyGraph {
    let tasks = spec.iter().map(|(i, _)| (tid(*i), Status::Pending));
    let edges = spec
        .iter()
        .flat_map(|(i, deps)| deps.iter().map(move |d| (tid(*i), tid(*d))))
        .collect::<Vec<_>>();
    DependencyGraph::build(tasks, edges)
}

proptest! {
    #[test]
    fn topological_order_respects_every_edge(spec in dag_strategy(12)) {
        let graph = build(&spec);
        let order = graph.get_topological_order().expect("constructed DAG must be acyclic");
        let position: HashMap<TaskId, usize> =
            order.iter().cloned().enumerate().map(|(i, id)| (id, i)).collect();

        for (i, deps) in &spec {
            let dependent_pos = position[&tid(*i)];
            for d in deps {
                let dependency_pos = position[&tid(*d)];
                prop_assert!(dependency_pos < dependent_pos);
            }
        }
    }

    #[test]
    fn generated_dags_never_report_cycles(spec in dag_strategy(10)) {
        let graph = build(&spec);
        prop_assert!(!graph.find_cycles().has_cycles());
    }

    #[test]
    fn restricted_topological_order_is_a_valid_subsequence(spec in dag_strategy(10)) {
        let graph = build(&spec);
        let ids: Vec<TaskId> = spec.iter().map(|(i, _)| tid(*i)).collect();
        let restricted = graph
            .get_topological_order_for_tasks(&ids)
            .expect("restricted order over a DAG must succeed");
        prop_assert_eq!(restricted.len(), ids.len());

        let position: HashMap<TaskId, usize> =
            restricted.iter().cloned().enumerate().map(|(i, id)| (id, i)).collect();
        for (i, deps) in &spec {
            for d in deps {
                prop_assert!(position[&tid(*d)] < position[&tid(*i)]);
            }
        }
    }

    #[test]
    fn would_create_cycle_never_mutates_the_graph(spec in dag_strategy(8)) {
        let graph = build(&spec);
        if graph.nodes().len() >= 2 {
            let first = graph.nodes()[0].clone();
            let last = graph.nodes()[graph.nodes().len() - 1].clone();
            let _ = graph.would_create_cycle(&last, &first);
            prop_assert!(!graph.find_cycles().has_cycles());
            prop_assert_eq!(graph.nodes().len(), spec.len());
        }
    }
}
