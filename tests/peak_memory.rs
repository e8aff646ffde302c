// tests/peak_memory.rs

use proptest::prelude::*;

use cachedag::dag::{peak_memory, ExecutionOrder, NodeSet, PeakMemory, TaskGraph};
use cachedag::errors::CachedagError;
use cachedag_test_utils::builders::{layered_fixture, Fixture};

#[test]
fn chain_releases_producer_before_next_node_runs() {
    let f = Fixture::chain();
    let order = f.order(&["A", "B", "C"]);
    let cached = f.set(&["A", "C"]);

    assert_eq!(peak_memory(&f.graph, &order, &f.sizes, &cached), 5);
}

#[test]
fn diamond_keeps_both_branches_until_join() {
    let f = Fixture::diamond();
    let order = f.order(&["A", "B", "C", "D"]);

    assert_eq!(peak_memory(&f.graph, &order, &f.sizes, &f.set(&["B", "C"])), 10);
    assert_eq!(peak_memory(&f.graph, &order, &f.sizes, &f.set(&["A", "B"])), 15);
    assert_eq!(peak_memory(&f.graph, &order, &f.sizes, &f.set(&["A"])), 10);
}

#[test]
fn empty_cache_set_uses_no_memory() {
    let f = Fixture::diamond();
    let order = f.order(&["A", "C", "B", "D"]);
    assert_eq!(peak_memory(&f.graph, &order, &f.sizes, &NodeSet::empty_for(&f.graph)), 0);
}

#[test]
fn reusable_simulator_matches_pure_function() {
    let f = Fixture::diamond();
    let order = f.order(&["A", "B", "C", "D"]);
    let mut simulator = PeakMemory::new(&f.graph, &f.sizes);

    for names in [&["B"][..], &["A", "C"], &["B", "C"], &["A", "B", "C"]] {
        let set = f.set(names);
        assert_eq!(
            simulator.evaluate(&order, &set),
            peak_memory(&f.graph, &order, &f.sizes, &set),
            "cache set {names:?}"
        );
    }

    let mut set = f.set(&["B"]);
    assert_eq!(simulator.evaluate_with(&order, &mut set, f.id("C")), 10);
    assert_eq!(set, f.set(&["B"]), "tentative insert must be undone");
}

#[test]
fn builder_rejects_cycles() {
    let result = TaskGraph::builder()
        .node("A", &["B"])
        .node("B", &["A"])
        .build();

    match result {
        Err(CachedagError::DagCycle(msg)) => assert!(msg.contains("cycle detected")),
        other => panic!("Expected DagCycle error, got: {:?}", other),
    }
}

#[test]
fn builder_rejects_unknown_duplicate_and_self_dependencies() {
    assert!(matches!(
        TaskGraph::builder().node("A", &["missing"]).build(),
        Err(CachedagError::NodeNotFound(_))
    ));
    assert!(matches!(
        TaskGraph::builder().node("A", &[] as &[&str]).node("A", &[] as &[&str]).build(),
        Err(CachedagError::DuplicateNode(_))
    ));
    assert!(matches!(
        TaskGraph::builder().node("A", &["A"]).build(),
        Err(CachedagError::SelfLoop(_))
    ));
}

#[test]
fn builder_deduplicates_dependencies() {
    let graph = TaskGraph::builder()
        .node("A", &[] as &[&str])
        .node("B", &["A", "A"])
        .build()
        .unwrap();

    assert_eq!(graph.edge_count(), 1);
    assert_eq!(graph.successors(graph.id("A").unwrap()).len(), 1);
}

#[test]
fn orders_are_validated_against_the_graph() {
    let f = Fixture::diamond();

    assert!(matches!(
        ExecutionOrder::from_names(&f.graph, &["B", "A", "C", "D"]),
        Err(CachedagError::InvalidOrder(_))
    ));
    assert!(matches!(
        ExecutionOrder::from_names(&f.graph, &["A", "B", "D"]),
        Err(CachedagError::InvalidOrder(_))
    ));
    assert!(matches!(
        ExecutionOrder::from_names(&f.graph, &["A", "B", "B", "D"]),
        Err(CachedagError::InvalidOrder(_))
    ));

    let default = f.graph.topological_order();
    assert!(f.graph.check_order(&default).is_ok());
}

fn dag_strategy(max_nodes: usize) -> impl Strategy<Value = (Vec<u64>, Vec<Vec<usize>>, Vec<bool>)> {
    (1..=max_nodes).prop_flat_map(|n| {
        (
            proptest::collection::vec(0u64..50, n),
            proptest::collection::vec(proptest::collection::vec(any::<usize>(), 0..3), n),
            proptest::collection::vec(any::<bool>(), n),
        )
    })
}

proptest! {
    #[test]
    fn peak_is_zero_iff_nothing_cached_and_bounds_largest_member(
        (sizes, deps, mask) in dag_strategy(10)
    ) {
        let scores = vec![1.0; sizes.len()];
        let f = layered_fixture(&sizes, &scores, &deps);
        let order = f.graph.topological_order();
        let set = NodeSet::from_nodes(
            f.graph.len(),
            f.graph.nodes().filter(|id| mask[id.index()] && sizes[id.index()] > 0),
        );

        let peak = peak_memory(&f.graph, &order, &f.sizes, &set);
        if set.is_empty() {
            prop_assert_eq!(peak, 0);
        } else {
            let largest = set.iter().map(|id| sizes[id.index()]).max().unwrap();
            prop_assert!(peak >= largest);
            prop_assert!(peak > 0);
        }
        prop_assert!(peak <= set.iter().map(|id| sizes[id.index()]).sum::<u64>());
    }
}
