// src/optimize/order/ma_dfs.rs

//! Memory-aware depth-first search.
//!
//! Reverse DFS finish order is a topological order for any choice of roots
//! and child order. Visiting heavy cached nodes first keeps each heavy
//! branch together, so its results are consumed and released sooner.

use crate::dag::{CacheSet, ExecutionOrder, NodeId};
use crate::optimize::order::OrderContext;
use crate::optimize::problem::Problem;

pub fn optimize(
    problem: &Problem<'_>,
    cache_set: &CacheSet,
    _current: &ExecutionOrder,
    _ctx: &mut OrderContext,
) -> ExecutionOrder {
    let graph = problem.graph;
    let weights = problem.effective_weights(cache_set);
    let heaviest_first = |ids: &mut Vec<NodeId>| {
        ids.sort_by(|a, b| weights[b.0].cmp(&weights[a.0]).then(a.cmp(b)));
    };

    let mut roots: Vec<NodeId> = graph.nodes().collect();
    heaviest_first(&mut roots);

    let mut visited = vec![false; graph.len()];
    let mut finished = Vec::with_capacity(graph.len());
    // (node, children by weight, next child to visit)
    let mut stack: Vec<(NodeId, Vec<NodeId>, usize)> = Vec::new();

    for root in roots {
        if visited[root.0] {
            continue;
        }
        visited[root.0] = true;
        let mut children = graph.successors(root).to_vec();
        heaviest_first(&mut children);
        stack.push((root, children, 0));

        while let Some((node, children, next)) = stack.last_mut() {
            if let Some(&child) = children.get(*next) {
                *next += 1;
                if !visited[child.0] {
                    visited[child.0] = true;
                    let mut grandchildren = graph.successors(child).to_vec();
                    heaviest_first(&mut grandchildren);
                    stack.push((child, grandchildren, 0));
                }
            } else {
                finished.push(*node);
                stack.pop();
            }
        }
    }

    finished.reverse();
    ExecutionOrder::from_unchecked(finished)
}
