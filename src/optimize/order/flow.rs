// src/optimize/order/flow.rs

//! Dinic max-flow over integer capacities, with residual reachability for
//! reading off a minimum cut.

use std::collections::VecDeque;

#[derive(Debug, Clone, Copy)]
struct Edge {
    to: usize,
    capacity: u64,
}

/// Directed flow network. Edges are stored in pairs: edge `2k` is the
/// forward arc and `2k + 1` its residual reverse arc.
#[derive(Debug, Clone)]
pub struct FlowNetwork {
    edges: Vec<Edge>,
    adjacency: Vec<Vec<usize>>,
}

impl FlowNetwork {
    pub fn new(vertex_count: usize) -> Self {
        Self {
            edges: Vec::new(),
            adjacency: vec![Vec::new(); vertex_count],
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn add_edge(&mut self, from: usize, to: usize, capacity: u64) {
        self.adjacency[from].push(self.edges.len());
        self.edges.push(Edge { to, capacity });
        self.adjacency[to].push(self.edges.len());
        self.edges.push(Edge { to: from, capacity: 0 });
    }

    /// Push as much flow as possible from `source` to `sink` and return its
    /// value. Capacities are consumed: afterwards they hold residuals.
    pub fn max_flow(&mut self, source: usize, sink: usize) -> u64 {
        let mut total: u64 = 0;
        let mut level = vec![usize::MAX; self.vertex_count()];
        let mut next_edge = vec![0usize; self.vertex_count()];

        while self.build_levels(source, sink, &mut level) {
            next_edge.iter_mut().for_each(|e| *e = 0);
            loop {
                let pushed = self.augment(source, sink, &level, &mut next_edge);
                if pushed == 0 {
                    break;
                }
                total = total.saturating_add(pushed);
            }
        }

        total
    }

    /// Vertices reachable from `source` through arcs with residual capacity.
    /// After [`max_flow`](Self::max_flow) this is the source side of a
    /// minimum cut.
    pub fn reachable_from(&self, source: usize) -> Vec<bool> {
        let mut seen = vec![false; self.vertex_count()];
        let mut queue = VecDeque::from([source]);
        seen[source] = true;

        while let Some(v) = queue.pop_front() {
            for &e in &self.adjacency[v] {
                let edge = &self.edges[e];
                if edge.capacity > 0 && !seen[edge.to] {
                    seen[edge.to] = true;
                    queue.push_back(edge.to);
                }
            }
        }

        seen
    }

    fn build_levels(&self, source: usize, sink: usize, level: &mut [usize]) -> bool {
        level.iter_mut().for_each(|l| *l = usize::MAX);
        level[source] = 0;
        let mut queue = VecDeque::from([source]);

        while let Some(v) = queue.pop_front() {
            for &e in &self.adjacency[v] {
                let edge = &self.edges[e];
                if edge.capacity > 0 && level[edge.to] == usize::MAX {
                    level[edge.to] = level[v] + 1;
                    queue.push_back(edge.to);
                }
            }
        }

        level[sink] != usize::MAX
    }

    /// Find one augmenting path in the level graph and push its bottleneck.
    ///
    /// Walks forward along `next_edge` and retreats on dead ends, keeping
    /// the current path as a stack of edge indices. Paths can be as long as
    /// the network, so this must not recurse.
    fn augment(&mut self, source: usize, sink: usize, level: &[usize], next_edge: &mut [usize]) -> u64 {
        let mut path: Vec<usize> = Vec::new();
        let mut v = source;

        loop {
            if v == sink {
                let pushed = path.iter().map(|&e| self.edges[e].capacity).min().unwrap_or(0);
                for &e in &path {
                    self.edges[e].capacity -= pushed;
                    self.edges[e ^ 1].capacity += pushed;
                }
                return pushed;
            }

            let mut advanced = false;
            while next_edge[v] < self.adjacency[v].len() {
                let e = self.adjacency[v][next_edge[v]];
                let Edge { to, capacity } = self.edges[e];
                if capacity > 0 && level[to] == level[v] + 1 {
                    path.push(e);
                    v = to;
                    advanced = true;
                    break;
                }
                next_edge[v] += 1;
            }

            if !advanced {
                // Dead end: drop the arc that led here and try the next one.
                let Some(e) = path.pop() else {
                    return 0;
                };
                v = self.edges[e ^ 1].to;
                next_edge[v] += 1;
            }
        }
    }
}
