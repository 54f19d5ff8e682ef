//! Exact maximum-weight independent subset search for small candidate pools.
//!
//! Used by XRLF once the pool `W` of nodes still eligible for the current colour class is small.
//! A node's weight is its degree in the residual subgraph minus its neighbours already in the
//! class `C`; taking heavy nodes leaves a sparser residual graph behind.
//!
//! The search is a plain include/exclude branch-and-bound with two exact reductions applied after
//! every branch:
//! - a node without live neighbours is always taken;
//! - two nodes adjacent only to each other form a component: take the heavier one.
//!
//! Every mutation is recorded on a trail and undone on return, so a single scratch state is
//! shared by the whole recursion.

use crate::graph::NodeId;
use crate::subgraph::{RandomAccessSet, Subgraph};
use rustc_hash::FxHashMap;

/// Returns a maximum-weight independent subset of `w` (ties broken toward more nodes), sorted.
///
/// Nodes of `w` without neighbours in `w` are always part of the result.
pub fn exhaustive_search(w: &[NodeId], subgraph: &Subgraph, c: &RandomAccessSet) -> Vec<NodeId> {
    let local: FxHashMap<NodeId, usize> = w.iter().enumerate().map(|(i, &v)| (v, i)).collect();

    let mut result = Vec::new();
    let mut nodes = Vec::new();
    let mut adjacency = Vec::new();
    let mut weights = Vec::new();
    for &v in w {
        let inside: Vec<usize> =
            subgraph.neighbours(v).iter().filter_map(|u| local.get(u).copied()).collect();
        if inside.is_empty() {
            result.push(v);
            continue;
        }
        let in_class = subgraph.neighbours(v).iter().filter(|&&u| c.contains(u)).count();
        nodes.push(v);
        adjacency.push(inside);
        weights.push(subgraph.node_degree(v) - in_class);
    }

    if !nodes.is_empty() {
        // Re-index adjacency onto the surviving (non-isolated) nodes.
        let mut remap = vec![usize::MAX; w.len()];
        for (i, &v) in nodes.iter().enumerate() {
            remap[local[&v]] = i;
        }
        for list in &mut adjacency {
            for j in list.iter_mut() {
                *j = remap[*j];
            }
        }
        let mut search = Search::new(adjacency, weights);
        search.run();
        result.extend(search.best.iter().map(|&i| nodes[i]));
    }
    result.sort_unstable();
    result
}

// ============================================================================
// Branch and bound state
// ============================================================================

struct Search {
    adjacency: Vec<Vec<usize>>,
    weights: Vec<usize>,
    alive: Vec<bool>,
    live_degree: Vec<usize>,
    alive_count: usize,
    remaining_weight: usize,
    current: Vec<usize>,
    current_weight: usize,
    best: Vec<usize>,
    best_weight: usize,
    trail: Vec<usize>,
    pending: Vec<usize>,
}

impl Search {
    fn new(adjacency: Vec<Vec<usize>>, weights: Vec<usize>) -> Self {
        let m = weights.len();
        let live_degree = adjacency.iter().map(Vec::len).collect();
        let remaining_weight = weights.iter().sum();
        Self {
            adjacency,
            weights,
            alive: vec![true; m],
            live_degree,
            alive_count: m,
            remaining_weight,
            current: Vec::with_capacity(m),
            current_weight: 0,
            best: Vec::new(),
            best_weight: 0,
            trail: Vec::with_capacity(m),
            pending: Vec::new(),
        }
    }

    fn run(&mut self) {
        self.pending.extend((0..self.weights.len()).filter(|&i| self.live_degree[i] <= 1));
        self.fold();
        self.recurse();
    }

    /// Removes `i` from the live graph.
    fn kill(&mut self, i: usize) {
        debug_assert!(self.alive[i]);
        self.alive[i] = false;
        self.alive_count -= 1;
        self.remaining_weight -= self.weights[i];
        self.trail.push(i);
        for idx in 0..self.adjacency[i].len() {
            let j = self.adjacency[i][idx];
            if self.alive[j] {
                self.live_degree[j] -= 1;
                if self.live_degree[j] <= 1 {
                    self.pending.push(j);
                }
            }
        }
    }

    /// Moves `i` from the live graph into the current set.
    fn take(&mut self, i: usize) {
        self.kill(i);
        self.current.push(i);
        self.current_weight += self.weights[i];
    }

    fn undo(&mut self, trail_mark: usize, current_mark: usize) {
        while self.trail.len() > trail_mark {
            let Some(i) = self.trail.pop() else { break };
            self.alive[i] = true;
            self.alive_count += 1;
            self.remaining_weight += self.weights[i];
            for &j in &self.adjacency[i] {
                if self.alive[j] {
                    self.live_degree[j] += 1;
                }
            }
        }
        for i in self.current.drain(current_mark..) {
            self.current_weight -= self.weights[i];
        }
    }

    /// Applies the isolated-node and pair reductions until no pending node qualifies.
    fn fold(&mut self) {
        while let Some(i) = self.pending.pop() {
            if !self.alive[i] {
                continue;
            }
            match self.live_degree[i] {
                0 => self.take(i),
                1 => {
                    let Some(&j) = self.adjacency[i].iter().find(|&&j| self.alive[j]) else {
                        continue;
                    };
                    if self.live_degree[j] == 1 {
                        let (keep, drop) =
                            if self.weights[j] > self.weights[i] { (j, i) } else { (i, j) };
                        self.take(keep);
                        self.kill(drop);
                    }
                }
                _ => {}
            }
        }
    }

    fn promising(&self) -> bool {
        let reachable = self.current_weight + self.remaining_weight;
        reachable > self.best_weight
            || self.best.is_empty()
            || (reachable == self.best_weight
                && self.current.len() + self.alive_count > self.best.len())
    }

    fn recurse(&mut self) {
        let branch = (0..self.alive.len())
            .filter(|&i| self.alive[i])
            .max_by_key(|&i| (self.live_degree[i], std::cmp::Reverse(i)));
        let Some(v) = branch else {
            let better = self.current_weight > self.best_weight
                || self.best.is_empty()
                || (self.current_weight == self.best_weight
                    && self.current.len() > self.best.len());
            if !self.current.is_empty() && better {
                self.best.clone_from(&self.current);
                self.best_weight = self.current_weight;
            }
            return;
        };

        let trail_mark = self.trail.len();
        let current_mark = self.current.len();

        // Exclude v.
        self.kill(v);
        self.fold();
        if self.promising() {
            self.recurse();
        }
        self.undo(trail_mark, current_mark);

        // Include v.
        self.take(v);
        for idx in 0..self.adjacency[v].len() {
            let u = self.adjacency[v][idx];
            if self.alive[u] {
                self.kill(u);
            }
        }
        self.fold();
        if self.promising() {
            self.recurse();
        }
        self.undo(trail_mark, current_mark);
        self.pending.clear();
    }
}

// ============================================================================
// Tests
// ============================================================================
