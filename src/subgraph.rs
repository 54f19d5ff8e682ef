//! Shrinking view of a graph used by XRLF, with live degree tracking.

use crate::graph::{Graph, NodeId};
use crate::heap::IndexedHeap;
use rand::Rng;
use rustc_hash::FxHashSet;
use std::cmp::Reverse;

const ABSENT: usize = usize::MAX;

// ============================================================================
// RandomAccessSet
// ============================================================================

/// Set of dense ids with `O(1)` insert, erase, membership and indexed access.
///
/// Erasing swaps the last element into the hole, so iteration order is not stable.
#[derive(Clone, Debug)]
pub struct RandomAccessSet {
    items: Vec<NodeId>,
    positions: Vec<usize>,
}

impl RandomAccessSet {
    /// Empty set over the universe `0..universe`.
    pub fn new(universe: usize) -> Self {
        Self { items: Vec::new(), positions: vec![ABSENT; universe] }
    }

    /// Set containing exactly `items`, over the universe `0..universe`.
    pub fn from_items(universe: usize, items: impl IntoIterator<Item = NodeId>) -> Self {
        let mut set = Self::new(universe);
        for item in items {
            set.insert(item);
        }
        set
    }

    /// Inserts `item`; returns `false` if it was already present.
    pub fn insert(&mut self, item: NodeId) -> bool {
        if self.contains(item) {
            return false;
        }
        self.positions[item] = self.items.len();
        self.items.push(item);
        true
    }

    /// Removes `item`; returns `false` if it was absent.
    pub fn erase(&mut self, item: NodeId) -> bool {
        let pos = self.positions[item];
        if pos == ABSENT {
            return false;
        }
        self.items.swap_remove(pos);
        if let Some(&moved) = self.items.get(pos) {
            self.positions[moved] = pos;
        }
        self.positions[item] = ABSENT;
        true
    }

    /// `true` iff `item` is present.
    #[inline]
    pub fn contains(&self, item: NodeId) -> bool {
        self.positions.get(item).is_some_and(|&p| p != ABSENT)
    }

    /// Element stored at `index` (`index < len()`).
    #[inline]
    pub fn get(&self, index: usize) -> NodeId {
        self.items[index]
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// `true` iff the set is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Elements in storage order.
    #[inline]
    pub fn as_slice(&self) -> &[NodeId] {
        &self.items
    }

    /// Uniformly random element, or `None` when empty.
    pub fn random<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<NodeId> {
        if self.items.is_empty() {
            return None;
        }
        Some(self.items[rng.random_range(0..self.items.len())])
    }
}

// ============================================================================
// Subgraph
// ============================================================================

/// The subgraph induced by the nodes not yet removed.
///
/// Invariants:
/// - `neighbours[v]` holds exactly the remaining neighbours of every remaining `v`.
/// - `max_heap`/`min_heap` hold every remaining node keyed by its current degree.
/// - `max_degree_nodes` holds only remaining nodes of maximum degree and is non-empty while any
///   node remains.
#[derive(Clone, Debug)]
pub struct Subgraph {
    nodes: RandomAccessSet,
    neighbours: Vec<FxHashSet<NodeId>>,
    max_heap: IndexedHeap<usize>,
    min_heap: IndexedHeap<Reverse<usize>>,
    max_degree_nodes: RandomAccessSet,
}

impl Subgraph {
    /// Full view of `graph`.
    pub fn new(graph: &Graph) -> Self {
        let n = graph.number_of_nodes();
        let mut max_heap = IndexedHeap::new(n);
        let mut min_heap = IndexedHeap::new(n);
        let mut neighbours = Vec::with_capacity(n);
        for v in graph.nodes() {
            neighbours.push(graph.neighbours(v).iter().copied().collect::<FxHashSet<_>>());
            max_heap.push(v, graph.degree(v));
            min_heap.push(v, Reverse(graph.degree(v)));
        }
        let max_degree = graph.max_degree();
        let at_max = graph.nodes().filter(|&v| graph.degree(v) == max_degree);
        let max_degree_nodes = RandomAccessSet::from_items(n, at_max);
        Self {
            nodes: RandomAccessSet::from_items(n, graph.nodes()),
            neighbours,
            max_heap,
            min_heap,
            max_degree_nodes,
        }
    }

    /// Removes a batch of nodes and detaches them from their remaining neighbours.
    ///
    /// Edges between two removed nodes are dropped without touching the survivors.
    pub fn remove_nodes(&mut self, removed: &[NodeId]) {
        for &v in removed {
            self.nodes.erase(v);
        }
        for &v in removed {
            let detached = std::mem::take(&mut self.neighbours[v]);
            for u in detached {
                if !self.nodes.contains(u) {
                    continue;
                }
                self.neighbours[u].remove(&v);
                let degree = self.neighbours[u].len();
                self.max_heap.update(u, degree);
                self.min_heap.update(u, Reverse(degree));
                self.max_degree_nodes.erase(u);
            }
            self.max_degree_nodes.erase(v);
            self.max_heap.remove(v);
            self.min_heap.remove(v);
        }
        if self.max_degree_nodes.is_empty() {
            for v in self.max_heap.ties_with_top() {
                self.max_degree_nodes.insert(v);
            }
        }
        debug_assert_eq!(self.nodes.len(), self.max_heap.len());
    }

    /// Degree of `v` within the subgraph.
    #[inline]
    pub fn node_degree(&self, v: NodeId) -> usize {
        self.neighbours[v].len()
    }

    /// Remaining neighbours of `v`.
    #[inline]
    pub fn neighbours(&self, v: NodeId) -> &FxHashSet<NodeId> {
        &self.neighbours[v]
    }

    /// Remaining nodes.
    #[inline]
    pub fn nodes(&self) -> &RandomAccessSet {
        &self.nodes
    }

    /// `true` iff `v` has not been removed.
    #[inline]
    pub fn contains(&self, v: NodeId) -> bool {
        self.nodes.contains(v)
    }

    /// Number of remaining nodes.
    #[inline]
    pub fn number_of_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of nodes of the underlying graph.
    #[inline]
    pub fn total_number_of_nodes(&self) -> usize {
        self.neighbours.len()
    }

    /// Smallest remaining degree (0 when empty).
    pub fn min_degree(&self) -> usize {
        self.min_heap.peek().map_or(0, |(_, d)| d.0)
    }

    /// Largest remaining degree (0 when empty).
    pub fn max_degree(&self) -> usize {
        self.max_heap.peek().map_or(0, |(_, &d)| d)
    }

    /// Remaining nodes of maximum degree.
    #[inline]
    pub fn max_degree_nodes(&self) -> &RandomAccessSet {
        &self.max_degree_nodes
    }

    /// Uniformly random node of maximum degree, or `None` when empty.
    pub fn random_max_degree_node<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<NodeId> {
        self.max_degree_nodes.random(rng)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{MYCIEL3_GRAPH, SIMPLE_GRAPH};
    use rand::SeedableRng;
    use rand_xorshift::XorShiftRng;

    fn sorted(set: &RandomAccessSet) -> Vec<NodeId> {
        let mut v = set.as_slice().to_vec();
        v.sort_unstable();
        v
    }

    fn simple() -> Subgraph {
        Subgraph::new(&Graph::from_metis_str(SIMPLE_GRAPH).unwrap())
    }

    #[test]
    fn random_access_set_basics() {
        let mut set = RandomAccessSet::from_items(10, [3, 7, 1]);
        assert!(set.contains(7));
        assert!(!set.insert(7));
        assert!(set.erase(3));
        assert!(!set.erase(3));
        assert_eq!(set.len(), 2);
        assert_eq!(sorted(&set), vec![1, 7]);
        assert!(set.insert(9));
        assert_eq!(set.get(set.len() - 1), 9);
        assert!(!set.contains(42));
    }

    #[test]
    fn initial_degrees() {
        let sub = simple();
        assert_eq!(sub.number_of_nodes(), 6);
        assert_eq!(sub.total_number_of_nodes(), 6);
        assert_eq!(sub.min_degree(), 2);
        assert_eq!(sub.max_degree(), 3);
        assert_eq!(sorted(sub.max_degree_nodes()), vec![1, 5]);
    }

    #[test]
    fn max_degree_set_shrinks_then_rebuilds() {
        let mut sub = simple();
        sub.remove_nodes(&[4]);
        assert_eq!(sorted(sub.max_degree_nodes()), vec![1]);
        assert_eq!(sub.node_degree(5), 2);
        sub.remove_nodes(&[1]);
        assert_eq!(sorted(sub.max_degree_nodes()), vec![0, 2, 3, 5]);
        assert_eq!(sub.max_degree(), 1);
        assert_eq!(sub.number_of_nodes(), 4);
        assert!(!sub.contains(1));
    }

    #[test]
    fn min_degree_follows_removals() {
        let mut sub = simple();
        sub.remove_nodes(&[1]);
        assert_eq!(sub.min_degree(), 1);
        sub.remove_nodes(&[2]);
        assert_eq!(sub.min_degree(), 1);
        sub.remove_nodes(&[0, 3]);
        // 4 -- 5 remains.
        assert_eq!(sub.min_degree(), 1);
        sub.remove_nodes(&[5]);
        assert_eq!(sub.min_degree(), 0);
        sub.remove_nodes(&[4]);
        assert_eq!(sub.number_of_nodes(), 0);
        assert_eq!(sub.max_degree(), 0);
        assert!(sub.max_degree_nodes().is_empty());
    }

    #[test]
    fn batch_removal_keeps_neighbour_sets_consistent() {
        let graph = Graph::from_metis_str(MYCIEL3_GRAPH).unwrap();
        let mut sub = Subgraph::new(&graph);
        let mut rng = XorShiftRng::seed_from_u64(3);
        while sub.number_of_nodes() > 0 {
            let v = sub.random_max_degree_node(&mut rng).unwrap();
            assert_eq!(sub.node_degree(v), sub.max_degree());
            let mut batch = vec![v];
            batch.extend(sub.neighbours(v).iter().copied().take(2));
            sub.remove_nodes(&batch);
            for &u in sub.nodes().as_slice() {
                for &w in sub.neighbours(u) {
                    assert!(sub.contains(w));
                    assert!(sub.neighbours(w).contains(&u));
                }
            }
        }
    }

    // ========================================================================
    // Removal against a naive recomputation
    // ========================================================================

    fn random_graph(n: usize, p: f64, seed: u64) -> Graph {
        let mut rng = XorShiftRng::seed_from_u64(seed);
        let edges: Vec<(NodeId, NodeId)> = (0..n)
            .flat_map(|u| (u + 1..n).map(move |v| (u, v)))
            .filter(|_| rng.random_bool(p))
            .collect();
        Graph::from_edges(n, &edges).unwrap()
    }

    /// Checks every tracked quantity of `sub` against `graph` minus `removed`.
    fn assert_matches_naive(graph: &Graph, sub: &Subgraph, removed: &[bool]) {
        let remaining: Vec<NodeId> = graph.nodes().filter(|&v| !removed[v]).collect();
        assert_eq!(sorted(sub.nodes()), remaining);
        let degrees: Vec<usize> = remaining
            .iter()
            .map(|&v| {
                let mut expected: Vec<NodeId> =
                    graph.neighbours(v).iter().copied().filter(|&u| !removed[u]).collect();
                let mut actual: Vec<NodeId> = sub.neighbours(v).iter().copied().collect();
                expected.sort_unstable();
                actual.sort_unstable();
                assert_eq!(actual, expected, "neighbours of {v}");
                assert_eq!(sub.node_degree(v), expected.len());
                expected.len()
            })
            .collect();
        let max = degrees.iter().copied().max().unwrap_or(0);
        assert_eq!(sub.max_degree(), max);
        assert_eq!(sub.min_degree(), degrees.iter().copied().min().unwrap_or(0));
        let at_max: Vec<NodeId> =
            remaining.iter().zip(&degrees).filter(|&(_, &d)| d == max).map(|(&v, _)| v).collect();
        assert_eq!(sorted(sub.max_degree_nodes()), at_max);
    }

    fn remove_random_batches(graph: &Graph, seed: u64) {
        let mut rng = XorShiftRng::seed_from_u64(seed);
        let mut sub = Subgraph::new(graph);
        let mut removed = vec![false; graph.number_of_nodes()];
        assert_matches_naive(graph, &sub, &removed);
        while sub.number_of_nodes() > 0 {
            // A random node with part of its neighbourhood, so batches contain mutual neighbours,
            // plus a few unrelated nodes.
            let v = sub.nodes().random(&mut rng).unwrap();
            let mut batch = vec![v];
            batch.extend(sub.neighbours(v).iter().copied().filter(|_| rng.random_bool(0.5)));
            for _ in 0..rng.random_range(0..3) {
                let u = sub.nodes().random(&mut rng).unwrap();
                if !batch.contains(&u) {
                    batch.push(u);
                }
            }
            for &u in &batch {
                removed[u] = true;
            }
            sub.remove_nodes(&batch);
            assert_matches_naive(graph, &sub, &removed);
        }
    }

    #[test]
    fn removal_matches_naive_recomputation_on_myciel3() {
        let graph = Graph::from_metis_str(MYCIEL3_GRAPH).unwrap();
        for seed in 0..20 {
            remove_random_batches(&graph, seed);
        }
    }

    #[test]
    fn removal_matches_naive_recomputation_on_random_graphs() {
        for seed in 0..10 {
            remove_random_batches(&random_graph(40, 0.2, seed), seed);
        }
    }
}
