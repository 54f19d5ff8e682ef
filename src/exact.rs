//! Exact branch-and-bound colouring of a (small) residual subgraph.
//!
//! DSATUR-style branching: the next node is always the one seeing the most distinct colours,
//! then the one with the most uncoloured neighbours, then the smallest id. The bound is the best
//! colour count found so far, starting from `|V| + 1`.

use crate::colouring::{Colour, ColourCount, Colouring, UNCOLOURED};
use crate::graph::NodeId;
use crate::heap::IndexedHeap;
use crate::subgraph::Subgraph;
use rustc_hash::FxHashMap;
use std::cmp::Reverse;
use tracing::debug;

// ============================================================================
// ColourNode
// ============================================================================

/// Per-node bookkeeping: how often each colour occurs among the node's neighbours, and how many
/// neighbours are still uncoloured.
#[derive(Clone, Debug, Default)]
pub struct ColourNode {
    adjacent: FxHashMap<Colour, usize>,
    uncoloured_neighbours: usize,
}

impl ColourNode {
    fn new(degree: usize) -> Self {
        Self { adjacent: FxHashMap::default(), uncoloured_neighbours: degree }
    }

    /// Records that a neighbour received `colour`. Returns `true` if `colour` is new to this node.
    pub fn colour_neighbour(&mut self, colour: Colour) -> bool {
        debug_assert!(self.uncoloured_neighbours > 0);
        self.uncoloured_neighbours -= 1;
        let count = self.adjacent.entry(colour).or_insert(0);
        *count += 1;
        *count == 1
    }

    /// Records that a neighbour lost `colour`. Returns `true` if no neighbour has `colour` anymore.
    pub fn uncolour_neighbour(&mut self, colour: Colour) -> bool {
        self.uncoloured_neighbours += 1;
        let Some(count) = self.adjacent.get_mut(&colour) else {
            debug_assert!(false, "uncolouring colour {colour} that no neighbour carries");
            return false;
        };
        *count -= 1;
        if *count == 0 {
            self.adjacent.remove(&colour);
            true
        } else {
            false
        }
    }

    /// Number of distinct colours among the neighbours.
    #[inline]
    pub fn adjacent_colour_count(&self) -> usize {
        self.adjacent.len()
    }

    /// Number of neighbours without a colour.
    #[inline]
    pub fn uncoloured_neighbours(&self) -> usize {
        self.uncoloured_neighbours
    }

    /// `true` iff some neighbour has `colour`.
    #[inline]
    pub fn is_adjacent_to(&self, colour: Colour) -> bool {
        self.adjacent.contains_key(&colour)
    }

    /// Smallest colour in `0..used` that no neighbour has.
    pub fn find_unused_colour(&self, used: ColourCount) -> Option<Colour> {
        (0..used).find(|c| !self.is_adjacent_to(*c))
    }
}

// ============================================================================
// ColouringState
// ============================================================================

/// Heap key of an uncoloured node; larger is branched on first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Saturation {
    adjacent_colours: usize,
    uncoloured_neighbours: usize,
    node: Reverse<NodeId>,
}

/// Partial colouring of a subgraph with saturation-ordered access to its uncoloured nodes.
#[derive(Clone, Debug)]
pub struct ColouringState<'a> {
    subgraph: &'a Subgraph,
    colouring: Colouring,
    used_colours: ColourCount,
    nodes: Vec<ColourNode>,
    uncoloured: IndexedHeap<Saturation>,
}

impl<'a> ColouringState<'a> {
    /// All remaining nodes of `subgraph` uncoloured.
    pub fn new(subgraph: &'a Subgraph) -> Self {
        let total = subgraph.total_number_of_nodes();
        let mut nodes = vec![ColourNode::default(); total];
        let mut uncoloured = IndexedHeap::new(total);
        for &v in subgraph.nodes().as_slice() {
            nodes[v] = ColourNode::new(subgraph.node_degree(v));
            let key = Saturation {
                adjacent_colours: 0,
                uncoloured_neighbours: subgraph.node_degree(v),
                node: Reverse(v),
            };
            uncoloured.push(v, key);
        }
        Self { subgraph, colouring: vec![UNCOLOURED; total], used_colours: 0, nodes, uncoloured }
    }

    /// Colours `u` with `colour`; `is_new` marks the first use of `colour`.
    pub fn colour_node(&mut self, u: NodeId, colour: Colour, is_new: bool) {
        debug_assert_eq!(self.colouring[u], UNCOLOURED);
        self.colouring[u] = colour;
        self.used_colours += ColourCount::from(is_new);
        self.uncoloured.remove(u);
        let subgraph = self.subgraph;
        for &w in subgraph.neighbours(u) {
            self.nodes[w].colour_neighbour(colour);
            self.refresh(w);
        }
    }

    /// Reverts [`Self::colour_node`].
    pub fn uncolour_node(&mut self, u: NodeId, colour: Colour, was_new: bool) {
        debug_assert_eq!(self.colouring[u], colour);
        self.colouring[u] = UNCOLOURED;
        self.used_colours -= ColourCount::from(was_new);
        let subgraph = self.subgraph;
        for &w in subgraph.neighbours(u) {
            self.nodes[w].uncolour_neighbour(colour);
            self.refresh(w);
        }
        self.uncoloured.push(u, self.key(u));
    }

    /// The most saturated uncoloured node.
    pub fn best_node(&self) -> Option<NodeId> {
        self.uncoloured.peek().map(|(v, _)| v)
    }

    /// Number of uncoloured nodes.
    #[inline]
    pub fn uncoloured_node_count(&self) -> usize {
        self.uncoloured.len()
    }

    /// Number of colours in use.
    #[inline]
    pub fn used_colours(&self) -> ColourCount {
        self.used_colours
    }

    /// Current colouring, indexed by node id of the underlying graph.
    #[inline]
    pub fn colouring(&self) -> &[Colour] {
        &self.colouring
    }

    /// Bookkeeping of node `v`.
    #[inline]
    pub fn node(&self, v: NodeId) -> &ColourNode {
        &self.nodes[v]
    }

    /// Copies the colours of the subgraph's nodes into `dest`, shifted by `offset`.
    fn write_into(&self, dest: &mut [Colour], offset: Colour) {
        for &v in self.subgraph.nodes().as_slice() {
            dest[v] = offset + self.colouring[v];
        }
    }

    fn key(&self, v: NodeId) -> Saturation {
        let node = &self.nodes[v];
        Saturation {
            adjacent_colours: node.adjacent_colour_count(),
            uncoloured_neighbours: node.uncoloured_neighbours(),
            node: Reverse(v),
        }
    }

    fn refresh(&mut self, v: NodeId) {
        if self.uncoloured.contains(v) {
            let key = self.key(v);
            self.uncoloured.update(v, key);
        }
    }
}

// ============================================================================
// Search
// ============================================================================

/// Colours the remaining nodes of `subgraph` with the minimum number of colours.
///
/// Colours `offset..offset + result` are written into `colouring` for the subgraph's nodes only;
/// every other entry is left untouched. Returns the number of colours used (0 for an empty
/// subgraph).
pub fn find_optimal_colouring(
    subgraph: &Subgraph,
    colouring: &mut [Colour],
    offset: Colour,
) -> ColourCount {
    let n = subgraph.number_of_nodes();
    if n == 0 {
        return 0;
    }
    let mut state = ColouringState::new(subgraph);
    let mut best_colours = n as ColourCount + 1;
    find_best_colouring(&mut state, colouring, &mut best_colours, offset);
    debug!(nodes = n, colours = best_colours, "exact colouring finished");
    best_colours
}

fn find_best_colouring(
    state: &mut ColouringState<'_>,
    best: &mut [Colour],
    best_colours: &mut ColourCount,
    offset: Colour,
) {
    let Some(u) = state.best_node() else {
        return;
    };
    let used = state.used_colours();

    if state.uncoloured_node_count() == 1 {
        if let Some(c) = state.node(u).find_unused_colour(used) {
            if used < *best_colours {
                state.colour_node(u, c, false);
                state.write_into(best, offset);
                *best_colours = used;
                state.uncolour_node(u, c, false);
            }
        } else if used + 1 < *best_colours {
            state.colour_node(u, used, true);
            state.write_into(best, offset);
            *best_colours = used + 1;
            state.uncolour_node(u, used, true);
        }
        return;
    }

    // u already sees best - 1 colours: any completion needs at least best colours.
    if state.node(u).adjacent_colour_count() as ColourCount + 1 >= *best_colours {
        return;
    }
    for c in 0..used {
        if state.node(u).is_adjacent_to(c) {
            continue;
        }
        state.colour_node(u, c, false);
        find_best_colouring(state, best, best_colours, offset);
        state.uncolour_node(u, c, false);
        if *best_colours == used {
            return;
        }
    }
    if used + 1 < *best_colours {
        state.colour_node(u, used, true);
        find_best_colouring(state, best, best_colours, offset);
        state.uncolour_node(u, used, true);
    }
}

// ============================================================================
// Tests
// ============================================================================
