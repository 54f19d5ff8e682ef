//! Colouring representation and scoring primitives shared by every operator.

use crate::graph::{Graph, NodeId};

/// A colour class index.
pub type Colour = u32;

/// A count of colours.
pub type ColourCount = u32;

/// Sentinel for a node without a colour. Never a valid class index because node counts are
/// bounded by [`crate::graph::MAX_NODES`].
pub const UNCOLOURED: Colour = Colour::MAX;

/// One colour per node, indexed by node id.
pub type Colouring = Vec<Colour>;

/// Number of distinct colours used, ignoring uncoloured nodes.
pub fn colour_count(s: &[Colour]) -> ColourCount {
    let mut seen = vec![false; s.len()];
    let mut count = 0;
    for &c in s {
        if c == UNCOLOURED {
            continue;
        }
        let c = c as usize;
        if c >= seen.len() {
            seen.resize(c + 1, false);
        }
        if !seen[c] {
            seen[c] = true;
            count += 1;
        }
    }
    count
}

/// Highest used colour plus one, or 0 when nothing is coloured.
pub fn palette_size(s: &[Colour]) -> ColourCount {
    s.iter().filter(|&&c| c != UNCOLOURED).map(|&c| c + 1).max().unwrap_or(0)
}

/// Members of every colour class `0..palette_size(s)`, each in ascending node order.
pub fn colour_classes(s: &[Colour]) -> Vec<Vec<NodeId>> {
    let mut classes = vec![Vec::new(); palette_size(s) as usize];
    for (v, &c) in s.iter().enumerate() {
        if c != UNCOLOURED {
            classes[c as usize].push(v);
        }
    }
    classes
}

/// Number of edges whose endpoints share a colour. Each edge counts once.
pub fn number_of_conflicting_edges(graph: &Graph, s: &[Colour]) -> usize {
    debug_assert_eq!(graph.number_of_nodes(), s.len());
    let directed: usize = graph
        .nodes()
        .filter(|&v| s[v] != UNCOLOURED)
        .map(|v| graph.neighbours(v).iter().filter(|&&u| s[u] == s[v]).count())
        .sum();
    directed / 2
}

/// Number of nodes with at least one neighbour of the same colour.
pub fn number_of_conflicting_nodes(graph: &Graph, s: &[Colour]) -> usize {
    debug_assert_eq!(graph.number_of_nodes(), s.len());
    graph
        .nodes()
        .filter(|&v| s[v] != UNCOLOURED && graph.neighbours(v).iter().any(|&u| s[u] == s[v]))
        .count()
}

/// `true` iff no neighbour of `node` currently has `colour`.
#[inline]
pub fn allowed_in_class(graph: &Graph, s: &[Colour], colour: Colour, node: NodeId) -> bool {
    graph.neighbours(node).iter().all(|&u| s[u] != colour)
}

/// Number of nodes without a colour.
pub fn number_of_uncoloured_nodes(s: &[Colour]) -> usize {
    s.iter().filter(|&&c| c == UNCOLOURED).count()
}

/// `true` iff every node carries a colour.
pub fn is_fully_coloured(s: &[Colour]) -> bool {
    !s.contains(&UNCOLOURED)
}

/// `true` iff `s` is fully coloured, conflict free and uses at most `k` colours.
pub fn is_solution(graph: &Graph, k: ColourCount, s: &[Colour]) -> bool {
    colour_count(s) <= k && is_fully_coloured(s) && number_of_conflicting_edges(graph, s) == 0
}

/// Negated sum of squared colour class sizes.
///
/// Lower is better: colourings that concentrate nodes in a few big classes score lower and are
/// closer to freeing up a whole class.
pub fn squared_colour_class_sizes(s: &[Colour]) -> i64 {
    let mut sizes = vec![0i64; palette_size(s) as usize];
    for &c in s.iter().filter(|&&c| c != UNCOLOURED) {
        sizes[c as usize] += 1;
    }
    -sizes.iter().map(|&n| n * n).sum::<i64>()
}

/// Sum of the degrees of all uncoloured nodes.
pub fn sum_uncoloured_degree(graph: &Graph, s: &[Colour]) -> usize {
    graph.nodes().filter(|&v| s[v] == UNCOLOURED).map(|v| graph.degree(v)).sum()
}

// ============================================================================
// Tests
// ============================================================================
