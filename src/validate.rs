//! Colouring validation and fast deterministic checks of the bundled graphs.

use crate::colouring::{colour_count, Colour, ColourCount, UNCOLOURED};
use crate::exact::find_optimal_colouring;
use crate::graph::{Graph, NodeId, EIGHT_GRAPH, MYCIEL3_GRAPH, SIMPLE_GRAPH};
use crate::subgraph::Subgraph;
use crate::xrlf::{init_by_xrlf, XrlfParams};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use thiserror::Error;

/// Bundled graphs with their chromatic numbers.
const BUNDLED: [(&str, &str, ColourCount); 3] = [
    ("simple.graph", SIMPLE_GRAPH, 3),
    ("myciel3.graph", MYCIEL3_GRAPH, 4),
    ("eight.graph", EIGHT_GRAPH, 3),
];

/// Reason a colouring does not solve a graph.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ColouringViolation {
    /// The colouring has a different length than the graph has nodes.
    #[error("colouring has {got} entries but the graph has {expected} nodes")]
    LengthMismatch {
        /// Node count of the graph.
        expected: usize,
        /// Length of the colouring.
        got: usize,
    },
    /// A node has no colour.
    #[error("node {node} is uncoloured")]
    Uncoloured {
        /// The uncoloured node.
        node: NodeId,
    },
    /// Both endpoints of an edge share a colour.
    #[error("nodes {u} and {v} are adjacent but both have colour {colour}")]
    Conflict {
        /// Lower endpoint.
        u: NodeId,
        /// Higher endpoint.
        v: NodeId,
        /// The shared colour.
        colour: Colour,
    },
    /// More distinct colours than allowed.
    #[error("{used} colours used but at most {k} allowed")]
    TooManyColours {
        /// Distinct colours in the colouring.
        used: ColourCount,
        /// Allowed colour count.
        k: ColourCount,
    },
}

// ============================================================================
// Public API
// ============================================================================

/// Checks that `s` is a complete proper colouring of `graph` with at most `k` colours.
///
/// # Errors
/// Returns the first violation found, checking length, completeness, conflicts and then the
/// colour count.
pub fn validate_colouring(
    graph: &Graph,
    s: &[Colour],
    k: ColourCount,
) -> Result<(), ColouringViolation> {
    let expected = graph.number_of_nodes();
    if s.len() != expected {
        return Err(ColouringViolation::LengthMismatch { expected, got: s.len() });
    }
    if let Some(node) = s.iter().position(|&c| c == UNCOLOURED) {
        return Err(ColouringViolation::Uncoloured { node });
    }
    if let Some((u, v)) = graph.edges().find(|&(u, v)| s[u] == s[v]) {
        return Err(ColouringViolation::Conflict { u, v, colour: s[u] });
    }
    let used = colour_count(s);
    if used > k {
        return Err(ColouringViolation::TooManyColours { used, k });
    }
    Ok(())
}

/// Parses every bundled graph and checks that the exact colourer reaches its chromatic number
/// and that a seeded XRLF run yields a proper colouring.
///
/// # Errors
/// Returns an error message naming the first graph that fails.
pub fn validate_bundled_graphs() -> Result<(), String> {
    for (name, text, chromatic) in BUNDLED {
        validate_case(name, text, chromatic)?;
    }
    Ok(())
}

// ============================================================================
// Internal
// ============================================================================

fn validate_case(name: &str, text: &str, chromatic: ColourCount) -> Result<(), String> {
    let graph = Graph::from_metis_str(text).map_err(|e| format!("{name}: {e}"))?;

    let mut exact = vec![UNCOLOURED; graph.number_of_nodes()];
    let used = find_optimal_colouring(&Subgraph::new(&graph), &mut exact, 0);
    if used != chromatic {
        return Err(format!("{name}: exact colourer used {used} colours, expected {chromatic}"));
    }
    validate_colouring(&graph, &exact, chromatic)
        .map_err(|e| format!("{name}: exact colouring: {e}"))?;

    let params = XrlfParams {
        exact_limit: 0,
        trials: 8,
        set_limit: 4,
        candidates: 5,
        ..XrlfParams::default()
    };
    let mut rng = SmallRng::seed_from_u64(0);
    let xrlf = init_by_xrlf(&graph, &params, &mut rng);
    validate_colouring(&graph, &xrlf, graph.number_of_nodes() as ColourCount)
        .map_err(|e| format!("{name}: xrlf colouring: {e}"))?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
