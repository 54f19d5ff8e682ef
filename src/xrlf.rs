//! XRLF: colour by repeatedly extracting large independent sets.
//!
//! Johnson, Aragon, McGeoch & Schevon, "Optimization by Simulated Annealing: An Experimental
//! Evaluation; Part II, Graph Coloring and Number Partitioning". Each colour class is grown
//! greedily from a random candidate sample, finished by [`exhaustive_search`] once the eligible
//! pool is small, and the best of several trials (by total degree) is kept. When at most
//! `exact_limit` nodes remain they are coloured optimally by [`find_optimal_colouring`].

use crate::colouring::{
    colour_count, number_of_conflicting_edges, number_of_uncoloured_nodes, Colour, ColourCount,
    Colouring, UNCOLOURED,
};
use crate::exact::find_optimal_colouring;
use crate::graph::{Graph, NodeId};
use crate::iset::exhaustive_search;
use crate::rng::derive_seed;
use crate::strategy::InitOperator;
use crate::subgraph::{RandomAccessSet, Subgraph};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::debug;

// ============================================================================
// Configuration
// ============================================================================

/// What to do once `target_colours` classes have been extracted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum XrlfMode {
    /// Keep extracting classes; the colour count is unbounded.
    #[default]
    IgnoreColourCount,
    /// Give every remaining node a uniform random colour in `0..target_colours`.
    RandomColourRemaining,
    /// Leave every remaining node uncoloured.
    UncolourRemaining,
}

/// XRLF tuning parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct XrlfParams {
    /// Residual size at or below which the exact colourer takes over (`EXACTLIM`).
    pub exact_limit: usize,
    /// Independent-set trials per colour class (`TRIALNUM`).
    pub trials: usize,
    /// Pool size at or below which a class is completed exhaustively (`SETLIM`).
    pub set_limit: usize,
    /// Candidates sampled per greedy step (`CANDNUM`).
    pub candidates: usize,
    /// Behaviour after `target_colours` classes.
    pub mode: XrlfMode,
    /// Class budget used by the bounded modes; 0 disables the bound.
    pub target_colours: ColourCount,
}

impl Default for XrlfParams {
    fn default() -> Self {
        Self {
            exact_limit: 50,
            trials: 128,
            set_limit: 30,
            candidates: 50,
            mode: XrlfMode::IgnoreColourCount,
            target_colours: 0,
        }
    }
}

// ============================================================================
// Driver
// ============================================================================

/// Colours `graph` by independent-set extraction.
///
/// In [`XrlfMode::IgnoreColourCount`] the result is always complete and conflict free.
pub fn init_by_xrlf<R: Rng + ?Sized>(graph: &Graph, params: &XrlfParams, rng: &mut R) -> Colouring {
    let mut s = vec![UNCOLOURED; graph.number_of_nodes()];
    let mut subgraph = Subgraph::new(graph);
    let mut k: Colour = 0;

    while subgraph.number_of_nodes() > params.exact_limit {
        let class = calculate_independent_set(&subgraph, params, rng);
        debug_assert!(class
            .iter()
            .all(|&v| graph.neighbours(v).iter().all(|u| class.binary_search(u).is_err())));
        if class.is_empty() {
            break;
        }
        subgraph.remove_nodes(&class);
        for &v in &class {
            s[v] = k;
        }
        k += 1;
        debug!(
            colour = k - 1,
            size = class.len(),
            remaining = subgraph.number_of_nodes(),
            "xrlf colour class"
        );

        if k == params.target_colours {
            match params.mode {
                XrlfMode::IgnoreColourCount => {}
                XrlfMode::UncolourRemaining => return s,
                XrlfMode::RandomColourRemaining => {
                    for &v in subgraph.nodes().as_slice() {
                        s[v] = rng.random_range(0..k);
                    }
                    return s;
                }
            }
        }
    }

    if subgraph.number_of_nodes() > 0 {
        find_optimal_colouring(&subgraph, &mut s, k);
    }
    s
}

/// Finds a large independent set of the subgraph, favouring high-degree nodes.
///
/// Runs up to `trials` randomized constructions and keeps the set with the largest degree sum.
/// The result is sorted and non-empty whenever the subgraph is.
pub fn calculate_independent_set<R: Rng + ?Sized>(
    subgraph: &Subgraph,
    params: &XrlfParams,
    rng: &mut R,
) -> Vec<NodeId> {
    let remaining = subgraph.number_of_nodes();
    let total = subgraph.total_number_of_nodes();
    let mut trials = params.trials.max(1);
    let mut set_limit = params.set_limit;

    let seed_node = if trials == 1 && remaining > set_limit {
        subgraph.random_max_degree_node(rng)
    } else {
        None
    };
    if trials.min(set_limit + subgraph.min_degree()) >= remaining {
        trials = 1;
        set_limit = remaining;
    }

    let mut best: Option<(usize, Vec<NodeId>)> = None;
    for _ in 0..trials {
        // C: the class under construction, X: neighbours of C, W: still eligible.
        let mut c = RandomAccessSet::new(total);
        let mut x = RandomAccessSet::new(total);
        if let Some(v) = seed_node {
            c.insert(v);
            for &u in subgraph.neighbours(v) {
                x.insert(u);
            }
        }
        let mut w = RandomAccessSet::from_items(
            total,
            subgraph
                .nodes()
                .as_slice()
                .iter()
                .copied()
                .filter(|&v| !x.contains(v) && !c.contains(v)),
        );

        while !w.is_empty() {
            if w.len() <= set_limit {
                for v in exhaustive_search(w.as_slice(), subgraph, &c) {
                    c.insert(v);
                }
                break;
            }

            let mut candidate = None;
            let mut candidate_degree = 0;
            for _ in 0..params.candidates.max(1) {
                let Some(u) = w.random(rng) else { break };
                let degree = subgraph.neighbours(u).iter().filter(|&&n| !x.contains(n)).count();
                if candidate.is_none() || degree > candidate_degree {
                    candidate = Some(u);
                    candidate_degree = degree;
                }
            }
            let Some(chosen) = candidate else { break };
            c.insert(chosen);
            for &u in subgraph.neighbours(chosen) {
                x.insert(u);
                w.erase(u);
            }
            w.erase(chosen);
        }

        let score: usize = c.as_slice().iter().map(|&v| subgraph.node_degree(v)).sum();
        if best.as_ref().map_or(true, |(b, _)| score > *b) {
            best = Some((score, c.as_slice().to_vec()));
        }
    }

    let mut set = best.map(|(_, set)| set).unwrap_or_default();
    set.sort_unstable();
    set
}

// ============================================================================
// Strategy operators and restarts
// ============================================================================

/// Initialization operator running XRLF in `mode` with the strategy's target `k` as class budget.
pub fn xrlf_init_operator(mode: XrlfMode, params: XrlfParams) -> InitOperator {
    Box::new(move |graph: &Graph, k: ColourCount, rng: &mut SmallRng| {
        init_by_xrlf(graph, &XrlfParams { mode, target_colours: k, ..params }, rng)
    })
}

/// Runs `restarts` independently seeded XRLF colourings in parallel and returns the best one.
///
/// Colourings are ranked by conflicting edges, then uncoloured nodes, then colour count; ties go
/// to the lower restart index, so the result only depends on `seed`.
pub fn init_by_xrlf_best_of(
    graph: &Graph,
    params: &XrlfParams,
    restarts: usize,
    seed: u64,
) -> Colouring {
    (0..restarts.max(1) as u64)
        .into_par_iter()
        .map(|i| {
            let mut rng = SmallRng::seed_from_u64(derive_seed(seed, i));
            let s = init_by_xrlf(graph, params, &mut rng);
            let rank = (
                number_of_conflicting_edges(graph, &s),
                number_of_uncoloured_nodes(&s),
                colour_count(&s),
                i,
            );
            (rank, s)
        })
        .min_by_key(|(rank, _)| *rank)
        .map(|(_, s)| s)
        .unwrap_or_default()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colouring::{colour_classes, is_fully_coloured};
    use crate::graph::{EIGHT_GRAPH, MYCIEL3_GRAPH, SIMPLE_GRAPH};
    use rand_xorshift::XorShiftRng;

    fn params(exact_limit: usize) -> XrlfParams {
        XrlfParams { exact_limit, trials: 8, set_limit: 4, candidates: 5, ..XrlfParams::default() }
    }

    fn random_graph(n: usize, p: f64, seed: u64) -> Graph {
        let mut rng = XorShiftRng::seed_from_u64(seed);
        let edges: Vec<(usize, usize)> = (0..n)
            .flat_map(|u| (u + 1..n).map(move |v| (u, v)))
            .filter(|_| rng.random_bool(p))
            .collect();
        Graph::from_edges(n, &edges).unwrap()
    }

    fn is_independent(graph: &Graph, set: &[NodeId]) -> bool {
        set.iter().all(|&v| graph.neighbours(v).iter().all(|u| !set.contains(u)))
    }

    #[test]
    fn small_graph_is_coloured_exactly() {
        let g = Graph::from_metis_str(SIMPLE_GRAPH).unwrap();
        let mut rng = XorShiftRng::seed_from_u64(1);
        let s = init_by_xrlf(&g, &XrlfParams::default(), &mut rng);
        assert_eq!(number_of_conflicting_edges(&g, &s), 0);
        assert_eq!(colour_count(&s), 3);
    }

    #[test]
    fn class_extraction_gives_proper_colouring() {
        let g = Graph::from_metis_str(MYCIEL3_GRAPH).unwrap();
        for seed in 0..10 {
            let mut rng = XorShiftRng::seed_from_u64(seed);
            let s = init_by_xrlf(&g, &params(0), &mut rng);
            assert!(is_fully_coloured(&s));
            assert_eq!(number_of_conflicting_edges(&g, &s), 0);
            assert!(colour_count(&s) >= 4);
        }
    }

    #[test]
    fn mixed_extraction_and_exact_on_random_graph() {
        let g = random_graph(80, 0.1, 4);
        let mut rng = XorShiftRng::seed_from_u64(4);
        let mixed =
            XrlfParams { exact_limit: 12, trials: 16, set_limit: 10, ..XrlfParams::default() };
        let s = init_by_xrlf(&g, &mixed, &mut rng);
        assert!(is_fully_coloured(&s));
        assert_eq!(number_of_conflicting_edges(&g, &s), 0);
        // Colours stay dense: 0..colour_count.
        assert_eq!(colour_classes(&s).len() as u32, colour_count(&s));
    }

    #[test]
    fn independent_sets_are_independent() {
        let g = random_graph(60, 0.2, 9);
        let sub = Subgraph::new(&g);
        let mut rng = XorShiftRng::seed_from_u64(9);
        for trials in [1, 4] {
            let trial_params = XrlfParams { trials, ..params(0) };
            let set = calculate_independent_set(&sub, &trial_params, &mut rng);
            assert!(!set.is_empty());
            assert!(is_independent(&g, &set));
        }
    }

    #[test]
    fn small_subgraph_set_is_maximum_weight() {
        let g = Graph::from_metis_str(EIGHT_GRAPH).unwrap();
        let sub = Subgraph::new(&g);
        let mut rng = XorShiftRng::seed_from_u64(2);
        let set = calculate_independent_set(&sub, &XrlfParams::default(), &mut rng);
        assert!(is_independent(&g, &set));
        // Whole graph fits the exhaustive search: the set is maximal.
        assert!(g
            .nodes()
            .filter(|v| !set.contains(v))
            .all(|v| g.neighbours(v).iter().any(|u| set.contains(u))));
    }

    #[test]
    fn uncolour_mode_then_exact_residual() {
        let g = Graph::from_metis_str(MYCIEL3_GRAPH).unwrap();
        let mut rng = XorShiftRng::seed_from_u64(6);
        let bounded =
            XrlfParams { mode: XrlfMode::UncolourRemaining, target_colours: 2, ..params(0) };
        let mut s = init_by_xrlf(&g, &bounded, &mut rng);
        assert_eq!(colour_count(&s), 2);
        assert!(number_of_uncoloured_nodes(&s) > 0);
        assert_eq!(number_of_conflicting_edges(&g, &s), 0);

        let mut residual = Subgraph::new(&g);
        let coloured: Vec<NodeId> = g.nodes().filter(|&v| s[v] != UNCOLOURED).collect();
        residual.remove_nodes(&coloured);
        let extra = find_optimal_colouring(&residual, &mut s, 2);
        assert!(extra >= 1);
        assert!(is_fully_coloured(&s));
        assert_eq!(number_of_conflicting_edges(&g, &s), 0);
    }

    #[test]
    fn random_mode_stays_within_budget() {
        let g = Graph::from_metis_str(MYCIEL3_GRAPH).unwrap();
        let mut rng = XorShiftRng::seed_from_u64(3);
        let bounded =
            XrlfParams { mode: XrlfMode::RandomColourRemaining, target_colours: 2, ..params(0) };
        let s = init_by_xrlf(&g, &bounded, &mut rng);
        assert!(is_fully_coloured(&s));
        assert!(s.iter().all(|&c| c < 2));
    }

    #[test]
    fn init_operator_uses_strategy_budget() {
        let g = Graph::from_metis_str(MYCIEL3_GRAPH).unwrap();
        let op = xrlf_init_operator(XrlfMode::UncolourRemaining, params(0));
        let mut rng = SmallRng::seed_from_u64(1);
        let s = op(&g, 1, &mut rng);
        assert_eq!(colour_count(&s), 1);
    }

    #[test]
    fn best_of_is_deterministic() {
        let g = random_graph(70, 0.15, 21);
        let p = XrlfParams {
            exact_limit: 10,
            trials: 4,
            set_limit: 8,
            candidates: 8,
            ..XrlfParams::default()
        };
        let a = init_by_xrlf_best_of(&g, &p, 6, 77);
        let b = init_by_xrlf_best_of(&g, &p, 6, 77);
        assert_eq!(a, b);
        assert_eq!(number_of_conflicting_edges(&g, &a), 0);
        assert!(is_fully_coloured(&a));
    }
}
