//! Tabu search local improvement for fixed-k colourings (TabuCol variant).
//!
//! Only conflicting nodes are moved. Each round applies the best recolouring that does not
//! increase the number of conflicting edges; the vacated `(node, colour)` pair is then tabu for
//! `tl` rounds, where `tl = uniform(0..A) + floor(alpha * conflicting nodes)`. A node whose
//! current `(node, colour)` pair is tabu stays where it is, so a node moved back into a colour it
//! just left is frozen there until the tenure runs out.

use crate::colouring::{
    number_of_conflicting_edges, number_of_conflicting_nodes, palette_size, Colour, Colouring,
    UNCOLOURED,
};
use crate::graph::Graph;
use rand::Rng;

// ============================================================================
// Configuration
// ============================================================================

/// Tabu search parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TabuParams {
    /// Maximum number of rounds (`L`).
    pub iterations: usize,
    /// Upper bound (exclusive) of the random part of the tenure (`A`).
    pub a: usize,
    /// Weight of the conflicting-node count in the tenure.
    pub alpha: f64,
}

impl Default for TabuParams {
    fn default() -> Self {
        Self { iterations: 5, a: 2, alpha: 0.6 }
    }
}

// ============================================================================
// Search
// ============================================================================

/// Improves `s` by tabu search and returns the result. Never increases the conflict count.
///
/// The palette is `0..palette_size(s)`. Uncoloured nodes are left alone.
pub fn tabu_search<R: Rng + ?Sized>(
    graph: &Graph,
    s: &[Colour],
    params: &TabuParams,
    rng: &mut R,
) -> Colouring {
    let mut s = s.to_vec();
    let n = graph.number_of_nodes();
    let k = palette_size(&s) as usize;
    if k == 0 {
        return s;
    }

    let random_part = if params.a > 0 { rng.random_range(0..params.a) } else { 0 };
    let conflicting_nodes = number_of_conflicting_nodes(graph, &s) as f64;
    let tenure = random_part + (params.alpha * conflicting_nodes).floor() as usize;

    // gamma[v * k + c]: neighbours of v currently coloured c.
    let mut gamma = vec![0usize; n * k];
    for v in graph.nodes() {
        for &u in graph.neighbours(v) {
            if s[u] != UNCOLOURED {
                gamma[v * k + s[u] as usize] += 1;
            }
        }
    }
    let mut conflicts = number_of_conflicting_edges(graph, &s);
    // Round from which v may leave colour c again.
    let mut tabu_until = vec![0usize; n * k];
    let mut by_colour: Vec<Vec<usize>> = vec![Vec::new(); k];

    for round in 0..params.iterations {
        if conflicts == 0 {
            break;
        }
        for class in &mut by_colour {
            class.clear();
        }
        for v in graph.nodes() {
            let c = s[v];
            if c != UNCOLOURED && gamma[v * k + c as usize] > 0 {
                by_colour[c as usize].push(v);
            }
        }

        let mut best: Option<(usize, Colour, usize)> = None;
        for (c, members) in by_colour.iter().enumerate() {
            for &v in members {
                if tabu_until[v * k + c] > round {
                    continue;
                }
                let row = &gamma[v * k..(v + 1) * k];
                for i in (0..k).filter(|&i| i != c) {
                    let total = conflicts - row[c] + row[i];
                    if total <= conflicts && best.map_or(true, |(_, _, b)| total < b) {
                        best = Some((v, i as Colour, total));
                    }
                }
            }
        }
        let Some((v, to, total)) = best else {
            break;
        };

        let from = s[v];
        s[v] = to;
        for &u in graph.neighbours(v) {
            gamma[u * k + from as usize] -= 1;
            gamma[u * k + to as usize] += 1;
        }
        conflicts = total;
        tabu_until[v * k + from as usize] = round + 1 + tenure;
        debug_assert_eq!(conflicts, number_of_conflicting_edges(graph, &s));
    }
    s
}

// ============================================================================
// Tests
// ============================================================================
