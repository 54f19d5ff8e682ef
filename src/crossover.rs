//! Greedy partition crossover (GPX).
//!
//! Galinier & Hao, "Hybrid Evolutionary Algorithms for Graph Coloring": the child inherits the
//! largest remaining colour class of each parent in turn.

use crate::colouring::{colour_count, palette_size, Colour, Colouring, UNCOLOURED};
use crate::graph::NodeId;
use rand::Rng;

/// Combines two parent colourings into a child using at most `k` colours, where `k` is the
/// larger of the two parents' colour counts.
///
/// Round `l` takes the largest class still remaining in parent `l % 2` (lowest colour on ties),
/// colours its members `l` and removes them from both parents. Nodes left over after `k` rounds
/// all receive one colour drawn uniformly from `0..k`.
///
/// A child may use fewer colours than its parents, so later generations can cross parents whose
/// colour counts differ.
pub fn gpx_crossover<R: Rng + ?Sized>(s1: &[Colour], s2: &[Colour], rng: &mut R) -> Colouring {
    debug_assert_eq!(s1.len(), s2.len());
    let n = s1.len();
    let k = colour_count(s1).max(colour_count(s2));
    let mut child = vec![UNCOLOURED; n];
    if k == 0 {
        return child;
    }

    let parents = [s1, s2];
    let palette = palette_size(s1).max(palette_size(s2)) as usize;
    let mut classes: [Vec<Vec<NodeId>>; 2] = [vec![Vec::new(); palette], vec![Vec::new(); palette]];
    let mut remaining = [vec![0usize; palette], vec![0usize; palette]];
    for (p, parent) in parents.iter().enumerate() {
        for (v, &c) in parent.iter().enumerate() {
            if c != UNCOLOURED {
                classes[p][c as usize].push(v);
                remaining[p][c as usize] += 1;
            }
        }
    }

    let mut unresolved = n;
    for l in 0..k {
        let p = (l & 1) as usize;
        // Lowest class index wins ties.
        let Some((largest, &size)) = remaining[p]
            .iter()
            .enumerate()
            .rev()
            .max_by_key(|&(_, size)| *size)
        else {
            break;
        };
        if size == 0 {
            break;
        }
        for &v in &classes[p][largest] {
            if child[v] != UNCOLOURED {
                continue;
            }
            child[v] = l;
            unresolved -= 1;
            for (q, parent) in parents.iter().enumerate() {
                if parent[v] != UNCOLOURED {
                    remaining[q][parent[v] as usize] -= 1;
                }
            }
        }
    }

    if unresolved > 0 {
        let fill = rng.random_range(0..k);
        for c in child.iter_mut().filter(|c| **c == UNCOLOURED) {
            *c = fill;
        }
    }
    child
}

// ============================================================================
// Tests
// ============================================================================
