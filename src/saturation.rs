//! Greedy saturation initialization for fixed-k strategies.

use crate::colouring::{ColourCount, Colouring, UNCOLOURED};
use crate::graph::Graph;
use rand::Rng;

/// Builds an initial colouring with at most `k` colours.
///
/// Repeatedly takes the uncoloured node with the fewest legal classes (smallest id on ties) and
/// gives it the lowest legal class. Once the chosen node has no legal class left, every node not
/// yet placed gets an independent uniform colour from `0..k`, so the result may conflict.
/// `k = 0` yields an uncoloured colouring.
pub fn init_by_greedy_saturation<R: Rng + ?Sized>(
    graph: &Graph,
    k: ColourCount,
    rng: &mut R,
) -> Colouring {
    let n = graph.number_of_nodes();
    let mut s = vec![UNCOLOURED; n];
    if k == 0 {
        return s;
    }
    let width = k as usize;

    // blocked[v * width + c]: coloured neighbours of v in class c.
    let mut blocked = vec![0u32; n * width];
    let mut allowed = vec![width; n];
    let mut remaining = n;

    while remaining > 0 {
        let next = graph.nodes().filter(|&v| s[v] == UNCOLOURED).min_by_key(|&v| allowed[v]);
        let Some(v) = next else {
            break;
        };
        if allowed[v] == 0 {
            break;
        }
        let Some(c) = (0..width).find(|&c| blocked[v * width + c] == 0) else {
            break;
        };
        s[v] = c as ColourCount;
        remaining -= 1;
        for &u in graph.neighbours(v) {
            let slot = &mut blocked[u * width + c];
            if *slot == 0 {
                allowed[u] -= 1;
            }
            *slot += 1;
        }
    }

    for colour in s.iter_mut().filter(|c| **c == UNCOLOURED) {
        *colour = rng.random_range(0..k);
    }
    s
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colouring::{colour_classes, is_fully_coloured, number_of_conflicting_edges};
    use crate::graph::{MYCIEL3_GRAPH, SIMPLE_GRAPH};
    use rand::SeedableRng;
    use rand_xorshift::XorShiftRng;

    #[test]
    fn simple_graph_three_colours() {
        let g = Graph::from_metis_str(SIMPLE_GRAPH).unwrap();
        let mut rng = XorShiftRng::seed_from_u64(0);
        let s = init_by_greedy_saturation(&g, 3, &mut rng);
        assert_eq!(colour_classes(&s), vec![vec![0, 2, 4], vec![1, 3], vec![5]]);
    }

    #[test]
    fn too_few_colours_fill_randomly() {
        let g = Graph::from_metis_str(MYCIEL3_GRAPH).unwrap();
        let mut rng = XorShiftRng::seed_from_u64(11);
        let s = init_by_greedy_saturation(&g, 2, &mut rng);
        assert!(is_fully_coloured(&s));
        assert!(s.iter().all(|&c| c < 2));
        assert!(number_of_conflicting_edges(&g, &s) > 0);
    }

    #[test]
    fn enough_colours_give_proper_colouring() {
        let g = Graph::from_metis_str(MYCIEL3_GRAPH).unwrap();
        let mut rng = XorShiftRng::seed_from_u64(11);
        let s = init_by_greedy_saturation(&g, 6, &mut rng);
        assert_eq!(number_of_conflicting_edges(&g, &s), 0);
    }

    #[test]
    fn zero_colours_leave_everything_uncoloured() {
        let g = Graph::from_metis_str(SIMPLE_GRAPH).unwrap();
        let mut rng = XorShiftRng::seed_from_u64(0);
        assert_eq!(init_by_greedy_saturation(&g, 0, &mut rng), vec![UNCOLOURED; 6]);
    }
}
