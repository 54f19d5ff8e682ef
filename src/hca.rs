//! Hybrid colouring algorithm: the fixed-k evolutionary preset.
//!
//! Galinier & Hao, "Hybrid Evolutionary Algorithms for Graph Coloring". Populations start from
//! greedy saturation colourings, children are produced by GPX and repaired by tabu search.

use crate::colouring::ColourCount;
use crate::crossover::gpx_crossover;
use crate::graph::Graph;
use crate::saturation::init_by_greedy_saturation;
use crate::scheduler::{perform, ColouringResult, ScheduleConfig, ScheduleError};
use crate::strategy::{ColouringStrategy, StrategyKind};
use crate::tabu::{tabu_search, TabuParams};

/// Parameters of a hybrid colouring run.
#[derive(Clone, Debug, PartialEq)]
pub struct HcaConfig {
    /// Local search parameters.
    pub tabu: TabuParams,
    /// Population size of the single strategy.
    pub population_size: usize,
    /// Generations per lineage.
    pub max_iterations: usize,
    /// Worker threads.
    pub thread_count: usize,
    /// Base seed; `None` draws a fresh one.
    pub seed: Option<u64>,
}

impl Default for HcaConfig {
    fn default() -> Self {
        let schedule = ScheduleConfig::default();
        Self {
            tabu: TabuParams::default(),
            population_size: schedule.population_size,
            max_iterations: schedule.max_iterations,
            thread_count: schedule.thread_count,
            seed: schedule.seed,
        }
    }
}

impl HcaConfig {
    fn schedule(&self) -> ScheduleConfig {
        ScheduleConfig {
            population_size: self.population_size,
            max_iterations: self.max_iterations,
            thread_count: self.thread_count,
            seed: self.seed,
        }
    }
}

/// Fixed-k strategy: greedy saturation init, GPX crossover, tabu search.
pub fn hybrid_strategy(tabu: TabuParams) -> ColouringStrategy {
    ColouringStrategy::new(StrategyKind::FixedK)
        .with_init(|graph, k, rng| init_by_greedy_saturation(graph, k, rng))
        .with_crossover(|_, a, b, rng| gpx_crossover(a, b, rng))
        .with_local_search(move |graph, s, rng| tabu_search(graph, s, &tabu, rng))
}

/// Runs the hybrid strategy on `graph` starting from `k` colours.
///
/// # Errors
/// Returns a [`ScheduleError`] if the configuration is invalid.
pub fn hybrid_colouring_algorithm(
    graph: &Graph,
    k: ColourCount,
    config: &HcaConfig,
) -> Result<ColouringResult, ScheduleError> {
    let mut results = perform(&[hybrid_strategy(config.tabu)], graph, k, &config.schedule())?;
    Ok(results.remove(0))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colouring::{colour_count, is_solution};
    use crate::graph::{MYCIEL3_GRAPH, SIMPLE_GRAPH};

    fn config(population_size: usize, thread_count: usize) -> HcaConfig {
        HcaConfig {
            population_size,
            max_iterations: 100,
            thread_count,
            seed: Some(3),
            ..HcaConfig::default()
        }
    }

    #[test]
    fn default_matches_scheduler_defaults() {
        let cfg = HcaConfig::default();
        assert_eq!(cfg.population_size, 10);
        assert_eq!(cfg.max_iterations, 100);
        assert!(cfg.thread_count >= 1);
        assert_eq!(cfg.tabu, TabuParams::default());
    }

    #[test]
    fn strategy_is_complete_and_fixed_k() {
        let strategy = hybrid_strategy(TabuParams::default());
        assert!(strategy.is_complete());
        assert_eq!(strategy.kind(), StrategyKind::FixedK);
    }

    #[test]
    fn colours_simple_graph_with_three() {
        let g = Graph::from_metis_str(SIMPLE_GRAPH).unwrap();
        let result = hybrid_colouring_algorithm(&g, 3, &config(16, 2)).unwrap();
        let best = result.best_solution.expect("three colours suffice");
        assert!(is_solution(&g, 3, &best));
        assert_eq!(colour_count(&best), 3);
    }

    #[test]
    fn myciel3_never_reports_three_colours() {
        let g = Graph::from_metis_str(MYCIEL3_GRAPH).unwrap();
        let result = hybrid_colouring_algorithm(&g, 4, &config(8, 2)).unwrap();
        if let Some(best) = result.best_solution {
            assert!(is_solution(&g, 4, &best));
            assert_eq!(colour_count(&best), 4);
        }
        assert_eq!(result.colouring.len(), 11);
    }

    #[test]
    fn rejects_zero_threads() {
        let g = Graph::from_metis_str(SIMPLE_GRAPH).unwrap();
        let err = hybrid_colouring_algorithm(&g, 3, &config(4, 0)).unwrap_err();
        assert_eq!(err, ScheduleError::NoThreads);
    }
}
