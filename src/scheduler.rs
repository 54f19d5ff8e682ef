//! Parallel genetic scheduler driving one population per colouring strategy.
//!
//! The calling thread acts as master; `thread_count` scoped workers pull [`WorkItem`]s from a
//! shared lock-free queue:
//! - iteration 0 initializes a slot (init operator, then local search);
//! - iteration > 0 locks two random slots of the strategy, breeds them (crossover, then local
//!   search) and overwrites the weaker parent.
//!
//! Slots are guarded by `AtomicBool` flags acquired with CAS; the `Mutex` around each colouring
//! is never contended. Workers report colourings that solve the live target `k` to the master,
//! which lowers the target and restarts every fixed-k population once its in-flight work has
//! drained.

use crate::colouring::{colour_count, ColourCount, Colouring};
use crate::graph::Graph;
use crate::rng::{derive_seed, fresh_seed};
use crate::strategy::ColouringStrategy;
use crossbeam::queue::SegQueue;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use thiserror::Error;
use tracing::{debug, info, warn};

/// CAS attempts per population slot before a worker gives up on mating and requeues its item.
const SPIN_ROUNDS: usize = 64;

// ============================================================================
// Configuration and results
// ============================================================================

/// Scheduler configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduleConfig {
    /// Colourings maintained per strategy.
    pub population_size: usize,
    /// Generations per lineage.
    pub max_iterations: usize,
    /// Worker threads.
    pub thread_count: usize,
    /// Base seed of the worker streams; `None` draws a fresh one.
    pub seed: Option<u64>,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            population_size: 10,
            max_iterations: 100,
            thread_count: std::thread::available_parallelism()
                .map(std::num::NonZero::get)
                .unwrap_or(1),
            seed: None,
        }
    }
}

/// Outcome for one strategy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColouringResult {
    /// Index of the strategy in the input slice.
    pub strategy: usize,
    /// Best member of the final population according to the strategy's comparison.
    pub colouring: Colouring,
    /// `true` iff `colouring` solves the requested colour count.
    pub is_valid: bool,
    /// Fewest-colour solution reported by this strategy during the run, if any.
    pub best_solution: Option<Colouring>,
}

/// Invalid scheduler input.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ScheduleError {
    /// No strategy was supplied.
    #[error("no colouring strategies given")]
    NoStrategies,
    /// `population_size` is zero.
    #[error("population size must be positive")]
    EmptyPopulation,
    /// `max_iterations` is zero.
    #[error("maximum iteration count must be positive")]
    NoIterations,
    /// `thread_count` is zero.
    #[error("thread count must be positive")]
    NoThreads,
    /// A strategy lacks an operator family.
    #[error("strategy {strategy} needs at least one init, crossover and local search operator")]
    IncompleteStrategy {
        /// Index of the offending strategy.
        strategy: usize,
    },
}

// ============================================================================
// Shared state
// ============================================================================

#[derive(Clone, Copy, Debug)]
struct WorkItem {
    iteration: usize,
    strategy: usize,
    target_k: ColourCount,
    /// Slot within the strategy's population.
    slot: usize,
}

#[derive(Debug)]
struct FoundColouring {
    colours: ColourCount,
    strategy: usize,
    colouring: Colouring,
}

enum Parents {
    Pair(usize, usize),
    Stale,
    Busy,
}

/// Sets the flag if the owning thread unwinds.
struct AbortOnPanic<'a>(&'a AtomicBool);

impl Drop for AbortOnPanic<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.store(true, Ordering::Release);
        }
    }
}

struct Shared<'a> {
    strategies: &'a [ColouringStrategy],
    graph: &'a Graph,
    population_size: usize,
    max_iterations: usize,
    population: Vec<Mutex<Colouring>>,
    /// `true` while a slot is held by a worker or awaits initialization.
    locks: Vec<AtomicBool>,
    /// Outstanding work items per strategy.
    in_flight: Vec<AtomicUsize>,
    work: SegQueue<WorkItem>,
    found: SegQueue<FoundColouring>,
    target_k: AtomicU32,
    terminated: AtomicBool,
    aborted: AtomicBool,
}

impl<'a> Shared<'a> {
    fn new(
        strategies: &'a [ColouringStrategy],
        graph: &'a Graph,
        k: ColourCount,
        config: &ScheduleConfig,
    ) -> Self {
        let slots = strategies.len() * config.population_size;
        Self {
            strategies,
            graph,
            population_size: config.population_size,
            max_iterations: config.max_iterations,
            population: (0..slots).map(|_| Mutex::new(Colouring::new())).collect(),
            locks: (0..slots).map(|_| AtomicBool::new(false)).collect(),
            in_flight: (0..strategies.len()).map(|_| AtomicUsize::new(0)).collect(),
            work: SegQueue::new(),
            found: SegQueue::new(),
            target_k: AtomicU32::new(k),
            terminated: AtomicBool::new(false),
            aborted: AtomicBool::new(false),
        }
    }

    fn slot(&self, index: usize) -> MutexGuard<'_, Colouring> {
        self.population[index].lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Locks every slot of `strategy` and queues their initialization.
    fn seed_population(&self, strategy: usize, target_k: ColourCount) {
        let base = strategy * self.population_size;
        for lock in &self.locks[base..base + self.population_size] {
            lock.store(true, Ordering::Release);
        }
        self.in_flight[strategy].fetch_add(self.population_size, Ordering::AcqRel);
        for slot in 0..self.population_size {
            self.work.push(WorkItem { iteration: 0, strategy, target_k, slot });
        }
    }

    fn is_stale(&self, item: &WorkItem) -> bool {
        self.strategies[item.strategy].is_fixed_k()
            && self.target_k.load(Ordering::Acquire) < item.target_k
    }

    fn finish(&self, strategy: usize) {
        self.in_flight[strategy].fetch_sub(1, Ordering::AcqRel);
    }

    fn release(&self, index: usize) {
        self.locks[index].store(false, Ordering::Release);
    }

    fn all_finished(&self) -> bool {
        self.in_flight.iter().all(|n| n.load(Ordering::Acquire) == 0)
    }

    fn should_stop(&self) -> bool {
        self.terminated.load(Ordering::Acquire) || self.aborted.load(Ordering::Acquire)
    }

    // ------------------------------------------------------------------------
    // Worker side
    // ------------------------------------------------------------------------

    fn run_worker(&self, worker_id: usize, base_seed: u64) {
        let _guard = AbortOnPanic(&self.aborted);
        let mut rng = SmallRng::seed_from_u64(derive_seed(base_seed, worker_id as u64));
        // Suppresses repeated reports of colour counts this worker already sent.
        let mut last_reported_k = self.target_k.load(Ordering::Acquire).saturating_add(1);

        while !self.should_stop() {
            let Some(item) = self.work.pop() else {
                thread::yield_now();
                continue;
            };
            if self.is_stale(&item) {
                self.finish(item.strategy);
                continue;
            }
            let strategy = &self.strategies[item.strategy];

            let result = if item.iteration > 0 {
                match self.acquire_parents(&item, &mut rng) {
                    Parents::Pair(a, b) => self.breed(strategy, a, b, &mut rng),
                    Parents::Stale => {
                        self.finish(item.strategy);
                        continue;
                    }
                    Parents::Busy => {
                        self.work.push(item);
                        thread::yield_now();
                        continue;
                    }
                }
            } else {
                self.initialize(strategy, &item, &mut rng)
            };

            let target = self.target_k.load(Ordering::Acquire);
            if last_reported_k > target && strategy.is_solution(self.graph, target, &result) {
                last_reported_k = colour_count(&result);
                self.found.push(FoundColouring {
                    colours: last_reported_k,
                    strategy: item.strategy,
                    colouring: result,
                });
            }

            let continues = if item.iteration > 0 {
                item.iteration < self.max_iterations
            } else {
                item.slot < self.population_size / 2
            };
            if continues {
                self.work.push(WorkItem { iteration: item.iteration + 1, ..item });
            } else {
                self.finish(item.strategy);
            }
        }
    }

    fn initialize(
        &self,
        strategy: &ColouringStrategy,
        item: &WorkItem,
        rng: &mut SmallRng,
    ) -> Colouring {
        let s = strategy.init(self.graph, item.target_k, rng);
        let s = strategy.local_search(self.graph, &s, rng);
        let index = item.strategy * self.population_size + item.slot;
        self.slot(index).clone_from(&s);
        self.release(index);
        s
    }

    fn breed(
        &self,
        strategy: &ColouringStrategy,
        a: usize,
        b: usize,
        rng: &mut SmallRng,
    ) -> Colouring {
        let child = {
            let mut pa = self.slot(a);
            let mut pb = self.slot(b);
            let child = strategy.crossover(self.graph, &pa, &pb, rng);
            let child = strategy.local_search(self.graph, &child, rng);
            let weaker = if strategy.compare(self.graph, &pa, &pb) { &mut pa } else { &mut pb };
            weaker.clone_from(&child);
            child
        };
        self.release(a);
        self.release(b);
        child
    }

    fn acquire_parents(&self, item: &WorkItem, rng: &mut SmallRng) -> Parents {
        let first = match self.acquire_slot(item, rng) {
            Ok(slot) => slot,
            Err(outcome) => return outcome,
        };
        match self.acquire_slot(item, rng) {
            Ok(second) => Parents::Pair(first, second),
            Err(outcome) => {
                self.release(first);
                outcome
            }
        }
    }

    fn acquire_slot(&self, item: &WorkItem, rng: &mut SmallRng) -> Result<usize, Parents> {
        let base = item.strategy * self.population_size;
        for _ in 0..SPIN_ROUNDS * self.population_size {
            if self.is_stale(item) || self.should_stop() {
                return Err(Parents::Stale);
            }
            let index = base + rng.random_range(0..self.population_size);
            if self.locks[index]
                .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
                .is_ok()
            {
                return Ok(index);
            }
            std::hint::spin_loop();
        }
        Err(Parents::Busy)
    }

    // ------------------------------------------------------------------------
    // Master side
    // ------------------------------------------------------------------------

    fn run_master(&self) -> Vec<Option<Colouring>> {
        let _guard = AbortOnPanic(&self.aborted);
        let mut best: Vec<Option<Colouring>> = vec![None; self.strategies.len()];
        loop {
            if self.aborted.load(Ordering::Acquire) {
                break;
            }
            while let Some(found) = self.found.pop() {
                self.handle_found(found, &mut best);
            }
            // Reports are queued before their item is retired, so an empty queue here is final.
            if self.all_finished() && self.found.is_empty() {
                break;
            }
            thread::yield_now();
        }
        best
    }

    fn handle_found(&self, found: FoundColouring, best: &mut [Option<Colouring>]) {
        info!(colours = found.colours, strategy = found.strategy, "found colouring");
        let slot = &mut best[found.strategy];
        if slot.as_ref().map_or(true, |s| colour_count(s) > found.colours) {
            *slot = Some(found.colouring);
        }

        let target = self.target_k.load(Ordering::Acquire);
        if target < found.colours || found.colours <= 1 {
            return;
        }
        let next = found.colours - 1;
        self.target_k.store(next, Ordering::Release);
        for (id, strategy) in self.strategies.iter().enumerate() {
            if !strategy.is_fixed_k() {
                continue;
            }
            while self.in_flight[id].load(Ordering::Acquire) > 0 {
                if self.aborted.load(Ordering::Acquire) {
                    return;
                }
                thread::yield_now();
            }
            debug!(strategy = id, k = next, "restarting population");
            self.seed_population(id, next);
        }
    }
}

// ============================================================================
// Entry point
// ============================================================================

/// Runs the genetic scheduler on `graph` with initial target `k` and returns one result per
/// strategy, in input order.
///
/// Panics raised by operators are propagated after all workers have stopped.
pub fn perform(
    strategies: &[ColouringStrategy],
    graph: &Graph,
    k: ColourCount,
    config: &ScheduleConfig,
) -> Result<Vec<ColouringResult>, ScheduleError> {
    if strategies.is_empty() {
        return Err(ScheduleError::NoStrategies);
    }
    if config.population_size == 0 {
        return Err(ScheduleError::EmptyPopulation);
    }
    if config.max_iterations == 0 {
        return Err(ScheduleError::NoIterations);
    }
    if config.thread_count == 0 {
        return Err(ScheduleError::NoThreads);
    }
    if let Some(strategy) = strategies.iter().position(|s| !s.is_complete()) {
        return Err(ScheduleError::IncompleteStrategy { strategy });
    }
    if config.population_size < 4 * config.thread_count * strategies.len() {
        warn!(
            population_size = config.population_size,
            threads = config.thread_count,
            strategies = strategies.len(),
            "population size should be at least 4 * threads * strategies"
        );
    }

    let base_seed = config.seed.unwrap_or_else(fresh_seed);
    let shared = Shared::new(strategies, graph, k, config);
    for strategy in 0..strategies.len() {
        shared.seed_population(strategy, k);
    }

    let best_solutions = thread::scope(|scope| {
        for worker_id in 0..config.thread_count {
            let shared = &shared;
            scope.spawn(move || shared.run_worker(worker_id, base_seed));
        }
        let best = shared.run_master();
        shared.terminated.store(true, Ordering::Release);
        best
    });
    info!(k = shared.target_k.load(Ordering::Acquire), "scheduler finished");

    let mut population: Vec<Colouring> = shared
        .population
        .into_iter()
        .map(|m| m.into_inner().unwrap_or_else(PoisonError::into_inner))
        .collect();
    let results = strategies
        .iter()
        .zip(best_solutions)
        .enumerate()
        .map(|(id, (strategy, best_solution))| {
            let range = id * config.population_size..(id + 1) * config.population_size;
            let members = &mut population[range];
            let mut best = 0;
            for i in 1..members.len() {
                if strategy.compare(graph, &members[best], &members[i]) {
                    best = i;
                }
            }
            let colouring = std::mem::take(&mut members[best]);
            let is_valid = strategy.is_solution(graph, k, &colouring);
            ColouringResult { strategy: id, colouring, is_valid, best_solution }
        })
        .collect();
    Ok(results)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colouring::{is_solution, number_of_conflicting_edges, Colour};
    use crate::crossover::gpx_crossover;
    use crate::graph::{MYCIEL3_GRAPH, SIMPLE_GRAPH};
    use crate::saturation::init_by_greedy_saturation;
    use crate::strategy::StrategyKind;
    use crate::tabu::{tabu_search, TabuParams};
    use crate::xrlf::{xrlf_init_operator, XrlfMode, XrlfParams};

    fn hybrid() -> ColouringStrategy {
        let params = TabuParams::default();
        ColouringStrategy::new(StrategyKind::FixedK)
            .with_init(|g, k, rng| init_by_greedy_saturation(g, k, rng))
            .with_crossover(|_, a, b, rng| gpx_crossover(a, b, rng))
            .with_local_search(move |g, s, rng| tabu_search(g, s, &params, rng))
    }

    fn config(
        population_size: usize,
        max_iterations: usize,
        thread_count: usize,
    ) -> ScheduleConfig {
        ScheduleConfig { population_size, max_iterations, thread_count, seed: Some(7) }
    }

    #[test]
    fn finds_three_colouring_of_simple_graph() {
        let g = Graph::from_metis_str(SIMPLE_GRAPH).unwrap();
        let results = perform(&[hybrid()], &g, 5, &config(20, 100, 2)).unwrap();
        assert_eq!(results.len(), 1);
        let best = results[0].best_solution.as_ref().expect("a solution is reported");
        assert!(is_solution(&g, 3, best));
        assert_eq!(colour_count(best), 3);
        // The population was restarted at k = 2, which the triangle 0-1-5 rules out.
        assert!(!results[0].is_valid);
        assert!(results[0].colouring.iter().all(|&c| c < 2));
    }

    #[test]
    fn variable_strategy_keeps_valid_colourings() {
        let g = Graph::from_metis_str(MYCIEL3_GRAPH).unwrap();
        let params = XrlfParams {
            exact_limit: 0,
            trials: 4,
            set_limit: 4,
            candidates: 4,
            ..XrlfParams::default()
        };
        let mut variable = ColouringStrategy::new(StrategyKind::Variable)
            .with_crossover(|_, a, _, _| a.to_vec())
            .with_local_search(|_, s, _| s.to_vec());
        variable.init_operators.push(xrlf_init_operator(XrlfMode::IgnoreColourCount, params));
        let results = perform(&[variable], &g, 11, &config(8, 5, 2)).unwrap();
        assert!(results[0].is_valid);
        assert_eq!(number_of_conflicting_edges(&g, &results[0].colouring), 0);
        assert!(results[0].best_solution.is_some());
    }

    #[test]
    fn one_result_per_strategy() {
        let g = Graph::from_metis_str(MYCIEL3_GRAPH).unwrap();
        let partial = ColouringStrategy::new(StrategyKind::FixedKPartial)
            .with_init(|g, k, rng| init_by_xrlf_partial(g, k, rng))
            .with_crossover(|_, a, b, rng| {
                if rng.random_bool(0.5) {
                    a.to_vec()
                } else {
                    b.to_vec()
                }
            })
            .with_local_search(|_, s, _| s.to_vec());
        let results = perform(&[hybrid(), partial], &g, 4, &config(16, 3, 2)).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[1].strategy, 1);
        assert_eq!(results[1].colouring.len(), 11);
    }

    fn init_by_xrlf_partial(g: &Graph, k: ColourCount, rng: &mut SmallRng) -> Colouring {
        let params = XrlfParams {
            exact_limit: 0,
            trials: 2,
            set_limit: 3,
            candidates: 3,
            mode: XrlfMode::UncolourRemaining,
            target_colours: k,
        };
        crate::xrlf::init_by_xrlf(g, &params, rng)
    }

    #[test]
    fn small_population_only_warns() {
        let g = Graph::from_metis_str(SIMPLE_GRAPH).unwrap();
        let results = perform(&[hybrid()], &g, 3, &config(2, 4, 4)).unwrap();
        assert_eq!(results[0].colouring.len(), 6);
    }

    #[test]
    fn rejects_invalid_configuration() {
        let g = Graph::from_metis_str(SIMPLE_GRAPH).unwrap();
        assert_eq!(perform(&[], &g, 3, &config(4, 1, 1)), Err(ScheduleError::NoStrategies));
        assert_eq!(
            perform(&[hybrid()], &g, 3, &config(0, 1, 1)),
            Err(ScheduleError::EmptyPopulation)
        );
        assert_eq!(perform(&[hybrid()], &g, 3, &config(4, 0, 1)), Err(ScheduleError::NoIterations));
        assert_eq!(perform(&[hybrid()], &g, 3, &config(4, 1, 0)), Err(ScheduleError::NoThreads));
        let incomplete = ColouringStrategy::new(StrategyKind::FixedK)
            .with_init(|g, _, _| vec![0; g.number_of_nodes()]);
        assert_eq!(
            perform(&[hybrid(), incomplete], &g, 3, &config(4, 1, 1)),
            Err(ScheduleError::IncompleteStrategy { strategy: 1 })
        );
    }

    #[test]
    #[should_panic]
    fn operator_panic_propagates() {
        let g = Graph::from_metis_str(SIMPLE_GRAPH).unwrap();
        let broken = ColouringStrategy::new(StrategyKind::FixedK)
            .with_init(|_, _, _| -> Colouring { panic!("init failed") })
            .with_crossover(|_, a, _, _| a.to_vec())
            .with_local_search(|_, s: &[Colour], _| s.to_vec());
        let _ = perform(&[broken], &g, 3, &config(8, 2, 2));
    }
}
