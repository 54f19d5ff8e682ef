//! Colouring strategies: an operator family plus the scoring rule of its population.

use crate::colouring::{
    is_solution, number_of_conflicting_edges, squared_colour_class_sizes, sum_uncoloured_degree,
    Colour, ColourCount, Colouring,
};
use crate::graph::Graph;
use rand::rngs::SmallRng;
use rand::Rng;
use std::fmt;

/// Builds an initial colouring for a target colour count.
pub type InitOperator = Box<dyn Fn(&Graph, ColourCount, &mut SmallRng) -> Colouring + Send + Sync>;

/// Combines two parents into a child.
pub type CrossoverOperator =
    Box<dyn Fn(&Graph, &[Colour], &[Colour], &mut SmallRng) -> Colouring + Send + Sync>;

/// Improves a single colouring.
pub type LocalSearchOperator =
    Box<dyn Fn(&Graph, &[Colour], &mut SmallRng) -> Colouring + Send + Sync>;

/// Decides whether a colouring solves the problem for a colour count.
pub type SolutionCheck = Box<dyn Fn(&Graph, ColourCount, &[Colour]) -> bool + Send + Sync>;

// ============================================================================
// StrategyKind
// ============================================================================

/// Scoring rule and restart behaviour of a strategy's population.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    /// Complete, possibly conflicting colourings with exactly `k` colours. Scored by
    /// conflicting edges.
    FixedK,
    /// Conflict-free, possibly partial colourings with at most `k` colours. Scored by the degree
    /// sum of uncoloured nodes.
    FixedKPartial,
    /// Conflict-free colourings with a free number of colours. Scored by (negated) squared class
    /// sizes.
    Variable,
}

impl StrategyKind {
    /// `true` if the population is restarted whenever the target colour count drops.
    #[inline]
    pub fn is_fixed_k(self) -> bool {
        matches!(self, Self::FixedK | Self::FixedKPartial)
    }

    /// `true` iff `a` scores strictly worse than `b`.
    pub fn compare(self, graph: &Graph, a: &[Colour], b: &[Colour]) -> bool {
        match self {
            Self::FixedK => {
                number_of_conflicting_edges(graph, a) > number_of_conflicting_edges(graph, b)
            }
            Self::FixedKPartial => {
                sum_uncoloured_degree(graph, a) > sum_uncoloured_degree(graph, b)
            }
            Self::Variable => squared_colour_class_sizes(a) > squared_colour_class_sizes(b),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::FixedK => "fixed-k",
            Self::FixedKPartial => "fixed-k-partial",
            Self::Variable => "variable",
        };
        f.write_str(name)
    }
}

// ============================================================================
// ColouringStrategy
// ============================================================================

/// A strategy: its kind, at least one operator of each family, and an optional solution check
/// replacing [`is_solution`].
pub struct ColouringStrategy {
    kind: StrategyKind,
    /// Initialization operators.
    pub init_operators: Vec<InitOperator>,
    /// Crossover operators.
    pub crossover_operators: Vec<CrossoverOperator>,
    /// Local search (mutation) operators.
    pub local_search_operators: Vec<LocalSearchOperator>,
    solution_check: Option<SolutionCheck>,
}

impl ColouringStrategy {
    /// Strategy of `kind` without operators.
    pub fn new(kind: StrategyKind) -> Self {
        Self {
            kind,
            init_operators: Vec::new(),
            crossover_operators: Vec::new(),
            local_search_operators: Vec::new(),
            solution_check: None,
        }
    }

    /// Adds an initialization operator.
    #[must_use]
    pub fn with_init<F>(mut self, op: F) -> Self
    where
        F: Fn(&Graph, ColourCount, &mut SmallRng) -> Colouring + Send + Sync + 'static,
    {
        self.init_operators.push(Box::new(op));
        self
    }

    /// Adds a crossover operator.
    #[must_use]
    pub fn with_crossover<F>(mut self, op: F) -> Self
    where
        F: Fn(&Graph, &[Colour], &[Colour], &mut SmallRng) -> Colouring + Send + Sync + 'static,
    {
        self.crossover_operators.push(Box::new(op));
        self
    }

    /// Adds a local search operator.
    #[must_use]
    pub fn with_local_search<F>(mut self, op: F) -> Self
    where
        F: Fn(&Graph, &[Colour], &mut SmallRng) -> Colouring + Send + Sync + 'static,
    {
        self.local_search_operators.push(Box::new(op));
        self
    }

    /// Replaces the default solution check.
    #[must_use]
    pub fn with_solution_check<F>(mut self, check: F) -> Self
    where
        F: Fn(&Graph, ColourCount, &[Colour]) -> bool + Send + Sync + 'static,
    {
        self.solution_check = Some(Box::new(check));
        self
    }

    /// Kind of this strategy.
    #[inline]
    pub fn kind(&self) -> StrategyKind {
        self.kind
    }

    /// See [`StrategyKind::is_fixed_k`].
    #[inline]
    pub fn is_fixed_k(&self) -> bool {
        self.kind.is_fixed_k()
    }

    /// See [`StrategyKind::compare`].
    #[inline]
    pub fn compare(&self, graph: &Graph, a: &[Colour], b: &[Colour]) -> bool {
        self.kind.compare(graph, a, b)
    }

    /// `true` if `s` solves the problem for `k` colours.
    pub fn is_solution(&self, graph: &Graph, k: ColourCount, s: &[Colour]) -> bool {
        match &self.solution_check {
            Some(check) => check(graph, k, s),
            None => is_solution(graph, k, s),
        }
    }

    /// `true` when every operator family has at least one member.
    pub fn is_complete(&self) -> bool {
        !self.init_operators.is_empty()
            && !self.crossover_operators.is_empty()
            && !self.local_search_operators.is_empty()
    }

    /// Runs a uniformly chosen initialization operator.
    pub(crate) fn init(&self, graph: &Graph, k: ColourCount, rng: &mut SmallRng) -> Colouring {
        let op = &self.init_operators[rng.random_range(0..self.init_operators.len())];
        op(graph, k, rng)
    }

    /// Runs a uniformly chosen crossover operator.
    pub(crate) fn crossover(
        &self,
        graph: &Graph,
        a: &[Colour],
        b: &[Colour],
        rng: &mut SmallRng,
    ) -> Colouring {
        let op = &self.crossover_operators[rng.random_range(0..self.crossover_operators.len())];
        op(graph, a, b, rng)
    }

    /// Runs a uniformly chosen local search operator.
    pub(crate) fn local_search(
        &self,
        graph: &Graph,
        s: &[Colour],
        rng: &mut SmallRng,
    ) -> Colouring {
        let index = rng.random_range(0..self.local_search_operators.len());
        let op = &self.local_search_operators[index];
        op(graph, s, rng)
    }
}

impl fmt::Debug for ColouringStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColouringStrategy")
            .field("kind", &self.kind)
            .field("init_operators", &self.init_operators.len())
            .field("crossover_operators", &self.crossover_operators.len())
            .field("local_search_operators", &self.local_search_operators.len())
            .field("custom_solution_check", &self.solution_check.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colouring::UNCOLOURED;
    use crate::graph::SIMPLE_GRAPH;
    use rand::SeedableRng;

    fn simple() -> Graph {
        Graph::from_metis_str(SIMPLE_GRAPH).unwrap()
    }

    #[test]
    fn fixed_k_prefers_fewer_conflicts() {
        let g = simple();
        let worse = [0, 0, 0, 0, 0, 1];
        let better = [0, 1, 0, 1, 0, 2];
        assert!(StrategyKind::FixedK.compare(&g, &worse, &better));
        assert!(!StrategyKind::FixedK.compare(&g, &better, &worse));
        assert!(!StrategyKind::FixedK.compare(&g, &better, &better));
    }

    #[test]
    fn partial_prefers_smaller_uncoloured_degree() {
        let g = simple();
        let worse = [UNCOLOURED, UNCOLOURED, 0, 1, 0, 2];
        let better = [0, 1, 0, 1, 0, UNCOLOURED];
        assert!(StrategyKind::FixedKPartial.compare(&g, &worse, &better));
    }

    #[test]
    fn variable_prefers_unbalanced_classes() {
        let g = simple();
        let worse = [0, 1, 2, 0, 1, 2];
        let better = [0, 1, 0, 1, 0, 2];
        assert!(StrategyKind::Variable.compare(&g, &worse, &better));
        assert!(!StrategyKind::Variable.is_fixed_k());
        assert!(StrategyKind::FixedKPartial.is_fixed_k());
    }

    #[test]
    fn custom_solution_check_overrides_default() {
        let g = simple();
        let s = [0, 1, 0, 1, 0, 2];
        let strategy = ColouringStrategy::new(StrategyKind::FixedK);
        assert!(strategy.is_solution(&g, 3, &s));
        let strict =
            ColouringStrategy::new(StrategyKind::FixedK).with_solution_check(|_, k, _| k == 0);
        assert!(!strict.is_solution(&g, 3, &s));
    }

    #[test]
    fn operators_are_dispatched() {
        let g = simple();
        let strategy = ColouringStrategy::new(StrategyKind::FixedK)
            .with_init(|graph, k, _| vec![k; graph.number_of_nodes()])
            .with_crossover(|_, a, _, _| a.to_vec())
            .with_local_search(|_, s, _| s.iter().map(|c| c + 1).collect());
        assert!(strategy.is_complete());
        let mut rng = SmallRng::seed_from_u64(0);
        let s = strategy.init(&g, 2, &mut rng);
        assert_eq!(s, vec![2; 6]);
        let child = strategy.crossover(&g, &s, &[0; 6], &mut rng);
        assert_eq!(strategy.local_search(&g, &child, &mut rng), vec![3; 6]);
        assert!(!ColouringStrategy::new(StrategyKind::Variable).is_complete());
    }
}
