//! # Graph Colouring
//!
//! A parallel hybrid graph-colouring library.
//!
//! This crate provides:
//! - A compact CSR graph with a METIS-style reader and GraphViz export.
//! - Colouring primitives, **GPX** crossover, **tabu search** and greedy saturation.
//! - **XRLF**: independent-set extraction with an exhaustive set search and an **exact**
//!   branch-and-bound colourer for small residual graphs.
//! - A parallel genetic scheduler running several colouring strategies side by side, lowering
//!   the target colour count whenever a strategy finds a solution.
//!
//! ## Quick Start
//!
//! ```no_run
//! use graph_colouring::graph::Graph;
//! use graph_colouring::hca::{hybrid_colouring_algorithm, HcaConfig};
//!
//! let graph = Graph::read_metis_file("graphs/myciel3.graph").expect("readable graph");
//! let cfg = HcaConfig {
//!     population_size: 32,
//!     seed: Some(12345),
//!     ..Default::default()
//! };
//! let result = hybrid_colouring_algorithm(&graph, 5, &cfg).expect("valid configuration");
//! println!("{:?}", result.best_solution);
//! ```
//!
//! ## Colouring with XRLF
//!
//! ```
//! use graph_colouring::colouring::{colour_count, is_solution};
//! use graph_colouring::graph::{Graph, MYCIEL3_GRAPH};
//! use graph_colouring::xrlf::{init_by_xrlf_best_of, XrlfParams};
//!
//! let graph = Graph::from_metis_str(MYCIEL3_GRAPH).unwrap();
//! let s = init_by_xrlf_best_of(&graph, &XrlfParams::default(), 4, 7);
//!
//! // Eleven nodes fit below the exact limit, so the colouring is optimal.
//! assert!(is_solution(&graph, 4, &s));
//! assert_eq!(colour_count(&s), 4);
//! ```
//!
//! ## Validating Bundled Graphs
//!
//! ```
//! use graph_colouring::validate::validate_bundled_graphs;
//!
//! validate_bundled_graphs().expect("all bundled graphs should colour correctly");
//! ```
//!
//! ## Modules
//!
//! - [`graph`]: Immutable CSR graph, METIS parsing and GraphViz output.
//! - [`colouring`]: Colouring representation and scoring.
//! - [`crossover`]: Greedy partition crossover.
//! - [`tabu`]: Tabu search for fixed-k colourings.
//! - [`saturation`]: Greedy saturation initialization.
//! - [`heap`], [`subgraph`]: Indexed heaps and the shrinking residual graph used by XRLF.
//! - [`iset`]: Exhaustive independent-set completion.
//! - [`exact`]: Exact branch-and-bound colouring.
//! - [`xrlf`]: XRLF construction and parallel restarts.
//! - [`strategy`], [`scheduler`]: Colouring strategies and the parallel scheduler.
//! - [`hca`]: The hybrid evolutionary preset.
//! - [`validate`]: Colouring validation.
//!
//! ## Performance Notes
//!
//! - Node ids are dense `usize` indices; neighbour lists are contiguous and sorted.
//! - Tabu search keeps an `n x k` table of neighbour colour counts, so a move costs O(degree).
//! - The scheduler locks population slots with CAS flags; workers never block on each other.
//! - For maximum performance, compile with:
//!   `RUSTFLAGS="-C target-cpu=native" cargo build --release`

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::many_single_char_names)] // Graph notation
#![allow(clippy::needless_range_loop)] // Often clearer for slot indexing
#![allow(clippy::doc_markdown)]
#![allow(clippy::multiple_crate_versions)] // Cargo.lock management is external

pub mod colouring;
pub mod crossover;
pub mod exact;
pub mod graph;
pub mod hca;
pub mod heap;
pub mod iset;
pub mod rng;
pub mod saturation;
pub mod scheduler;
pub mod strategy;
pub mod subgraph;
pub mod tabu;
pub mod validate;
pub mod xrlf;

/// Re-export commonly used types for convenience.
pub mod prelude {
    pub use crate::colouring::{is_solution, Colour, ColourCount, Colouring, UNCOLOURED};
    pub use crate::graph::{Graph, GraphError, NodeId};
    pub use crate::hca::{hybrid_colouring_algorithm, hybrid_strategy, HcaConfig};
    pub use crate::scheduler::{perform, ColouringResult, ScheduleConfig, ScheduleError};
    pub use crate::strategy::{ColouringStrategy, StrategyKind};
    pub use crate::tabu::TabuParams;
    pub use crate::validate::{validate_bundled_graphs, validate_colouring, ColouringViolation};
    pub use crate::xrlf::{init_by_xrlf, init_by_xrlf_best_of, XrlfMode, XrlfParams};
}
