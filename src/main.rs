use graph_colouring::colouring::{colour_count, number_of_conflicting_edges, Colouring, UNCOLOURED};
use graph_colouring::exact::find_optimal_colouring;
use graph_colouring::graph::{to_graphviz_coloured, Graph};
use graph_colouring::hca::{hybrid_colouring_algorithm, HcaConfig};
use graph_colouring::rng::fresh_seed;
use graph_colouring::subgraph::Subgraph;
use graph_colouring::xrlf::{init_by_xrlf_best_of, XrlfParams};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Algorithm {
    Xrlf,
    Hca,
    Exact,
}

fn main() {
    let mut hca = HcaConfig::default();
    let mut xrlf = XrlfParams::default();
    let mut algorithm = Algorithm::Hca;
    let mut k: Option<u32> = None;
    let mut restarts = 1usize;
    let mut graphviz = false;
    let mut validate_only = false;
    let mut path: Option<String> = None;

    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;
    while i < args.len() {
        let value = || args.get(i + 1).unwrap_or_else(|| usage_and_exit(2));
        match args[i].as_str() {
            "--test" | "--validate" => {
                validate_only = true;
                i += 1;
                continue;
            }
            "--graphviz" => {
                graphviz = true;
                i += 1;
                continue;
            }
            "--algorithm" => {
                algorithm = match value().as_str() {
                    "xrlf" => Algorithm::Xrlf,
                    "hca" => Algorithm::Hca,
                    "exact" => Algorithm::Exact,
                    _ => usage_and_exit(2),
                };
            }
            "--k" => k = Some(parse(value())),
            "--population" => hca.population_size = parse(value()),
            "--iterations" => hca.max_iterations = parse(value()),
            "--threads" | "--workers" => hca.thread_count = parse(value()),
            "--tabu-iterations" => hca.tabu.iterations = parse(value()),
            "--tabu-a" => hca.tabu.a = parse(value()),
            "--tabu-alpha" => hca.tabu.alpha = parse(value()),
            "--exact-limit" => xrlf.exact_limit = parse(value()),
            "--trials" => xrlf.trials = parse(value()),
            "--set-limit" => xrlf.set_limit = parse(value()),
            "--candidates" => xrlf.candidates = parse(value()),
            "--restarts" => restarts = parse(value()),
            "--seed" => hca.seed = Some(parse(value())),
            "--help" | "-h" => usage_and_exit(0),
            arg if !arg.starts_with('-') && path.is_none() => {
                path = Some(arg.to_string());
                i += 1;
                continue;
            }
            _ => usage_and_exit(2),
        }
        i += 2;
    }

    if validate_only {
        match graph_colouring::validate::validate_bundled_graphs() {
            Ok(()) => {
                println!("Validation OK: bundled graphs colour correctly.");
                return;
            }
            Err(e) => {
                eprintln!("Validation FAILED: {e}");
                std::process::exit(1);
            }
        }
    }

    let Some(path) = path else { usage_and_exit(2) };
    let graph = match Graph::read_metis_file(&path) {
        Ok(graph) => graph,
        Err(e) => {
            eprintln!("{path}: {e}");
            std::process::exit(1);
        }
    };
    println!("Graph {path}: {} nodes, {} edges", graph.number_of_nodes(), graph.number_of_edges());

    let colouring: Colouring = match algorithm {
        Algorithm::Xrlf => {
            let seed = hca.seed.unwrap_or_else(fresh_seed);
            init_by_xrlf_best_of(&graph, &xrlf, restarts, seed)
        }
        Algorithm::Exact => {
            let mut s = vec![UNCOLOURED; graph.number_of_nodes()];
            find_optimal_colouring(&Subgraph::new(&graph), &mut s, 0);
            s
        }
        Algorithm::Hca => {
            let k = k.unwrap_or_else(|| graph.max_degree() as u32 + 1);
            match hybrid_colouring_algorithm(&graph, k, &hca) {
                Ok(result) => result.best_solution.unwrap_or(result.colouring),
                Err(e) => {
                    eprintln!("Invalid configuration: {e}");
                    std::process::exit(2);
                }
            }
        }
    };

    println!(
        "Colours: {}  conflicting edges: {}",
        colour_count(&colouring),
        number_of_conflicting_edges(&graph, &colouring)
    );
    if graphviz {
        print!("{}", to_graphviz_coloured(&graph, &colouring, &path));
    } else {
        let line: Vec<String> = colouring.iter().map(ToString::to_string).collect();
        println!("{}", line.join(" "));
    }
}

fn parse<T: std::str::FromStr>(v: &str) -> T {
    v.parse().unwrap_or_else(|_| usage_and_exit(2))
}

fn usage_and_exit(code: i32) -> ! {
    eprintln!(
        "Usage:\n  graph-colouring <FILE> [--algorithm xrlf|hca|exact] [--k K] [--seed SEED] [options]\n  graph-colouring --validate\n\nOptions:\n  --algorithm A            xrlf, hca or exact (default: hca)\n  --k K                    Initial colour count for hca (default: max degree + 1)\n  --population N           Population size (default: 10)\n  --iterations N           Generations per lineage (default: 100)\n  --threads/--workers N    Worker threads (default: auto-detect)\n  --tabu-iterations L      Tabu rounds per local search (default: 5)\n  --tabu-a A               Random tenure bound (default: 2)\n  --tabu-alpha X           Conflict weight of the tenure (default: 0.6)\n  --exact-limit N          XRLF exact colouring threshold (default: 50)\n  --trials N               XRLF trials per colour class (default: 128)\n  --set-limit N            XRLF exhaustive search threshold (default: 30)\n  --candidates N           XRLF candidates per greedy step (default: 50)\n  --restarts N             Parallel XRLF restarts (default: 1)\n  --seed SEED              Deterministic base seed (optional)\n  --graphviz               Print the coloured graph in GraphViz format\n  --test/--validate        Validate bundled graphs (fast, deterministic)\n"
    );
    std::process::exit(code)
}
