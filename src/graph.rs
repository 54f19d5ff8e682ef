//! Immutable undirected graphs in compressed sparse row form, plus METIS-style parsing and
//! GraphViz output.
//!
//! Node ids are dense (`0..n`). Adjacency is symmetric and free of self-loops; both properties
//! are checked once at construction so the colouring code never has to.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::ops::Range;
use std::path::Path;
use thiserror::Error;

/// Dense node identifier.
pub type NodeId = usize;

/// Largest node count whose ids (and colours) fit the 32-bit colour representation.
pub const MAX_NODES: usize = i32::MAX as usize;

// ============================================================================
// Graph
// ============================================================================

/// Undirected simple graph in CSR layout.
///
/// - `offsets[v]..offsets[v + 1]` indexes the neighbours of `v` in `targets`.
/// - Every edge `{u, v}` appears twice: once in each endpoint's list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Graph {
    offsets: Vec<usize>,
    targets: Vec<NodeId>,
}

impl Graph {
    /// Builds a graph from per-node neighbour lists.
    ///
    /// Lists are sorted and deduplicated. Rejects out-of-range ids, self-loops and asymmetric
    /// adjacency.
    pub fn from_adjacency_lists(mut lists: Vec<Vec<NodeId>>) -> Result<Self, GraphError> {
        let n = lists.len();
        if n > MAX_NODES {
            return Err(GraphError::TooLarge { nodes: n, directed_edges: 0 });
        }
        for (v, list) in lists.iter_mut().enumerate() {
            list.sort_unstable();
            list.dedup();
            if let Some(&u) = list.iter().find(|&&u| u >= n) {
                return Err(GraphError::NeighbourOutOfRange { node: v, neighbour: u, nodes: n });
            }
            if list.binary_search(&v).is_ok() {
                return Err(GraphError::SelfLoop { node: v });
            }
        }
        for (v, list) in lists.iter().enumerate() {
            for &u in list {
                if lists[u].binary_search(&v).is_err() {
                    return Err(GraphError::Asymmetric { from: v, to: u });
                }
            }
        }

        let mut offsets = Vec::with_capacity(n + 1);
        let mut targets = Vec::with_capacity(lists.iter().map(Vec::len).sum());
        offsets.push(0);
        for list in lists {
            targets.extend(list);
            offsets.push(targets.len());
        }
        Ok(Self { offsets, targets })
    }

    /// Builds a graph on `n` nodes from an undirected edge list. Duplicate edges are merged.
    pub fn from_edges(n: usize, edges: &[(NodeId, NodeId)]) -> Result<Self, GraphError> {
        let mut lists = vec![Vec::new(); n];
        for &(u, v) in edges {
            for (a, b) in [(u, v), (v, u)] {
                if a >= n {
                    return Err(GraphError::NeighbourOutOfRange { node: b, neighbour: a, nodes: n });
                }
                lists[a].push(b);
            }
        }
        Self::from_adjacency_lists(lists)
    }

    /// Number of nodes.
    #[inline]
    pub fn number_of_nodes(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Number of undirected edges.
    #[inline]
    pub fn number_of_edges(&self) -> usize {
        self.targets.len() / 2
    }

    /// Node id range `0..n`.
    #[inline]
    pub fn nodes(&self) -> Range<NodeId> {
        0..self.number_of_nodes()
    }

    /// Sorted neighbours of `v`.
    #[inline]
    pub fn neighbours(&self, v: NodeId) -> &[NodeId] {
        &self.targets[self.offsets[v]..self.offsets[v + 1]]
    }

    /// Degree of `v`.
    #[inline]
    pub fn degree(&self, v: NodeId) -> usize {
        self.offsets[v + 1] - self.offsets[v]
    }

    /// Largest degree in the graph (0 for the empty graph).
    pub fn max_degree(&self) -> usize {
        self.nodes().map(|v| self.degree(v)).max().unwrap_or(0)
    }

    /// Iterates every edge once as `(u, v)` with `u < v`, in ascending order of `u`.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.nodes()
            .flat_map(move |u| {
                self.neighbours(u).iter().filter(move |&&v| u < v).map(move |&v| (u, v))
            })
    }

    /// Parses a graph in METIS text format.
    ///
    /// Lines starting with `%` are comments. The header is `<nodes> <edges> [format]` where the
    /// format digits select node weights (tens) and edge weights (ones). Each following
    /// non-comment line lists the 1-based neighbours of one node; weights are read and discarded.
    pub fn from_metis_str(text: &str) -> Result<Self, GraphError> {
        let mut lines = text.lines().enumerate().filter(|(_, l)| !l.trim_start().starts_with('%'));

        let (header_line, header) = lines.next().ok_or(GraphError::MissingHeader)?;
        let fields: Vec<&str> = header.split_whitespace().collect();
        if fields.len() < 2 || fields.len() > 3 {
            return Err(GraphError::MalformedHeader { line: header_line + 1 });
        }
        let parse_header = |s: &str| {
            s.parse::<u64>().map_err(|_| GraphError::MalformedHeader { line: header_line + 1 })
        };
        let nodes = parse_header(fields[0])?;
        let edges = parse_header(fields[1])?;
        let format = match fields.get(2) {
            Some(f) => parse_header(f)?,
            None => 0,
        };
        let (node_weights, edge_weights) = match format {
            0 => (false, false),
            1 => (false, true),
            10 => (true, false),
            11 => (true, true),
            other => return Err(GraphError::UnsupportedFormat { format: other }),
        };
        if nodes > MAX_NODES as u64 || edges.saturating_mul(2) > MAX_NODES as u64 {
            return Err(GraphError::TooLarge {
                nodes: usize::try_from(nodes).unwrap_or(usize::MAX),
                directed_edges: usize::try_from(edges.saturating_mul(2)).unwrap_or(usize::MAX),
            });
        }
        let nodes = nodes as usize;
        let expected_directed = 2 * edges as usize;

        let mut lists: Vec<Vec<NodeId>> = Vec::with_capacity(nodes);
        let mut directed = 0usize;
        for (line_idx, line) in lines {
            let line_no = line_idx + 1;
            let node = lists.len();
            if node >= nodes {
                if line.trim().is_empty() {
                    continue;
                }
                return Err(GraphError::NodeCountMismatch { expected: nodes, got: node + 1 });
            }
            let mut tokens = line.split_whitespace().map(|t| {
                t.parse::<u64>()
                    .map_err(|_| GraphError::InvalidToken { line: line_no, token: t.to_string() })
            });
            if node_weights {
                tokens.next().transpose()?;
            }
            let mut neighbours = Vec::new();
            while let Some(token) = tokens.next() {
                let target = token?;
                if target == 0 || target > nodes as u64 {
                    return Err(GraphError::NeighbourOutOfRange {
                        node,
                        neighbour: usize::try_from(target).unwrap_or(usize::MAX),
                        nodes,
                    });
                }
                let target = (target - 1) as usize;
                if target == node {
                    return Err(GraphError::SelfLoop { node });
                }
                if edge_weights {
                    tokens.next().transpose()?;
                }
                neighbours.push(target);
                directed += 1;
            }
            lists.push(neighbours);
        }

        if lists.len() != nodes {
            return Err(GraphError::NodeCountMismatch { expected: nodes, got: lists.len() });
        }
        if directed != expected_directed {
            return Err(GraphError::EdgeCountMismatch {
                expected: expected_directed,
                got: directed,
            });
        }
        Self::from_adjacency_lists(lists)
    }

    /// Reads a METIS graph file from disk.
    pub fn read_metis_file(path: impl AsRef<Path>) -> Result<Self, GraphError> {
        let file = File::open(path).map_err(|e| GraphError::Io(e.to_string()))?;
        let reader = BufReader::new(file);
        let mut text = String::new();
        for line in reader.lines() {
            let line = line.map_err(|e| GraphError::Io(e.to_string()))?;
            text.push_str(&line);
            text.push('\n');
        }
        Self::from_metis_str(&text)
    }
}

// ============================================================================
// GraphViz output
// ============================================================================

/// Renders the graph in GraphViz `dot` syntax, each edge once from its lower endpoint.
pub fn to_graphviz(graph: &Graph, label: &str) -> String {
    let mut out = format!("graph {label} {{\n");
    push_edges(&mut out, graph);
    out.push_str("}\n");
    out
}

/// Like [`to_graphviz`], with every coloured node annotated by its colour.
pub fn to_graphviz_coloured(graph: &Graph, colouring: &[u32], label: &str) -> String {
    let mut out = format!("graph {label} {{\n");
    for (v, &c) in colouring.iter().enumerate() {
        if c != crate::colouring::UNCOLOURED {
            let fill = c % 12 + 1;
            out.push_str(&format!(
                "    {v} [label=\"{v}:{c}\", colorscheme=set312, style=filled, fillcolor={fill}];\n"
            ));
        }
    }
    push_edges(&mut out, graph);
    out.push_str("}\n");
    out
}

fn push_edges(out: &mut String, graph: &Graph) {
    for (u, v) in graph.edges() {
        out.push_str(&format!("    {u} -- {v};\n"));
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Errors encountered while building or parsing a graph.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GraphError {
    /// The input contained no header line.
    #[error("missing header line")]
    MissingHeader,
    /// The header could not be parsed as `<nodes> <edges> [format]`.
    #[error("malformed header on line {line}")]
    MalformedHeader {
        /// 1-based line number.
        line: usize,
    },
    /// The header requested a weight format other than `0`, `1`, `10` or `11`.
    #[error("unsupported format {format}")]
    UnsupportedFormat {
        /// The format value found in the header.
        format: u64,
    },
    /// The graph does not fit into 32-bit node ids.
    #[error("graph too large: {nodes} nodes, {directed_edges} directed edges")]
    TooLarge {
        /// Requested node count.
        nodes: usize,
        /// Requested directed edge count.
        directed_edges: usize,
    },
    /// A token was not a non-negative integer.
    #[error("invalid token {token:?} on line {line}")]
    InvalidToken {
        /// 1-based line number.
        line: usize,
        /// The offending token.
        token: String,
    },
    /// A node lists itself as a neighbour.
    #[error("self-loop at node {node}")]
    SelfLoop {
        /// The node.
        node: NodeId,
    },
    /// A neighbour id lies outside `0..nodes` (1-based ids are reported as read).
    #[error("node {node} has neighbour {neighbour} outside a graph of {nodes} nodes")]
    NeighbourOutOfRange {
        /// The node whose list is invalid.
        node: NodeId,
        /// The offending neighbour.
        neighbour: usize,
        /// Number of nodes in the graph.
        nodes: usize,
    },
    /// `to` is listed as a neighbour of `from` but not the other way around.
    #[error("edge {from} -> {to} has no reverse edge")]
    Asymmetric {
        /// Source of the one-sided edge.
        from: NodeId,
        /// Target of the one-sided edge.
        to: NodeId,
    },
    /// Number of adjacency lines differs from the header.
    #[error("expected {expected} nodes, found {got}")]
    NodeCountMismatch {
        /// Count from the header.
        expected: usize,
        /// Count found.
        got: usize,
    },
    /// Number of directed adjacency entries differs from twice the header edge count.
    #[error("expected {expected} directed edges, found {got}")]
    EdgeCountMismatch {
        /// Twice the header edge count.
        expected: usize,
        /// Entries found.
        got: usize,
    },
    /// Reading the file failed.
    #[error("i/o error: {0}")]
    Io(String),
}

// ============================================================================
// Bundled graphs
// ============================================================================

/// Six-node graph used throughout the tests: a 6-cycle `0..5` with the chord `1 -- 5`.
pub const SIMPLE_GRAPH: &str = include_str!("../graphs/simple.graph");

/// The Mycielski graph on 11 nodes (Groetzsch graph): triangle free, chromatic number 4.
pub const MYCIEL3_GRAPH: &str = include_str!("../graphs/myciel3.graph");

/// Eight-node graph with 12 edges used by the independent-set tests.
pub const EIGHT_GRAPH: &str = include_str!("../graphs/eight.graph");

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn simple() -> Graph {
        Graph::from_metis_str(SIMPLE_GRAPH).unwrap()
    }

    #[test]
    fn parses_simple_graph() {
        let g = simple();
        assert_eq!(g.number_of_nodes(), 6);
        assert_eq!(g.number_of_edges(), 7);
        assert_eq!(g.neighbours(1), &[0, 2, 5]);
        assert_eq!(g.neighbours(5), &[0, 1, 4]);
        assert_eq!(g.degree(0), 2);
        assert_eq!(g.max_degree(), 3);
    }

    #[test]
    fn parses_bundled_graphs() {
        let m = Graph::from_metis_str(MYCIEL3_GRAPH).unwrap();
        assert_eq!((m.number_of_nodes(), m.number_of_edges()), (11, 20));
        let e = Graph::from_metis_str(EIGHT_GRAPH).unwrap();
        assert_eq!((e.number_of_nodes(), e.number_of_edges()), (8, 12));
    }

    #[test]
    fn from_edges_matches_parsed_graph() {
        let edges = [(0, 1), (0, 5), (1, 2), (1, 5), (2, 3), (3, 4), (4, 5), (5, 4)];
        let g = Graph::from_edges(6, &edges).unwrap();
        assert_eq!(g, simple());
    }

    #[test]
    fn graphviz_lists_each_edge_once() {
        let expected = "graph G {\n    0 -- 1;\n    0 -- 5;\n    1 -- 2;\n    1 -- 5;\n    \
                        2 -- 3;\n    3 -- 4;\n    4 -- 5;\n}\n";
        assert_eq!(to_graphviz(&simple(), "G"), expected);
    }

    #[test]
    fn coloured_graphviz_skips_uncoloured_nodes() {
        let s = vec![0, 1, crate::colouring::UNCOLOURED, 1, 0, 2];
        let out = to_graphviz_coloured(&simple(), &s, "C");
        assert!(out.contains(
            "    5 [label=\"5:2\", colorscheme=set312, style=filled, fillcolor=3];\n    0 -- 1;\n"
        ));
        assert!(!out.contains("2 [label"));
        assert!(out.ends_with("    4 -- 5;\n}\n"));
    }

    #[test]
    fn weighted_formats_skip_weights() {
        let text = "3 2 11\n7 2 5\n1 1 5 3 9\n4 2 9\n";
        let g = Graph::from_metis_str(text).unwrap();
        assert_eq!(g.neighbours(1), &[0, 2]);
        let text = "3 2 1\n2 5\n1 5 3 9\n2 9\n";
        assert_eq!(Graph::from_metis_str(text).unwrap(), g);
    }

    #[test]
    fn blank_line_is_isolated_node() {
        let g = Graph::from_metis_str("3 1\n2\n1\n\n").unwrap();
        assert_eq!(g.number_of_nodes(), 3);
        assert_eq!(g.degree(2), 0);
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(Graph::from_metis_str("% only comments\n"), Err(GraphError::MissingHeader));
        assert_eq!(Graph::from_metis_str("3\n"), Err(GraphError::MalformedHeader { line: 1 }));
        assert_eq!(
            Graph::from_metis_str("2 1 100\n2\n1\n"),
            Err(GraphError::UnsupportedFormat { format: 100 })
        );
        assert_eq!(Graph::from_metis_str("2 1\n1\n2\n"), Err(GraphError::SelfLoop { node: 0 }));
        assert_eq!(
            Graph::from_metis_str("2 1\n2\n1 x\n"),
            Err(GraphError::InvalidToken { line: 3, token: "x".to_string() })
        );
        assert_eq!(
            Graph::from_metis_str("2 1\n3\n1\n"),
            Err(GraphError::NeighbourOutOfRange { node: 0, neighbour: 3, nodes: 2 })
        );
        assert_eq!(
            Graph::from_metis_str("2 2\n2\n1\n"),
            Err(GraphError::EdgeCountMismatch { expected: 4, got: 2 })
        );
        assert_eq!(
            Graph::from_metis_str("3 1\n2\n1\n"),
            Err(GraphError::NodeCountMismatch { expected: 3, got: 2 })
        );
        assert_eq!(
            Graph::from_metis_str("3 1\n2\n\n\n"),
            Err(GraphError::EdgeCountMismatch { expected: 2, got: 1 })
        );
        assert_eq!(
            Graph::from_metis_str("3 2\n2\n3\n2 1\n"),
            Err(GraphError::Asymmetric { from: 0, to: 1 })
        );
        assert!(matches!(
            Graph::from_metis_str("3000000000 1\n"),
            Err(GraphError::TooLarge { .. })
        ));
    }

    #[test]
    fn read_missing_file_is_io_error() {
        let missing = Graph::read_metis_file("/nonexistent/graph.metis");
        assert!(matches!(missing, Err(GraphError::Io(_))));
    }
}
