//! Co-occurrence graph and weighted PageRank over content tokens.

use std::collections::HashMap;

use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;

use super::tokenizer::{Token, TokenKind};

const DAMPING: f64 = 0.85;
const MAX_ITERATIONS: usize = 50;
const TOLERANCE: f64 = 1e-6;

/// Undirected co-occurrence graph keyed by normalized token.
pub struct CooccurrenceGraph {
    graph: UnGraph<String, f64>,
    node_index: HashMap<String, NodeIndex>,
}

impl CooccurrenceGraph {
    /// Link every pair of content tokens at most `window - 1` positions apart.
    ///
    /// Stopwords and punctuation are skipped before windowing, so "Rust and
    /// WebAssembly" links `rust` to `webassembly` directly. Build time is
    /// linear in the token count for a fixed window.
    pub fn build(tokens: &[Token], window: usize) -> Self {
        let mut graph = UnGraph::<String, f64>::new_undirected();
        let mut node_index: HashMap<String, NodeIndex> = HashMap::new();
        // Keyed with the lower node index first.
        let mut edge_index: HashMap<(NodeIndex, NodeIndex), EdgeIndex> = HashMap::new();

        let content: Vec<NodeIndex> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Content)
            .map(|t| {
                *node_index
                    .entry(t.norm.clone())
                    .or_insert_with(|| graph.add_node(t.norm.clone()))
            })
            .collect();

        for (i, &a) in content.iter().enumerate() {
            for &b in content.iter().skip(i + 1).take(window.saturating_sub(1)) {
                if a == b {
                    continue;
                }
                let key = if a < b { (a, b) } else { (b, a) };
                match edge_index.get(&key) {
                    Some(&e) => graph[e] += 1.0,
                    None => {
                        let e = graph.add_edge(key.0, key.1, 1.0);
                        edge_index.insert(key, e);
                    }
                }
            }
        }

        Self { graph, node_index }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Weighted PageRank. Iterates in node-index order so results are reproducible.
    pub fn rank(&self) -> HashMap<String, f64> {
        let n = self.graph.node_count();
        if n == 0 {
            return HashMap::new();
        }

        let out_weight: Vec<f64> = self
            .graph
            .node_indices()
            .map(|v| self.graph.edges(v).map(|e| *e.weight()).sum())
            .collect();

        let mut scores = vec![1.0f64; n];
        for _ in 0..MAX_ITERATIONS {
            let mut next = vec![0.0f64; n];
            let mut delta = 0.0f64;
            for v in self.graph.node_indices() {
                let mut acc = 0.0;
                for edge in self.graph.edges(v) {
                    let u = if edge.source() == v { edge.target() } else { edge.source() };
                    let w_u = out_weight[u.index()];
                    if w_u > 0.0 {
                        acc += edge.weight() / w_u * scores[u.index()];
                    }
                }
                let s = (1.0 - DAMPING) + DAMPING * acc;
                delta += (s - scores[v.index()]).abs();
                next[v.index()] = s;
            }
            scores = next;
            if delta < TOLERANCE {
                break;
            }
        }

        self.node_index
            .iter()
            .map(|(token, idx)| (token.clone(), scores[idx.index()]))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexical::tokenizer::tokenize;

    #[test]
    fn test_empty_graph() {
        let g = CooccurrenceGraph::build(&[], 3);
        assert_eq!(g.node_count(), 0);
        assert!(g.rank().is_empty());
    }

    #[test]
    fn test_hub_token_ranks_highest() {
        let tokens = tokenize("Rust async. Rust macros. Rust traits. Rust tooling.");
        let g = CooccurrenceGraph::build(&tokens, 2);
        let ranks = g.rank();
        let rust = ranks["rust"];
        for (token, score) in &ranks {
            if token != "rust" {
                assert!(rust > *score, "{} outranked rust", token);
            }
        }
    }

    #[test]
    fn test_repeated_pairs_accumulate_weight() {
        let tokens = tokenize("Rust async. Async Rust. rust ASYNC");
        let g = CooccurrenceGraph::build(&tokens, 2);
        assert_eq!(g.graph.edge_count(), 1);
        let e = g.graph.edge_indices().next().unwrap();
        assert_eq!(g.graph[e], 3.0);
    }

    #[test]
    fn test_hub_heavy_text_builds_in_linear_time() {
        let text: String = (0..40_000).map(|i| format!("rust word{} ", i)).collect();
        let tokens = tokenize(&text);
        let started = std::time::Instant::now();
        let g = CooccurrenceGraph::build(&tokens, 3);
        let elapsed = started.elapsed();

        assert_eq!(g.node_count(), 40_001);
        // One edge per distinct neighbour, however often the pair recurs.
        let hub = g.node_index["rust"];
        assert_eq!(g.graph.edges(hub).count(), 40_000);
        assert!(elapsed < std::time::Duration::from_secs(5), "build took {:?}", elapsed);
    }

    #[test]
    fn test_repeated_token_is_one_node() {
        let tokens = tokenize("GraphQL GraphQL graphql");
        let g = CooccurrenceGraph::build(&tokens, 3);
        assert_eq!(g.node_count(), 1);
        assert!((g.rank()["graphql"] - (1.0 - DAMPING)).abs() < 1e-9);
    }
}
