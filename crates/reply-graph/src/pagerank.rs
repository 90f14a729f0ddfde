//! Weighted PageRank over one game's reply graph.
//!
//! Standard damped random walk where edge weight acts as transition
//! propensity: a walker at user u follows edge (u -> v) with
//! probability proportional to the accumulated reply weight. Mass on
//! dangling nodes (users who never replied to anyone) is
//! redistributed uniformly. Scores form a probability distribution:
//! non-negative and summing to 1 over the graph's nodes.

use board_data::UserId;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// PageRank configuration
#[derive(Debug, Clone)]
pub struct PageRankConfig {
    /// Damping factor (typically 0.85)
    pub damping: f64,

    /// Maximum iterations
    pub max_iterations: usize,

    /// L1 convergence tolerance per node
    pub tolerance: f64,
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self {
            damping: 0.85,
            max_iterations: 100,
            tolerance: 1e-6,
        }
    }
}

/// Compute PageRank scores for every user appearing in the edge set.
///
/// An empty edge set yields an empty map; that is a valid terminal
/// state ("no experts found"), not an error.
pub fn pagerank(
    edges: &HashMap<(UserId, UserId), f64>,
    config: &PageRankConfig,
) -> HashMap<UserId, f64> {
    if edges.is_empty() {
        return HashMap::new();
    }

    // BTreeSet keeps node order deterministic run-over-run.
    let nodes: BTreeSet<&UserId> = edges
        .keys()
        .flat_map(|(replier, author)| [replier, author])
        .collect();
    let nodes: Vec<&UserId> = nodes.into_iter().collect();
    let n = nodes.len();
    let positions: HashMap<&UserId, usize> = nodes
        .iter()
        .enumerate()
        .map(|(pos, &node)| (node, pos))
        .collect();

    // Out-weight totals and inbound adjacency per node.
    let mut out_weight = vec![0.0f64; n];
    let mut inbound: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
    for ((replier, author), &weight) in edges {
        let from = positions[replier];
        let to = positions[author];
        out_weight[from] += weight;
        inbound[to].push((from, weight));
    }

    let damping = config.damping;
    let teleport = (1.0 - damping) / n as f64;
    let mut scores = vec![1.0 / n as f64; n];

    for iteration in 0..config.max_iterations {
        let dangling_mass: f64 = (0..n)
            .filter(|&i| out_weight[i] == 0.0)
            .map(|i| scores[i])
            .sum();

        let mut next = vec![0.0f64; n];
        for to in 0..n {
            let inbound_sum: f64 = inbound[to]
                .iter()
                .map(|&(from, weight)| scores[from] * weight / out_weight[from])
                .sum();
            next[to] = teleport + damping * (inbound_sum + dangling_mass / n as f64);
        }

        let err: f64 = next
            .iter()
            .zip(scores.iter())
            .map(|(a, b)| (a - b).abs())
            .sum();
        scores = next;
        if err < n as f64 * config.tolerance {
            debug!(iteration, err, "PageRank converged");
            break;
        }
    }

    nodes
        .into_iter()
        .zip(scores)
        .map(|(node, score)| (node.clone(), score))
        .collect()
}

/// Basic shape report of one game's reply graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphStats {
    pub nodes: usize,
    pub edges: usize,
    pub average_degree: f64,
}

/// Node/edge counts and mean total degree of the edge set.
pub fn graph_stats(edges: &HashMap<(UserId, UserId), f64>) -> GraphStats {
    let nodes: BTreeSet<&UserId> = edges
        .keys()
        .flat_map(|(replier, author)| [replier, author])
        .collect();
    let node_count = nodes.len();
    let average_degree = if node_count == 0 {
        0.0
    } else {
        2.0 * edges.len() as f64 / node_count as f64
    };
    GraphStats {
        nodes: node_count,
        edges: edges.len(),
        average_degree,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge_map(edges: &[(&str, &str, f64)]) -> HashMap<(UserId, UserId), f64> {
        edges
            .iter()
            .map(|&(from, to, w)| ((from.to_string(), to.to_string()), w))
            .collect()
    }

    #[test]
    fn test_empty_graph_is_empty_result() {
        let scores = pagerank(&HashMap::new(), &PageRankConfig::default());
        assert!(scores.is_empty());
    }

    #[test]
    fn test_scores_sum_to_one() {
        let edges = edge_map(&[
            ("bob", "alice", 0.5),
            ("carol", "alice", 0.3),
            ("alice", "bob", 0.1),
            ("dave", "carol", 0.2),
        ]);
        let scores = pagerank(&edges, &PageRankConfig::default());

        assert_eq!(scores.len(), 4);
        let total: f64 = scores.values().sum();
        assert!((total - 1.0).abs() < 1e-9);
        for &score in scores.values() {
            assert!(score > 0.0);
        }
    }

    #[test]
    fn test_all_inbound_weight_wins() {
        // alice receives every inbound edge and should outrank both
        // repliers.
        let edges = edge_map(&[("bob", "alice", 0.2), ("carol", "alice", 0.2)]);
        let scores = pagerank(&edges, &PageRankConfig::default());

        assert!(scores["alice"] > scores["bob"]);
        assert!(scores["alice"] > scores["carol"]);
    }

    #[test]
    fn test_heavier_edge_transfers_more_mass() {
        // dave splits its mass between alice and bob 9:1.
        let edges = edge_map(&[("dave", "alice", 9.0), ("dave", "bob", 1.0)]);
        let scores = pagerank(&edges, &PageRankConfig::default());

        assert!(scores["alice"] > scores["bob"]);
    }

    #[test]
    fn test_graph_stats() {
        let edges = edge_map(&[("bob", "alice", 0.5), ("carol", "alice", 0.5)]);
        let stats = graph_stats(&edges);

        assert_eq!(stats.nodes, 3);
        assert_eq!(stats.edges, 2);
        assert!((stats.average_degree - 4.0 / 3.0).abs() < 1e-12);
    }
}
