//! Centrality metrics (spec §4.5): degree straight from the edge table,
//! PageRank to a fixed tolerance, and unnormalized-shortest-path
//! betweenness.

use super::SymbolGraph;
use crate::model::GraphMetrics;
use crate::types::SymbolId;
use petgraph::graph::NodeIndex;
use petgraph::Direction;
use std::collections::{HashMap, VecDeque};

const PAGERANK_DAMPING: f64 = 0.85;
const PAGERANK_TOLERANCE: f64 = 1e-6;
const PAGERANK_MAX_ITERS: usize = 1000;

/// Computes in/out-degree, PageRank, and betweenness for every symbol in
/// `graph`. Returned in node-index order, which is symbol-id order since
/// [`SymbolGraph::build`] adds nodes sorted by id.
pub fn compute_metrics(graph: &SymbolGraph) -> Vec<GraphMetrics> {
    let pagerank = compute_pagerank(graph);
    let betweenness = compute_betweenness(graph);

    graph
        .graph
        .node_indices()
        .map(|idx| {
            let symbol_id = graph.symbol_at(idx);
            GraphMetrics {
                symbol_id,
                in_degree: graph.graph.edges_directed(idx, Direction::Incoming).count() as u32,
                out_degree: graph.graph.edges_directed(idx, Direction::Outgoing).count() as u32,
                betweenness: betweenness.get(&idx).copied().unwrap_or(0.0),
                pagerank: pagerank.get(&idx).copied().unwrap_or(0.0),
            }
        })
        .collect()
}

/// Standard power-iteration PageRank with uniform teleportation, damping
/// 0.85, run to a 1e-6 L1-convergence tolerance (spec defers to standard
/// defaults).
fn compute_pagerank(graph: &SymbolGraph) -> HashMap<NodeIndex, f64> {
    let n = graph.graph.node_count();
    if n == 0 {
        return HashMap::new();
    }
    let nodes: Vec<NodeIndex> = graph.graph.node_indices().collect();
    let base = 1.0 / n as f64;

    let mut rank: HashMap<NodeIndex, f64> = nodes.iter().map(|&idx| (idx, base)).collect();
    let out_degree: HashMap<NodeIndex, usize> = nodes
        .iter()
        .map(|&idx| (idx, graph.graph.edges_directed(idx, Direction::Outgoing).count()))
        .collect();

    for _ in 0..PAGERANK_MAX_ITERS {
        let dangling_mass: f64 = nodes
            .iter()
            .filter(|&&idx| out_degree[&idx] == 0)
            .map(|idx| rank[idx])
            .sum();

        let mut next: HashMap<NodeIndex, f64> = nodes
            .iter()
            .map(|&idx| (idx, (1.0 - PAGERANK_DAMPING) * base + PAGERANK_DAMPING * dangling_mass * base))
            .collect();

        for &idx in &nodes {
            let degree = out_degree[&idx];
            if degree == 0 {
                continue;
            }
            let share = PAGERANK_DAMPING * rank[&idx] / degree as f64;
            for edge in graph.graph.edges_directed(idx, Direction::Outgoing) {
                *next.get_mut(&edge.target()).unwrap() += share;
            }
        }

        let delta: f64 = nodes.iter().map(|idx| (next[idx] - rank[idx]).abs()).sum();
        rank = next;
        if delta < PAGERANK_TOLERANCE {
            break;
        }
    }

    rank
}

/// Brandes' algorithm for unnormalized betweenness centrality on the
/// directed graph (each unordered source counted once, per spec's
/// "unnormalized shortest-path count").
fn compute_betweenness(graph: &SymbolGraph) -> HashMap<NodeIndex, f64> {
    let nodes: Vec<NodeIndex> = graph.graph.node_indices().collect();
    let mut betweenness: HashMap<NodeIndex, f64> = nodes.iter().map(|&idx| (idx, 0.0)).collect();

    for &s in &nodes {
        let mut stack = Vec::new();
        let mut predecessors: HashMap<NodeIndex, Vec<NodeIndex>> = HashMap::new();
        let mut sigma: HashMap<NodeIndex, f64> = nodes.iter().map(|&idx| (idx, 0.0)).collect();
        let mut dist: HashMap<NodeIndex, i64> = nodes.iter().map(|&idx| (idx, -1)).collect();

        sigma.insert(s, 1.0);
        dist.insert(s, 0);

        let mut queue = VecDeque::new();
        queue.push_back(s);

        while let Some(v) = queue.pop_front() {
            stack.push(v);
            for edge in graph.graph.edges_directed(v, Direction::Outgoing) {
                let w = edge.target();
                if dist[&w] < 0 {
                    dist.insert(w, dist[&v] + 1);
                    queue.push_back(w);
                }
                if dist[&w] == dist[&v] + 1 {
                    *sigma.get_mut(&w).unwrap() += sigma[&v];
                    predecessors.entry(w).or_default().push(v);
                }
            }
        }

        let mut delta: HashMap<NodeIndex, f64> = nodes.iter().map(|&idx| (idx, 0.0)).collect();
        while let Some(w) = stack.pop() {
            if let Some(preds) = predecessors.get(&w) {
                for &v in preds {
                    let contrib = (sigma[&v] / sigma[&w]) * (1.0 + delta[&w]);
                    *delta.get_mut(&v).unwrap() += contrib;
                }
            }
            if w != s {
                *betweenness.get_mut(&w).unwrap() += delta[&w];
            }
        }
    }

    betweenness
}

/// 70th/90th percentile thresholds over the non-zero betweenness
/// population (spec §4.5) — callers use these to label bottlenecks
/// without comparing raw, graph-size-dependent magnitudes.
pub fn betweenness_percentiles(metrics: &[GraphMetrics]) -> (f64, f64) {
    let mut values: Vec<f64> = metrics.iter().map(|m| m.betweenness).filter(|&v| v > 0.0).collect();
    if values.is_empty() {
        return (0.0, 0.0);
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap());
    (percentile(&values, 0.70), percentile(&values, 0.90))
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((sorted.len() - 1) as f64 * p).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

/// Looks up a symbol's metrics record by id.
pub fn metrics_for(metrics: &[GraphMetrics], id: SymbolId) -> Option<&GraphMetrics> {
    metrics.iter().find(|m| m.symbol_id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Edge, File, ReferenceKind, Symbol};
    use crate::store::IndexData;
    use crate::types::{FileId, LineRange, SymbolKind, Visibility};

    fn chain(n: u32) -> IndexData {
        let mut data = IndexData::new();
        let file = FileId::new(1).unwrap();
        data.files.insert(file, File::new(file, "a.js", "javascript", "h", 0, n));
        data.path_to_file.insert("a.js".into(), file);
        for i in 1..=n {
            let id = SymbolId::new(i).unwrap();
            data.symbols.insert(
                id,
                Symbol::new(id, file, format!("s{i}"), format!("s{i}"), SymbolKind::Function, LineRange::new(i, i), Visibility::Public),
            );
        }
        for i in 1..n {
            data.edges.push(
                Edge::new(SymbolId::new(i).unwrap(), SymbolId::new(i + 1).unwrap(), ReferenceKind::Call, i).unwrap(),
            );
        }
        data.symbol_counter = n;
        data.file_counter = 1;
        data
    }

    #[test]
    fn pagerank_sums_to_roughly_one() {
        let data = chain(4);
        let graph = SymbolGraph::build(&data);
        let metrics = compute_metrics(&graph);
        let total: f64 = metrics.iter().map(|m| m.pagerank).sum();
        assert!((total - 1.0).abs() < 1e-3, "total={total}");
    }

    #[test]
    fn middle_node_has_higher_betweenness_in_a_chain() {
        let data = chain(5);
        let graph = SymbolGraph::build(&data);
        let metrics = compute_metrics(&graph);
        let middle = metrics_for(&metrics, SymbolId::new(3).unwrap()).unwrap();
        let end = metrics_for(&metrics, SymbolId::new(5).unwrap()).unwrap();
        assert!(middle.betweenness > end.betweenness);
    }

    #[test]
    fn degree_matches_edge_table() {
        let data = chain(3);
        let graph = SymbolGraph::build(&data);
        let metrics = compute_metrics(&graph);
        let first = metrics_for(&metrics, SymbolId::new(1).unwrap()).unwrap();
        assert_eq!(first.out_degree, 1);
        assert_eq!(first.in_degree, 0);
    }
}
