//! Weighted path finding and coupling scoring (spec §4.5): Dijkstra with
//! an undirected fallback, Yen's k-shortest simple paths, path-quality
//! scoring, and a synthetic structural path for file-only coupling.

use super::SymbolGraph;
use crate::model::ReferenceKind;
use crate::store::IndexData;
use crate::types::SymbolId;
use petgraph::graph::NodeIndex;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CouplingLabel {
    Structural,
    Weak,
    Moderate,
    Strong,
}

#[derive(Debug, Clone)]
pub struct ScoredPath {
    pub nodes: Vec<SymbolId>,
    pub quality: f64,
    pub structural: bool,
    pub coupling: CouplingLabel,
}

pub struct PathQuery {
    pub paths: Vec<ScoredPath>,
    pub overall_coupling: Option<CouplingLabel>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct HeapItem {
    cost: f64,
    node: NodeIndex,
}

impl Eq for HeapItem {}
impl Ord for HeapItem {
    fn cmp(&self, other: &Self) -> Ordering {
        other.cost.partial_cmp(&self.cost).unwrap_or(Ordering::Equal)
    }
}
impl PartialOrd for HeapItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Dijkstra over `graph`, optionally excluding nodes/edges (Yen's spur
/// search) and optionally treating every edge as bidirectional (the
/// "undirected fallback" the spec calls for when no directed path
/// exists).
fn dijkstra_path(
    graph: &SymbolGraph,
    source: NodeIndex,
    target: NodeIndex,
    excluded_nodes: &HashSet<NodeIndex>,
    excluded_edges: &HashSet<(NodeIndex, NodeIndex)>,
    undirected: bool,
) -> Option<(Vec<NodeIndex>, f64)> {
    if excluded_nodes.contains(&source) || excluded_nodes.contains(&target) {
        return None;
    }

    let mut dist: HashMap<NodeIndex, f64> = HashMap::new();
    let mut prev: HashMap<NodeIndex, NodeIndex> = HashMap::new();
    let mut heap = BinaryHeap::new();

    dist.insert(source, 0.0);
    heap.push(HeapItem { cost: 0.0, node: source });

    while let Some(HeapItem { cost, node }) = heap.pop() {
        if node == target {
            break;
        }
        if cost > *dist.get(&node).unwrap_or(&f64::INFINITY) {
            continue;
        }

        let mut neighbors: Vec<(NodeIndex, f64)> = graph
            .graph
            .edges_directed(node, petgraph::Direction::Outgoing)
            .map(|e| (e.target(), e.weight().weight))
            .collect();
        if undirected {
            neighbors.extend(
                graph
                    .graph
                    .edges_directed(node, petgraph::Direction::Incoming)
                    .map(|e| (e.source(), e.weight().weight)),
            );
        }

        for (next, weight) in neighbors {
            if excluded_nodes.contains(&next) || excluded_edges.contains(&(node, next)) {
                continue;
            }
            let next_cost = cost + weight;
            if next_cost < *dist.get(&next).unwrap_or(&f64::INFINITY) {
                dist.insert(next, next_cost);
                prev.insert(next, node);
                heap.push(HeapItem { cost: next_cost, node: next });
            }
        }
    }

    if !dist.contains_key(&target) {
        return None;
    }

    let mut path = vec![target];
    let mut current = target;
    while current != source {
        current = *prev.get(&current)?;
        path.push(current);
    }
    path.reverse();
    Some((path, dist[&target]))
}

fn node_path(graph: &SymbolGraph, source: SymbolId, target: SymbolId, undirected: bool) -> Option<(Vec<NodeIndex>, f64)> {
    let src = graph.node_index(source)?;
    let tgt = graph.node_index(target)?;
    dijkstra_path(graph, src, tgt, &HashSet::new(), &HashSet::new(), undirected)
}

/// Single shortest path, directed first and falling back to the
/// undirected projection (spec §4.5).
pub fn shortest_path(graph: &SymbolGraph, source: SymbolId, target: SymbolId) -> Option<Vec<SymbolId>> {
    let (path, _) = node_path(graph, source, target, false).or_else(|| node_path(graph, source, target, true))?;
    Some(path.into_iter().map(|idx| graph.symbol_at(idx)).collect())
}

/// Yen's algorithm for the `k` shortest *simple* (loopless) paths.
/// petgraph has no built-in k-shortest-paths routine, so this is a
/// from-scratch implementation over [`dijkstra_path`].
fn yen_k_shortest(graph: &SymbolGraph, source: NodeIndex, target: NodeIndex, k: usize, undirected: bool) -> Vec<(Vec<NodeIndex>, f64)> {
    let Some(first) = dijkstra_path(graph, source, target, &HashSet::new(), &HashSet::new(), undirected) else {
        return Vec::new();
    };

    let mut accepted = vec![first];
    let mut candidates: Vec<(Vec<NodeIndex>, f64)> = Vec::new();

    while accepted.len() < k {
        let prev_path = accepted.last().unwrap().0.clone();

        for i in 0..prev_path.len() - 1 {
            let spur_node = prev_path[i];
            let root_path = &prev_path[..=i];

            let mut excluded_edges = HashSet::new();
            for (path, _) in &accepted {
                if path.len() > i && path[..=i] == *root_path {
                    excluded_edges.insert((path[i], path[i + 1]));
                }
            }

            let excluded_nodes: HashSet<NodeIndex> = root_path[..i].iter().copied().collect();

            if let Some((spur_path, _)) = dijkstra_path(graph, spur_node, target, &excluded_nodes, &excluded_edges, undirected) {
                let mut total_path = root_path[..i].to_vec();
                total_path.extend(spur_path);
                if total_path.iter().collect::<HashSet<_>>().len() == total_path.len()
                    && !accepted.iter().any(|(p, _)| *p == total_path)
                    && !candidates.iter().any(|(p, _)| *p == total_path)
                {
                    let cost = path_cost(graph, &total_path, undirected);
                    candidates.push((total_path, cost));
                }
            }
        }

        if candidates.is_empty() {
            break;
        }
        candidates.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
        accepted.push(candidates.remove(0));
    }

    accepted
}

fn path_cost(graph: &SymbolGraph, path: &[NodeIndex], undirected: bool) -> f64 {
    let mut cost = 0.0;
    for pair in path.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let forward = graph.graph.edges_connecting(a, b).map(|e| e.weight().weight).fold(f64::INFINITY, f64::min);
        let weight = if forward.is_finite() {
            forward
        } else if undirected {
            graph.graph.edges_connecting(b, a).map(|e| e.weight().weight).fold(f64::INFINITY, f64::min)
        } else {
            f64::INFINITY
        };
        cost += weight;
    }
    cost
}

/// Up to `k` shortest simple paths, directed first and falling back to
/// the undirected projection only if no directed path exists at all.
pub fn k_shortest_paths(graph: &SymbolGraph, source: SymbolId, target: SymbolId, k: usize) -> Vec<Vec<SymbolId>> {
    let (Some(src), Some(tgt)) = (graph.node_index(source), graph.node_index(target)) else {
        return Vec::new();
    };

    let mut found = yen_k_shortest(graph, src, tgt, k, false);
    if found.is_empty() {
        found = yen_k_shortest(graph, src, tgt, k, true);
    }

    found
        .into_iter()
        .map(|(path, _)| path.into_iter().map(|idx| graph.symbol_at(idx)).collect())
        .collect()
}

fn edge_kind_between(graph: &SymbolGraph, a: SymbolId, b: SymbolId) -> Option<ReferenceKind> {
    let (na, nb) = (graph.node_index(a)?, graph.node_index(b)?);
    graph
        .graph
        .edges_connecting(na, nb)
        .map(|e| e.weight().kind)
        .chain(graph.graph.edges_connecting(nb, na).map(|e| e.weight().kind))
        .next()
}

fn classify_path(graph: &SymbolGraph, nodes: &[SymbolId]) -> CouplingLabel {
    let mut saw_call = false;
    let mut saw_other = false;
    for pair in nodes.windows(2) {
        match edge_kind_between(graph, pair[0], pair[1]) {
            Some(ReferenceKind::Call) => saw_call = true,
            Some(_) => saw_other = true,
            None => {}
        }
    }
    match (saw_call, saw_other) {
        (true, false) => CouplingLabel::Strong,
        (true, true) => CouplingLabel::Moderate,
        _ => CouplingLabel::Weak,
    }
}

/// Fraction of path edges whose kind counts toward coupling
/// (call/uses/uses_trait), weighted 0.7 in the quality score.
fn coupling_ratio(graph: &SymbolGraph, nodes: &[SymbolId]) -> f64 {
    if nodes.len() < 2 {
        return 0.0;
    }
    let hops = nodes.len() - 1;
    let coupled = nodes
        .windows(2)
        .filter(|pair| {
            edge_kind_between(graph, pair[0], pair[1])
                .map(|k| {
                    matches!(
                        k,
                        ReferenceKind::Call | ReferenceKind::Uses | ReferenceKind::UsesTrait
                    )
                })
                .unwrap_or(false)
        })
        .count();
    coupled as f64 / hops as f64
}

fn directness(hops: usize) -> f64 {
    (1.0 - 0.15 * (hops as f64 - 2.0)).max(0.0)
}

fn hub_penalty(graph: &SymbolGraph, nodes: &[SymbolId]) -> f64 {
    if nodes.len() <= 2 {
        return 0.0;
    }
    nodes[1..nodes.len() - 1]
        .iter()
        .filter(|&&id| graph.degree(id) > 50)
        .map(|&id| {
            let degree = graph.degree(id) as f64;
            (0.2 + degree / 500.0).min(0.5)
        })
        .sum()
}

fn score(graph: &SymbolGraph, nodes: &[SymbolId]) -> f64 {
    let hops = nodes.len().saturating_sub(1);
    coupling_ratio(graph, nodes) * 0.7 + directness(hops) * 0.3 - hub_penalty(graph, nodes)
}

fn direct_file_edge(data: &IndexData, source: SymbolId, target: SymbolId) -> bool {
    let (Some(s), Some(t)) = (data.symbols.get(&source), data.symbols.get(&target)) else {
        return false;
    };
    if s.file_id == t.file_id {
        return false;
    }
    data.file_edges.iter().any(|fe| fe.source_file == s.file_id && fe.target_file == t.file_id)
}

/// All returned paths between `source` and `target`, scored and labeled,
/// plus the overall coupling verdict (spec §4.5). Prepends a synthetic
/// two-hop structural path when no symbol-level path exists but the
/// owning files are directly import-coupled.
pub fn find_paths(graph: &SymbolGraph, data: &IndexData, source: SymbolId, target: SymbolId, k: usize) -> PathQuery {
    let mut scored: Vec<ScoredPath> = k_shortest_paths(graph, source, target, k)
        .into_iter()
        .map(|nodes| {
            let quality = score(graph, &nodes);
            let coupling = classify_path(graph, &nodes);
            ScoredPath {
                nodes,
                quality,
                structural: false,
                coupling,
            }
        })
        .collect();

    if scored.is_empty() && direct_file_edge(data, source, target) {
        scored.push(ScoredPath {
            nodes: vec![source, target],
            quality: directness(1) * 0.3,
            structural: true,
            coupling: CouplingLabel::Structural,
        });
    }

    scored.sort_by(|a, b| {
        b.quality
            .partial_cmp(&a.quality)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.nodes.len().cmp(&b.nodes.len()))
            .then_with(|| {
                a.nodes
                    .iter()
                    .map(|id| id.value())
                    .collect::<Vec<_>>()
                    .cmp(&b.nodes.iter().map(|id| id.value()).collect::<Vec<_>>())
            })
    });

    let overall_coupling = scored.iter().map(|p| p.coupling).max();
    PathQuery {
        paths: scored,
        overall_coupling,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Edge, File, FileEdge, Symbol};
    use crate::store::IndexData;
    use crate::types::{FileId, LineRange, SymbolKind, Visibility};

    fn chain() -> IndexData {
        let mut data = IndexData::new();
        let file = FileId::new(1).unwrap();
        data.files.insert(file, File::new(file, "a.js", "javascript", "h", 0, 4));
        data.path_to_file.insert("a.js".into(), file);
        for n in 1..=4u32 {
            let id = SymbolId::new(n).unwrap();
            data.symbols.insert(
                id,
                Symbol::new(id, file, format!("s{n}"), format!("s{n}"), SymbolKind::Function, LineRange::new(n, n), Visibility::Public),
            );
        }
        data.edges.push(Edge::new(SymbolId::new(1).unwrap(), SymbolId::new(2).unwrap(), ReferenceKind::Call, 1).unwrap());
        data.edges.push(Edge::new(SymbolId::new(2).unwrap(), SymbolId::new(3).unwrap(), ReferenceKind::Call, 2).unwrap());
        data.edges.push(Edge::new(SymbolId::new(3).unwrap(), SymbolId::new(4).unwrap(), ReferenceKind::Call, 3).unwrap());
        data.edges.push(Edge::new(SymbolId::new(1).unwrap(), SymbolId::new(4).unwrap(), ReferenceKind::Import, 1).unwrap());
        data.symbol_counter = 4;
        data.file_counter = 1;
        data
    }

    #[test]
    fn shortest_path_follows_cheapest_edges() {
        let data = chain();
        let graph = SymbolGraph::build(&data);
        let path = shortest_path(&graph, SymbolId::new(1).unwrap(), SymbolId::new(4).unwrap()).unwrap();
        assert_eq!(path, vec![SymbolId::new(1).unwrap(), SymbolId::new(4).unwrap()]);
    }

    #[test]
    fn k_shortest_paths_includes_the_longer_call_chain() {
        let data = chain();
        let graph = SymbolGraph::build(&data);
        let paths = k_shortest_paths(&graph, SymbolId::new(1).unwrap(), SymbolId::new(4).unwrap(), 3);
        assert!(paths.iter().any(|p| p.len() == 4));
    }

    #[test]
    fn synthetic_structural_path_used_when_no_symbol_path_exists() {
        let mut data = IndexData::new();
        let fa = FileId::new(1).unwrap();
        let fb = FileId::new(2).unwrap();
        data.files.insert(fa, File::new(fa, "a.js", "javascript", "h", 0, 1));
        data.files.insert(fb, File::new(fb, "b.js", "javascript", "h", 0, 1));
        let sa = SymbolId::new(1).unwrap();
        let sb = SymbolId::new(2).unwrap();
        data.symbols.insert(sa, Symbol::new(sa, fa, "a", "a", SymbolKind::Function, LineRange::single(1), Visibility::Public));
        data.symbols.insert(sb, Symbol::new(sb, fb, "b", "b", SymbolKind::Function, LineRange::single(1), Visibility::Public));
        data.file_edges.push(FileEdge::new(fa, fb, 1));
        data.symbol_counter = 2;
        data.file_counter = 2;

        let graph = SymbolGraph::build(&data);
        let result = find_paths(&graph, &data, sa, sb, 3);
        assert_eq!(result.paths.len(), 1);
        assert!(result.paths[0].structural);
        assert_eq!(result.overall_coupling, Some(CouplingLabel::Structural));
    }
}
