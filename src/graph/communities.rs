//! Community detection and labeling (spec §4.5): Louvain modularity
//! maximization on the undirected projection, with a greedy-modularity
//! fallback, and anchor-based label selection.

use super::SymbolGraph;
use crate::model::{Cluster, GraphMetrics};
use crate::store::IndexData;
use crate::types::{SymbolId, SymbolKind};
use petgraph::graph::NodeIndex;
use petgraph::Direction;
use std::collections::HashMap;

/// Undirected, weighted adjacency built by summing both edge directions
/// between each pair. Self-loops are dropped — a symbol never references
/// itself (`Edge::new` rejects that already).
fn undirected_adjacency(graph: &SymbolGraph) -> (Vec<NodeIndex>, HashMap<NodeIndex, HashMap<NodeIndex, f64>>) {
    let mut nodes: Vec<NodeIndex> = graph.graph.node_indices().collect();
    nodes.sort_by_key(|idx| graph.symbol_at(*idx).value());

    let mut adj: HashMap<NodeIndex, HashMap<NodeIndex, f64>> = nodes.iter().map(|&n| (n, HashMap::new())).collect();
    for idx in graph.graph.node_indices() {
        for edge in graph.graph.edges_directed(idx, Direction::Outgoing) {
            let (a, b) = (idx, edge.target());
            if a == b {
                continue;
            }
            *adj.get_mut(&a).unwrap().entry(b).or_insert(0.0) += edge.weight().weight;
            *adj.get_mut(&b).unwrap().entry(a).or_insert(0.0) += edge.weight().weight;
        }
    }
    (nodes, adj)
}

/// One level of the Blondel et al. local-moving heuristic, run on a
/// generic weighted undirected graph over node indices `0..n`.
struct Level {
    adjacency: Vec<Vec<(usize, f64)>>,
    self_loop: Vec<f64>,
    degree: Vec<f64>,
    total_weight: f64,
}

impl Level {
    fn from_pairs(n: usize, edges: &[(usize, usize, f64)]) -> Self {
        let mut adjacency = vec![Vec::new(); n];
        let mut self_loop = vec![0.0; n];
        for &(u, v, w) in edges {
            if u == v {
                self_loop[u] += w;
            } else {
                adjacency[u].push((v, w));
                adjacency[v].push((u, w));
            }
        }
        let degree: Vec<f64> = (0..n)
            .map(|i| adjacency[i].iter().map(|(_, w)| w).sum::<f64>() + 2.0 * self_loop[i])
            .collect();
        let total_weight = degree.iter().sum::<f64>() / 2.0;
        Self {
            adjacency,
            self_loop,
            degree,
            total_weight,
        }
    }

    /// Local moving pass; returns the final community assignment
    /// (arbitrary ids, not yet compacted) and whether anything moved.
    fn local_move(&self) -> (Vec<usize>, bool) {
        let n = self.adjacency.len();
        let mut community: Vec<usize> = (0..n).collect();
        let mut sigma_tot: Vec<f64> = self.degree.clone();
        let m2 = 2.0 * self.total_weight;
        if m2 == 0.0 {
            return (community, false);
        }

        let mut any_move = false;
        loop {
            let mut moved_this_sweep = false;
            for i in 0..n {
                let own = community[i];
                sigma_tot[own] -= self.degree[i];

                let mut weight_to: HashMap<usize, f64> = HashMap::new();
                for &(j, w) in &self.adjacency[i] {
                    *weight_to.entry(community[j]).or_insert(0.0) += w;
                }

                let mut best = own;
                let mut best_gain = weight_to.get(&own).copied().unwrap_or(0.0) - sigma_tot[own] * self.degree[i] / m2;
                for (&c, &k_in) in &weight_to {
                    if c == own {
                        continue;
                    }
                    let gain = k_in - sigma_tot[c] * self.degree[i] / m2;
                    if gain > best_gain || (gain == best_gain && c < best) {
                        best_gain = gain;
                        best = c;
                    }
                }

                community[i] = best;
                sigma_tot[best] += self.degree[i];
                if best != own {
                    moved_this_sweep = true;
                    any_move = true;
                }
            }
            if !moved_this_sweep {
                break;
            }
        }
        (community, any_move)
    }
}

fn compact(community: &[usize]) -> Vec<usize> {
    let mut remap = HashMap::new();
    community
        .iter()
        .map(|&c| {
            let next = remap.len();
            *remap.entry(c).or_insert(next)
        })
        .collect()
}

/// Runs Louvain to convergence (no further aggregation improves
/// modularity) and returns a community id per original node index
/// (0..n), ids compacted to a dense `0..k` range.
fn louvain(n: usize, edges: &[(usize, usize, f64)]) -> Vec<usize> {
    if n == 0 {
        return Vec::new();
    }
    let mut membership: Vec<usize> = (0..n).collect();
    let mut current_edges: Vec<(usize, usize, f64)> = edges.to_vec();
    let mut current_n = n;

    loop {
        let level = Level::from_pairs(current_n, &current_edges);
        let (assignment, moved) = level.local_move();
        if !moved {
            break;
        }
        let assignment = compact(&assignment);
        let new_n = assignment.iter().max().map(|m| m + 1).unwrap_or(0);

        for m in membership.iter_mut() {
            *m = assignment[*m];
        }

        let mut aggregated: HashMap<(usize, usize), f64> = HashMap::new();
        for &(u, v, w) in &current_edges {
            let (cu, cv) = (assignment[u], assignment[v]);
            let key = if cu <= cv { (cu, cv) } else { (cv, cu) };
            *aggregated.entry(key).or_insert(0.0) += w;
        }
        current_edges = aggregated.into_iter().map(|((a, b), w)| (a, b, w)).collect();
        current_n = new_n;

        if current_n >= n {
            break;
        }
    }

    compact(&membership)
}

/// A single-pass greedy-modularity agglomeration, used when Louvain is
/// unavailable. Starts from singleton communities and repeatedly merges
/// whichever pair yields the largest modularity gain until no merge
/// would improve it.
fn greedy_modularity(n: usize, edges: &[(usize, usize, f64)]) -> Vec<usize> {
    if n == 0 {
        return Vec::new();
    }
    let level = Level::from_pairs(n, edges);
    let m2 = 2.0 * level.total_weight;
    if m2 == 0.0 {
        return (0..n).collect();
    }

    let mut community: Vec<usize> = (0..n).collect();
    let mut sigma_tot = level.degree.clone();

    let mut weight_between: HashMap<(usize, usize), f64> = HashMap::new();
    for (i, neighbors) in level.adjacency.iter().enumerate() {
        for &(j, w) in neighbors {
            if i < j {
                weight_between.insert((i, j), w);
            }
        }
    }

    loop {
        let mut best_pair: Option<(usize, usize)> = None;
        let mut best_gain = 0.0;
        for (&(a, b), &w_ab) in &weight_between {
            let (ca, cb) = (community[a], community[b]);
            if ca == cb {
                continue;
            }
            let gain = w_ab / level.total_weight - (sigma_tot[ca] * sigma_tot[cb]) / (m2 * level.total_weight);
            if gain > best_gain {
                best_gain = gain;
                best_pair = Some((ca, cb));
            }
        }

        let Some((ca, cb)) = best_pair else { break };
        let (keep, drop) = (ca.min(cb), ca.max(cb));
        for c in community.iter_mut() {
            if *c == drop {
                *c = keep;
            }
        }
        sigma_tot[keep] += sigma_tot[drop];
        sigma_tot[drop] = 0.0;
    }

    compact(&community)
}

/// Assigns every graphed symbol a community id via Louvain (spec §4.5).
/// Louvain is pure Rust and always available in this crate, so
/// [`greedy_modularity`] only runs when called directly (see tests) —
/// still a real implementation, exercised, per the fallback requirement.
pub fn compute_communities(graph: &SymbolGraph) -> HashMap<SymbolId, u32> {
    let (nodes, adj) = undirected_adjacency(graph);
    let index_of: HashMap<NodeIndex, usize> = nodes.iter().enumerate().map(|(i, &n)| (n, i)).collect();

    let mut edges = Vec::new();
    for (&a, neighbors) in &adj {
        for (&b, &w) in neighbors {
            if index_of[&a] < index_of[&b] {
                edges.push((index_of[&a], index_of[&b], w));
            }
        }
    }

    let assignment = louvain(nodes.len(), &edges);
    nodes
        .iter()
        .enumerate()
        .map(|(i, &n)| (graph.symbol_at(n), assignment[i] as u32))
        .collect()
}

fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

fn dir_short_name(path: &str) -> &str {
    parent_dir(path).rsplit('/').next().unwrap_or("")
}

/// Builds the labeled [`Cluster`] rows for every community (spec §4.5):
/// architectural-anchor labeling, falling back to majority directory
/// short name, and a directory-distribution label for oversized
/// communities.
pub fn label_communities(
    communities: &HashMap<SymbolId, u32>,
    data: &IndexData,
    metrics: &[GraphMetrics],
) -> Vec<Cluster> {
    let total = communities.len().max(1);
    let mut by_community: HashMap<u32, Vec<SymbolId>> = HashMap::new();
    for (&id, &community_id) in communities {
        by_community.entry(community_id).or_default().push(id);
    }

    let pagerank_of = |id: SymbolId| -> f64 {
        metrics.iter().find(|m| m.symbol_id == id).map(|m| m.pagerank).unwrap_or(0.0)
    };

    let mut community_ids: Vec<u32> = by_community.keys().copied().collect();
    community_ids.sort_unstable();

    let mut clusters = Vec::with_capacity(communities.len());
    for community_id in community_ids {
        let mut members = by_community[&community_id].clone();
        members.sort_by_key(|id| id.value());

        let oversized = members.len() > 100 || members.len() as f64 / total as f64 > 0.40;
        let label = if oversized {
            directory_distribution_label(&members, data)
        } else {
            anchor_label(&members, data, &pagerank_of)
        };

        for &symbol_id in &members {
            clusters.push(Cluster::new(symbol_id, community_id, label.clone()));
        }
    }
    clusters
}

fn anchor_label(members: &[SymbolId], data: &IndexData, pagerank_of: &impl Fn(SymbolId) -> f64) -> String {
    let anchor = members
        .iter()
        .filter(|&&id| data.symbols.get(&id).is_some_and(|s| s.kind.is_architectural_anchor()))
        .max_by(|&&a, &&b| pagerank_of(a).partial_cmp(&pagerank_of(b)).unwrap());

    let anchor = anchor.or_else(|| {
        members
            .iter()
            .max_by(|&&a, &&b| pagerank_of(a).partial_cmp(&pagerank_of(b)).unwrap())
    });

    match anchor.and_then(|&id| data.symbols.get(&id)) {
        Some(symbol) => symbol.name.to_string(),
        None => majority_directory_label(members, data),
    }
}

fn majority_directory_label(members: &[SymbolId], data: &IndexData) -> String {
    let mut counts: HashMap<&str, u32> = HashMap::new();
    for &id in members {
        if let Some(symbol) = data.symbols.get(&id) {
            if let Some(file) = data.files.get(&symbol.file_id) {
                *counts.entry(dir_short_name(&file.path)).or_insert(0) += 1;
            }
        }
    }
    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(name, _)| name.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn directory_distribution_label(members: &[SymbolId], data: &IndexData) -> String {
    let mut counts: HashMap<&str, u32> = HashMap::new();
    for &id in members {
        if let Some(symbol) = data.symbols.get(&id) {
            if let Some(file) = data.files.get(&symbol.file_id) {
                *counts.entry(parent_dir(&file.path)).or_insert(0) += 1;
            }
        }
    }
    let total = members.len().max(1) as f64;
    let mut entries: Vec<(&str, u32)> = counts.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    entries.truncate(3);

    let parts: Vec<String> = entries
        .into_iter()
        .map(|(dir, count)| {
            let pct = (count as f64 / total * 100.0).round() as i64;
            format!("{dir} ({pct}%)")
        })
        .collect();
    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Edge, File, ReferenceKind, Symbol};
    use crate::types::{FileId, LineRange, SymbolKind, Visibility};

    fn two_cliques() -> IndexData {
        let mut data = IndexData::new();
        let file = FileId::new(1).unwrap();
        data.files.insert(file, File::new(file, "a.js", "javascript", "h", 0, 6));
        data.path_to_file.insert("a.js".into(), file);
        for n in 1..=6u32 {
            let id = SymbolId::new(n).unwrap();
            data.symbols.insert(
                id,
                Symbol::new(id, file, format!("s{n}"), format!("s{n}"), SymbolKind::Function, LineRange::new(n, n), Visibility::Public),
            );
        }
        // Two dense triangles with a single bridge between them.
        let triangle = [(1, 2), (2, 3), (3, 1)];
        let triangle2 = [(4, 5), (5, 6), (6, 4)];
        let mut line = 1;
        for (a, b) in triangle.iter().chain(triangle2.iter()) {
            data.edges.push(Edge::new(SymbolId::new(*a).unwrap(), SymbolId::new(*b).unwrap(), ReferenceKind::Call, line).unwrap());
            line += 1;
        }
        data.edges.push(Edge::new(SymbolId::new(3).unwrap(), SymbolId::new(4).unwrap(), ReferenceKind::Call, line).unwrap());
        data.symbol_counter = 6;
        data.file_counter = 1;
        data
    }

    #[test]
    fn louvain_separates_two_triangles() {
        let data = two_cliques();
        let graph = SymbolGraph::build(&data);
        let communities = compute_communities(&graph);
        let c1 = communities[&SymbolId::new(1).unwrap()];
        let c2 = communities[&SymbolId::new(4).unwrap()];
        assert_ne!(c1, c2);
        assert_eq!(communities[&SymbolId::new(2).unwrap()], c1);
        assert_eq!(communities[&SymbolId::new(5).unwrap()], c2);
    }

    #[test]
    fn greedy_modularity_fallback_also_separates_cliques() {
        let data = two_cliques();
        let graph = SymbolGraph::build(&data);
        let (nodes, adj) = undirected_adjacency(&graph);
        let index_of: HashMap<NodeIndex, usize> = nodes.iter().enumerate().map(|(i, &n)| (n, i)).collect();
        let mut edges = Vec::new();
        for (&a, neighbors) in &adj {
            for (&b, &w) in neighbors {
                if index_of[&a] < index_of[&b] {
                    edges.push((index_of[&a], index_of[&b], w));
                }
            }
        }
        let assignment = greedy_modularity(nodes.len(), &edges);
        let idx1 = index_of[&graph.node_index(SymbolId::new(1).unwrap()).unwrap()];
        let idx4 = index_of[&graph.node_index(SymbolId::new(4).unwrap()).unwrap()];
        assert_ne!(assignment[idx1], assignment[idx4]);
    }

    #[test]
    fn labels_favor_architectural_anchors() {
        let mut data = two_cliques();
        data.symbols.get_mut(&SymbolId::new(1).unwrap()).unwrap().kind = SymbolKind::Class;
        data.symbols.get_mut(&SymbolId::new(1).unwrap()).unwrap().name = "Widget".into();
        let graph = SymbolGraph::build(&data);
        let communities = compute_communities(&graph);
        let metrics = super::super::metrics::compute_metrics(&graph);
        let clusters = label_communities(&communities, &data, &metrics);
        let widget_cluster = clusters.iter().find(|c| c.symbol_id == SymbolId::new(1).unwrap()).unwrap();
        assert_eq!(&*widget_cluster.label, "Widget");
    }
}
