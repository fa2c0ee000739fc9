//! Topological layering on the SCC condensation (spec §4.5).

use super::SymbolGraph;
use crate::types::SymbolId;
use petgraph::algo::{condensation, toposort};
use petgraph::graph::NodeIndex;
use petgraph::Direction;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerViolation {
    pub source: SymbolId,
    pub target: SymbolId,
    pub source_layer: u32,
    pub target_layer: u32,
}

/// Per-symbol layer assignment, keyed by symbol id.
pub fn compute_layers(graph: &SymbolGraph) -> HashMap<SymbolId, u32> {
    let condensed = condensation(graph.graph.clone(), true);

    // A condensation is acyclic by construction, so toposort cannot fail.
    let order = toposort(&condensed, None).expect("condensation is acyclic");

    let mut layer: HashMap<NodeIndex, u32> = HashMap::with_capacity(condensed.node_count());
    for node in order {
        let max_pred = condensed
            .edges_directed(node, Direction::Incoming)
            .map(|e| layer.get(&e.source()).copied().unwrap_or(0))
            .max();
        layer.insert(node, max_pred.map(|l| l + 1).unwrap_or(0));
    }

    let mut by_symbol = HashMap::with_capacity(graph.node_count());
    for node in condensed.node_indices() {
        let component_layer = layer[&node];
        for &symbol_id in &condensed[node] {
            by_symbol.insert(symbol_id, component_layer);
        }
    }
    by_symbol
}

/// Edges whose source sits at a strictly lower layer than their target —
/// a dependency pointing toward a higher, more abstract layer.
pub fn layer_violations(graph: &SymbolGraph, layer_by_symbol: &HashMap<SymbolId, u32>) -> Vec<LayerViolation> {
    let mut violations = Vec::new();
    for edge in graph.graph.edge_indices() {
        let (src, tgt) = graph.graph.edge_endpoints(edge).unwrap();
        let source = graph.symbol_at(src);
        let target = graph.symbol_at(tgt);
        let source_layer = layer_by_symbol.get(&source).copied().unwrap_or(0);
        let target_layer = layer_by_symbol.get(&target).copied().unwrap_or(0);
        if source_layer < target_layer {
            violations.push(LayerViolation {
                source,
                target,
                source_layer,
                target_layer,
            });
        }
    }
    violations.sort_by_key(|v| (v.source.value(), v.target.value()));
    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Edge, File, ReferenceKind, Symbol};
    use crate::store::IndexData;
    use crate::types::{FileId, LineRange, SymbolKind, Visibility};

    fn sample() -> IndexData {
        let mut data = IndexData::new();
        let file = FileId::new(1).unwrap();
        data.files.insert(file, File::new(file, "a.js", "javascript", "h", 0, 3));
        data.path_to_file.insert("a.js".into(), file);
        for (n, name) in [(1u32, "a"), (2, "b"), (3, "c")] {
            let id = SymbolId::new(n).unwrap();
            data.symbols.insert(
                id,
                Symbol::new(id, file, name, name, SymbolKind::Function, LineRange::new(n, n), Visibility::Public),
            );
        }
        data.edges.push(Edge::new(SymbolId::new(1).unwrap(), SymbolId::new(2).unwrap(), ReferenceKind::Call, 1).unwrap());
        data.edges.push(Edge::new(SymbolId::new(2).unwrap(), SymbolId::new(3).unwrap(), ReferenceKind::Call, 1).unwrap());
        data.symbol_counter = 3;
        data.file_counter = 1;
        data
    }

    #[test]
    fn chain_layers_increase_downstream() {
        let data = sample();
        let graph = SymbolGraph::build(&data);
        let layers = compute_layers(&graph);
        assert_eq!(layers[&SymbolId::new(1).unwrap()], 0);
        assert_eq!(layers[&SymbolId::new(2).unwrap()], 1);
        assert_eq!(layers[&SymbolId::new(3).unwrap()], 2);
        assert!(layer_violations(&graph, &layers).is_empty());
    }

    #[test]
    fn cycle_collapses_to_one_layer_with_no_internal_violation() {
        let mut data = sample();
        data.edges.push(Edge::new(SymbolId::new(3).unwrap(), SymbolId::new(1).unwrap(), ReferenceKind::Call, 3).unwrap());
        let graph = SymbolGraph::build(&data);
        let layers = compute_layers(&graph);
        let l1 = layers[&SymbolId::new(1).unwrap()];
        let l2 = layers[&SymbolId::new(2).unwrap()];
        let l3 = layers[&SymbolId::new(3).unwrap()];
        assert_eq!(l1, l2);
        assert_eq!(l2, l3);
        assert!(layer_violations(&graph, &layers).is_empty());
    }
}
