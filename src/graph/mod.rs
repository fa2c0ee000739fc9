//! The symbol graph overlay (spec §4.5): derived metrics, communities,
//! topological layering, cycles, and path finding on top of the Store's
//! edges. Built once per run and read-only thereafter (spec §5
//! "shared-resource policy").

pub mod communities;
pub mod cycles;
pub mod layers;
pub mod metrics;
pub mod paths;

use crate::model::{Edge, ReferenceKind};
use crate::store::IndexData;
use crate::types::SymbolId;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

/// The in-memory symbol graph: one node per graphed symbol, one edge per
/// resolved [`Edge`]. A multigraph — parallel edges of different kinds
/// between the same pair of symbols are kept distinct, matching the
/// Store's edge list.
pub struct SymbolGraph {
    pub(crate) graph: DiGraph<SymbolId, EdgeWeight>,
    pub(crate) index_of: HashMap<SymbolId, NodeIndex>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct EdgeWeight {
    pub kind: ReferenceKind,
    pub weight: f64,
}

impl SymbolGraph {
    /// Builds the graph from every symbol and edge currently in `data`.
    /// Symbols with no incident edge are still added as isolated nodes
    /// so degree/PageRank/community queries can report on them.
    pub fn build(data: &IndexData) -> Self {
        let mut graph = DiGraph::new();
        let mut index_of = HashMap::with_capacity(data.symbols.len());

        let mut ids: Vec<SymbolId> = data.symbols.keys().copied().collect();
        ids.sort_by_key(|id| id.value());
        for id in ids {
            let idx = graph.add_node(id);
            index_of.insert(id, idx);
        }

        let mut edges: Vec<&Edge> = data.edges.iter().collect();
        edges.sort_by_key(|e| (e.source.value(), e.target.value()));
        for edge in edges {
            if let (Some(&src), Some(&tgt)) = (index_of.get(&edge.source), index_of.get(&edge.target)) {
                graph.add_edge(
                    src,
                    tgt,
                    EdgeWeight {
                        kind: edge.kind,
                        weight: edge.weight(),
                    },
                );
            }
        }

        Self { graph, index_of }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn symbol_ids(&self) -> Vec<SymbolId> {
        self.graph.node_weights().copied().collect()
    }

    pub fn node_index(&self, id: SymbolId) -> Option<NodeIndex> {
        self.index_of.get(&id).copied()
    }

    pub fn symbol_at(&self, idx: NodeIndex) -> SymbolId {
        self.graph[idx]
    }

    pub fn in_degree(&self, id: SymbolId) -> u32 {
        self.node_index(id)
            .map(|idx| self.graph.edges_directed(idx, petgraph::Direction::Incoming).count() as u32)
            .unwrap_or(0)
    }

    pub fn out_degree(&self, id: SymbolId) -> u32 {
        self.node_index(id)
            .map(|idx| self.graph.edges_directed(idx, petgraph::Direction::Outgoing).count() as u32)
            .unwrap_or(0)
    }

    pub fn degree(&self, id: SymbolId) -> u32 {
        self.in_degree(id) + self.out_degree(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{File, Symbol};
    use crate::types::{FileId, LineRange, SymbolKind, Visibility};

    fn build_simple() -> IndexData {
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
    fn builds_nodes_and_edges() {
        let data = build_simple();
        let graph = SymbolGraph::build(&data);
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.out_degree(SymbolId::new(1).unwrap()), 1);
        assert_eq!(graph.in_degree(SymbolId::new(3).unwrap()), 1);
    }
}
