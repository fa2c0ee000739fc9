//! Cycle detection (spec §4.5): strongly connected components of size
//! >= 2, sorted by size descending.

use super::SymbolGraph;
use crate::types::SymbolId;
use petgraph::algo::tarjan_scc;

pub fn compute_cycles(graph: &SymbolGraph) -> Vec<Vec<SymbolId>> {
    let mut cycles: Vec<Vec<SymbolId>> = tarjan_scc(&graph.graph)
        .into_iter()
        .filter(|scc| scc.len() >= 2)
        .map(|scc| {
            let mut ids: Vec<SymbolId> = scc.into_iter().map(|idx| graph.symbol_at(idx)).collect();
            ids.sort_by_key(|id| id.value());
            ids
        })
        .collect();

    cycles.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a[0].value().cmp(&b[0].value())));
    cycles
}
