use crate::types::SymbolId;
use serde::{Deserialize, Serialize};

/// Derived centrality numbers attached to a symbol (spec §3/§4.5).
///
/// Recomputed on every build; this is derived state, never ground truth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GraphMetrics {
    pub symbol_id: SymbolId,
    pub in_degree: u32,
    pub out_degree: u32,
    /// Unnormalized shortest-path count (spec §4.5); consumers compute
    /// percentiles over the non-zero population rather than comparing
    /// absolute values.
    pub betweenness: f64,
    pub pagerank: f64,
}
