use crate::types::SymbolId;
use serde::{Deserialize, Serialize};

/// Community membership assigned to a graphed symbol (spec §3/§4.5).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    pub symbol_id: SymbolId,
    pub community_id: u32,
    pub label: Box<str>,
}

impl Cluster {
    pub fn new(symbol_id: SymbolId, community_id: u32, label: impl Into<String>) -> Self {
        Self {
            symbol_id,
            community_id,
            label: label.into().into_boxed_str(),
        }
    }
}
