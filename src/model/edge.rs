use crate::model::ReferenceKind;
use crate::types::SymbolId;
use serde::{Deserialize, Serialize};

/// The resolved form of a [`crate::model::Reference`] (spec §3).
///
/// Edge kind reuses [`ReferenceKind`]'s vocabulary — an edge's kind is
/// simply the kind of the reference that resolved into it.
pub type EdgeKind = ReferenceKind;

/// Invariants (spec §3/§8): `source != target`; `(source, target, kind)`
/// is unique among the edges returned by a single resolve pass; `line`
/// falls within the source symbol's declared range when that range is
/// known to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source: SymbolId,
    pub target: SymbolId,
    pub kind: EdgeKind,
    pub line: u32,
}

impl Edge {
    pub fn new(source: SymbolId, target: SymbolId, kind: EdgeKind, line: u32) -> Option<Self> {
        if source == target {
            return None;
        }
        Some(Self {
            source,
            target,
            kind,
            line,
        })
    }

    /// Edge weight for path-finding (spec §4.5): runtime-coupling kinds
    /// are cheaper than structural `import` edges.
    pub fn weight(self) -> f64 {
        match self.kind {
            EdgeKind::Import => 1.1,
            _ => 1.0,
        }
    }

    /// Whether this edge kind counts toward the "coupling ratio" used in
    /// path-quality scoring (spec §4.5).
    pub fn is_coupling(self) -> bool {
        matches!(
            self.kind,
            EdgeKind::Call | EdgeKind::Uses | EdgeKind::UsesTrait
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_edges_are_rejected() {
        let id = SymbolId::new(1).unwrap();
        assert!(Edge::new(id, id, EdgeKind::Call, 1).is_none());
    }

    #[test]
    fn import_edges_weigh_more() {
        let a = SymbolId::new(1).unwrap();
        let b = SymbolId::new(2).unwrap();
        let import = Edge::new(a, b, EdgeKind::Import, 1).unwrap();
        let call = Edge::new(a, b, EdgeKind::Call, 1).unwrap();
        assert!(import.weight() > call.weight());
    }
}
