use crate::types::FileId;
use serde::{Deserialize, Serialize};

/// Aggregated cross-file coupling (spec §3, GLOSSARY "File edge").
///
/// Invariant: `source_file != target_file` (enforced at construction by
/// the resolver's aggregation step, not re-checked here since this type
/// is produced only by that one call site).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEdge {
    pub source_file: FileId,
    pub target_file: FileId,
    pub symbol_count: u32,
    pub kind: FileEdgeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileEdgeKind {
    Imports,
}

impl FileEdge {
    pub fn new(source_file: FileId, target_file: FileId, symbol_count: u32) -> Self {
        Self {
            source_file,
            target_file,
            symbol_count,
            kind: FileEdgeKind::Imports,
        }
    }
}
