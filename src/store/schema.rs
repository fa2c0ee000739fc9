//! The plain, serializable data held by the Store (spec §3/§4.1).
//!
//! Mirrors the teacher's `storage::index_data::IndexData` pattern — a
//! single plain struct bincode can round-trip without custom
//! (de)serialization — generalized from one `Vec<Symbol>` blob to the
//! full files/symbols/edges/file-edges/metrics/clusters model, plus the
//! secondary indices the query vocabulary (spec §6) needs.

use crate::model::{Cluster, Edge, File, FileEdge, GraphMetrics, Symbol};
use crate::types::{FileId, IdCounter, SymbolId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct IndexData {
    pub files: HashMap<FileId, File>,
    pub symbols: HashMap<SymbolId, Symbol>,
    pub edges: Vec<Edge>,
    pub file_edges: Vec<FileEdge>,
    pub metrics: Vec<GraphMetrics>,
    pub clusters: Vec<Cluster>,

    /// Last-seen (path, content_hash) for incremental hash-compare (§4.6
    /// step 2). Kept distinct from `files` so a removed file's hash is
    /// still comparable mid-rebuild before its `File` row is deleted.
    pub path_to_file: HashMap<Box<str>, FileId>,

    pub symbol_counter: u32,
    pub file_counter: u32,
}

impl IndexData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id_counter(&self) -> IdCounter {
        IdCounter::starting_after(self.symbol_counter.max(self.file_counter))
    }

    /// Symbols owned by a single file, in declaration order.
    pub fn symbols_in_file(&self, file_id: FileId) -> Vec<&Symbol> {
        let mut v: Vec<&Symbol> = self
            .symbols
            .values()
            .filter(|s| s.file_id == file_id)
            .collect();
        v.sort_by_key(|s| (s.range.start_line, s.id.value()));
        v
    }

    pub fn symbols_by_name(&self, name: &str) -> Vec<&Symbol> {
        let mut v: Vec<&Symbol> = self.symbols.values().filter(|s| &*s.name == name).collect();
        v.sort_by_key(|s| s.id.value());
        v
    }

    pub fn symbols_by_qualified_name(&self, qualified_name: &str) -> Vec<&Symbol> {
        let mut v: Vec<&Symbol> = self
            .symbols
            .values()
            .filter(|s| &*s.qualified_name == qualified_name)
            .collect();
        v.sort_by_key(|s| s.id.value());
        v
    }

    pub fn symbols_by_kind(&self, kind: crate::types::SymbolKind) -> Vec<&Symbol> {
        let mut v: Vec<&Symbol> = self.symbols.values().filter(|s| s.kind == kind).collect();
        v.sort_by_key(|s| s.id.value());
        v
    }

    /// Innermost symbol in `file_id` whose range contains `line` (spec
    /// §4.4 "line containment" source resolution): pick the candidate
    /// with the smallest line span among those that contain the line.
    pub fn innermost_containing(&self, file_id: FileId, line: u32) -> Option<&Symbol> {
        self.symbols
            .values()
            .filter(|s| s.file_id == file_id && s.range.contains(line))
            .min_by_key(|s| s.range.len())
    }

    /// First symbol declared in a file, used as the file-level stand-in
    /// when no symbol contains a module-scope reference's line (spec
    /// §4.4).
    pub fn first_symbol_in_file(&self, file_id: FileId) -> Option<&Symbol> {
        self.symbols_in_file(file_id).into_iter().next()
    }

    pub fn edges_from(&self, source: SymbolId) -> Vec<&Edge> {
        self.edges.iter().filter(|e| e.source == source).collect()
    }

    pub fn edges_to(&self, target: SymbolId) -> Vec<&Edge> {
        self.edges.iter().filter(|e| e.target == target).collect()
    }

    pub fn fuzzy_like(&self, needle: &str) -> Vec<&Symbol> {
        let needle = needle.to_lowercase();
        let mut v: Vec<&Symbol> = self
            .symbols
            .values()
            .filter(|s| s.name.to_lowercase().contains(&needle))
            .collect();
        v.sort_by_key(|s| s.id.value());
        v
    }
}
