//! The Resolver (spec §4.4): turns loose [`Reference`] records into
//! concrete [`Edge`]s, with source resolution (declared name or line
//! containment) and locality-ordered target resolution.

mod import_path;

pub use import_path::normalize_import_path;

use crate::model::{Edge, FileEdge, Reference, ReferenceKind};
use crate::store::IndexData;
use crate::types::{FileId, SymbolId, SymbolKind};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};

/// Resolves every reference against `data`'s current symbols, returning
/// deduplicated, self-edge-free symbol edges plus the aggregated
/// file-edges built from them (spec §4.4 "File-edge aggregation").
pub fn resolve(references: &[Reference], data: &IndexData) -> (Vec<Edge>, Vec<FileEdge>) {
    let qualified_index = build_qualified_index(data);
    let name_index = build_name_index(data);
    let import_map = build_import_map(references, data);

    let mut seen = HashSet::new();
    let mut edges = Vec::new();

    for reference in references {
        let Some(source) = resolve_source(reference, data) else {
            continue;
        };
        let Some(target) = resolve_target(reference, source, data, &qualified_index, &name_index, &import_map) else {
            continue;
        };
        let Some(edge) = Edge::new(source, target, reference.kind, reference.line) else {
            continue;
        };
        if seen.insert((edge.source, edge.target, edge.kind)) {
            edges.push(edge);
        }
    }

    edges.sort_by_key(|e| (e.source.value(), e.target.value(), kind_rank(e.kind)));
    let file_edges = aggregate_file_edges(&edges, data);
    (edges, file_edges)
}

fn kind_rank(kind: ReferenceKind) -> u8 {
    match kind {
        ReferenceKind::Call => 0,
        ReferenceKind::Import => 1,
        ReferenceKind::Inherits => 2,
        ReferenceKind::Implements => 3,
        ReferenceKind::Uses => 4,
        ReferenceKind::UsesTrait => 5,
        ReferenceKind::Template => 6,
        ReferenceKind::Reference => 7,
    }
}

fn build_qualified_index(data: &IndexData) -> HashMap<&str, Vec<SymbolId>> {
    let mut index: HashMap<&str, Vec<SymbolId>> = HashMap::new();
    for symbol in data.symbols.values() {
        index.entry(&symbol.qualified_name).or_default().push(symbol.id);
    }
    index
}

fn build_name_index(data: &IndexData) -> HashMap<&str, Vec<SymbolId>> {
    let mut index: HashMap<&str, Vec<SymbolId>> = HashMap::new();
    for symbol in data.symbols.values() {
        index.entry(&symbol.name).or_default().push(symbol.id);
    }
    index
}

/// `(source_file, local_name) -> import_path`, built from `Import`-kind
/// references so a later `Call`/`Uses` reference to the same local name
/// can be matched import-path-guided (spec §4.4).
fn build_import_map<'a>(
    references: &'a [Reference],
    data: &IndexData,
) -> IndexMap<(FileId, &'a str), &'a str> {
    let mut map = IndexMap::new();
    for reference in references {
        if reference.kind != ReferenceKind::Import {
            continue;
        }
        let (Some(source_file_path), Some(import_path)) = (&reference.source_file, &reference.import_path) else {
            continue;
        };
        if let Some(&file_id) = data.path_to_file.get(&**source_file_path) {
            map.insert((file_id, &*reference.target_name), &**import_path);
        }
    }
    map
}

/// Source resolution (spec §4.4): the declared source name filtered to
/// the reference's own file, else line containment, else the file's
/// first symbol as a module-scope stand-in.
fn resolve_source(reference: &Reference, data: &IndexData) -> Option<SymbolId> {
    let source_file_path = reference.source_file.as_deref()?;
    let file_id = *data.path_to_file.get(source_file_path)?;

    if let Some(name) = &reference.source_name {
        let mut candidates: Vec<SymbolId> = data
            .symbols_in_file(file_id)
            .into_iter()
            .filter(|s| &*s.name == name.as_ref())
            .map(|s| s.id)
            .collect();
        if !candidates.is_empty() {
            // "Edge-count" tie-breaking is circular at resolve time (a
            // symbol's degree isn't known until resolution finishes), so
            // ties fall back to declaration order, which is deterministic.
            candidates.sort_by_key(|id| id.value());
            return candidates.into_iter().next();
        }
    }

    data.innermost_containing(file_id, reference.line)
        .map(|s| s.id)
        .or_else(|| data.first_symbol_in_file(file_id).map(|s| s.id))
}

fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

fn resolve_target(
    reference: &Reference,
    source: SymbolId,
    data: &IndexData,
    qualified_index: &HashMap<&str, Vec<SymbolId>>,
    name_index: &HashMap<&str, Vec<SymbolId>>,
    import_map: &IndexMap<(FileId, &str), &str>,
) -> Option<SymbolId> {
    let target_name: &str = &reference.target_name;

    // 1. Qualified-name lookup.
    if let Some(candidates) = qualified_index.get(target_name) {
        if candidates.len() == 1 {
            return Some(candidates[0]);
        }
    }

    let source_symbol = data.symbols.get(&source)?;
    let source_file = data.files.get(&source_symbol.file_id)?;

    // Constructor-call heuristic takes priority when it clearly applies
    // (spec §4.4 step 3): an uppercase call target with a same-named
    // class symbol.
    if reference.kind == ReferenceKind::Call {
        if let Some(id) = constructor_heuristic(target_name, source_file, data, name_index) {
            return Some(id);
        }
    }

    let candidates = name_index.get(target_name)?;
    if candidates.is_empty() {
        return None;
    }

    // Same file.
    let same_file: Vec<SymbolId> = candidates
        .iter()
        .copied()
        .filter(|id| data.symbols[id].file_id == source_symbol.file_id)
        .collect();
    if !same_file.is_empty() {
        if same_file.len() > 1 {
            if let Some(parent) = source_symbol.parent.and_then(|p| data.symbols.get(&p)) {
                if let Some(best) = same_file
                    .iter()
                    .copied()
                    .find(|id| data.symbols[id].qualified_name.starts_with(&*parent.qualified_name))
                {
                    return Some(best);
                }
            }
        }
        return Some(same_file[0]);
    }

    // Same directory, preferring exported.
    let dir = parent_dir(&source_file.path);
    let same_dir: Vec<SymbolId> = candidates
        .iter()
        .copied()
        .filter(|id| {
            data.files
                .get(&data.symbols[id].file_id)
                .map(|f| parent_dir(&f.path) == dir)
                .unwrap_or(false)
        })
        .collect();
    if let Some(id) = prefer_exported(&same_dir, data) {
        return Some(id);
    }

    // Import-path-guided.
    if let Some(&import_path) = import_map.get(&(source_symbol.file_id, target_name)) {
        let normalized = normalize_import_path(import_path);
        let import_candidates: Vec<SymbolId> = candidates
            .iter()
            .copied()
            .filter(|id| {
                data.files
                    .get(&data.symbols[id].file_id)
                    .map(|f| f.path.ends_with(normalized.as_str()) || f.path.contains(normalized.as_str()))
                    .unwrap_or(false)
            })
            .collect();
        if let Some(id) = prefer_exported(&import_candidates, data) {
            return Some(id);
        }
    }

    // Global: prefer exported, else any.
    prefer_exported(candidates, data).or_else(|| candidates.first().copied())
}

fn prefer_exported(candidates: &[SymbolId], data: &IndexData) -> Option<SymbolId> {
    if candidates.is_empty() {
        return None;
    }
    candidates
        .iter()
        .copied()
        .find(|id| data.symbols.get(id).map(|s| s.is_exported).unwrap_or(false))
        .or_else(|| candidates.first().copied())
}

fn constructor_heuristic(
    target_name: &str,
    source_file: &crate::model::File,
    data: &IndexData,
    name_index: &HashMap<&str, Vec<SymbolId>>,
) -> Option<SymbolId> {
    if !target_name.chars().next().map(|c| c.is_uppercase()).unwrap_or(false) {
        return None;
    }
    let classes: Vec<SymbolId> = name_index
        .get(target_name)?
        .iter()
        .copied()
        .filter(|id| data.symbols.get(id).map(|s| s.kind == SymbolKind::Class).unwrap_or(false))
        .collect();
    if classes.is_empty() {
        return None;
    }
    if let Some(id) = classes.iter().copied().find(|id| {
        data.files
            .get(&data.symbols[id].file_id)
            .map(|f| f.path == source_file.path)
            .unwrap_or(false)
    }) {
        return Some(id);
    }
    let dir = parent_dir(&source_file.path);
    if let Some(id) = classes.iter().copied().find(|id| {
        data.files
            .get(&data.symbols[id].file_id)
            .map(|f| parent_dir(&f.path) == dir)
            .unwrap_or(false)
    }) {
        return Some(id);
    }
    classes.first().copied()
}

/// Aggregates resolved symbol edges into cross-file `FileEdge`s (spec
/// §4.4 "File-edge aggregation").
fn aggregate_file_edges(edges: &[Edge], data: &IndexData) -> Vec<FileEdge> {
    let mut counts: IndexMap<(FileId, FileId), u32> = IndexMap::new();
    for edge in edges {
        let (Some(src_sym), Some(tgt_sym)) = (data.symbols.get(&edge.source), data.symbols.get(&edge.target)) else {
            continue;
        };
        if src_sym.file_id == tgt_sym.file_id {
            continue;
        }
        *counts.entry((src_sym.file_id, tgt_sym.file_id)).or_insert(0) += 1;
    }
    let mut file_edges: Vec<FileEdge> = counts
        .into_iter()
        .map(|((src, tgt), count)| FileEdge::new(src, tgt, count))
        .collect();
    file_edges.sort_by_key(|fe| (fe.source_file.value(), fe.target_file.value()));
    file_edges
}
