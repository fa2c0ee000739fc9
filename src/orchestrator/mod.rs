//! Coordinates one indexing run (spec §4.6): lock acquisition, hash-based
//! incremental classification, per-file parse/extract fan-out, reference
//! resolution, and graph-metrics/communities recomputation.

mod discovery;

use crate::config::Settings;
use crate::error::{Result, RoamError};
use crate::graph::{communities, metrics, SymbolGraph};
use crate::model::{Reference, Symbol};
use crate::parsing::coordinator::{self, FailureCounters};
use crate::parsing::{RawReference, RawSymbol};
use crate::resolver;
use crate::store::Store;
use crate::types::{FileId, SymbolId};
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

pub use discovery::DiscoveredFile;

/// Counters surfaced at the end of a run (spec §4.6, logged at `info`).
#[derive(Debug, Default, Clone, Copy)]
pub struct RunSummary {
    pub files_added: u32,
    pub files_modified: u32,
    pub files_removed: u32,
    pub files_unchanged: u32,
    pub symbols_indexed: u32,
    pub edges_resolved: u32,
    pub no_grammar: u32,
    pub parse_errors: u32,
    pub unreadable: u32,
}

pub struct Orchestrator {
    root: PathBuf,
    settings: Settings,
}

/// One file's extraction output, plus enough identity to insert it.
struct ExtractedFile {
    path: String,
    content_hash: Box<str>,
    mtime_unix: i64,
    language: &'static str,
    line_count: u32,
    symbols: Vec<RawSymbol>,
    references: Vec<RawReference>,
}

impl Orchestrator {
    pub fn new(root: impl Into<PathBuf>, settings: Settings) -> Self {
        Self {
            root: root.into(),
            settings,
        }
    }

    /// Runs one indexing pass end to end. `cancel` is polled at each
    /// stage boundary (spec §5); a set flag aborts the run before the
    /// final `Store::save`, leaving the prior snapshot untouched.
    pub fn run(&self, force: bool, cancel: &AtomicBool) -> Result<RunSummary> {
        let started = Instant::now();
        let mut store = Store::open(&self.root)?;
        store.begin_run()?;

        let outcome = self.run_locked(&mut store, force, cancel);
        store.end_run();

        match &outcome {
            Ok(summary) => tracing::info!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                added = summary.files_added,
                modified = summary.files_modified,
                removed = summary.files_removed,
                unchanged = summary.files_unchanged,
                symbols = summary.symbols_indexed,
                edges = summary.edges_resolved,
                "indexing run complete"
            ),
            Err(e) => tracing::warn!(error = %e, "indexing run aborted"),
        }
        outcome
    }

    fn check_cancelled(cancel: &AtomicBool) -> Result<()> {
        if cancel.load(Ordering::Relaxed) {
            return Err(RoamError::Invariant {
                reason: "indexing run cancelled".into(),
            });
        }
        Ok(())
    }

    fn run_locked(&self, store: &mut Store, force: bool, cancel: &AtomicBool) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        if force {
            store.reset();
        }

        let discovered = discovery::discover(&self.root, &self.settings)?;
        Self::check_cancelled(cancel)?;

        let existing: Vec<(Box<str>, FileId, Box<str>)> = store
            .data()
            .files
            .values()
            .map(|f| (f.path.clone(), f.id, f.content_hash.clone()))
            .collect();
        let discovered_paths: HashSet<&str> = discovered.iter().map(|d| d.path.as_str()).collect();

        let removed_ids: Vec<FileId> = existing
            .iter()
            .filter(|(path, _, _)| !discovered_paths.contains(&**path))
            .map(|(_, id, _)| *id)
            .collect();
        summary.files_removed = removed_ids.len() as u32;

        let mut added: Vec<&DiscoveredFile> = Vec::new();
        let mut modified: Vec<&DiscoveredFile> = Vec::new();
        let mut unchanged: Vec<&DiscoveredFile> = Vec::new();

        for file in &discovered {
            match existing.iter().find(|(path, _, _)| &**path == file.path) {
                None => added.push(file),
                Some((_, _, hash)) if &**hash != &*file.content_hash => modified.push(file),
                Some(_) => unchanged.push(file),
            }
        }
        summary.files_added = added.len() as u32;
        summary.files_modified = modified.len() as u32;
        summary.files_unchanged = unchanged.len() as u32;

        // Step 3: delete modified and removed file rows; symbols/edges cascade.
        for file_id in removed_ids {
            store.delete_file_cascade(file_id);
        }
        for file in &modified {
            if let Some(existing_file) = store.file_by_path(&file.path) {
                let id = existing_file.id;
                store.delete_file_cascade(id);
            }
        }
        Self::check_cancelled(cancel)?;

        // Steps 4-5: parse + extract added/modified files in parallel.
        let to_extract: Vec<&DiscoveredFile> = added.iter().chain(modified.iter()).copied().collect();
        let (extractions, counters) = extract_parallel(&to_extract);
        summary.no_grammar += counters.no_grammar;
        summary.parse_errors += counters.parse_error;
        summary.unreadable += counters.unreadable;
        Self::check_cancelled(cancel)?;

        // Step 4: insert files + symbols transactionally (sequential: ids
        // are assigned in order and each symbol's parent must already be
        // assigned by the time a later sibling references it).
        let mut per_file_references: Vec<(String, Vec<RawReference>)> = Vec::with_capacity(extractions.len());
        for extraction in extractions {
            let file_id = store.upsert_file(
                &extraction.path,
                extraction.language,
                &extraction.content_hash,
                extraction.mtime_unix,
                extraction.line_count,
            );
            let mut assigned: Vec<SymbolId> = Vec::with_capacity(extraction.symbols.len());
            for raw in &extraction.symbols {
                let parent = raw.parent_index.and_then(|i| assigned.get(i).copied());
                let id = store.insert_symbol(|id| build_symbol(id, file_id, raw, parent));
                assigned.push(id);
                summary.symbols_indexed += 1;
            }
            per_file_references.push((extraction.path, extraction.references));
        }
        Self::check_cancelled(cancel)?;

        let has_modified = !modified.is_empty();
        if has_modified {
            // Re-extract references from unchanged files too (spec §4.6
            // step 5): edges whose target lived in the modified files'
            // old symbols were just cascaded away and must be rebuilt.
            let (refs_only, unchanged_counters) = extract_references_only(&unchanged);
            summary.no_grammar += unchanged_counters.no_grammar;
            summary.parse_errors += unchanged_counters.parse_error;
            summary.unreadable += unchanged_counters.unreadable;
            per_file_references.extend(refs_only);

            store.clear_edges();
        }
        Self::check_cancelled(cancel)?;

        // Step 6: resolve references to edges.
        let all_references = build_references(&per_file_references);
        let (edges, file_edges) = resolver::resolve(&all_references, store.data());
        summary.edges_resolved = edges.len() as u32;
        store.batch_insert_edges(edges);
        store.batch_insert_file_edges(file_edges);
        Self::check_cancelled(cancel)?;

        // Steps 7-8: build the graph, compute metrics, detect and label
        // communities. Layers/cycles/paths are query-time overlays (spec
        // §4.6 only persists metrics/clusters) built on demand from the
        // same `SymbolGraph`.
        let graph = SymbolGraph::build(store.data());
        let graph_metrics = metrics::compute_metrics(&graph);
        let community_ids = communities::compute_communities(&graph);
        let clusters = communities::label_communities(&community_ids, store.data(), &graph_metrics);
        store.replace_metrics(graph_metrics);
        store.replace_clusters(clusters);

        store.save()?;
        Ok(summary)
    }
}

fn build_symbol(id: SymbolId, file_id: FileId, raw: &RawSymbol, parent: Option<SymbolId>) -> Symbol {
    let mut symbol = Symbol::new(
        id,
        file_id,
        raw.name.clone(),
        raw.qualified_name.clone(),
        raw.kind,
        raw.range,
        raw.visibility,
    )
    .with_signature(raw.signature.clone())
    .exported(raw.is_exported);
    if let Some(doc) = &raw.docstring {
        symbol = symbol.with_docstring(doc.clone());
    }
    if let Some(parent_id) = parent {
        symbol = symbol.with_parent(parent_id);
    }
    symbol
}

fn build_references(per_file: &[(String, Vec<RawReference>)]) -> Vec<Reference> {
    let mut out = Vec::new();
    for (path, raws) in per_file {
        for raw in raws {
            let mut reference = Reference::new(raw.target_name.clone(), raw.kind, raw.line).with_source_file(path.clone());
            if let Some(name) = &raw.source_name {
                reference = reference.with_source_name(name.clone());
            }
            if let Some(import_path) = &raw.import_path {
                reference = reference.with_import_path(import_path.clone());
            }
            out.push(reference);
        }
    }
    out
}

/// Parses and extracts every file in parallel (spec §5's two-pass
/// fan-out); a file that fails to read at all counts as `unreadable`
/// rather than any of the coordinator's own failure categories.
fn extract_parallel(files: &[&DiscoveredFile]) -> (Vec<ExtractedFile>, FailureCounters) {
    let results: Vec<(FailureCounters, Option<ExtractedFile>)> = files
        .par_iter()
        .map(|file| extract_with_counters(file))
        .collect();

    let mut total = FailureCounters::default();
    let mut extracted = Vec::with_capacity(results.len());
    for (counters, maybe) in results {
        total.no_grammar += counters.no_grammar;
        total.parse_error += counters.parse_error;
        total.unreadable += counters.unreadable;
        if let Some(file) = maybe {
            extracted.push(file);
        }
    }
    (extracted, total)
}

fn extract_with_counters(file: &DiscoveredFile) -> (FailureCounters, Option<ExtractedFile>) {
    let mut counters = FailureCounters::default();
    let Ok(bytes) = std::fs::read(&file.absolute) else {
        counters.unreadable += 1;
        return (counters, None);
    };
    let Some(extraction) = coordinator::extract_file(&file.path, &bytes, &mut counters) else {
        return (counters, None);
    };
    (
        counters,
        Some(ExtractedFile {
            path: file.path.clone(),
            content_hash: file.content_hash.clone(),
            mtime_unix: file.mtime_unix,
            language: extraction.language,
            line_count: extraction.line_count,
            symbols: extraction.result.symbols,
            references: extraction.result.references,
        }),
    )
}

fn extract_references_only(files: &[&DiscoveredFile]) -> (Vec<(String, Vec<RawReference>)>, FailureCounters) {
    let (extracted, counters) = extract_parallel(files);
    (
        extracted.into_iter().map(|e| (e.path, e.references)).collect(),
        counters,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    fn write(dir: &std::path::Path, name: &str, contents: &str) {
        std::fs::write(dir.join(name), contents).unwrap();
    }

    #[test]
    fn first_run_indexes_a_call_chain() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.js", "function a() { b(); }\n");
        write(dir.path(), "b.js", "export function b() {}\n");

        let orchestrator = Orchestrator::new(dir.path(), Settings::default());
        let cancel = AtomicBool::new(false);
        let summary = orchestrator.run(false, &cancel).unwrap();

        assert_eq!(summary.files_added, 2);
        assert!(summary.symbols_indexed >= 2);
        assert!(summary.edges_resolved >= 1);

        let store = Store::open(dir.path()).unwrap();
        assert!(store.file_by_path("a.js").is_some());
        assert_eq!(store.data().clusters.len(), store.data().symbols.len());
    }

    #[test]
    fn second_run_is_incremental_when_nothing_changed() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.js", "function a() {}\n");

        let orchestrator = Orchestrator::new(dir.path(), Settings::default());
        let cancel = AtomicBool::new(false);
        orchestrator.run(false, &cancel).unwrap();
        let second = orchestrator.run(false, &cancel).unwrap();

        assert_eq!(second.files_added, 0);
        assert_eq!(second.files_modified, 0);
        assert_eq!(second.files_unchanged, 1);
    }

    #[test]
    fn modifying_a_file_rebuilds_edges_from_unchanged_files_too() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.js", "function a() { b(); }\n");
        write(dir.path(), "b.js", "export function b() {}\n");

        let orchestrator = Orchestrator::new(dir.path(), Settings::default());
        let cancel = AtomicBool::new(false);
        orchestrator.run(false, &cancel).unwrap();

        write(dir.path(), "b.js", "export function b() { return 1; }\n");
        let second = orchestrator.run(false, &cancel).unwrap();

        assert_eq!(second.files_modified, 1);
        assert_eq!(second.files_unchanged, 1);
        assert!(second.edges_resolved >= 1);

        let store = Store::open(dir.path()).unwrap();
        assert_eq!(store.data().edges.len(), 1);
    }

    #[test]
    fn removing_a_file_cascades_its_symbols() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.js", "function a() {}\n");
        write(dir.path(), "b.js", "function b() {}\n");

        let orchestrator = Orchestrator::new(dir.path(), Settings::default());
        let cancel = AtomicBool::new(false);
        orchestrator.run(false, &cancel).unwrap();

        std::fs::remove_file(dir.path().join("b.js")).unwrap();
        let second = orchestrator.run(false, &cancel).unwrap();

        assert_eq!(second.files_removed, 1);
        let store = Store::open(dir.path()).unwrap();
        assert!(store.file_by_path("b.js").is_none());
    }

    #[test]
    fn force_rebuild_discards_prior_state() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.js", "function a() {}\n");

        let orchestrator = Orchestrator::new(dir.path(), Settings::default());
        let cancel = AtomicBool::new(false);
        orchestrator.run(false, &cancel).unwrap();
        let second = orchestrator.run(true, &cancel).unwrap();

        assert_eq!(second.files_added, 1);
        assert_eq!(second.files_unchanged, 0);
    }

    #[test]
    fn cancellation_flag_aborts_before_save() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.js", "function a() {}\n");

        let orchestrator = Orchestrator::new(dir.path(), Settings::default());
        let cancel = AtomicBool::new(true);
        let result = orchestrator.run(false, &cancel);
        assert!(result.is_err());
    }
}
