//! End-to-end scenarios exercised against the Orchestrator as a black
//! box, writing real file trees under a temp directory.

use roam::graph::{cycles, layers, paths, SymbolGraph};
use roam::model::ReferenceKind;
use roam::orchestrator::Orchestrator;
use roam::{Settings, Store};
use std::path::Path;
use std::sync::atomic::AtomicBool;

fn write(dir: &Path, name: &str, contents: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}

fn index(dir: &Path) -> Store {
    let orchestrator = Orchestrator::new(dir, Settings::default());
    let cancel = AtomicBool::new(false);
    orchestrator.run(false, &cancel).unwrap();
    Store::open(dir).unwrap()
}

#[test]
fn javascript_call_chain_has_a_three_hop_path_and_unit_indegree() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.js", "function a() { b(); }\n");
    write(dir.path(), "b.js", "function b() { c(); }\n");
    write(dir.path(), "c.js", "function c() {}\n");

    let store = index(dir.path());
    let data = store.data();

    let a = data.symbols_by_name("a")[0].id;
    let b = data.symbols_by_name("b")[0].id;
    let c = data.symbols_by_name("c")[0].id;

    assert!(data.edges.iter().any(|e| e.source == a && e.target == b));
    assert!(data.edges.iter().any(|e| e.source == b && e.target == c));
    assert_eq!(data.edges_to(c).len(), 1);

    let graph = SymbolGraph::build(data);
    let path = paths::shortest_path(&graph, a, c).expect("path exists");
    assert_eq!(path.len(), 3);
}

#[test]
fn vue_template_binding_resolves_to_script_scope_owner() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "Comp.vue",
        "<template>\n<button @click=\"handleClick\">go</button>\n</template>\n<script setup>\nfunction handleClick() {}\n</script>\n",
    );

    let store = index(dir.path());
    let data = store.data();
    let handler = data.symbols_by_name("handleClick")[0].id;

    let incoming = data.edges_to(handler);
    assert!(!incoming.is_empty());
    assert!(incoming.iter().any(|e| e.kind == ReferenceKind::Template));
}

#[test]
fn salesforce_lwc_imports_apex_method_with_two_call_edges() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "classes/CloudinaryService.cls",
        "public class CloudinaryService {\n    public static void uploadImage() {}\n}\n",
    );
    write(
        dir.path(),
        "lwc/cloudinaryUpload/cloudinaryUpload.js",
        "import uploadImage from '@salesforce/apex/CloudinaryService.uploadImage';\nexport default class CloudinaryUpload {}\n",
    );

    let store = index(dir.path());
    let data = store.data();

    let lwc_class = data.symbols_by_name("CloudinaryUpload")[0].id;
    let method = data.symbols_by_qualified_name("CloudinaryService.uploadImage")[0].id;
    let class = data.symbols_by_name("CloudinaryService")[0].id;

    let outgoing: Vec<_> = data
        .edges
        .iter()
        .filter(|e| e.source == lwc_class && e.kind == ReferenceKind::Call)
        .collect();
    assert!(outgoing.iter().any(|e| e.target == method));
    assert!(outgoing.iter().any(|e| e.target == class));
}

#[test]
fn three_file_cycle_is_reported_as_one_scc_of_size_three() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "x.js", "function x() { y(); }\n");
    write(dir.path(), "y.js", "function y() { z(); }\n");
    write(dir.path(), "z.js", "function z() { x(); }\n");

    let store = index(dir.path());
    let graph = SymbolGraph::build(store.data());
    let sccs = cycles::compute_cycles(&graph);

    assert_eq!(sccs.len(), 1);
    assert_eq!(sccs[0].len(), 3);
}

#[test]
fn cross_layer_edge_is_flagged_as_a_violation() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "util.js", "export function util() {}\n");
    write(dir.path(), "core.js", "import { util } from './util.js';\nexport function core() { util(); }\n");
    write(
        dir.path(),
        "ui.js",
        "import { core } from './core.js';\nimport { util } from './util.js';\nexport function ui() { core(); util(); }\n",
    );

    let store = index(dir.path());
    let graph = SymbolGraph::build(store.data());
    let layer_by_symbol = layers::compute_layers(&graph);
    let violations = layers::layer_violations(&graph, &layer_by_symbol);

    let data = store.data();
    let util = data.symbols_by_name("util")[0].id;
    let ui = data.symbols_by_name("ui")[0].id;

    assert!(violations
        .iter()
        .any(|v| v.source == util && v.target == ui && v.source_layer < v.target_layer));
}

#[test]
fn incremental_rebuild_matches_a_forced_full_rebuild() {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..100 {
        write(
            dir.path(),
            &format!("file{i}.js"),
            &format!("function fn{i}() {{ fn{}(); }}\n", (i + 1) % 100),
        );
    }

    let orchestrator = Orchestrator::new(dir.path(), Settings::default());
    let cancel = AtomicBool::new(false);
    orchestrator.run(false, &cancel).unwrap();

    write(dir.path(), "file0.js", "function fn0() { fn1(); /* touched */ }\n");
    orchestrator.run(false, &cancel).unwrap();
    let incremental = snapshot_tuples(dir.path());

    orchestrator.run(true, &cancel).unwrap();
    let forced = snapshot_tuples(dir.path());

    assert_eq!(incremental, forced);
}

fn snapshot_tuples(dir: &Path) -> (Vec<(String, String, String, String, u32)>, Vec<(String, String, String, u32)>) {
    let store = Store::open(dir).unwrap();
    let data = store.data();

    let mut symbol_tuples: Vec<_> = data
        .symbols
        .values()
        .map(|s| {
            let path = data.files[&s.file_id].path.to_string();
            (path, s.name.to_string(), s.qualified_name.to_string(), format!("{:?}", s.kind), s.range.start_line)
        })
        .collect();
    symbol_tuples.sort();

    let mut edge_tuples: Vec<_> = data
        .edges
        .iter()
        .map(|e| {
            let source = &data.symbols[&e.source].qualified_name;
            let target = &data.symbols[&e.target].qualified_name;
            (source.to_string(), target.to_string(), format!("{:?}", e.kind), e.line)
        })
        .collect();
    edge_tuples.sort();

    (symbol_tuples, edge_tuples)
}
