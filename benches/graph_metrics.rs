//! Benchmarks the graph overlay's heavier algorithms (PageRank,
//! betweenness, Louvain) against synthetic call chains, since their cost
//! scales with project size in ways unit tests don't exercise.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use roam::graph::{communities, metrics, SymbolGraph};
use roam::model::{Edge, ReferenceKind};
use roam::store::IndexData;
use roam::types::{FileId, LineRange, SymbolId, SymbolKind, Visibility};

fn chain_index(n: u32) -> IndexData {
    let mut data = IndexData::new();
    let file_id = FileId::new(1).unwrap();
    data.files.insert(
        file_id,
        roam::model::File::new(file_id, "bench.js", "javascript", "hash", 0, n),
    );

    let ids: Vec<SymbolId> = (1..=n).map(|i| SymbolId::new(i).unwrap()).collect();
    for (i, &id) in ids.iter().enumerate() {
        let symbol = roam::model::Symbol::new(
            id,
            file_id,
            format!("fn{i}"),
            format!("fn{i}"),
            SymbolKind::Function,
            LineRange::new(i as u32 + 1, i as u32 + 1),
            Visibility::Public,
        );
        data.symbols.insert(id, symbol);
    }
    for window in ids.windows(2) {
        if let Some(edge) = Edge::new(window[0], window[1], ReferenceKind::Call, 1) {
            data.edges.push(edge);
        }
    }
    data
}

fn bench_metrics(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph_metrics");
    for size in [50u32, 200, 500] {
        let data = chain_index(size);
        let graph = SymbolGraph::build(&data);
        group.bench_with_input(BenchmarkId::new("compute_metrics", size), &graph, |b, graph| {
            b.iter(|| metrics::compute_metrics(graph));
        });
        group.bench_with_input(BenchmarkId::new("compute_communities", size), &graph, |b, graph| {
            b.iter(|| communities::compute_communities(graph));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_metrics);
criterion_main!(benches);
