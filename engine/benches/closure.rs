//! Benchmarks for the closure stage and a full determination run.
//!
//! Measures the rule reasoner on each shipped fixture graph, and the whole
//! pipeline from inline sources to a built record.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use arco_engine::graph::store;
use arco_engine::{
    fixtures, run_determination, ClosureService, Engines, FactSource, ReasonerKind, RuleReasoner,
    RunConfig,
};

// ============================================================================
// Fixture graphs
// ============================================================================

fn profiles() -> Vec<(&'static str, &'static str, Vec<FactSource>)> {
    vec![
        ("sentinel", fixtures::SENTINEL_SYSTEM, fixtures::sentinel_sources()),
        ("claude3", fixtures::CLAUDE3_SYSTEM, fixtures::claude3_sources()),
        ("helpdesk", fixtures::HELPDESK_SYSTEM, fixtures::helpdesk_sources()),
    ]
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_closure(c: &mut Criterion) {
    let mut group = c.benchmark_group("closure");
    let reasoner = RuleReasoner::new();
    for (name, _, sources) in profiles() {
        let Ok(asserted) = store::load(&sources) else {
            continue;
        };
        group.throughput(Throughput::Elements(asserted.len() as u64));
        group.bench_with_input(BenchmarkId::new("owl-rl", name), &asserted, |b, g| {
            b.iter(|| {
                let mut reasoned = g.clone();
                black_box(reasoner.expand(&mut reasoned).ok());
                reasoned
            });
        });
    }
    group.finish();
}

fn bench_determination(c: &mut Criterion) {
    let mut group = c.benchmark_group("determination");
    let engines = Engines::builtin(ReasonerKind::OwlRl);
    for (name, system, sources) in profiles() {
        let config = RunConfig::new(system, sources, fixtures::shapes(), "2026-01-01T00:00:00Z");
        group.bench_function(name, |b| {
            b.iter(|| black_box(run_determination(black_box(&config), &engines).ok()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_closure, bench_determination);
criterion_main!(benches);
