//! Benchmarks for catalog building, compilation, and resolution.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use seshat::atom::ScopeAtom;
use seshat::catalog::{Catalog, CatalogOptions};
use seshat::descriptor::ScopeToken;
use seshat::engine::{ResolveOptions, ScopeEngine, ScopeRequest};
use seshat::memory::MemoryWorkspace;
use seshat::workspace::FileKey;

fn bench_workspace(modules: usize, files_per_module: usize) -> MemoryWorkspace {
    let mut builder = MemoryWorkspace::builder();
    for m in 0..modules {
        let files: Vec<String> = (0..files_per_module)
            .map(|f| format!("file:///proj/mod{m}/src/file{f}.rs"))
            .collect();
        let refs: Vec<&str> = files.iter().map(String::as_str).collect();
        builder = builder.module(&format!("mod{m}"), &refs);
    }
    builder
        .holder("settings", &[("Generated", &["**/generated/**"])])
        .build()
        .unwrap()
}

fn bench_request() -> ScopeRequest {
    ScopeRequest {
        atoms: vec![
            ScopeAtom::standard("a", "ProjectFiles"),
            ScopeAtom::ad_hoc_pattern("b", "**/src/**"),
            ScopeAtom::named_pattern_in("c", "Generated", "settings"),
        ],
        tokens: vec![
            ScopeToken::push("a"),
            ScopeToken::push("b"),
            ScopeToken::And,
            ScopeToken::push("c"),
            ScopeToken::Not,
            ScopeToken::And,
        ],
    }
}

fn bench_catalog_build(c: &mut Criterion) {
    let workspace = bench_workspace(50, 20);
    c.bench_function("catalog_build_50x20", |bench| {
        bench.iter(|| black_box(Catalog::build(&workspace, &CatalogOptions::default()).len()))
    });
}

fn bench_compile(c: &mut Criterion) {
    let engine = ScopeEngine::new(Arc::new(bench_workspace(50, 20)));
    let request = bench_request();
    c.bench_function("compile_3_atoms", |bench| {
        bench.iter(|| black_box(engine.compile(&request, &ResolveOptions::strict()).unwrap()))
    });
}

fn bench_resolve_and_sweep(c: &mut Criterion) {
    let engine = ScopeEngine::new(Arc::new(bench_workspace(50, 20)));
    let descriptor = engine
        .compile(&bench_request(), &ResolveOptions::strict())
        .unwrap();
    let files: Vec<FileKey> = (0..50)
        .flat_map(|m| (0..20).map(move |f| FileKey::new(format!("file:///proj/mod{m}/src/file{f}.rs"))))
        .collect();
    c.bench_function("resolve_and_sweep_1000", |bench| {
        bench.iter(|| {
            let scope = engine.resolve(&descriptor, false).unwrap();
            let hits = files.iter().filter(|f| scope.predicate.contains(f)).count();
            black_box(hits)
        })
    });
}

criterion_group!(benches, bench_catalog_build, bench_compile, bench_resolve_and_sweep);
criterion_main!(benches);
