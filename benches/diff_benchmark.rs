//! Benchmarks for the diff engine.

use criterion::{criterion_group, criterion_main, Criterion};
use poldiff::diff::{Category, CategoryMask, DiffSession, RemapEntry, TypeMap, TypeRename};
use poldiff::model::{Policy, PolicyBuilder};
use std::hint::black_box;

fn policy(name: &str, renamed: bool) -> Policy {
    let mut builder = PolicyBuilder::new(name)
        .class("file", None, &["read", "write", "getattr", "open"])
        .attribute("domain")
        .boolean("allow_exec", false);
    for i in 0..50 {
        let ty = if renamed && i == 0 {
            "renamed_t".to_string()
        } else {
            format!("type{i}_t")
        };
        builder = builder.type_(&ty, &["domain"]);
    }
    builder = builder
        .allow("domain", "domain", "file", &["read", "getattr"])
        .when(&["allow_exec"], true)
        .allow("type1_t", "type2_t", "file", &["open"]);
    builder.build().unwrap_or_else(|e| panic!("benchmark policy: {e}"))
}

fn bench_type_map(c: &mut Criterion) {
    let original = policy("orig", false);
    let modified = policy("mod", true);
    let renames = [TypeRename::new("type0_t", "renamed_t")];
    let remaps: Vec<RemapEntry> = renames.iter().map(RemapEntry::from).collect();

    c.bench_function("type_map_50_types", |b| {
        b.iter(|| black_box(TypeMap::build(black_box(&original), black_box(&modified), &remaps)))
    });
}

fn bench_attribute_expansion(c: &mut Criterion) {
    let original = policy("orig", false);
    let modified = policy("mod", true);

    c.bench_function("av_allow_attribute_expansion", |b| {
        b.iter(|| {
            let mut session = DiffSession::new(&original, &modified, &[]).unwrap_or_else(|e| panic!("{e}"));
            let _ = session.run(CategoryMask::AVALLOW);
            black_box(session.stats(Category::AvAllow).map(|s| s.total()))
        })
    });
}

criterion_group!(benches, bench_type_map, bench_attribute_expansion);
criterion_main!(benches);
