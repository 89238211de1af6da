//! Performance benchmarks for large policies.
//!
//! Run with: cargo bench --bench large_policy
//!
//! Policies are generated with one attribute per ten types, so attribute
//! expansion dominates the rule categories.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use poldiff::diff::{CategoryMask, DiffSession, TypeRename};
use poldiff::model::{Policy, PolicyBuilder};
use std::hint::black_box;

/// Generate a policy with `count` types and a rule per type.
fn generate_policy(prefix: &str, count: usize, changed: usize) -> Policy {
    let mut builder = PolicyBuilder::new(prefix)
        .class("file", None, &["read", "write", "getattr", "open", "create"])
        .class("process", None, &["transition", "signal"])
        .role("object_r", &[]);
    for group in 0..count.div_ceil(10) {
        builder = builder.attribute(&format!("group{group}"));
    }
    for i in 0..count {
        let name = if i < changed {
            format!("{prefix}_type{i}_t")
        } else {
            format!("type{i}_t")
        };
        builder = builder.type_(&name, &[&format!("group{}", i / 10)]);
    }
    for i in 0..count {
        let name = if i < changed {
            format!("{prefix}_type{i}_t")
        } else {
            format!("type{i}_t")
        };
        let group = format!("group{}", (i + 1) % count.div_ceil(10));
        let perms: &[&str] = if i < changed { &["read", "write"] } else { &["read"] };
        builder = builder
            .allow(&name, &group, "file", perms)
            .type_transition(&name, &group, "file", &name);
    }
    builder
        .build()
        .unwrap_or_else(|e| panic!("generated policy: {e}"))
}

/// Generate two related policies with `change_percent` of types renamed.
fn generate_policy_pair(size: usize, change_percent: usize) -> (Policy, Policy) {
    let changed = size * change_percent / 100;
    (
        generate_policy("old", size, changed),
        generate_policy("new", size, changed),
    )
}

fn run_all(original: &Policy, modified: &Policy, renames: &[TypeRename]) -> usize {
    let mut session =
        DiffSession::new(original, modified, renames).unwrap_or_else(|e| panic!("session: {e}"));
    let _ = session.run(CategoryMask::ALL);
    session.stats_for(CategoryMask::ALL).total()
}

fn bench_diff_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("diff_scaling");

    for size in [100, 500, 1000, 2000] {
        let (old, new) = generate_policy_pair(size, 10);
        group.bench_with_input(BenchmarkId::new("all_categories", size), &size, |b, _| {
            b.iter(|| black_box(run_all(black_box(&old), black_box(&new), &[])));
        });
    }

    group.finish();
}

fn bench_renames(c: &mut Criterion) {
    let mut group = c.benchmark_group("renames");

    let (old, new) = generate_policy_pair(1000, 10);
    let renames: Vec<TypeRename> = (0..100)
        .map(|i| TypeRename::new(format!("old_type{i}_t"), format!("new_type{i}_t")))
        .collect();

    group.bench_function("without_renames", |b| {
        b.iter(|| black_box(run_all(black_box(&old), black_box(&new), &[])));
    });
    group.bench_function("with_renames", |b| {
        b.iter(|| black_box(run_all(black_box(&old), black_box(&new), &renames)));
    });

    group.finish();
}

fn bench_single_category(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_category");
    let (old, new) = generate_policy_pair(1000, 10);

    for (label, mask) in [
        ("types", CategoryMask::TYPES),
        ("av_allow", CategoryMask::AVALLOW),
        ("te_rules", CategoryMask::TERULES),
    ] {
        group.bench_function(label, |b| {
            b.iter(|| {
                let mut session =
                    DiffSession::new(&old, &new, &[]).unwrap_or_else(|e| panic!("session: {e}"));
                let _ = session.run(mask);
                black_box(session.stats_for(mask).total())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_diff_scaling, bench_renames, bench_single_category);
criterion_main!(benches);
