//! Folder query benchmarks.
//!
//! Compares the flat `ParentID` query, which scans the whole root
//! collection, with the subcollection listing, which only visits the
//! parent's children.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use folderdb_bench::utils::{bench_store, drain_all, populate, BENCH_PARENT};
use folderdb_core::{drain, FolderHierarchy};

/// Benchmark both query shapes as the unrelated noise grows.
fn bench_parent_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("parent_queries");
    let matching = 200;

    for noise in [0, 2_000, 20_000].iter() {
        let store = bench_store(300);
        let folders = FolderHierarchy::open(&store).unwrap();
        let parent = populate(&folders, matching, *noise);
        group.throughput(Throughput::Elements(matching as u64));

        group.bench_with_input(BenchmarkId::new("flat", noise), noise, |b, _| {
            b.iter(|| drain_all(folders.query_by_parent(black_box(BENCH_PARENT)).unwrap()));
        });

        group.bench_with_input(BenchmarkId::new("nested", noise), noise, |b, _| {
            b.iter(|| drain_all(folders.list_children(black_box(&parent)).unwrap()));
        });
    }
    group.finish();
}

/// Benchmark the effect of page size on a full drain.
fn bench_page_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("page_size");

    for page_size in [10, 100, 300, 1_000].iter() {
        let store = bench_store(*page_size);
        let folders = FolderHierarchy::open(&store).unwrap();
        populate(&folders, 1_000, 0);

        group.bench_with_input(
            BenchmarkId::from_parameter(page_size),
            page_size,
            |b, _| {
                b.iter(|| drain("bench", folders.list_roots().unwrap(), 0).unwrap());
            },
        );
    }
    group.finish();
}

/// Benchmark the descendant walk over a two-level tree.
fn bench_descendants(c: &mut Criterion) {
    let store = bench_store(300);
    let folders = FolderHierarchy::open(&store).unwrap();
    let parent = populate(&folders, 50, 0);
    for child in folders.descendants(&parent, Some(1)).unwrap() {
        folders
            .seed_random(&folderdb_core::SeedPlan::nested(Some(child.stored.path), 10))
            .unwrap();
    }

    c.bench_function("descendants", |b| {
        b.iter(|| folders.descendants(black_box(&parent), None).unwrap().len());
    });
}

criterion_group!(benches, bench_parent_queries, bench_page_size, bench_descendants);
criterion_main!(benches);
