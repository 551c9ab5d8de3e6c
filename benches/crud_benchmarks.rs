use bptree_index::BPlusTree;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::collections::BTreeMap;
use std::hint::black_box;

const N: usize = 10_000;

/// Branching factors compared against `BTreeMap`.
const ORDERS: [usize; 3] = [4, 32, 128];

// ─── Helper functions to generate key sequences ─────────────────────────────

fn ordered_keys(n: usize) -> Vec<i64> {
    (0..n as i64).collect()
}

fn random_keys(n: usize) -> Vec<i64> {
    // Use a simple LCG for deterministic pseudo-random sequence
    let mut keys = Vec::with_capacity(n);
    let mut x: u64 = 12345;
    for _ in 0..n {
        x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
        keys.push((x >> 33) as i64);
    }
    keys
}

fn build_index(order: usize, keys: &[i64]) -> BPlusTree<i64, i64> {
    let mut index = BPlusTree::with_order(order).unwrap();
    for &k in keys {
        index.insert(k, k);
    }
    index
}

fn build_btree(keys: &[i64]) -> BTreeMap<i64, i64> {
    keys.iter().map(|&k| (k, k)).collect()
}

// ─── Benchmarks ─────────────────────────────────────────────────────────────

fn bench_insert(c: &mut Criterion) {
    for (name, keys) in [("insert_ordered", ordered_keys(N)), ("insert_random", random_keys(N))] {
        let mut group = c.benchmark_group(name);

        for order in ORDERS {
            group.bench_function(BenchmarkId::new("BPlusTree", order), |b| {
                b.iter(|| build_index(order, black_box(&keys)));
            });
        }
        group.bench_function(BenchmarkId::new("BTreeMap", N), |b| {
            b.iter(|| build_btree(black_box(&keys)));
        });

        group.finish();
    }
}

fn bench_search(c: &mut Criterion) {
    let keys = random_keys(N);
    let mut group = c.benchmark_group("search_random");

    for order in ORDERS {
        let index = build_index(order, &keys);
        group.bench_function(BenchmarkId::new("BPlusTree", order), |b| {
            b.iter(|| {
                for k in &keys {
                    black_box(index.search(k));
                }
            });
        });
    }
    let map = build_btree(&keys);
    group.bench_function(BenchmarkId::new("BTreeMap", N), |b| {
        b.iter(|| {
            for k in &keys {
                black_box(map.get(k));
            }
        });
    });

    group.finish();
}

fn bench_delete(c: &mut Criterion) {
    let keys = random_keys(N);
    let mut group = c.benchmark_group("delete_random");

    for order in ORDERS {
        let index = build_index(order, &keys);
        group.bench_function(BenchmarkId::new("BPlusTree", order), |b| {
            b.iter_batched(
                || index.clone(),
                |mut index| {
                    for k in &keys {
                        index.delete(k);
                    }
                    index
                },
                criterion::BatchSize::LargeInput,
            );
        });
    }
    let map = build_btree(&keys);
    group.bench_function(BenchmarkId::new("BTreeMap", N), |b| {
        b.iter_batched(
            || map.clone(),
            |mut map| {
                for k in &keys {
                    map.remove(k);
                }
                map
            },
            criterion::BatchSize::LargeInput,
        );
    });

    group.finish();
}

fn bench_range_scan(c: &mut Criterion) {
    let keys = ordered_keys(N);
    let (low, high) = (N as i64 / 4, N as i64 * 3 / 4);
    let mut group = c.benchmark_group("range_scan_half");

    for order in ORDERS {
        let index = build_index(order, &keys);
        group.bench_function(BenchmarkId::new("BPlusTree", order), |b| {
            b.iter(|| index.range_scan(black_box(&low), black_box(&high)).map(|(_, v)| *v).sum::<i64>());
        });
    }
    let map = build_btree(&keys);
    group.bench_function(BenchmarkId::new("BTreeMap", N), |b| {
        b.iter(|| map.range(black_box(low)..=black_box(high)).map(|(_, v)| *v).sum::<i64>());
    });

    group.finish();
}

fn bench_ascending_values(c: &mut Criterion) {
    let keys = random_keys(N);
    let mut group = c.benchmark_group("ascending_values");

    for order in ORDERS {
        let index = build_index(order, &keys);
        group.bench_function(BenchmarkId::new("BPlusTree", order), |b| {
            b.iter(|| index.ascending_values().copied().sum::<i64>());
        });
    }
    let map = build_btree(&keys);
    group.bench_function(BenchmarkId::new("BTreeMap", N), |b| {
        b.iter(|| map.values().copied().sum::<i64>());
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_insert,
    bench_search,
    bench_delete,
    bench_range_scan,
    bench_ascending_values
);
criterion_main!(benches);
