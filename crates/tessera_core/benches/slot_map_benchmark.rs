//! # Slot Map Benchmark
//!
//! Insert, lookup and erase churn on both slot map flavours.
//!
//! Run with: `cargo bench --package tessera_core --bench slot_map_benchmark`

// Benchmarks don't need docs
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tessera_core::{ChunkSlotMap, SlotKey, SlotMap};

const CHUNK: usize = 4096;

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");

    for count in [1_000, 100_000] {
        group.bench_with_input(BenchmarkId::new("flat", count), &count, |b, &count| {
            b.iter(|| {
                let mut map = SlotMap::new();
                for i in 0..count {
                    black_box(map.insert(i));
                }
                map.len()
            });
        });

        group.bench_with_input(BenchmarkId::new("chunked", count), &count, |b, &count| {
            b.iter(|| {
                let mut map: ChunkSlotMap<i32> = ChunkSlotMap::default();
                for i in 0..count {
                    black_box(map.insert(i));
                }
                map.len()
            });
        });
    }

    group.finish();
}

fn bench_lookup(c: &mut Criterion) {
    let mut flat = SlotMap::new();
    let mut chunked: ChunkSlotMap<u64> = ChunkSlotMap::new(CHUNK).unwrap();
    let keys: Vec<(SlotKey, SlotKey)> = (0..100_000_u64)
        .map(|i| (flat.insert(i), chunked.insert(i)))
        .collect();

    c.bench_function("lookup_flat_100K", |b| {
        b.iter(|| {
            let mut sum = 0_u64;
            for (key, _) in &keys {
                sum += flat.try_get(*key).copied().unwrap_or(0);
            }
            black_box(sum)
        });
    });

    c.bench_function("lookup_chunked_100K", |b| {
        b.iter(|| {
            let mut sum = 0_u64;
            for (_, key) in &keys {
                sum += chunked.try_get(*key).copied().unwrap_or(0);
            }
            black_box(sum)
        });
    });
}

fn bench_iterate(c: &mut Criterion) {
    let mut flat = SlotMap::new();
    let mut chunked: ChunkSlotMap<u64> = ChunkSlotMap::default();
    for i in 0..100_000_u64 {
        flat.insert(i);
        chunked.insert(i);
    }

    c.bench_function("iterate_flat_100K", |b| {
        b.iter(|| black_box(flat.iter().sum::<u64>()));
    });

    c.bench_function("iterate_chunked_100K", |b| {
        b.iter(|| black_box(chunked.iter().sum::<u64>()));
    });
}

/// Erase every other key, then refill the holes.
fn bench_churn(c: &mut Criterion) {
    let mut flat = SlotMap::new();
    let mut flat_keys: Vec<SlotKey> = (0..100_000_u32).map(|i| flat.insert(i)).collect();

    c.bench_function("churn_flat_50K", |b| {
        b.iter(|| {
            for key in flat_keys.iter_mut().step_by(2) {
                flat.erase(*key);
                *key = flat.insert(key.index());
            }
            black_box(flat.len())
        });
    });

    let mut chunked: ChunkSlotMap<u32> = ChunkSlotMap::default();
    let mut chunked_keys: Vec<SlotKey> = (0..100_000_u32).map(|i| chunked.insert(i)).collect();

    c.bench_function("churn_chunked_50K", |b| {
        b.iter(|| {
            for key in chunked_keys.iter_mut().step_by(2) {
                chunked.erase(*key);
                *key = chunked.insert(key.index());
            }
            black_box(chunked.len())
        });
    });
}

criterion_group!(benches, bench_insert, bench_lookup, bench_iterate, bench_churn);
criterion_main!(benches);
