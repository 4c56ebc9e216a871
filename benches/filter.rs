//! Filter benchmarks.
//!
//! # Scenarios
//!
//! 1. **Insert / query by size**: single-key latency for 1K to 1M capacity
//! 2. **Hashing by key length**: cost of `hash_pair` across block boundaries
//! 3. **Bulk operations**: popcount / union / clear per backend
//! 4. **Concurrent inserts**: throughput with 1 to 8 writer threads

use std::sync::Arc;
use std::thread;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use linebloom::hash::hash_pair;
use linebloom::{BackendKind, CacheBloomFilter, FilterBuilder};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SIZES: &[u64] = &[1_000, 10_000, 100_000, 1_000_000];

fn bench_insert_by_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_by_size");
    group.throughput(Throughput::Elements(1));

    for &size in SIZES {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let filter = CacheBloomFilter::new(size, 0.01).unwrap();
            let mut key = 0u64;
            b.iter(|| {
                filter.add_u64(black_box(key));
                key = key.wrapping_add(1);
            });
        });
    }
    group.finish();
}

fn bench_query_by_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_by_size");
    group.throughput(Throughput::Elements(1));

    for &size in SIZES {
        let filter = CacheBloomFilter::new(size, 0.01).unwrap();
        for i in 0..size / 2 {
            filter.add_u64(i);
        }
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let mut key = 0u64;
            b.iter(|| {
                black_box(filter.contains_u64(black_box(key)));
                key = (key + 1) % size;
            });
        });
    }
    group.finish();
}

fn bench_hash_by_length(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash_pair");
    let mut rng = StdRng::seed_from_u64(1);

    for len in [8usize, 31, 32, 64, 256, 4096] {
        let data: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
        group.throughput(Throughput::Bytes(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &data, |b, data| {
            b.iter(|| black_box(hash_pair(black_box(data))));
        });
    }
    group.finish();
}

fn bench_bulk_ops(c: &mut Criterion) {
    let mut group = c.benchmark_group("bulk_ops");

    for kind in BackendKind::ALL {
        let build = || {
            FilterBuilder::new()
                .expected_items(1_000_000)
                .false_positive_rate(0.01)
                .backend(kind)
                .build()
        };
        let (Ok(mut left), Ok(right)) = (build(), build()) else {
            continue;
        };
        for i in 0..500_000u64 {
            left.add_u64(i);
            right.add_u64(i + 500_000);
        }
        group.throughput(Throughput::Bytes(left.cache_line_count() as u64 * 64));

        group.bench_function(BenchmarkId::new("pop_count", kind), |b| {
            b.iter(|| black_box(left.pop_count()));
        });
        group.bench_function(BenchmarkId::new("union", kind), |b| {
            b.iter(|| left.union(black_box(&right)).unwrap());
        });
        group.bench_function(BenchmarkId::new("clear", kind), |b| {
            b.iter(|| left.clear());
        });
    }
    group.finish();
}

fn bench_concurrent_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_insert");
    const PER_THREAD: u64 = 10_000;

    for threads in [1u64, 2, 4, 8] {
        group.throughput(Throughput::Elements(threads * PER_THREAD));
        group.bench_with_input(BenchmarkId::from_parameter(threads), &threads, |b, &threads| {
            b.iter(|| {
                let filter = Arc::new(CacheBloomFilter::new(threads * PER_THREAD, 0.01).unwrap());
                let handles: Vec<_> = (0..threads)
                    .map(|t| {
                        let filter = Arc::clone(&filter);
                        thread::spawn(move || {
                            for i in 0..PER_THREAD {
                                filter.add_u64(t * PER_THREAD + i);
                            }
                        })
                    })
                    .collect();
                for handle in handles {
                    handle.join().unwrap();
                }
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_insert_by_size,
    bench_query_by_size,
    bench_hash_by_length,
    bench_bulk_ops,
    bench_concurrent_insert
);
criterion_main!(benches);
