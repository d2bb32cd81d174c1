//! Basic benchmarks for the `recycling_pool` package.

#![allow(
    missing_docs,
    reason = "No need for API documentation in benchmark code"
)]

use std::hint::black_box;
use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};
use recycling_pool::{NullSink, RecyclingPool, TypeTag};

criterion_group!(benches, entrypoint);
criterion_main!(benches);

const BUFFER_CAPACITY: usize = 4096;
const VEC: TypeTag = TypeTag::new("vec");

fn new_pool() -> RecyclingPool<Vec<u8>> {
    RecyclingPool::builder()
        .event_sink(Arc::new(NullSink::new()))
        .build()
}

fn entrypoint(c: &mut Criterion) {
    let mut group = c.benchmark_group("rp_lifecycle");

    group.bench_function("allocate_release", |b| {
        let pool = new_pool();

        b.iter(|| {
            let id = pool.allocate(Vec::with_capacity(BUFFER_CAPACITY));
            black_box(pool.decrease_ref(id)).unwrap();
            pool.clear_pooled();
        });
    });

    group.bench_function("reuse_release", |b| {
        let pool = new_pool();
        let id = pool.allocate(Vec::with_capacity(BUFFER_CAPACITY));
        pool.decrease_ref(id).unwrap();

        b.iter(|| {
            let id = pool
                .reuse(Some(VEC), BUFFER_CAPACITY)
                .expect("benchmark keeps one buffer pooled");
            black_box(pool.decrease_ref(id)).unwrap();
        });
    });

    group.bench_function("ref_count_round_trip", |b| {
        let pool = new_pool();
        let id = pool.allocate(Vec::with_capacity(BUFFER_CAPACITY));

        b.iter(|| {
            black_box(pool.increase_ref(id)).unwrap();
            black_box(pool.decrease_ref(id)).unwrap();
        });
    });

    group.finish();

    let mut lookup_group = c.benchmark_group("rp_reuse_lookup");

    lookup_group.bench_function("miss_with_many_buckets", |b| {
        let pool = RecyclingPool::<Vec<u64>>::builder()
            .event_sink(Arc::new(NullSink::new()))
            .build();

        // Fill the small and medium categories only, so every large request misses.
        for capacity in [1_usize, 4, 8, 16, 32, 64, 100] {
            let id = pool.allocate(Vec::with_capacity(capacity));
            pool.decrease_ref(id).unwrap();
        }

        b.iter(|| black_box(pool.reuse(None, black_box(1_000_000))));
    });

    lookup_group.finish();
}
