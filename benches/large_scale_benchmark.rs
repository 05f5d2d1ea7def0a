use criterion::{BatchSize, Criterion, Throughput, criterion_group, criterion_main};
use prsort::prelude::*;
use rand::Rng;
use std::hint::black_box;
use std::time::Duration;

#[derive(Clone, Copy)]
struct Record {
    key: u64,
    payload: u64,
}

fn bench_10m_records(c: &mut Criterion) {
    let mut group = c.benchmark_group("10M Records");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(60)); // Increase time for large sort setup overhead

    // Dataset generation: 10M * 16 bytes = 160MB
    let mut rng = rand::rng();
    let count = 10_000_000;
    let input: Vec<Record> = (0..count as u64)
        .map(|payload| Record {
            key: rng.random(),
            payload,
        })
        .collect();

    group.throughput(Throughput::Bytes((count * size_of::<Record>()) as u64));

    let config = SortConfig::default();
    let threads = config.threads;

    group.bench_function("msd radix_sort_by", |b| {
        b.iter_batched(
            || input.clone(),
            |mut data| {
                radix_sort_by(
                    black_box(&mut data),
                    |r: &Record, d| r.key.msd_digit::<u8>(d),
                    |a: &Record, b: &Record| a.key.cmp(&b.key).then(a.payload.cmp(&b.payload)),
                    8,
                    &config,
                )
                .unwrap()
            },
            BatchSize::LargeInput,
        )
    });

    group.bench_function("msd radix_sort_by (16-bit digits)", |b| {
        b.iter_batched(
            || input.clone(),
            |mut data| {
                radix_sort_by(
                    black_box(&mut data),
                    |r: &Record, d| r.key.msd_digit::<u16>(d),
                    |a: &Record, b: &Record| a.key.cmp(&b.key).then(a.payload.cmp(&b.payload)),
                    4,
                    &config,
                )
                .unwrap()
            },
            BatchSize::LargeInput,
        )
    });

    group.bench_function("lsd write-back", |b| {
        b.iter_batched(
            || input.clone(),
            |mut data| lsd_radix_sort_write_back(black_box(&mut data), |r: &Record| r.key, threads).unwrap(),
            BatchSize::LargeInput,
        )
    });

    group.bench_function("lsd cached", |b| {
        b.iter_batched(
            || input.clone(),
            |mut data| lsd_radix_sort_cached(black_box(&mut data), |r: &Record| r.key, threads).unwrap(),
            BatchSize::LargeInput,
        )
    });

    // Std Sort Unstable
    group.bench_function("slice::sort_unstable_by_key", |b| {
        b.iter_batched(
            || input.clone(),
            |mut data| data.sort_unstable_by_key(|r| r.key),
            BatchSize::LargeInput,
        )
    });

    group.finish();
}

criterion_group!(benches, bench_10m_records);
criterion_main!(benches);
