//! Search-engine benchmarks: a cold sweep over small multipliers,
//! the same sweep against a warm cache, and one large constant.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use mulseq::{MultSearch, DEFAULT_PROFILE};

fn bench_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("sweep_2_to_500");
    group.bench_function("cold", |b| {
        b.iter(|| {
            let mut engine = MultSearch::new(DEFAULT_PROFILE);
            for n in 2..=500i64 {
                engine.find_sequence(black_box(n)).unwrap();
            }
            engine.cache.len()
        })
    });
    group.bench_function("warm", |b| {
        let mut engine = MultSearch::new(DEFAULT_PROFILE);
        for n in 2..=500i64 {
            engine.find_sequence(n).unwrap();
        }
        b.iter(|| {
            for n in 2..=500i64 {
                engine.find_sequence(black_box(n)).unwrap();
            }
        })
    });
    group.finish();
}

fn bench_large_constant(c: &mut Criterion) {
    c.bench_function("find_12345678", |b| {
        b.iter(|| {
            let mut engine = MultSearch::new(DEFAULT_PROFILE);
            engine.find_sequence(black_box(12_345_678)).unwrap()
        })
    });
}

fn bench_binary_seeder(c: &mut Criterion) {
    c.bench_function("binary_12345678", |b| {
        b.iter(|| {
            let mut engine = MultSearch::new(DEFAULT_PROFILE);
            engine.binary_sequence(black_box(12_345_678)).unwrap()
        })
    });
}

criterion_group!(benches, bench_sweep, bench_large_constant, bench_binary_seeder);
criterion_main!(benches);
