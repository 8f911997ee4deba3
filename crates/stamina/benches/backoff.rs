//! Performance benchmarks for delay and jitter computation
//!
//! Run with: cargo bench --bench backoff

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use stamina::jitter::{self, Jitter};
use stamina::strategy::{self, DelayStrategy};
use std::time::Duration;

fn bench_delay_strategies(c: &mut Criterion) {
    let base = Duration::from_millis(100);
    let strategies: [(&str, Box<dyn DelayStrategy>); 4] = [
        ("constant", Box::new(strategy::constant(base))),
        (
            "linear",
            Box::new(strategy::linear(base, Duration::from_millis(50))),
        ),
        ("exponential", Box::new(strategy::exponential(base))),
        ("fibonacci", Box::new(strategy::fibonacci(base))),
    ];

    let mut group = c.benchmark_group("delay");
    for (name, strategy) in &strategies {
        group.bench_with_input(BenchmarkId::from_parameter(name), strategy, |b, s| {
            b.iter(|| {
                for attempt in 1..=32u32 {
                    black_box(s.delay(black_box(attempt)));
                }
            });
        });
    }
    group.finish();
}

fn bench_jitter(c: &mut Criterion) {
    let delay = Duration::from_millis(250);
    let jitters: [(&str, Box<dyn Jitter>); 4] = [
        ("none", Box::new(jitter::none())),
        ("full", Box::new(jitter::full())),
        ("equal", Box::new(jitter::equal())),
        (
            "decorrelated",
            Box::new(jitter::decorrelated_with_base(Duration::from_millis(10))),
        ),
    ];

    let mut group = c.benchmark_group("jitter");
    for (name, jitter) in &jitters {
        group.bench_with_input(BenchmarkId::from_parameter(name), jitter, |b, j| {
            b.iter(|| black_box(j.apply(black_box(delay), 1)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_delay_strategies, bench_jitter);
criterion_main!(benches);
