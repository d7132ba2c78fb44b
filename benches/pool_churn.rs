use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use quench::governor::{Governor, ManualScheduler};
use quench::pool::{Pool, PoolConfig, RecycleFactory};
use std::hint::black_box;
use std::time::Duration;

/// Acquire/release churn against a warm pool versus fresh allocation
fn bench_pool_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool_churn");

    for size in [256usize, 4096, 65536] {
        group.throughput(Throughput::Elements(1));

        let pool: Pool<Vec<u8>> = Pool::new(
            RecycleFactory::with_constructor(Vec::new),
            PoolConfig::bounded(4).with_prewarm(1),
        )
        .unwrap();

        group.bench_with_input(BenchmarkId::new("pooled", size), &size, |b, &size| {
            b.iter(|| {
                let mut buf = pool.acquire().unwrap();
                buf.resize(size, 0xAB);
                black_box(buf.len());
                pool.release(buf).unwrap();
            });
        });

        group.bench_with_input(BenchmarkId::new("allocated", size), &size, |b, &size| {
            b.iter(|| {
                let buf = vec![0xABu8; size];
                black_box(buf.len());
            });
        });
    }

    group.finish();
}

/// Cost of feeding a burst of triggers through each governor mode
fn bench_governor_triggers(c: &mut Criterion) {
    let mut group = c.benchmark_group("governor_triggers");
    group.throughput(Throughput::Elements(1_000));

    group.bench_function("debounce", |b| {
        b.iter(|| {
            let clock = ManualScheduler::new();
            let governor =
                Governor::debounce(Duration::from_millis(10), clock.clone(), |n: u64| {
                    black_box(n);
                })
                .unwrap();
            for n in 0..1_000 {
                governor.trigger(n);
                clock.advance(Duration::from_millis(1));
            }
            clock.run_until_idle();
        });
    });

    group.bench_function("throttle", |b| {
        b.iter(|| {
            let clock = ManualScheduler::new();
            let governor =
                Governor::throttle(Duration::from_millis(10), clock.clone(), |n: u64| {
                    black_box(n);
                })
                .unwrap();
            for n in 0..1_000 {
                governor.trigger(n);
                clock.advance(Duration::from_millis(1));
            }
            clock.run_until_idle();
        });
    });

    group.finish();
}

criterion_group!(benches, bench_pool_churn, bench_governor_triggers);
criterion_main!(benches);
