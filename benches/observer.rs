//! Benchmarks for galactic-state
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use galactic_state::{create_shared_state, Component, Observer, RenderQueue};

// =============================================================================
// OBSERVER BENCHMARKS
// =============================================================================

fn bench_observer_create(c: &mut Criterion) {
    c.bench_function("observer_create", |b| b.iter(|| black_box(Observer::new(0i32))));
}

fn bench_observer_get(c: &mut Criterion) {
    let o = Observer::new(42i32);
    c.bench_function("observer_get", |b| b.iter(|| black_box(o.get())));
}

fn bench_observer_set(c: &mut Criterion) {
    let o = Observer::new(0i32);
    c.bench_function("observer_set", |b| b.iter(|| o.set(black_box(42))));
}

fn bench_observer_update(c: &mut Criterion) {
    let o = Observer::new(0u64);
    c.bench_function("observer_update", |b| {
        b.iter(|| o.update(|n| n.wrapping_add(black_box(1))))
    });
}

fn bench_observer_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("observer_fanout");

    for count in [1, 10, 100, 1000] {
        let o = Observer::new(0i32);
        for _ in 0..count {
            o.subscribe(|v: &i32| {
                black_box(*v);
            });
        }

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| o.set(black_box(1)))
        });
    }

    group.finish();
}

fn bench_subscribe_unsubscribe(c: &mut Criterion) {
    let o = Observer::new(0i32);
    c.bench_function("subscribe_unsubscribe", |b| {
        b.iter(|| {
            let id = o.subscribe(|_| {});
            o.unsubscribe(black_box(id))
        })
    });
}

// =============================================================================
// SHARED STATE BENCHMARKS
// =============================================================================

fn bench_hook_rerender(c: &mut Criterion) {
    let counter = create_shared_state(0i32);
    let view = Component::new();
    let _ = view.render(|| counter.use_state());

    c.bench_function("hook_rerender", |b| {
        b.iter(|| black_box(view.render(|| counter.use_state())))
    });
}

fn bench_shared_set_components(c: &mut Criterion) {
    let mut group = c.benchmark_group("shared_set_components");

    for count in [1, 10, 100] {
        let counter = create_shared_state(0i32);
        let queue = RenderQueue::new();
        let views: Vec<Component> = (0..count)
            .map(|_| {
                let view = Component::with_scheduler(queue.clone());
                let _ = view.render(|| counter.use_state());
                view
            })
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                counter.update(|n| n.wrapping_add(1));
                black_box(queue.drain())
            })
        });

        drop(views);
    }

    group.finish();
}

criterion_group!(
    observer_benches,
    bench_observer_create,
    bench_observer_get,
    bench_observer_set,
    bench_observer_update,
    bench_observer_fanout,
    bench_subscribe_unsubscribe,
);

criterion_group!(shared_benches, bench_hook_rerender, bench_shared_set_components);

criterion_main!(observer_benches, shared_benches);
