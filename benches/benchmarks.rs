use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use tokio::runtime::Runtime;

use tindux::{Options, Overflow, Reduction, Store};

#[derive(Clone)]
struct State {
    counter: usize,
    name: String,
}

fn reducer(state: &State, step: &&'static str) -> Reduction<State> {
    let counter = match *step {
        "RESET" => 0,
        _ => state.counter + 1,
    };
    Reduction::ok(State {
        counter,
        name: state.name.clone(),
    })
}

fn new_store(rt: &Runtime) -> Store<State, &'static str> {
    let _guard = rt.enter();
    Store::new(
        State {
            counter: 0,
            name: "bench".to_string(),
        },
        reducer,
    )
    .unwrap()
}

fn store_creation_benchmark(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    c.bench_function("store_creation", |b| {
        b.iter(|| black_box(new_store(&rt)));
    });
}

fn get_state_benchmark(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let store = new_store(&rt);

    c.bench_function("get_state", |b| {
        b.iter(|| {
            black_box(store.get_state());
        });
    });
}

fn dispatch_benchmark(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let store = new_store(&rt);

    c.bench_function("dispatch", |b| {
        b.iter(|| {
            rt.block_on(store.dispatch(black_box("TICK"))).unwrap();
        });
    });
}

fn submit_batch_benchmark(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let store = new_store(&rt);
    store.with_options(Options::recording_last(128));

    c.bench_function("submit_batch_100", |b| {
        b.iter(|| {
            rt.block_on(async {
                for _ in 0..99 {
                    store.submit(black_box("TICK")).await.unwrap();
                }
                // Wait for the batch to land.
                store.dispatch("TICK").await.unwrap();
            });
        });
    });
}

fn fan_out_benchmark(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut group = c.benchmark_group("fan_out");

    for subscriber_count in [1, 10, 100].iter() {
        let store = new_store(&rt);

        // Receivers stay alive but are never drained.
        let mut watchers = Vec::new();
        let mut receivers = Vec::new();
        for _ in 0..*subscriber_count {
            watchers.push(store.watch());
            let (tx, rx) = tokio::sync::mpsc::channel(1);
            store.subscribe_with(tx, Overflow::DropNewest);
            receivers.push(rx);
        }

        group.bench_with_input(
            BenchmarkId::from_parameter(subscriber_count),
            subscriber_count,
            |b, _| {
                b.iter(|| {
                    rt.block_on(store.dispatch(black_box("TICK"))).unwrap();
                });
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    store_creation_benchmark,
    get_state_benchmark,
    dispatch_benchmark,
    submit_batch_benchmark,
    fan_out_benchmark,
);
criterion_main!(benches);
