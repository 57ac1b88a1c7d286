//! Benchmarks for GateKV engine operations

use std::sync::Arc;
use std::thread;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gatekv::diagnostics::{DiagnosticsSink, Event};
use gatekv::Engine;

/// Discards events so the benchmark measures the engine alone
struct NullSink;

impl DiagnosticsSink for NullSink {
    fn record(&self, _event: &Event) {}
}

fn quiet_engine() -> Engine {
    Engine::with_sink(Arc::new(NullSink))
}

fn engine_benchmarks(c: &mut Criterion) {
    c.bench_function("put_overwrite_single_key", |b| {
        let engine = quiet_engine();
        b.iter(|| engine.put(black_box("key"), black_box("value")));
    });

    c.bench_function("get_hit", |b| {
        let engine = quiet_engine();
        engine.put("key", "value");
        b.iter(|| black_box(engine.get(black_box("key"))));
    });

    c.bench_function("put_then_delete", |b| {
        let engine = quiet_engine();
        b.iter(|| {
            engine.put(black_box("key"), black_box("value"));
            black_box(engine.delete(black_box("key")));
        });
    });

    // PUT records a snapshot of the whole store, so its cost grows with size
    c.bench_function("put_with_1000_keys", |b| {
        let engine = quiet_engine();
        for i in 0..1000 {
            engine.put(&format!("key{}", i), "value");
        }
        b.iter(|| engine.put(black_box("key0"), black_box("value")));
    });

    c.bench_function("mixed_4_threads", |b| {
        let engine = Arc::new(quiet_engine());
        b.iter(|| {
            let handles: Vec<_> = (0..4)
                .map(|t| {
                    let engine = Arc::clone(&engine);
                    thread::spawn(move || {
                        for i in 0..100 {
                            let key = format!("k{}-{}", t, i % 10);
                            engine.put(&key, "v");
                            black_box(engine.get(&key));
                            engine.delete(&key);
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

criterion_group!(benches, engine_benchmarks);
criterion_main!(benches);
