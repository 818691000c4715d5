//! # Studio Bridge Bus Benchmarks
//!
//! | Path | What is measured |
//! |------|------------------|
//! | publish | Fan-out to N live targets |
//! | publish + evict | Fan-out when half the targets are torn down |
//! | inbound | Gate + dispatch per authenticated message |
//! | rejection | Gate cost for a foreign origin |

use std::sync::Arc;
use std::time::Duration;

use bridge_bus::{GuestBus, HostBus, InMemoryEnvironment, MessageBus, Origin, Topic};
use criterion::{black_box, BatchSize, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::{json, Value};

const HOST: &str = "https://host.example";
const PREVIEW: &str = "https://preview.example";

fn origin(s: &str) -> Origin {
    Origin::parse(s).unwrap()
}

// ============================================================================
// OUTBOUND
// ============================================================================

fn bench_publish_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("publish");
    group.measurement_time(Duration::from_secs(5));

    for targets in [1usize, 8, 64] {
        let env = InMemoryEnvironment::new();
        let host_ctx = env.open_context(origin(HOST));
        let host = HostBus::new();
        for i in 0..targets {
            let frame = env.embed_frame(&host_ctx, origin(&format!("https://guest{i}.example")));
            host.add_target(Arc::new(host_ctx.frame_ref(&frame)));
        }

        group.throughput(Throughput::Elements(targets as u64));
        group.bench_with_input(BenchmarkId::new("fan_out", targets), &targets, |b, _| {
            b.iter(|| {
                let delivered = host.request_navigation(black_box("/about"));
                env.run_until_idle();
                env.clear_deliveries();
                delivered
            })
        });
    }

    group.finish();
}

fn bench_publish_with_eviction(c: &mut Criterion) {
    let mut group = c.benchmark_group("publish_evict");

    group.bench_function("half_torn_down_64", |b| {
        b.iter_batched(
            || {
                let env = InMemoryEnvironment::new();
                let host_ctx = env.open_context(origin(HOST));
                let host = HostBus::new();
                for i in 0..64 {
                    let frame = env.embed_frame(&host_ctx, origin(&format!("https://guest{i}.example")));
                    host.add_target(Arc::new(host_ctx.frame_ref(&frame)));
                    if i % 2 == 0 {
                        env.detach_frame(&frame);
                    }
                }
                (env, host)
            },
            |(_env, host)| black_box(host.start_ice(Value::Null)),
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

// ============================================================================
// INBOUND
// ============================================================================

fn bench_inbound_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("inbound");

    let env = InMemoryEnvironment::new();
    let host_ctx = env.open_context(origin(HOST));
    let frame = env.embed_frame(&host_ctx, origin(PREVIEW));
    let guest = GuestBus::new();
    guest.add_origin(origin(HOST));
    guest.open(Arc::new(frame.content.clone())).unwrap();
    for _ in 0..4 {
        guest.subscribe(Topic::GuestNavRequest, |data: &Value| {
            black_box(data);
        });
        guest.subscribe(Topic::All, |data: &Value| {
            black_box(data);
        });
    }

    let message = json!({"topic": "nav-request", "data": {"url": "/"}, "scope": "external"});

    group.bench_function("authenticated_8_handlers", |b| {
        b.iter(|| {
            env.inject(&frame.content, message.clone(), HOST);
            env.run_until_idle()
        })
    });

    group.bench_function("rejected_origin", |b| {
        b.iter(|| {
            env.inject(&frame.content, message.clone(), "https://evil.example");
            env.run_until_idle()
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_publish_fan_out,
    bench_publish_with_eviction,
    bench_inbound_dispatch
);
criterion_main!(benches);
