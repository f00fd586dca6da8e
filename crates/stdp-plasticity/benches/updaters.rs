// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Updater Benchmarks
//!
//! Cost of one event-driven delivery as the replayed history grows, one
//! clock-driven block of steps, and a parallel batch delivery.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use stdp_plasticity::{
    ClockDrivenUpdater, ConnectionBatch, ConnectionSettings, EventDrivenUpdater, IncomingSpike,
    NullLogger, OutgoingSpike, PreSynapticSpike, SimulationClock, TripletParameters, UpdateWindow,
};

struct BenchClock;

impl SimulationClock for BenchClock {
    fn resolution_ms(&self) -> f64 {
        0.1
    }

    fn min_delay_steps(&self) -> i64 {
        10
    }
}

/// Post-synaptic spikes evenly spread over `(0, span_ms)`
fn history(count: usize, span_ms: f64) -> Vec<f64> {
    (1..=count)
        .map(|i| i as f64 * span_ms / (count + 1) as f64)
        .collect()
}

fn bench_event_driven(c: &mut Criterion) {
    let mut group = c.benchmark_group("event_driven_send");
    for post_spikes in [0usize, 10, 100, 1000] {
        let history = history(post_spikes, 1000.0);
        group.throughput(Throughput::Elements(post_spikes.max(1) as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(post_spikes),
            &history,
            |b, history| {
                let connection = EventDrivenUpdater::default();
                let mut sink: Vec<OutgoingSpike> = Vec::with_capacity(1);
                b.iter(|| {
                    let mut connection = connection;
                    sink.clear();
                    let spike = PreSynapticSpike {
                        t_spike: 1001.0,
                        t_lastspike: 0.0,
                        multiplicity: 1,
                    };
                    black_box(connection.send(spike, history, &mut sink).ok())
                });
            },
        );
    }
    group.finish();
}

fn bench_clock_driven(c: &mut Criterion) {
    let mut unit = ClockDrivenUpdater::new_triplet(TripletParameters::default(), 1.0)
        .expect("default parameters are valid");
    unit.calibrate(&BenchClock).expect("bench clock is valid");
    let mut sink: Vec<OutgoingSpike> = Vec::new();
    let mut origin = 0i64;

    c.bench_function("clock_driven_block_10_steps", |b| {
        b.iter(|| {
            for (port, lag) in [(0u32, 2i64), (1, 7)] {
                unit.handle(IncomingSpike {
                    port,
                    delivery_step: origin + lag,
                    multiplicity: 1,
                })
                .ok();
            }
            let window = UpdateWindow {
                origin,
                from: 0,
                to: 10,
                min_delay: 10,
            };
            sink.clear();
            black_box(unit.update(window, &mut sink, &mut NullLogger).ok());
            origin += 10;
        });
    });
}

fn bench_batch(c: &mut Criterion) {
    let history = history(100, 1000.0);
    let mut group = c.benchmark_group("connection_batch_deliver");
    for connections in [16usize, 256, 4096] {
        let mut batch = ConnectionBatch::new();
        for _ in 0..connections {
            let connection = EventDrivenUpdater::new(
                TripletParameters::default(),
                1.0,
                ConnectionSettings::default(),
            )
            .expect("default parameters are valid");
            batch.push(connection, 0.0);
        }
        let arrivals: Vec<(usize, f64)> = (0..connections).map(|i| (i, 1001.0)).collect();

        group.throughput(Throughput::Elements(connections as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(connections),
            &arrivals,
            |b, arrivals| {
                b.iter(|| {
                    let mut batch = batch.clone();
                    black_box(batch.deliver(arrivals, &history).ok())
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_event_driven, bench_clock_driven, bench_batch);
criterion_main!(benches);
