//! Benchmarks for gain automation lookups.
//!
//! The renderer evaluates every voice's gain once per sample, so `value_at`
//! sits on the hot path.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use hueboard::graph::param::{AudioParam, ParamEvent};

use crate::BLOCK_SIZES;

pub fn bench_param(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/param");
    let period = 1.0 / 48_000.0;

    for &size in BLOCK_SIZES {
        // Held value: no events ahead
        let mut held = AudioParam::new(0.5);
        held.schedule(ParamEvent::SetValue { value: 0.5, time: 0.0 });
        group.bench_with_input(BenchmarkId::new("held", size), &size, |b, &size| {
            b.iter(|| {
                let mut acc = 0.0f32;
                for i in 0..size {
                    acc += held.value_at(black_box(1.0 + i as f64 * period));
                }
                acc
            })
        });

        // Mid-ramp: exponential interpolation every sample
        let mut ramp = AudioParam::new(0.0001);
        ramp.schedule(ParamEvent::SetValue { value: 0.0001, time: 0.0 });
        ramp.schedule(ParamEvent::ExponentialRamp { value: 0.9, end_time: 0.06 });
        group.bench_with_input(BenchmarkId::new("ramp", size), &size, |b, &size| {
            b.iter(|| {
                let mut acc = 0.0f32;
                for i in 0..size {
                    acc += ramp.value_at(black_box(0.01 + i as f64 * period));
                }
                acc
            })
        });
    }

    group.finish();
}
