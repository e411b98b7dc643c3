//! Benchmarks for rendering held chords.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use hueboard::{
    config::EngineConfig,
    graph::realtime::channel,
    pitch::{KeyId, PitchTable},
    synth::{ColorState, InputDispatcher},
};

use crate::BLOCK_SIZES;

/// Voices held at once: a single note, a triad, a big chord and every key.
const CHORD_SIZES: &[usize] = &[1, 3, 8, 24];

pub fn bench_chords(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/chords");
    let config = EngineConfig::default();
    let keys: Vec<KeyId> = PitchTable::default().keys().collect();

    for &voices in CHORD_SIZES {
        for &size in BLOCK_SIZES {
            let (graph, mut renderer) = channel(48_000.0, config.master_gain);
            let mut dispatcher =
                InputDispatcher::new(graph, PitchTable::default(), ColorState::default(), &config);
            for &key in keys.iter().take(voices) {
                dispatcher.press(key, false);
            }

            let mut buffer = vec![0.0f32; size];
            // Get past the attack so the steady state is measured
            for _ in 0..(4_800 / size + 1) {
                renderer.render_block(&mut buffer);
            }

            let id = format!("{voices}_voices");
            group.bench_with_input(BenchmarkId::new(id, size), &size, |b, _| {
                b.iter(|| {
                    renderer.render_block(black_box(&mut buffer));
                })
            });
        }
    }

    group.finish();
}
