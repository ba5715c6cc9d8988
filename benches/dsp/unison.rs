//! Benchmarks for unison offset calculation (runs once per note-on).

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use voxmod::dsp::unison::{SpreadMode, UnisonEngine, MAX_UNISON_VOICES};

pub fn bench_unison(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/unison");

    let modes = [
        ("linear", SpreadMode::Linear),
        ("exponential", SpreadMode::Exponential),
        ("random", SpreadMode::Random),
        ("center", SpreadMode::Center),
    ];

    for (name, mode) in modes {
        let mut engine = UnisonEngine::new(MAX_UNISON_VOICES, 35.0, mode);
        engine.set_stereo_spread(0.8);
        engine.set_phase_randomize(true);
        group.bench_with_input(BenchmarkId::new(name, MAX_UNISON_VOICES), &engine, |b, engine| {
            b.iter(|| {
                let mut sum = 0.0;
                for voice in black_box(engine).voices() {
                    sum += voice.detune_cents + voice.pan + voice.gain;
                }
                black_box(sum)
            })
        });
    }

    group.finish();
}
