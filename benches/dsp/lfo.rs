//! Benchmarks for the LFO, free-running and tempo-synced.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use voxmod::dsp::lfo::{Lfo, LfoShape};
use voxmod::dsp::tempo::NoteValue;

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_lfo(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/lfo");

    let shapes = [
        ("sine", LfoShape::Sine),
        ("triangle", LfoShape::Triangle),
        ("sample_hold", LfoShape::SampleHold),
        ("random", LfoShape::Random),
    ];

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        for (name, shape) in shapes {
            let mut lfo = Lfo::new(shape, 5.0);
            lfo.start();
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    for sample in buffer.iter_mut() {
                        *sample = lfo.process(black_box(SAMPLE_RATE));
                    }
                })
            });
        }

        // Synced to a dotted eighth at 128 BPM with a fade-in
        let mut lfo = Lfo::new(LfoShape::Sine, 1.0);
        lfo.set_sync(Some(NoteValue::EIGHTH.dotted()));
        lfo.set_tempo(128.0);
        lfo.set_delay(0.5);
        lfo.start();
        group.bench_with_input(BenchmarkId::new("synced", size), &size, |b, _| {
            b.iter(|| {
                for sample in buffer.iter_mut() {
                    *sample = lfo.process(black_box(SAMPLE_RATE));
                }
            })
        });
    }

    group.finish();
}
