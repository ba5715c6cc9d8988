//! Benchmarks for the voice pool under load.

use std::hint::black_box;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion};
use rtrb::RingBuffer;
use voxmod::dsp::wavetable::WavetableBank;
use voxmod::patch;
use voxmod::synth::{PolySynth, SynthConfig, SynthMessage};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_poly(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/poly");
    let bank = Arc::new(WavetableBank::builtin());

    for notes in [1usize, 4, 8] {
        for &size in BLOCK_SIZES {
            let mut left = vec![0.0f32; size];
            let mut right = vec![0.0f32; size];

            let (mut tx, rx) = RingBuffer::new(64);
            let config = SynthConfig {
                sample_rate: SAMPLE_RATE,
                ..SynthConfig::default()
            };
            let mut synth = PolySynth::new(config, rx, Arc::clone(&bank));
            // Three unison voices per note
            if synth.load_patch(&patch::wavetable_pad()).is_err() {
                continue;
            }
            for i in 0..notes {
                let _ = tx.push(SynthMessage::NoteOn {
                    note: 48 + 3 * i as u8,
                    velocity: 100,
                });
            }

            let id = BenchmarkId::new(format!("pad_{notes}_notes"), size);
            group.bench_with_input(id, &size, |b, _| {
                b.iter(|| synth.render_block(black_box(&mut left), black_box(&mut right)))
            });
        }
    }

    group.finish();
}
