//! Benchmarks for wavetable lookup and morphing.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use voxmod::dsp::oscillator::Oscillator;
use voxmod::dsp::wavetable::WavetableBank;

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_wavetable(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/wavetable");
    let bank = WavetableBank::builtin();

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Fixed position - cached frame, one interpolated read per sample
        let mut osc = Oscillator::wavetable(bank.get(4).cloned());
        osc.set_wavetable_position(0.37);
        group.bench_with_input(BenchmarkId::new("static", size), &size, |b, _| {
            b.iter(|| {
                for sample in buffer.iter_mut() {
                    *sample = osc.process(black_box(220.0), SAMPLE_RATE);
                }
            })
        });

        // Position swept once per block, as a control-rate modulation would
        let mut osc = Oscillator::wavetable(bank.get(4).cloned());
        let mut position = 0.0f32;
        group.bench_with_input(BenchmarkId::new("morphing", size), &size, |b, _| {
            b.iter(|| {
                position = (position + 0.013).fract();
                osc.set_wavetable_position(position);
                for sample in buffer.iter_mut() {
                    *sample = osc.process(black_box(220.0), SAMPLE_RATE);
                }
            })
        });
    }

    group.finish();
}
