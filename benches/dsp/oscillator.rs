//! Benchmarks for oscillator waveform generation.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use voxmod::dsp::oscillator::{Oscillator, Waveform};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

fn render(osc: &mut Oscillator, buffer: &mut [f32]) {
    for sample in buffer.iter_mut() {
        *sample = osc.process(black_box(440.0), SAMPLE_RATE);
    }
}

pub fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oscillator");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Sine - uses sin() transcendental function
        let mut osc = Oscillator::basic(Waveform::Sine);
        group.bench_with_input(BenchmarkId::new("sine", size), &size, |b, _| {
            b.iter(|| render(&mut osc, black_box(&mut buffer)))
        });

        // Sawtooth - ramp plus PolyBLEP correction near the wrap
        let mut osc = Oscillator::basic(Waveform::Saw);
        group.bench_with_input(BenchmarkId::new("sawtooth", size), &size, |b, _| {
            b.iter(|| render(&mut osc, black_box(&mut buffer)))
        });

        // Square - two PolyBLEP corrections per cycle
        let mut osc = Oscillator::basic(Waveform::Square);
        group.bench_with_input(BenchmarkId::new("square", size), &size, |b, _| {
            b.iter(|| render(&mut osc, black_box(&mut buffer)))
        });

        // FM - two sin() per sample
        let mut osc = Oscillator::fm(2.0, 0.5);
        group.bench_with_input(BenchmarkId::new("fm", size), &size, |b, _| {
            b.iter(|| render(&mut osc, black_box(&mut buffer)))
        });
    }

    group.finish();
}
