//! Benchmarks for the analog-modeled filter, one per model.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use voxmod::dsp::analog::{AnalogFilter, FilterModel};
use voxmod::dsp::filter::FilterType;

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/filter");

    for &size in BLOCK_SIZES {
        // Generate a test signal (sawtooth-like ramp)
        let input: Vec<f32> = (0..size)
            .map(|i| (i as f32 / size as f32) * 2.0 - 1.0)
            .collect();
        let mut buffer = input.clone();

        for model in FilterModel::ALL {
            let mut filter = AnalogFilter::new(SAMPLE_RATE);
            filter.set_model(model);
            filter.set_filter_type(FilterType::LowPass);
            filter.set_cutoff(1_000.0);
            filter.set_resonance(0.7);
            filter.set_drive(0.5);

            let name = format!("{model:?}").to_lowercase();
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    buffer.copy_from_slice(&input);
                    for sample in buffer.iter_mut() {
                        *sample = filter.process_sample(black_box(*sample));
                    }
                })
            });
        }

        // Cutoff moved every 32 samples - coefficient recompute cost
        let mut filter = AnalogFilter::new(SAMPLE_RATE);
        filter.set_model(FilterModel::Ladder);
        group.bench_with_input(BenchmarkId::new("ladder_swept", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                for (chunk_index, chunk) in buffer.chunks_mut(32).enumerate() {
                    filter.set_cutoff(200.0 + chunk_index as f32 * 150.0);
                    for sample in chunk.iter_mut() {
                        *sample = filter.process_sample(black_box(*sample));
                    }
                }
            })
        });
    }

    group.finish();
}
