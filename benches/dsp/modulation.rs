//! Benchmarks for the modulation matrix: source pushes and destination sums.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use voxmod::dsp::modulation::{ModDestination, ModMatrix, ModSlot, ModSource, MOD_SLOTS};

fn matrix_with(routes: usize) -> ModMatrix {
    let mut matrix = ModMatrix::new();
    for i in 0..routes {
        let source = ModSource::ALL[1 + i % (ModSource::COUNT - 1)];
        let destination = ModDestination::ALL[i % ModDestination::COUNT];
        matrix.set_slot(i, ModSlot::new(source, destination, 0.25));
    }
    matrix
}

pub fn bench_modulation(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/modulation");

    for routes in [0, 4, MOD_SLOTS] {
        let mut matrix = matrix_with(routes);

        // One control-rate update: push every source, read every destination
        group.bench_with_input(BenchmarkId::new("update", routes), &routes, |b, _| {
            b.iter(|| {
                for (i, source) in ModSource::ALL.into_iter().enumerate() {
                    matrix.set_source_value(source, black_box(i as f32 * 0.1 - 0.4));
                }
                let mut total = 0.0;
                for destination in ModDestination::ALL {
                    total += matrix.modulation_for(destination);
                }
                black_box(total)
            })
        });
    }

    group.finish();
}
