//! Benchmarks for complete voice chains.
//!
//! From a bare init voice up to a fully modulated wavetable pad.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use voxmod::dsp::modulation::{ModDestination, ModSlot, ModSource};
use voxmod::dsp::wavetable::WavetableBank;
use voxmod::patch::{self, Patch};
use voxmod::synth::SynthVoice;

use crate::{BLOCK_SIZES, SAMPLE_RATE};

fn voice_for(patch: &Patch, bank: &WavetableBank) -> SynthVoice {
    let mut voice = SynthVoice::new(SAMPLE_RATE);
    voice.apply_patch(patch, bank);
    voice.trigger(110.0, 0.8); // A2, typical bass note
    voice
}

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");
    let bank = WavetableBank::builtin();

    for &size in BLOCK_SIZES {
        let mut left = vec![0.0f32; size];
        let mut right = vec![0.0f32; size];

        // === INIT VOICE ===
        // saw → neutral filter → amp envelope, no routes
        // This is a baseline for what a voice costs
        let mut voice = voice_for(&Patch::default(), &bank);
        group.bench_with_input(BenchmarkId::new("init", size), &size, |b, _| {
            b.iter(|| {
                voice.render_next_block(black_box(&mut left), black_box(&mut right), 0, size);
            })
        });

        // === MODULATED ===
        // init voice plus LFO → cutoff, envelope → pitch, sub and noise on
        let mut patch = Patch::default();
        patch.sub.level = 0.4;
        patch.noise.level = 0.1;
        patch.modulation = vec![
            ModSlot::new(ModSource::Lfo1, ModDestination::FilterCutoff, 0.5),
            ModSlot::new(ModSource::FilterEnvelope, ModDestination::Pitch, 0.05),
            ModSlot::new(ModSource::Lfo2, ModDestination::Pan, 0.3),
        ];
        let mut voice = voice_for(&patch, &bank);
        group.bench_with_input(BenchmarkId::new("modulated", size), &size, |b, _| {
            b.iter(|| {
                voice.render_next_block(black_box(&mut left), black_box(&mut right), 0, size);
            })
        });

        // === WAVETABLE PAD ===
        // morphing wavetable, ladder filter, four routes
        let mut voice = voice_for(&patch::wavetable_pad(), &bank);
        group.bench_with_input(BenchmarkId::new("wavetable_pad", size), &size, |b, _| {
            b.iter(|| {
                voice.render_next_block(black_box(&mut left), black_box(&mut right), 0, size);
            })
        });
    }

    group.finish();
}
