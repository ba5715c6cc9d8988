//! Lock-free parameter block and meters shared with the control thread.
//!
//! Scalars cross threads as `f32` bits in `AtomicU32`s. Writers store the
//! value relaxed, then bump a generation counter with `Release`; the audio
//! thread loads the generation with `Acquire` once per block and only rereads
//! the values when it moved. Meters go the other way: the audio thread is the
//! only writer, any number of readers poll them.

use std::fmt;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use crate::patch::{OscillatorSource, Patch};

/// An `f32` stored as raw bits in an `AtomicU32`.
pub struct AtomicF32 {
    bits: AtomicU32,
}

impl AtomicF32 {
    pub const fn from_bits(bits: u32) -> Self {
        Self {
            bits: AtomicU32::new(bits),
        }
    }

    pub fn new(value: f32) -> Self {
        Self::from_bits(value.to_bits())
    }

    #[inline]
    pub fn load(&self, ordering: Ordering) -> f32 {
        f32::from_bits(self.bits.load(ordering))
    }

    #[inline]
    pub fn store(&self, value: f32, ordering: Ordering) {
        self.bits.store(value.to_bits(), ordering);
    }
}

impl Default for AtomicF32 {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl fmt::Debug for AtomicF32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.load(Ordering::Relaxed))
    }
}

/// Knobs the control thread can turn while notes play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SynthParam {
    MasterGain,
    FilterCutoff,
    FilterResonance,
    FilterDrive,
    Osc1Level,
    Osc2Level,
    Osc1WavetablePosition,
    Osc2WavetablePosition,
    FmDepth,
    SubLevel,
    NoiseLevel,
    Lfo1Rate,
    Lfo2Rate,
    ModWheel,
    Aftertouch,
}

impl SynthParam {
    pub const COUNT: usize = 15;

    pub const ALL: [SynthParam; SynthParam::COUNT] = [
        SynthParam::MasterGain,
        SynthParam::FilterCutoff,
        SynthParam::FilterResonance,
        SynthParam::FilterDrive,
        SynthParam::Osc1Level,
        SynthParam::Osc2Level,
        SynthParam::Osc1WavetablePosition,
        SynthParam::Osc2WavetablePosition,
        SynthParam::FmDepth,
        SynthParam::SubLevel,
        SynthParam::NoiseLevel,
        SynthParam::Lfo1Rate,
        SynthParam::Lfo2Rate,
        SynthParam::ModWheel,
        SynthParam::Aftertouch,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The value this knob has in `patch`.
    pub fn value_in(self, patch: &Patch) -> f32 {
        let [osc1, osc2] = &patch.oscillators;
        let position = |source: OscillatorSource| match source {
            OscillatorSource::Wavetable { position, .. } => position,
            _ => 0.0,
        };

        match self {
            SynthParam::MasterGain => patch.master_gain,
            SynthParam::FilterCutoff => patch.filter.cutoff_hz,
            SynthParam::FilterResonance => patch.filter.resonance,
            SynthParam::FilterDrive => patch.filter.drive,
            SynthParam::Osc1Level => osc1.level,
            SynthParam::Osc2Level => osc2.level,
            SynthParam::Osc1WavetablePosition => position(osc1.source),
            SynthParam::Osc2WavetablePosition => position(osc2.source),
            SynthParam::FmDepth => [osc1.source, osc2.source]
                .into_iter()
                .find_map(|source| match source {
                    OscillatorSource::Fm { depth, .. } => Some(depth),
                    _ => None,
                })
                .unwrap_or(0.0),
            SynthParam::SubLevel => patch.sub.level,
            SynthParam::NoiseLevel => patch.noise.level,
            SynthParam::Lfo1Rate => patch.lfos[0].rate_hz,
            SynthParam::Lfo2Rate => patch.lfos[1].rate_hz,
            SynthParam::ModWheel | SynthParam::Aftertouch => 0.0,
        }
    }
}

#[derive(Debug)]
pub struct SynthParams {
    values: [AtomicF32; SynthParam::COUNT],
    generation: AtomicU64,
}

impl Default for SynthParams {
    fn default() -> Self {
        Self::from_patch(&Patch::default())
    }
}

impl SynthParams {
    pub fn from_patch(patch: &Patch) -> Self {
        Self {
            values: SynthParam::ALL.map(|param| AtomicF32::new(param.value_in(patch))),
            generation: AtomicU64::new(0),
        }
    }

    /// Control thread: publish a new value.
    pub fn set(&self, param: SynthParam, value: f32) {
        self.values[param.index()].store(value, Ordering::Relaxed);
        self.generation.fetch_add(1, Ordering::Release);
    }

    pub fn get(&self, param: SynthParam) -> f32 {
        self.values[param.index()].load(Ordering::Relaxed)
    }

    /// Overwrite every knob with the patch's values.
    pub fn load_patch(&self, patch: &Patch) {
        for param in SynthParam::ALL {
            self.values[param.index()].store(param.value_in(patch), Ordering::Relaxed);
        }
        self.generation.fetch_add(1, Ordering::Release);
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Copy every value out. Call after `generation()`.
    #[inline]
    pub fn snapshot(&self, out: &mut [f32; SynthParam::COUNT]) {
        for (slot, value) in out.iter_mut().zip(&self.values) {
            *slot = value.load(Ordering::Relaxed);
        }
    }
}

/// Published by the audio thread once per block.
#[derive(Debug, Default)]
pub struct SynthMeters {
    peak_left: AtomicF32,
    peak_right: AtomicF32,
    active_voices: AtomicU32,
}

impl SynthMeters {
    #[inline]
    pub fn publish(&self, peak_left: f32, peak_right: f32, active_voices: usize) {
        self.peak_left.store(peak_left, Ordering::Relaxed);
        self.peak_right.store(peak_right, Ordering::Relaxed);
        self.active_voices
            .store(active_voices.min(u32::MAX as usize) as u32, Ordering::Relaxed);
    }

    pub fn peak(&self) -> (f32, f32) {
        (
            self.peak_left.load(Ordering::Relaxed),
            self.peak_right.load(Ordering::Relaxed),
        )
    }

    pub fn active_voices(&self) -> usize {
        self.active_voices.load(Ordering::Relaxed) as usize
    }
}
