//! Audio-rate oscillator with basic, wavetable and two-operator FM modes.

/*
Oscillator Modes
================

Every mode shares one phase accumulator in [0, 1) that advances by
frequency / sample_rate per sample and wraps at 1.0.

  Basic       Sine, triangle, saw and square straight from the phase.
              Saw and square get a PolyBLEP correction at their jumps so
              the brightest shapes alias less at high pitches.

  Wavetable   The phase indexes the cached, morphed frame of a shared table
              (see `wavetable.rs`).

  FM          Two coupled phases. The modulator runs at frequency * ratio;
              its output bends the carrier's phase increment:

                  carrier_inc = frequency / sample_rate * (1 + modulator * depth)

Pitch
-----

    effective = base * 2^octave * 2^(semitones / 12) * 2^(fine_cents / 1200)
                     * 2^(unison_detune_cents / 1200) * 2^(pitch_mod / 12)

then clamped to (0, nyquist] so the phase increment is always positive and
below half a cycle per sample.
*/

use std::f64::consts::TAU;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::wavetable::{Wavetable, WavetableMorph};
use crate::dsp::wrap_phase;

pub const MIN_FREQUENCY_HZ: f32 = 0.01;
pub const FM_RATIO_RANGE: (f32, f32) = (0.125, 16.0);

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Triangle,
    Saw,
    Square,
}

#[derive(Debug, Clone)]
pub enum OscillatorMode {
    Basic(Waveform),
    Wavetable(WavetableMorph),
    Fm {
        ratio: f32,
        depth: f32,
        modulator_phase: f64,
    },
}

#[derive(Debug, Clone)]
pub struct Oscillator {
    mode: OscillatorMode,
    phase: f64,
    level: f32,
    pan: f32,
    octave: i32,
    semitones: i32,
    fine_cents: f32,
    detune_cents: f32,
    pitch_mod_semitones: f32,
}

impl Oscillator {
    pub fn new(mode: OscillatorMode) -> Self {
        Self {
            mode,
            phase: 0.0,
            level: 1.0,
            pan: 0.0,
            octave: 0,
            semitones: 0,
            fine_cents: 0.0,
            detune_cents: 0.0,
            pitch_mod_semitones: 0.0,
        }
    }

    pub fn basic(waveform: Waveform) -> Self {
        Self::new(OscillatorMode::Basic(waveform))
    }

    pub fn wavetable(table: Option<Arc<Wavetable>>) -> Self {
        Self::new(OscillatorMode::Wavetable(WavetableMorph::new(table)))
    }

    pub fn fm(ratio: f32, depth: f32) -> Self {
        Self::new(OscillatorMode::Fm {
            ratio: clamp_ratio(ratio),
            depth: clamp_unit(depth),
            modulator_phase: 0.0,
        })
    }

    /// Generate one sample at `base_frequency` and advance the phase.
    #[inline]
    pub fn process(&mut self, base_frequency: f32, sample_rate: f32) -> f32 {
        let frequency = self.effective_frequency(base_frequency, sample_rate) as f64;
        let inc = frequency / sample_rate.max(1.0) as f64;

        let sample = match &mut self.mode {
            OscillatorMode::Basic(waveform) => basic_sample(*waveform, self.phase, inc),
            OscillatorMode::Wavetable(morph) => morph.process_sample(self.phase),
            OscillatorMode::Fm {
                ratio,
                depth,
                modulator_phase,
            } => {
                let modulator = (TAU * *modulator_phase).sin();
                *modulator_phase = wrap_phase(*modulator_phase + inc * *ratio as f64);

                let carrier = (TAU * self.phase).sin() as f32;
                let carrier_inc = inc * (1.0 + modulator * *depth as f64);
                self.phase = wrap_phase(self.phase + carrier_inc);
                return carrier * self.level;
            }
        };

        self.phase = wrap_phase(self.phase + inc);
        sample * self.level
    }

    /// Pitch after octave/semitone/fine, unison detune and modulation.
    pub fn effective_frequency(&self, base_frequency: f32, sample_rate: f32) -> f32 {
        let semitones = (self.octave * 12 + self.semitones) as f32
            + (self.fine_cents + self.detune_cents) / 100.0
            + self.pitch_mod_semitones;
        let frequency = base_frequency * (semitones / 12.0).exp2();
        let nyquist = (sample_rate * 0.5).max(MIN_FREQUENCY_HZ);
        frequency.max(MIN_FREQUENCY_HZ).min(nyquist)
    }

    /// Restart from phase zero (note retrigger).
    pub fn reset(&mut self) {
        self.phase = 0.0;
        if let OscillatorMode::Fm { modulator_phase, .. } = &mut self.mode {
            *modulator_phase = 0.0;
        }
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Start phase in [0, 1), used to decorrelate unison voices.
    pub fn set_phase(&mut self, phase: f64) {
        self.phase = if phase.is_finite() { wrap_phase(phase) } else { 0.0 };
    }

    pub fn mode(&self) -> &OscillatorMode {
        &self.mode
    }

    /// Replace the mode. Switching into wavetable mode allocates its cache,
    /// so do it outside the audio callback.
    pub fn set_mode(&mut self, mode: OscillatorMode) {
        self.mode = mode;
    }

    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.mode = OscillatorMode::Basic(waveform);
    }

    /// Select a table. Keeps the existing morph cache when already in wavetable mode.
    pub fn set_wavetable(&mut self, table: Option<Arc<Wavetable>>) {
        match &mut self.mode {
            OscillatorMode::Wavetable(morph) => morph.set_table(table),
            _ => self.mode = OscillatorMode::Wavetable(WavetableMorph::new(table)),
        }
    }

    /// The selected table, `None` outside wavetable mode or when unset.
    pub fn current_wavetable(&self) -> Option<&Arc<Wavetable>> {
        match &self.mode {
            OscillatorMode::Wavetable(morph) => morph.current_wavetable(),
            _ => None,
        }
    }

    pub fn set_wavetable_position(&mut self, position: f32) {
        if let OscillatorMode::Wavetable(morph) = &mut self.mode {
            morph.set_position(position);
        }
    }

    pub fn wavetable_position(&self) -> Option<f32> {
        match &self.mode {
            OscillatorMode::Wavetable(morph) => Some(morph.position()),
            _ => None,
        }
    }

    pub fn set_fm_ratio(&mut self, value: f32) {
        if let OscillatorMode::Fm { ratio, .. } = &mut self.mode {
            *ratio = clamp_ratio(value);
        }
    }

    pub fn fm_ratio(&self) -> Option<f32> {
        match self.mode {
            OscillatorMode::Fm { ratio, .. } => Some(ratio),
            _ => None,
        }
    }

    pub fn set_fm_depth(&mut self, value: f32) {
        if let OscillatorMode::Fm { depth, .. } = &mut self.mode {
            *depth = clamp_unit(value);
        }
    }

    pub fn fm_depth(&self) -> Option<f32> {
        match self.mode {
            OscillatorMode::Fm { depth, .. } => Some(depth),
            _ => None,
        }
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn set_level(&mut self, level: f32) {
        self.level = clamp_unit(level);
    }

    pub fn pan(&self) -> f32 {
        self.pan
    }

    pub fn set_pan(&mut self, pan: f32) {
        self.pan = if pan.is_finite() { pan.clamp(-1.0, 1.0) } else { 0.0 };
    }

    pub fn octave(&self) -> i32 {
        self.octave
    }

    pub fn set_octave(&mut self, octave: i32) {
        self.octave = octave.clamp(-4, 4);
    }

    pub fn semitones(&self) -> i32 {
        self.semitones
    }

    pub fn set_semitones(&mut self, semitones: i32) {
        self.semitones = semitones.clamp(-24, 24);
    }

    pub fn fine_cents(&self) -> f32 {
        self.fine_cents
    }

    pub fn set_fine_cents(&mut self, cents: f32) {
        self.fine_cents = if cents.is_finite() { cents.clamp(-100.0, 100.0) } else { 0.0 };
    }

    pub fn detune_cents(&self) -> f32 {
        self.detune_cents
    }

    /// Unison offset, applied on top of the fine tune.
    pub fn set_detune_cents(&mut self, cents: f32) {
        self.detune_cents = if cents.is_finite() { cents.clamp(-1200.0, 1200.0) } else { 0.0 };
    }

    pub fn pitch_modulation(&self) -> f32 {
        self.pitch_mod_semitones
    }

    pub fn set_pitch_modulation(&mut self, semitones: f32) {
        self.pitch_mod_semitones = if semitones.is_finite() {
            semitones.clamp(-48.0, 48.0)
        } else {
            0.0
        };
    }
}

#[inline]
fn clamp_unit(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[inline]
fn clamp_ratio(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(FM_RATIO_RANGE.0, FM_RATIO_RANGE.1)
    } else {
        1.0
    }
}

#[inline]
fn basic_sample(waveform: Waveform, phase: f64, inc: f64) -> f32 {
    let value = match waveform {
        Waveform::Sine => (TAU * phase).sin(),
        Waveform::Triangle => {
            if phase < 0.5 {
                4.0 * phase - 1.0
            } else {
                3.0 - 4.0 * phase
            }
        }
        Waveform::Saw => 2.0 * phase - 1.0 - poly_blep(phase, inc),
        Waveform::Square => {
            let naive = if phase < 0.5 { 1.0 } else { -1.0 };
            naive + poly_blep(phase, inc) - poly_blep(wrap_phase(phase + 0.5), inc)
        }
    };
    value as f32
}

/// PolyBLEP residual for a unit step at phase 0. `t` is the phase, `dt` the increment.
#[inline]
fn poly_blep(t: f64, dt: f64) -> f64 {
    if dt <= 0.0 {
        0.0
    } else if t < dt {
        let t = t / dt;
        2.0 * t - t * t - 1.0
    } else if t > 1.0 - dt {
        let t = (t - 1.0) / dt;
        t * t + 2.0 * t + 1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::wavetable::WavetableCategory;

    const SR: f32 = 48_000.0;

    #[test]
    fn sine_matches_closed_form() {
        let mut osc = Oscillator::basic(Waveform::Sine);
        let freq = 440.0;
        let samples: Vec<f32> = (0..64).map(|_| osc.process(freq, SR)).collect();

        let n = 12;
        let expected = (std::f32::consts::TAU * freq * n as f32 / SR).sin();
        assert!((samples[n] - expected).abs() < 1e-4, "expected {expected}, got {}", samples[n]);
    }

    #[test]
    fn basic_shapes_stay_in_range() {
        for waveform in [Waveform::Sine, Waveform::Triangle, Waveform::Saw, Waveform::Square] {
            let mut osc = Oscillator::basic(waveform);
            for _ in 0..48_000 {
                let s = osc.process(1_234.0, SR);
                assert!(s.abs() <= 1.01, "{waveform:?} out of range: {s}");
            }
        }
    }

    #[test]
    fn phase_wraps_into_unit_interval() {
        let mut osc = Oscillator::basic(Waveform::Saw);
        for _ in 0..10_000 {
            osc.process(3_000.0, SR);
            assert!((0.0..1.0).contains(&osc.phase()));
        }
    }

    #[test]
    fn octave_semitone_and_fine_stack() {
        let mut osc = Oscillator::basic(Waveform::Sine);
        osc.set_octave(1);
        assert!((osc.effective_frequency(220.0, SR) - 440.0).abs() < 1e-3);

        osc.set_octave(0);
        osc.set_semitones(12);
        assert!((osc.effective_frequency(220.0, SR) - 440.0).abs() < 1e-3);

        osc.set_semitones(0);
        osc.set_fine_cents(100.0);
        let semitone_up = 220.0 * 2.0f32.powf(1.0 / 12.0);
        assert!((osc.effective_frequency(220.0, SR) - semitone_up).abs() < 1e-3);
    }

    #[test]
    fn frequency_is_clamped_positive_and_below_nyquist() {
        let osc = Oscillator::basic(Waveform::Sine);
        assert_eq!(osc.effective_frequency(-50.0, SR), MIN_FREQUENCY_HZ);
        assert_eq!(osc.effective_frequency(f32::NAN, SR), MIN_FREQUENCY_HZ);
        assert_eq!(osc.effective_frequency(90_000.0, SR), SR * 0.5);
    }

    #[test]
    fn fm_with_zero_depth_is_a_sine() {
        let mut fm = Oscillator::fm(2.0, 0.0);
        let mut sine = Oscillator::basic(Waveform::Sine);
        for _ in 0..1_000 {
            let a = fm.process(330.0, SR);
            let b = sine.process(330.0, SR);
            assert!((a - b).abs() < 1e-5);
        }
    }

    #[test]
    fn fm_depth_changes_the_carrier() {
        let mut plain = Oscillator::fm(2.0, 0.0);
        let mut bent = Oscillator::fm(2.0, 0.8);
        let diff: f32 = (0..2_000)
            .map(|_| (plain.process(330.0, SR) - bent.process(330.0, SR)).abs())
            .sum();
        assert!(diff > 1.0, "FM depth had no audible effect: {diff}");
    }

    #[test]
    fn wavetable_without_table_is_silent() {
        let mut osc = Oscillator::wavetable(None);
        assert!(osc.current_wavetable().is_none());
        assert!((0..256).all(|_| osc.process(440.0, SR) == 0.0));
    }

    #[test]
    fn wavetable_mode_reads_the_table() {
        let frames = vec![vec![1.0; 32]];
        let table = Arc::new(Wavetable::from_frames(5, "dc", WavetableCategory::User, &frames).unwrap());
        let mut osc = Oscillator::wavetable(Some(table));
        osc.set_level(0.5);
        assert!((osc.process(440.0, SR) - 0.5).abs() < 1e-6);
        assert_eq!(osc.current_wavetable().map(|t| t.id()), Some(5));
    }

    #[test]
    fn setters_round_trip_and_clamp() {
        let mut osc = Oscillator::fm(1.0, 0.0);
        osc.set_level(0.37);
        assert_eq!(osc.level(), 0.37);
        osc.set_pan(-0.25);
        assert_eq!(osc.pan(), -0.25);
        osc.set_fine_cents(-12.5);
        assert_eq!(osc.fine_cents(), -12.5);
        osc.set_fm_ratio(3.5);
        assert_eq!(osc.fm_ratio(), Some(3.5));
        osc.set_fm_depth(0.6);
        assert_eq!(osc.fm_depth(), Some(0.6));

        osc.set_level(7.0);
        assert_eq!(osc.level(), 1.0);
        osc.set_octave(9);
        assert_eq!(osc.octave(), 4);
        osc.set_fm_ratio(100.0);
        assert_eq!(osc.fm_ratio(), Some(FM_RATIO_RANGE.1));
        assert_eq!(osc.wavetable_position(), None);
    }
}
