//! Low Frequency Oscillator (LFO) with tempo sync, fade-in and random shapes.

/*
Low Frequency Oscillators
=========================

An LFO is an oscillator running at sub-audio frequencies. The waveform math
is the audio oscillator's; what changes is what the output is used for.

Vocabulary
----------

  control-rate    Frequencies below hearing: ~0.01 Hz to ~20 Hz.
                  These modulate parameters over time instead of making sound.

  period          Time for one complete oscillation.
                  At 5 Hz: period = 1/5 = 0.2 seconds = 200ms

  bipolar         Output swings -1.0 to +1.0. Every shape here is generated
                  bipolar, then mapped into the configured [min, max] range.


Shapes
------

SINE / TRIANGLE / SAW / SQUARE
    Read straight from a phase accumulator in [0, 1) that advances by
    rate / sample_rate per sample.

SAMPLE & HOLD
    A random value held for one period, then a new one. The period is
    measured by its own sample counter, not by the phase accumulator, so a
    rate change takes effect at the next boundary without a phase jump.

RANDOM (smoothed)
    Same boundary clock as S&H, but each boundary only picks a new *target*.
    The output glides toward it every sample:

        current += GLIDE * (target - current)

    With a fixed coefficient the glide time does not follow the rate: fast
    random LFOs get rounded off, slow ones settle and wait.


Sync and Phase
--------------

FREE-RUNNING: phase is unrelated to notes.

RETRIGGER: note-on resets phase to the offset and re-arms the fade-in.
    Opt-in per LFO.

TEMPO-SYNCED: the rate follows the host BPM through a note value:

    rate = (bpm / 60) / beats(note_value)

    120 BPM, quarter note -> 2 beats/s / 1 beat  = 2.0 Hz
    120 BPM, dotted eighth -> 2 beats/s / 0.75  = 2.67 Hz


Delay (fade-in)
---------------

After reset the output is scaled by min(1, elapsed / delay), so vibrato can
creep in after the note starts instead of wobbling from the first sample.
The fade pivots on the rest point of the range, the value in [min, max]
nearest zero:

    rest = clamp(0, min, max)
    out  = rest + (mapped - rest) * fade

    range [-1, 1]  -> starts at 0
    range [ 0, 1]  -> starts at 0
    range [0.2, 1] -> starts at 0.2


Range Mapping
-------------

    out = min + unipolar(bipolar) * (max - min)

    bipolar   unipolar
    -1.0      0.0
     0.0      0.5
    +1.0      1.0

A stopped LFO holds the centre of its range: (min + max) / 2.
*/

use std::f64::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use oorandom::Rand32;

use crate::dsp::tempo::{clamp_bpm, NoteValue, DEFAULT_BPM};
use crate::dsp::wrap_phase;

pub const MIN_RATE_HZ: f32 = 0.01;
pub const MAX_RATE_HZ: f32 = 50.0;
pub const MAX_DELAY_SECONDS: f32 = 10.0;

/// Per-sample glide coefficient of the smoothed random shape.
pub const RANDOM_GLIDE: f32 = 0.002;

/// Modulated rate multiplier bounds (two octaves either way).
pub const RATE_SCALE_RANGE: (f32, f32) = (0.25, 4.0);

const DEFAULT_LFO_SEED: u64 = 0x1F0_5EED;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LfoShape {
    Sine,
    Triangle,
    Saw,
    Square,
    SampleHold,
    Random,
}

/// Convert bipolar signal (-1.0 to +1.0) to unipolar (0.0 to 1.0).
#[inline]
pub fn bipolar_to_unipolar(bipolar: f32) -> f32 {
    (bipolar + 1.0) * 0.5
}

/// Calculate samples per LFO period.
///
/// # Example
/// ```
/// use voxmod::dsp::lfo::samples_per_period;
/// let samples = samples_per_period(5.0, 48000.0);
/// assert_eq!(samples, 9600.0); // 5 Hz at 48kHz = 9600 samples
/// ```
#[inline]
pub fn samples_per_period(frequency_hz: f32, sample_rate: f32) -> f32 {
    sample_rate / frequency_hz
}

#[derive(Debug, Clone)]
pub struct Lfo {
    shape: LfoShape,
    rate_hz: f32,
    sync: Option<NoteValue>,
    bpm: f32,
    phase_offset: f64,
    delay_seconds: f32,
    min: f32,
    max: f32,
    running: bool,
    retrigger: bool,
    rate_scale: f32,

    phase: f64,
    elapsed_samples: u64,

    // Sample & hold / random state
    held: f32,
    target: f32,
    current: f32,
    period_counter: f64,
    rng: Rand32,
}

impl Lfo {
    pub fn new(shape: LfoShape, rate_hz: f32) -> Self {
        let mut lfo = Self {
            shape,
            rate_hz: clamp_rate(rate_hz),
            sync: None,
            bpm: DEFAULT_BPM,
            phase_offset: 0.0,
            delay_seconds: 0.0,
            min: -1.0,
            max: 1.0,
            running: false,
            retrigger: false,
            rate_scale: 1.0,
            phase: 0.0,
            elapsed_samples: 0,
            held: 0.0,
            target: 0.0,
            current: 0.0,
            period_counter: 0.0,
            rng: Rand32::new(DEFAULT_LFO_SEED),
        };
        lfo.reset();
        lfo
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Phase back to the offset, fade-in re-armed, a fresh held value drawn.
    pub fn reset(&mut self) {
        self.phase = self.phase_offset;
        self.elapsed_samples = 0;
        self.period_counter = 0.0;
        self.held = self.draw();
        self.target = self.draw();
    }

    /// Note-on hook: resets only when retrigger is enabled.
    pub fn note_on(&mut self) {
        if self.retrigger {
            self.reset();
        }
    }

    /// Restart the random sequence; S&H and random shapes become reproducible.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = Rand32::new(seed);
        self.current = 0.0;
        self.held = self.draw();
        self.target = self.draw();
    }

    #[inline]
    fn draw(&mut self) -> f32 {
        self.rng.rand_float() * 2.0 - 1.0
    }

    /// Generate one sample. A stopped LFO does not advance.
    #[inline]
    pub fn process(&mut self, sample_rate: f32) -> f32 {
        if !self.running {
            return self.center();
        }

        let sample_rate = sample_rate.max(1.0);
        let rate = self.effective_rate();

        let raw = match self.shape {
            LfoShape::Sine => (TAU * self.phase).sin() as f32,
            LfoShape::Triangle => {
                let p = self.phase as f32;
                if p < 0.5 {
                    4.0 * p - 1.0
                } else {
                    3.0 - 4.0 * p
                }
            }
            LfoShape::Saw => 2.0 * self.phase as f32 - 1.0,
            LfoShape::Square => {
                if self.phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            LfoShape::SampleHold => self.held,
            LfoShape::Random => {
                self.current += RANDOM_GLIDE * (self.target - self.current);
                self.current
            }
        };

        // Boundary clock shared by S&H and random
        self.period_counter += 1.0;
        let period = samples_per_period(rate, sample_rate) as f64;
        if self.period_counter >= period {
            self.period_counter -= period;
            match self.shape {
                LfoShape::SampleHold => self.held = self.draw(),
                LfoShape::Random => self.target = self.draw(),
                _ => {}
            }
        }

        let fade = if self.delay_seconds > 0.0 {
            let delay_samples = self.delay_seconds * sample_rate;
            (self.elapsed_samples as f32 / delay_samples).min(1.0)
        } else {
            1.0
        };
        self.elapsed_samples = self.elapsed_samples.saturating_add(1);

        self.phase = wrap_phase(self.phase + rate as f64 / sample_rate as f64);

        let mapped = self.min + bipolar_to_unipolar(raw) * (self.max - self.min);
        let rest = 0.0f32.clamp(self.min.min(self.max), self.min.max(self.max));
        rest + (mapped - rest) * fade
    }

    /// Free rate, or the synced note value at the current tempo, times any
    /// rate modulation.
    pub fn effective_rate(&self) -> f32 {
        let base = match self.sync {
            Some(note) => note.cycle_hz(self.bpm),
            None => self.rate_hz,
        };
        clamp_rate(base * self.rate_scale)
    }

    #[inline]
    pub fn center(&self) -> f32 {
        (self.min + self.max) * 0.5
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }

    pub fn shape(&self) -> LfoShape {
        self.shape
    }

    pub fn set_shape(&mut self, shape: LfoShape) {
        self.shape = shape;
    }

    pub fn rate(&self) -> f32 {
        self.rate_hz
    }

    pub fn set_rate(&mut self, rate_hz: f32) {
        self.rate_hz = clamp_rate(rate_hz);
    }

    pub fn sync(&self) -> Option<NoteValue> {
        self.sync
    }

    /// `None` returns to the free-running rate.
    pub fn set_sync(&mut self, sync: Option<NoteValue>) {
        self.sync = sync;
    }

    pub fn tempo(&self) -> f32 {
        self.bpm
    }

    pub fn set_tempo(&mut self, bpm: f32) {
        self.bpm = clamp_bpm(bpm);
    }

    /// Bipolar rate modulation; ±1 scales the rate by two octaves.
    pub fn set_rate_modulation(&mut self, amount: f32) {
        let amount = if amount.is_finite() { amount.clamp(-1.0, 1.0) } else { 0.0 };
        self.rate_scale = (2.0 * amount)
            .exp2()
            .clamp(RATE_SCALE_RANGE.0, RATE_SCALE_RANGE.1);
    }

    pub fn phase_offset(&self) -> f32 {
        self.phase_offset as f32
    }

    pub fn set_phase_offset(&mut self, offset: f32) {
        self.phase_offset = if offset.is_finite() {
            wrap_phase(offset as f64)
        } else {
            0.0
        };
    }

    pub fn delay(&self) -> f32 {
        self.delay_seconds
    }

    pub fn set_delay(&mut self, seconds: f32) {
        self.delay_seconds = if seconds.is_finite() {
            seconds.clamp(0.0, MAX_DELAY_SECONDS)
        } else {
            0.0
        };
    }

    pub fn range(&self) -> (f32, f32) {
        (self.min, self.max)
    }

    /// Output range, each end clamped to [-1, 1]. `min > max` inverts the shape.
    pub fn set_range(&mut self, min: f32, max: f32) {
        let clamp = |v: f32| if v.is_finite() { v.clamp(-1.0, 1.0) } else { 0.0 };
        self.min = clamp(min);
        self.max = clamp(max);
    }

    pub fn retrigger(&self) -> bool {
        self.retrigger
    }

    pub fn set_retrigger(&mut self, retrigger: bool) {
        self.retrigger = retrigger;
    }
}

#[inline]
fn clamp_rate(rate_hz: f32) -> f32 {
    if rate_hz.is_finite() {
        rate_hz.clamp(MIN_RATE_HZ, MAX_RATE_HZ)
    } else {
        MIN_RATE_HZ
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 48_000.0;

    fn running(shape: LfoShape, rate: f32) -> Lfo {
        let mut lfo = Lfo::new(shape, rate);
        lfo.start();
        lfo
    }

    #[test]
    fn test_bipolar_to_unipolar() {
        assert!((bipolar_to_unipolar(-1.0) - 0.0).abs() < 1e-6);
        assert!((bipolar_to_unipolar(0.0) - 0.5).abs() < 1e-6);
        assert!((bipolar_to_unipolar(1.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_samples_per_period() {
        assert!((samples_per_period(5.0, 48000.0) - 9600.0).abs() < 1e-6);
        assert!((samples_per_period(1.0, 48000.0) - 48000.0).abs() < 1e-6);
    }

    #[test]
    fn sine_cycle_takes_round_s_over_r_samples() {
        for rate in [1.0f32, 3.0, 7.0, 13.5, 50.0] {
            let mut lfo = running(LfoShape::Sine, rate);
            let n = (SR / rate).round() as usize;
            let first = lfo.process(SR);
            for _ in 1..n {
                lfo.process(SR);
            }
            // Sample n is the start of the second cycle
            let wrapped = lfo.process(SR);
            assert!(
                (wrapped - first).abs() < 1e-2,
                "rate {rate}: {wrapped} after {n} samples, started at {first}"
            );
            let phase_error = lfo.phase().min(1.0 - lfo.phase());
            assert!(phase_error < 1.0 / n as f64, "rate {rate}: phase {}", lfo.phase());
        }
    }

    #[test]
    fn quarter_note_at_120_bpm_is_two_hz() {
        let mut synced = Lfo::new(LfoShape::Sine, 0.3);
        synced.set_sync(Some(NoteValue::QUARTER));
        synced.set_tempo(120.0);
        assert!((synced.effective_rate() - 2.0).abs() < 1e-6);

        synced.start();
        let mut free = running(LfoShape::Sine, 2.0);
        for _ in 0..10_000 {
            assert!((synced.process(SR) - free.process(SR)).abs() < 1e-5);
        }
    }

    #[test]
    fn leaving_sync_restores_the_free_rate() {
        let mut lfo = Lfo::new(LfoShape::Triangle, 4.0);
        lfo.set_sync(Some(NoteValue::EIGHTH));
        lfo.set_tempo(90.0);
        assert!((lfo.effective_rate() - 3.0).abs() < 1e-6);
        lfo.set_sync(None);
        assert_eq!(lfo.effective_rate(), 4.0);
    }

    #[test]
    fn stopped_lfo_holds_the_range_centre() {
        let mut lfo = Lfo::new(LfoShape::Saw, 5.0);
        lfo.set_range(0.0, 1.0);
        assert!((0..100).all(|_| lfo.process(SR) == 0.5));
        assert_eq!(lfo.phase(), 0.0);

        lfo.start();
        lfo.process(SR);
        lfo.stop();
        let frozen = lfo.phase();
        lfo.process(SR);
        assert_eq!(lfo.phase(), frozen);
    }

    #[test]
    fn delay_fades_the_output_in() {
        let mut lfo = running(LfoShape::Square, 1.0);
        lfo.set_delay(0.1);
        lfo.reset();

        // Square starts at +1; fade scales it from 0 towards 1 over 4800 samples
        let out: Vec<f32> = (0..9_600).map(|_| lfo.process(SR)).collect();
        assert!(out[0].abs() < 1e-6);
        assert!((out[2_400] - 0.5).abs() < 1e-3);
        assert!((out[9_599] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn unipolar_fade_starts_at_rest() {
        let mut lfo = running(LfoShape::Square, 1.0);
        lfo.set_range(0.0, 1.0);
        lfo.set_delay(0.1);
        lfo.reset();

        let out: Vec<f32> = (0..9_600).map(|_| lfo.process(SR)).collect();
        assert!(out[0].abs() < 1e-6, "started at {}", out[0]);
        assert!((out[2_400] - 0.5).abs() < 1e-3);
        assert!((out[9_599] - 1.0).abs() < 1e-6);

        lfo.set_range(0.2, 0.6);
        lfo.reset();
        assert!((lfo.process(SR) - 0.2).abs() < 1e-6);
    }

    #[test]
    fn sample_and_hold_steps_once_per_period() {
        let mut lfo = running(LfoShape::SampleHold, 10.0);
        let out: Vec<f32> = (0..14_400).map(|_| lfo.process(SR)).collect();

        for period in out.chunks(4_800) {
            assert!(period.iter().all(|&v| v == period[0]));
        }
        let distinct = out
            .chunks(4_800)
            .map(|p| p[0])
            .collect::<Vec<_>>()
            .windows(2)
            .filter(|w| w[0] != w[1])
            .count();
        assert!(distinct >= 1);
    }

    #[test]
    fn random_glides_without_jumps() {
        let mut lfo = running(LfoShape::Random, 20.0);
        let mut previous = lfo.process(SR);
        for _ in 0..48_000 {
            let next = lfo.process(SR);
            assert!((next - previous).abs() <= 2.0 * RANDOM_GLIDE + 1e-6);
            assert!((-1.0..=1.0).contains(&next));
            previous = next;
        }
    }

    #[test]
    fn output_maps_into_the_range() {
        let mut lfo = running(LfoShape::Sine, 5.0);
        lfo.set_range(0.2, 0.6);
        for _ in 0..48_000 {
            let v = lfo.process(SR);
            assert!((0.2 - 1e-6..=0.6 + 1e-6).contains(&v), "{v} escaped the range");
        }
    }

    #[test]
    fn retrigger_is_opt_in() {
        let mut lfo = running(LfoShape::Saw, 2.0);
        for _ in 0..1_000 {
            lfo.process(SR);
        }
        let before = lfo.phase();
        lfo.note_on();
        assert_eq!(lfo.phase(), before);

        lfo.set_retrigger(true);
        lfo.set_phase_offset(0.25);
        lfo.note_on();
        assert!((lfo.phase() - 0.25).abs() < 1e-9);
    }

    #[test]
    fn rate_modulation_is_bounded() {
        let mut lfo = Lfo::new(LfoShape::Sine, 2.0);
        lfo.set_rate_modulation(1.0);
        assert!((lfo.effective_rate() - 8.0).abs() < 1e-5);
        lfo.set_rate_modulation(-5.0);
        assert!((lfo.effective_rate() - 0.5).abs() < 1e-5);
    }

    #[test]
    fn setters_round_trip_and_clamp() {
        let mut lfo = Lfo::new(LfoShape::Sine, 1.0);
        lfo.set_rate(7.5);
        assert_eq!(lfo.rate(), 7.5);
        lfo.set_rate(500.0);
        assert_eq!(lfo.rate(), MAX_RATE_HZ);
        lfo.set_rate(0.0);
        assert_eq!(lfo.rate(), MIN_RATE_HZ);

        lfo.set_delay(2.5);
        assert_eq!(lfo.delay(), 2.5);
        lfo.set_delay(99.0);
        assert_eq!(lfo.delay(), MAX_DELAY_SECONDS);

        lfo.set_range(-0.5, 3.0);
        assert_eq!(lfo.range(), (-0.5, 1.0));

        lfo.set_phase_offset(0.75);
        assert_eq!(lfo.phase_offset(), 0.75);
        lfo.set_shape(LfoShape::Random);
        assert_eq!(lfo.shape(), LfoShape::Random);
    }
}
