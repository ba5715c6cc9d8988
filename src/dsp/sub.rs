//! Sub-oscillator.
//!
//! A plain shape one or two octaves under the voice pitch, mixed in to add
//! weight. The voice hands it the note frequency with pitch bend and the
//! global pitch route applied. Per-oscillator octave, fine and pitch routes
//! do not move it.

use std::f64::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::wrap_phase;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubShape {
    Sine,
    Square,
    Triangle,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubOctave {
    One,
    Two,
}

impl SubOctave {
    #[inline]
    pub fn divisor(self) -> f32 {
        match self {
            SubOctave::One => 2.0,
            SubOctave::Two => 4.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SubOscillator {
    shape: SubShape,
    octave: SubOctave,
    level: f32,
    phase: f64,
}

impl SubOscillator {
    pub fn new(shape: SubShape, octave: SubOctave) -> Self {
        Self {
            shape,
            octave,
            level: 0.0,
            phase: 0.0,
        }
    }

    #[inline]
    pub fn process(&mut self, base_frequency: f32, sample_rate: f32) -> f32 {
        if self.level <= 0.0 {
            return 0.0;
        }

        let frequency = (base_frequency / self.octave.divisor()).clamp(0.0, sample_rate * 0.5);
        let p = self.phase;
        let value = match self.shape {
            SubShape::Sine => (TAU * p).sin(),
            SubShape::Square => {
                if p < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            SubShape::Triangle => 1.0 - 4.0 * (p - 0.5).abs(),
        };

        self.phase = wrap_phase(p + frequency as f64 / sample_rate.max(1.0) as f64);
        value as f32 * self.level
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    pub fn shape(&self) -> SubShape {
        self.shape
    }

    pub fn set_shape(&mut self, shape: SubShape) {
        self.shape = shape;
    }

    pub fn octave(&self) -> SubOctave {
        self.octave
    }

    pub fn set_octave(&mut self, octave: SubOctave) {
        self.octave = octave;
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn set_level(&mut self, level: f32) {
        self.level = if level.is_finite() { level.clamp(0.0, 1.0) } else { 0.0 };
    }
}
