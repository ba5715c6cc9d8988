//! Noise source.
//!
//! White noise comes from a seeded `oorandom` generator so renders are
//! reproducible. Pink uses Paul Kellet's refined filter bank, brown a leaky
//! integrator. A one-pole low-pass "tone" control follows every colour.

use std::f32::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use oorandom::Rand32;

pub const DEFAULT_NOISE_SEED: u64 = 0x5EED_0F_A0D10;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseColor {
    White,
    Pink,
    Brown,
}

#[derive(Debug, Clone)]
pub struct NoiseGenerator {
    color: NoiseColor,
    level: f32,
    tone_hz: f32,
    rng: Rand32,
    pink: [f32; 7],
    brown: f32,
    tone_state: f32,
}

impl NoiseGenerator {
    pub fn new(color: NoiseColor) -> Self {
        Self {
            color,
            level: 0.0,
            tone_hz: 20_000.0,
            rng: Rand32::new(DEFAULT_NOISE_SEED),
            pink: [0.0; 7],
            brown: 0.0,
            tone_state: 0.0,
        }
    }

    /// Restart the random sequence from `seed` and clear the filter state.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = Rand32::new(seed);
        self.pink = [0.0; 7];
        self.brown = 0.0;
        self.tone_state = 0.0;
    }

    #[inline]
    fn white(&mut self) -> f32 {
        self.rng.rand_float() * 2.0 - 1.0
    }

    #[inline]
    pub fn process(&mut self, sample_rate: f32) -> f32 {
        if self.level <= 0.0 {
            return 0.0;
        }

        let white = self.white();
        let coloured = match self.color {
            NoiseColor::White => white,
            NoiseColor::Pink => {
                let b = &mut self.pink;
                b[0] = 0.99886 * b[0] + white * 0.055_517_9;
                b[1] = 0.99332 * b[1] + white * 0.075_075_9;
                b[2] = 0.96900 * b[2] + white * 0.153_852;
                b[3] = 0.86650 * b[3] + white * 0.310_485_6;
                b[4] = 0.55000 * b[4] + white * 0.532_952_2;
                b[5] = -0.7616 * b[5] - white * 0.016_898;
                let pink = b[0] + b[1] + b[2] + b[3] + b[4] + b[5] + b[6] + white * 0.5362;
                b[6] = white * 0.115_926;
                pink * 0.11
            }
            NoiseColor::Brown => {
                self.brown = (self.brown + 0.02 * white) / 1.02;
                self.brown * 3.5
            }
        };

        // One-pole low-pass; fully open at the top of the range
        let coefficient = 1.0 - (-TAU * self.tone_hz / sample_rate.max(1.0)).exp();
        self.tone_state += coefficient.clamp(0.0, 1.0) * (coloured - self.tone_state);
        self.tone_state * self.level
    }

    pub fn color(&self) -> NoiseColor {
        self.color
    }

    pub fn set_color(&mut self, color: NoiseColor) {
        self.color = color;
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn set_level(&mut self, level: f32) {
        self.level = if level.is_finite() { level.clamp(0.0, 1.0) } else { 0.0 };
    }

    pub fn tone(&self) -> f32 {
        self.tone_hz
    }

    pub fn set_tone(&mut self, cutoff_hz: f32) {
        self.tone_hz = if cutoff_hz.is_finite() {
            cutoff_hz.clamp(20.0, 20_000.0)
        } else {
            20_000.0
        };
    }
}
