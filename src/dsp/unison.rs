//! Unison engine: per-voice detune, pan and gain for a stacked note.
//!
//! The engine is a pure function of its settings. The voice pool asks it for
//! the offsets of each stacked voice once per note-on; nothing here changes
//! while the note plays.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const MAX_UNISON_VOICES: usize = 16;
pub const MAX_DETUNE_CENTS: f32 = 100.0;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadMode {
    /// Evenly across [-detune, +detune].
    Linear,
    /// Linear positions pulled toward the centre by a square-root warp.
    Exponential,
    /// Deterministic hash of the voice index.
    Random,
    /// Odd counts get a voice at exactly zero; the rest come in mirrored pairs.
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnisonVoice {
    pub detune_cents: f32,
    /// -1.0 = left, 1.0 = right
    pub pan: f32,
    pub gain: f32,
    /// Start phase in [0, 1)
    pub phase: f32,
}

impl UnisonVoice {
    /// A lone voice: no detune, centred, unity gain.
    pub const UNITY: UnisonVoice = UnisonVoice {
        detune_cents: 0.0,
        pan: 0.0,
        gain: 1.0,
        phase: 0.0,
    };
}

impl Default for UnisonVoice {
    fn default() -> Self {
        Self::UNITY
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnisonEngine {
    voice_count: usize,
    detune_cents: f32,
    mode: SpreadMode,
    stereo_spread: f32,
    blend: f32,
    phase_randomize: bool,
}

impl Default for UnisonEngine {
    fn default() -> Self {
        Self {
            voice_count: 1,
            detune_cents: 0.0,
            mode: SpreadMode::Linear,
            stereo_spread: 0.0,
            blend: 1.0,
            phase_randomize: false,
        }
    }
}

impl UnisonEngine {
    pub fn new(voice_count: usize, detune_cents: f32, mode: SpreadMode) -> Self {
        let mut engine = Self::default();
        engine.set_voice_count(voice_count);
        engine.set_detune(detune_cents);
        engine.set_mode(mode);
        engine
    }

    /// Offsets for voice `index`. Indices past the count are clamped to the last voice.
    /// Fields are re-clamped on read; a deserialized engine skips the setters.
    pub fn voice(&self, index: usize) -> UnisonVoice {
        let n = self.voice_count();
        let i = index.min(n - 1);
        let gain = clamp_unit(self.blend) / (n as f32).sqrt();
        let phase = if self.phase_randomize && n > 1 {
            hash_unit(i as f32 + 0.5)
        } else {
            0.0
        };

        if n == 1 {
            return UnisonVoice {
                detune_cents: 0.0,
                pan: 0.0,
                gain,
                phase,
            };
        }

        let linear = (i as f32 / (n - 1) as f32) * 2.0 - 1.0;
        let position = match self.mode {
            SpreadMode::Linear => linear,
            SpreadMode::Exponential => {
                linear.signum() * (1.0 - (1.0 - linear.abs()).sqrt())
            }
            SpreadMode::Random => hash_unit(i as f32) * 2.0 - 1.0,
            SpreadMode::Center => center_position(i, n),
        };

        let detune = if self.detune_cents.is_finite() {
            self.detune_cents.clamp(0.0, MAX_DETUNE_CENTS)
        } else {
            0.0
        };
        UnisonVoice {
            detune_cents: position * detune,
            pan: linear * clamp_unit(self.stereo_spread),
            gain,
            phase,
        }
    }

    pub fn voices(&self) -> impl Iterator<Item = UnisonVoice> + '_ {
        (0..self.voice_count()).map(move |i| self.voice(i))
    }

    pub fn voice_count(&self) -> usize {
        self.voice_count.clamp(1, MAX_UNISON_VOICES)
    }

    pub fn set_voice_count(&mut self, count: usize) {
        self.voice_count = count.clamp(1, MAX_UNISON_VOICES);
    }

    pub fn detune(&self) -> f32 {
        self.detune_cents
    }

    pub fn set_detune(&mut self, cents: f32) {
        self.detune_cents = if cents.is_finite() {
            cents.clamp(0.0, MAX_DETUNE_CENTS)
        } else {
            0.0
        };
    }

    pub fn mode(&self) -> SpreadMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: SpreadMode) {
        self.mode = mode;
    }

    pub fn stereo_spread(&self) -> f32 {
        self.stereo_spread
    }

    pub fn set_stereo_spread(&mut self, spread: f32) {
        self.stereo_spread = clamp_unit(spread);
    }

    pub fn blend(&self) -> f32 {
        self.blend
    }

    pub fn set_blend(&mut self, blend: f32) {
        self.blend = clamp_unit(blend);
    }

    pub fn phase_randomize(&self) -> bool {
        self.phase_randomize
    }

    pub fn set_phase_randomize(&mut self, enabled: bool) {
        self.phase_randomize = enabled;
    }
}

/// Classic shader hash: fract(sin(x * 12.9898) * 43758.5453), in [0, 1).
/// Kept in f32 so a given index always lands on the same value.
#[inline]
fn hash_unit(x: f32) -> f32 {
    let v = (x * 12.9898).sin() * 43758.5453;
    let f = v - v.floor();
    if f >= 1.0 {
        0.0
    } else {
        f
    }
}

/// Centre-paired position in [-1, 1].
///
/// Odd n:  0, -1/h, +1/h, -2/h, +2/h, ...            (h = (n - 1) / 2)
/// Even n: -0.5/h, +0.5/h, -1.5/h, +1.5/h, ...       (h = n / 2 - 0.5)
fn center_position(i: usize, n: usize) -> f32 {
    if n % 2 == 1 {
        if i == 0 {
            return 0.0;
        }
        let k = ((i + 1) / 2) as f32;
        let magnitude = k / ((n - 1) / 2) as f32;
        if i % 2 == 1 {
            -magnitude
        } else {
            magnitude
        }
    } else {
        let k = (i / 2) as f32 + 0.5;
        let magnitude = k / (n as f32 / 2.0 - 0.5);
        if i % 2 == 0 {
            -magnitude
        } else {
            magnitude
        }
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
