use crate::MIN_TIME;

/*
ADSR Envelope
=============

A linear ADSR drives each voice's amplitude, and a second one feeds the
filter-envelope modulation source.

  Level
    1.0 ┐     ╱╲
        │    ╱  ╲___________
    S   │   ╱               ╲
        │  ╱                 ╲
    0.0 └─╱───────────────────╲──→ Time
        Attack Decay  Sustain  Release

Time to Increment
-----------------

    increment = target_change / (time_seconds * sample_rate)

Attack of 0.1 s at 48kHz: 4800 samples, increment = 1/4800.

The increments are cached and recomputed only when a time or the sample rate
changes, so the per-sample path is one add and one compare.

State Machine
-------------

    Idle ──trigger──► Attack ──level=1──► Decay ──level=S──► Sustain
      ▲                  │                  │                   │
      │                  └───── release ────┴───────────────────┘
      │                                     ▼
      └─────────────── level=0 ───────── Release

release() works from ANY stage and starts from the CURRENT level, not the
sustain level, so letting go mid-attack does not click. Release is a snapshot
of (start level, total samples) interpolated to exactly 0.0; reaching Idle is
what frees the voice.

trigger() always restarts from zero. A stolen voice is therefore hard
retriggered.
*/

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeState {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

#[derive(Debug, Clone)]
pub struct Envelope {
    attack_time: f32,
    decay_time: f32,
    sustain_level: f32,
    release_time: f32,
    sample_rate: f32,

    attack_step: f32,
    decay_step: f32,

    stage: EnvelopeState,
    level: f32,

    release_start_level: f32,
    release_total_samples: u32,
    release_elapsed_samples: u32,
}

impl Default for Envelope {
    fn default() -> Self {
        Self::adsr(0.01, 0.1, 0.7, 0.3)
    }
}

impl Envelope {
    pub fn adsr(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        let mut env = Self {
            attack_time: clamp_time(attack),
            decay_time: clamp_time(decay),
            sustain_level: clamp_level(sustain),
            release_time: clamp_time(release),
            sample_rate: 48_000.0,
            attack_step: 0.0,
            decay_step: 0.0,
            stage: EnvelopeState::Idle,
            level: 0.0,
            release_start_level: 0.0,
            release_total_samples: 1,
            release_elapsed_samples: 0,
        };
        env.update_steps();
        env
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate.max(1.0);
        self.update_steps();
    }

    fn update_steps(&mut self) {
        self.attack_step = 1.0 / (self.attack_time * self.sample_rate);
        self.decay_step = (1.0 - self.sustain_level) / (self.decay_time * self.sample_rate);
    }

    /// Gate high: attack from zero.
    pub fn trigger(&mut self) {
        self.level = 0.0;
        self.stage = EnvelopeState::Attack;
        self.release_elapsed_samples = 0;
    }

    /// Gate low: release from the current level.
    pub fn release(&mut self) {
        if matches!(self.stage, EnvelopeState::Idle | EnvelopeState::Release) {
            return;
        }

        self.release_start_level = self.level;
        self.release_total_samples = (self.release_time * self.sample_rate).round().max(1.0) as u32;
        self.release_elapsed_samples = 0;
        self.stage = EnvelopeState::Release;
    }

    /// Advance one sample and return the new level.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        match self.stage {
            EnvelopeState::Idle => {
                self.level = 0.0;
            }
            EnvelopeState::Attack => {
                self.level += self.attack_step;
                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.stage = EnvelopeState::Decay;
                }
            }
            EnvelopeState::Decay => {
                self.level -= self.decay_step;
                if self.level <= self.sustain_level {
                    self.level = self.sustain_level;
                    self.stage = EnvelopeState::Sustain;
                }
            }
            EnvelopeState::Sustain => {
                self.level = self.sustain_level;
            }
            EnvelopeState::Release => {
                let progress =
                    self.release_elapsed_samples as f32 / self.release_total_samples as f32;
                self.level = (self.release_start_level * (1.0 - progress)).max(0.0);

                self.release_elapsed_samples = self.release_elapsed_samples.saturating_add(1);
                if self.release_elapsed_samples >= self.release_total_samples {
                    self.level = 0.0;
                    self.stage = EnvelopeState::Idle;
                }
            }
        }

        debug_assert!((0.0..=1.0).contains(&self.level));
        self.level
    }

    /// True until the release has reached zero.
    pub fn is_active(&self) -> bool {
        self.stage != EnvelopeState::Idle
    }

    pub fn is_releasing(&self) -> bool {
        self.stage == EnvelopeState::Release
    }

    pub fn reset(&mut self) {
        self.stage = EnvelopeState::Idle;
        self.level = 0.0;
        self.release_start_level = 0.0;
        self.release_elapsed_samples = 0;
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn state(&self) -> EnvelopeState {
        self.stage
    }

    pub fn attack(&self) -> f32 {
        self.attack_time
    }

    pub fn set_attack(&mut self, seconds: f32) {
        self.attack_time = clamp_time(seconds);
        self.update_steps();
    }

    pub fn decay(&self) -> f32 {
        self.decay_time
    }

    pub fn set_decay(&mut self, seconds: f32) {
        self.decay_time = clamp_time(seconds);
        self.update_steps();
    }

    pub fn sustain(&self) -> f32 {
        self.sustain_level
    }

    pub fn set_sustain(&mut self, level: f32) {
        self.sustain_level = clamp_level(level);
        self.update_steps();
    }

    pub fn release_time(&self) -> f32 {
        self.release_time
    }

    /// Takes effect at the next `release()`.
    pub fn set_release(&mut self, seconds: f32) {
        self.release_time = clamp_time(seconds);
    }
}

#[inline]
fn clamp_time(seconds: f32) -> f32 {
    if seconds.is_finite() {
        seconds.clamp(MIN_TIME, 30.0)
    } else {
        MIN_TIME
    }
}

#[inline]
fn clamp_level(level: f32) -> f32 {
    if level.is_finite() {
        level.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
