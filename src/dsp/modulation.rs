//! Modulation matrix and block-rate modulation helpers.

/*
Modulation Routing
==================

A source (LFO, envelope, velocity, ...) is wired to a destination (cutoff,
pitch, ...) through a slot carrying a bipolar amount:

    slot = { source, destination, amount in [-1, 1], enabled }

The matrix holds 16 slots and the latest value of every source. Voices push
source values, then ask for the net modulation of each destination:

    modulation_for(dest) = clamp( Σ source_value(s.source) · s.amount , -1, 1 )
                           over enabled slots with s.destination == dest
                           and s.source != None

Source values are stored as given (non-finite becomes 0); only the sum is
clamped, so a source running past ±1 still scales linearly through a small
amount:

    source 2.0, amount 0.3 -> 0.6
    source 2.0, amount 1.0 -> 1.0

That result is a normalised [-1, 1] amount. Turning it into Hz, semitones or
gain is the destination owner's job, e.g. the voice maps cutoff modulation to
±4 octaves and pitch modulation to ±12 semitones.

Evaluation is a linear pass over the fixed slot array. `ModMatrix` is
`Copy`; the control thread swaps a whole new routing in through the message
ring rather than editing one in place.


Block-Rate vs Sample-Rate Modulation
------------------------------------

Modulation is applied at control rate: once every MOD_UPDATE_INTERVAL samples
(see `synth::voice`). Each source is reduced to one value per interval by
averaging, which represents the middle of the interval instead of its first
sample:

For an LFO at 5 Hz, 32-sample interval at 48kHz:
    - Interval: 32/48000 = ~0.67ms
    - LFO period: 200ms
    - Updates per LFO cycle: 300


Parameter Clamping
------------------

Modulation can push parameters outside valid ranges:

    base = 500 Hz, depth = 1000 Hz, LFO = -1.0
    result = -500 Hz  (invalid! frequency can't be negative)

The target is responsible for clamping; every setter on the DSP types clamps
its input, so modulated values can be handed over without checks.
*/

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const MOD_SLOTS: usize = 16;

/// Calculate the modulated parameter value: base + (modulator × depth)
#[inline]
pub fn apply_modulation(base_value: f32, modulator: f32, depth: f32) -> f32 {
    base_value + (modulator * depth)
}

/// Calculate the average of a modulator signal over a block.
#[inline]
pub fn block_average(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f32>() / samples.len() as f32
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModSource {
    /// Sentinel: the slot is sourceless and contributes nothing.
    None,
    Lfo1,
    Lfo2,
    AmpEnvelope,
    FilterEnvelope,
    Velocity,
    KeyTrack,
    ModWheel,
    Aftertouch,
}

impl ModSource {
    pub const COUNT: usize = 9;

    pub const ALL: [ModSource; ModSource::COUNT] = [
        ModSource::None,
        ModSource::Lfo1,
        ModSource::Lfo2,
        ModSource::AmpEnvelope,
        ModSource::FilterEnvelope,
        ModSource::Velocity,
        ModSource::KeyTrack,
        ModSource::ModWheel,
        ModSource::Aftertouch,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModDestination {
    /// Both oscillators.
    Pitch,
    Osc1Pitch,
    Osc2Pitch,
    Osc1Level,
    Osc2Level,
    Osc1WavetablePosition,
    Osc2WavetablePosition,
    FmDepth,
    SubLevel,
    NoiseLevel,
    FilterCutoff,
    FilterResonance,
    FilterDrive,
    Pan,
    Amplitude,
    Lfo1Rate,
    Lfo2Rate,
}

impl ModDestination {
    pub const COUNT: usize = 17;

    pub const ALL: [ModDestination; ModDestination::COUNT] = [
        ModDestination::Pitch,
        ModDestination::Osc1Pitch,
        ModDestination::Osc2Pitch,
        ModDestination::Osc1Level,
        ModDestination::Osc2Level,
        ModDestination::Osc1WavetablePosition,
        ModDestination::Osc2WavetablePosition,
        ModDestination::FmDepth,
        ModDestination::SubLevel,
        ModDestination::NoiseLevel,
        ModDestination::FilterCutoff,
        ModDestination::FilterResonance,
        ModDestination::FilterDrive,
        ModDestination::Pan,
        ModDestination::Amplitude,
        ModDestination::Lfo1Rate,
        ModDestination::Lfo2Rate,
    ];
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModSlot {
    pub source: ModSource,
    pub destination: ModDestination,
    /// Bipolar amount in [-1, 1].
    pub amount: f32,
    pub enabled: bool,
}

impl ModSlot {
    pub const EMPTY: ModSlot = ModSlot {
        source: ModSource::None,
        destination: ModDestination::Pitch,
        amount: 0.0,
        enabled: false,
    };

    /// An enabled slot; the amount is clamped to [-1, 1].
    pub fn new(source: ModSource, destination: ModDestination, amount: f32) -> Self {
        Self {
            source,
            destination,
            amount: clamp_bipolar(amount),
            enabled: true,
        }
    }

    #[inline]
    fn is_live(&self) -> bool {
        self.enabled && self.source != ModSource::None
    }
}

impl Default for ModSlot {
    fn default() -> Self {
        Self::EMPTY
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModMatrix {
    slots: [ModSlot; MOD_SLOTS],
    source_values: [f32; ModSource::COUNT],
}

impl Default for ModMatrix {
    fn default() -> Self {
        Self::new()
    }
}

impl ModMatrix {
    pub const fn new() -> Self {
        Self {
            slots: [ModSlot::EMPTY; MOD_SLOTS],
            source_values: [0.0; ModSource::COUNT],
        }
    }

    /// Out-of-range indices are ignored. The amount is re-clamped.
    pub fn set_slot(&mut self, index: usize, slot: ModSlot) {
        if let Some(target) = self.slots.get_mut(index) {
            *target = ModSlot {
                amount: clamp_bipolar(slot.amount),
                ..slot
            };
        }
    }

    pub fn clear_slot(&mut self, index: usize) {
        if let Some(target) = self.slots.get_mut(index) {
            *target = ModSlot::EMPTY;
        }
    }

    pub fn slot(&self, index: usize) -> Option<&ModSlot> {
        self.slots.get(index)
    }

    pub fn slots(&self) -> &[ModSlot; MOD_SLOTS] {
        &self.slots
    }

    pub fn set_enabled(&mut self, index: usize, enabled: bool) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.enabled = enabled;
        }
    }

    /// Number of slots that can currently contribute.
    pub fn active_slots(&self) -> usize {
        self.slots.iter().filter(|s| s.is_live()).count()
    }

    /// Store the latest value of a source. `ModSource::None` cannot be set;
    /// non-finite values are stored as 0.
    pub fn set_source_value(&mut self, source: ModSource, value: f32) {
        if source != ModSource::None {
            self.source_values[source.index()] = if value.is_finite() { value } else { 0.0 };
        }
    }

    pub fn source_value(&self, source: ModSource) -> f32 {
        self.source_values[source.index()]
    }

    /// Net normalised modulation on `destination`, clamped to [-1, 1].
    #[inline]
    pub fn modulation_for(&self, destination: ModDestination) -> f32 {
        let mut total = 0.0;
        for slot in &self.slots {
            if slot.is_live() && slot.destination == destination {
                total += self.source_values[slot.source.index()] * slot.amount;
            }
        }
        total.clamp(-1.0, 1.0)
    }

    /// Take `other`'s routing, keep this matrix's source values.
    pub fn replace_routing(&mut self, other: &ModMatrix) {
        self.slots = other.slots;
    }

    /// Empty every slot.
    pub fn clear(&mut self) {
        self.slots = [ModSlot::EMPTY; MOD_SLOTS];
    }
}

#[inline]
fn clamp_bipolar(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}
