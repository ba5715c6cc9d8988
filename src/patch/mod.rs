//! Serializable voice configuration.
//!
//! A `Patch` is plain data: it can be built in code, loaded through the
//! optional `serde` feature, validated against a wavetable bank, and then
//! handed to `PolySynth::load_patch`. Voices copy what they need out of it;
//! nothing here is read on the audio thread.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::dsp::analog::FilterModel;
use crate::dsp::filter::FilterType;
use crate::dsp::lfo::LfoShape;
use crate::dsp::modulation::{ModDestination, ModMatrix, ModSlot, ModSource, MOD_SLOTS};
use crate::dsp::noise::NoiseColor;
use crate::dsp::oscillator::Waveform;
use crate::dsp::sub::{SubOctave, SubShape};
use crate::dsp::tempo::NoteValue;
use crate::dsp::unison::{SpreadMode, UnisonEngine};
use crate::dsp::wavetable::WavetableBank;
use crate::SynthError;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    pub name: String,
    pub description: Option<String>,
    pub oscillators: [OscillatorDescriptor; 2],
    pub sub: SubDescriptor,
    pub noise: NoiseDescriptor,
    pub filter: FilterDescriptor,
    pub amplitude_envelope: EnvelopeDescriptor,
    pub filter_envelope: EnvelopeDescriptor,
    pub lfos: [LfoDescriptor; 2],
    pub unison: UnisonDescriptor,
    /// At most `MOD_SLOTS` routes, loaded into slots in order.
    pub modulation: Vec<ModSlot>,
    /// How much velocity scales amplitude, 0 = ignore velocity.
    pub velocity_sensitivity: f32,
    pub master_gain: f32,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OscillatorSource {
    Basic(Waveform),
    Wavetable { table_id: u32, position: f32 },
    Fm { ratio: f32, depth: f32 },
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OscillatorDescriptor {
    pub source: OscillatorSource,
    pub level: f32,
    pub pan: f32,
    pub octave: i32,
    pub semitones: i32,
    pub fine_cents: f32,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubDescriptor {
    pub shape: SubShape,
    pub octave: SubOctave,
    pub level: f32,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseDescriptor {
    pub color: NoiseColor,
    pub level: f32,
    pub tone_hz: f32,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterDescriptor {
    pub model: FilterModel,
    pub filter_type: FilterType,
    pub cutoff_hz: f32,
    pub resonance: f32,
    pub drive: f32,
    /// Filter envelope depth in octaves, bipolar.
    pub envelope_octaves: f32,
    /// 0 = fixed cutoff, 1 = cutoff follows the played pitch.
    pub key_tracking: f32,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeDescriptor {
    pub attack_ms: f32,
    pub decay_ms: f32,
    pub sustain_level: f32,
    pub release_ms: f32,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LfoDescriptor {
    pub shape: LfoShape,
    pub rate_hz: f32,
    pub sync: Option<NoteValue>,
    pub phase_offset: f32,
    pub delay_ms: f32,
    pub min: f32,
    pub max: f32,
    pub retrigger: bool,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnisonDescriptor {
    pub voices: usize,
    pub detune_cents: f32,
    pub mode: SpreadMode,
    pub stereo_spread: f32,
    pub blend: f32,
    pub phase_randomize: bool,
}

impl Default for OscillatorDescriptor {
    fn default() -> Self {
        Self {
            source: OscillatorSource::Basic(Waveform::Saw),
            level: 0.8,
            pan: 0.0,
            octave: 0,
            semitones: 0,
            fine_cents: 0.0,
        }
    }
}

impl Default for EnvelopeDescriptor {
    fn default() -> Self {
        Self {
            attack_ms: 5.0,
            decay_ms: 200.0,
            sustain_level: 0.7,
            release_ms: 250.0,
        }
    }
}

impl Default for LfoDescriptor {
    fn default() -> Self {
        Self {
            shape: LfoShape::Sine,
            rate_hz: 5.0,
            sync: None,
            phase_offset: 0.0,
            delay_ms: 0.0,
            min: -1.0,
            max: 1.0,
            retrigger: false,
        }
    }
}

impl Default for UnisonDescriptor {
    fn default() -> Self {
        Self {
            voices: 1,
            detune_cents: 0.0,
            mode: SpreadMode::Linear,
            stereo_spread: 0.0,
            blend: 1.0,
            phase_randomize: false,
        }
    }
}

impl UnisonDescriptor {
    /// Clamped engine for these settings.
    pub fn engine(&self) -> UnisonEngine {
        let mut engine = UnisonEngine::new(self.voices, self.detune_cents, self.mode);
        engine.set_stereo_spread(self.stereo_spread);
        engine.set_blend(self.blend);
        engine.set_phase_randomize(self.phase_randomize);
        engine
    }
}

impl Default for Patch {
    /// The init patch: one saw, second oscillator silent, open low-pass.
    fn default() -> Self {
        Self {
            name: "Init".to_string(),
            description: None,
            oscillators: [
                OscillatorDescriptor::default(),
                OscillatorDescriptor {
                    level: 0.0,
                    ..OscillatorDescriptor::default()
                },
            ],
            sub: SubDescriptor {
                shape: SubShape::Sine,
                octave: SubOctave::One,
                level: 0.0,
            },
            noise: NoiseDescriptor {
                color: NoiseColor::White,
                level: 0.0,
                tone_hz: 20_000.0,
            },
            filter: FilterDescriptor {
                model: FilterModel::Neutral,
                filter_type: FilterType::LowPass,
                cutoff_hz: 20_000.0,
                resonance: 0.0,
                drive: 0.0,
                envelope_octaves: 0.0,
                key_tracking: 0.0,
            },
            amplitude_envelope: EnvelopeDescriptor::default(),
            filter_envelope: EnvelopeDescriptor::default(),
            lfos: [LfoDescriptor::default(), LfoDescriptor::default()],
            unison: UnisonDescriptor::default(),
            modulation: Vec::new(),
            velocity_sensitivity: 1.0,
            master_gain: 0.5,
        }
    }
}

impl Patch {
    /// Routing part of the patch as a matrix, source values zeroed.
    pub fn mod_matrix(&self) -> ModMatrix {
        let mut matrix = ModMatrix::new();
        for (index, slot) in self.modulation.iter().take(MOD_SLOTS).enumerate() {
            matrix.set_slot(index, *slot);
        }
        matrix
    }

    /// Reject patches the voices could not represent faithfully.
    ///
    /// Out-of-range numbers are fine (setters clamp them); non-finite numbers,
    /// routes beyond the matrix and unknown wavetable ids are not.
    pub fn validate(&self, bank: &WavetableBank) -> Result<(), SynthError> {
        let result = self.check(bank);
        if let Err(err) = &result {
            warn!(patch = %self.name, error = %err, "rejected patch");
        }
        result
    }

    fn check(&self, bank: &WavetableBank) -> Result<(), SynthError> {
        if self.modulation.len() > MOD_SLOTS {
            return Err(SynthError::TooManyRoutes {
                patch: self.name.clone(),
                count: self.modulation.len(),
                max: MOD_SLOTS,
            });
        }

        for (field, value) in self.numeric_fields() {
            if !value.is_finite() {
                return Err(SynthError::NonFinite {
                    patch: self.name.clone(),
                    field,
                });
            }
        }

        for osc in &self.oscillators {
            if let OscillatorSource::Wavetable { table_id, .. } = osc.source {
                if bank.get(table_id).is_none() {
                    return Err(SynthError::UnknownWavetable(table_id));
                }
            }
        }

        Ok(())
    }

    fn numeric_fields(&self) -> Vec<(&'static str, f32)> {
        let mut fields = Vec::with_capacity(48);

        for (names, osc) in OSC_FIELDS.iter().zip(&self.oscillators) {
            let (position, ratio, depth) = match osc.source {
                OscillatorSource::Basic(_) => (0.0, 1.0, 0.0),
                OscillatorSource::Wavetable { position, .. } => (position, 1.0, 0.0),
                OscillatorSource::Fm { ratio, depth } => (0.0, ratio, depth),
            };
            fields.extend(names.iter().copied().zip([
                osc.level,
                osc.pan,
                osc.fine_cents,
                position,
                ratio,
                depth,
            ]));
        }

        fields.extend([
            ("sub.level", self.sub.level),
            ("noise.level", self.noise.level),
            ("noise.tone_hz", self.noise.tone_hz),
            ("filter.cutoff_hz", self.filter.cutoff_hz),
            ("filter.resonance", self.filter.resonance),
            ("filter.drive", self.filter.drive),
            ("filter.envelope_octaves", self.filter.envelope_octaves),
            ("filter.key_tracking", self.filter.key_tracking),
        ]);

        let envelopes = [&self.amplitude_envelope, &self.filter_envelope];
        for (names, env) in ENVELOPE_FIELDS.iter().zip(envelopes) {
            fields.extend(names.iter().copied().zip([
                env.attack_ms,
                env.decay_ms,
                env.sustain_level,
                env.release_ms,
            ]));
        }

        for (names, lfo) in LFO_FIELDS.iter().zip(&self.lfos) {
            fields.extend(names.iter().copied().zip([
                lfo.rate_hz,
                lfo.phase_offset,
                lfo.delay_ms,
                lfo.min,
                lfo.max,
            ]));
        }

        fields.extend([
            ("unison.detune_cents", self.unison.detune_cents),
            ("unison.stereo_spread", self.unison.stereo_spread),
            ("unison.blend", self.unison.blend),
            ("velocity_sensitivity", self.velocity_sensitivity),
            ("master_gain", self.master_gain),
        ]);
        fields.extend(self.modulation.iter().map(|slot| ("modulation.amount", slot.amount)));

        fields
    }
}

const OSC_FIELDS: [[&str; 6]; 2] = [
    [
        "osc1.level",
        "osc1.pan",
        "osc1.fine_cents",
        "osc1.wavetable_position",
        "osc1.fm_ratio",
        "osc1.fm_depth",
    ],
    [
        "osc2.level",
        "osc2.pan",
        "osc2.fine_cents",
        "osc2.wavetable_position",
        "osc2.fm_ratio",
        "osc2.fm_depth",
    ],
];

const ENVELOPE_FIELDS: [[&str; 4]; 2] = [
    [
        "amplitude_envelope.attack_ms",
        "amplitude_envelope.decay_ms",
        "amplitude_envelope.sustain_level",
        "amplitude_envelope.release_ms",
    ],
    [
        "filter_envelope.attack_ms",
        "filter_envelope.decay_ms",
        "filter_envelope.sustain_level",
        "filter_envelope.release_ms",
    ],
];

const LFO_FIELDS: [[&str; 5]; 2] = [
    ["lfo1.rate_hz", "lfo1.phase_offset", "lfo1.delay_ms", "lfo1.min", "lfo1.max"],
    ["lfo2.rate_hz", "lfo2.phase_offset", "lfo2.delay_ms", "lfo2.min", "lfo2.max"],
];

/// A pad-ish wavetable patch used by the demo binary and benches.
pub fn wavetable_pad() -> Patch {
    Patch {
        name: "Formant Pad".to_string(),
        description: Some("Morphing vocal table through a warm ladder".to_string()),
        oscillators: [
            OscillatorDescriptor {
                source: OscillatorSource::Wavetable {
                    table_id: 4,
                    position: 0.2,
                },
                level: 0.7,
                ..OscillatorDescriptor::default()
            },
            OscillatorDescriptor {
                source: OscillatorSource::Basic(Waveform::Saw),
                level: 0.4,
                octave: -1,
                fine_cents: 7.0,
                ..OscillatorDescriptor::default()
            },
        ],
        sub: SubDescriptor {
            shape: SubShape::Sine,
            octave: SubOctave::One,
            level: 0.3,
        },
        noise: NoiseDescriptor {
            color: NoiseColor::Pink,
            level: 0.03,
            tone_hz: 6_000.0,
        },
        filter: FilterDescriptor {
            model: FilterModel::Ladder,
            filter_type: FilterType::LowPass,
            cutoff_hz: 1_400.0,
            resonance: 0.35,
            drive: 0.2,
            envelope_octaves: 1.5,
            key_tracking: 0.5,
        },
        amplitude_envelope: EnvelopeDescriptor {
            attack_ms: 180.0,
            decay_ms: 600.0,
            sustain_level: 0.8,
            release_ms: 900.0,
        },
        filter_envelope: EnvelopeDescriptor {
            attack_ms: 400.0,
            decay_ms: 1_200.0,
            sustain_level: 0.3,
            release_ms: 900.0,
        },
        lfos: [
            LfoDescriptor {
                shape: LfoShape::Triangle,
                rate_hz: 0.3,
                ..LfoDescriptor::default()
            },
            LfoDescriptor {
                shape: LfoShape::Sine,
                rate_hz: 5.5,
                delay_ms: 400.0,
                retrigger: true,
                ..LfoDescriptor::default()
            },
        ],
        unison: UnisonDescriptor {
            voices: 3,
            detune_cents: 12.0,
            mode: SpreadMode::Center,
            stereo_spread: 0.7,
            blend: 1.0,
            phase_randomize: true,
        },
        modulation: vec![
            ModSlot::new(ModSource::Lfo1, ModDestination::Osc1WavetablePosition, 0.4),
            ModSlot::new(ModSource::Lfo2, ModDestination::Pitch, 0.02),
            ModSlot::new(ModSource::ModWheel, ModDestination::FilterCutoff, 0.5),
            ModSlot::new(ModSource::Velocity, ModDestination::FilterCutoff, 0.15),
        ],
        velocity_sensitivity: 0.6,
        master_gain: 0.4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_patch_is_valid() {
        let bank = WavetableBank::builtin();
        assert_eq!(Patch::default().validate(&bank), Ok(()));
        assert_eq!(wavetable_pad().validate(&bank), Ok(()));
    }

    #[test]
    fn nan_fields_are_named() {
        let bank = WavetableBank::builtin();
        let mut patch = Patch::default();
        patch.filter.resonance = f32::NAN;
        assert_eq!(
            patch.validate(&bank),
            Err(SynthError::NonFinite {
                patch: "Init".to_string(),
                field: "filter.resonance",
            })
        );

        let mut patch = Patch::default();
        patch.lfos[1].max = f32::INFINITY;
        assert!(matches!(
            patch.validate(&bank),
            Err(SynthError::NonFinite { field: "lfo2.max", .. })
        ));
    }

    #[test]
    fn too_many_routes_are_rejected() {
        let bank = WavetableBank::builtin();
        let mut patch = Patch::default();
        patch.modulation =
            vec![ModSlot::new(ModSource::Lfo1, ModDestination::Pan, 0.1); MOD_SLOTS + 1];
        assert!(matches!(
            patch.validate(&bank),
            Err(SynthError::TooManyRoutes { count: 17, max: 16, .. })
        ));
    }

    #[test]
    fn unknown_wavetable_is_rejected() {
        let bank = WavetableBank::builtin();
        let mut patch = Patch::default();
        patch.oscillators[1].source = OscillatorSource::Wavetable {
            table_id: 999,
            position: 0.0,
        };
        assert_eq!(patch.validate(&bank), Err(SynthError::UnknownWavetable(999)));
    }

    #[test]
    fn routes_fill_slots_in_order() {
        let patch = wavetable_pad();
        let matrix = patch.mod_matrix();
        assert_eq!(matrix.active_slots(), patch.modulation.len());
        assert_eq!(matrix.slot(1).map(|s| s.source), Some(ModSource::Lfo2));
    }

    #[test]
    fn unison_descriptor_clamps() {
        let engine = UnisonDescriptor {
            voices: 40,
            detune_cents: 500.0,
            ..UnisonDescriptor::default()
        }
        .engine();
        assert_eq!(engine.voice_count(), 16);
        assert_eq!(engine.detune(), 100.0);
    }
}
