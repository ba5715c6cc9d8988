use std::sync::Arc;

use tracing::debug;

use crate::dsp::tempo::{clamp_bpm, DEFAULT_BPM};
use crate::dsp::unison::UnisonEngine;
use crate::dsp::wavetable::WavetableBank;
use crate::patch::Patch;
use crate::synth::message::{MessageReceiver, SynthMessage};
use crate::synth::params::{SynthMeters, SynthParam, SynthParams};
use crate::synth::voice::{SynthVoice, VoiceState};
use crate::{SynthError, MAX_BLOCK_SIZE};

/*
Voice Pool
==========

The pool is a fixed Vec of voices sized once at construction. The audio thread
never grows it; a note that finds no free voice steals one.

Allocation order for each of the note's unison voices:

    1. a Free voice
    2. the oldest Releasing voice
    3. the oldest Active voice

Every voice of one note-on gets the same age, and a voice already started for
the current note is never stolen back by its own stack.

Per block:

    drain messages ─► poll param generation ─► zero output
        ─► render voices in MAX_BLOCK_SIZE chunks (voices add in)
        ─► master gain ─► publish meters
*/

/// Fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthConfig {
    pub sample_rate: f32,
    pub max_voices: usize,
    pub max_block_size: usize,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            max_voices: 32,
            max_block_size: MAX_BLOCK_SIZE,
        }
    }
}

pub struct PolySynth<R: MessageReceiver> {
    voices: Vec<SynthVoice>,
    rx: R,
    config: SynthConfig,
    bank: Arc<WavetableBank>,
    unison: UnisonEngine,
    params: Arc<SynthParams>,
    param_generation: u64,
    param_cache: [f32; SynthParam::COUNT],
    meters: Arc<SynthMeters>,
    note_counter: u64,
    master_gain: f32,
    tempo: f32,
}

impl<R: MessageReceiver> PolySynth<R> {
    /// Allocates every voice up front. Not realtime-safe.
    pub fn new(config: SynthConfig, rx: R, bank: Arc<WavetableBank>) -> Self {
        let config = SynthConfig {
            sample_rate: config.sample_rate.max(1.0),
            max_voices: config.max_voices.max(1),
            max_block_size: config.max_block_size.clamp(1, MAX_BLOCK_SIZE),
        };

        let voices = (0..config.max_voices)
            .map(|_| {
                let mut voice = SynthVoice::new(config.sample_rate);
                voice.prepare(config.sample_rate, config.max_block_size);
                voice
            })
            .collect();

        let params = Arc::new(SynthParams::default());
        let mut param_cache = [0.0; SynthParam::COUNT];
        let param_generation = params.generation();
        params.snapshot(&mut param_cache);

        debug!(
            sample_rate = config.sample_rate,
            max_voices = config.max_voices,
            max_block_size = config.max_block_size,
            wavetables = bank.len(),
            "poly synth created"
        );

        Self {
            voices,
            rx,
            config,
            bank,
            unison: UnisonEngine::default(),
            params,
            param_generation,
            param_cache,
            meters: Arc::new(SynthMeters::default()),
            note_counter: 0,
            master_gain: Patch::default().master_gain,
            tempo: DEFAULT_BPM,
        }
    }

    /// Validate `patch` and load it into every voice. Not realtime-safe.
    pub fn load_patch(&mut self, patch: &Patch) -> Result<(), SynthError> {
        patch.validate(&self.bank)?;

        for voice in &mut self.voices {
            voice.apply_patch(patch, &self.bank);
            voice.set_tempo(self.tempo);
        }
        self.unison = patch.unison.engine();
        self.master_gain = patch.master_gain.clamp(0.0, 2.0);

        self.params.load_patch(patch);
        self.param_generation = self.params.generation();
        self.params.snapshot(&mut self.param_cache);

        debug!(patch = %patch.name, unison = self.unison.voice_count(), "patch loaded");
        Ok(())
    }

    /// Shared knob block; writes land at the next block boundary.
    pub fn params(&self) -> &Arc<SynthParams> {
        &self.params
    }

    pub fn meters(&self) -> &Arc<SynthMeters> {
        &self.meters
    }

    pub fn config(&self) -> SynthConfig {
        self.config
    }

    pub fn bank(&self) -> &Arc<WavetableBank> {
        &self.bank
    }

    pub fn unison(&self) -> &UnisonEngine {
        &self.unison
    }

    pub fn voices(&self) -> &[SynthVoice] {
        &self.voices
    }

    pub fn active_voice_count(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }

    pub fn render_block(&mut self, left: &mut [f32], right: &mut [f32]) {
        // Process control messages
        while let Some(msg) = self.rx.pop() {
            self.handle_message(msg);
        }

        let generation = self.params.generation();
        if generation != self.param_generation {
            self.param_generation = generation;
            self.params.snapshot(&mut self.param_cache);
            self.apply_params();
        }

        let frames = left.len().min(right.len());
        left.fill(0.0);
        right.fill(0.0);

        // Mix voices
        let mut start = 0;
        while start < frames {
            let count = self.config.max_block_size.min(frames - start);
            for voice in &mut self.voices {
                if voice.is_active() {
                    voice.render_next_block(left, right, start, count);
                }
            }
            start += count;
        }

        let gain = self.master_gain;
        let mut peak_left = 0.0f32;
        let mut peak_right = 0.0f32;
        for (l, r) in left[..frames].iter_mut().zip(&mut right[..frames]) {
            *l *= gain;
            *r *= gain;
            peak_left = peak_left.max(l.abs());
            peak_right = peak_right.max(r.abs());
        }

        let active = self.active_voice_count();
        self.meters.publish(peak_left, peak_right, active);
    }

    fn handle_message(&mut self, msg: SynthMessage) {
        match msg {
            SynthMessage::NoteOn { note, velocity: 0 } => self.note_off(note),
            SynthMessage::NoteOn { note, velocity } => self.note_on(note, velocity),
            SynthMessage::NoteOff { note } => self.note_off(note),
            SynthMessage::PitchBend { cents } => {
                for voice in &mut self.voices {
                    voice.set_pitch_bend(cents);
                }
            }
            SynthMessage::SetTempo { bpm } => self.set_tempo(bpm),
            SynthMessage::SetModMatrix(matrix) => {
                for voice in &mut self.voices {
                    voice.matrix_mut().replace_routing(&matrix);
                }
            }
            SynthMessage::SetUnison(engine) => self.unison = engine,
            SynthMessage::AllNotesOff => {
                for voice in &mut self.voices {
                    voice.release();
                }
            }
            SynthMessage::AllSoundOff => {
                for voice in &mut self.voices {
                    voice.reset();
                }
            }
        }
    }

    /// Start `unison.voice_count()` voices for one note.
    fn note_on(&mut self, note: u8, velocity: u8) {
        self.note_counter += 1;
        let age = self.note_counter;

        for k in 0..self.unison.voice_count() {
            let Some(idx) = self.allocate_voice(age) else {
                break;
            };
            let offsets = self.unison.voice(k);
            let voice = &mut self.voices[idx];
            voice.set_unison(offsets);
            voice.start(note, velocity, age);
        }
    }

    fn note_off(&mut self, note: u8) {
        for voice in &mut self.voices {
            if voice.state() == VoiceState::Active && voice.note() == note {
                voice.release();
            }
        }
    }

    fn allocate_voice(&self, age: u64) -> Option<usize> {
        if let Some(idx) = self.voices.iter().position(|v| v.is_free()) {
            return Some(idx);
        }

        let oldest = |state: VoiceState| {
            self.voices
                .iter()
                .enumerate()
                .filter(|(_, v)| v.state() == state && v.age() != age)
                .min_by_key(|(_, v)| v.age())
                .map(|(idx, _)| idx)
        };

        oldest(VoiceState::Releasing).or_else(|| oldest(VoiceState::Active))
    }

    fn set_tempo(&mut self, bpm: f32) {
        self.tempo = clamp_bpm(bpm);
        for voice in &mut self.voices {
            voice.set_tempo(self.tempo);
        }
    }

    fn apply_params(&mut self) {
        let values = self.param_cache;
        let get = |param: SynthParam| values[param.index()];

        self.master_gain = if get(SynthParam::MasterGain).is_finite() {
            get(SynthParam::MasterGain).clamp(0.0, 2.0)
        } else {
            0.0
        };

        for voice in &mut self.voices {
            voice.set_cutoff(get(SynthParam::FilterCutoff));
            voice.set_resonance(get(SynthParam::FilterResonance));
            voice.set_drive(get(SynthParam::FilterDrive));
            voice.set_osc_level(0, get(SynthParam::Osc1Level));
            voice.set_osc_level(1, get(SynthParam::Osc2Level));
            voice.set_wavetable_position(0, get(SynthParam::Osc1WavetablePosition));
            voice.set_wavetable_position(1, get(SynthParam::Osc2WavetablePosition));
            voice.set_fm_depth(0, get(SynthParam::FmDepth));
            voice.set_fm_depth(1, get(SynthParam::FmDepth));
            voice.set_sub_level(get(SynthParam::SubLevel));
            voice.set_noise_level(get(SynthParam::NoiseLevel));
            voice.set_lfo_rate(0, get(SynthParam::Lfo1Rate));
            voice.set_lfo_rate(1, get(SynthParam::Lfo2Rate));
            voice.set_mod_wheel(get(SynthParam::ModWheel));
            voice.set_aftertouch(get(SynthParam::Aftertouch));
            voice.refresh();
        }
    }
}
