//! One playing note: the full per-voice signal chain.

/*
Voice Signal Flow
=================

    osc1 ──pan──┐
    osc2 ──pan──┼──► L ──► filter[0] ──┐
    sub  ───────┤                      ├──► × amp env × gain ──pan──► (+=) out L/R
    noise ──────┴──► R ──► filter[1] ──┘

Sources are rendered per sample, modulation is applied at control rate:
every MOD_UPDATE_INTERVAL samples the LFO and envelope outputs of the last
interval are averaged, pushed into the voice's ModMatrix along with velocity,
key tracking and the performance controllers, and every destination is
re-derived from its base value:

    destination        mapping of the matrix output m in [-1, 1]
    -----------        -----------------------------------------
    pitch              m · 12 semitones (plus pitch bend)
    cutoff             base · 2^(m · 4 + filter_env · env_octaves + key · tracking)
    levels/position    base + m, clamped by the component
    resonance/drive    base + m, clamped by the filter
    pan                unison pan + base + m
    amplitude          (1 + m) clamped to [0, 2]
    lfo rate           2^(2m) times the LFO's own rate

Base values only change through the setters here (or a patch), so modulation
never accumulates.
*/

use std::sync::Arc;

use tracing::debug;

use crate::dsp::analog::AnalogFilter;
use crate::dsp::envelope::Envelope;
use crate::dsp::lfo::{Lfo, LfoShape};
use crate::dsp::modulation::{
    apply_modulation, block_average, ModDestination as Dest, ModMatrix, ModSource,
};
use crate::dsp::noise::{NoiseColor, NoiseGenerator};
use crate::dsp::oscillator::{Oscillator, OscillatorMode, Waveform};
use crate::dsp::pan_gains;
use crate::dsp::sub::{SubOctave, SubOscillator, SubShape};
use crate::dsp::unison::UnisonVoice;
use crate::dsp::wavetable::{Wavetable, WavetableBank};
use crate::patch::{EnvelopeDescriptor, OscillatorSource, Patch};
use crate::synth::midi_note_to_freq;
use crate::MAX_BLOCK_SIZE;

/// Samples between modulation updates.
pub const MOD_UPDATE_INTERVAL: usize = 32;
/// Pitch range of a full-scale pitch modulation.
pub const PITCH_MOD_SEMITONES: f32 = 12.0;
/// Cutoff range of a full-scale cutoff modulation.
pub const CUTOFF_MOD_OCTAVES: f32 = 4.0;

const MIDDLE_C_HZ: f32 = 261.625_58;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Free,      // Available for allocation
    Active,    // Playing, envelope in attack/decay/sustain
    Releasing, // Key released, envelope in release phase
}

/// Unmodulated values; modulation is re-applied on top of these.
#[derive(Debug, Clone, Copy)]
struct BaseParams {
    osc_level: [f32; 2],
    wavetable_position: [f32; 2],
    fm_depth: [f32; 2],
    sub_level: f32,
    noise_level: f32,
    cutoff_hz: f32,
    resonance: f32,
    drive: f32,
    env_octaves: f32,
    key_tracking: f32,
    pan: f32,
    velocity_sensitivity: f32,
}

impl Default for BaseParams {
    fn default() -> Self {
        Self {
            osc_level: [0.8, 0.0],
            wavetable_position: [0.0; 2],
            fm_depth: [0.0; 2],
            sub_level: 0.0,
            noise_level: 0.0,
            cutoff_hz: 20_000.0,
            resonance: 0.0,
            drive: 0.0,
            env_octaves: 0.0,
            key_tracking: 0.0,
            pan: 0.0,
            velocity_sensitivity: 1.0,
        }
    }
}

/// Source history for the current control interval.
#[derive(Debug, Clone)]
struct SourceHistory {
    lfo: [[f32; MOD_UPDATE_INTERVAL]; 2],
    amp_env: [f32; MOD_UPDATE_INTERVAL],
    filter_env: [f32; MOD_UPDATE_INTERVAL],
    len: usize,
}

impl SourceHistory {
    fn new() -> Self {
        Self {
            lfo: [[0.0; MOD_UPDATE_INTERVAL]; 2],
            amp_env: [0.0; MOD_UPDATE_INTERVAL],
            filter_env: [0.0; MOD_UPDATE_INTERVAL],
            len: 0,
        }
    }

    #[inline]
    fn push(&mut self, lfo1: f32, lfo2: f32, amp: f32, filter: f32) {
        let i = self.len.min(MOD_UPDATE_INTERVAL - 1);
        self.lfo[0][i] = lfo1;
        self.lfo[1][i] = lfo2;
        self.amp_env[i] = amp;
        self.filter_env[i] = filter;
        self.len = i + 1;
    }
}

#[derive(Debug, Clone)]
pub struct SynthVoice {
    note: u8,
    velocity: f32,
    state: VoiceState,
    age: u64,
    sample_rate: f32,
    max_block_size: usize,
    base_frequency: f32,

    oscillators: [Oscillator; 2],
    sub: SubOscillator,
    noise: NoiseGenerator,
    filters: [AnalogFilter; 2],
    amp_env: Envelope,
    filter_env: Envelope,
    lfos: [Lfo; 2],
    matrix: ModMatrix,

    unison: UnisonVoice,
    base: BaseParams,
    pitch_bend_semitones: f32,
    sub_pitch_ratio: f32,
    mod_wheel: f32,
    aftertouch: f32,

    // Control-rate state
    history: SourceHistory,
    samples_until_update: usize,
    filter_env_value: f32,
    osc_gains: [(f32, f32); 2],
    output_gains: (f32, f32),
}

impl Default for SynthVoice {
    fn default() -> Self {
        Self::new(48_000.0)
    }
}

impl SynthVoice {
    pub fn new(sample_rate: f32) -> Self {
        let mut lfos = [Lfo::new(LfoShape::Sine, 5.0), Lfo::new(LfoShape::Sine, 5.0)];
        for (i, lfo) in lfos.iter_mut().enumerate() {
            lfo.reseed(0x4C46_4F00 + i as u64);
            lfo.start();
        }

        let mut voice = Self {
            note: 0,
            velocity: 0.0,
            state: VoiceState::Free,
            age: 0,
            sample_rate: sample_rate.max(1.0),
            max_block_size: MAX_BLOCK_SIZE,
            base_frequency: 440.0,
            oscillators: [Oscillator::basic(Waveform::Saw), Oscillator::basic(Waveform::Saw)],
            sub: SubOscillator::new(SubShape::Sine, SubOctave::One),
            noise: NoiseGenerator::new(NoiseColor::White),
            filters: [AnalogFilter::new(sample_rate), AnalogFilter::new(sample_rate)],
            amp_env: Envelope::default(),
            filter_env: Envelope::default(),
            lfos,
            matrix: ModMatrix::new(),
            unison: UnisonVoice::UNITY,
            base: BaseParams::default(),
            pitch_bend_semitones: 0.0,
            sub_pitch_ratio: 1.0,
            mod_wheel: 0.0,
            aftertouch: 0.0,
            history: SourceHistory::new(),
            samples_until_update: 0,
            filter_env_value: 0.0,
            osc_gains: [pan_gains(0.0); 2],
            output_gains: pan_gains(0.0),
        };
        voice.prepare(sample_rate, MAX_BLOCK_SIZE);
        voice
    }

    /// Set the sample rate and block limit. Not realtime-safe; call with audio stopped.
    pub fn prepare(&mut self, sample_rate: f32, max_block_size: usize) {
        self.sample_rate = sample_rate.max(1.0);
        self.max_block_size = max_block_size.max(1);
        for filter in &mut self.filters {
            filter.prepare(self.sample_rate);
        }
        self.amp_env.set_sample_rate(self.sample_rate);
        self.filter_env.set_sample_rate(self.sample_rate);
        self.reset();
        self.apply_modulation();
        debug!(
            sample_rate = self.sample_rate,
            max_block_size = self.max_block_size,
            "voice prepared"
        );
    }

    /// Copy a patch into this voice. Switching an oscillator into wavetable
    /// mode allocates, so do this off the audio thread.
    pub fn apply_patch(&mut self, patch: &Patch, bank: &WavetableBank) {
        for (k, desc) in patch.oscillators.iter().enumerate() {
            let osc = &mut self.oscillators[k];
            let (mut position, mut fm_depth) = (0.0, 0.0);
            match desc.source {
                OscillatorSource::Basic(waveform) => osc.set_waveform(waveform),
                OscillatorSource::Wavetable { table_id, position: start } => {
                    osc.set_wavetable(bank.get(table_id).cloned());
                    position = start;
                }
                OscillatorSource::Fm { ratio, depth } => {
                    if !matches!(osc.mode(), OscillatorMode::Fm { .. }) {
                        osc.set_mode(OscillatorMode::Fm {
                            ratio: 1.0,
                            depth: 0.0,
                            modulator_phase: 0.0,
                        });
                    }
                    osc.set_fm_ratio(ratio);
                    fm_depth = depth;
                }
            }
            osc.set_pan(desc.pan);
            osc.set_octave(desc.octave);
            osc.set_semitones(desc.semitones);
            osc.set_fine_cents(desc.fine_cents);
            self.set_osc_level(k, desc.level);
            self.set_wavetable_position(k, position);
            self.set_fm_depth(k, fm_depth);
        }

        self.sub.set_shape(patch.sub.shape);
        self.sub.set_octave(patch.sub.octave);
        self.set_sub_level(patch.sub.level);

        self.noise.set_color(patch.noise.color);
        self.noise.set_tone(patch.noise.tone_hz);
        self.set_noise_level(patch.noise.level);

        let f = &patch.filter;
        for filter in &mut self.filters {
            filter.set_model(f.model);
            filter.set_filter_type(f.filter_type);
        }
        self.set_cutoff(f.cutoff_hz);
        self.set_resonance(f.resonance);
        self.set_drive(f.drive);
        self.set_filter_envelope_amount(f.envelope_octaves);
        self.set_key_tracking(f.key_tracking);

        configure_envelope(&mut self.amp_env, &patch.amplitude_envelope);
        configure_envelope(&mut self.filter_env, &patch.filter_envelope);

        for (lfo, desc) in self.lfos.iter_mut().zip(&patch.lfos) {
            lfo.set_shape(desc.shape);
            lfo.set_rate(desc.rate_hz);
            lfo.set_sync(desc.sync);
            lfo.set_phase_offset(desc.phase_offset);
            lfo.set_delay(desc.delay_ms / 1_000.0);
            lfo.set_range(desc.min, desc.max);
            lfo.set_retrigger(desc.retrigger);
        }

        self.matrix.replace_routing(&patch.mod_matrix());
        self.set_velocity_sensitivity(patch.velocity_sensitivity);
        self.apply_modulation();
    }

    /// Voice-pool entry point: MIDI note and velocity.
    pub fn start(&mut self, note: u8, velocity: u8, age: u64) {
        self.note = note;
        self.age = age;
        self.trigger(midi_note_to_freq(note), velocity as f32 / 127.0);
    }

    /// Begin a note at `base_frequency_hz`. A sounding voice is hard-retriggered.
    pub fn trigger(&mut self, base_frequency_hz: f32, velocity: f32) {
        self.base_frequency = if base_frequency_hz.is_finite() {
            base_frequency_hz.max(0.0)
        } else {
            0.0
        };
        self.velocity = if velocity.is_finite() { velocity.clamp(0.0, 1.0) } else { 0.0 };
        self.state = VoiceState::Active;

        let phase = self.unison.phase as f64;
        for osc in &mut self.oscillators {
            osc.reset();
            osc.set_phase(phase);
        }
        self.sub.reset();
        for filter in &mut self.filters {
            filter.reset();
        }
        self.amp_env.trigger();
        self.filter_env.trigger();
        for lfo in &mut self.lfos {
            lfo.note_on();
        }

        self.matrix.set_source_value(ModSource::AmpEnvelope, 0.0);
        self.matrix.set_source_value(ModSource::FilterEnvelope, 0.0);
        self.filter_env_value = 0.0;
        self.history.len = 0;
        self.apply_modulation();
        self.samples_until_update = MOD_UPDATE_INTERVAL;
    }

    /// Gate low. The voice frees itself once the amp envelope reaches zero.
    pub fn release(&mut self) {
        if self.state == VoiceState::Active {
            self.state = VoiceState::Releasing;
            self.amp_env.release();
            self.filter_env.release();
        }
    }

    /// Silence immediately and return to the pool.
    pub fn reset(&mut self) {
        self.free();
        self.amp_env.reset();
        self.filter_env.reset();
        for filter in &mut self.filters {
            filter.reset();
        }
        self.history.len = 0;
        self.samples_until_update = 0;
    }

    fn free(&mut self) {
        self.state = VoiceState::Free;
        self.note = 0;
        self.velocity = 0.0;
    }

    /// Add `count` samples starting at `start` into both buffers.
    pub fn render_next_block(
        &mut self,
        left: &mut [f32],
        right: &mut [f32],
        start: usize,
        count: usize,
    ) {
        debug_assert!(count <= self.max_block_size);
        let end = (start + count).min(left.len()).min(right.len());
        if start >= end {
            return;
        }

        let sr = self.sample_rate;
        let center = pan_gains(0.0);

        for i in start..end {
            if self.state == VoiceState::Free {
                break;
            }
            if self.samples_until_update == 0 {
                self.update_modulation();
            }
            self.samples_until_update -= 1;

            let lfo1 = self.lfos[0].process(sr);
            let lfo2 = self.lfos[1].process(sr);
            let amp = self.amp_env.next_sample();
            let filter_env = self.filter_env.next_sample();
            self.history.push(lfo1, lfo2, amp, filter_env);

            let f = self.base_frequency;
            let o1 = self.oscillators[0].process(f, sr);
            let o2 = self.oscillators[1].process(f, sr);
            let mono = self.sub.process(f * self.sub_pitch_ratio, sr) + self.noise.process(sr);

            let [(g1l, g1r), (g2l, g2r)] = self.osc_gains;
            let pre_l = o1 * g1l + o2 * g2l + mono * center.0;
            let pre_r = o1 * g1r + o2 * g2r + mono * center.1;

            let out_l = self.filters[0].process_sample(pre_l) * amp;
            let out_r = self.filters[1].process_sample(pre_r) * amp;

            left[i] += out_l * self.output_gains.0;
            right[i] += out_r * self.output_gains.1;

            if self.state == VoiceState::Releasing && !self.amp_env.is_active() {
                self.free();
            }
        }
    }

    /// Close the control interval: average the sources, push them, re-apply.
    fn update_modulation(&mut self) {
        let n = self.history.len;
        if n > 0 {
            let h = &self.history;
            let lfo1 = block_average(&h.lfo[0][..n]);
            let lfo2 = block_average(&h.lfo[1][..n]);
            let amp = block_average(&h.amp_env[..n]);
            self.filter_env_value = block_average(&h.filter_env[..n]);

            self.matrix.set_source_value(ModSource::Lfo1, lfo1);
            self.matrix.set_source_value(ModSource::Lfo2, lfo2);
            self.matrix.set_source_value(ModSource::AmpEnvelope, amp);
            self.matrix.set_source_value(ModSource::FilterEnvelope, self.filter_env_value);
        }
        self.history.len = 0;
        self.apply_modulation();
        self.samples_until_update = MOD_UPDATE_INTERVAL;
    }

    /// Re-derive every destination from base values and the matrix.
    fn apply_modulation(&mut self) {
        let key = self.key_position();
        self.matrix.set_source_value(ModSource::Velocity, self.velocity);
        self.matrix.set_source_value(ModSource::KeyTrack, key / 60.0);
        self.matrix.set_source_value(ModSource::ModWheel, self.mod_wheel);
        self.matrix.set_source_value(ModSource::Aftertouch, self.aftertouch);

        let m = self.matrix;
        let base = self.base;
        let pitch_all = m.modulation_for(Dest::Pitch);
        let voice_semitones = pitch_all * PITCH_MOD_SEMITONES + self.pitch_bend_semitones;
        self.sub_pitch_ratio = (voice_semitones / 12.0).exp2();
        let fm_depth = m.modulation_for(Dest::FmDepth);
        let per_osc = [
            (Dest::Osc1Pitch, Dest::Osc1Level, Dest::Osc1WavetablePosition),
            (Dest::Osc2Pitch, Dest::Osc2Level, Dest::Osc2WavetablePosition),
        ];

        for (k, (pitch, level, position)) in per_osc.into_iter().enumerate() {
            let osc = &mut self.oscillators[k];
            let semitones = voice_semitones + m.modulation_for(pitch) * PITCH_MOD_SEMITONES;
            osc.set_pitch_modulation(semitones);
            osc.set_detune_cents(self.unison.detune_cents);
            osc.set_level(apply_modulation(base.osc_level[k], m.modulation_for(level), 1.0));
            osc.set_wavetable_position(apply_modulation(
                base.wavetable_position[k],
                m.modulation_for(position),
                1.0,
            ));
            osc.set_fm_depth(apply_modulation(base.fm_depth[k], fm_depth, 1.0));
            self.osc_gains[k] = pan_gains(osc.pan());
        }

        self.sub.set_level(apply_modulation(base.sub_level, m.modulation_for(Dest::SubLevel), 1.0));
        self.noise
            .set_level(apply_modulation(base.noise_level, m.modulation_for(Dest::NoiseLevel), 1.0));

        let octaves = m.modulation_for(Dest::FilterCutoff) * CUTOFF_MOD_OCTAVES
            + self.filter_env_value * base.env_octaves
            + key / 12.0 * base.key_tracking;
        let cutoff = base.cutoff_hz * octaves.exp2();
        let resonance =
            apply_modulation(base.resonance, m.modulation_for(Dest::FilterResonance), 1.0);
        let drive = apply_modulation(base.drive, m.modulation_for(Dest::FilterDrive), 1.0);
        for filter in &mut self.filters {
            filter.set_cutoff(cutoff);
            if filter.resonance() != resonance {
                filter.set_resonance(resonance);
            }
            if filter.drive() != drive {
                filter.set_drive(drive);
            }
        }

        self.lfos[0].set_rate_modulation(m.modulation_for(Dest::Lfo1Rate));
        self.lfos[1].set_rate_modulation(m.modulation_for(Dest::Lfo2Rate));

        let s = base.velocity_sensitivity;
        let velocity_gain = 1.0 - s + s * self.velocity;
        let amplitude = (1.0 + m.modulation_for(Dest::Amplitude)).clamp(0.0, 2.0);
        let gain = amplitude * velocity_gain * self.unison.gain;

        let pan = (self.unison.pan + base.pan + m.modulation_for(Dest::Pan)).clamp(-1.0, 1.0);
        let (l, r) = pan_gains(pan);
        self.output_gains = (l * gain, r * gain);
    }

    /// Semitones from middle C.
    #[inline]
    fn key_position(&self) -> f32 {
        if self.base_frequency > 0.0 {
            12.0 * (self.base_frequency / MIDDLE_C_HZ).log2()
        } else {
            0.0
        }
    }

    pub fn is_free(&self) -> bool {
        self.state == VoiceState::Free
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, VoiceState::Active | VoiceState::Releasing)
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    pub fn note(&self) -> u8 {
        self.note
    }

    pub fn age(&self) -> u64 {
        self.age
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn base_frequency(&self) -> f32 {
        self.base_frequency
    }

    pub fn envelope_level(&self) -> f32 {
        self.amp_env.level()
    }

    pub fn unison(&self) -> UnisonVoice {
        self.unison
    }

    /// Stack offsets for this voice; detune and pan follow at the next update.
    pub fn set_unison(&mut self, unison: UnisonVoice) {
        self.unison = unison;
    }

    pub fn set_tempo(&mut self, bpm: f32) {
        for lfo in &mut self.lfos {
            lfo.set_tempo(bpm);
        }
    }

    pub fn set_pitch_bend(&mut self, cents: f32) {
        self.pitch_bend_semitones = if cents.is_finite() {
            cents.clamp(-2_400.0, 2_400.0) / 100.0
        } else {
            0.0
        };
    }

    pub fn set_mod_wheel(&mut self, value: f32) {
        self.mod_wheel = clamp_unit(value);
    }

    pub fn set_aftertouch(&mut self, value: f32) {
        self.aftertouch = clamp_unit(value);
    }

    pub fn osc_level(&self, index: usize) -> Option<f32> {
        self.base.osc_level.get(index).copied()
    }

    pub fn set_osc_level(&mut self, index: usize, level: f32) {
        if let Some(slot) = self.base.osc_level.get_mut(index) {
            *slot = clamp_unit(level);
        }
    }

    pub fn set_wavetable_position(&mut self, index: usize, position: f32) {
        if let Some(slot) = self.base.wavetable_position.get_mut(index) {
            *slot = clamp_unit(position);
        }
    }

    pub fn set_fm_depth(&mut self, index: usize, depth: f32) {
        if let Some(slot) = self.base.fm_depth.get_mut(index) {
            *slot = clamp_unit(depth);
        }
    }

    pub fn set_sub_level(&mut self, level: f32) {
        self.base.sub_level = clamp_unit(level);
    }

    pub fn set_noise_level(&mut self, level: f32) {
        self.base.noise_level = clamp_unit(level);
    }

    pub fn cutoff(&self) -> f32 {
        self.base.cutoff_hz
    }

    pub fn set_cutoff(&mut self, cutoff_hz: f32) {
        self.base.cutoff_hz = if cutoff_hz.is_finite() {
            cutoff_hz.clamp(20.0, 20_000.0)
        } else {
            20_000.0
        };
    }

    pub fn resonance(&self) -> f32 {
        self.base.resonance
    }

    pub fn set_resonance(&mut self, resonance: f32) {
        self.base.resonance = clamp_unit(resonance);
    }

    pub fn drive(&self) -> f32 {
        self.base.drive
    }

    pub fn set_drive(&mut self, drive: f32) {
        self.base.drive = clamp_unit(drive);
    }

    pub fn set_filter_envelope_amount(&mut self, octaves: f32) {
        self.base.env_octaves = if octaves.is_finite() { octaves.clamp(-8.0, 8.0) } else { 0.0 };
    }

    pub fn set_key_tracking(&mut self, amount: f32) {
        self.base.key_tracking = clamp_unit(amount);
    }

    pub fn set_pan(&mut self, pan: f32) {
        self.base.pan = if pan.is_finite() { pan.clamp(-1.0, 1.0) } else { 0.0 };
    }

    pub fn set_velocity_sensitivity(&mut self, amount: f32) {
        self.base.velocity_sensitivity = clamp_unit(amount);
    }

    pub fn set_lfo_rate(&mut self, index: usize, rate_hz: f32) {
        if let Some(lfo) = self.lfos.get_mut(index) {
            lfo.set_rate(rate_hz);
        }
    }

    /// Push base-value changes through now instead of at the next interval.
    pub fn refresh(&mut self) {
        self.apply_modulation();
    }

    pub fn oscillator(&self, index: usize) -> Option<&Oscillator> {
        self.oscillators.get(index)
    }

    pub fn oscillator_mut(&mut self, index: usize) -> Option<&mut Oscillator> {
        self.oscillators.get_mut(index)
    }

    pub fn filter(&self, channel: usize) -> Option<&AnalogFilter> {
        self.filters.get(channel)
    }

    pub fn lfo_mut(&mut self, index: usize) -> Option<&mut Lfo> {
        self.lfos.get_mut(index)
    }

    pub fn matrix(&self) -> &ModMatrix {
        &self.matrix
    }

    pub fn matrix_mut(&mut self) -> &mut ModMatrix {
        &mut self.matrix
    }

    pub fn sub_mut(&mut self) -> &mut SubOscillator {
        &mut self.sub
    }

    pub fn noise_mut(&mut self) -> &mut NoiseGenerator {
        &mut self.noise
    }

    pub fn amp_envelope_mut(&mut self) -> &mut Envelope {
        &mut self.amp_env
    }

    pub fn filter_envelope_mut(&mut self) -> &mut Envelope {
        &mut self.filter_env
    }

    /// Swap the table of one oscillator. Allocates when the oscillator was
    /// not already in wavetable mode.
    pub fn set_wavetable(&mut self, index: usize, table: Option<Arc<Wavetable>>) {
        if let Some(osc) = self.oscillators.get_mut(index) {
            osc.set_wavetable(table);
        }
    }
}

fn configure_envelope(env: &mut Envelope, desc: &EnvelopeDescriptor) {
    env.set_attack(desc.attack_ms / 1_000.0);
    env.set_decay(desc.decay_ms / 1_000.0);
    env.set_sustain(desc.sustain_level);
    env.set_release(desc.release_ms / 1_000.0);
}

#[inline]
fn clamp_unit(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
