//! Demo runner: owns the cpal stream and feeds the synth from the main thread

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rtrb::{Producer, RingBuffer};
use tracing::info;

use voxmod::{
    dsp::wavetable::WavetableBank,
    patch::Patch,
    synth::{PolySynth, SynthConfig, SynthMessage},
    MAX_BLOCK_SIZE,
};

const CONTROL_QUEUE_CAPACITY: usize = 256;
const RELEASE_TAIL: Duration = Duration::from_secs(3);

pub struct Chord {
    notes: Vec<u8>,
    beats: f32,
}

impl Chord {
    pub fn new(notes: &[u8], beats: f32) -> Self {
        Self {
            notes: notes.to_vec(),
            beats,
        }
    }
}

/// Main application builder
pub struct Voxmod {
    patch: Patch,
    bpm: f32,
    chords: Vec<Chord>,
}

impl Voxmod {
    pub fn new(patch: Patch) -> Self {
        Self {
            patch,
            bpm: 120.0,
            chords: Vec::new(),
        }
    }

    /// Set the tempo in beats per minute
    pub fn bpm(mut self, bpm: f32) -> Self {
        self.bpm = bpm;
        self
    }

    pub fn chord(mut self, chord: Chord) -> Self {
        self.chords.push(chord);
        self
    }

    /// Play every chord once, then let the release ring out.
    pub fn run(self) -> EyreResult<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = config.sample_rate().0 as f32;
        let channels = config.channels() as usize;

        let bank = Arc::new(WavetableBank::builtin());
        let (mut tx, rx) = RingBuffer::<SynthMessage>::new(CONTROL_QUEUE_CAPACITY);
        let mut synth = PolySynth::new(
            SynthConfig {
                sample_rate,
                ..SynthConfig::default()
            },
            rx,
            bank,
        );
        synth
            .load_patch(&self.patch)
            .wrap_err_with(|| format!("patch '{}' rejected", self.patch.name))?;
        let meters = Arc::clone(synth.meters());

        info!(
            patch = %self.patch.name,
            bpm = self.bpm,
            sample_rate,
            channels,
            "starting playback"
        );

        let mut left = vec![0.0f32; MAX_BLOCK_SIZE];
        let mut right = vec![0.0f32; MAX_BLOCK_SIZE];

        let stream = device.build_output_stream(
            &config.into(),
            move |data: &mut [f32], _| {
                let total_frames = data.len() / channels;
                let mut frames_written = 0;

                while frames_written < total_frames {
                    let frames = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
                    let (l, r) = (&mut left[..frames], &mut right[..frames]);
                    synth.render_block(l, r);

                    let offset = frames_written * channels;
                    let out = &mut data[offset..offset + frames * channels];
                    let stereo = l.iter().zip(r.iter());
                    for (frame, (&sl, &sr)) in out.chunks_exact_mut(channels).zip(stereo) {
                        match frame {
                            [mono] => *mono = 0.5 * (sl + sr),
                            [fl, fr, rest @ ..] => {
                                *fl = sl;
                                *fr = sr;
                                rest.fill(0.0);
                            }
                            [] => {}
                        }
                    }

                    frames_written += frames;
                }
            },
            |err| tracing::error!("audio error: {err}"),
            None,
        )?;

        stream.play()?;

        send(&mut tx, SynthMessage::SetTempo { bpm: self.bpm })?;
        let seconds_per_beat = 60.0 / self.bpm.max(1.0);

        for chord in &self.chords {
            for &note in &chord.notes {
                send(&mut tx, SynthMessage::NoteOn { note, velocity: 96 })?;
            }
            thread::sleep(Duration::from_secs_f32(chord.beats.max(0.0) * seconds_per_beat));
            for &note in &chord.notes {
                send(&mut tx, SynthMessage::NoteOff { note })?;
            }

            let (peak_l, peak_r) = meters.peak();
            info!(
                notes = ?chord.notes,
                voices = meters.active_voices(),
                peak_l,
                peak_r,
                "chord"
            );
        }

        thread::sleep(RELEASE_TAIL);
        send(&mut tx, SynthMessage::AllSoundOff)?;
        info!("done");
        Ok(())
    }
}

fn send(tx: &mut Producer<SynthMessage>, msg: SynthMessage) -> EyreResult<()> {
    tx.push(msg).map_err(|_| eyre!("control queue full"))
}
