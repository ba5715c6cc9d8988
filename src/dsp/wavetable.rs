//! Wavetables and frame morphing.

/*
Wavetable Synthesis
===================

A wavetable is an ordered stack of single-cycle waveforms ("frames"). The
oscillator reads one cycle at its phase, and a morph position in [0, 1]
sweeps through the stack, crossfading between neighbouring frames:

    position 0.0                 0.5                  1.0
       frame 0 ── frame 1 ── frame 2 ── ... ── frame N-1
               ↑
       x = position * (N - 1)      blend frames floor(x) and floor(x) + 1
                                   with weights (1 - frac, frac)

Because the position usually moves at control rate (once per block, driven
by an LFO or envelope through the modulation matrix), the blended frame is
cached. The per-sample cost is a single linear-interpolated lookup into that
cache, no matter how many frames the table holds.

Built-in Tables
---------------

Built-in tables are additive: each frame is described by a harmonic-amplitude
recipe (amplitude of partial 1, 2, 3, ...) and summed from sines once, when
the bank is built. The bank is constructed before audio starts and handed to
voices as `Arc<WavetableBank>`; tables are never mutated afterwards.
*/

use std::f64::consts::TAU;
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::SynthError;

/// Largest frame a morph cache can hold.
pub const MAX_FRAME_LEN: usize = 2048;
/// Frame length of the built-in tables.
pub const DEFAULT_FRAME_LEN: usize = 2048;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WavetableCategory {
    Basic,
    Analog,
    Digital,
    Vocal,
    User,
}

/// An immutable stack of equally sized single-cycle frames.
pub struct Wavetable {
    id: u32,
    name: String,
    category: WavetableCategory,
    frame_len: usize,
    samples: Vec<f32>,
}

impl Wavetable {
    /// Build a table from explicit frames. All frames must share one length.
    pub fn from_frames(
        id: u32,
        name: impl Into<String>,
        category: WavetableCategory,
        frames: &[Vec<f32>],
    ) -> Result<Self, SynthError> {
        let name = name.into();
        let Some(first) = frames.first() else {
            return Err(SynthError::EmptyWavetable { name });
        };

        let frame_len = first.len();
        if !(2..=MAX_FRAME_LEN).contains(&frame_len) {
            return Err(SynthError::FrameLength {
                name,
                len: frame_len,
                max: MAX_FRAME_LEN,
            });
        }

        let mut samples = Vec::with_capacity(frame_len * frames.len());
        for (index, frame) in frames.iter().enumerate() {
            if frame.len() != frame_len {
                return Err(SynthError::RaggedFrame {
                    name,
                    frame: index,
                    len: frame.len(),
                    expected: frame_len,
                });
            }
            samples.extend_from_slice(frame);
        }

        Ok(Self {
            id,
            name,
            category,
            frame_len,
            samples,
        })
    }

    /// Build a table additively, one harmonic recipe per frame.
    pub fn from_harmonics(
        id: u32,
        name: impl Into<String>,
        category: WavetableCategory,
        frame_len: usize,
        recipes: &[Vec<f32>],
    ) -> Result<Self, SynthError> {
        let name = name.into();
        if recipes.is_empty() {
            return Err(SynthError::EmptyWavetable { name });
        }
        if !(2..=MAX_FRAME_LEN).contains(&frame_len) {
            return Err(SynthError::FrameLength {
                name,
                len: frame_len,
                max: MAX_FRAME_LEN,
            });
        }
        Ok(Self::additive(id, name, category, frame_len, recipes))
    }

    // Caller guarantees a non-empty recipe list and a valid frame length.
    fn additive(
        id: u32,
        name: String,
        category: WavetableCategory,
        frame_len: usize,
        recipes: &[Vec<f32>],
    ) -> Self {
        let mut samples = Vec::with_capacity(frame_len * recipes.len());
        for recipe in recipes {
            samples.extend(harmonic_frame(frame_len, recipe));
        }
        Self {
            id,
            name,
            category,
            frame_len,
            samples,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> WavetableCategory {
        self.category
    }

    pub fn frame_len(&self) -> usize {
        self.frame_len
    }

    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.frame_len
    }

    /// Samples of one frame. `index` is clamped to the last frame.
    pub fn frame(&self, index: usize) -> &[f32] {
        let index = index.min(self.frame_count() - 1);
        let start = index * self.frame_len;
        &self.samples[start..start + self.frame_len]
    }
}

impl fmt::Debug for Wavetable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wavetable")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("category", &self.category)
            .field("frame_len", &self.frame_len)
            .field("frame_count", &self.frame_count())
            .finish()
    }
}

/// Sum sine partials into one cycle and normalise the peak to 1.0.
fn harmonic_frame(frame_len: usize, amplitudes: &[f32]) -> Vec<f32> {
    let mut frame = vec![0.0f64; frame_len];
    for (n, sample) in frame.iter_mut().enumerate() {
        let t = n as f64 / frame_len as f64;
        *sample = amplitudes
            .iter()
            .enumerate()
            .filter(|&(_, &amp)| amp != 0.0)
            .map(|(k, &amp)| amp as f64 * (TAU * (k + 1) as f64 * t).sin())
            .sum();
    }

    let peak = frame.iter().fold(0.0f64, |acc, &x| acc.max(x.abs()));
    let scale = if peak > 0.0 { 1.0 / peak } else { 0.0 };
    frame.iter().map(|&x| (x * scale) as f32).collect()
}

/// The shared, read-only collection of tables available to every voice.
#[derive(Debug, Default)]
pub struct WavetableBank {
    tables: Vec<Arc<Wavetable>>,
}

impl WavetableBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate the built-in tables. Expensive; call once before audio starts.
    pub fn builtin() -> Self {
        let len = DEFAULT_FRAME_LEN;
        let tables = vec![
            Wavetable::additive(0, "Basic Shapes".into(), WavetableCategory::Basic, len, &basic_shapes()),
            Wavetable::additive(1, "Harmonic Sweep".into(), WavetableCategory::Analog, len, &harmonic_sweep()),
            Wavetable::additive(2, "Pulse Width".into(), WavetableCategory::Analog, len, &pulse_width()),
            Wavetable::additive(3, "Odd Organ".into(), WavetableCategory::Digital, len, &odd_organ()),
            Wavetable::additive(4, "Vocal Formant".into(), WavetableCategory::Vocal, len, &vocal_formant()),
        ];

        let bank = Self {
            tables: tables.into_iter().map(Arc::new).collect(),
        };
        info!(tables = bank.len(), frame_len = len, "built-in wavetable bank ready");
        bank
    }

    /// Add a user table. Ids must be unique within the bank.
    pub fn insert(&mut self, table: Wavetable) -> Result<Arc<Wavetable>, SynthError> {
        if self.get(table.id()).is_some() {
            return Err(SynthError::DuplicateWavetable(table.id()));
        }
        let table = Arc::new(table);
        self.tables.push(Arc::clone(&table));
        Ok(table)
    }

    pub fn get(&self, id: u32) -> Option<&Arc<Wavetable>> {
        self.tables.iter().find(|t| t.id() == id)
    }

    pub fn by_name(&self, name: &str) -> Option<&Arc<Wavetable>> {
        self.tables.iter().find(|t| t.name() == name)
    }

    pub fn in_category(
        &self,
        category: WavetableCategory,
    ) -> impl Iterator<Item = &Arc<Wavetable>> + '_ {
        self.tables.iter().filter(move |t| t.category() == category)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Wavetable>> + '_ {
        self.tables.iter()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Built-in recipes
// ---------------------------------------------------------------------------

const RECIPE_PARTIALS: usize = 64;

fn partials(f: impl Fn(usize) -> f32) -> Vec<f32> {
    (1..=RECIPE_PARTIALS).map(f).collect()
}

/// sine → triangle → saw → square
fn basic_shapes() -> Vec<Vec<f32>> {
    let sine = vec![1.0];
    let triangle = partials(|k| {
        if k % 2 == 0 {
            0.0
        } else {
            let sign = if (k / 2) % 2 == 0 { 1.0 } else { -1.0 };
            sign / (k * k) as f32
        }
    });
    let saw = partials(|k| 1.0 / k as f32);
    let square = partials(|k| if k % 2 == 0 { 0.0 } else { 1.0 / k as f32 });
    vec![sine, triangle, saw, square]
}

/// One to sixteen sawtooth partials.
fn harmonic_sweep() -> Vec<Vec<f32>> {
    (1..=16usize)
        .map(|count| (1..=count).map(|k| 1.0 / k as f32).collect())
        .collect()
}

/// Pulses narrowing from 50% to 6.25% duty.
fn pulse_width() -> Vec<Vec<f32>> {
    (0..8)
        .map(|i| {
            let width = 0.5 - i as f32 * (0.4375 / 7.0);
            partials(|k| (std::f32::consts::PI * k as f32 * width).sin() / k as f32)
        })
        .collect()
}

/// Drawbar-style mixtures of odd footages.
fn odd_organ() -> Vec<Vec<f32>> {
    const DRAWBARS: [[f32; 8]; 8] = [
        [1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        [1.0, 0.0, 0.6, 0.0, 0.0, 0.0, 0.0, 0.0],
        [1.0, 0.0, 0.6, 0.0, 0.4, 0.0, 0.0, 0.0],
        [1.0, 0.3, 0.6, 0.0, 0.4, 0.0, 0.2, 0.0],
        [1.0, 0.3, 0.8, 0.2, 0.6, 0.0, 0.4, 0.1],
        [0.8, 0.5, 0.8, 0.4, 0.6, 0.3, 0.5, 0.3],
        [0.6, 0.6, 0.8, 0.6, 0.8, 0.5, 0.7, 0.5],
        [0.5, 0.7, 1.0, 0.7, 1.0, 0.7, 1.0, 0.8],
    ];
    const HARMONICS: [usize; 8] = [1, 2, 3, 4, 5, 6, 8, 10];

    DRAWBARS
        .iter()
        .map(|levels| {
            let mut recipe = vec![0.0; 10];
            for (&h, &level) in HARMONICS.iter().zip(levels) {
                recipe[h - 1] = level;
            }
            recipe
        })
        .collect()
}

/// Two gaussian formant peaks over a bright harmonic series, per vowel.
fn vocal_formant() -> Vec<Vec<f32>> {
    // (first formant, second formant) expressed as harmonic numbers
    const VOWELS: [(f32, f32); 5] = [(7.0, 11.0), (4.0, 19.0), (2.0, 23.0), (4.0, 8.0), (3.0, 6.0)];

    VOWELS
        .iter()
        .map(|&(f1, f2)| {
            partials(|k| {
                let k = k as f32;
                let peak = |centre: f32, width: f32| (-((k - centre) / width).powi(2)).exp();
                peak(f1, 1.5) + 0.7 * peak(f2, 2.0) + 0.15 / k
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Morphing
// ---------------------------------------------------------------------------

/// Selects a table and a morph position, caching the blended frame.
///
/// The cache is sized for [`MAX_FRAME_LEN`] at construction, so switching
/// tables or moving the position never allocates.
#[derive(Clone)]
pub struct WavetableMorph {
    table: Option<Arc<Wavetable>>,
    position: f32,
    cache: Box<[f32]>,
    cache_len: usize,
}

impl WavetableMorph {
    pub fn new(table: Option<Arc<Wavetable>>) -> Self {
        let mut morph = Self {
            table,
            position: 0.0,
            cache: vec![0.0; MAX_FRAME_LEN].into_boxed_slice(),
            cache_len: 0,
        };
        morph.refresh();
        morph
    }

    /// The selected table; `None` renders silence.
    pub fn current_wavetable(&self) -> Option<&Arc<Wavetable>> {
        self.table.as_ref()
    }

    pub fn set_table(&mut self, table: Option<Arc<Wavetable>>) {
        self.table = table;
        self.refresh();
    }

    pub fn position(&self) -> f32 {
        self.position
    }

    pub fn set_position(&mut self, position: f32) {
        let position = if position.is_finite() {
            position.clamp(0.0, 1.0)
        } else {
            0.0
        };
        if position != self.position {
            self.position = position;
            self.refresh();
        }
    }

    /// The cached frame the oscillator currently reads from.
    pub fn cached_frame(&self) -> &[f32] {
        &self.cache[..self.cache_len]
    }

    fn refresh(&mut self) {
        let Some(table) = self.table.as_ref() else {
            self.cache_len = 0;
            return;
        };

        let len = table.frame_len().min(MAX_FRAME_LEN);
        let count = table.frame_count();
        let cache = &mut self.cache[..len];

        if count == 1 {
            cache.copy_from_slice(&table.frame(0)[..len]);
        } else {
            let x = self.position as f64 * (count - 1) as f64;
            let index = (x.floor() as usize).min(count - 2);
            let frac = (x - index as f64) as f32;
            let a = table.frame(index);
            let b = table.frame(index + 1);
            for ((out, &a), &b) in cache.iter_mut().zip(a).zip(b) {
                *out = a * (1.0 - frac) + b * frac;
            }
        }
        self.cache_len = len;
    }

    /// Read the cached frame at `phase` in [0, 1) with linear interpolation.
    #[inline]
    pub fn process_sample(&self, phase: f64) -> f32 {
        let len = self.cache_len;
        if len == 0 {
            return 0.0;
        }
        let pos = phase * len as f64;
        let index = (pos as usize) % len;
        let next = (index + 1) % len;
        let frac = (pos - pos.floor()) as f32;
        let a = self.cache[index];
        let b = self.cache[next];
        a + (b - a) * frac
    }
}

impl fmt::Debug for WavetableMorph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WavetableMorph")
            .field("table", &self.table.as_ref().map(|t| t.name()))
            .field("position", &self.position)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp_table(frames: usize, len: usize) -> Arc<Wavetable> {
        let frames: Vec<Vec<f32>> = (0..frames)
            .map(|f| (0..len).map(|i| (f * 1000 + i) as f32 * 0.001).collect())
            .collect();
        Arc::new(Wavetable::from_frames(99, "ramp", WavetableCategory::User, &frames).unwrap())
    }

    #[test]
    fn boundary_positions_reproduce_end_frames() {
        let table = ramp_table(5, 64);
        let mut morph = WavetableMorph::new(Some(Arc::clone(&table)));

        morph.set_position(0.0);
        assert_eq!(morph.cached_frame(), table.frame(0));

        morph.set_position(1.0);
        assert_eq!(morph.cached_frame(), table.frame(4));
    }

    #[test]
    fn midpoint_of_identical_frames_is_exact() {
        let frame: Vec<f32> = (0..128).map(|i| ((i as f32) * 0.37).sin()).collect();
        let table = Arc::new(
            Wavetable::from_frames(1, "twin", WavetableCategory::User, &[frame.clone(), frame.clone()])
                .unwrap(),
        );
        let mut morph = WavetableMorph::new(Some(table));
        morph.set_position(0.5);
        assert_eq!(morph.cached_frame(), frame.as_slice());
    }

    #[test]
    fn midpoint_blends_neighbours() {
        let table = ramp_table(2, 16);
        let mut morph = WavetableMorph::new(Some(table.clone()));
        morph.set_position(0.5);
        for (i, &v) in morph.cached_frame().iter().enumerate() {
            let expected = (table.frame(0)[i] + table.frame(1)[i]) * 0.5;
            assert!((v - expected).abs() < 1e-5);
        }
    }

    #[test]
    fn missing_table_is_silent() {
        let morph = WavetableMorph::new(None);
        assert!(morph.current_wavetable().is_none());
        assert_eq!(morph.process_sample(0.3), 0.0);
    }

    #[test]
    fn lookup_interpolates_between_indices() {
        let frames = vec![vec![0.0, 1.0, 0.0, -1.0]];
        let table = Arc::new(Wavetable::from_frames(2, "tiny", WavetableCategory::User, &frames).unwrap());
        let morph = WavetableMorph::new(Some(table));
        // phase 0.125 sits halfway between index 0 and 1
        assert!((morph.process_sample(0.125) - 0.5).abs() < 1e-6);
        // last index wraps back to the first
        assert!((morph.process_sample(0.875) - (-0.5)).abs() < 1e-6);
    }

    #[test]
    fn position_is_clamped_and_round_trips() {
        let mut morph = WavetableMorph::new(Some(ramp_table(3, 8)));
        morph.set_position(0.42);
        assert_eq!(morph.position(), 0.42);
        morph.set_position(4.0);
        assert_eq!(morph.position(), 1.0);
        morph.set_position(f32::NAN);
        assert_eq!(morph.position(), 0.0);
    }

    #[test]
    fn ragged_frames_are_rejected() {
        let frames = vec![vec![0.0; 8], vec![0.0; 7]];
        let err = Wavetable::from_frames(3, "bad", WavetableCategory::User, &frames).unwrap_err();
        assert!(matches!(err, SynthError::RaggedFrame { frame: 1, len: 7, .. }));

        let err = Wavetable::from_frames(3, "none", WavetableCategory::User, &[]).unwrap_err();
        assert!(matches!(err, SynthError::EmptyWavetable { .. }));

        let err = Wavetable::from_frames(3, "huge", WavetableCategory::User, &[vec![0.0; MAX_FRAME_LEN + 1]])
            .unwrap_err();
        assert!(matches!(err, SynthError::FrameLength { .. }));
    }

    #[test]
    fn builtin_bank_is_normalised_and_uniform() {
        let bank = WavetableBank::builtin();
        assert_eq!(bank.len(), 5);
        for table in bank.iter() {
            assert_eq!(table.frame_len(), DEFAULT_FRAME_LEN);
            for f in 0..table.frame_count() {
                let peak = table.frame(f).iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
                assert!((peak - 1.0).abs() < 1e-3, "{} frame {f} peak {peak}", table.name());
            }
        }
        assert_eq!(bank.by_name("Basic Shapes").map(|t| t.frame_count()), Some(4));
        assert_eq!(bank.in_category(WavetableCategory::Analog).count(), 2);
    }

    #[test]
    fn bank_rejects_duplicate_ids() {
        let mut bank = WavetableBank::new();
        let frames = vec![vec![0.0, 1.0]];
        bank.insert(Wavetable::from_frames(7, "a", WavetableCategory::User, &frames).unwrap())
            .unwrap();
        let err = bank
            .insert(Wavetable::from_frames(7, "b", WavetableCategory::User, &frames).unwrap())
            .unwrap_err();
        assert_eq!(err, SynthError::DuplicateWavetable(7));
    }
}
