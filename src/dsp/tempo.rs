#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const MIN_BPM: f32 = 20.0;
pub const MAX_BPM: f32 = 999.0;
pub const DEFAULT_BPM: f32 = 120.0;

/// Clamp a host tempo; non-finite values fall back to 120.
#[inline]
pub fn clamp_bpm(bpm: f32) -> f32 {
    if bpm.is_finite() {
        bpm.clamp(MIN_BPM, MAX_BPM)
    } else {
        DEFAULT_BPM
    }
}

/// Tempo-sync length as a rational fraction of a whole note.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteValue {
    pub numerator: u32,
    /// 4 = quarter, 8 = eighth, etc.
    pub denominator: u32,
}

impl NoteValue {
    pub const WHOLE: NoteValue = NoteValue::new(1, 1);
    pub const HALF: NoteValue = NoteValue::new(1, 2);
    pub const QUARTER: NoteValue = NoteValue::new(1, 4);
    pub const EIGHTH: NoteValue = NoteValue::new(1, 8);
    pub const SIXTEENTH: NoteValue = NoteValue::new(1, 16);
    pub const THIRTY_SECOND: NoteValue = NoteValue::new(1, 32);

    /// Every straight value with its dotted and triplet variants, longest first.
    pub const SYNC_TABLE: [NoteValue; 18] = [
        NoteValue::WHOLE.dotted(),
        NoteValue::WHOLE,
        NoteValue::HALF.dotted(),
        NoteValue::WHOLE.triplet(),
        NoteValue::HALF,
        NoteValue::QUARTER.dotted(),
        NoteValue::HALF.triplet(),
        NoteValue::QUARTER,
        NoteValue::EIGHTH.dotted(),
        NoteValue::QUARTER.triplet(),
        NoteValue::EIGHTH,
        NoteValue::SIXTEENTH.dotted(),
        NoteValue::EIGHTH.triplet(),
        NoteValue::SIXTEENTH,
        NoteValue::THIRTY_SECOND.dotted(),
        NoteValue::SIXTEENTH.triplet(),
        NoteValue::THIRTY_SECOND,
        NoteValue::THIRTY_SECOND.triplet(),
    ];

    pub const fn new(numerator: u32, denominator: u32) -> Self {
        NoteValue {
            numerator,
            denominator,
        }
    }

    /// Multiply by 3/2
    pub const fn dotted(self) -> Self {
        NoteValue {
            numerator: self.numerator * 3,
            denominator: self.denominator * 2,
        }
    }

    /// Multiply by 2/3 (three in the time of two)
    pub const fn triplet(self) -> Self {
        NoteValue {
            numerator: self.numerator * 2,
            denominator: self.denominator * 3,
        }
    }

    /// Length in quarter-note beats.
    pub fn beats(&self) -> f32 {
        4.0 * self.numerator as f32 / self.denominator.max(1) as f32
    }

    /// Frequency of one cycle per note value at `bpm`.
    pub fn cycle_hz(&self, bpm: f32) -> f32 {
        let beats = self.beats();
        if beats <= 0.0 {
            return 0.0;
        }
        clamp_bpm(bpm) / 60.0 / beats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_beats() {
        assert_eq!(NoteValue::WHOLE.beats(), 4.0);
        assert_eq!(NoteValue::QUARTER.beats(), 1.0);
        assert_eq!(NoteValue::SIXTEENTH.beats(), 0.25);
        assert_eq!(NoteValue::QUARTER.dotted().beats(), 1.5);
        assert!((NoteValue::QUARTER.triplet().beats() - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_quarter_at_120_is_two_hz() {
        assert!((NoteValue::QUARTER.cycle_hz(120.0) - 2.0).abs() < 1e-6);
        assert!((NoteValue::WHOLE.cycle_hz(120.0) - 0.5).abs() < 1e-6);
        assert!((NoteValue::EIGHTH.triplet().cycle_hz(120.0) - 6.0).abs() < 1e-5);
    }

    #[test]
    fn test_sync_table_is_longest_first() {
        let beats: Vec<f32> = NoteValue::SYNC_TABLE.iter().map(|n| n.beats()).collect();
        assert!(beats.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn test_bpm_is_clamped() {
        assert_eq!(clamp_bpm(5.0), MIN_BPM);
        assert_eq!(clamp_bpm(5_000.0), MAX_BPM);
        assert_eq!(clamp_bpm(f32::NAN), DEFAULT_BPM);
    }
}
