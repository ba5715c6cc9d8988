//! Analog-modeled filter: a saturating feedback loop wrapped around the SVF core.

/*
Signal Path
===========

                 ┌──────────────── feedback ◄──────────────┐
                 │                                         │
    input ──► × input_gain ──► (+) ──► saturate ──► SVF ──► tap ──► × output_gain ──► out
                                                            │
                                                  register = tap

Per sample, in exactly this order:

    driven   = input * input_gain + register * feedback
    shaped   = saturate(driven)
    tap      = svf(shaped)             (notch: shaped - bandpass)
    register = tap
    out      = tap * output_gain

The register stores the tap *before* output gain, so the loop sees the same
level whatever the drive compensation does. Feeding back after the SVF but
saturating before it is what lets a resonant model approach self-oscillation
without blowing up: the shaper bounds the SVF input.

Models
======

| model    | curve           | max Q | max feedback | drive range |
| -------- | --------------- | ----- | ------------ | ----------- |
| Neutral  | identity        | 20    | 0            | 2           |
| Ladder   | tanh            | 12    | 0.45         | 8           |
| Diode    | hard clip       | 10    | 0.60         | 10          |
| Polished | x / (1 + |x|)   | 8     | 0.25         | 4           |
| Punchy   | asymmetric tanh | 9     | 0.50         | 6           |

    Q          = 0.5 + resonance² · (max Q - 0.5)     (capped at MAX_Q)
    feedback   = resonance³ · max feedback
    input gain = 1 + drive · drive range
    out gain   = input_gain ^ -makeup

Neutral has no extra feedback and no curve: with identity saturation a
feedback term would make the loop a plain linear recursion that can diverge.
Its makeup exponent is 1, so drive is level-neutral there. The saturating
models use 0.5 so turning up drive still gets louder, just not linearly.
*/

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::filter::{FilterType, SvfCore, MAX_CUTOFF_HZ, MAX_Q, MIN_CUTOFF_HZ, MIN_Q};
use crate::dsp::saturation::Saturation;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterModel {
    Neutral,
    Ladder,
    Diode,
    Polished,
    Punchy,
}

impl FilterModel {
    pub const ALL: [FilterModel; 5] = [
        FilterModel::Neutral,
        FilterModel::Ladder,
        FilterModel::Diode,
        FilterModel::Polished,
        FilterModel::Punchy,
    ];

    fn curve(self) -> ModelCurve {
        match self {
            FilterModel::Neutral => ModelCurve {
                q_max: 20.0,
                feedback_max: 0.0,
                drive_range: 2.0,
                makeup: 1.0,
                saturation: Saturation::Identity,
            },
            FilterModel::Ladder => ModelCurve {
                q_max: 12.0,
                feedback_max: 0.45,
                drive_range: 8.0,
                makeup: 0.5,
                saturation: Saturation::Tanh,
            },
            FilterModel::Diode => ModelCurve {
                q_max: 10.0,
                feedback_max: 0.6,
                drive_range: 10.0,
                makeup: 0.5,
                saturation: Saturation::HardClip,
            },
            FilterModel::Polished => ModelCurve {
                q_max: 8.0,
                feedback_max: 0.25,
                drive_range: 4.0,
                makeup: 0.5,
                saturation: Saturation::Soft,
            },
            FilterModel::Punchy => ModelCurve {
                q_max: 9.0,
                feedback_max: 0.5,
                drive_range: 6.0,
                makeup: 0.5,
                saturation: Saturation::AsymmetricTanh,
            },
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ModelCurve {
    q_max: f32,
    feedback_max: f32,
    drive_range: f32,
    makeup: f32,
    saturation: Saturation,
}

#[derive(Debug, Clone)]
pub struct AnalogFilter {
    core: SvfCore,
    model: FilterModel,
    filter_type: FilterType,
    sample_rate: f32,

    cutoff_hz: f32,
    resonance: f32,
    drive: f32,

    // Derived from model/resonance/drive
    q: f32,
    feedback: f32,
    input_gain: f32,
    output_gain: f32,
    saturation: Saturation,

    register: f32,
}

impl AnalogFilter {
    pub fn new(sample_rate: f32) -> Self {
        let mut filter = Self {
            core: SvfCore::new(sample_rate),
            model: FilterModel::Neutral,
            filter_type: FilterType::LowPass,
            sample_rate: sample_rate.max(1.0),
            cutoff_hz: MAX_CUTOFF_HZ,
            resonance: 0.0,
            drive: 0.0,
            q: MIN_Q,
            feedback: 0.0,
            input_gain: 1.0,
            output_gain: 1.0,
            saturation: Saturation::Identity,
            register: 0.0,
        };
        filter.update_model();
        filter
    }

    /// Change the sample rate and clear the loop state. Not for the audio thread
    /// mid-note; the SVF jumps to new coefficients.
    pub fn prepare(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate.max(1.0);
        self.reset();
        self.update_core();
    }

    fn update_model(&mut self) {
        let curve = self.model.curve();
        let r = self.resonance;

        self.q = (0.5 + r * r * (curve.q_max - 0.5)).clamp(MIN_Q, MAX_Q);
        self.feedback = r * r * r * curve.feedback_max;
        self.input_gain = 1.0 + self.drive * curve.drive_range;
        self.output_gain = self.input_gain.powf(-curve.makeup);
        self.saturation = curve.saturation;
        self.update_core();
    }

    #[inline]
    fn update_core(&mut self) {
        self.core.set_params(self.cutoff_hz, self.q, self.sample_rate);
    }

    #[inline]
    pub fn process_sample(&mut self, input: f32) -> f32 {
        let driven = input * self.input_gain + self.register * self.feedback;
        let shaped = self.saturation.apply(driven);
        let taps = self.core.next_sample(shaped);

        let tap = match self.filter_type {
            FilterType::LowPass => taps.lowpass,
            FilterType::HighPass => taps.highpass,
            FilterType::BandPass => taps.bandpass,
            FilterType::Notch => shaped - taps.bandpass,
        };

        self.register = tap;
        tap * self.output_gain
    }

    pub fn reset(&mut self) {
        self.core.reset();
        self.register = 0.0;
    }

    pub fn cutoff(&self) -> f32 {
        self.cutoff_hz
    }

    pub fn set_cutoff(&mut self, cutoff_hz: f32) {
        self.cutoff_hz = if cutoff_hz.is_finite() {
            cutoff_hz.clamp(MIN_CUTOFF_HZ, MAX_CUTOFF_HZ)
        } else {
            MAX_CUTOFF_HZ
        };
        self.update_core();
    }

    pub fn resonance(&self) -> f32 {
        self.resonance
    }

    pub fn set_resonance(&mut self, resonance: f32) {
        self.resonance = clamp_unit(resonance);
        self.update_model();
    }

    pub fn drive(&self) -> f32 {
        self.drive
    }

    pub fn set_drive(&mut self, drive: f32) {
        self.drive = clamp_unit(drive);
        self.update_model();
    }

    pub fn model(&self) -> FilterModel {
        self.model
    }

    pub fn set_model(&mut self, model: FilterModel) {
        if model != self.model {
            self.model = model;
            self.update_model();
        }
    }

    pub fn filter_type(&self) -> FilterType {
        self.filter_type
    }

    pub fn set_filter_type(&mut self, filter_type: FilterType) {
        self.filter_type = filter_type;
    }

    /// The Q handed to the SVF core.
    pub fn q(&self) -> f32 {
        self.q
    }

    pub fn feedback(&self) -> f32 {
        self.feedback
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
