use crate::util::fmod;
use serde::{Deserialize, Serialize};
use std::{f32::consts::PI, sync::OnceLock};

/// The number of harmonics summed by the additive waveform.
pub const NUM_HARMONICS: usize = 8;

const SINE_TABLE_SIZE: usize = 4096;

/// Quantization step used to emulate a low bit-depth (16 level) DAC.
const QUANTIZE_STEP: f32 = 2.0 / 16.0;

/// The sound source of an instrument.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Waveform {
    Pulse {
        /// Duty cycle between 0 and 1.
        #[serde(default = "default_pulse_width")]
        width: f32,
    },
    Triangle {
        #[serde(default)]
        quantized: bool,
    },
    Sawtooth {
        #[serde(default)]
        quantized: bool,
    },
    /// A sum of sine harmonics, normalized by the total weight.
    Additive {
        #[serde(default = "default_harmonics")]
        harmonics: [f32; NUM_HARMONICS],
    },
    /// One sample, repitched across every slot.
    Sample,
    /// A separate sample per slot.
    Multisample,
}

fn default_pulse_width() -> f32 {
    0.5
}

fn default_harmonics() -> [f32; NUM_HARMONICS] {
    let mut harmonics = [0.0; NUM_HARMONICS];
    harmonics[0] = 1.0;
    harmonics
}

impl Default for Waveform {
    fn default() -> Self {
        Waveform::Pulse {
            width: default_pulse_width(),
        }
    }
}

impl Waveform {
    /// Whether the waveform plays back sample data instead of an oscillator.
    pub fn is_sampled(&self) -> bool {
        matches!(self, Waveform::Sample | Waveform::Multisample)
    }

    /// The instantaneous value at `phase`, between -1 and 1. Sampled waveforms are
    /// silent here; they are looked up from their sample data instead.
    pub fn value(&self, phase: f32) -> f32 {
        match self {
            Waveform::Pulse { width } => pulse(phase, *width),
            Waveform::Triangle { quantized } => triangle(phase, *quantized),
            Waveform::Sawtooth { quantized } => sawtooth(phase, *quantized),
            Waveform::Additive { harmonics } => additive(phase, harmonics),
            Waveform::Sample | Waveform::Multisample => 0.0,
        }
    }
}

pub fn pulse(phase: f32, width: f32) -> f32 {
    if phase >= width {
        -1.0
    } else {
        1.0
    }
}

pub fn triangle(phase: f32, quantized: bool) -> f32 {
    let y = 4.0 * (phase - 0.5).abs() - 1.0;
    if quantized {
        quantize(y)
    } else {
        y
    }
}

pub fn sawtooth(phase: f32, quantized: bool) -> f32 {
    let y = 2.0 * (phase - 0.5);
    if quantized {
        quantize(y)
    } else {
        y
    }
}

pub fn additive(phase: f32, harmonics: &[f32; NUM_HARMONICS]) -> f32 {
    let mut output = 0.0;
    let mut weight = 0.0;
    for (i, &coeff) in harmonics.iter().enumerate() {
        weight += coeff;
        output += coeff * sine(phase * (i + 1) as f32);
    }
    if weight > 0.0 {
        output / weight
    } else {
        0.0
    }
}

fn quantize(y: f32) -> f32 {
    y - fmod(y, QUANTIZE_STEP)
}

/// Table-driven `sin(2π·phase)` with linear interpolation.
pub fn sine(phase: f32) -> f32 {
    static SINE_TABLE: OnceLock<Box<[f32]>> = OnceLock::new();

    let table = SINE_TABLE.get_or_init(|| {
        (0..=SINE_TABLE_SIZE)
            .map(|i| (2.0 * PI * i as f32 / SINE_TABLE_SIZE as f32).sin())
            .collect()
    });

    let x = fmod(phase, 1.0) * SINE_TABLE_SIZE as f32;
    let idx = (x as usize).min(SINE_TABLE_SIZE - 1);
    let t = x - idx as f32;
    table[idx] + t * (table[idx + 1] - table[idx])
}
