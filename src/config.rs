use crate::{
    audio::recorder::RecordingFormat,
    error::Result,
    instrument::Instrument,
    note::PlayMode,
    octave::{MAX_OCTAVE, MIN_OCTAVE},
};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use tracing::info;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub recording: RecordingConfig,
    #[serde(rename = "instrument")]
    pub instruments: Vec<Instrument>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    /// Control ticks per second.
    pub control_rate: u32,
    /// Gain applied to the mix before clipping, leaving room for chords.
    pub headroom: f32,
    pub play_mode: PlayMode,
    /// Target volume at startup, between 0 and 1.
    pub initial_volume: f32,
    /// Reset the target volume to its last preset whenever a note is pressed.
    pub constant_volume: bool,
    pub min_octave: i32,
    pub max_octave: i32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            control_rate: 60,
            headroom: 0.3,
            play_mode: PlayMode::Solo,
            initial_volume: 0.5,
            constant_volume: false,
            min_octave: MIN_OCTAVE,
            max_octave: MAX_OCTAVE,
        }
    }
}

impl EngineConfig {
    /// A copy with out-of-range values clamped.
    pub fn sanitized(&self) -> Self {
        Self {
            sample_rate: self.sample_rate.max(1),
            control_rate: self.control_rate.max(1),
            headroom: if self.headroom.is_finite() {
                self.headroom.max(0.0)
            } else {
                0.3
            },
            initial_volume: self.initial_volume.clamp(0.0, 1.0),
            ..self.clone()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    pub format: RecordingFormat,
    /// Seconds of audio buffered between the audio thread and the WAV writer.
    pub buffer_seconds: f32,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            format: RecordingFormat::Int16,
            buffer_seconds: 2.0,
        }
    }
}

impl RecordingConfig {
    /// Tee capacity in samples at the given sample rate.
    pub fn capacity(&self, sample_rate: u32) -> usize {
        let seconds = if self.buffer_seconds.is_finite() {
            self.buffer_seconds.max(0.1)
        } else {
            2.0
        };
        (seconds * sample_rate as f32) as usize
    }
}

impl Config {
    /// Reads a configuration file and loads the samples it refers to, relative to the
    /// file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&text)?;
        let dir = path.parent().unwrap_or(Path::new("."));
        for instrument in &mut config.instruments {
            instrument.load_samples(dir);
        }
        info!(
            "Loaded config {:?} with {} instruments",
            path,
            config.instruments.len()
        );
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}
