use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
    #[error("No audio output device available")]
    NoOutputDevice,
    #[error("Audio device error: {0}")]
    DeviceConfig(#[from] cpal::DefaultStreamConfigError),
    #[error("Audio stream error: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),
    #[error("Audio playback error: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
    #[error("Unsupported output sample format {0:?}")]
    UnsupportedFormat(cpal::SampleFormat),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
