use crate::{
    engine::Renderer,
    error::{Error, Result},
};
use cpal::{
    traits::{DeviceTrait, HostTrait, StreamTrait},
    Device, FromSample, SampleFormat, SampleRate, SizedSample, Stream, StreamConfig,
    SupportedStreamConfig,
};
use tracing::{info, warn};

/// The default output device, configured as close as possible to the engine's format.
pub struct AudioOutput {
    device: Device,
    config: SupportedStreamConfig,
}

impl AudioOutput {
    /// Opens the default output device, preferring `sample_rate` when it is supported.
    pub fn open(sample_rate: u32) -> Result<Self> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(Error::NoOutputDevice)?;
        let config = pick_config(&device, sample_rate)?;
        if config.sample_rate().0 != sample_rate {
            warn!(
                "Output device doesn't support {} Hz, using {} Hz",
                sample_rate,
                config.sample_rate().0
            );
        }
        info!(
            "Output device {:?}: {} Hz, {} channels, {:?}",
            device.name().unwrap_or_default(),
            config.sample_rate().0,
            config.channels(),
            config.sample_format()
        );
        Ok(Self { device, config })
    }

    /// The sample rate the engine must render at to play in tune.
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate().0
    }

    /// Starts a stream that pulls audio from the renderer. Audio plays until the stream
    /// is dropped.
    pub fn start(self, renderer: Renderer) -> Result<Stream> {
        let channels = self.config.channels() as usize;
        let config = self.config.config();
        let stream = match self.config.sample_format() {
            SampleFormat::F32 => build_stream::<f32>(&self.device, &config, channels, renderer)?,
            SampleFormat::I16 => build_stream::<i16>(&self.device, &config, channels, renderer)?,
            SampleFormat::U16 => build_stream::<u16>(&self.device, &config, channels, renderer)?,
            format => return Err(Error::UnsupportedFormat(format)),
        };
        stream.play()?;
        Ok(stream)
    }
}

fn pick_config(device: &Device, sample_rate: u32) -> Result<SupportedStreamConfig> {
    let rate = SampleRate(sample_rate);
    if let Ok(configs) = device.supported_output_configs() {
        let mut candidates: Vec<_> = configs
            .filter(|c| c.min_sample_rate() <= rate && rate <= c.max_sample_rate())
            .filter(|c| matches!(c.sample_format(), SampleFormat::F32 | SampleFormat::I16 | SampleFormat::U16))
            .collect();
        candidates.sort_by_key(|c| (c.sample_format() != SampleFormat::F32, c.channels()));
        if let Some(config) = candidates.into_iter().next() {
            return Ok(config.with_sample_rate(rate));
        }
    }
    Ok(device.default_output_config()?)
}

fn build_stream<T>(device: &Device, config: &StreamConfig, channels: usize, mut renderer: Renderer) -> Result<Stream>
where
    T: SizedSample + FromSample<f32>,
{
    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            renderer.render_interleaved(data, channels);
        },
        move |err| {
            warn!("An error occurred on the output stream: {}", err);
        },
        None,
    )?;
    Ok(stream)
}
