use crate::error::Error;
use basedrop::Handle;
use hound::{WavSpec, WavWriter};
use ringbuf_basedrop::{Consumer, Producer, RingBuffer};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
};
use tracing::{info, warn};

const DRAIN_CHUNK: usize = 1024;

/// Sample encoding of recorded WAV files.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordingFormat {
    #[default]
    Int16,
    Float32,
}

impl RecordingFormat {
    fn spec(self, sample_rate: u32) -> WavSpec {
        let (bits_per_sample, sample_format) = match self {
            RecordingFormat::Int16 => (16, hound::SampleFormat::Int),
            RecordingFormat::Float32 => (32, hound::SampleFormat::Float),
        };
        WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample,
            sample_format,
        }
    }
}

/// Creates both ends of the recording tee.
pub fn recorder(
    handle: &Handle,
    capacity: usize,
    sample_rate: u32,
    format: RecordingFormat,
) -> (WavRecorder, RecorderTap) {
    let (producer, consumer) = RingBuffer::new(capacity.max(1)).split(handle);
    let recording = Arc::new(AtomicBool::new(false));
    let dropped = Arc::new(AtomicUsize::new(0));
    (
        WavRecorder {
            consumer,
            recording: recording.clone(),
            dropped: dropped.clone(),
            writer: None,
            path: None,
            format,
            sample_rate,
            buffer: vec![0.0; DRAIN_CHUNK],
        },
        RecorderTap {
            producer,
            recording,
            dropped,
        },
    )
}

/// The audio thread's end of the recording tee. Never blocks.
pub struct RecorderTap {
    producer: Producer<f32>,
    recording: Arc<AtomicBool>,
    dropped: Arc<AtomicUsize>,
}

impl RecorderTap {
    pub fn is_recording(&self) -> bool {
        self.recording.load(Ordering::Acquire)
    }

    /// Forwards rendered samples to the recorder. Samples that don't fit are dropped.
    pub fn push(&mut self, samples: &[f32]) {
        if !self.is_recording() {
            return;
        }
        let pushed = self.producer.push_slice(samples);
        if pushed < samples.len() {
            self.dropped.fetch_add(samples.len() - pushed, Ordering::Relaxed);
        }
    }
}

/// Writes the rendered stream to a mono WAV file while recording.
pub struct WavRecorder {
    consumer: Consumer<f32>,
    recording: Arc<AtomicBool>,
    dropped: Arc<AtomicUsize>,
    writer: Option<WavWriter<BufWriter<File>>>,
    path: Option<PathBuf>,
    format: RecordingFormat,
    sample_rate: u32,
    buffer: Vec<f32>,
}

impl WavRecorder {
    pub fn is_recording(&self) -> bool {
        self.writer.is_some()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Starts recording to `path`, finishing any recording in progress first.
    pub fn start(&mut self, path: impl AsRef<Path>) -> Result<(), Error> {
        if self.is_recording() {
            self.stop()?;
        }

        // Discard anything left over from a previous recording
        while self.consumer.pop_slice(&mut self.buffer) > 0 {}
        self.dropped.store(0, Ordering::Relaxed);

        let path = path.as_ref().to_path_buf();
        let writer = WavWriter::create(&path, self.format.spec(self.sample_rate))?;
        info!("Recording to {:?} ({:?})", path, self.format);
        self.writer = Some(writer);
        self.path = Some(path);
        self.recording.store(true, Ordering::Release);
        Ok(())
    }

    /// Writes every sample the audio thread has forwarded so far.
    pub fn drain(&mut self) -> Result<usize, Error> {
        let Some(writer) = self.writer.as_mut() else {
            return Ok(0);
        };

        let mut written = 0;
        loop {
            let len = self.consumer.pop_slice(&mut self.buffer);
            if len == 0 {
                break;
            }
            for &sample in &self.buffer[..len] {
                let sample = sample.clamp(-1.0, 1.0);
                match self.format {
                    RecordingFormat::Int16 => writer.write_sample((sample * i16::MAX as f32) as i16)?,
                    RecordingFormat::Float32 => writer.write_sample(sample)?,
                }
            }
            written += len;
        }

        let dropped = self.dropped.swap(0, Ordering::Relaxed);
        if dropped > 0 {
            warn!("Recording buffer overrun, {} samples lost", dropped);
        }
        Ok(written)
    }

    /// Stops recording and finalizes the file, returning its path.
    pub fn stop(&mut self) -> Result<Option<PathBuf>, Error> {
        self.recording.store(false, Ordering::Release);
        if self.writer.is_none() {
            return Ok(None);
        }
        self.drain()?;

        let path = self.path.take();
        if let Some(writer) = self.writer.take() {
            let frames = writer.len();
            writer.finalize()?;
            info!("Recording stopped, {} samples written to {:?}", frames, path);
        }
        Ok(path)
    }
}

impl Drop for WavRecorder {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            warn!("Failed to finish recording: {}", err);
        }
    }
}
