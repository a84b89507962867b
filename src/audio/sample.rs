use std::{fs::File, io::BufReader, io::Read, path::Path};
use thiserror::Error;

/// Decoded mono audio used by sampled instruments.
#[derive(Clone)]
pub struct AudioSample {
    sample_rate: u32,
    data: Box<[f32]>,
}

impl std::fmt::Debug for AudioSample {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioSample")
            .field("sample_rate", &self.sample_rate)
            .field("length", &self.data.len())
            .finish()
    }
}

impl AudioSample {
    pub fn new(sample_rate: u32, data: impl Into<Box<[f32]>>) -> Self {
        Self {
            sample_rate,
            data: data.into(),
        }
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, ReadSampleError> {
        let file = File::open(path).map_err(ReadSampleError::IoError)?;
        Self::read_wav(BufReader::new(file))
    }

    /// Reads a WAV file, mixing multi-channel audio down to mono.
    pub fn read_wav(reader: impl Read) -> Result<Self, ReadSampleError> {
        let wav = hound::WavReader::new(reader)?;

        // Extract information from the file header
        let spec = wav.spec();
        let length = wav.duration() as usize;
        let sample_rate = spec.sample_rate;
        let channels = spec.channels as usize;
        if channels == 0 {
            return Err(ReadSampleError::BadFormat("File has no channels"));
        }

        // Determine the maximum sample value, used to normalize the samples between -1.0 and 1.0
        let max_value = match spec.bits_per_sample {
            8 => 0x7f,
            16 => 0x7fff,
            24 => 0x7fffff,
            32 => 0x7fffffff,
            _ => return Err(ReadSampleError::UnexpectedError),
        };
        let scale = (max_value as f32).recip();

        // Read the interlaced samples into a buffer, normalized into `f32` values between -1.0 and 1.0
        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Int => wav
                .into_samples::<i32>()
                .map(|s| s.map(|s| s as f32 * scale))
                .collect::<Result<_, _>>(),
            hound::SampleFormat::Float => wav.into_samples::<f32>().collect(),
        }?;
        if samples.len() != channels * length {
            return Err(ReadSampleError::UnexpectedError);
        }

        // Mix down to mono
        let inv_channels = (channels as f32).recip();
        let data = samples
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() * inv_channels)
            .collect::<Box<[f32]>>();

        Ok(Self { sample_rate, data })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn length(&self) -> usize {
        self.data.len()
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// The sample at integer frame position `pos`, or silence past the end.
    pub fn frame(&self, pos: f32) -> f32 {
        if pos < 0.0 || !pos.is_finite() {
            return 0.0;
        }
        self.data.get(pos as usize).copied().unwrap_or(0.0)
    }
}

#[derive(Error, Debug)]
pub enum ReadSampleError {
    #[error("IO error: {0}")]
    IoError(std::io::Error),
    #[error("Format error: {0}")]
    BadFormat(&'static str),
    #[error("Unexpected error")]
    UnexpectedError,
}

impl From<hound::Error> for ReadSampleError {
    fn from(err: hound::Error) -> Self {
        use hound::Error as A;
        use ReadSampleError as B;
        match err {
            A::IoError(inner) => B::IoError(inner),
            A::FormatError(inner) => B::BadFormat(inner),
            A::Unsupported => B::BadFormat("Unsupported format"),
            _ => B::UnexpectedError,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    fn stereo_wav() -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for _ in 0..4 {
            writer.write_sample(0x7fff_i16).unwrap();
            writer.write_sample(0_i16).unwrap();
        }
        writer.finalize().unwrap();
        cursor.into_inner()
    }

    #[test]
    fn test_read_wav_mixes_to_mono() {
        let sample = AudioSample::read_wav(Cursor::new(stereo_wav())).unwrap();
        assert_eq!(sample.sample_rate(), 22050);
        assert_eq!(sample.length(), 4);
        for &s in sample.data() {
            assert!((s - 0.5).abs() < 1e-4);
        }
    }

    #[test]
    fn test_read_garbage_fails() {
        let result = AudioSample::read_wav(Cursor::new(vec![1, 2, 3, 4]));
        assert!(result.is_err());
    }

    #[test]
    fn test_frame_lookup() {
        let sample = AudioSample::new(48000, vec![0.1, 0.2, 0.3]);
        assert_eq!(sample.frame(1.7), 0.2);
        assert_eq!(sample.frame(3.0), 0.0);
        assert_eq!(sample.frame(-1.0), 0.0);
        assert_eq!(sample.frame(f32::NAN), 0.0);
    }
}
