use crate::{
    audio::sample::AudioSample,
    note::{Slot, SLOT_COUNT},
    voice::{envelope::AdsrParams, oscillator::Waveform},
};
use basedrop::{Handle, Shared};
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{info, warn};

/// A playable sound: a waveform or samples, plus its envelope.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Instrument {
    pub name: String,
    pub waveform: Waveform,
    pub adsr: AdsrParams,
    /// For `sample` instruments, the first entry is used for every slot.
    /// For `multisample` instruments, each entry is bound to its own slot.
    pub samples: Vec<SampleSlot>,
}

/// Settings of a sample bound to an instrument, and its decoded data once loaded.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SampleSlot {
    /// The slot this sample plays on (multisample instruments only).
    pub slot: usize,
    pub path: PathBuf,
    pub pitch_modifier: f32,
    pub volume_modifier: f32,
    /// Restart the sample whenever it runs out while the note is held.
    pub play_continuously: bool,
    /// Cut the sample as soon as the note is released.
    pub stop_on_release: bool,
    /// Envelope override (multisample instruments only).
    pub adsr: Option<AdsrParams>,
    #[serde(skip)]
    pub data: Option<Arc<AudioSample>>,
}

impl Default for SampleSlot {
    fn default() -> Self {
        Self {
            slot: 0,
            path: PathBuf::new(),
            pitch_modifier: 1.0,
            volume_modifier: 1.0,
            play_continuously: false,
            stop_on_release: false,
            adsr: None,
            data: None,
        }
    }
}

impl SampleSlot {
    pub fn from_data(data: AudioSample) -> Self {
        Self {
            data: Some(Arc::new(data)),
            ..Default::default()
        }
    }

    /// Whether the sample data is loaded and can be played.
    pub fn is_ready(&self) -> bool {
        self.data.as_ref().is_some_and(|d| d.length() > 0)
    }
}

impl Instrument {
    pub fn new(name: impl Into<String>, waveform: Waveform) -> Self {
        Self {
            name: name.into(),
            waveform,
            ..Default::default()
        }
    }

    pub fn with_adsr(mut self, adsr: AdsrParams) -> Self {
        self.adsr = adsr;
        self
    }

    pub fn with_sample(mut self, sample: SampleSlot) -> Self {
        self.samples.push(sample);
        self
    }

    /// The sample that plays on `slot`, if any.
    pub fn sample_for(&self, slot: Slot) -> Option<&SampleSlot> {
        match self.waveform {
            Waveform::Sample => self.samples.first(),
            Waveform::Multisample => self
                .samples
                .iter()
                .find(|s| Slot::new(s.slot) == slot),
            _ => None,
        }
    }

    /// The envelope for `slot`, honouring per-sample overrides of multisample instruments.
    pub fn adsr_for(&self, slot: Slot) -> AdsrParams {
        match self.waveform {
            Waveform::Multisample => self
                .sample_for(slot)
                .and_then(|s| s.adsr)
                .unwrap_or(self.adsr),
            _ => self.adsr,
        }
    }

    /// The frequency at which a sample on `slot` plays back at its recorded pitch.
    pub fn sample_anchor(&self, slot: Slot) -> f32 {
        match self.waveform {
            Waveform::Multisample => slot.frequency(0),
            _ => Slot::new(0).frequency(0),
        }
    }

    /// Decodes every sample from disk, resolving relative paths against `dir`.
    /// Samples that fail to load are left silent.
    pub fn load_samples(&mut self, dir: &Path) {
        for sample in &mut self.samples {
            if sample.data.is_some() || sample.path.as_os_str().is_empty() {
                continue;
            }
            let path = dir.join(&sample.path);
            match AudioSample::open(&path) {
                Ok(data) => {
                    info!("Loaded sample {:?} ({} frames)", path, data.length());
                    sample.data = Some(Arc::new(data));
                }
                Err(err) => warn!("Sample not found: {:?}: {}", path, err),
            }
        }
    }
}

/// The list of instruments the performer switches between.
pub struct InstrumentBank {
    instruments: Vec<Shared<Instrument>>,
    current: usize,
}

impl InstrumentBank {
    /// Creates a bank; an empty list yields a single default instrument.
    pub fn new(handle: &Handle, instruments: Vec<Instrument>) -> Self {
        let mut instruments: Vec<_> = instruments
            .into_iter()
            .enumerate()
            .map(|(i, mut instrument)| {
                if instrument.name.is_empty() {
                    instrument.name = format!("Instrument {}", i + 1);
                }
                if instrument.waveform == Waveform::Multisample {
                    for sample in &mut instrument.samples {
                        sample.slot = sample.slot.min(SLOT_COUNT - 1);
                    }
                }
                Shared::new(handle, instrument)
            })
            .collect();
        if instruments.is_empty() {
            instruments.push(Shared::new(handle, Instrument::new("Instrument 1", Waveform::default())));
        }
        Self {
            instruments,
            current: 0,
        }
    }

    pub fn current(&self) -> &Shared<Instrument> {
        &self.instruments[self.current]
    }

    pub fn index(&self) -> usize {
        self.current
    }

    pub fn count(&self) -> usize {
        self.instruments.len()
    }

    pub fn select_previous(&mut self) {
        self.current = self.current.saturating_sub(1);
    }

    pub fn select_next(&mut self) {
        self.current = (self.current + 1).min(self.instruments.len() - 1);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use basedrop::Collector;

    #[test]
    fn test_bank_selection_is_clamped() {
        let collector = Collector::new();
        let mut bank = InstrumentBank::new(
            &collector.handle(),
            vec![
                Instrument::new("a", Waveform::default()),
                Instrument::new("", Waveform::Triangle { quantized: true }),
            ],
        );
        bank.select_previous();
        assert_eq!(bank.index(), 0);
        bank.select_next();
        bank.select_next();
        assert_eq!(bank.index(), 1);
        assert_eq!(bank.current().name, "Instrument 2");
    }

    #[test]
    fn test_empty_bank_has_default() {
        let collector = Collector::new();
        let bank = InstrumentBank::new(&collector.handle(), vec![]);
        assert_eq!(bank.count(), 1);
        assert_eq!(bank.current().waveform, Waveform::default());
    }

    #[test]
    fn test_sample_lookup() {
        let single = Instrument::new("s", Waveform::Sample).with_sample(SampleSlot::default());
        assert!(single.sample_for(Slot::new(20)).is_some());

        let override_adsr = AdsrParams {
            attack_frames: 1,
            ..Default::default()
        };
        let multi = Instrument::new("m", Waveform::Multisample).with_sample(SampleSlot {
            slot: 3,
            adsr: Some(override_adsr),
            ..Default::default()
        });
        assert!(multi.sample_for(Slot::new(3)).is_some());
        assert!(multi.sample_for(Slot::new(4)).is_none());
        assert_eq!(multi.adsr_for(Slot::new(3)), override_adsr);
        assert_eq!(multi.adsr_for(Slot::new(4)), AdsrParams::default());

        let pulse = Instrument::new("p", Waveform::default()).with_sample(SampleSlot::default());
        assert!(pulse.sample_for(Slot::new(0)).is_none());
    }

    #[test]
    fn test_missing_sample_stays_silent() {
        let mut instrument = Instrument::new("s", Waveform::Sample).with_sample(SampleSlot {
            path: "does-not-exist.wav".into(),
            ..Default::default()
        });
        instrument.load_samples(Path::new("/nonexistent"));
        assert!(!instrument.samples[0].is_ready());
    }
}
