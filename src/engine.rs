use crate::{
    audio::recorder::{recorder, RecorderTap, WavRecorder},
    config::{Config, EngineConfig, RecordingConfig},
    error::Result,
    freq::{dive::DiveEvent, FrequencyPipeline},
    input::ControlInput,
    instrument::{Instrument, InstrumentBank},
    lifecycle::NoteTable,
    note::{NoteState, PlayMode, Slot, SLOT_COUNT},
    octave::OctaveTracker,
    util::wrap_phase,
    voice::{envelope::EnvelopeEvent, sampler::SamplePlayback, Voice},
    volume::VolumeControl,
};
use basedrop::{Collector, Handle, Shared, SharedCell};
use cpal::{FromSample, Sample};
use itertools::izip;
use std::{
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};
use tracing::{debug, info, warn};

/// Samples rendered between pushes to the recording tee.
const TEE_CHUNK: usize = 256;

/// Everything the renderer needs from one control tick.
#[derive(Clone)]
pub struct ControlFrame {
    /// Incremented by one for every published frame.
    pub sequence: u64,
    pub states: [NoteState; SLOT_COUNT],
    pub frequencies: [f32; SLOT_COUNT],
    pub gains: [f32; SLOT_COUNT],
    pub playback: [SamplePlayback; SLOT_COUNT],
    pub instrument: Shared<Instrument>,
}

impl ControlFrame {
    fn silent(instrument: Shared<Instrument>) -> Self {
        Self {
            sequence: 0,
            states: [NoteState::Idle; SLOT_COUNT],
            frequencies: std::array::from_fn(|i| Slot::new(i).frequency(0)),
            gains: [0.0; SLOT_COUNT],
            playback: [SamplePlayback::default(); SLOT_COUNT],
            instrument,
        }
    }
}

/// The latest control frame, written by the engine and read by the renderer.
struct Published {
    frame: SharedCell<ControlFrame>,
    sequence: AtomicU64,
}

/// The control side of the synth. Call `tick` once per control frame.
pub struct Engine {
    config: EngineConfig,
    octave: OctaveTracker,
    notes: NoteTable,
    pipeline: FrequencyPipeline,
    volume: VolumeControl,
    voices: [Voice; SLOT_COUNT],
    instruments: InstrumentBank,
    frame: Shared<ControlFrame>,
    published: Arc<Published>,
    recorder: WavRecorder,
    handle: Handle,
    // Dropped last, after everything it may have to reclaim
    collector: Collector,
}

impl Engine {
    /// Creates an engine and the renderer that plays it back.
    pub fn new(
        config: &EngineConfig,
        recording: &RecordingConfig,
        instruments: Vec<Instrument>,
    ) -> (Engine, Renderer) {
        let config = config.sanitized();
        let collector = Collector::new();
        let handle = collector.handle();

        let instruments = InstrumentBank::new(&handle, instruments);
        let frame = Shared::new(&handle, ControlFrame::silent(instruments.current().clone()));
        let published = Arc::new(Published {
            frame: SharedCell::new(frame.clone()),
            sequence: AtomicU64::new(0),
        });
        let (recorder, tap) = recorder(
            &handle,
            recording.capacity(config.sample_rate),
            config.sample_rate,
            recording.format,
        );

        let renderer = Renderer {
            published: published.clone(),
            frame: frame.clone(),
            seen: 0,
            sample_rate: config.sample_rate as f32,
            headroom: config.headroom,
            phases: [0.0; SLOT_COUNT],
            since_tick: 0,
            tap,
        };

        info!(
            "Engine ready: {} Hz output, {} Hz control, {:?} mode",
            config.sample_rate, config.control_rate, config.play_mode
        );

        let engine = Engine {
            octave: OctaveTracker::new(config.min_octave, config.max_octave),
            notes: NoteTable::new(config.play_mode),
            pipeline: FrequencyPipeline::new(config.control_rate),
            volume: VolumeControl::new(config.initial_volume, config.constant_volume),
            voices: [Voice::default(); SLOT_COUNT],
            instruments,
            frame,
            published,
            recorder,
            handle,
            collector,
            config,
        };
        (engine, renderer)
    }

    pub fn from_config(config: Config) -> (Engine, Renderer) {
        Self::new(&config.engine, &config.recording, config.instruments)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs one control tick and publishes the result to the renderer.
    pub fn tick(&mut self, input: &ControlInput) {
        let input = input.clone().exclusive_axes();

        self.octave.update(&input);
        if self.octave.changed() {
            debug!(
                "Octave {} (base {}, modifier {:+})",
                self.octave.current(),
                self.octave.base(),
                self.octave.modifier()
            );
        }

        self.notes.update(&input.keys, &self.octave);
        if let Some(slot) = self.notes.current_note() {
            if self.notes.state(slot) == NoteState::Pressed {
                debug!("Note {}", slot.pitch_name(self.octave.current()));
            }
        }

        if self.pipeline.update(&input, &mut self.notes, &self.octave) == DiveEvent::Expired {
            self.voices.iter_mut().for_each(Voice::reset);
        }

        self.volume
            .update(&input, self.notes.mode(), self.notes.is_any_pressed());

        let instrument = self.instruments.current().clone();
        let target = self.volume.target();
        for (slot, voice) in Slot::all().zip(self.voices.iter_mut()) {
            let event = voice.update_gain(slot, self.notes.state(slot), &instrument, target);
            if event == EnvelopeEvent::Finished {
                self.notes.kill(slot);
            }
        }

        self.pipeline.compute(&self.notes, &self.octave);

        let control_rate = self.config.control_rate as f32;
        for (slot, voice) in Slot::all().zip(self.voices.iter_mut()) {
            voice.update_playback(
                slot,
                self.notes.state(slot),
                &instrument,
                self.pipeline.frequency(slot),
                control_rate,
            );
        }

        self.publish(instrument);
        self.drain_recording();
        self.collector.collect();
    }

    fn publish(&mut self, instrument: Shared<Instrument>) {
        let mut gains = [0.0; SLOT_COUNT];
        let mut playback = [SamplePlayback::default(); SLOT_COUNT];
        for (voice, gain, playback) in izip!(&self.voices, &mut gains, &mut playback) {
            *gain = voice.gain();
            *playback = voice.playback;
        }

        let sequence = self.frame.sequence + 1;
        self.frame = Shared::new(
            &self.handle,
            ControlFrame {
                sequence,
                states: *self.notes.states(),
                frequencies: *self.pipeline.frequencies(),
                gains,
                playback,
                instrument,
            },
        );
        self.published.frame.set(self.frame.clone());
        self.published.sequence.store(sequence, Ordering::Release);
    }

    fn drain_recording(&mut self) {
        if let Err(err) = self.recorder.drain() {
            warn!("Recording to {:?} failed, stopping: {}", self.recorder.path(), err);
            if let Err(err) = self.recorder.stop() {
                warn!("Failed to finish recording: {}", err);
            }
        }
    }

    fn silence(&mut self) {
        self.notes.kill_all();
        self.voices.iter_mut().for_each(Voice::reset);
        let instrument = self.instruments.current().clone();
        self.publish(instrument);
    }

    pub fn play_mode(&self) -> PlayMode {
        self.notes.mode()
    }

    /// Switches play mode, silencing every note and resetting the pitch modifiers.
    pub fn set_play_mode(&mut self, mode: PlayMode) {
        if mode == self.notes.mode() {
            return;
        }
        self.notes.set_mode(mode);
        self.pipeline.reset();
        self.silence();
        info!("Play mode: {:?}", mode);
    }

    pub fn toggle_play_mode(&mut self) {
        self.set_play_mode(self.notes.mode().toggled());
    }

    /// Immediately silences every slot.
    pub fn kill_all(&mut self) {
        self.silence();
    }

    pub fn instrument(&self) -> &Instrument {
        self.instruments.current()
    }

    pub fn select_previous_instrument(&mut self) {
        self.select_instrument(InstrumentBank::select_previous);
    }

    pub fn select_next_instrument(&mut self) {
        self.select_instrument(InstrumentBank::select_next);
    }

    fn select_instrument(&mut self, select: impl FnOnce(&mut InstrumentBank)) {
        let before = self.instruments.index();
        select(&mut self.instruments);
        if self.instruments.index() != before {
            self.silence();
            info!(
                "Instrument {}/{}: {}",
                self.instruments.index() + 1,
                self.instruments.count(),
                self.instruments.current().name
            );
        }
    }

    pub fn start_recording(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.recorder.start(path)
    }

    /// Stops recording, returning the path of the finished file.
    pub fn stop_recording(&mut self) -> Result<Option<PathBuf>> {
        self.recorder.stop()
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_recording()
    }

    /// The most recently published control frame.
    pub fn frame(&self) -> &ControlFrame {
        &self.frame
    }

    pub fn current_note(&self) -> Option<Slot> {
        self.notes.current_note()
    }

    pub fn previous_note(&self) -> Option<Slot> {
        self.notes.previous_note()
    }

    pub fn is_legato(&self) -> bool {
        self.notes.is_legato()
    }

    pub fn octave(&self) -> i32 {
        self.octave.current()
    }

    pub fn target_volume(&self) -> f32 {
        self.volume.target()
    }
}

/// The audio side of the synth. Renders the latest published control frame.
pub struct Renderer {
    published: Arc<Published>,
    frame: Shared<ControlFrame>,
    seen: u64,
    sample_rate: f32,
    headroom: f32,
    phases: [f32; SLOT_COUNT],
    /// Output samples rendered since the current frame was published.
    since_tick: u32,
    tap: RecorderTap,
}

impl Renderer {
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate as u32
    }

    pub fn phase(&self, slot: Slot) -> f32 {
        self.phases[slot.index()]
    }

    fn refresh(&mut self) {
        if self.published.sequence.load(Ordering::Acquire) != self.seen {
            self.frame = self.published.frame.get();
            self.seen = self.frame.sequence;
            self.since_tick = 0;
        }
    }

    /// Renders one mono sample between -1 and 1.
    pub fn next_sample(&mut self) -> f32 {
        self.refresh();

        let frame = &self.frame;
        let instrument = &*frame.instrument;
        let since_tick = self.since_tick as f32;
        let mut mix = 0.0;

        for (slot, state, freq, gain, playback, phase) in izip!(
            Slot::all(),
            &frame.states,
            &frame.frequencies,
            &frame.gains,
            &frame.playback,
            &mut self.phases
        ) {
            if state.is_idle() || *gain <= 0.0 {
                continue;
            }

            let value = if instrument.waveform.is_sampled() {
                match instrument.sample_for(slot) {
                    Some(sample) if playback.playing => match &sample.data {
                        Some(data) => {
                            let step = playback.pitch_ratio * data.sample_rate() as f32 / self.sample_rate;
                            data.frame(playback.frame_counter + since_tick * step) * sample.volume_modifier
                        }
                        None => 0.0,
                    },
                    _ => 0.0,
                }
            } else {
                *phase = wrap_phase(*phase + freq / self.sample_rate);
                instrument.waveform.value(*phase)
            };

            mix += value * gain * self.headroom;
        }

        self.since_tick = self.since_tick.saturating_add(1);
        mix.clamp(-1.0, 1.0)
    }

    /// Renders signed 16-bit mono audio.
    pub fn render(&mut self, out: &mut [i16]) {
        self.render_interleaved(out, 1);
    }

    /// Renders into an interleaved buffer, writing the same signal to every channel.
    pub fn render_interleaved<T>(&mut self, out: &mut [T], channels: usize)
    where
        T: Sample + FromSample<f32>,
    {
        let channels = channels.max(1);
        let mut tee = [0.0; TEE_CHUNK];
        for chunk in out.chunks_mut(channels * TEE_CHUNK) {
            let mut len = 0;
            for (frame, teed) in chunk.chunks_mut(channels).zip(tee.iter_mut()) {
                let value = self.next_sample();
                frame.fill(T::from_sample(value));
                *teed = value;
                len += 1;
            }
            self.tap.push(&tee[..len]);
        }
    }
}
