use self::{
    envelope::{AdsrEnvelope, EnvelopeEvent},
    sampler::SamplePlayback,
};
use crate::{
    instrument::Instrument,
    note::{NoteState, Slot},
};

pub mod envelope;
pub mod oscillator;
pub mod sampler;

/// The control-rate state of the sound playing on one slot.
#[derive(Clone, Copy, Debug, Default)]
pub struct Voice {
    pub envelope: AdsrEnvelope,
    pub playback: SamplePlayback,
}

impl Voice {
    /// Advances the envelope by one tick using the slot's envelope parameters.
    pub fn update_gain(&mut self, slot: Slot, state: NoteState, instrument: &Instrument, target: f32) -> EnvelopeEvent {
        let params = instrument.adsr_for(slot);
        self.envelope.process(state, &params, target)
    }

    pub fn gain(&self) -> f32 {
        self.envelope.amp()
    }

    /// Advances sample playback by one tick at the slot's effective frequency.
    pub fn update_playback(&mut self, slot: Slot, state: NoteState, instrument: &Instrument, frequency: f32, control_rate: f32) {
        match instrument.sample_for(slot) {
            Some(sample) => {
                let ratio = sample.pitch_modifier * frequency / instrument.sample_anchor(slot);
                self.playback.update(state, sample, ratio, control_rate);
            }
            None => self.playback = SamplePlayback::default(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
