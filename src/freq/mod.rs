//! Per-slot effective frequencies: base pitch times the performer's pitch modifiers.

pub mod autogliss;
pub mod bend;
pub mod dive;
pub mod gliss;
pub mod vibrato;

use self::{
    autogliss::Glide,
    bend::PitchBend,
    dive::{Dive, DiveEvent},
    gliss::Gliss,
    vibrato::Vibrato,
};
use crate::{
    input::ControlInput,
    lifecycle::NoteTable,
    note::{NoteState, PlayMode, Slot, SLOT_COUNT},
    octave::OctaveTracker,
};
use tracing::{debug, info};

/// The continuous pitch modifiers, shared by every sounding slot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Modifiers {
    pub bend: f32,
    pub gliss: f32,
    pub vibrato: f32,
    pub dive: f32,
}

impl Modifiers {
    pub fn product(&self) -> f32 {
        self.bend * self.gliss * self.vibrato * self.dive
    }
}

/// Computes each slot's effective frequency once per control tick.
#[derive(Clone, Debug)]
pub struct FrequencyPipeline {
    bend: PitchBend,
    gliss: Gliss,
    vibrato: Vibrato,
    dive: Dive,
    glide: Option<Glide>,
    /// The gliding slot and its frequency for this tick.
    glide_override: Option<(Slot, f32)>,
    /// A slot released mid-glide, and the pitch it keeps for its release tail.
    release_hold: Option<(Slot, f32)>,
    frequencies: [f32; SLOT_COUNT],
}

impl FrequencyPipeline {
    pub fn new(control_rate: u32) -> Self {
        Self {
            bend: PitchBend::default(),
            gliss: Gliss::default(),
            vibrato: Vibrato::default(),
            dive: Dive::new(control_rate),
            glide: None,
            glide_override: None,
            release_hold: None,
            frequencies: std::array::from_fn(|i| Slot::new(i).frequency(0)),
        }
    }

    pub fn frequencies(&self) -> &[f32; SLOT_COUNT] {
        &self.frequencies
    }

    pub fn frequency(&self, slot: Slot) -> f32 {
        self.frequencies[slot.index()]
    }

    pub fn modifiers(&self) -> Modifiers {
        Modifiers {
            bend: self.bend.modifier(),
            gliss: self.gliss.modifier(),
            vibrato: self.vibrato.modifier(),
            dive: self.dive.modifier(),
        }
    }

    /// Whether an autogliss is steering a slot this tick.
    pub fn is_gliding(&self) -> bool {
        self.glide_override.is_some()
    }

    /// Returns every modifier to neutral and drops any glide in progress.
    pub fn reset(&mut self) {
        self.bend.reset();
        self.gliss.reset();
        self.vibrato.reset();
        self.dive.reset();
        self.glide = None;
        self.glide_override = None;
        self.release_hold = None;
    }

    /// Updates the modifiers for one tick, in order: bend, autogliss, gliss, dive, vibrato.
    ///
    /// An autogliss turns the new note's press into a hold, and an expired dive cuts
    /// every note, so the note table is updated in place.
    pub fn update(&mut self, input: &ControlInput, notes: &mut NoteTable, octave: &OctaveTracker) -> DiveEvent {
        self.bend.update(input.scroll, notes.is_any_pressed());

        self.update_autogliss(notes, octave);

        self.gliss.update(
            input.pointer_dy,
            notes.is_any_pressed() || self.glide_override.is_some(),
        );

        let event = self.dive.update(input.dive_key, notes.is_any_pressed());
        if event == DiveEvent::Expired {
            info!("Dive ran its course, cutting all notes");
            notes.kill_all();
        }

        self.vibrato.update(input.vibrato_key, notes.is_any_pressed());
        event
    }

    fn update_autogliss(&mut self, notes: &mut NoteTable, octave: &OctaveTracker) {
        self.glide_override = None;
        if let Some((slot, _)) = self.release_hold {
            if !notes.state(slot).is_releasing() {
                self.release_hold = None;
            }
        }

        if notes.mode() != PlayMode::Solo {
            self.glide = None;
            return;
        }

        let motion = self.gliss.last_motion();
        if notes.is_legato() && motion != 0.0 {
            if let Some(slot) = notes.current_note() {
                let end = slot.frequency(octave.current());
                let start = notes
                    .previous_note()
                    .map(|prev| self.frequencies[prev.index()])
                    .filter(|freq| *freq > 0.0 && freq.is_finite())
                    .unwrap_or(end);
                notes.no_attack();
                self.gliss.neutralize();
                let glide = Glide::new(slot, start, end, motion);
                debug!(
                    "Autogliss to {} from {:.1} Hz to {:.1} Hz over {} ticks",
                    slot,
                    start,
                    end,
                    glide.total()
                );
                self.glide = Some(glide);
            }
        }

        let Some(mut glide) = self.glide.take() else {
            return;
        };
        let slot = glide.slot();
        match notes.state(slot) {
            NoteState::Held if notes.current_note() == Some(slot) => {
                let freq = glide.advance();
                self.glide_override = Some((slot, freq));
                if !glide.is_done() {
                    self.glide = Some(glide);
                    return;
                }
            }
            // Releasing mid-glide freezes the pitch where the glide got to
            NoteState::Released | NoteState::StillReleased => {
                self.release_hold = Some((slot, glide.frequency()));
            }
            _ => {}
        }
        // Pointer motion from before the glide must not start another one
        self.gliss.forget_motion();
    }

    /// Recomputes every slot's effective frequency from the current modifiers.
    pub fn compute(&mut self, notes: &NoteTable, octave: &OctaveTracker) {
        let modifier = self.modifiers().product();
        for slot in Slot::all() {
            let base = slot.frequency(notes.octave_of(slot, octave.current()));
            let mut freq = base * modifier;
            if let Some((held, hold_freq)) = self.release_hold {
                if held == slot && notes.state(slot).is_releasing() {
                    freq = hold_freq;
                }
            }
            if let Some((gliding, glide_freq)) = self.glide_override {
                if gliding == slot {
                    freq = glide_freq;
                }
            }
            self.frequencies[slot.index()] = freq;
        }
    }
}
