use crate::util::base_frequency;
use serde::{Deserialize, Serialize};

/// The number of playable note positions.
pub const SLOT_COUNT: usize = 33;

/// A fixed playable note position, bound to one input key.
/// Slot 0 is the B below the reference C, so slot `i` sounds `i - 1` semitones above it.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Slot(u8);

impl Slot {
    /// Creates a slot, clamping out-of-range indices to the last slot.
    pub fn new(index: usize) -> Self {
        Self(index.min(SLOT_COUNT - 1) as u8)
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }

    /// Semitone offset from the reference C.
    pub fn semitones(&self) -> i32 {
        self.0 as i32 - 1
    }

    /// The unmodified frequency of this slot in the given octave.
    pub fn frequency(&self, octave: i32) -> f32 {
        base_frequency(self.semitones(), octave)
    }

    pub fn all() -> impl Iterator<Item = Slot> {
        (0..SLOT_COUNT).map(Slot::new)
    }

    /// The pitch class name, e.g. `C#`.
    pub fn name(&self) -> &'static str {
        const NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];
        NAMES[self.semitones().rem_euclid(12) as usize]
    }

    /// The scientific pitch name in the given octave, e.g. `A4`.
    pub fn pitch_name(&self, octave: i32) -> String {
        let octave = octave + 4 + self.semitones().div_euclid(12);
        format!("{}{}", self.name(), octave)
    }
}

impl From<usize> for Slot {
    fn from(value: usize) -> Self {
        Self::new(value)
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::fmt::Debug for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Slot({}, {})", self.0, self.name())
    }
}

/// Lifecycle of a slot. `Pressed` and `Released` last exactly one control tick.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum NoteState {
    Pressed,
    Held,
    Released,
    /// The envelope is releasing and the note is still audible.
    StillReleased,
    /// Completely silent.
    #[default]
    Idle,
}

impl NoteState {
    /// Whether the key bound to the slot is considered down.
    pub fn is_sounding(&self) -> bool {
        matches!(self, NoteState::Pressed | NoteState::Held)
    }

    pub fn is_releasing(&self) -> bool {
        matches!(self, NoteState::Released | NoteState::StillReleased)
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, NoteState::Idle)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayMode {
    /// Monophonic with voice stealing, legato and autogliss.
    #[default]
    Solo,
    /// Every slot has an independent lifecycle.
    Chord,
}

impl PlayMode {
    pub fn toggled(self) -> Self {
        match self {
            PlayMode::Solo => PlayMode::Chord,
            PlayMode::Chord => PlayMode::Solo,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_slot_clamps() {
        assert_eq!(Slot::new(100).index(), SLOT_COUNT - 1);
        assert_eq!(Slot::new(5).index(), 5);
        assert_eq!(Slot::all().count(), SLOT_COUNT);
    }

    #[test]
    fn test_slot_names() {
        assert_eq!(Slot::new(0).name(), "B");
        assert_eq!(Slot::new(1).name(), "C");
        assert_eq!(Slot::new(2).name(), "C#");
        assert_eq!(Slot::new(1).pitch_name(0), "C4");
        assert_eq!(Slot::new(0).pitch_name(0), "B3");
        assert_eq!(Slot::new(13).pitch_name(-1), "C4");
    }

    #[test]
    fn test_slot_frequency() {
        assert_eq!(Slot::new(1).frequency(0), 261.6);
        assert!(Slot::new(0).frequency(0) < Slot::new(1).frequency(0));
    }
}
