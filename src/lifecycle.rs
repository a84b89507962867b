use crate::{
    note::{NoteState, PlayMode, Slot, SLOT_COUNT},
    octave::OctaveTracker,
};

/// Turns the raw per-slot "key down" table into per-slot lifecycle states.
#[derive(Clone, Debug)]
pub struct NoteTable {
    mode: PlayMode,
    keys: [bool; SLOT_COUNT],
    prev_keys: [bool; SLOT_COUNT],
    states: [NoteState; SLOT_COUNT],
    /// (Solo) The note that was sounding before the current one.
    prev_note: Option<Slot>,
    /// (Solo) The state of the sounding note at the start of the last update.
    prev_note_state: NoteState,
    /// The effective octave of each slot when it was released, so that a release tail
    /// doesn't shift pitch when the octave changes.
    release_octaves: [i32; SLOT_COUNT],
}

impl NoteTable {
    pub fn new(mode: PlayMode) -> Self {
        Self {
            mode,
            keys: [false; SLOT_COUNT],
            prev_keys: [false; SLOT_COUNT],
            states: [NoteState::Idle; SLOT_COUNT],
            prev_note: None,
            prev_note_state: NoteState::Idle,
            release_octaves: [0; SLOT_COUNT],
        }
    }

    pub fn mode(&self) -> PlayMode {
        self.mode
    }

    /// Switches play mode, silencing every slot.
    pub fn set_mode(&mut self, mode: PlayMode) {
        if mode != self.mode {
            self.kill_all();
            self.prev_note = None;
            self.prev_note_state = NoteState::Idle;
            self.mode = mode;
        }
    }

    pub fn states(&self) -> &[NoteState; SLOT_COUNT] {
        &self.states
    }

    pub fn state(&self, slot: Slot) -> NoteState {
        self.states[slot.index()]
    }

    /// The octave a slot should sound in: its release snapshot while releasing,
    /// otherwise the current octave.
    pub fn octave_of(&self, slot: Slot, current: i32) -> i32 {
        match self.states[slot.index()] {
            NoteState::Released | NoteState::StillReleased => self.release_octaves[slot.index()],
            _ => current,
        }
    }

    /// The first slot that is pressed or held. In chord mode this is the lowest down note.
    pub fn current_note(&self) -> Option<Slot> {
        self.states
            .iter()
            .position(NoteState::is_sounding)
            .map(Slot::new)
    }

    pub fn current_note_state(&self) -> NoteState {
        self.current_note()
            .map(|slot| self.state(slot))
            .unwrap_or(NoteState::Idle)
    }

    pub fn previous_note(&self) -> Option<Slot> {
        self.prev_note
    }

    /// (Solo) A new note was pressed while the previous one was still held.
    pub fn is_legato(&self) -> bool {
        self.mode == PlayMode::Solo
            && self.prev_note_state == NoteState::Held
            && self.current_note_state() == NoteState::Pressed
    }

    pub fn is_any_playing(&self) -> bool {
        self.states.iter().any(NoteState::is_sounding)
    }

    pub fn is_any_pressed(&self) -> bool {
        self.states.iter().any(|s| *s == NoteState::Pressed)
    }

    /// (Solo) Turns a freshly pressed current note into a held one, which makes its
    /// envelope skip the attack.
    pub fn no_attack(&mut self) {
        if let Some(slot) = self.current_note() {
            if self.states[slot.index()] == NoteState::Pressed {
                self.states[slot.index()] = NoteState::Held;
            }
        }
    }

    pub fn kill(&mut self, slot: Slot) {
        self.states[slot.index()] = NoteState::Idle;
    }

    pub fn kill_all(&mut self) {
        self.states.fill(NoteState::Idle);
    }

    /// Advances every slot by one control tick.
    pub fn update(&mut self, keys: &[bool; SLOT_COUNT], octave: &OctaveTracker) {
        self.prev_keys = self.keys;
        self.keys = *keys;

        match self.mode {
            PlayMode::Solo => self.update_solo(octave),
            PlayMode::Chord => self.update_chord(octave),
        }
    }

    fn release(&mut self, idx: usize, octave: i32) {
        if !self.states[idx].is_idle() {
            self.states[idx] = NoteState::Released;
            self.release_octaves[idx] = octave;
        }
    }

    fn update_solo(&mut self, octave: &OctaveTracker) {
        if let Some(note) = self.current_note() {
            self.prev_note = Some(note);
        }
        self.prev_note_state = self.current_note_state();

        let mut pressed = None;
        let mut held = None;
        let mut any_released = false;

        for idx in 0..SLOT_COUNT {
            match (self.prev_keys[idx], self.keys[idx]) {
                (true, true) => held = Some(Slot::new(idx)),
                (false, true) => {
                    // A newly pressed note is automatically the current note
                    pressed = Some(Slot::new(idx));
                    break;
                }
                (true, false) => {
                    any_released = true;
                    self.release(idx, octave.previous());
                }
                (false, false) => {
                    if !self.states[idx].is_idle() {
                        self.states[idx] = NoteState::StillReleased;
                    }
                }
            }
        }

        // An octave change while a note is held re-triggers the one sounding
        if pressed.is_none() && octave.changed() && self.is_any_playing() {
            pressed = self
                .current_note()
                .filter(|slot| self.keys[slot.index()])
                .or(held);
            held = None;
        }

        if let Some(slot) = pressed {
            self.kill_all();
            self.states[slot.index()] = NoteState::Pressed;
        } else if let Some(slot) = held {
            let current = self.current_note();
            self.kill_all();
            if any_released {
                // The remaining held note takes over, without a new attack if it is
                // already the one sounding
                self.states[slot.index()] = if current == Some(slot) {
                    NoteState::Held
                } else {
                    NoteState::Pressed
                };
            } else if let Some(current) = current {
                self.states[current.index()] = NoteState::Held;
            }
        }
    }

    fn update_chord(&mut self, octave: &OctaveTracker) {
        let retrigger = octave.changed();
        for idx in 0..SLOT_COUNT {
            let state = self.states[idx];
            if state == NoteState::Released {
                self.states[idx] = NoteState::StillReleased;
                continue;
            }
            match (self.prev_keys[idx], self.keys[idx]) {
                (true, true) => match state {
                    // Killed notes stay silent until their key is pressed again
                    NoteState::Idle => {}
                    // Struck again during the release edge; that press was swallowed
                    NoteState::StillReleased => self.states[idx] = NoteState::Pressed,
                    _ if retrigger => self.states[idx] = NoteState::Pressed,
                    _ => self.states[idx] = NoteState::Held,
                },
                (false, true) => self.states[idx] = NoteState::Pressed,
                (true, false) => self.release(idx, octave.previous()),
                (false, false) => {}
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::input::ControlInput;

    fn keys(slots: &[usize]) -> [bool; SLOT_COUNT] {
        ControlInput::with_keys(slots).keys
    }

    fn sounding(table: &NoteTable) -> Vec<usize> {
        Slot::all()
            .filter(|s| table.state(*s).is_sounding())
            .map(|s| s.index())
            .collect()
    }

    fn non_idle(table: &NoteTable) -> usize {
        table.states().iter().filter(|s| !s.is_idle()).count()
    }

    #[test]
    fn test_solo_press_hold_release() {
        let octave = OctaveTracker::default();
        let mut table = NoteTable::new(PlayMode::Solo);

        table.update(&keys(&[4]), &octave);
        assert_eq!(table.state(Slot::new(4)), NoteState::Pressed);
        table.update(&keys(&[4]), &octave);
        assert_eq!(table.state(Slot::new(4)), NoteState::Held);
        table.update(&keys(&[]), &octave);
        assert_eq!(table.state(Slot::new(4)), NoteState::Released);
        table.update(&keys(&[]), &octave);
        assert_eq!(table.state(Slot::new(4)), NoteState::StillReleased);
        assert_eq!(non_idle(&table), 1);
    }

    #[test]
    fn test_solo_steals_voice() {
        let octave = OctaveTracker::default();
        let mut table = NoteTable::new(PlayMode::Solo);

        table.update(&keys(&[3]), &octave);
        table.update(&keys(&[3]), &octave);
        table.update(&keys(&[3, 7]), &octave);
        assert_eq!(sounding(&table), vec![7]);
        assert_eq!(table.state(Slot::new(7)), NoteState::Pressed);
        assert!(table.is_legato());
        assert_eq!(non_idle(&table), 1);

        table.update(&keys(&[3, 7]), &octave);
        assert_eq!(sounding(&table), vec![7]);
        assert_eq!(table.state(Slot::new(7)), NoteState::Held);
        assert!(!table.is_legato());
        assert_eq!(table.previous_note(), Some(Slot::new(7)));
    }

    #[test]
    fn test_solo_first_new_press_wins() {
        let octave = OctaveTracker::default();
        let mut table = NoteTable::new(PlayMode::Solo);
        table.update(&keys(&[9, 2]), &octave);
        assert_eq!(sounding(&table), vec![2]);
        assert!(!table.is_legato());
    }

    #[test]
    fn test_solo_release_falls_back_to_held_note() {
        let octave = OctaveTracker::default();
        let mut table = NoteTable::new(PlayMode::Solo);
        table.update(&keys(&[1]), &octave);
        table.update(&keys(&[1, 8]), &octave);
        table.update(&keys(&[1, 8]), &octave);

        // Releasing the sounding note re-attacks the one still held
        table.update(&keys(&[1]), &octave);
        assert_eq!(sounding(&table), vec![1]);
        assert_eq!(table.state(Slot::new(1)), NoteState::Pressed);
    }

    #[test]
    fn test_solo_release_of_other_note_keeps_current_held() {
        let octave = OctaveTracker::default();
        let mut table = NoteTable::new(PlayMode::Solo);
        table.update(&keys(&[1]), &octave);
        table.update(&keys(&[1, 8]), &octave);
        table.update(&keys(&[1, 8]), &octave);

        table.update(&keys(&[8]), &octave);
        assert_eq!(sounding(&table), vec![8]);
        assert_eq!(table.state(Slot::new(8)), NoteState::Held);
    }

    #[test]
    fn test_solo_octave_change_retriggers() {
        let mut octave = OctaveTracker::default();
        let mut table = NoteTable::new(PlayMode::Solo);
        octave.update(&ControlInput::default());
        table.update(&keys(&[5]), &octave);
        octave.update(&ControlInput::default());
        table.update(&keys(&[5]), &octave);
        assert_eq!(table.state(Slot::new(5)), NoteState::Held);

        octave.update(&ControlInput {
            octave_up: true,
            ..Default::default()
        });
        table.update(&keys(&[5]), &octave);
        assert_eq!(table.state(Slot::new(5)), NoteState::Pressed);
    }

    #[test]
    fn test_solo_octave_change_keeps_sounding_note() {
        let mut octave = OctaveTracker::default();
        let mut table = NoteTable::new(PlayMode::Solo);
        octave.update(&ControlInput::default());
        table.update(&keys(&[8]), &octave);
        octave.update(&ControlInput::default());
        table.update(&keys(&[8]), &octave);
        octave.update(&ControlInput::default());
        table.update(&keys(&[3, 8]), &octave);
        octave.update(&ControlInput::default());
        table.update(&keys(&[3, 8]), &octave);
        assert_eq!(table.current_note(), Some(Slot::new(3)));

        octave.update(&ControlInput {
            octave_up: true,
            ..Default::default()
        });
        table.update(&keys(&[3, 8]), &octave);
        assert_eq!(table.current_note(), Some(Slot::new(3)));
        assert_eq!(table.state(Slot::new(3)), NoteState::Pressed);
        assert_eq!(sounding(&table), vec![3]);
    }

    #[test]
    fn test_release_octave_snapshot() {
        let mut octave = OctaveTracker::default();
        let mut table = NoteTable::new(PlayMode::Solo);
        octave.update(&ControlInput::default());
        table.update(&keys(&[5]), &octave);
        table.update(&keys(&[5]), &octave);
        octave.update(&ControlInput::default());
        table.update(&keys(&[]), &octave);
        octave.update(&ControlInput {
            octave_up: true,
            ..Default::default()
        });
        table.update(&keys(&[]), &octave);
        assert_eq!(table.octave_of(Slot::new(5), octave.current()), 0);
        assert_eq!(table.octave_of(Slot::new(6), octave.current()), 1);
    }

    #[test]
    fn test_no_attack() {
        let octave = OctaveTracker::default();
        let mut table = NoteTable::new(PlayMode::Solo);
        table.update(&keys(&[5]), &octave);
        table.no_attack();
        assert_eq!(table.state(Slot::new(5)), NoteState::Held);
        assert!(!table.is_any_pressed());
    }

    #[test]
    fn test_chord_slots_are_independent() {
        let octave = OctaveTracker::default();
        let mut table = NoteTable::new(PlayMode::Chord);
        table.update(&keys(&[1, 5, 8]), &octave);
        assert_eq!(sounding(&table), vec![1, 5, 8]);
        table.update(&keys(&[1, 5, 8]), &octave);

        table.update(&keys(&[1, 8]), &octave);
        assert_eq!(table.state(Slot::new(1)), NoteState::Held);
        assert_eq!(table.state(Slot::new(5)), NoteState::Released);
        assert_eq!(table.state(Slot::new(8)), NoteState::Held);

        table.update(&keys(&[1, 8]), &octave);
        assert_eq!(table.state(Slot::new(5)), NoteState::StillReleased);
        assert_eq!(table.state(Slot::new(1)), NoteState::Held);
    }

    #[test]
    fn test_chord_released_lasts_one_tick() {
        let octave = OctaveTracker::default();
        let mut table = NoteTable::new(PlayMode::Chord);
        table.update(&keys(&[2]), &octave);
        table.update(&keys(&[]), &octave);
        assert_eq!(table.state(Slot::new(2)), NoteState::Released);
        // Even if the key goes down again straight away
        table.update(&keys(&[2]), &octave);
        assert_eq!(table.state(Slot::new(2)), NoteState::StillReleased);
    }

    #[test]
    fn test_chord_restrike_during_release_edge_sounds() {
        let octave = OctaveTracker::default();
        let mut table = NoteTable::new(PlayMode::Chord);
        table.update(&keys(&[2]), &octave);
        table.update(&keys(&[]), &octave);
        table.update(&keys(&[2]), &octave);
        assert_eq!(table.state(Slot::new(2)), NoteState::StillReleased);

        table.update(&keys(&[2]), &octave);
        assert_eq!(table.state(Slot::new(2)), NoteState::Pressed);
        table.update(&keys(&[2]), &octave);
        assert_eq!(table.state(Slot::new(2)), NoteState::Held);
    }

    #[test]
    fn test_killed_chord_note_stays_silent() {
        let octave = OctaveTracker::default();
        let mut table = NoteTable::new(PlayMode::Chord);
        table.update(&keys(&[2]), &octave);
        table.kill_all();
        table.update(&keys(&[2]), &octave);
        assert_eq!(table.state(Slot::new(2)), NoteState::Idle);
    }

    #[test]
    fn test_mode_switch_kills() {
        let octave = OctaveTracker::default();
        let mut table = NoteTable::new(PlayMode::Solo);
        table.update(&keys(&[2]), &octave);
        table.set_mode(PlayMode::Chord);
        assert_eq!(non_idle(&table), 0);
        assert_eq!(table.mode(), PlayMode::Chord);
    }
}
