use crate::note::{Slot, SLOT_COUNT};

/// Everything the performer did during one control tick.
#[derive(Clone, Debug, PartialEq)]
pub struct ControlInput {
    /// Whether any key bound to each slot is down.
    pub keys: [bool; SLOT_COUNT],
    /// Horizontal pointer displacement (controls volume).
    pub pointer_dx: f32,
    /// Vertical pointer displacement (controls gliss).
    pub pointer_dy: f32,
    /// Scroll wheel displacement (controls pitch bend).
    pub scroll: f32,
    /// Octave up requested this tick.
    pub octave_up: bool,
    /// Octave down requested this tick.
    pub octave_down: bool,
    /// Pointer button that lowers the octave while held.
    pub lower_octave_held: bool,
    /// Pointer button that raises the octave while held.
    pub raise_octave_held: bool,
    /// The vibrato trigger key is down.
    pub vibrato_key: bool,
    /// The dive trigger key is down.
    pub dive_key: bool,
    /// Volume preset 1..=10, selecting a target volume of 0.1..=1.0.
    pub volume_preset: Option<u8>,
}

impl Default for ControlInput {
    fn default() -> Self {
        Self {
            keys: [false; SLOT_COUNT],
            pointer_dx: 0.0,
            pointer_dy: 0.0,
            scroll: 0.0,
            octave_up: false,
            octave_down: false,
            lower_octave_held: false,
            raise_octave_held: false,
            vibrato_key: false,
            dive_key: false,
            volume_preset: None,
        }
    }
}

impl ControlInput {
    /// Creates an input with the given slots held down.
    pub fn with_keys(slots: &[usize]) -> Self {
        let mut input = Self::default();
        for &slot in slots {
            input.keys[Slot::new(slot).index()] = true;
        }
        input
    }

    /// Keeps only the larger of the two pointer axes, so that changing volume doesn't
    /// accidentally gliss and vice versa.
    pub fn exclusive_axes(mut self) -> Self {
        if self.pointer_dx.abs() >= self.pointer_dy.abs() {
            self.pointer_dy = 0.0;
        } else {
            self.pointer_dx = 0.0;
        }
        self
    }
}
