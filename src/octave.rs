use crate::input::ControlInput;

pub const MIN_OCTAVE: i32 = -4;
pub const MAX_OCTAVE: i32 = 2;

/// Resolves the effective octave once per control tick.
///
/// The base octave moves in discrete steps and is clamped to `[min, max]`. A transient
/// modifier of -1 or +1 is applied only while one of the octave pointer buttons is held,
/// and only if it keeps the effective octave within bounds.
#[derive(Clone, Debug)]
pub struct OctaveTracker {
    min: i32,
    max: i32,
    base: i32,
    modifier: i32,
    prev_base: i32,
    prev_modifier: i32,
}

impl OctaveTracker {
    pub fn new(min: i32, max: i32) -> Self {
        let (min, max) = (min.min(max), max.max(min));
        let base = 0.clamp(min, max);
        Self {
            min,
            max,
            base,
            modifier: 0,
            prev_base: base,
            prev_modifier: 0,
        }
    }

    pub fn update(&mut self, input: &ControlInput) {
        self.prev_base = self.base;
        self.prev_modifier = self.modifier;

        if input.octave_down {
            self.base = (self.base - 1).clamp(self.min, self.max);
        }
        if input.octave_up {
            self.base = (self.base + 1).clamp(self.min, self.max);
        }

        self.modifier = if input.lower_octave_held {
            if self.base > self.min { -1 } else { 0 }
        } else if input.raise_octave_held {
            if self.base < self.max { 1 } else { 0 }
        } else {
            0
        };
    }

    pub fn base(&self) -> i32 {
        self.base
    }

    pub fn modifier(&self) -> i32 {
        self.modifier
    }

    /// The effective octave for this tick.
    pub fn current(&self) -> i32 {
        self.base + self.modifier
    }

    /// The effective octave of the previous tick.
    pub fn previous(&self) -> i32 {
        self.prev_base + self.prev_modifier
    }

    pub fn changed(&self) -> bool {
        self.current() != self.previous()
    }
}

impl Default for OctaveTracker {
    fn default() -> Self {
        Self::new(MIN_OCTAVE, MAX_OCTAVE)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn tick(tracker: &mut OctaveTracker, f: impl FnOnce(&mut ControlInput)) {
        let mut input = ControlInput::default();
        f(&mut input);
        tracker.update(&input);
    }

    #[test]
    fn test_base_is_clamped() {
        let mut tracker = OctaveTracker::default();
        for _ in 0..10 {
            tick(&mut tracker, |i| i.octave_up = true);
        }
        assert_eq!(tracker.current(), MAX_OCTAVE);
        for _ in 0..10 {
            tick(&mut tracker, |i| i.octave_down = true);
        }
        assert_eq!(tracker.current(), MIN_OCTAVE);
    }

    #[test]
    fn test_modifier_only_while_held() {
        let mut tracker = OctaveTracker::default();
        tick(&mut tracker, |i| i.raise_octave_held = true);
        assert_eq!(tracker.current(), 1);
        assert_eq!((tracker.base(), tracker.modifier()), (0, 1));
        assert_eq!(tracker.previous(), 0);
        assert!(tracker.changed());
        tick(&mut tracker, |i| i.raise_octave_held = true);
        assert!(!tracker.changed());
        tick(&mut tracker, |_| {});
        assert_eq!(tracker.current(), 0);
        assert!(tracker.changed());
    }

    #[test]
    fn test_modifier_cannot_exceed_bounds() {
        let mut tracker = OctaveTracker::default();
        for _ in 0..5 {
            tick(&mut tracker, |i| i.octave_up = true);
        }
        tick(&mut tracker, |i| i.raise_octave_held = true);
        assert_eq!(tracker.current(), MAX_OCTAVE);
        tick(&mut tracker, |i| i.lower_octave_held = true);
        assert_eq!(tracker.current(), MAX_OCTAVE - 1);
    }
}
