/// Pitch ratio applied per tick while diving.
const DIVE_RATIO: f32 = 0.95;

/// A quick downward pitch dive, ending with every note cut if it runs its course.
#[derive(Clone, Debug)]
pub struct Dive {
    modifier: f32,
    /// Ticks since the dive started, 0 when inactive.
    ticks: u32,
    max_ticks: u32,
    key_down: bool,
}

/// What the dive asks of the note lifecycle after a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiveEvent {
    None,
    /// The dive ran its full course; every note should be cut.
    Expired,
}

impl Dive {
    /// Creates a dive lasting half a second at the given control rate.
    pub fn new(control_rate: u32) -> Self {
        Self {
            modifier: 1.0,
            ticks: 0,
            max_ticks: (control_rate / 2).max(1),
            key_down: false,
        }
    }

    pub fn modifier(&self) -> f32 {
        self.modifier
    }

    pub fn is_active(&self) -> bool {
        self.ticks > 0
    }

    pub fn reset(&mut self) {
        self.modifier = 1.0;
        self.ticks = 0;
    }

    pub fn update(&mut self, key: bool, any_pressed: bool) -> DiveEvent {
        if key && !self.key_down {
            self.ticks = 1;
        }
        self.key_down = key;

        if self.ticks == 0 {
            return DiveEvent::None;
        }

        self.ticks += 1;
        if self.ticks <= self.max_ticks {
            if any_pressed {
                self.reset();
            } else {
                self.modifier *= DIVE_RATIO;
            }
            DiveEvent::None
        } else {
            self.reset();
            DiveEvent::Expired
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_dive_expires() {
        let mut dive = Dive::new(60);
        assert_eq!(dive.update(true, false), DiveEvent::None);
        assert!((dive.modifier() - DIVE_RATIO).abs() < 1e-6);
        let mut ticks = 1;
        while dive.update(false, false) == DiveEvent::None {
            ticks += 1;
            assert!(dive.modifier() < 1.0);
            assert!(ticks < 100);
        }
        assert_eq!(ticks, 29);
        assert_eq!(dive.modifier(), 1.0);
        assert!(!dive.is_active());
    }

    #[test]
    fn test_new_note_aborts_dive() {
        let mut dive = Dive::new(60);
        dive.update(true, false);
        dive.update(true, false);
        assert_eq!(dive.update(true, true), DiveEvent::None);
        assert_eq!(dive.modifier(), 1.0);
        assert!(!dive.is_active());
    }

    #[test]
    fn test_holding_key_does_not_restart() {
        let mut dive = Dive::new(60);
        let mut expired = false;
        for _ in 0..40 {
            expired |= dive.update(true, false) == DiveEvent::Expired;
        }
        assert!(expired);
        assert_eq!(dive.modifier(), 1.0);
    }
}
