use crate::util::SEMITONE;

/// Multiplier applied per unit of scroll; three steps make roughly one semitone.
pub const BEND_STEP: f32 = 1.0194;

/// Idle ticks after which the bend snaps to the nearest semitone.
const SNAP_AFTER_IDLE_TICKS: u32 = 5;

/// Pitch bend driven by the scroll wheel.
#[derive(Clone, Debug)]
pub struct PitchBend {
    modifier: f32,
    idle_ticks: u32,
}

impl Default for PitchBend {
    fn default() -> Self {
        Self {
            modifier: 1.0,
            idle_ticks: 0,
        }
    }
}

impl PitchBend {
    pub fn modifier(&self) -> f32 {
        self.modifier
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn update(&mut self, scroll: f32, any_pressed: bool) {
        // A new note starts unbent
        if any_pressed {
            self.reset();
        }

        if scroll == 0.0 {
            self.idle_ticks += 1;
        } else {
            self.idle_ticks = 0;
            self.modifier *= BEND_STEP.powf(scroll);
        }

        if self.idle_ticks >= SNAP_AFTER_IDLE_TICKS {
            self.idle_ticks = 0;
            self.modifier = snap_to_semitone(self.modifier);
        }
    }
}

/// Rounds a frequency ratio to the nearest whole number of semitones.
pub fn snap_to_semitone(ratio: f32) -> f32 {
    if !(ratio.is_finite() && ratio > 0.0) {
        return 1.0;
    }
    let semitones = (ratio.ln() / SEMITONE.ln()).round();
    SEMITONE.powi(semitones as i32)
}
