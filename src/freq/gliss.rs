/// Divisor applied per unit of vertical pointer motion.
const GLISS_FACTOR: f32 = 1.0002;

const MIN_GLISS: f32 = 0.5;
const MAX_GLISS: f32 = 2.0;

/// Continuous pitch glide driven by vertical pointer motion.
#[derive(Clone, Debug)]
pub struct Gliss {
    modifier: f32,
    /// Pointer motion of the last tick the gliss was live, used to detect a gliding
    /// gesture at the moment a new note is pressed.
    last_motion: f32,
}

impl Default for Gliss {
    fn default() -> Self {
        Self {
            modifier: 1.0,
            last_motion: 0.0,
        }
    }
}

impl Gliss {
    pub fn modifier(&self) -> f32 {
        self.modifier
    }

    pub fn last_motion(&self) -> f32 {
        self.last_motion
    }

    /// Returns the modifier to neutral without forgetting the last motion.
    pub fn neutralize(&mut self) {
        self.modifier = 1.0;
    }

    pub fn forget_motion(&mut self) {
        self.last_motion = 0.0;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// `suspended` is set while a new note is pressed or an autogliss is in progress.
    pub fn update(&mut self, motion: f32, suspended: bool) {
        if suspended {
            self.modifier = 1.0;
            return;
        }

        self.last_motion = motion;
        if motion != 0.0 {
            self.modifier /= GLISS_FACTOR.powf(motion);
        }
        self.modifier = self.modifier.clamp(MIN_GLISS, MAX_GLISS);
    }
}
