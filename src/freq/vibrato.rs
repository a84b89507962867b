use crate::{util::wrap_phase, voice::oscillator::sine};

/// Growth of the depth per tick the trigger key is held.
const DEPTH_PER_TICK: f32 = 1.003;
const MAX_DEPTH: f32 = 1.04;

/// Ticks the trigger key may stay up before the vibrato fades out.
const FADE_AFTER_TICKS: u32 = 30;
/// Proportion of the remaining distance to 1 covered per tick while fading.
const FADE_RATE: f32 = 0.2;

/// Performer-driven vibrato.
///
/// The performer "plays" the vibrato by tapping a trigger key: the silence between taps
/// sets the speed and the length of each tap sets the depth.
#[derive(Clone, Debug)]
pub struct Vibrato {
    modifier: f32,
    depth: f32,
    /// Phase increment per tick.
    speed: f32,
    phase: f32,
    ticks_down: u32,
    ticks_up: u32,
    key_down: bool,
}

impl Default for Vibrato {
    fn default() -> Self {
        Self {
            modifier: 1.0,
            depth: 1.0,
            speed: 0.0,
            phase: 0.0,
            ticks_down: 0,
            ticks_up: 0,
            key_down: false,
        }
    }
}

impl Vibrato {
    pub fn modifier(&self) -> f32 {
        self.modifier
    }

    pub fn depth(&self) -> f32 {
        self.depth
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn update(&mut self, key: bool, any_pressed: bool) {
        // A new note starts without vibrato
        if any_pressed {
            self.depth = 1.0;
            self.modifier = 1.0;
            self.ticks_down = 0;
            self.ticks_up = 0;
            return;
        }

        let was_down = self.key_down;
        self.key_down = key;

        if key && !was_down {
            self.speed = 1.0 / (2 * self.ticks_up.max(1)) as f32;
            self.ticks_up = 0;
        }
        if was_down && !key {
            self.depth = DEPTH_PER_TICK
                .powi(self.ticks_down as i32)
                .clamp(1.0, MAX_DEPTH);
            self.ticks_down = 0;
        }

        if key {
            self.ticks_down += 1;
        } else {
            self.ticks_up += 1;
            if self.ticks_up > FADE_AFTER_TICKS {
                self.speed = 0.0;
                self.phase = 0.0;
                self.modifier += FADE_RATE * (1.0 - self.modifier);
                return;
            }
        }

        self.phase = wrap_phase(self.phase + self.speed);
        self.modifier = self.depth.powf(sine(self.phase));
    }
}
