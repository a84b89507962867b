use crate::note::Slot;

pub const MIN_GLIDE_TICKS: u32 = 5;
pub const MAX_GLIDE_TICKS: u32 = 40;

/// An automatic glide from the previous note's pitch to a newly pressed note.
#[derive(Clone, Debug, PartialEq)]
pub struct Glide {
    slot: Slot,
    start: f32,
    end: f32,
    step: f32,
    total: u32,
    elapsed: u32,
}

impl Glide {
    /// Plans a glide to `end` on `slot`. Faster pointer motion yields a shorter glide.
    pub fn new(slot: Slot, start: f32, end: f32, motion: f32) -> Self {
        let total = glide_ticks(start, end, motion);
        let step = if start > 0.0 && end > 0.0 {
            (end / start).powf(1.0 / total as f32)
        } else {
            1.0
        };
        Self {
            slot,
            start,
            end,
            step,
            total,
            elapsed: 0,
        }
    }

    pub fn slot(&self) -> Slot {
        self.slot
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn is_done(&self) -> bool {
        self.elapsed >= self.total
    }

    /// The frequency after the ticks elapsed so far.
    pub fn frequency(&self) -> f32 {
        if self.is_done() {
            return self.end;
        }
        let freq = self.start * self.step.powi(self.elapsed as i32);
        if self.step >= 1.0 {
            freq.min(self.end)
        } else {
            freq.max(self.end)
        }
    }

    /// Moves the glide one tick forward and returns the new frequency.
    pub fn advance(&mut self) -> f32 {
        self.elapsed = (self.elapsed + 1).min(self.total);
        self.frequency()
    }
}

/// The number of ticks a glide between two frequencies lasts.
pub fn glide_ticks(start: f32, end: f32, motion: f32) -> u32 {
    let ticks = (end - start).abs() / motion.abs().sqrt();
    if ticks.is_finite() {
        ticks.clamp(MIN_GLIDE_TICKS as f32, MAX_GLIDE_TICKS as f32) as u32
    } else {
        MIN_GLIDE_TICKS
    }
}
