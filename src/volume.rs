use crate::{input::ControlInput, note::PlayMode};

/// Target volume change per unit of horizontal pointer motion.
const VOLUME_PER_UNIT: f32 = 0.001;
/// Largest target volume change in a single tick.
const MAX_VOLUME_STEP: f32 = 0.01;

/// The performer's target volume, which every envelope scales to.
#[derive(Clone, Debug)]
pub struct VolumeControl {
    target: f32,
    /// The volume new notes start at when `constant` is set.
    anchor: f32,
    constant: bool,
}

impl Default for VolumeControl {
    fn default() -> Self {
        Self::new(0.5, false)
    }
}

impl VolumeControl {
    pub fn new(initial: f32, constant: bool) -> Self {
        let initial = initial.clamp(0.0, 1.0);
        Self {
            target: initial,
            anchor: initial,
            constant,
        }
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn set_target(&mut self, target: f32) {
        self.target = target.clamp(0.0, 1.0);
        self.anchor = self.target;
    }

    pub fn update(&mut self, input: &ControlInput, mode: PlayMode, any_pressed: bool) {
        if self.constant && any_pressed {
            self.target = self.anchor;
        }

        let step = (input.pointer_dx * VOLUME_PER_UNIT).clamp(-MAX_VOLUME_STEP, MAX_VOLUME_STEP);
        if step.is_finite() {
            self.target = (self.target + step).clamp(0.0, 1.0);
        }

        // The preset keys double as note keys in chord mode
        if mode == PlayMode::Solo {
            if let Some(preset) = input.volume_preset.filter(|p| (1..=10).contains(p)) {
                self.set_target(preset as f32 / 10.0);
            }
        }
    }
}
