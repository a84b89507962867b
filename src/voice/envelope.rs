use crate::note::NoteState;
use serde::{Deserialize, Serialize};

/// Envelope timings, counted in control ticks.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdsrParams {
    /// Ticks to rise from silence to the target volume.
    pub attack_frames: u32,
    /// Ticks to fall from the target volume to the sustain level.
    pub decay_frames: u32,
    /// Sustain level as a proportion of the target volume, between 0 and 1.
    pub sustain_level: f32,
    /// Ticks to fall from the release peak to silence.
    pub release_frames: u32,
}

impl Default for AdsrParams {
    fn default() -> Self {
        Self {
            attack_frames: 10,
            decay_frames: 5,
            sustain_level: 0.7,
            release_frames: 20,
        }
    }
}

impl AdsrParams {
    fn attack(&self) -> f32 {
        self.attack_frames.max(1) as f32
    }

    fn decay(&self) -> f32 {
        self.decay_frames.max(1) as f32
    }

    fn release(&self) -> f32 {
        self.release_frames.max(1) as f32
    }

    fn sustain(&self) -> f32 {
        if self.sustain_level.is_finite() {
            self.sustain_level.clamp(0.0, 1.0)
        } else {
            1.0
        }
    }
}

/// Per-slot gain envelope, driven once per control tick by the slot's lifecycle state.
#[derive(Clone, Copy, Debug, Default)]
pub struct AdsrEnvelope {
    /// The current envelope state.
    state: AdsrState,
    /// The current gain.
    amp: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AdsrState {
    Attack {
        /// Ticks elapsed since the note was pressed, including the press itself.
        frame: u32,
    },
    Decay {
        /// Ticks elapsed in the decay stage.
        frame: u32,
    },
    Sustain,
    Release {
        /// The gain at the moment the note was released.
        peak: f32,
        /// Ticks elapsed in the release stage.
        frame: u32,
    },
}

impl Default for AdsrState {
    fn default() -> Self {
        AdsrState::Release { peak: 0.0, frame: 0 }
    }
}

/// What the envelope asks of the note lifecycle after a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnvelopeEvent {
    None,
    /// The release ramp reached silence; the slot should go idle.
    Finished,
}

impl AdsrEnvelope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn amp(&self) -> f32 {
        self.amp
    }

    pub fn state(&self) -> AdsrState {
        self.state
    }

    /// Silences the envelope immediately.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Advances the envelope by one control tick.
    ///
    /// `target` is the performer's volume; the gain always stays within `[0, target]`.
    pub fn process(&mut self, note: NoteState, params: &AdsrParams, target: f32) -> EnvelopeEvent {
        use AdsrState::*;
        let target = target.clamp(0.0, 1.0);
        let sustain = params.sustain() * target;
        let mut event = EnvelopeEvent::None;

        match (note, self.state) {
            (NoteState::Pressed, _) => {
                // Starting at a non-zero gain avoids a click on retrigger
                self.amp = target / params.attack();
                self.state = Attack { frame: 1 };
                if 1.0 >= params.attack() {
                    self.state = Decay { frame: 0 };
                    self.amp = target;
                }
            }
            (NoteState::Held, Attack { mut frame }) => {
                frame += 1;
                self.amp = target * frame as f32 / params.attack();
                if frame as f32 >= params.attack() || self.amp >= target {
                    self.state = Decay { frame: 0 };
                    self.amp = target;
                } else {
                    self.state = Attack { frame };
                }
            }
            (NoteState::Held, Decay { mut frame }) => {
                frame += 1;
                self.amp = target - (target - sustain) * frame as f32 / params.decay();
                if frame as f32 >= params.decay() || self.amp <= sustain {
                    self.state = Sustain;
                    self.amp = sustain;
                } else {
                    self.state = Decay { frame };
                }
            }
            // Sustain follows live changes of the target volume
            (NoteState::Held, Sustain) => self.amp = sustain,
            // Only reachable when a press was turned into a hold to skip the attack
            (NoteState::Held, Release { .. }) => {
                self.state = Sustain;
                self.amp = sustain;
            }
            (NoteState::Released, _) => {
                self.state = Release {
                    peak: self.amp,
                    frame: 0,
                };
            }
            (NoteState::StillReleased, state) => {
                let (peak, mut frame) = match state {
                    Release { peak, frame } => (peak, frame),
                    // Missed the release edge; release from wherever we are
                    _ => (self.amp, 0),
                };
                frame += 1;
                // Step down from the current gain so a lowered target is never undone
                self.amp -= peak / params.release();
                if frame as f32 >= params.release() || self.amp <= 0.0 {
                    self.reset();
                    event = EnvelopeEvent::Finished;
                } else {
                    self.state = Release { peak, frame };
                }
            }
            (NoteState::Idle, _) => self.reset(),
        }

        self.amp = self.amp.clamp(0.0, target);
        event
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn params() -> AdsrParams {
        AdsrParams {
            attack_frames: 10,
            decay_frames: 5,
            sustain_level: 0.7,
            release_frames: 20,
        }
    }

    #[test]
    fn test_full_envelope() {
        let params = params();
        let mut env = AdsrEnvelope::new();

        env.process(NoteState::Pressed, &params, 1.0);
        assert!((env.amp() - 0.1).abs() < EPSILON);
        for i in 2..=10 {
            env.process(NoteState::Held, &params, 1.0);
            assert!((env.amp() - 0.1 * i as f32).abs() < EPSILON, "attack tick {i}");
        }
        assert_eq!(env.amp(), 1.0);

        for i in 1..=5 {
            env.process(NoteState::Held, &params, 1.0);
            assert!((env.amp() - (1.0 - 0.06 * i as f32)).abs() < EPSILON, "decay tick {i}");
        }
        assert_eq!(env.state(), AdsrState::Sustain);
        assert!((env.amp() - 0.7).abs() < EPSILON);

        for _ in 0..10 {
            env.process(NoteState::Held, &params, 1.0);
            assert!((env.amp() - 0.7).abs() < EPSILON);
        }

        assert_eq!(env.process(NoteState::Released, &params, 1.0), EnvelopeEvent::None);
        assert!((env.amp() - 0.7).abs() < EPSILON);

        let mut prev = env.amp();
        for i in 1..=20 {
            let event = env.process(NoteState::StillReleased, &params, 1.0);
            let expected = 0.7 * (1.0 - i as f32 / 20.0);
            assert!((env.amp() - expected).abs() < EPSILON, "release tick {i}");
            assert!(env.amp() <= prev);
            prev = env.amp();
            if i < 20 {
                assert_eq!(event, EnvelopeEvent::None);
            } else {
                assert_eq!(event, EnvelopeEvent::Finished);
            }
        }
        assert_eq!(env.amp(), 0.0);
    }

    #[test]
    fn test_sustain_tracks_target() {
        let params = AdsrParams {
            attack_frames: 1,
            decay_frames: 1,
            ..params()
        };
        let mut env = AdsrEnvelope::new();
        env.process(NoteState::Pressed, &params, 1.0);
        env.process(NoteState::Held, &params, 1.0);
        assert_eq!(env.state(), AdsrState::Sustain);
        env.process(NoteState::Held, &params, 0.5);
        assert!((env.amp() - 0.35).abs() < EPSILON);
    }

    #[test]
    fn test_skipped_attack_snaps_to_sustain() {
        let params = params();
        let mut env = AdsrEnvelope::new();
        env.process(NoteState::Idle, &params, 1.0);
        env.process(NoteState::Held, &params, 0.5);
        assert_eq!(env.state(), AdsrState::Sustain);
        assert!((env.amp() - 0.35).abs() < EPSILON);
    }

    #[test]
    fn test_zero_length_durations() {
        let params = AdsrParams {
            attack_frames: 0,
            decay_frames: 0,
            sustain_level: 0.5,
            release_frames: 0,
        };
        let mut env = AdsrEnvelope::new();
        env.process(NoteState::Pressed, &params, 1.0);
        assert_eq!(env.amp(), 1.0);
        env.process(NoteState::Held, &params, 1.0);
        assert_eq!(env.amp(), 0.5);
        env.process(NoteState::Released, &params, 1.0);
        assert_eq!(env.process(NoteState::StillReleased, &params, 1.0), EnvelopeEvent::Finished);
        assert!(env.amp().is_finite());
        assert_eq!(env.amp(), 0.0);
    }

    #[test]
    fn test_gain_stays_within_target() {
        let params = params();
        let mut env = AdsrEnvelope::new();
        env.process(NoteState::Pressed, &params, 1.0);
        for _ in 0..20 {
            env.process(NoteState::Held, &params, 1.0);
        }
        env.process(NoteState::Released, &params, 1.0);
        for _ in 0..5 {
            env.process(NoteState::StillReleased, &params, 0.2);
            assert!(env.amp() >= 0.0 && env.amp() <= 0.2);
        }
    }

    #[test]
    fn test_release_never_rises_when_target_recovers() {
        let params = params();
        let mut env = AdsrEnvelope::new();
        env.process(NoteState::Pressed, &params, 1.0);
        for _ in 0..20 {
            env.process(NoteState::Held, &params, 1.0);
        }
        env.process(NoteState::Released, &params, 1.0);
        assert!((env.amp() - 0.7).abs() < EPSILON);

        env.process(NoteState::StillReleased, &params, 0.1);
        assert!((env.amp() - 0.1).abs() < EPSILON);
        let mut prev = env.amp();
        let mut finished = false;
        for _ in 0..19 {
            if env.process(NoteState::StillReleased, &params, 1.0) == EnvelopeEvent::Finished {
                finished = true;
            }
            assert!(env.amp() <= prev, "release gain rose from {prev} to {}", env.amp());
            prev = env.amp();
        }
        assert!(finished);
        assert_eq!(env.amp(), 0.0);
    }

    #[test]
    fn test_retrigger_restarts_attack() {
        let params = params();
        let mut env = AdsrEnvelope::new();
        env.process(NoteState::Pressed, &params, 1.0);
        for _ in 0..20 {
            env.process(NoteState::Held, &params, 1.0);
        }
        env.process(NoteState::Pressed, &params, 1.0);
        assert_eq!(env.state(), AdsrState::Attack { frame: 1 });
        assert!((env.amp() - 0.1).abs() < EPSILON);
    }
}
