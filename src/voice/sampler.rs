use crate::{instrument::SampleSlot, note::NoteState};

/// Control-rate playback position of a sample on one slot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SamplePlayback {
    /// Current play position of the sample, in sample frames.
    pub frame_counter: f32,
    /// Playback speed relative to the sample's recorded pitch.
    pub pitch_ratio: f32,
    /// Whether the sample is currently audible.
    pub playing: bool,
}

impl Default for SamplePlayback {
    fn default() -> Self {
        Self {
            frame_counter: 0.0,
            pitch_ratio: 1.0,
            playing: false,
        }
    }
}

impl SamplePlayback {
    /// Advances playback by one control tick.
    ///
    /// `pitch_ratio` already includes the sample's own pitch modifier.
    pub fn update(&mut self, state: NoteState, sample: &SampleSlot, pitch_ratio: f32, control_rate: f32) {
        let Some(data) = sample.data.as_ref().filter(|_| sample.is_ready()) else {
            *self = Self::default();
            return;
        };

        self.pitch_ratio = pitch_ratio;
        let step = data.sample_rate() as f32 * pitch_ratio / control_rate;
        let length = data.length() as f32;

        match state {
            NoteState::Pressed => {
                self.frame_counter = 0.0;
                self.playing = true;
            }
            NoteState::Held => {
                if self.playing {
                    self.advance(step, length);
                }
                if !self.playing && sample.play_continuously {
                    self.frame_counter = 0.0;
                    self.playing = true;
                }
            }
            NoteState::Released if sample.stop_on_release => {
                self.frame_counter = 0.0;
                self.playing = false;
            }
            NoteState::Released | NoteState::StillReleased => {
                if self.playing && !sample.stop_on_release {
                    self.advance(step, length);
                }
            }
            NoteState::Idle => {
                self.frame_counter = 0.0;
                self.playing = false;
            }
        }
    }

    fn advance(&mut self, step: f32, length: f32) {
        self.frame_counter += step;
        if self.frame_counter >= length || self.frame_counter < 0.0 {
            self.playing = false;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::audio::sample::AudioSample;

    fn sample(frames: usize) -> SampleSlot {
        SampleSlot::from_data(AudioSample::new(600, vec![0.5; frames]))
    }

    #[test]
    fn test_press_and_hold_advances() {
        let sample = sample(100);
        let mut playback = SamplePlayback::default();
        playback.update(NoteState::Pressed, &sample, 1.0, 60.0);
        assert!(playback.playing);
        assert_eq!(playback.frame_counter, 0.0);
        playback.update(NoteState::Held, &sample, 1.0, 60.0);
        assert_eq!(playback.frame_counter, 10.0);
        playback.update(NoteState::Held, &sample, 2.0, 60.0);
        assert_eq!(playback.frame_counter, 30.0);
    }

    #[test]
    fn test_runs_out() {
        let sample = sample(25);
        let mut playback = SamplePlayback::default();
        playback.update(NoteState::Pressed, &sample, 1.0, 60.0);
        for _ in 0..3 {
            playback.update(NoteState::Held, &sample, 1.0, 60.0);
        }
        assert!(!playback.playing);
    }

    #[test]
    fn test_play_continuously_restarts() {
        let mut sample = sample(25);
        sample.play_continuously = true;
        let mut playback = SamplePlayback::default();
        playback.update(NoteState::Pressed, &sample, 1.0, 60.0);
        for _ in 0..3 {
            playback.update(NoteState::Held, &sample, 1.0, 60.0);
        }
        assert!(playback.playing);
        assert_eq!(playback.frame_counter, 0.0);
    }

    #[test]
    fn test_stop_on_release() {
        let mut sample = sample(100);
        let mut playback = SamplePlayback::default();
        playback.update(NoteState::Pressed, &sample, 1.0, 60.0);
        playback.update(NoteState::Released, &sample, 1.0, 60.0);
        assert!(playback.playing);
        assert_eq!(playback.frame_counter, 10.0);

        sample.stop_on_release = true;
        playback.update(NoteState::Pressed, &sample, 1.0, 60.0);
        playback.update(NoteState::Released, &sample, 1.0, 60.0);
        assert!(!playback.playing);
    }

    #[test]
    fn test_unready_sample_is_silent() {
        let sample = SampleSlot::default();
        let mut playback = SamplePlayback::default();
        playback.update(NoteState::Pressed, &sample, 1.0, 60.0);
        assert!(!playback.playing);
    }
}
