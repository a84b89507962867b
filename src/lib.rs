pub mod audio;
pub mod config;
pub mod engine;
pub mod error;
pub mod freq;
pub mod input;
pub mod instrument;
pub mod lifecycle;
pub mod note;
pub mod octave;
pub mod output;
mod util;
pub mod voice;
pub mod volume;

pub use config::Config;
pub use engine::{ControlFrame, Engine, Renderer};
pub use error::{Error, Result};
pub use input::ControlInput;
pub use note::{NoteState, PlayMode, Slot};
