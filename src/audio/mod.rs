pub mod recorder;
pub mod sample;
