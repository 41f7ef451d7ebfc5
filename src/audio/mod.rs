//! Microphone capture and utterance endpointing.

pub mod capture;
pub mod processing;
pub mod wav;

pub use capture::{capture_utterance, CaptureSettings, Utterance};
pub use wav::samples_to_wav;

/// Rate of the audio handed to the transcription service.
pub const TRANSCRIPTION_RATE: u32 = 16_000;
