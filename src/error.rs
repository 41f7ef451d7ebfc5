//! Crate-level error type.
//!
//! Remote generation and speech failures have their own error types
//! (`GenerationError`, `RecognitionError`, `SpeechError`) because the
//! reactor converts them into spoken fallbacks instead of propagating them.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Microphone capture or encoding error
    #[error("audio error: {0}")]
    Audio(String),

    /// Remote transcription error
    #[error("transcription error: {0}")]
    Transcription(String),

    /// Speech output error
    #[error("speech error: {0}")]
    Speech(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
