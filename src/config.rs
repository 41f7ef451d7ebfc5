//! Configuration: optional TOML file, then environment overrides.
//!
//! Secrets (API keys) are only ever read from the environment or a local
//! file; nothing is baked into the binary.

use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

pub const CONFIG_PATH_ENV: &str = "SENIOR_CONNECT_CONFIG";
const API_KEY_ENV: &str = "GEMINI_API_KEY";
const LOCALE_ENV: &str = "SENIOR_CONNECT_LOCALE";
const STT_KEY_ENV: &str = "SENIOR_CONNECT_STT_API_KEY";
const RECOGNIZER_ENV: &str = "SENIOR_CONNECT_RECOGNIZER";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Locale tag used for recognition, synthesis and date formatting
    pub locale: String,
    pub language: LanguageConfig,
    pub recognition: RecognitionConfig,
    pub synthesis: SynthesisConfig,
    pub session: SessionConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: "es-ES".to_string(),
            language: LanguageConfig::default(),
            recognition: RecognitionConfig::default(),
            synthesis: SynthesisConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

/// Remote generative-language endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LanguageConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.0-flash".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecognitionBackend {
    Microphone,
    Console,
    Disabled,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    pub backend: RecognitionBackend,
    pub transcription_url: String,
    pub transcription_model: String,
    pub transcription_api_key: Option<String>,
    /// Hard cap on one utterance
    pub max_utterance_secs: u64,
    /// Give up when nobody speaks for this long after activation
    pub no_speech_timeout_secs: u64,
    /// Silence that ends an utterance
    pub trailing_silence_ms: u64,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            backend: RecognitionBackend::Console,
            transcription_url: "https://api.openai.com/v1/audio/transcriptions".to_string(),
            transcription_model: "whisper-1".to_string(),
            transcription_api_key: None,
            max_utterance_secs: 15,
            no_speech_timeout_secs: 8,
            trailing_silence_ms: 900,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SynthesisBackend {
    Command,
    Console,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    pub backend: SynthesisBackend,
    pub program: String,
    /// `{locale}` is replaced with the session locale; the text is appended last
    pub args: Vec<String>,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            backend: SynthesisBackend::Console,
            program: "espeak-ng".to_string(),
            args: vec!["-v".to_string(), "{locale}".to_string()],
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Drop generation replies issued before a later section change
    pub discard_stale_replies: bool,
}

impl Config {
    /// Load from `path` (if given) and apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_toml(&std::fs::read_to_string(path)?)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns error if the TOML is invalid
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            self.language.api_key = Some(key);
        }
        if let Ok(locale) = std::env::var(LOCALE_ENV) {
            self.locale = locale;
        }
        if let Ok(key) = std::env::var(STT_KEY_ENV) {
            self.recognition.transcription_api_key = Some(key);
        }
        if let Ok(backend) = std::env::var(RECOGNIZER_ENV) {
            match backend.parse() {
                Ok(backend) => self.recognition.backend = backend,
                Err(e) => tracing::warn!(error = %e, "ignoring {RECOGNIZER_ENV}"),
            }
        }
    }
}

impl std::str::FromStr for RecognitionBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "microphone" => Ok(Self::Microphone),
            "console" => Ok(Self::Console),
            "disabled" => Ok(Self::Disabled),
            other => Err(Error::Config(format!("unknown recognizer backend: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.locale, "es-ES");
        assert_eq!(config.language.model, "gemini-2.0-flash");
        assert_eq!(config.recognition.backend, RecognitionBackend::Console);
        assert!(!config.session.discard_stale_replies);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::from_toml(
            r#"
            locale = "es-MX"

            [recognition]
            backend = "microphone"
            trailing_silence_ms = 600

            [session]
            discard_stale_replies = true
            "#,
        )
        .unwrap();

        assert_eq!(config.locale, "es-MX");
        assert_eq!(config.recognition.backend, RecognitionBackend::Microphone);
        assert_eq!(config.recognition.trailing_silence_ms, 600);
        assert_eq!(config.recognition.max_utterance_secs, 15);
        assert!(config.session.discard_stale_replies);
    }

    #[test]
    fn unknown_backend_is_rejected() {
        assert!(Config::from_toml("[recognition]\nbackend = \"telepathy\"").is_err());
        assert!("telepathy".parse::<RecognitionBackend>().is_err());
        assert_eq!("Disabled".parse::<RecognitionBackend>().unwrap(), RecognitionBackend::Disabled);
    }
}
