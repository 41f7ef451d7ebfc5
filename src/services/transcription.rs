//! Remote speech-to-text for captured utterances (Whisper-compatible API).

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::config::RecognitionConfig;
use crate::error::{Error, Result};

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

#[derive(Clone)]
pub struct Transcriber {
    client: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
    language: String,
}

impl Transcriber {
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new(config: &RecognitionConfig, locale: &str) -> Result<Self> {
        let api_key = config
            .transcription_api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                Error::Config("transcription API key required (SENIOR_CONNECT_STT_API_KEY)".to_string())
            })?;

        Ok(Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()?,
            url: config.transcription_url.clone(),
            api_key,
            model: config.transcription_model.clone(),
            // Whisper wants ISO-639-1, not a full locale tag
            language: locale.split(['-', '_']).next().unwrap_or("es").to_string(),
        })
    }

    /// Transcribe one WAV-encoded utterance.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the service rejects it
    pub async fn transcribe(&self, wav: Vec<u8>) -> Result<String> {
        tracing::debug!(audio_bytes = wav.len(), "starting transcription");

        let file = Part::bytes(wav)
            .file_name("utterance.wav")
            .mime_str("audio/wav")
            .map_err(|e| Error::Transcription(e.to_string()))?;
        let form = Form::new()
            .part("file", file)
            .text("model", self.model.clone())
            .text("language", self.language.clone());

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "transcription API error");
            return Err(Error::Transcription(format!("status {status}: {body}")));
        }

        let result: TranscriptionResponse = response.json().await?;
        tracing::info!(chars = result.text.len(), "transcription complete");
        Ok(result.text.trim().to_string())
    }
}
