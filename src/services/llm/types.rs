use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// One single-turn generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    /// When set, the reply must be JSON matching this schema.
    pub response_schema: Option<Value>,
}

impl GenerationRequest {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            response_schema: None,
        }
    }

    pub fn structured(prompt: impl Into<String>, schema: Value) -> Self {
        Self {
            prompt: prompt.into(),
            response_schema: Some(schema),
        }
    }

    pub fn is_structured(&self) -> bool {
        self.response_schema.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReply {
    pub text: String,
}

impl GenerationReply {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Decode a structured reply. Schema mismatches are `MalformedResponse`.
    pub fn parse_json<T: DeserializeOwned>(&self) -> Result<T, GenerationError> {
        serde_json::from_str(&self.text)
            .map_err(|e| GenerationError::MalformedResponse(e.to_string()))
    }
}

/// Every variant is recoverable; callers turn it into a canned reply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("network error: {0}")]
    Network(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("response had no usable candidate")]
    EmptyCandidate,
}

/// Remote text generation. One attempt per call; no retries.
#[async_trait]
pub trait LanguageService: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationReply, GenerationError>;
}
