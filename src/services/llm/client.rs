use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::types::{GenerationError, GenerationReply, GenerationRequest, LanguageService};
use crate::config::LanguageConfig;
use crate::error::{Error, Result};

/// Client for the Gemini `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'a str,
    response_schema: &'a Value,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GeminiClient {
    /// # Errors
    ///
    /// Returns error if the API key is missing or the HTTP client cannot be built
    pub fn new(config: &LanguageConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| Error::Config("language service API key required (GEMINI_API_KEY)".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl LanguageService for GeminiClient {
    async fn generate(&self, request: GenerationRequest) -> std::result::Result<GenerationReply, GenerationError> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: &request.prompt }],
            }],
            generation_config: request.response_schema.as_ref().map(|schema| GenerationConfig {
                response_mime_type: "application/json",
                response_schema: schema,
            }),
        };

        debug!(model = %self.model, structured = request.is_structured(), "sending generation request");

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "generation request failed");
                GenerationError::Network(e.to_string())
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        if !status.is_success() {
            warn!(status = %status, "language service returned an error status");
            return Err(GenerationError::Network(format!("status {status}")));
        }

        parse_generate_response(&text, request.is_structured())
    }
}

/// Pull `candidates[0].content.parts[0].text` out of a response body.
pub(crate) fn parse_generate_response(
    body: &str,
    structured: bool,
) -> std::result::Result<GenerationReply, GenerationError> {
    let parsed: GenerateContentResponse =
        serde_json::from_str(body).map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

    let text = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .filter(|t| !t.trim().is_empty())
        .ok_or(GenerationError::EmptyCandidate)?;

    if structured {
        serde_json::from_str::<Value>(&text)
            .map_err(|e| GenerationError::MalformedResponse(format!("reply is not JSON: {e}")))?;
    }

    Ok(GenerationReply::new(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: String) -> LanguageConfig {
        LanguageConfig {
            base_url,
            api_key: Some("test-key".to_string()),
            timeout_secs: 2,
            ..LanguageConfig::default()
        }
    }

    #[test]
    fn extracts_first_candidate_text() {
        let body = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Ánimo, sal a caminar."}]}}]}"#;
        let reply = parse_generate_response(body, false).unwrap();
        assert_eq!(reply.text, "Ánimo, sal a caminar.");
    }

    #[test]
    fn missing_candidates_is_empty() {
        assert_eq!(parse_generate_response("{}", false), Err(GenerationError::EmptyCandidate));
        assert_eq!(
            parse_generate_response(r#"{"candidates":[]}"#, false),
            Err(GenerationError::EmptyCandidate)
        );
        assert_eq!(
            parse_generate_response(r#"{"candidates":[{"content":{"parts":[]}}]}"#, false),
            Err(GenerationError::EmptyCandidate)
        );
    }

    #[test]
    fn non_json_body_is_malformed() {
        let err = parse_generate_response("<html>oops</html>", false).unwrap_err();
        assert!(matches!(err, GenerationError::MalformedResponse(_)));
    }

    #[test]
    fn structured_reply_must_be_json() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"no es json"}]}}]}"#;
        let err = parse_generate_response(body, true).unwrap_err();
        assert!(matches!(err, GenerationError::MalformedResponse(_)));
    }

    #[test]
    fn request_body_carries_schema_only_when_structured() {
        let schema = serde_json::json!({"type": "OBJECT"});
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: "hola" }],
            }],
            generation_config: Some(GenerationConfig {
                response_mime_type: "application/json",
                response_schema: &schema,
            }),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hola");
        assert_eq!(json["generationConfig"]["responseMimeType"], "application/json");

        let plain = GenerateContentRequest {
            contents: vec![],
            generation_config: None,
        };
        let json = serde_json::to_value(&plain).unwrap();
        assert!(json.get("generationConfig").is_none());
    }

    #[test]
    fn missing_key_is_a_config_error() {
        let mut cfg = config("http://localhost".to_string());
        cfg.api_key = None;
        assert!(matches!(GeminiClient::new(&cfg), Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = GeminiClient::new(&config(format!("http://127.0.0.1:{port}"))).unwrap();
        let err = client.generate(GenerationRequest::text("hola")).await.unwrap_err();
        assert!(matches!(err, GenerationError::Network(_)));
    }
}
