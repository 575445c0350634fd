//! Completion-service client seam and JSON-span isolation.
//!
//! The pipeline talks to its text-completion service through the
//! [`CompletionClient`] trait rather than a concrete SDK type, so tests can
//! substitute a scripted fake and the credential stays an explicit
//! constructor argument instead of ambient global state.
//!
//! [`OpenAiClient`] is the default implementation, targeting any
//! OpenAI-compatible chat-completions endpoint. A missing API key is
//! deliberately not validated at construction — it surfaces as
//! [`TaxdocError::LlmCall`] on the first request, keeping client creation
//! infallible for callers that never reach the network (tests, `recognize`).

use crate::error::TaxdocError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Default OpenAI-compatible endpoint.
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// How much of a JSON-free response to quote back in the error.
const SNIPPET_LEN: usize = 120;

/// One structured-generation request: prompt, system role, and sampling knobs.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// System-role instruction string.
    pub system: String,
    /// User-role prompt body.
    pub prompt: String,
    /// Sampling temperature (low for extraction, higher for advice).
    pub temperature: f32,
    /// Token budget for the response.
    pub max_tokens: u32,
}

/// A text-completion service: prompt in, free-form response text out.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send one request and return the raw response text.
    ///
    /// Failures of the call itself (network, auth, quota) map to
    /// [`TaxdocError::LlmCall`]; response-shape problems are the caller's
    /// concern.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, TaxdocError>;
}

// ── OpenAI-compatible implementation ─────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

/// HTTP client for an OpenAI-compatible chat-completions endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiClient {
    /// Create a client with an explicit credential.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Create a client from the `OPENAI_API_KEY` environment variable.
    ///
    /// An absent variable yields a client with an empty key; the service
    /// rejects it on first use and the failure surfaces as `LlmCall`.
    pub fn from_env(model: impl Into<String>, timeout_secs: u64) -> Self {
        let api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
        Self::new(api_key, model, timeout_secs)
    }

    /// Point the client at a different OpenAI-compatible endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, TaxdocError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: &request.system },
                ChatMessage { role: "user", content: &request.prompt },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| TaxdocError::LlmCall {
                detail: format!("request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TaxdocError::LlmCall {
                detail: format!("HTTP {status}: {error_text}"),
            });
        }

        let chat: ChatResponse = response.json().await.map_err(|e| TaxdocError::LlmCall {
            detail: format!("malformed completion envelope: {e}"),
        })?;

        let choice = chat.choices.into_iter().next().ok_or_else(|| TaxdocError::LlmCall {
            detail: "completion response contained no choices".to_string(),
        })?;

        Ok(choice.message.content)
    }
}

// ── JSON-span isolation ──────────────────────────────────────────────────

/// Isolate the JSON object inside free-form response text.
///
/// Models add commentary around the object despite being told not to; the
/// span from the first `{` through the last `}` is tolerant of leading and
/// trailing prose while keeping nested objects intact.
pub fn isolate_json_object(text: &str) -> Result<&str, TaxdocError> {
    let start = text.find('{');
    let end = text.rfind('}');
    match (start, end) {
        (Some(s), Some(e)) if s <= e => Ok(&text[s..=e]),
        _ => Err(TaxdocError::NoJsonFound {
            snippet: text.chars().take(SNIPPET_LEN).collect(),
        }),
    }
}

/// Isolate and parse the JSON object embedded in `text`.
pub fn parse_json_response(text: &str) -> Result<Value, TaxdocError> {
    let span = isolate_json_object(text)?;
    serde_json::from_str(span).map_err(|e| TaxdocError::JsonParse {
        detail: e.to_string(),
    })
}

/// Run one structured-generation round trip: complete, isolate, parse.
pub async fn request_json(
    client: &dyn CompletionClient,
    request: &CompletionRequest,
) -> Result<Value, TaxdocError> {
    let response = client.complete(request).await?;
    parse_json_response(&response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn isolates_object_with_surrounding_commentary() {
        let parsed = parse_json_response("Here you go: {\"a\":1} thanks!").unwrap();
        assert_eq!(parsed, json!({"a": 1}));
    }

    #[test]
    fn isolates_nested_objects_intact() {
        let text = "```json\n{\"outer\": {\"inner\": 2}}\n```";
        let parsed = parse_json_response(text).unwrap();
        assert_eq!(parsed, json!({"outer": {"inner": 2}}));
    }

    #[test]
    fn braceless_response_is_no_json_found() {
        let err = parse_json_response("I could not find any fields, sorry.").unwrap_err();
        match err {
            TaxdocError::NoJsonFound { snippet } => {
                assert!(snippet.starts_with("I could not"));
            }
            other => panic!("expected NoJsonFound, got {other:?}"),
        }
    }

    #[test]
    fn reversed_braces_are_no_json_found() {
        let err = isolate_json_object("} backwards {").unwrap_err();
        assert!(matches!(err, TaxdocError::NoJsonFound { .. }));
    }

    #[test]
    fn invalid_span_is_json_parse_error() {
        let err = parse_json_response("{not valid json}").unwrap_err();
        assert!(matches!(err, TaxdocError::JsonParse { .. }));
    }

    #[test]
    fn snippet_is_truncated() {
        let long = "x".repeat(500);
        let err = isolate_json_object(&long).unwrap_err();
        match err {
            TaxdocError::NoJsonFound { snippet } => assert_eq!(snippet.len(), SNIPPET_LEN),
            other => panic!("expected NoJsonFound, got {other:?}"),
        }
    }

    #[test]
    fn openai_client_construction_does_not_validate_key() {
        // Missing credential must not fail here; it surfaces at first use.
        let client = OpenAiClient::new("", "gpt-4o-mini", 60);
        assert_eq!(client.base_url, DEFAULT_BASE_URL);
        let client = client.with_base_url("http://localhost:8080/v1");
        assert_eq!(client.base_url, "http://localhost:8080/v1");
    }
}
