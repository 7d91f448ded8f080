//! Oracle client: the external generative-text capability.
//!
//! Defines the [`Oracle`] trait and the Gemini implementation. The credential
//! and model identifier are handed in at construction, so tests can swap in
//! an in-memory oracle without touching the process environment.
//!
//! # Call contract
//!
//! - Exactly one HTTP request per [`Oracle::generate`] call. No retry, no
//!   backoff, no streaming.
//! - No timeout unless `oracle.timeout_secs` is configured.
//! - An empty or safety-blocked reply is a failure, not an empty answer.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{OracleConfig, OracleCredentials};

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("LLM API key is not set")]
    MissingCredential,

    #[error("request error: {0}")]
    Request(String),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("LLM response was empty or blocked by safety filters")]
    EmptyReply,

    #[error("LLM response was blocked: {0}")]
    Blocked(String),

    #[error("invalid API response: {0}")]
    InvalidResponse(String),
}

/// A text-in, text-out generative model.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Model identifier, for logging.
    fn model_name(&self) -> &str;

    /// Send one prompt and return the raw, non-empty reply text.
    async fn generate(&self, prompt: &str) -> Result<String, OracleError>;
}

// ============ Gemini ============

/// Google Gemini via the `models/{model}:generateContent` REST endpoint.
pub struct GeminiOracle {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiOracle {
    pub fn new(config: &OracleConfig, credentials: OracleCredentials) -> Result<Self, OracleError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| OracleError::Request(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: credentials.model,
            api_key: credentials.api_key,
        })
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

#[async_trait]
impl Oracle for GeminiOracle {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, OracleError> {
        let api_key = self.api_key.as_ref().ok_or(OracleError::MissingCredential)?;

        let body = serde_json::json!({
            "contents": [
                { "role": "user", "parts": [ { "text": prompt } ] }
            ]
        });

        info!(model = %self.model, prompt_chars = prompt.chars().count(), "calling oracle");

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| OracleError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(OracleError::Api {
                status: status.as_u16(),
                body: body_text,
            });
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| OracleError::InvalidResponse(e.to_string()))?;
        let text = parse_gemini_response(&json)?;
        debug!(reply_chars = text.chars().count(), "oracle replied");
        Ok(text)
    }
}

/// Pull the reply text out of a `generateContent` response.
///
/// Concatenates the text parts of the first candidate. A prompt-level block
/// or a candidate stopped for safety without text is reported as
/// [`OracleError::Blocked`]; a reply with no text as [`OracleError::EmptyReply`].
pub fn parse_gemini_response(json: &serde_json::Value) -> Result<String, OracleError> {
    if let Some(reason) = json
        .pointer("/promptFeedback/blockReason")
        .and_then(|r| r.as_str())
    {
        return Err(OracleError::Blocked(reason.to_string()));
    }

    let candidate = json
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .ok_or(OracleError::EmptyReply)?;

    let text: String = candidate
        .pointer("/content/parts")
        .and_then(|p| p.as_array())
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return match candidate.get("finishReason").and_then(|r| r.as_str()) {
            Some(reason @ ("SAFETY" | "BLOCKLIST" | "PROHIBITED_CONTENT" | "RECITATION")) => {
                Err(OracleError::Blocked(reason.to_string()))
            }
            _ => Err(OracleError::EmptyReply),
        };
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn joins_text_parts_of_first_candidate() {
        let resp = json!({
            "candidates": [
                { "content": { "parts": [ { "text": "{\"a\":" }, { "text": "1}" } ] },
                  "finishReason": "STOP" },
                { "content": { "parts": [ { "text": "ignored" } ] } }
            ]
        });
        assert_eq!(parse_gemini_response(&resp).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn prompt_block_is_reported() {
        let resp = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        assert!(matches!(
            parse_gemini_response(&resp),
            Err(OracleError::Blocked(ref r)) if r == "SAFETY"
        ));
    }

    #[test]
    fn safety_stop_without_text_is_blocked() {
        let resp = json!({ "candidates": [ { "finishReason": "SAFETY" } ] });
        assert!(matches!(parse_gemini_response(&resp), Err(OracleError::Blocked(_))));
    }

    #[test]
    fn no_candidates_is_empty_reply() {
        assert!(matches!(
            parse_gemini_response(&json!({ "candidates": [] })),
            Err(OracleError::EmptyReply)
        ));
        assert!(matches!(
            parse_gemini_response(&json!({
                "candidates": [ { "content": { "parts": [ { "text": "  " } ] }, "finishReason": "STOP" } ]
            })),
            Err(OracleError::EmptyReply)
        ));
    }

    #[tokio::test]
    async fn missing_credential_fails_without_network() {
        let oracle = GeminiOracle::new(
            &OracleConfig::default(),
            OracleCredentials {
                api_key: None,
                model: "gemini-1.5-flash".to_string(),
            },
        )
        .unwrap();
        assert_eq!(oracle.model_name(), "gemini-1.5-flash");
        let err = oracle.generate("hello").await.unwrap_err();
        assert!(matches!(err, OracleError::MissingCredential));
    }

    #[test]
    fn url_includes_model() {
        let config = OracleConfig {
            endpoint: "http://localhost:9999/v1beta/".to_string(),
            ..OracleConfig::default()
        };
        let oracle = GeminiOracle::new(
            &config,
            OracleCredentials {
                api_key: Some("k".to_string()),
                model: "gemini-test".to_string(),
            },
        )
        .unwrap();
        assert_eq!(
            oracle.url(),
            "http://localhost:9999/v1beta/models/gemini-test:generateContent"
        );
    }
}
