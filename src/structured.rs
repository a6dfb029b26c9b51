//! Structured (text-to-query) engine adapters.
//!
//! - **disabled**: [`UnavailableStructuredEngine`] from the core crate; every
//!   attempt fails, so `auto` questions go straight to retrieval.
//! - **http**: [`HttpStructuredEngine`] posts `{"question": ...}` to an
//!   external text-to-query service.
//!
//! # Response Contract
//!
//! ```json
//! { "answer": "There are 42 open orders.", "confidence": "high" }
//! ```
//!
//! The attempt counts as failed when the body carries an `error` field,
//! the answer is missing or blank, or the answer starts with `Error:`.
//! `confidence` defaults to `high`.

use anyhow::{bail, Result};
use answer_harness_core::models::Confidence;
use answer_harness_core::structured::{
    StructuredOutcome, StructuredQueryEngine, UnavailableStructuredEngine,
};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use crate::config::StructuredConfig;
use crate::embedding::http_client;

pub fn create_structured_engine(config: &StructuredConfig) -> Result<Arc<dyn StructuredQueryEngine>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(UnavailableStructuredEngine)),
        "http" => Ok(Arc::new(HttpStructuredEngine::new(config)?)),
        other => bail!("Unknown structured provider: {}", other),
    }
}

/// Client for an external text-to-query HTTP service.
pub struct HttpStructuredEngine {
    url: String,
    client: reqwest::Client,
}

impl HttpStructuredEngine {
    pub fn new(config: &StructuredConfig) -> Result<Self> {
        let url = config
            .url
            .clone()
            .ok_or_else(|| anyhow::anyhow!("structured.url required for http provider"))?;
        Ok(Self {
            url,
            client: http_client(config.timeout_secs)?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    confidence: Option<String>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[async_trait]
impl StructuredQueryEngine for HttpStructuredEngine {
    fn name(&self) -> &str {
        "http"
    }

    async fn answer(&self, question: &str) -> Result<StructuredOutcome> {
        let response = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({ "question": question }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Ok(StructuredOutcome::failure(format!(
                "structured service returned {}: {}",
                status, body_text
            )));
        }

        let body: serde_json::Value = response.json().await?;
        Ok(interpret_response(body))
    }
}

fn interpret_response(body: serde_json::Value) -> StructuredOutcome {
    let parsed: QueryResponse = match serde_json::from_value(body) {
        Ok(parsed) => parsed,
        Err(e) => {
            return StructuredOutcome::failure(format!("malformed structured response: {}", e))
        }
    };

    if let Some(error) = parsed.error.filter(|e| !e.is_null()) {
        let reason = match error {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        return StructuredOutcome::failure(reason);
    }

    let answer = match parsed.answer {
        Some(a) if !a.trim().is_empty() => a,
        _ => return StructuredOutcome::failure("structured service returned no answer"),
    };
    if answer.starts_with("Error:") {
        return StructuredOutcome::failure(answer);
    }

    let confidence = parsed
        .confidence
        .and_then(|c| c.parse::<Confidence>().ok())
        .unwrap_or(Confidence::High);
    StructuredOutcome::success(answer, confidence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_defaults_to_high_confidence() {
        let outcome = interpret_response(json!({"answer": "42 open orders"}));
        assert_eq!(
            outcome,
            StructuredOutcome::success("42 open orders", Confidence::High)
        );
    }

    #[test]
    fn test_reported_confidence_kept() {
        let outcome = interpret_response(json!({"answer": "none", "confidence": "low"}));
        assert!(outcome.succeeded);
        assert_eq!(outcome.confidence, Confidence::Low);
    }

    #[test]
    fn test_error_field_is_failure() {
        let outcome = interpret_response(json!({"answer": "x", "error": "no such column"}));
        assert!(!outcome.succeeded);
        assert_eq!(outcome.failure_reason(), "no such column");
    }

    #[test]
    fn test_null_error_field_ignored() {
        let outcome = interpret_response(json!({"answer": "x", "error": null}));
        assert!(outcome.succeeded);
    }

    #[test]
    fn test_error_prefixed_answer_is_failure() {
        let outcome = interpret_response(json!({"answer": "Error: query timed out"}));
        assert!(!outcome.succeeded);
        assert_eq!(outcome.failure_reason(), "Error: query timed out");
    }

    #[test]
    fn test_blank_answer_is_failure() {
        assert!(!interpret_response(json!({"answer": "  "})).succeeded);
        assert!(!interpret_response(json!({})).succeeded);
        assert!(!interpret_response(json!({"answer": 7})).succeeded);
    }

    #[test]
    fn test_factory() {
        let disabled = create_structured_engine(&StructuredConfig::default()).unwrap();
        assert!(!disabled.is_available());
        let http = create_structured_engine(&StructuredConfig {
            provider: "http".to_string(),
            url: Some("http://127.0.0.1:9/query".to_string()),
            ..StructuredConfig::default()
        })
        .unwrap();
        assert_eq!(http.name(), "http");
        assert!(http.is_available());
    }
}
