//! Contract for the structured (text-to-query) engine.
//!
//! The router only looks at [`StructuredOutcome::succeeded`] and the
//! reported confidence. Why an attempt failed is the engine's business.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::Confidence;

/// Result of one structured attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredOutcome {
    pub succeeded: bool,
    pub answer: String,
    pub confidence: Confidence,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl StructuredOutcome {
    pub fn success(answer: impl Into<String>, confidence: Confidence) -> Self {
        Self {
            succeeded: true,
            answer: answer.into(),
            confidence,
            reason: None,
        }
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            answer: String::new(),
            confidence: Confidence::Low,
            reason: Some(reason.into()),
        }
    }

    /// Explanation for a failed attempt, suitable as user-facing answer text.
    pub fn failure_reason(&self) -> String {
        self.reason
            .clone()
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| "the structured engine could not answer this question".to_string())
    }
}

/// Answers questions against a structured schema.
#[async_trait]
pub trait StructuredQueryEngine: Send + Sync {
    fn name(&self) -> &str;

    /// Whether the engine is configured at all. Unavailable engines are
    /// still called; they simply report failure.
    fn is_available(&self) -> bool {
        true
    }

    /// Try to answer `question`. `Err` is treated as a failed attempt.
    async fn answer(&self, question: &str) -> anyhow::Result<StructuredOutcome>;
}

/// Placeholder used when no structured backend is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableStructuredEngine;

#[async_trait]
impl StructuredQueryEngine for UnavailableStructuredEngine {
    fn name(&self) -> &str {
        "disabled"
    }

    fn is_available(&self) -> bool {
        false
    }

    async fn answer(&self, _question: &str) -> anyhow::Result<StructuredOutcome> {
        Ok(StructuredOutcome::failure(
            "no structured query engine is configured",
        ))
    }
}
