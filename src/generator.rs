//! Answer generators for the retrieval path.
//!
//! - **extractive** ([`ExtractiveGenerator`]): composes the answer from the
//!   retrieved passages, no network.
//! - **openai** ([`OpenAIGenerator`]): sends the grounded-answer prompt to the
//!   chat completions API. Requires `OPENAI_API_KEY`.

use anyhow::{bail, Result};
use answer_harness_core::answer::{AnswerGenerator, ExtractiveGenerator, GenerationContext};
use async_trait::async_trait;
use std::sync::Arc;

use crate::config::GenerationConfig;
use crate::embedding::{http_client, send_with_retry};

const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
const MAX_RETRIES: u32 = 3;

pub fn create_generator(config: &GenerationConfig) -> Result<Arc<dyn AnswerGenerator>> {
    match config.provider.as_str() {
        "extractive" => Ok(Arc::new(ExtractiveGenerator)),
        "openai" => Ok(Arc::new(OpenAIGenerator::new(config)?)),
        other => bail!("Unknown generation provider: {}", other),
    }
}

pub struct OpenAIGenerator {
    model: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAIGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;
        Ok(Self {
            model: config.model.clone(),
            api_key,
            client: http_client(config.timeout_secs)?,
        })
    }
}

#[async_trait]
impl AnswerGenerator for OpenAIGenerator {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(&self, context: &GenerationContext) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "temperature": 0,
            "messages": [
                { "role": "user", "content": context.prompt() }
            ],
        });
        let json = send_with_retry("OpenAI", MAX_RETRIES, || {
            self.client
                .post(OPENAI_CHAT_URL)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .json(&body)
        })
        .await?;
        parse_chat_response(&json)
    }
}

fn parse_chat_response(json: &serde_json::Value) -> Result<String> {
    let content = json
        .pointer("/choices/0/message/content")
        .and_then(|c| c.as_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid OpenAI response: missing choices[0].message.content"))?;
    Ok(content.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_chat_response() {
        let body = json!({
            "choices": [{"message": {"role": "assistant", "content": "  Refunds take 5 days.\n"}}]
        });
        assert_eq!(parse_chat_response(&body).unwrap(), "Refunds take 5 days.");
        assert!(parse_chat_response(&json!({"choices": []})).is_err());
    }

    #[test]
    fn test_default_generator_is_extractive() {
        let generator = create_generator(&GenerationConfig::default()).unwrap();
        assert_eq!(generator.name(), "extractive");
    }

    #[test]
    fn test_unknown_generator_rejected() {
        let config = GenerationConfig {
            provider: "llama".to_string(),
            ..GenerationConfig::default()
        };
        assert!(create_generator(&config).is_err());
    }
}
