//! Answer assembly for the retrieval path.
//!
//! Retrieved passages become a [`GenerationContext`], which an
//! [`AnswerGenerator`] turns into prose. [`ExtractiveGenerator`] is the
//! offline default; model-backed generators live in the application crate.

use async_trait::async_trait;

use crate::models::{Candidate, Confidence, RetrievalResult};

/// Answer returned when retrieval produced no passages.
pub const INSUFFICIENT_CONTEXT_ANSWER: &str =
    "The indexed context does not contain enough information to answer this question.";

/// Answer returned when every engine failed.
pub const NO_ANSWER: &str = "I'm sorry, I couldn't find an answer to your question. \
Please try rephrasing it or providing more specific details.";

const PASSAGE_PREVIEW_CHARS: usize = 200;

/// Confidence of a retrieval answer, from how many sources back it.
pub fn confidence_for_sources(count: usize) -> Confidence {
    match count {
        0 => Confidence::Low,
        1 | 2 => Confidence::Medium,
        _ => Confidence::High,
    }
}

/// The question plus the passages a generator may draw from.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationContext {
    pub question: String,
    pub passages: Vec<Candidate>,
}

impl GenerationContext {
    /// Take at most `max_passages` of the best passages from `result`.
    pub fn new(question: impl Into<String>, result: &RetrievalResult, max_passages: usize) -> Self {
        Self {
            question: question.into(),
            passages: result.iter().take(max_passages).cloned().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    /// Numbered context block, one passage per entry.
    pub fn render_context(&self) -> String {
        self.passages
            .iter()
            .enumerate()
            .map(|(i, c)| format!("[{}] {}", i + 1, c.content.trim()))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Grounded-answer prompt for model-backed generators.
    pub fn prompt(&self) -> String {
        format!(
            "You are a helpful assistant that answers questions based on the provided context.\n\n\
             Context:\n{}\n\n\
             Question: {}\n\n\
             Answer using only the context above. If the context does not contain enough \
             information to answer the question, say so.\n\n\
             Answer:",
            self.render_context(),
            self.question.trim()
        )
    }
}

/// Produces answer text from a generation context.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, context: &GenerationContext) -> anyhow::Result<String>;
}

/// Composes an answer from passage excerpts. Deterministic, no network.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractiveGenerator;

#[async_trait]
impl AnswerGenerator for ExtractiveGenerator {
    fn name(&self) -> &str {
        "extractive"
    }

    async fn generate(&self, context: &GenerationContext) -> anyhow::Result<String> {
        if context.is_empty() {
            return Ok(INSUFFICIENT_CONTEXT_ANSWER.to_string());
        }
        let mut answer = String::from("Based on the indexed context:\n");
        for passage in &context.passages {
            answer.push_str("\n- ");
            answer.push_str(&preview(&passage.content));
        }
        Ok(answer)
    }
}

fn preview(content: &str) -> String {
    let content = content.trim();
    match content.char_indices().nth(PASSAGE_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &content[..cut]),
        None => content.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Metadata;

    fn result(contents: &[&str]) -> RetrievalResult {
        let candidates = contents
            .iter()
            .enumerate()
            .map(|(i, c)| Candidate::new(*c, Metadata::new(), 0.9 - i as f64 * 0.1))
            .collect();
        RetrievalResult::from_candidates(candidates, 100)
    }

    #[test]
    fn test_confidence_by_source_count() {
        assert_eq!(confidence_for_sources(0), Confidence::Low);
        assert_eq!(confidence_for_sources(1), Confidence::Medium);
        assert_eq!(confidence_for_sources(2), Confidence::Medium);
        assert_eq!(confidence_for_sources(3), Confidence::High);
        assert_eq!(confidence_for_sources(40), Confidence::High);
    }

    #[test]
    fn test_context_respects_max_passages() {
        let ctx = GenerationContext::new("q", &result(&["a", "b", "c"]), 2);
        assert_eq!(ctx.passages.len(), 2);
        assert_eq!(ctx.render_context(), "[1] a\n\n[2] b");
    }

    #[test]
    fn test_prompt_contains_question_and_context() {
        let ctx = GenerationContext::new("What is Rust?", &result(&["Rust is a language."]), 5);
        let prompt = ctx.prompt();
        assert!(prompt.contains("[1] Rust is a language."));
        assert!(prompt.contains("Question: What is Rust?"));
        assert!(prompt.contains("say so"));
    }

    #[tokio::test]
    async fn test_extractive_lists_passages() {
        let ctx = GenerationContext::new("q", &result(&["first", "second"]), 5);
        let answer = ExtractiveGenerator.generate(&ctx).await.unwrap();
        assert_eq!(answer, "Based on the indexed context:\n\n- first\n- second");
    }

    #[tokio::test]
    async fn test_extractive_on_empty_context() {
        let ctx = GenerationContext::new("q", &RetrievalResult::empty(), 5);
        let answer = ExtractiveGenerator.generate(&ctx).await.unwrap();
        assert_eq!(answer, INSUFFICIENT_CONTEXT_ANSWER);
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        let long = "é".repeat(300);
        let p = preview(&long);
        assert!(p.ends_with("..."));
        assert_eq!(p.chars().count(), PASSAGE_PREVIEW_CHARS + 3);
        assert_eq!(preview("short"), "short");
    }
}
