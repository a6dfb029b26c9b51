//! Engine selection for `ask`.
//!
//! ```text
//! START ──auto──▶ STRUCTURED_ATTEMPTED ──ok──▶ DONE(structured)
//!   │                    │
//!   │                 failed / timed out
//!   │                    ▼
//!   └──retrieval──▶ RETRIEVAL_ATTEMPTED ──────▶ DONE(retrieval)
//! ```
//!
//! An explicit `structured` or `retrieval` method runs only that engine.
//! Every path ends in an [`AnswerEnvelope`]; lower-layer errors become a
//! low-confidence answer instead of an `Err`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::answer::{
    confidence_for_sources, AnswerGenerator, GenerationContext, INSUFFICIENT_CONTEXT_ANSWER,
    NO_ANSWER,
};
use crate::classify::{QuestionClassifier, QuestionKind};
use crate::engine::RetrievalEngine;
use crate::error::RetrievalError;
use crate::models::{
    AnswerEnvelope, AskMethod, Confidence, EngineAttempt, EngineKind, Query, RetrievalResult,
};
use crate::store::SnapshotInfo;
use crate::structured::{StructuredOutcome, StructuredQueryEngine};

/// Prefix a structured engine uses to smuggle an error into its answer text.
const STRUCTURED_ERROR_PREFIX: &str = "Error:";

#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Upper bound on one structured attempt.
    pub structured_time_budget: Duration,
    /// Send semantic questions straight to retrieval in `auto` mode.
    pub semantic_routing: bool,
    /// Passages handed to the answer generator.
    pub max_passages: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            structured_time_budget: Duration::from_secs(120),
            semantic_routing: false,
            max_passages: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouterState {
    Start,
    StructuredAttempted,
    RetrievalAttempted,
    Done(EngineKind),
}

/// An envelope plus how the router got there.
#[derive(Debug, Clone, Serialize)]
pub struct RoutedAnswer {
    pub envelope: AnswerEnvelope,
    pub states: Vec<RouterState>,
    pub attempts: Vec<EngineAttempt>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RouterStats {
    pub strategy: String,
    pub strategy_description: String,
    pub snapshot: SnapshotInfo,
    pub structured_engine: String,
    pub structured_available: bool,
    pub generator: String,
    pub semantic_routing: bool,
    pub methods: Vec<String>,
}

struct Trace {
    states: Vec<RouterState>,
    attempts: Vec<EngineAttempt>,
}

impl Trace {
    fn new() -> Self {
        Self {
            states: vec![RouterState::Start],
            attempts: Vec::new(),
        }
    }

    fn enter(&mut self, state: RouterState) {
        debug!(?state, "router transition");
        self.states.push(state);
    }
}

/// What an engine produced, before timing and metadata are attached.
struct Draft {
    answer: String,
    sources: RetrievalResult,
    confidence: Confidence,
    method: EngineKind,
}

pub struct EngineRouter {
    retrieval: Arc<RetrievalEngine>,
    structured: Arc<dyn StructuredQueryEngine>,
    generator: Arc<dyn AnswerGenerator>,
    classifier: Option<QuestionClassifier>,
    config: RouterConfig,
}

impl EngineRouter {
    pub fn new(
        retrieval: Arc<RetrievalEngine>,
        structured: Arc<dyn StructuredQueryEngine>,
        generator: Arc<dyn AnswerGenerator>,
        config: RouterConfig,
    ) -> Result<Self, RetrievalError> {
        if config.structured_time_budget.is_zero() {
            return Err(RetrievalError::configuration(
                "structured time budget must be greater than zero",
            ));
        }
        if config.max_passages == 0 {
            return Err(RetrievalError::configuration(
                "max_passages must be at least 1",
            ));
        }
        let classifier = if config.semantic_routing {
            Some(QuestionClassifier::new()?)
        } else {
            None
        };
        Ok(Self {
            retrieval,
            structured,
            generator,
            classifier,
            config,
        })
    }

    pub fn retrieval(&self) -> &Arc<RetrievalEngine> {
        &self.retrieval
    }

    /// Answer `question` with the engines `method` allows. Never fails.
    pub async fn ask(&self, question: &str, method: AskMethod) -> AnswerEnvelope {
        self.ask_traced(question, method).await.envelope
    }

    /// Like [`ask`](Self::ask), also returning visited states and attempts.
    pub async fn ask_traced(&self, question: &str, method: AskMethod) -> RoutedAnswer {
        let started = Instant::now();
        let mut trace = Trace::new();

        let draft = match method {
            AskMethod::Structured => {
                trace.enter(RouterState::StructuredAttempted);
                match self.attempt_structured(question, &mut trace).await {
                    Ok(outcome) => Self::structured_draft(outcome),
                    Err(reason) => Draft {
                        answer: reason,
                        sources: RetrievalResult::empty(),
                        confidence: Confidence::Low,
                        method: EngineKind::Structured,
                    },
                }
            }
            AskMethod::Retrieval => {
                trace.enter(RouterState::RetrievalAttempted);
                self.attempt_retrieval(question, &mut trace).await
            }
            AskMethod::Auto => {
                if self.skips_structured(question) {
                    debug!("semantic question, skipping structured engine");
                    trace.enter(RouterState::RetrievalAttempted);
                    self.attempt_retrieval(question, &mut trace).await
                } else {
                    trace.enter(RouterState::StructuredAttempted);
                    match self.attempt_structured(question, &mut trace).await {
                        Ok(outcome) => Self::structured_draft(outcome),
                        Err(_) => {
                            trace.enter(RouterState::RetrievalAttempted);
                            self.attempt_retrieval(question, &mut trace).await
                        }
                    }
                }
            }
        };

        trace.enter(RouterState::Done(draft.method));
        let execution_time = started.elapsed();
        info!(
            method = %method,
            method_used = %draft.method,
            confidence = %draft.confidence,
            sources = draft.sources.len(),
            elapsed_ms = execution_time.as_millis() as u64,
            "question answered"
        );

        RoutedAnswer {
            envelope: AnswerEnvelope {
                question: question.to_string(),
                answer: draft.answer,
                sources: draft.sources,
                confidence: draft.confidence,
                method_used: draft.method,
                execution_time,
                timestamp: Utc::now(),
            },
            states: trace.states,
            attempts: trace.attempts,
        }
    }

    pub fn stats(&self) -> RouterStats {
        RouterStats {
            strategy: self.retrieval.strategy_name().to_string(),
            strategy_description: self.retrieval.strategy_description(),
            snapshot: self.retrieval.snapshot_info(),
            structured_engine: self.structured.name().to_string(),
            structured_available: self.structured.is_available(),
            generator: self.generator.name().to_string(),
            semantic_routing: self.config.semantic_routing,
            methods: [AskMethod::Auto, AskMethod::Structured, AskMethod::Retrieval]
                .iter()
                .map(|m| m.to_string())
                .collect(),
        }
    }

    fn skips_structured(&self, question: &str) -> bool {
        self.classifier
            .as_ref()
            .is_some_and(|c| c.classify(question) == QuestionKind::Semantic)
    }

    fn structured_draft(outcome: StructuredOutcome) -> Draft {
        Draft {
            answer: outcome.answer,
            sources: RetrievalResult::empty(),
            confidence: outcome.confidence,
            method: EngineKind::Structured,
        }
    }

    /// One bounded structured attempt. `Err` carries the failure reason.
    async fn attempt_structured(
        &self,
        question: &str,
        trace: &mut Trace,
    ) -> Result<StructuredOutcome, String> {
        let budget = self.config.structured_time_budget;
        let started = Instant::now();
        let result =
            match tokio::time::timeout(budget, self.structured.answer(question)).await {
                Err(_) => Err(format!(
                    "structured engine exceeded its time budget of {:.1}s",
                    budget.as_secs_f64()
                )),
                Ok(Err(e)) => Err(format!("structured engine error: {:#}", e)),
                Ok(Ok(outcome)) if !outcome.succeeded => Err(outcome.failure_reason()),
                Ok(Ok(outcome)) if outcome.answer.trim().is_empty() => {
                    Err("structured engine returned an empty answer".to_string())
                }
                Ok(Ok(outcome)) if outcome.answer.starts_with(STRUCTURED_ERROR_PREFIX) => {
                    Err(outcome.answer.clone())
                }
                Ok(Ok(outcome)) => Ok(outcome),
            };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => {
                debug!(engine = self.structured.name(), elapsed_ms, "structured attempt succeeded");
                trace
                    .attempts
                    .push(EngineAttempt::succeeded(EngineKind::Structured));
            }
            Err(reason) => {
                info!(
                    engine = self.structured.name(),
                    elapsed_ms,
                    reason = %reason,
                    "structured attempt failed"
                );
                trace
                    .attempts
                    .push(EngineAttempt::failed(EngineKind::Structured, reason.clone()));
            }
        }
        result
    }

    async fn attempt_retrieval(&self, question: &str, trace: &mut Trace) -> Draft {
        let low = |answer: &str, sources: RetrievalResult| Draft {
            answer: answer.to_string(),
            sources,
            confidence: Confidence::Low,
            method: EngineKind::Retrieval,
        };

        let result = match self.retrieval.search(&Query::new(question), None).await {
            Ok(result) => result,
            Err(err) => {
                warn!(error = %err, "retrieval failed");
                trace
                    .attempts
                    .push(EngineAttempt::failed(EngineKind::Retrieval, err.to_string()));
                let answer = match err {
                    RetrievalError::IndexUnavailable => INSUFFICIENT_CONTEXT_ANSWER,
                    _ => NO_ANSWER,
                };
                return low(answer, RetrievalResult::empty());
            }
        };

        if result.is_empty() {
            trace
                .attempts
                .push(EngineAttempt::succeeded(EngineKind::Retrieval));
            return low(INSUFFICIENT_CONTEXT_ANSWER, result);
        }

        let context = GenerationContext::new(question, &result, self.config.max_passages);
        match self.generator.generate(&context).await {
            Ok(answer) if !answer.trim().is_empty() => {
                trace
                    .attempts
                    .push(EngineAttempt::succeeded(EngineKind::Retrieval));
                Draft {
                    answer,
                    confidence: confidence_for_sources(result.len()),
                    sources: result,
                    method: EngineKind::Retrieval,
                }
            }
            Ok(_) => {
                warn!(generator = self.generator.name(), "generator returned an empty answer");
                trace.attempts.push(EngineAttempt::failed(
                    EngineKind::Retrieval,
                    "generator returned an empty answer",
                ));
                low(NO_ANSWER, result)
            }
            Err(e) => {
                warn!(generator = self.generator.name(), error = %e, "answer generation failed");
                trace.attempts.push(EngineAttempt::failed(
                    EngineKind::Retrieval,
                    format!("answer generation failed: {:#}", e),
                ));
                low(NO_ANSWER, result)
            }
        }
    }
}
