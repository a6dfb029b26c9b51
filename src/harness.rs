//! Wiring: configuration in, a ready [`EngineRouter`] out.
//!
//! [`Harness`] is what the CLI commands and the HTTP server share. It owns
//! the in-memory vector store (through the retrieval engine), the
//! structured engine, and the answer generator selected by the config, and
//! loads `[corpus].path` into the index on startup.
//!
//! Custom binaries can swap collaborators or register extra retrieval
//! strategies through [`Extensions`]:
//!
//! ```rust,no_run
//! use answer_harness::config::Config;
//! use answer_harness::harness::{Extensions, Harness};
//!
//! # async fn example(config: &Config) -> anyhow::Result<()> {
//! let mut extensions = Extensions::default();
//! // extensions.registry.register("mmr", |_| Ok(Box::new(MyMmr)));
//! let harness = Harness::with_extensions(config, extensions).await?;
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use answer_harness_core::answer::AnswerGenerator;
use answer_harness_core::config::StrategyConfig;
use answer_harness_core::embedding::EmbeddingProvider;
use answer_harness_core::engine::RetrievalEngine;
use answer_harness_core::models::{AnswerEnvelope, AskMethod, Document, Query, RetrievalResult};
use answer_harness_core::router::{EngineRouter, RouterStats};
use answer_harness_core::store::memory::InMemoryVectorStore;
use answer_harness_core::store::SnapshotInfo;
use answer_harness_core::strategy::StrategyRegistry;
use answer_harness_core::structured::StructuredQueryEngine;
use answer_harness_core::RetrievalError;
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::corpus::load_corpus;
use crate::embedding::create_provider;
use crate::generator::create_generator;
use crate::structured::create_structured_engine;

/// Overrides for the collaborators [`Harness::from_config`] would build.
pub struct Extensions {
    /// Strategy table; starts with the built-ins.
    pub registry: StrategyRegistry,
    /// Replaces `[retrieval]`, e.g. to select a registered extension strategy.
    pub strategy: Option<StrategyConfig>,
    pub embedder: Option<Arc<dyn EmbeddingProvider>>,
    pub structured: Option<Arc<dyn StructuredQueryEngine>>,
    pub generator: Option<Arc<dyn AnswerGenerator>>,
}

impl Default for Extensions {
    fn default() -> Self {
        Self {
            registry: StrategyRegistry::with_builtins(),
            strategy: None,
            embedder: None,
            structured: None,
            generator: None,
        }
    }
}

pub struct Harness {
    config: Arc<Config>,
    router: Arc<EngineRouter>,
}

impl Harness {
    pub async fn from_config(config: &Config) -> Result<Self> {
        Self::with_extensions(config, Extensions::default()).await
    }

    pub async fn with_extensions(config: &Config, extensions: Extensions) -> Result<Self> {
        let embedder = match extensions.embedder {
            Some(embedder) => embedder,
            None => create_provider(&config.embedding)?,
        };
        let structured = match extensions.structured {
            Some(structured) => structured,
            None => create_structured_engine(&config.structured)?,
        };
        let generator = match extensions.generator {
            Some(generator) => generator,
            None => create_generator(&config.generation)?,
        };
        let strategy = extensions
            .strategy
            .unwrap_or_else(|| config.retrieval.strategy_config());

        let store = Arc::new(InMemoryVectorStore::new(embedder));
        let engine = RetrievalEngine::new(store, &extensions.registry, strategy)
            .context("Failed to create retrieval engine")?;
        let router = EngineRouter::new(
            Arc::new(engine),
            structured,
            generator,
            config.router_config(),
        )
        .context("Failed to create engine router")?;

        let harness = Self {
            config: Arc::new(config.clone()),
            router: Arc::new(router),
        };

        if config.corpus.path.is_some() {
            let info = harness.rebuild(None).await?;
            info!(
                documents = info.document_count,
                fingerprint = %info.fingerprint,
                "corpus indexed"
            );
        }
        Ok(harness)
    }

    pub fn router(&self) -> &Arc<EngineRouter> {
        &self.router
    }

    pub fn engine(&self) -> &RetrievalEngine {
        self.router.retrieval()
    }

    pub async fn search(
        &self,
        query: &str,
        top_k: Option<usize>,
    ) -> Result<RetrievalResult, RetrievalError> {
        self.engine().search(&Query::new(query), top_k).await
    }

    pub async fn ask(&self, question: &str, method: AskMethod) -> AnswerEnvelope {
        self.router.ask(question, method).await
    }

    /// Replace the index with `documents`, or reload `[corpus].path` when
    /// `None`.
    ///
    /// Errors from the index itself stay downcastable to [`RetrievalError`].
    pub async fn rebuild(&self, documents: Option<Vec<Document>>) -> Result<SnapshotInfo> {
        let documents = match documents {
            Some(documents) => documents,
            None => {
                let path = self.config.corpus.path.as_ref().ok_or_else(|| {
                    RetrievalError::invalid_request(
                        "no documents supplied and no [corpus].path configured",
                    )
                })?;
                load_corpus(path)?
            }
        };
        Ok(self.engine().rebuild(documents).await?)
    }

    pub fn stats(&self) -> RouterStats {
        self.router.stats()
    }
}
