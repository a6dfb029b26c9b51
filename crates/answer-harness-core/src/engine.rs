//! Retrieval engine: one store, one strategy, chosen once per configuration.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::{StrategyConfig, TOP_K_RANGE};
use crate::error::RetrievalError;
use crate::models::{Document, Query, RetrievalResult};
use crate::store::{SnapshotInfo, VectorStore};
use crate::strategy::{RetrievalStrategy, StrategyRegistry};

/// Runs searches through the configured strategy and owns index rebuilds.
pub struct RetrievalEngine {
    store: Arc<dyn VectorStore>,
    strategy: Box<dyn RetrievalStrategy>,
    config: StrategyConfig,
}

impl RetrievalEngine {
    /// Resolve `config.strategy` through `registry` and validate `config`.
    pub fn new(
        store: Arc<dyn VectorStore>,
        registry: &StrategyRegistry,
        config: StrategyConfig,
    ) -> Result<Self, RetrievalError> {
        let strategy = registry.create_for(&config)?;
        debug!(
            strategy = strategy.name(),
            description = %strategy.description(&config),
            "retrieval engine ready"
        );
        Ok(Self {
            store,
            strategy,
            config,
        })
    }

    pub fn strategy(&self) -> &dyn RetrievalStrategy {
        self.strategy.as_ref()
    }

    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    pub fn strategy_description(&self) -> String {
        self.strategy.description(&self.config)
    }

    pub fn snapshot_info(&self) -> SnapshotInfo {
        self.store.snapshot_info()
    }

    /// Search with the configured strategy.
    ///
    /// `top_k` replaces the configured result cap only for strategies that
    /// honor limit overrides (top-k); hybrid ignores it. A backend error is
    /// retried once, immediately.
    pub async fn search(
        &self,
        query: &Query,
        top_k: Option<usize>,
    ) -> Result<RetrievalResult, RetrievalError> {
        if query.is_blank() {
            return Err(RetrievalError::invalid_request("query must not be empty"));
        }
        let config = self.effective_config(top_k)?;

        let result = match self.strategy.execute(query, self.store.as_ref(), &config).await {
            Err(err) if err.is_transient() => {
                warn!(error = %err, strategy = self.strategy.name(), "retrying search once");
                self.strategy
                    .execute(query, self.store.as_ref(), &config)
                    .await?
            }
            other => other?,
        };

        // Strategies build results through `from_candidates`; re-applying the
        // cap covers extension strategies that hand back wider results.
        let cap = self.strategy.search_limit(&config);
        let result = if result.len() > cap {
            RetrievalResult::from_candidates(result.into_vec(), cap)
        } else {
            result
        };

        debug!(
            strategy = self.strategy.name(),
            results = result.len(),
            top_similarity = ?result.top_similarity(),
            "search complete"
        );
        Ok(result)
    }

    /// Atomically replace the indexed documents.
    pub async fn rebuild(&self, documents: Vec<Document>) -> Result<SnapshotInfo, RetrievalError> {
        self.store.rebuild(documents).await
    }

    fn effective_config(&self, top_k: Option<usize>) -> Result<StrategyConfig, RetrievalError> {
        let Some(k) = top_k else {
            return Ok(self.config.clone());
        };
        if !self.strategy.honors_limit_override() {
            debug!(
                top_k = k,
                strategy = self.strategy.name(),
                "top_k override ignored by strategy"
            );
            return Ok(self.config.clone());
        }
        let (lo, hi) = TOP_K_RANGE;
        if k < lo || k > hi {
            return Err(RetrievalError::invalid_request(format!(
                "top_k must be between {} and {}, got {}",
                lo, hi, k
            )));
        }
        Ok(StrategyConfig {
            top_k: k,
            ..self.config.clone()
        })
    }
}
