use async_trait::async_trait;
use tracing::debug;

use crate::config::{StrategyConfig, TOP_K};
use crate::error::RetrievalError;
use crate::models::{Query, RetrievalResult};
use crate::store::VectorStore;

use super::RetrievalStrategy;

/// Plain top-k similarity search: one backend call, no quality filter.
#[derive(Debug, Default, Clone, Copy)]
pub struct TopKStrategy;

#[async_trait]
impl RetrievalStrategy for TopKStrategy {
    fn name(&self) -> &str {
        TOP_K
    }

    fn description(&self, config: &StrategyConfig) -> String {
        format!(
            "Top-K strategy: return the {} most similar passages, no quality filtering",
            config.top_k
        )
    }

    fn search_limit(&self, config: &StrategyConfig) -> usize {
        config.top_k
    }

    fn expected_result_count(&self, config: &StrategyConfig) -> (usize, usize) {
        (config.top_k, config.top_k)
    }

    fn honors_limit_override(&self) -> bool {
        true
    }

    async fn execute(
        &self,
        query: &Query,
        store: &dyn VectorStore,
        config: &StrategyConfig,
    ) -> Result<RetrievalResult, RetrievalError> {
        let candidates = store.similarity_search(query.text(), config.top_k).await?;
        debug!(top_k = config.top_k, returned = candidates.len(), "top_k search");
        Ok(RetrievalResult::from_candidates(candidates, config.top_k))
    }
}
