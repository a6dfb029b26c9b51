//! Retrieval strategies: how a raw candidate stream becomes a final result.
//!
//! A strategy is chosen once per configuration through the
//! [`StrategyRegistry`] and then invoked for every search.
//!
//! | Strategy | Backend call | Result |
//! |----------|--------------|--------|
//! | [`TopKStrategy`] | `k = top_k` | exactly `min(top_k, N)` candidates, unfiltered |
//! | [`HybridStrategy`] | `k = max_search_with_threshold` | every candidate `>= threshold`, or the top `min_results_with_threshold` as fallback |
//!
//! Strategy logic is pure computation over fetched candidates; the only
//! suspension point is the store call.

mod hybrid;
mod registry;
mod top_k;

pub use hybrid::{apply_hybrid_policy, HybridPath, HybridSelection, HybridStrategy};
pub use registry::{StrategyConstructor, StrategyRegistry};
pub use top_k::TopKStrategy;

use async_trait::async_trait;

use crate::config::StrategyConfig;
use crate::error::RetrievalError;
use crate::models::{Query, RetrievalResult};
use crate::store::VectorStore;

/// A named retrieval policy.
#[async_trait]
pub trait RetrievalStrategy: Send + Sync {
    /// Registry name, e.g. `"hybrid"`.
    fn name(&self) -> &str;

    /// One-line summary of the policy under `config`.
    fn description(&self, config: &StrategyConfig) -> String;

    /// Strategy-specific checks on top of [`StrategyConfig::validate`].
    fn validate_config(&self, config: &StrategyConfig) -> Result<(), RetrievalError> {
        config.validate()
    }

    /// The `limit` this strategy passes to the store.
    fn search_limit(&self, config: &StrategyConfig) -> usize;

    /// Result count range `(min, max)` on a corpus large enough to fill it.
    fn expected_result_count(&self, config: &StrategyConfig) -> (usize, usize);

    /// Whether a per-request `top_k` override replaces `config.top_k`.
    fn honors_limit_override(&self) -> bool {
        false
    }

    /// Run the policy against `store`.
    async fn execute(
        &self,
        query: &Query,
        store: &dyn VectorStore,
        config: &StrategyConfig,
    ) -> Result<RetrievalResult, RetrievalError>;
}
