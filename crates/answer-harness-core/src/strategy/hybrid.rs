//! Quality-first retrieval with a guaranteed non-empty fallback.
//!
//! 1. Fetch up to `max_search_with_threshold` candidates, best first.
//! 2. Keep those with `similarity >= similarity_threshold`.
//! 3. If at least `min_results_with_threshold` survive, return all of them.
//! 4. Otherwise return the first `min_results_with_threshold` unfiltered
//!    candidates, which may sit below the threshold.

use async_trait::async_trait;
use tracing::debug;

use crate::config::{StrategyConfig, HYBRID};
use crate::error::RetrievalError;
use crate::models::{distinct_candidates, Candidate, Query, RetrievalResult};
use crate::store::VectorStore;

use super::RetrievalStrategy;

/// Lowest threshold the hybrid policy accepts.
pub const MIN_HYBRID_THRESHOLD: f64 = 0.1;
/// Highest threshold the hybrid policy accepts.
pub const MAX_HYBRID_THRESHOLD: f64 = 0.95;

/// Which branch of the hybrid policy produced the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HybridPath {
    /// Enough candidates cleared the threshold.
    Qualified,
    /// Too few cleared it; the top unfiltered candidates were returned.
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HybridSelection {
    pub candidates: Vec<Candidate>,
    pub path: HybridPath,
    /// How many candidates cleared the threshold.
    pub qualified: usize,
}

/// Apply steps 2-4 to an already-fetched candidate list.
///
/// Repeated candidates are dropped before counting, so the fallback always
/// yields distinct entries.
pub fn apply_hybrid_policy(
    candidates: Vec<Candidate>,
    similarity_threshold: f64,
    min_results: usize,
) -> HybridSelection {
    let mut candidates = distinct_candidates(candidates);
    let qualified: Vec<Candidate> = candidates
        .iter()
        .filter(|c| c.similarity >= similarity_threshold)
        .cloned()
        .collect();
    let count = qualified.len();

    if count >= min_results {
        return HybridSelection {
            candidates: qualified,
            path: HybridPath::Qualified,
            qualified: count,
        };
    }

    candidates.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    candidates.truncate(min_results);
    HybridSelection {
        candidates,
        path: HybridPath::Fallback,
        qualified: count,
    }
}

/// Threshold filter over a wide search, with a top-N safety net.
#[derive(Debug, Default, Clone, Copy)]
pub struct HybridStrategy;

#[async_trait]
impl RetrievalStrategy for HybridStrategy {
    fn name(&self) -> &str {
        HYBRID
    }

    fn description(&self, config: &StrategyConfig) -> String {
        format!(
            "Hybrid strategy: search up to {} candidates, keep similarity >= {}, fall back to top {} if insufficient",
            config.max_search_with_threshold,
            config.similarity_threshold,
            config.min_results_with_threshold
        )
    }

    fn validate_config(&self, config: &StrategyConfig) -> Result<(), RetrievalError> {
        config.validate()?;
        if config.similarity_threshold < MIN_HYBRID_THRESHOLD {
            return Err(RetrievalError::configuration(format!(
                "similarity_threshold should be at least {} for hybrid strategy, got {}",
                MIN_HYBRID_THRESHOLD, config.similarity_threshold
            )));
        }
        if config.similarity_threshold > MAX_HYBRID_THRESHOLD {
            return Err(RetrievalError::configuration(format!(
                "similarity_threshold should not exceed {} for hybrid strategy, got {}",
                MAX_HYBRID_THRESHOLD, config.similarity_threshold
            )));
        }
        Ok(())
    }

    fn search_limit(&self, config: &StrategyConfig) -> usize {
        config.max_search_with_threshold
    }

    fn expected_result_count(&self, config: &StrategyConfig) -> (usize, usize) {
        (
            config.min_results_with_threshold,
            config.max_search_with_threshold,
        )
    }

    async fn execute(
        &self,
        query: &Query,
        store: &dyn VectorStore,
        config: &StrategyConfig,
    ) -> Result<RetrievalResult, RetrievalError> {
        let candidates = store
            .similarity_search(query.text(), config.max_search_with_threshold)
            .await?;
        let fetched = candidates.len();
        let selection = apply_hybrid_policy(
            candidates,
            config.similarity_threshold,
            config.min_results_with_threshold,
        );
        debug!(
            fetched,
            qualified = selection.qualified,
            returned = selection.candidates.len(),
            path = ?selection.path,
            "hybrid search"
        );
        Ok(RetrievalResult::from_candidates(
            selection.candidates,
            config.max_search_with_threshold,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Metadata;
    use crate::testing::{sims, FixedStore};

    fn scenario_config() -> StrategyConfig {
        StrategyConfig::hybrid(0.7, 100, 1)
    }

    async fn run(scores: &[f64], config: &StrategyConfig) -> RetrievalResult {
        HybridStrategy
            .execute(&Query::new("q"), &FixedStore::with_scores(scores), config)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_quality_candidates_returned() {
        let result = run(&[0.9, 0.75, 0.4], &scenario_config()).await;
        assert_eq!(sims(result.as_slice()), vec![0.9, 0.75]);
    }

    #[tokio::test]
    async fn test_fallback_returns_top_min_results() {
        let result = run(&[0.5, 0.3, 0.2], &scenario_config()).await;
        assert_eq!(sims(result.as_slice()), vec![0.5]);
    }

    #[tokio::test]
    async fn test_threshold_is_inclusive() {
        let result = run(&[0.7, 0.69], &scenario_config()).await;
        assert_eq!(sims(result.as_slice()), vec![0.7]);
    }

    #[test]
    fn test_fallback_counts_distinct_candidates() {
        let dup = |sim| Candidate::new("alpha beta", Metadata::new(), sim);
        let selection = apply_hybrid_policy(
            vec![
                dup(0.5),
                dup(0.5),
                Candidate::new("alpha gamma", Metadata::new(), 0.4),
            ],
            0.95,
            2,
        );
        assert_eq!(selection.path, HybridPath::Fallback);
        assert_eq!(sims(&selection.candidates), vec![0.5, 0.4]);
    }

    #[tokio::test]
    async fn test_qualified_set_not_truncated_to_min_results() {
        let cfg = StrategyConfig::hybrid(0.5, 100, 2);
        let result = run(&[0.9, 0.8, 0.7, 0.6, 0.1], &cfg).await;
        assert_eq!(result.len(), 4);
    }

    #[tokio::test]
    async fn test_fallback_when_qualified_below_minimum() {
        let cfg = StrategyConfig::hybrid(0.7, 100, 3);
        let result = run(&[0.9, 0.6, 0.5, 0.4], &cfg).await;
        assert_eq!(sims(result.as_slice()), vec![0.9, 0.6, 0.5]);
    }

    #[tokio::test]
    async fn test_fallback_with_fewer_candidates_than_minimum() {
        let cfg = StrategyConfig::hybrid(0.9, 100, 5);
        let result = run(&[0.3, 0.2], &cfg).await;
        assert_eq!(result.len(), 2);
    }

    #[tokio::test]
    async fn test_searches_with_max_search_limit() {
        let store = FixedStore::with_scores(&[0.9]);
        HybridStrategy
            .execute(&Query::new("q"), &store, &StrategyConfig::hybrid(0.7, 40, 1))
            .await
            .unwrap();
        assert_eq!(store.last_limit(), Some(40));
    }

    #[tokio::test]
    async fn test_empty_corpus_has_no_fallback() {
        let err = HybridStrategy
            .execute(&Query::new("q"), &FixedStore::empty(), &scenario_config())
            .await
            .unwrap_err();
        assert_eq!(err, RetrievalError::IndexUnavailable);
    }

    #[test]
    fn test_policy_reports_path() {
        let c = |s| Candidate::new("x", Default::default(), s);
        let sel = apply_hybrid_policy(vec![c(0.9), c(0.8)], 0.7, 1);
        assert_eq!(sel.path, HybridPath::Qualified);
        assert_eq!(sel.qualified, 2);

        let sel = apply_hybrid_policy(vec![c(0.5)], 0.7, 1);
        assert_eq!(sel.path, HybridPath::Fallback);
        assert_eq!(sel.qualified, 0);
    }

    #[test]
    fn test_policy_fallback_keeps_tie_order() {
        let c = |name: &str, s| Candidate::new(name, Default::default(), s);
        let sel = apply_hybrid_policy(vec![c("a", 0.4), c("b", 0.4), c("c", 0.4)], 0.7, 2);
        let names: Vec<&str> = sel.candidates.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_hybrid_threshold_bounds() {
        assert!(HybridStrategy
            .validate_config(&StrategyConfig::hybrid(0.05, 100, 1))
            .is_err());
        assert!(HybridStrategy
            .validate_config(&StrategyConfig::hybrid(0.96, 100, 1))
            .is_err());
        HybridStrategy
            .validate_config(&StrategyConfig::hybrid(0.1, 100, 1))
            .unwrap();
    }

    #[test]
    fn test_description_and_expected_range() {
        let cfg = StrategyConfig::hybrid(0.8, 150, 5);
        assert_eq!(
            HybridStrategy.description(&cfg),
            "Hybrid strategy: search up to 150 candidates, keep similarity >= 0.8, fall back to top 5 if insufficient"
        );
        assert_eq!(HybridStrategy.expected_result_count(&cfg), (5, 150));
        assert!(!HybridStrategy.honors_limit_override());
    }
}
