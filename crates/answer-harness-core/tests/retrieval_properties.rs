use std::sync::Arc;

use answer_harness_core::answer::ExtractiveGenerator;
use answer_harness_core::config::StrategyConfig;
use answer_harness_core::embedding::HashingEmbedder;
use answer_harness_core::engine::RetrievalEngine;
use answer_harness_core::models::{
    AskMethod, Candidate, Confidence, Document, Metadata, Query, RetrievalResult,
};
use answer_harness_core::router::{EngineRouter, RouterConfig};
use answer_harness_core::store::memory::InMemoryVectorStore;
use answer_harness_core::store::{SnapshotInfo, VectorStore};
use answer_harness_core::strategy::{RetrievalStrategy, StrategyRegistry};
use answer_harness_core::structured::UnavailableStructuredEngine;
use answer_harness_core::RetrievalError;
use async_trait::async_trait;
use proptest::prelude::*;

/// Store with fixed similarities, emitted best first with stable ties.
struct ScoredStore {
    scores: Vec<f64>,
}

#[async_trait]
impl VectorStore for ScoredStore {
    async fn similarity_search(
        &self,
        _query: &str,
        limit: usize,
    ) -> Result<Vec<Candidate>, RetrievalError> {
        if self.scores.is_empty() {
            return Err(RetrievalError::IndexUnavailable);
        }
        let mut out: Vec<Candidate> = self
            .scores
            .iter()
            .enumerate()
            .map(|(i, s)| Candidate::new(format!("doc-{}", i), Metadata::new(), *s))
            .collect();
        out.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap());
        out.truncate(limit);
        Ok(out)
    }

    fn document_count(&self) -> usize {
        self.scores.len()
    }

    fn snapshot_info(&self) -> SnapshotInfo {
        SnapshotInfo::empty()
    }

    async fn rebuild(&self, _documents: Vec<Document>) -> Result<SnapshotInfo, RetrievalError> {
        Err(RetrievalError::configuration("read-only store"))
    }
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn search(scores: &[f64], config: StrategyConfig) -> RetrievalResult {
    let store = Arc::new(ScoredStore {
        scores: scores.to_vec(),
    });
    let engine = RetrievalEngine::new(store, &StrategyRegistry::with_builtins(), config).unwrap();
    runtime()
        .block_on(engine.search(&Query::new("q"), None))
        .unwrap()
}

fn sorted_desc(scores: &[f64]) -> Vec<f64> {
    let mut s = scores.to_vec();
    s.sort_by(|a, b| b.partial_cmp(a).unwrap());
    s
}

fn is_non_increasing(result: &RetrievalResult) -> bool {
    result
        .as_slice()
        .windows(2)
        .all(|w| w[0].similarity >= w[1].similarity)
}

fn score_sets() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.0f64..=1.0, 1..120)
}

fn hybrid_config() -> impl Strategy<Value = StrategyConfig> {
    (0.1f64..=0.95, 10usize..=100, 1usize..=10)
        .prop_map(|(threshold, max_search, min_results)| {
            StrategyConfig::hybrid(threshold, max_search, min_results)
        })
}

proptest! {
    #[test]
    fn top_k_returns_min_of_k_and_corpus(scores in score_sets(), k in 1usize..150) {
        let result = search(&scores, StrategyConfig::top_k(k));
        prop_assert_eq!(result.len(), k.min(scores.len()));
        prop_assert!(is_non_increasing(&result));
    }

    #[test]
    fn hybrid_never_empty_on_non_empty_corpus(scores in score_sets(), config in hybrid_config()) {
        let result = search(&scores, config.clone());
        prop_assert!(!result.is_empty());
        prop_assert!(result.len() >= config.min_results_with_threshold.min(scores.len()));
        prop_assert!(result.len() <= config.max_search_with_threshold);
        prop_assert!(is_non_increasing(&result));
    }

    #[test]
    fn hybrid_quality_first_or_exact_fallback(scores in score_sets(), config in hybrid_config()) {
        let fetched: Vec<f64> = sorted_desc(&scores)
            .into_iter()
            .take(config.max_search_with_threshold)
            .collect();
        let qualified = fetched
            .iter()
            .filter(|s| **s >= config.similarity_threshold)
            .count();
        let result = search(&scores, config.clone());
        let sims: Vec<f64> = result.iter().map(|c| c.similarity).collect();

        if qualified >= config.min_results_with_threshold {
            prop_assert_eq!(sims.len(), qualified);
            prop_assert!(sims.iter().all(|s| *s >= config.similarity_threshold));
        } else {
            let expected: Vec<f64> = fetched
                .into_iter()
                .take(config.min_results_with_threshold)
                .collect();
            prop_assert_eq!(sims, expected);
        }
    }

    #[test]
    fn results_respect_cap_and_identity(
        scores in prop::collection::vec(0.0f64..=1.0, 0..50),
        cap in 0usize..60,
    ) {
        // Every other candidate duplicates its predecessor's content.
        let candidates: Vec<Candidate> = scores
            .iter()
            .enumerate()
            .map(|(i, s)| Candidate::new(format!("doc-{}", i / 2), Metadata::new(), *s))
            .collect();
        let result = RetrievalResult::from_candidates(candidates, cap);
        prop_assert!(result.len() <= cap);
        prop_assert!(is_non_increasing(&result));
        let mut contents: Vec<&str> = result.iter().map(|c| c.content.as_str()).collect();
        let before = contents.len();
        contents.sort_unstable();
        contents.dedup();
        prop_assert_eq!(contents.len(), before);
    }

    #[test]
    fn rebuild_with_same_documents_is_idempotent(
        texts in prop::collection::vec("[a-z]{1,10}( [a-z]{1,10}){0,6}", 1..20),
        query in "[a-z]{1,10}( [a-z]{1,10}){0,3}",
    ) {
        let rt = runtime();
        let store = Arc::new(InMemoryVectorStore::new(Arc::new(HashingEmbedder::new(64))));
        let engine = RetrievalEngine::new(
            store,
            &StrategyRegistry::with_builtins(),
            StrategyConfig::top_k(10),
        )
        .unwrap();
        let docs: Vec<Document> = texts.iter().map(Document::new).collect();
        let query = Query::new(query);

        let first_info = rt.block_on(engine.rebuild(docs.clone())).unwrap();
        let first = rt.block_on(engine.search(&query, None)).unwrap();
        let second_info = rt.block_on(engine.rebuild(docs)).unwrap();
        let second = rt.block_on(engine.search(&query, None)).unwrap();

        prop_assert_eq!(first_info.fingerprint, second_info.fingerprint);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn duplicate_documents_do_not_shrink_results(
        texts in prop::collection::vec("[a-e]{1,3}( [a-e]{1,3}){0,2}", 1..12),
        repeats in prop::collection::vec(1usize..4, 12),
        k in 1usize..20,
        min_results in 1usize..10,
    ) {
        // Each text appears 1-3 times in a row.
        let docs: Vec<Document> = texts
            .iter()
            .zip(&repeats)
            .flat_map(|(t, n)| std::iter::repeat(Document::new(t.as_str())).take(*n))
            .collect();
        let mut distinct: Vec<&str> = texts.iter().map(String::as_str).collect();
        distinct.sort_unstable();
        distinct.dedup();
        let distinct = distinct.len();

        let rt = runtime();
        let store = Arc::new(InMemoryVectorStore::new(Arc::new(HashingEmbedder::new(64))));
        let info = rt.block_on(store.rebuild(docs)).unwrap();
        prop_assert_eq!(info.document_count, distinct);

        let query = Query::new("a b c");
        let registry = StrategyRegistry::with_builtins();
        for config in [
            StrategyConfig::top_k(k),
            StrategyConfig::hybrid(0.95, 10, min_results),
        ] {
            let engine = RetrievalEngine::new(store.clone(), &registry, config.clone()).unwrap();
            let result = rt.block_on(engine.search(&query, None)).unwrap();
            let (min, _) = engine.strategy().expected_result_count(&config);
            prop_assert!(result.len() >= min.min(distinct));
            if config.strategy == "top_k" {
                prop_assert_eq!(result.len(), k.min(distinct));
            }
        }
    }

    #[test]
    fn auto_ask_always_yields_an_envelope(
        question in ".{0,80}",
        scores in prop::collection::vec(0.0f64..=1.0, 0..10),
    ) {
        let engine = RetrievalEngine::new(
            Arc::new(ScoredStore { scores }),
            &StrategyRegistry::with_builtins(),
            StrategyConfig::default(),
        )
        .unwrap();
        let router = EngineRouter::new(
            Arc::new(engine),
            Arc::new(UnavailableStructuredEngine),
            Arc::new(ExtractiveGenerator),
            RouterConfig::default(),
        )
        .unwrap();

        let envelope = runtime().block_on(router.ask(&question, AskMethod::Auto));
        prop_assert!(!envelope.answer.is_empty());
        prop_assert_eq!(envelope.question, question);
        if envelope.sources.is_empty() {
            prop_assert_eq!(envelope.confidence, Confidence::Low);
        }
    }
}
