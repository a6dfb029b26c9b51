//! Test doubles shared by the unit tests in this crate.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::RetrievalError;
use crate::models::{Candidate, Document, Metadata};
use crate::store::{fingerprint, SnapshotInfo, VectorStore};

/// Store that replays fixed similarities, ignoring the query text.
pub struct FixedStore {
    candidates: Mutex<Vec<Candidate>>,
    failures_left: AtomicUsize,
    pub calls: AtomicUsize,
    pub limits: Mutex<Vec<usize>>,
}

impl FixedStore {
    pub fn with_scores(scores: &[f64]) -> Self {
        let candidates = scores
            .iter()
            .enumerate()
            .map(|(i, s)| Candidate::new(format!("doc-{}", i), Metadata::new(), *s))
            .collect();
        Self {
            candidates: Mutex::new(candidates),
            failures_left: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
            limits: Mutex::new(Vec::new()),
        }
    }

    pub fn empty() -> Self {
        Self::with_scores(&[])
    }

    /// Fail the next `n` searches with a backend error.
    pub fn failing(self, n: usize) -> Self {
        self.failures_left.store(n, Ordering::SeqCst);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_limit(&self) -> Option<usize> {
        self.limits.lock().unwrap().last().copied()
    }
}

#[async_trait]
impl VectorStore for FixedStore {
    async fn similarity_search(
        &self,
        _query: &str,
        limit: usize,
    ) -> Result<Vec<Candidate>, RetrievalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.limits.lock().unwrap().push(limit);
        if self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(RetrievalError::backend("simulated flake"));
        }
        let mut all = self.candidates.lock().unwrap().clone();
        if all.is_empty() {
            return Err(RetrievalError::IndexUnavailable);
        }
        all.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap());
        all.truncate(limit);
        Ok(all)
    }

    fn document_count(&self) -> usize {
        self.candidates.lock().unwrap().len()
    }

    fn snapshot_info(&self) -> SnapshotInfo {
        SnapshotInfo {
            document_count: self.document_count(),
            fingerprint: fingerprint(&[]),
            built_at: None,
        }
    }

    async fn rebuild(&self, documents: Vec<Document>) -> Result<SnapshotInfo, RetrievalError> {
        let candidates = documents
            .iter()
            .map(|d| Candidate::new(d.content.clone(), d.metadata.clone(), 0.5))
            .collect();
        *self.candidates.lock().unwrap() = candidates;
        Ok(SnapshotInfo {
            document_count: documents.len(),
            fingerprint: fingerprint(&documents),
            built_at: None,
        })
    }
}

pub fn sims(candidates: &[Candidate]) -> Vec<f64> {
    candidates.iter().map(|c| c.similarity).collect()
}
