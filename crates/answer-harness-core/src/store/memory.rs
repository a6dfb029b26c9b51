//! In-memory [`VectorStore`] built from immutable snapshots.
//!
//! The current snapshot lives behind `RwLock<Arc<Snapshot>>`. Readers hold
//! the lock only long enough to clone the `Arc`; rebuild embeds everything
//! off to the side and then exchanges the pointer. Vector search is
//! brute-force cosine similarity over the snapshot.

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::embedding::{relevance_score, EmbeddingProvider};
use crate::error::RetrievalError;
use crate::models::{Candidate, Document, Metadata};

use super::{distinct_documents, fingerprint, validate_documents, SnapshotInfo, VectorStore};

struct StoredVector {
    content: String,
    metadata: Metadata,
    vector: Vec<f32>,
}

struct Snapshot {
    entries: Vec<StoredVector>,
    info: SnapshotInfo,
}

/// Snapshot-swapping in-memory store.
pub struct InMemoryVectorStore {
    embedder: Arc<dyn EmbeddingProvider>,
    current: RwLock<Arc<Snapshot>>,
    rebuild_lock: Mutex<()>,
}

impl InMemoryVectorStore {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            embedder,
            current: RwLock::new(Arc::new(Snapshot {
                entries: Vec::new(),
                info: SnapshotInfo::empty(),
            })),
            rebuild_lock: Mutex::new(()),
        }
    }

    fn snapshot(&self) -> Arc<Snapshot> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn swap(&self, next: Snapshot) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(next);
    }

    async fn embed_all(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RetrievalError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let vectors = self
            .embedder
            .embed(texts)
            .await
            .map_err(|e| RetrievalError::backend(format!("embedding failed: {:#}", e)))?;
        if vectors.len() != texts.len() {
            return Err(RetrievalError::backend(format!(
                "embedding provider returned {} vectors for {} texts",
                vectors.len(),
                texts.len()
            )));
        }
        Ok(vectors)
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn similarity_search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Candidate>, RetrievalError> {
        let snapshot = self.snapshot();
        if snapshot.entries.is_empty() {
            return Err(RetrievalError::IndexUnavailable);
        }
        if limit == 0 {
            return Ok(Vec::new());
        }

        let query_vec = self
            .embed_all(&[query.to_string()])
            .await?
            .into_iter()
            .next()
            .unwrap_or_default();

        let mut candidates: Vec<Candidate> = snapshot
            .entries
            .iter()
            .map(|sv| Candidate {
                content: sv.content.clone(),
                metadata: sv.metadata.clone(),
                similarity: relevance_score(&query_vec, &sv.vector),
            })
            .collect();
        // Stable: equal scores keep index order.
        candidates.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        candidates.truncate(limit);

        debug!(
            limit,
            returned = candidates.len(),
            indexed = snapshot.entries.len(),
            "vector search"
        );
        Ok(candidates)
    }

    fn document_count(&self) -> usize {
        self.snapshot().entries.len()
    }

    fn snapshot_info(&self) -> SnapshotInfo {
        self.snapshot().info.clone()
    }

    async fn rebuild(&self, documents: Vec<Document>) -> Result<SnapshotInfo, RetrievalError> {
        let _guard = self
            .rebuild_lock
            .try_lock()
            .map_err(|_| RetrievalError::RebuildInProgress)?;

        validate_documents(&documents)?;
        let submitted = documents.len();
        let documents = distinct_documents(documents);
        if documents.len() < submitted {
            debug!(
                submitted,
                distinct = documents.len(),
                "collapsed duplicate documents"
            );
        }

        let texts: Vec<String> = documents.iter().map(|d| d.content.clone()).collect();
        let vectors = self.embed_all(&texts).await?;

        let info = SnapshotInfo {
            document_count: documents.len(),
            fingerprint: fingerprint(&documents),
            built_at: Some(Utc::now()),
        };
        let entries = documents
            .into_iter()
            .zip(vectors)
            .map(|(doc, vector)| StoredVector {
                content: doc.content,
                metadata: doc.metadata,
                vector,
            })
            .collect();

        self.swap(Snapshot {
            entries,
            info: info.clone(),
        });

        info!(
            documents = info.document_count,
            model = self.embedder.model_name(),
            fingerprint = %info.fingerprint,
            "vector index rebuilt"
        );
        Ok(info)
    }
}
