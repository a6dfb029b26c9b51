//! Vector store abstraction for Answer Harness.
//!
//! The [`VectorStore`] trait is the only surface the strategies and the
//! engine see of the similarity-search backend, enabling pluggable
//! backends (in-memory snapshots, remote vector databases).
//!
//! Implementations must be `Send + Sync` to work with async runtimes, and
//! must swap index contents atomically on rebuild: a reader sees either the
//! old snapshot or the new one, never a mix.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashSet;

use crate::error::RetrievalError;
use crate::models::{Candidate, Document};

/// Description of the snapshot a store is currently serving.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotInfo {
    pub document_count: usize,
    /// SHA-256 over the ordered documents, hex-encoded.
    pub fingerprint: String,
    /// `None` until the first rebuild.
    pub built_at: Option<DateTime<Utc>>,
}

impl SnapshotInfo {
    pub fn empty() -> Self {
        Self {
            document_count: 0,
            fingerprint: fingerprint(&[]),
            built_at: None,
        }
    }
}

/// Abstract similarity-search backend.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`similarity_search`](VectorStore::similarity_search) | Scored candidates for a query, best first |
/// | [`document_count`](VectorStore::document_count) | Size of the current snapshot |
/// | [`snapshot_info`](VectorStore::snapshot_info) | Count, fingerprint, and build time |
/// | [`rebuild`](VectorStore::rebuild) | Atomically replace the indexed documents |
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Return at most `limit` distinct candidates, sorted non-increasing by
    /// similarity.
    ///
    /// Deterministic for a fixed snapshot and query. Fails with
    /// [`RetrievalError::IndexUnavailable`] when nothing is indexed and with
    /// [`RetrievalError::Backend`] on I/O failure. Zero relevant results is
    /// an `Ok` with an empty vector.
    async fn similarity_search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Candidate>, RetrievalError>;

    /// Number of documents in the current snapshot.
    fn document_count(&self) -> usize;

    /// Metadata about the current snapshot.
    fn snapshot_info(&self) -> SnapshotInfo;

    /// Replace the indexed contents with `documents`.
    ///
    /// Documents with the same content and metadata are indexed once (see
    /// [`distinct_documents`]); the reported count is of distinct entries.
    /// Runs to completion or fails without touching the current snapshot.
    /// A concurrent call fails fast with [`RetrievalError::RebuildInProgress`].
    async fn rebuild(&self, documents: Vec<Document>) -> Result<SnapshotInfo, RetrievalError>;
}

/// Reject documents a backend cannot index.
pub fn validate_documents(documents: &[Document]) -> Result<(), RetrievalError> {
    for (index, doc) in documents.iter().enumerate() {
        if doc.content.trim().is_empty() {
            return Err(RetrievalError::MalformedDocument {
                index,
                reason: "content must not be empty".to_string(),
            });
        }
        if let Some(id) = &doc.id {
            if id.trim().is_empty() {
                return Err(RetrievalError::MalformedDocument {
                    index,
                    reason: "id must not be blank when present".to_string(),
                });
            }
        }
        if doc.metadata.keys().any(|k| k.trim().is_empty()) {
            return Err(RetrievalError::MalformedDocument {
                index,
                reason: "metadata keys must not be empty".to_string(),
            });
        }
    }
    Ok(())
}

/// Collapse documents with equal content and metadata, first occurrence wins.
pub fn distinct_documents(mut documents: Vec<Document>) -> Vec<Document> {
    let mut seen = HashSet::new();
    documents.retain(|d| seen.insert(d.identity_key()));
    documents
}

/// Stable fingerprint of an ordered document set.
pub fn fingerprint(documents: &[Document]) -> String {
    let mut hasher = Sha256::new();
    for doc in documents {
        hasher.update(doc.id.as_deref().unwrap_or("").as_bytes());
        hasher.update([0x1f]);
        hasher.update(doc.content.as_bytes());
        hasher.update([0x1f]);
        hasher.update(serde_json::to_string(&doc.metadata).unwrap_or_default().as_bytes());
        hasher.update([0x1e]);
    }
    hex::encode(hasher.finalize())
}
