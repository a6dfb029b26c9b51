//! Core data types shared by the store, strategies, engine, and router.
//!
//! These types are transport-agnostic and serialize with `serde`, so the
//! HTTP server and CLI can emit them directly.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// A scalar metadata value attached to a document or candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<&str> for MetadataValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<i64> for MetadataValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for MetadataValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for MetadataValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

/// Ordered metadata map. `BTreeMap` keeps serialization deterministic.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// A natural-language search request. One per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    text: String,
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// A document handed to `rebuild`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub content: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Document {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: None,
            content: content.into(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Same identity as the [`Candidate`] this document produces; `id` is not part of it.
    pub fn identity_key(&self) -> String {
        identity_key(&self.content, &self.metadata)
    }
}

/// One retrieved passage with its similarity score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub content: String,
    pub metadata: Metadata,
    /// Similarity in `[0.0, 1.0]`.
    pub similarity: f64,
}

impl Candidate {
    pub fn new(content: impl Into<String>, metadata: Metadata, similarity: f64) -> Self {
        Self {
            content: content.into(),
            metadata,
            similarity,
        }
    }

    /// Identity used for de-duplication: content plus metadata.
    pub fn identity_key(&self) -> String {
        identity_key(&self.content, &self.metadata)
    }
}

fn identity_key(content: &str, metadata: &Metadata) -> String {
    let meta = serde_json::to_string(metadata).unwrap_or_default();
    format!("{}\u{1f}{}", content, meta)
}

/// Drop repeated candidates, keeping the first occurrence and the order.
pub fn distinct_candidates(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    candidates.retain(|c| seen.insert(c.identity_key()));
    candidates
}

/// Final, ordered output of a search.
///
/// Sorted non-increasing by similarity, free of duplicates, and no longer
/// than the cap it was built with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RetrievalResult(Vec<Candidate>);

impl RetrievalResult {
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Build a result from strategy output, enforcing the invariants.
    ///
    /// The sort is stable, so equal scores keep the backend's emission order.
    pub fn from_candidates(mut candidates: Vec<Candidate>, cap: usize) -> Self {
        candidates.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let mut candidates = distinct_candidates(candidates);
        candidates.truncate(cap);
        Self(candidates)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Candidate> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Candidate] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<Candidate> {
        self.0
    }

    pub fn top_similarity(&self) -> Option<f64> {
        self.0.first().map(|c| c.similarity)
    }
}

impl<'a> IntoIterator for &'a RetrievalResult {
    type Item = &'a Candidate;
    type IntoIter = std::slice::Iter<'a, Candidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Coarse confidence attached to every answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        })
    }
}

impl FromStr for Confidence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!("unknown confidence level: {}", other)),
        }
    }
}

/// The engine that produced an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    Structured,
    Retrieval,
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Structured => "structured",
            Self::Retrieval => "retrieval",
        })
    }
}

/// Method requested by the caller of `ask`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AskMethod {
    #[default]
    Auto,
    #[serde(alias = "text2query")]
    Structured,
    #[serde(alias = "rag")]
    Retrieval,
}

impl fmt::Display for AskMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Auto => "auto",
            Self::Structured => "structured",
            Self::Retrieval => "retrieval",
        })
    }
}

impl FromStr for AskMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "structured" | "text2query" => Ok(Self::Structured),
            "retrieval" | "rag" => Ok(Self::Retrieval),
            other => Err(format!(
                "unknown method '{}': use auto, structured, or retrieval",
                other
            )),
        }
    }
}

/// Router bookkeeping for one engine invocation. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineAttempt {
    pub engine: EngineKind,
    pub succeeded: bool,
    pub reason: Option<String>,
}

impl EngineAttempt {
    pub fn succeeded(engine: EngineKind) -> Self {
        Self {
            engine,
            succeeded: true,
            reason: None,
        }
    }

    pub fn failed(engine: EngineKind, reason: impl Into<String>) -> Self {
        Self {
            engine,
            succeeded: false,
            reason: Some(reason.into()),
        }
    }
}

/// Uniform response of `ask`, regardless of which engine answered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerEnvelope {
    pub question: String,
    pub answer: String,
    pub sources: RetrievalResult,
    pub confidence: Confidence,
    pub method_used: EngineKind,
    #[serde(serialize_with = "serialize_secs")]
    pub execution_time: Duration,
    pub timestamp: DateTime<Utc>,
}

fn serialize_secs<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}
