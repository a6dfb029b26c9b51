//! Error taxonomy for the retrieval and routing layers.
//!
//! Every fallible core operation returns [`RetrievalError`]. Collaborator
//! traits (embedding, structured engine, answer generation) report
//! `anyhow::Error`; the store boundary turns those into
//! [`RetrievalError::Backend`].

/// Errors raised by the retrieval policy layer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RetrievalError {
    /// Invalid strategy configuration. Raised at construction, never mid-request.
    #[error("configuration error: {reason}")]
    Configuration { reason: String },

    /// The vector store has no indexed documents.
    #[error("index unavailable: no documents are indexed")]
    IndexUnavailable,

    /// Transient I/O failure talking to the vector backend.
    #[error("backend error: {reason}")]
    Backend { reason: String },

    /// The requested strategy is not registered.
    #[error("unknown retrieval strategy '{name}' (available: {})", available.join(", "))]
    UnknownStrategy { name: String, available: Vec<String> },

    /// Another rebuild is already running against the store.
    #[error("rebuild already in progress; retry later")]
    RebuildInProgress,

    /// A document handed to `rebuild` failed validation.
    #[error("malformed document at index {index}: {reason}")]
    MalformedDocument { index: usize, reason: String },

    /// The request itself is unusable (blank query, out-of-range override).
    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },
}

impl RetrievalError {
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    pub fn backend(reason: impl Into<String>) -> Self {
        Self::Backend {
            reason: reason.into(),
        }
    }

    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }

    /// Machine-readable code used by transports.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "configuration_error",
            Self::IndexUnavailable => "index_unavailable",
            Self::Backend { .. } => "backend_error",
            Self::UnknownStrategy { .. } => "unknown_strategy",
            Self::RebuildInProgress => "rebuild_in_progress",
            Self::MalformedDocument { .. } | Self::InvalidRequest { .. } => "bad_request",
        }
    }

    /// Whether a single immediate retry may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Backend { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_strategy_lists_available() {
        let err = RetrievalError::UnknownStrategy {
            name: "mmr".to_string(),
            available: vec!["hybrid".to_string(), "top_k".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "unknown retrieval strategy 'mmr' (available: hybrid, top_k)"
        );
    }

    #[test]
    fn test_only_backend_is_transient() {
        assert!(RetrievalError::backend("disk").is_transient());
        assert!(!RetrievalError::IndexUnavailable.is_transient());
        assert!(!RetrievalError::RebuildInProgress.is_transient());
    }

    #[test]
    fn test_codes() {
        assert_eq!(RetrievalError::IndexUnavailable.code(), "index_unavailable");
        assert_eq!(
            RetrievalError::invalid_request("blank").code(),
            "bad_request"
        );
    }
}
