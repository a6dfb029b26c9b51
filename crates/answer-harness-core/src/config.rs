//! Retrieval tuning parameters, decoupled from application config.
//!
//! [`StrategyConfig`] is validated once when a strategy is created through
//! the [`StrategyRegistry`](crate::strategy::StrategyRegistry); after that
//! it is treated as immutable.

use serde::{Deserialize, Serialize};

use crate::error::RetrievalError;

/// Registry name of the top-k strategy.
pub const TOP_K: &str = "top_k";
/// Registry name of the hybrid strategy.
pub const HYBRID: &str = "hybrid";

pub const TOP_K_RANGE: (usize, usize) = (1, 1000);
pub const MAX_SEARCH_RANGE: (usize, usize) = (10, 1000);
pub const MIN_RESULTS_RANGE: (usize, usize) = (1, 50);

/// Retrieval policy parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Registered strategy name (`"top_k"`, `"hybrid"`, or an extension).
    pub strategy: String,
    /// Result count for top-k retrieval.
    pub top_k: usize,
    /// Minimum similarity for a candidate to count as quality (inclusive).
    pub similarity_threshold: f64,
    /// Candidates fetched before threshold filtering.
    pub max_search_with_threshold: usize,
    /// Safety-net result count when too few candidates clear the threshold.
    pub min_results_with_threshold: usize,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            strategy: HYBRID.to_string(),
            top_k: 50,
            similarity_threshold: 0.7,
            max_search_with_threshold: 100,
            min_results_with_threshold: 1,
        }
    }
}

impl StrategyConfig {
    pub fn top_k(k: usize) -> Self {
        Self {
            strategy: TOP_K.to_string(),
            top_k: k,
            ..Self::default()
        }
    }

    pub fn hybrid(
        similarity_threshold: f64,
        max_search_with_threshold: usize,
        min_results_with_threshold: usize,
    ) -> Self {
        Self {
            strategy: HYBRID.to_string(),
            similarity_threshold,
            max_search_with_threshold,
            min_results_with_threshold,
            ..Self::default()
        }
    }

    /// Check every field range and cross-field constraint.
    pub fn validate(&self) -> Result<(), RetrievalError> {
        if self.strategy.trim().is_empty() {
            return Err(RetrievalError::configuration(
                "retrieval strategy name must not be empty",
            ));
        }
        check_range("top_k", self.top_k, TOP_K_RANGE)?;
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(RetrievalError::configuration(format!(
                "similarity_threshold must be between 0.0 and 1.0, got {}",
                self.similarity_threshold
            )));
        }
        check_range(
            "max_search_with_threshold",
            self.max_search_with_threshold,
            MAX_SEARCH_RANGE,
        )?;
        check_range(
            "min_results_with_threshold",
            self.min_results_with_threshold,
            MIN_RESULTS_RANGE,
        )?;
        if self.min_results_with_threshold > self.max_search_with_threshold {
            return Err(RetrievalError::configuration(format!(
                "min_results_with_threshold ({}) cannot be greater than max_search_with_threshold ({})",
                self.min_results_with_threshold, self.max_search_with_threshold
            )));
        }
        Ok(())
    }
}

fn check_range(field: &str, value: usize, (lo, hi): (usize, usize)) -> Result<(), RetrievalError> {
    if value < lo || value > hi {
        return Err(RetrievalError::configuration(format!(
            "{} must be between {} and {}, got {}",
            field, lo, hi, value
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        StrategyConfig::default().validate().unwrap();
    }

    #[test]
    fn test_min_above_max_rejected() {
        let cfg = StrategyConfig {
            min_results_with_threshold: 50,
            max_search_with_threshold: 20,
            ..StrategyConfig::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, RetrievalError::Configuration { .. }));
        assert!(err.to_string().contains("cannot be greater"));
    }

    #[test]
    fn test_out_of_range_rejected_not_clamped() {
        for cfg in [
            StrategyConfig::top_k(0),
            StrategyConfig::top_k(1001),
            StrategyConfig::hybrid(1.2, 100, 1),
            StrategyConfig::hybrid(-0.1, 100, 1),
            StrategyConfig::hybrid(0.7, 5, 1),
            StrategyConfig::hybrid(0.7, 100, 0),
            StrategyConfig::hybrid(0.7, 100, 51),
        ] {
            assert!(cfg.validate().is_err(), "{:?} should be rejected", cfg);
        }
    }

    #[test]
    fn test_threshold_bounds_inclusive() {
        StrategyConfig::hybrid(0.0, 10, 1).validate().unwrap();
        StrategyConfig::hybrid(1.0, 1000, 50).validate().unwrap();
    }
}
