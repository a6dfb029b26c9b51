//! Configuration parsing and validation.
//!
//! Answer Harness is configured via a TOML file (default: `config/ah.toml`).
//! Every section is optional and every field has a fixed default; the file
//! itself must exist.
//!
//! # Example Configuration
//!
//! ```toml
//! [retrieval]
//! strategy = "hybrid"
//! similarity_threshold = 0.7
//! max_search_with_threshold = 100
//! min_results_with_threshold = 1
//!
//! [router]
//! structured_time_budget_secs = 120
//!
//! [embedding]
//! provider = "hash"
//! dims = 256
//!
//! [corpus]
//! path = "./data/corpus.jsonl"
//!
//! [server]
//! bind = "127.0.0.1:7341"
//! ```
//!
//! # Validation
//!
//! [`load_config`] rejects out-of-range values instead of clamping them:
//! - `[retrieval]` must describe a valid `top_k` or `hybrid` strategy
//! - `router.structured_time_budget_secs` must be > 0
//! - `embedding.provider` must be `hash`, `openai`, or `ollama`; remote
//!   providers need `model`
//! - `structured.provider = "http"` needs `structured.url`
//! - `generation.max_passages` must be >= 1
//! - `logging.format` must be `text` or `json`, and `logging.level` must
//!   parse as a `tracing` filter directive

use anyhow::{bail, Context, Result};
use answer_harness_core::config::{StrategyConfig, HYBRID, TOP_K};
use answer_harness_core::router::RouterConfig;
use answer_harness_core::strategy::StrategyRegistry;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::logging::parse_level;

/// Top-level configuration.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub router: RouterSection,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub structured: StructuredConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_strategy")]
    pub strategy: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
    #[serde(default = "default_max_search")]
    pub max_search_with_threshold: usize,
    #[serde(default = "default_min_results")]
    pub min_results_with_threshold: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            top_k: default_top_k(),
            similarity_threshold: default_similarity_threshold(),
            max_search_with_threshold: default_max_search(),
            min_results_with_threshold: default_min_results(),
        }
    }
}

impl RetrievalConfig {
    pub fn strategy_config(&self) -> StrategyConfig {
        StrategyConfig {
            strategy: self.strategy.clone(),
            top_k: self.top_k,
            similarity_threshold: self.similarity_threshold,
            max_search_with_threshold: self.max_search_with_threshold,
            min_results_with_threshold: self.min_results_with_threshold,
        }
    }
}

fn default_strategy() -> String {
    HYBRID.to_string()
}
fn default_top_k() -> usize {
    50
}
fn default_similarity_threshold() -> f64 {
    0.7
}
fn default_max_search() -> usize {
    100
}
fn default_min_results() -> usize {
    1
}

#[derive(Debug, Deserialize, Clone)]
pub struct RouterSection {
    #[serde(default = "default_budget_secs")]
    pub structured_time_budget_secs: u64,
    #[serde(default)]
    pub semantic_routing: bool,
}

impl Default for RouterSection {
    fn default() -> Self {
        Self {
            structured_time_budget_secs: default_budget_secs(),
            semantic_routing: false,
        }
    }
}

fn default_budget_secs() -> u64 {
    120
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_dims")]
    pub dims: usize,
    /// Ollama base URL.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: None,
            dims: default_dims(),
            url: None,
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_embedding_provider() -> String {
    "hash".to_string()
}
fn default_dims() -> usize {
    256
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct StructuredConfig {
    #[serde(default = "default_structured_provider")]
    pub provider: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for StructuredConfig {
    fn default() -> Self {
        Self {
            provider: default_structured_provider(),
            url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl StructuredConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

fn default_structured_provider() -> String {
    "disabled".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    #[serde(default = "default_generation_provider")]
    pub provider: String,
    #[serde(default = "default_generation_model")]
    pub model: String,
    #[serde(default = "default_max_passages")]
    pub max_passages: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_generation_provider(),
            model: default_generation_model(),
            max_passages: default_max_passages(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_generation_provider() -> String {
    "extractive".to_string()
}
fn default_generation_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_max_passages() -> usize {
    5
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CorpusConfig {
    /// `.jsonl` or `.json` file loaded at startup and on `/rebuild`.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7341".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "text".to_string()
}

impl Config {
    pub fn router_config(&self) -> RouterConfig {
        RouterConfig {
            structured_time_budget: Duration::from_secs(self.router.structured_time_budget_secs),
            semantic_routing: self.router.semantic_routing,
            max_passages: self.generation.max_passages,
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
}

/// Parse and validate configuration text.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    // Validate retrieval
    match config.retrieval.strategy.as_str() {
        TOP_K | HYBRID => {}
        other => bail!(
            "Unknown retrieval strategy: '{}'. Must be top_k or hybrid.",
            other
        ),
    }
    StrategyRegistry::with_builtins()
        .create_for(&config.retrieval.strategy_config())
        .with_context(|| "Invalid [retrieval] section")?;

    // Validate router
    if config.router.structured_time_budget_secs == 0 {
        bail!("router.structured_time_budget_secs must be > 0");
    }

    // Validate embedding
    match config.embedding.provider.as_str() {
        "hash" => {}
        "openai" | "ollama" => {
            if config.embedding.model.is_none() {
                bail!(
                    "embedding.model must be specified when provider is '{}'",
                    config.embedding.provider
                );
            }
        }
        other => bail!(
            "Unknown embedding provider: '{}'. Must be hash, openai, or ollama.",
            other
        ),
    }
    if config.embedding.dims == 0 {
        bail!("embedding.dims must be > 0");
    }
    if config.embedding.batch_size == 0 {
        bail!("embedding.batch_size must be > 0");
    }

    // Validate structured engine
    match config.structured.provider.as_str() {
        "disabled" => {}
        "http" => {
            if config.structured.url.is_none() {
                bail!("structured.url must be specified when provider is 'http'");
            }
        }
        other => bail!(
            "Unknown structured provider: '{}'. Must be disabled or http.",
            other
        ),
    }

    // Validate generation
    match config.generation.provider.as_str() {
        "extractive" | "openai" => {}
        other => bail!(
            "Unknown generation provider: '{}'. Must be extractive or openai.",
            other
        ),
    }
    if config.generation.max_passages == 0 {
        bail!("generation.max_passages must be >= 1");
    }

    // Validate logging
    match config.logging.format.as_str() {
        "text" | "json" => {}
        other => bail!("Unknown logging format: '{}'. Must be text or json.", other),
    }
    parse_level(&config.logging.level)?;

    Ok(())
}
