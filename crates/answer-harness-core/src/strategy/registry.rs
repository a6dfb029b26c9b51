use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::config::{StrategyConfig, HYBRID, TOP_K};
use crate::error::RetrievalError;

use super::{HybridStrategy, RetrievalStrategy, TopKStrategy};

/// Builds a strategy for a validated configuration.
pub type StrategyConstructor = Arc<
    dyn Fn(&StrategyConfig) -> Result<Box<dyn RetrievalStrategy>, RetrievalError> + Send + Sync,
>;

const BUILTINS: [&str; 2] = [TOP_K, HYBRID];

/// Name-to-constructor table for retrieval strategies.
///
/// Built once at startup and passed by reference to whatever creates
/// engines. Registering new names is the extension point for additional
/// policies; callers keep selecting strategies by name.
///
/// # Example
///
/// ```rust
/// use answer_harness_core::config::StrategyConfig;
/// use answer_harness_core::strategy::StrategyRegistry;
///
/// let registry = StrategyRegistry::with_builtins();
/// let strategy = registry.create("hybrid", &StrategyConfig::default()).unwrap();
/// assert_eq!(strategy.name(), "hybrid");
/// ```
#[derive(Clone)]
pub struct StrategyRegistry {
    constructors: BTreeMap<String, StrategyConstructor>,
}

impl StrategyRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// Create a registry pre-loaded with `top_k` and `hybrid`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(TOP_K, |_| Ok(Box::new(TopKStrategy)));
        registry.register(HYBRID, |_| Ok(Box::new(HybridStrategy)));
        registry
    }

    /// Register a constructor under `name`. Re-registering a name replaces it.
    ///
    /// Returns `true` when an earlier registration was overwritten.
    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F) -> bool
    where
        F: Fn(&StrategyConfig) -> Result<Box<dyn RetrievalStrategy>, RetrievalError>
            + Send
            + Sync
            + 'static,
    {
        let name = name.into();
        let replaced = self
            .constructors
            .insert(name.clone(), Arc::new(constructor))
            .is_some();
        debug!(strategy = %name, replaced, "registered retrieval strategy");
        replaced
    }

    /// Remove a custom strategy. Built-ins cannot be removed.
    pub fn unregister(&mut self, name: &str) -> Result<(), RetrievalError> {
        if BUILTINS.contains(&name) {
            return Err(RetrievalError::configuration(format!(
                "cannot unregister built-in strategy '{}'",
                name
            )));
        }
        match self.constructors.remove(name) {
            Some(_) => Ok(()),
            None => Err(self.unknown(name)),
        }
    }

    /// Instantiate `name` for `config`.
    ///
    /// Fails with [`RetrievalError::UnknownStrategy`] for unregistered names
    /// and with [`RetrievalError::Configuration`] when `config` is invalid
    /// for the strategy.
    pub fn create(
        &self,
        name: &str,
        config: &StrategyConfig,
    ) -> Result<Box<dyn RetrievalStrategy>, RetrievalError> {
        let constructor = self
            .constructors
            .get(name)
            .ok_or_else(|| self.unknown(name))?;
        config.validate()?;
        let strategy = constructor(config)?;
        strategy.validate_config(config)?;
        Ok(strategy)
    }

    /// Instantiate the strategy named by `config.strategy`.
    pub fn create_for(
        &self,
        config: &StrategyConfig,
    ) -> Result<Box<dyn RetrievalStrategy>, RetrievalError> {
        self.create(&config.strategy, config)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.constructors.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    fn unknown(&self, name: &str) -> RetrievalError {
        RetrievalError::UnknownStrategy {
            name: name.to_string(),
            available: self.names(),
        }
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}
