//! # Answer Harness Core
//!
//! Retrieval policy and engine selection for Answer Harness: data models,
//! strategy configuration, the vector store abstraction with an in-memory
//! snapshot store, retrieval strategies and their registry, the retrieval
//! engine, answer assembly, and the router that picks between a structured
//! engine and retrieval.
//!
//! No HTTP, filesystem, or CLI code lives here.
//!
//! ```text
//!             ┌────────────────┐
//!  question ─▶│  EngineRouter  │── auto ──▶ StructuredQueryEngine
//!             └───────┬────────┘              │ failed / timed out
//!                     ▼                       ▼
//!             ┌────────────────┐     ┌─────────────────┐
//!             │RetrievalEngine │────▶│RetrievalStrategy│──▶ VectorStore
//!             └────────────────┘     └─────────────────┘
//! ```

pub mod answer;
pub mod classify;
pub mod config;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod models;
pub mod router;
pub mod store;
pub mod strategy;
pub mod structured;

#[cfg(test)]
mod testing;

pub use error::RetrievalError;
