//! # Answer Harness
//!
//! Question answering over an indexed corpus. Each question goes to a
//! structured (text-to-query) engine first and falls back to retrieval with
//! a pluggable strategy (`top_k` or `hybrid`) when that engine cannot answer.
//!
//! The policy layer lives in [`answer_harness_core`]. This crate adds the
//! TOML configuration, HTTP adapters for embeddings, structured queries and
//! answer generation, corpus loading, the `ah` CLI, and the HTTP server.
//!
//! ## Architecture
//!
//! ```text
//!  ┌──────────┐   ┌──────────┐
//!  │   CLI    │   │   HTTP   │
//!  │  (ah)    │   │  server  │
//!  └────┬─────┘   └────┬─────┘
//!       └──────┬───────┘
//!              ▼
//!        ┌───────────┐   ┌────────────────┐
//!        │  Harness  │──▶│  EngineRouter  │
//!        └───────────┘   └───┬────────┬───┘
//!                            ▼        ▼
//!                  ┌────────────┐ ┌─────────────────┐
//!                  │ Structured │ │ RetrievalEngine │──▶ in-memory snapshot
//!                  │  (http)    │ │ + generator     │
//!                  └────────────┘ └─────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! ah check                                  # validate config
//! ah search "refund policy" --top-k 5       # ranked passages
//! ah ask "How long do refunds take?"        # answer envelope
//! ah serve                                  # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`logging`] | `tracing` subscriber setup |
//! | [`embedding`] | Embedding providers (hash, OpenAI, Ollama) |
//! | [`structured`] | Structured query engine adapters |
//! | [`generator`] | Answer generators |
//! | [`corpus`] | Corpus file loading |
//! | [`harness`] | Wiring config into an engine router |
//! | [`commands`] | CLI command implementations |
//! | [`server`] | HTTP server |

pub mod commands;
pub mod config;
pub mod corpus;
pub mod embedding;
pub mod generator;
pub mod harness;
pub mod logging;
pub mod server;
pub mod structured;
