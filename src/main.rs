//! # Answer Harness CLI (`ah`)
//!
//! ## Usage
//!
//! ```bash
//! ah --config ./config/ah.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ah ask "<question>"` | Answer a question (structured first, retrieval fallback) |
//! | `ah search "<query>"` | Ranked passages from the configured strategy |
//! | `ah stats` | Strategy, index snapshot, and engine summary |
//! | `ah check` | Validate the configuration |
//! | `ah serve` | Start the HTTP server |
//! | `ah completions <shell>` | Print shell completions |
//!
//! ## Examples
//!
//! ```bash
//! ah ask "How many orders shipped last week?" --method auto
//! ah ask "Explain the refund policy" --method rag --json
//! ah search "refund policy" --top-k 5
//! ah serve --config ./config/ah.toml
//! ```

use answer_harness::{commands, config, logging, server};
use answer_harness_core::models::AskMethod;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Answer Harness CLI: question answering with structured-first routing
/// and retrieval fallback.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/ah.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "ah",
    about = "Answer Harness: structured-first question answering with retrieval fallback",
    version,
    long_about = "Answer Harness routes each question to a structured query engine first and \
    falls back to retrieval-augmented answering over an indexed corpus, using a pluggable \
    retrieval strategy (top_k or hybrid)."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/ah.toml`.
    #[arg(long, global = true, default_value = "./config/ah.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a question.
    ///
    /// `auto` tries the structured engine first and falls back to
    /// retrieval. Engine failures yield a low-confidence answer, not an error.
    Ask {
        question: String,

        /// `auto`, `structured` (alias `text2query`), or `retrieval` (alias `rag`).
        #[arg(long, default_value = "auto")]
        method: AskMethod,

        /// Print the answer envelope as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Search the indexed corpus with the configured strategy.
    Search {
        query: String,

        /// Override the result cap (top_k strategy only; hybrid ignores it).
        #[arg(long)]
        top_k: Option<usize>,

        /// Print results as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show strategy, index snapshot, and engine summary.
    Stats {
        /// Print stats as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Validate the configuration and print the strategy description.
    Check,

    /// Start the HTTP server on `[server].bind`.
    Serve,

    /// Print shell completions.
    Completions { shell: Shell },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Commands that don't require config
    if let Commands::Completions { shell } = &cli.command {
        clap_complete::generate(*shell, &mut Cli::command(), "ah", &mut std::io::stdout());
        return Ok(());
    }

    let cfg = config::load_config(&cli.config)?;
    logging::init_logging(&cfg.logging)?;

    match cli.command {
        Commands::Ask {
            question,
            method,
            json,
        } => {
            commands::run_ask(&cfg, &question, method, json).await?;
        }
        Commands::Search { query, top_k, json } => {
            commands::run_search(&cfg, &query, top_k, json).await?;
        }
        Commands::Stats { json } => {
            commands::run_stats(&cfg, json).await?;
        }
        Commands::Check => {
            commands::run_check(&cfg)?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}
