//! `ah` command implementations.
//!
//! Each `run_*` builds a [`Harness`] from the loaded config, does one thing,
//! and prints to stdout. `--json` prints the same payload the HTTP server
//! returns.

use anyhow::{Context, Result};
use answer_harness_core::models::{AnswerEnvelope, AskMethod, Candidate};
use answer_harness_core::strategy::StrategyRegistry;
use chrono::{DateTime, Utc};

use crate::config::Config;
use crate::harness::Harness;

const EXCERPT_CHARS: usize = 160;

pub async fn run_ask(config: &Config, question: &str, method: AskMethod, json: bool) -> Result<()> {
    let harness = Harness::from_config(config).await?;
    let envelope = harness.ask(question, method).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&envelope)?);
    } else {
        print_envelope(&envelope);
    }
    Ok(())
}

fn print_envelope(envelope: &AnswerEnvelope) {
    println!("{}", envelope.answer);
    println!();
    println!(
        "  method: {}  confidence: {}  time: {:.2}s",
        envelope.method_used,
        envelope.confidence,
        envelope.execution_time.as_secs_f64()
    );
    if !envelope.sources.is_empty() {
        println!();
        println!("  Sources:");
        for (i, source) in envelope.sources.iter().enumerate() {
            println!("  {}. [{:.2}] {}", i + 1, source.similarity, excerpt(&source.content));
        }
    }
}

pub async fn run_search(config: &Config, query: &str, top_k: Option<usize>, json: bool) -> Result<()> {
    let harness = Harness::from_config(config).await?;
    let results = harness
        .search(query, top_k)
        .await
        .with_context(|| format!("Search failed for query: {}", query))?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({ "results": results }))?
        );
        return Ok(());
    }

    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }
    for (i, candidate) in results.iter().enumerate() {
        print_candidate(i + 1, candidate);
    }
    Ok(())
}

fn print_candidate(rank: usize, candidate: &Candidate) {
    println!("{}. [{:.2}] {}", rank, candidate.similarity, excerpt(&candidate.content));
    if !candidate.metadata.is_empty() {
        let meta = serde_json::to_string(&candidate.metadata).unwrap_or_default();
        println!("    metadata: {}", meta);
    }
    println!();
}

pub async fn run_stats(config: &Config, json: bool) -> Result<()> {
    let harness = Harness::from_config(config).await?;
    let stats = harness.stats();

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("Answer Harness Stats");
    println!("===================");
    println!();
    println!("  Strategy:    {}", stats.strategy);
    println!("               {}", stats.strategy_description);
    println!("  Documents:   {}", stats.snapshot.document_count);
    println!(
        "  Built at:    {}",
        stats
            .snapshot
            .built_at
            .map(format_built_at)
            .unwrap_or_else(|| "never".to_string())
    );
    if !stats.snapshot.fingerprint.is_empty() {
        println!("  Fingerprint: {}", stats.snapshot.fingerprint);
    }
    println!();
    println!(
        "  Structured:  {} ({})",
        stats.structured_engine,
        if stats.structured_available {
            "available"
        } else {
            "unavailable"
        }
    );
    println!("  Generator:   {}", stats.generator);
    println!(
        "  Routing:     {}",
        if stats.semantic_routing {
            "semantic"
        } else {
            "structured first"
        }
    );
    println!("  Methods:     {}", stats.methods.join(", "));
    println!();
    Ok(())
}

/// Validate the config without building providers or touching the network.
pub fn run_check(config: &Config) -> Result<()> {
    let strategy_config = config.retrieval.strategy_config();
    let strategy = StrategyRegistry::with_builtins().create_for(&strategy_config)?;
    println!("Configuration OK.");
    println!("  {}", strategy.description(&strategy_config));
    println!(
        "  embedding: {}  structured: {}  generation: {}",
        config.embedding.provider, config.structured.provider, config.generation.provider
    );
    if config.structured.is_enabled() {
        if let Some(url) = &config.structured.url {
            println!("  structured url: {}", url);
        }
    }
    match &config.corpus.path {
        Some(path) => println!("  corpus: {}", path.display()),
        None => println!("  corpus: (none)"),
    }
    Ok(())
}

/// `2026-10-19 06:43 UTC (5 mins ago)`
fn format_built_at(built_at: DateTime<Utc>) -> String {
    let delta = (Utc::now() - built_at).num_seconds();
    let relative = if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    };
    format!("{} ({})", built_at.format("%Y-%m-%d %H:%M UTC"), relative)
}

fn excerpt(content: &str) -> String {
    let flat = content.replace('\n', " ");
    let flat = flat.trim();
    if flat.chars().count() <= EXCERPT_CHARS {
        flat.to_string()
    } else {
        let cut: String = flat.chars().take(EXCERPT_CHARS).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excerpt_flattens_and_truncates() {
        assert_eq!(excerpt("a\nb "), "a b");
        let long = "x".repeat(EXCERPT_CHARS + 10);
        let cut = excerpt(&long);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), EXCERPT_CHARS + 3);
    }

    #[test]
    fn test_format_built_at() {
        let now = Utc::now();
        assert!(format_built_at(now).ends_with("(just now)"));
        let earlier = now - chrono::Duration::hours(3);
        assert!(format_built_at(earlier).ends_with("(3 hours ago)"));
        let yesterday = now - chrono::Duration::days(1);
        assert!(format_built_at(yesterday).ends_with("(1 day ago)"));
    }

    #[test]
    fn test_check_accepts_defaults() {
        run_check(&Config::default()).unwrap();
    }
}
