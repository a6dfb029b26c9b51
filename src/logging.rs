//! Tracing subscriber setup for the `ah` binary.
//!
//! Logs go to stderr so `--json` output on stdout stays machine-readable.
//! `RUST_LOG` overrides `[logging].level`.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(config)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let installed = if config.format == "json" {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    // A subscriber may already be installed (tests, embedding binaries).
    if let Err(e) = installed {
        eprintln!("Warning: logging already initialized: {}", e);
    }
    Ok(())
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => parse_level(&config.level),
    }
}

/// Parse `[logging].level` as an `EnvFilter` directive string.
pub fn parse_level(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(level)
        .map_err(|e| anyhow::anyhow!("Invalid logging.level '{}': {}", level, e))
}
