//! Corpus file loading.
//!
//! Two formats, chosen by extension:
//! - `.jsonl`: one document object per line; blank lines are skipped.
//! - `.json`: a single array of document objects.
//!
//! Document shape:
//!
//! ```json
//! {"id": "faq-7", "content": "Refunds are issued within 5 days.", "metadata": {"section": "billing"}}
//! ```
//!
//! `id` and `metadata` are optional. Content validation happens at rebuild.

use anyhow::{bail, Context, Result};
use answer_harness_core::models::Document;
use std::path::Path;

pub fn load_corpus(path: &Path) -> Result<Vec<Document>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read corpus file: {}", path.display()))?;

    match path.extension().and_then(|e| e.to_str()) {
        Some("jsonl") => parse_jsonl(&content)
            .with_context(|| format!("Failed to parse corpus file: {}", path.display())),
        Some("json") => serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse corpus file: {}", path.display())),
        _ => bail!(
            "Unsupported corpus format: {}. Use a .jsonl or .json file.",
            path.display()
        ),
    }
}

pub fn parse_jsonl(content: &str) -> Result<Vec<Document>> {
    let mut documents = Vec::new();
    for (i, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let doc: Document =
            serde_json::from_str(line).with_context(|| format!("line {}", i + 1))?;
        documents.push(doc);
    }
    Ok(documents)
}
