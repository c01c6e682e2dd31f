//! Query command - similarity search over the fragment store.

use super::{get_database, preview};
use anyhow::{Context, Result};
use colored::Colorize;
use murmur_config::Config;
use murmur_core::SourceType;
use murmur_llm::LlmClient;
use murmur_rag::RetrievalEngine;
use std::sync::Arc;

pub async fn run(query: &str, limit: usize, source_type: Option<&str>) -> Result<()> {
    let db = get_database()?;
    let config = Config::load().context("Failed to load configuration")?;

    let source_type = match source_type {
        Some(s) => Some(
            SourceType::from_str(s)
                .ok_or_else(|| anyhow::anyhow!("Unknown source type: {}", s))?,
        ),
        None => None,
    };

    let embedder = Arc::new(
        LlmClient::from_config(&config.llm).context("Failed to create LLM client")?,
    );
    let engine = RetrievalEngine::new(db, embedder);

    let results = engine
        .retrieve(query, limit, source_type)
        .await
        .context("Retrieval failed")?;

    if results.is_empty() {
        println!("{}", "No matching fragments.".yellow());
        println!("Run {} first to populate the knowledge base.", "murmur sync".cyan());
        return Ok(());
    }

    println!("{}", format!("Top {} fragments", results.len()).cyan().bold());
    println!("{}", "─".repeat(60));

    for result in &results {
        println!(
            "{}  {}/{} #{}",
            format!("{:.3}", result.similarity).green(),
            result.fragment.source_type,
            result.fragment.source_id,
            result.fragment.ordinal
        );
        println!("   {}", preview(&result.fragment.content, 100));
    }

    Ok(())
}
