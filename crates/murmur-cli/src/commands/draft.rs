//! Draft command - generate one standalone post draft.

use super::get_database;
use anyhow::{Context, Result};
use colored::Colorize;
use murmur_config::Config;
use murmur_core::{DraftKind, DraftLinkage, DraftSink, Generator};
use murmur_db::DraftStore;
use murmur_llm::LlmClient;
use murmur_rag::RetrievalEngine;
use std::sync::Arc;

const POST_INSTRUCTION: &str =
    "Write one short social media post. Do not include hashtags.";

pub async fn run() -> Result<()> {
    let db = get_database()?;
    let config = Config::load().context("Failed to load configuration")?;

    let client = Arc::new(
        LlmClient::from_config(&config.llm).context("Failed to create LLM client")?,
    );
    let engine = RetrievalEngine::new(db.clone(), client.clone());

    let results = engine
        .retrieve(&config.notion.draft_query, config.retrieval.top_k, None)
        .await
        .context("Retrieval failed")?;

    if results.is_empty() {
        println!("{}", "The knowledge base is empty.".yellow());
        println!("Run {} first.", "murmur sync".cyan());
        return Ok(());
    }

    let context = RetrievalEngine::build_context(&results);
    let text = client
        .generate(&context, POST_INSTRUCTION)
        .await
        .context("Generation failed")?;

    let store = DraftStore::new(db);
    let source_id = results[0].fragment.source_id.clone();
    let artifact_id = store
        .save_draft(&text, DraftKind::Post, DraftLinkage::document(source_id))
        .context("Failed to save draft")?;

    println!("{}", "Draft created".green().bold());
    println!("{}", "─".repeat(40));
    println!("{}", text);
    println!("{}", "─".repeat(40));
    println!("Review with {}", format!("murmur drafts show {}", artifact_id).cyan());
    println!("Publish with {}", format!("murmur publish {}", artifact_id).cyan());

    Ok(())
}
