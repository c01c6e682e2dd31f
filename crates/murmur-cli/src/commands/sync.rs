//! Sync command - one-shot sync of monitored documents.

use super::get_database;
use anyhow::{Context, Result};
use colored::Colorize;
use murmur_config::Config;
use murmur_core::{DocumentSource, SourceType};
use murmur_llm::LlmClient;
use murmur_rag::{ChunkConfig, SyncOutcome, SyncPipeline};
use murmur_sources::NotionSource;
use std::sync::Arc;

pub async fn run(page: Option<String>) -> Result<()> {
    let db = get_database()?;
    let config = Config::load().context("Failed to load configuration")?;

    let page_ids = match page {
        Some(page) => vec![page],
        None => config.notion.page_ids.clone(),
    };

    if page_ids.is_empty() {
        println!("{}", "No pages configured.".yellow());
        println!("Add page ids under [notion] in the config, or pass --page <ID>.");
        return Ok(());
    }

    let source = NotionSource::from_config(&config.notion)
        .context("Failed to create Notion client")?;
    let embedder = Arc::new(
        LlmClient::from_config(&config.llm).context("Failed to create LLM client")?,
    );
    let pipeline = SyncPipeline::new(db, embedder);
    let chunking = ChunkConfig::from_config(&config.chunking);

    for page_id in &page_ids {
        print!("Syncing {} ... ", page_id.cyan());

        let fetched = match source.fetch(page_id).await {
            Ok(fetched) => fetched,
            Err(e) => {
                println!("{} {}", "fetch failed:".red(), e);
                continue;
            }
        };

        let outcome = pipeline
            .sync(
                page_id,
                SourceType::Notion,
                &fetched.title,
                &fetched.content,
                Some(&fetched.revision_marker),
                &chunking,
            )
            .await;

        match outcome {
            Ok(SyncOutcome::Synced { fragment_count, .. }) => {
                println!(
                    "{} '{}' ({} fragments)",
                    "✓".green(),
                    fetched.title,
                    fragment_count
                );
            }
            Ok(SyncOutcome::Unchanged) => {
                println!("{}", "unchanged".yellow());
            }
            Err(e) => {
                println!("{} {}", "sync failed:".red(), e);
            }
        }
    }

    Ok(())
}
