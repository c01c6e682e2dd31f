//! Listen command - run a polling listener until Ctrl+C or an iteration
//! bound.

use super::get_database;
use anyhow::{Context, Result};
use colored::Colorize;
use murmur_config::Config;
use murmur_db::DraftStore;
use murmur_listeners::{
    DocumentListener, DocumentListenerConfig, InteractionListener, InteractionListenerConfig,
    ResponseMode,
};
use murmur_llm::LlmClient;
use murmur_rag::{ChunkConfig, RetrievalEngine, SyncPipeline};
use murmur_sources::{MastodonClient, NotionSource};
use murmur_core::SourceType;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Flip the shutdown signal on Ctrl+C.
fn shutdown_signal() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = tx.send(true);
        }
    });
    rx
}

pub async fn docs(iterations: Option<u64>) -> Result<()> {
    let db = get_database()?;
    let config = Config::load().context("Failed to load configuration")?;

    if config.notion.page_ids.is_empty() {
        println!("{}", "No pages configured under [notion].".yellow());
        return Ok(());
    }

    let source = Arc::new(
        NotionSource::from_config(&config.notion).context("Failed to create Notion client")?,
    );
    let client = Arc::new(
        LlmClient::from_config(&config.llm).context("Failed to create LLM client")?,
    );

    let listener = DocumentListener::new(
        source,
        SyncPipeline::new(db.clone(), client.clone()),
        RetrievalEngine::new(db.clone(), client.clone()),
        client,
        Arc::new(DraftStore::new(db.clone())),
        db,
        DocumentListenerConfig {
            source_ids: config.notion.page_ids.clone(),
            source_type: SourceType::Notion,
            poll_interval: Duration::from_secs(config.notion.poll_interval_seconds),
            generate_drafts: config.notion.generate_drafts,
            draft_query: config.notion.draft_query.clone(),
            top_k: config.retrieval.top_k,
            chunking: ChunkConfig::from_config(&config.chunking),
        },
    );

    println!(
        "{} Watching {} page(s) every {}s. Press Ctrl+C to stop.",
        "→".cyan(),
        config.notion.page_ids.len(),
        config.notion.poll_interval_seconds
    );

    listener.run(shutdown_signal(), iterations).await;
    Ok(())
}

pub async fn mentions(auto_reply: bool, iterations: Option<u64>) -> Result<()> {
    let db = get_database()?;
    let config = Config::load().context("Failed to load configuration")?;

    let mastodon = Arc::new(
        MastodonClient::from_config(&config.mastodon)
            .context("Failed to create Mastodon client")?,
    );
    let client = Arc::new(
        LlmClient::from_config(&config.llm).context("Failed to create LLM client")?,
    );

    let mode = if auto_reply || config.mastodon.auto_reply {
        ResponseMode::AutoReply
    } else {
        ResponseMode::Draft
    };

    let listener = InteractionListener::new(
        mastodon.clone(),
        RetrievalEngine::new(db.clone(), client.clone()),
        client,
        mastodon,
        Arc::new(DraftStore::new(db.clone())),
        db,
        InteractionListenerConfig {
            mode,
            account: config.mastodon.account.clone(),
            poll_interval: Duration::from_secs(config.mastodon.poll_interval_seconds),
            top_k: config.retrieval.top_k,
            batch_size: 5,
        },
    );

    if mode == ResponseMode::AutoReply {
        println!(
            "{} Auto-reply mode: replies are published without review.",
            "⚠".yellow().bold()
        );
    }
    println!(
        "{} Polling mentions every {}s. Press Ctrl+C to stop.",
        "→".cyan(),
        config.mastodon.poll_interval_seconds
    );

    listener.run(shutdown_signal(), iterations).await;
    Ok(())
}
