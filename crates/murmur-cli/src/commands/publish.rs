//! Publish command - post an approved draft.

use super::drafts::resolve_draft;
use super::get_database;
use anyhow::{Context, Result};
use colored::Colorize;
use murmur_config::Config;
use murmur_core::DraftStatus;
use murmur_sources::MastodonClient;

pub async fn run(id: &str) -> Result<()> {
    let db = get_database()?;
    let config = Config::load().context("Failed to load configuration")?;

    let draft = resolve_draft(&db, id)?;
    if draft.status != DraftStatus::Draft {
        anyhow::bail!("Draft {} is already {}", &draft.id[..8], draft.status);
    }

    let mastodon = MastodonClient::from_config(&config.mastodon)
        .context("Failed to create Mastodon client")?;

    // Transparency trailer on human-approved standalone posts
    let text = format!("{}\n\n🤖 AI-generated content", draft.content);

    println!("Publishing draft {} ...", &draft.id[..8]);
    let post_id = mastodon
        .post_status(&text, None)
        .await
        .context("Publish failed; the draft is untouched and can be retried")?;

    db.mark_draft_posted(&draft.id, &post_id)
        .context("Posted, but failed to record the post id")?;

    println!("{} Published as {}", "✓".green(), post_id);
    Ok(())
}
