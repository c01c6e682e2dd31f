//! Drafts command - human review of generated drafts.

use super::{get_database, preview};
use anyhow::{Context, Result};
use colored::Colorize;
use murmur_core::DraftStatus;

pub fn list(status: Option<&str>, limit: usize) -> Result<()> {
    let db = get_database()?;

    let status = match status {
        Some(s) => Some(
            DraftStatus::from_str(s)
                .ok_or_else(|| anyhow::anyhow!("Unknown draft status: {}", s))?,
        ),
        None => None,
    };

    let drafts = db.list_drafts(status, limit).context("Failed to list drafts")?;

    if drafts.is_empty() {
        println!("{}", "No drafts.".yellow());
        return Ok(());
    }

    println!("{}", format!("{} draft(s)", drafts.len()).cyan().bold());
    println!("{}", "─".repeat(70));

    for draft in &drafts {
        let status = match draft.status {
            DraftStatus::Draft => draft.status.to_string().yellow(),
            DraftStatus::Posted => draft.status.to_string().green(),
            DraftStatus::Discarded => draft.status.to_string().red(),
        };
        println!(
            "{}  {} [{}] {}",
            &draft.id[..8],
            status,
            draft.kind,
            draft.created_at.format("%Y-%m-%d %H:%M")
        );
        println!("   {}", preview(&draft.content, 90));
        if let Some(linkage) = &draft.linkage {
            println!("   {} {}", "from".dimmed(), linkage.as_string().dimmed());
        }
    }

    Ok(())
}

pub fn show(id: &str) -> Result<()> {
    let db = get_database()?;
    let draft = resolve_draft(&db, id)?;

    println!("{} {}", "Draft".cyan().bold(), draft.id);
    println!("{}", "─".repeat(60));
    println!("Status:  {}", draft.status);
    println!("Kind:    {}", draft.kind);
    println!("Created: {}", draft.created_at.format("%Y-%m-%d %H:%M:%S"));
    if let Some(linkage) = &draft.linkage {
        println!("From:    {}", linkage.as_string());
    }
    if let Some(post_id) = &draft.external_post_id {
        println!("Posted:  {}", post_id);
    }
    println!("{}", "─".repeat(60));
    println!("{}", draft.content);

    Ok(())
}

pub fn discard(id: &str) -> Result<()> {
    let db = get_database()?;
    let draft = resolve_draft(&db, id)?;

    db.discard_draft(&draft.id).context("Failed to discard draft")?;
    println!("{} Discarded draft {}", "✓".green(), &draft.id[..8]);
    Ok(())
}

/// Look a draft up by full id or unique prefix.
pub fn resolve_draft(db: &murmur_db::Database, id: &str) -> Result<murmur_core::Draft> {
    if let Ok(draft) = db.get_draft(id) {
        return Ok(draft);
    }

    let matches: Vec<_> = db
        .list_drafts(None, 1000)?
        .into_iter()
        .filter(|d| d.id.starts_with(id))
        .collect();

    match matches.len() {
        0 => anyhow::bail!("No draft matches '{}'", id),
        1 => Ok(matches.into_iter().next().unwrap()),
        n => anyhow::bail!("'{}' is ambiguous ({} drafts match)", id, n),
    }
}
