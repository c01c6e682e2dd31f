//! Stats command - knowledge-base statistics.

use super::get_database;
use anyhow::Result;
use colored::Colorize;

pub fn run() -> Result<()> {
    let db = get_database()?;
    let stats = db.get_stats()?;

    println!("{}", "Murmur Statistics".cyan().bold());
    println!("{}", "─".repeat(50));

    println!();
    println!("{}", "Knowledge Base".white().bold());
    println!("  Documents: {}", stats.total_documents.to_string().green());
    println!(
        "  Fragments: {} ({} embedded)",
        stats.total_fragments, stats.embedded_fragments
    );

    println!();
    println!("{}", "Interactions".white().bold());
    println!("  Total: {}", stats.total_interactions);
    if stats.unresponded_interactions > 0 {
        println!(
            "  Unresponded: {}",
            stats.unresponded_interactions.to_string().yellow()
        );
    } else {
        println!("  Unresponded: 0");
    }

    println!();
    println!("{}", "Drafts".white().bold());
    if stats.drafts_by_status.is_empty() {
        println!("  None yet");
    } else {
        for status in ["draft", "posted", "discarded"] {
            if let Some(count) = stats.drafts_by_status.get(status) {
                println!("  {}: {}", status, count);
            }
        }
    }

    Ok(())
}
