//! Init command - create config and database.

use super::get_paths;
use anyhow::{Context, Result};
use colored::Colorize;
use murmur_config::Config;
use murmur_db::Database;

pub fn run() -> Result<()> {
    let paths = get_paths()?;
    paths.ensure_dirs().context("Failed to create directories")?;

    if paths.config_file.exists() {
        println!(
            "{} Config already exists at {}",
            "→".yellow(),
            paths.config_file.display()
        );
    } else {
        Config::create_default_file(&paths.config_file)
            .context("Failed to write default config")?;
        println!(
            "{} Created config at {}",
            "✓".green(),
            paths.config_file.display()
        );
    }

    Database::open(&paths.database_file).context("Failed to create database")?;
    println!(
        "{} Database ready at {}",
        "✓".green(),
        paths.database_file.display()
    );

    println!("\nNext steps:");
    println!("  1. Edit the config: {}", paths.config_file.display().to_string().cyan());
    println!("  2. Export your API keys (see the [llm], [notion], [mastodon] sections)");
    println!("  3. Run {} to pull your pages in", "murmur sync".cyan());

    Ok(())
}
