//! Config command - show configuration.

use super::get_paths;
use anyhow::{Context, Result};
use colored::Colorize;
use murmur_config::Config;

pub fn show() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    let rendered = toml::to_string_pretty(&config)?;

    println!("{}", "Active configuration".cyan().bold());
    println!("{}", "─".repeat(40));
    println!("{}", rendered);
    Ok(())
}

pub fn path() -> Result<()> {
    let paths = get_paths()?;
    println!("{}", paths.config_file.display());
    Ok(())
}
