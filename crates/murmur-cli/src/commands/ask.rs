//! Ask command - retrieval-grounded question answering.

use super::{get_database, preview};
use anyhow::{Context, Result};
use colored::Colorize;
use murmur_config::Config;
use murmur_core::Generator;
use murmur_llm::LlmClient;
use murmur_rag::RetrievalEngine;
use std::sync::Arc;

pub async fn run(question: &str, context_size: Option<usize>) -> Result<()> {
    let db = get_database()?;
    let config = Config::load().context("Failed to load configuration")?;
    let top_k = context_size.unwrap_or(config.retrieval.top_k);

    let client = Arc::new(
        LlmClient::from_config(&config.llm).context("Failed to create LLM client")?,
    );
    let engine = RetrievalEngine::new(db, client.clone());

    let results = engine
        .retrieve(question, top_k, None)
        .await
        .context("Retrieval failed")?;

    if results.is_empty() {
        println!("{}", "The knowledge base is empty.".yellow());
        println!("Run {} first.", "murmur sync".cyan());
        return Ok(());
    }

    let context = RetrievalEngine::build_context(&results);
    let instruction = format!(
        "Answer this question using only the context above: {}",
        question
    );

    let answer = client
        .generate(&context, &instruction)
        .await
        .context("Generation failed")?;

    println!("{}", answer);

    println!("\n{}", "Sources".cyan().bold());
    println!("{}", "─".repeat(40));
    for result in &results {
        println!(
            "  {} {}/{} #{}: {}",
            format!("{:.3}", result.similarity).green(),
            result.fragment.source_type,
            result.fragment.source_id,
            result.fragment.ordinal,
            preview(&result.fragment.content, 60)
        );
    }

    Ok(())
}
