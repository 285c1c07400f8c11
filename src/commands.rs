use std::path::Path;

use anyhow::{Context, Result};
use console::style;
use tracing::info;

use crate::config::Config;
use crate::document::{DocumentSource, FileSource};
use crate::orchestrator::Orchestrator;
use crate::server::serve_stdio;

/// Print how the configured document is split into chunks
#[inline]
pub fn show_chunks(config_dir: &Path) -> Result<()> {
    let config = Config::load(config_dir).context("Failed to load configuration")?;
    let document = FileSource::new(config.document_path())
        .load()
        .context("Failed to load document")?;

    let chunks = config
        .chunking
        .split(&document.text, &document.source)
        .context("Failed to split document")?;

    println!(
        "{} ({} chars) → {} chunks (size {}, overlap {})",
        style(&document.source).cyan(),
        document.text.chars().count(),
        chunks.len(),
        config.chunking.chunk_size,
        config.chunking.overlap
    );
    println!();

    for chunk in &chunks {
        println!(
            "{} bytes {}..{}, {} chars",
            style(format!("#{}", chunk.sequence_order)).bold().yellow(),
            chunk.metadata.span.start,
            chunk.metadata.span.end,
            chunk.text.chars().count()
        );
        println!("{}", chunk.text);
        println!();
    }

    Ok(())
}

/// Answer a single question and print the result
#[inline]
pub async fn ask(config_dir: &Path, question: &str, show_context: bool) -> Result<()> {
    let config = Config::load(config_dir).context("Failed to load configuration")?;
    let orchestrator = Orchestrator::from_config(&config)?;

    if show_context {
        let retriever = orchestrator.retriever().await?;
        let top_k = orchestrator.top_k();
        let question = question.to_string();
        let scored =
            tokio::task::spawn_blocking(move || retriever.retrieve_scored(&question, top_k))
                .await
                .context("Retrieval task failed")??;

        eprintln!("{}", style("Retrieved context:").bold().yellow());
        for result in &scored {
            eprintln!(
                "  {} score {:.4}",
                style(format!("#{}", result.chunk.sequence_order)).cyan(),
                result.similarity_score
            );
            for line in result.chunk.text.lines() {
                eprintln!("    {}", style(line).dim());
            }
        }
        eprintln!();
    }

    let answer = orchestrator.answer(question).await?;
    println!("{}", answer);

    Ok(())
}

/// Build the index up front, then answer JSON-line requests on stdio
#[inline]
pub async fn serve(config_dir: &Path) -> Result<()> {
    let config = Config::load(config_dir).context("Failed to load configuration")?;
    let orchestrator = Orchestrator::from_config(&config)?;

    let chunks = orchestrator
        .warm_up()
        .await
        .context("Failed to build document index")?;
    info!(
        "Indexed {} chunks from {}",
        chunks,
        config.document_path().display()
    );

    serve_stdio(&orchestrator).await
}
