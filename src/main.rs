use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use resume_qa::commands::{ask, serve, show_chunks};
use resume_qa::config::{get_config_dir, run_interactive_config, show_config};

#[derive(Parser)]
#[command(name = "resume-qa")]
#[command(about = "Answer questions about a résumé with retrieval-augmented generation")]
#[command(version)]
struct Cli {
    /// Configuration directory (defaults to ~/.resume-qa)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure Ollama connection, document and answer settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Print how the document is split into chunks
    Chunks,
    /// Answer a single question about the document
    Ask {
        /// The question to answer
        question: String,
        /// Print the retrieved chunks and their scores to stderr
        #[arg(long)]
        show_context: bool,
    },
    /// Answer JSON-line requests on stdio
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries answers and replies, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_dir = get_config_dir(cli.config_dir.as_deref())?;

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config(&config_dir)?;
            } else {
                run_interactive_config(&config_dir)?;
            }
        }
        Commands::Chunks => {
            show_chunks(&config_dir)?;
        }
        Commands::Ask {
            question,
            show_context,
        } => {
            ask(&config_dir, &question, show_context).await?;
        }
        Commands::Serve => {
            serve(&config_dir).await?;
        }
    }

    Ok(())
}
