
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Select};

use super::{Config, ConfigError, OllamaConfig};
use crate::ollama::OllamaClient;

#[inline]
pub fn run_interactive_config(config_dir: &Path) -> Result<()> {
    eprintln!("{}", style("🔧 Résumé Q&A Configuration Setup").bold().cyan());
    eprintln!();

    let mut config = load_existing_config(config_dir);

    eprintln!("{}", style("Ollama Configuration").bold().yellow());
    eprintln!("Configure your local Ollama instance for embeddings and answers.");
    eprintln!();

    configure_ollama(&mut config.ollama)?;

    eprintln!();
    eprintln!("{}", style("Document & Answers").bold().yellow());
    configure_answering(&mut config)?;

    eprintln!();
    eprintln!("{}", style("Testing configuration...").yellow());

    match test_ollama_connection(&config) {
        ConnectionStatus::Ready => {
            eprintln!("{}", style("✓ Ollama connection successful!").green());
        }
        ConnectionStatus::MissingModels(reason) => {
            eprintln!(
                "{}",
                style("⚠ Warning: Ollama is reachable but a model is missing").yellow()
            );
            eprintln!("  {}", reason);
            eprintln!("Pull the model with 'ollama pull <model>' before asking questions.");
        }
        ConnectionStatus::Unreachable => {
            eprintln!(
                "{}",
                style("⚠ Warning: Could not connect to Ollama").yellow()
            );
            eprintln!("You can continue, but make sure Ollama is running before asking questions.");
        }
    }

    if !config.document_path().is_file() {
        eprintln!(
            "{}",
            style(format!(
                "⚠ Warning: document {} does not exist yet",
                config.document_path().display()
            ))
            .yellow()
        );
    }

    eprintln!();
    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        eprintln!("{}", style("✓ Configuration saved successfully!").green());
        eprintln!(
            "Configuration saved to: {}",
            style(config.config_file_path().display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

#[inline]
pub fn show_config(config_dir: &Path) -> Result<()> {
    let config = Config::load(config_dir).context("Failed to load configuration")?;

    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("Ollama Settings:").bold().yellow());
    eprintln!("  Host: {}", style(&config.ollama.host).cyan());
    eprintln!("  Port: {}", style(config.ollama.port).cyan());
    eprintln!(
        "  Embedding Model: {}",
        style(&config.ollama.embedding_model).cyan()
    );
    eprintln!("  Chat Model: {}", style(&config.ollama.chat_model).cyan());
    eprintln!("  Batch Size: {}", style(config.ollama.batch_size).cyan());
    eprintln!(
        "  Timeout: {}s",
        style(config.ollama.request_timeout_seconds).cyan()
    );
    match config.ollama_url() {
        Ok(url) => eprintln!("  Ollama URL: {}", style(url).cyan()),
        Err(e) => eprintln!("  Ollama URL: {} ({})", style("Invalid").red(), e),
    }

    eprintln!();
    eprintln!("{}", style("Chunking:").bold().yellow());
    eprintln!("  Chunk Size: {}", style(config.chunking.chunk_size).cyan());
    eprintln!("  Overlap: {}", style(config.chunking.overlap).cyan());

    eprintln!();
    eprintln!("{}", style("Answering:").bold().yellow());
    eprintln!("  Subject: {}", style(&config.answer.subject).cyan());
    eprintln!("  Top K: {}", style(config.retrieval.top_k).cyan());
    eprintln!("  Temperature: {}", style(config.answer.temperature).cyan());
    eprintln!("  Max Tokens: {}", style(config.answer.max_tokens).cyan());

    let document = config.document_path();
    eprintln!();
    if document.is_file() {
        eprintln!("Document: {}", style(document.display()).cyan());
    } else {
        eprintln!(
            "Document: {} ({})",
            style(document.display()).red(),
            style("missing").red()
        );
    }
    eprintln!("Config file: {}", style(config.config_file_path().display()).dim());

    Ok(())
}

fn load_existing_config(config_dir: &Path) -> Config {
    if !config_dir.join("config.toml").exists() {
        eprintln!(
            "{}",
            style("No existing configuration found. Using defaults.").yellow()
        );
        return default_config_in(config_dir);
    }

    Config::load(config_dir).map_or_else(
        |e| {
            eprintln!(
                "{}",
                style(format!(
                    "Existing configuration is invalid ({:#}). Using defaults.",
                    e
                ))
                .yellow()
            );
            default_config_in(config_dir)
        },
        |config| {
            eprintln!("{}", style("Found existing configuration.").green());
            config
        },
    )
}

fn default_config_in(config_dir: &Path) -> Config {
    Config {
        base_dir: config_dir.to_path_buf(),
        ..Config::default()
    }
}

fn configure_ollama(ollama: &mut OllamaConfig) -> Result<()> {
    let protocols = &["http", "https"];
    let default_index = protocols
        .iter()
        .position(|&p| p == ollama.protocol)
        .unwrap_or(0);

    let protocol_index = Select::new()
        .with_prompt("Ollama protocol")
        .default(default_index)
        .items(protocols)
        .interact()?;

    let protocol = protocols
        .get(protocol_index)
        .copied()
        .unwrap_or("http")
        .to_string();

    let host: String = Input::new()
        .with_prompt("Ollama host")
        .default(ollama.host.clone())
        .validate_with(|input: &String| -> Result<(), ConfigError> {
            let candidate = OllamaConfig {
                protocol: protocol.clone(),
                host: input.clone(),
                ..OllamaConfig::default()
            };
            candidate.validate()
        })
        .interact_text()?;

    let port: u16 = Input::new()
        .with_prompt("Ollama port")
        .default(ollama.port)
        .validate_with(|input: &u16| -> Result<(), &str> {
            if *input == 0 {
                Err("Port must be greater than 0")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let embedding_model: String = Input::new()
        .with_prompt("Embedding model")
        .default(ollama.embedding_model.clone())
        .validate_with(not_blank("Model name cannot be empty"))
        .interact_text()?;

    let chat_model: String = Input::new()
        .with_prompt("Chat model")
        .default(ollama.chat_model.clone())
        .validate_with(not_blank("Model name cannot be empty"))
        .interact_text()?;

    let batch_size: u32 = Input::new()
        .with_prompt("Batch size for embedding generation")
        .default(ollama.batch_size)
        .validate_with(|input: &u32| -> Result<(), &str> {
            if *input == 0 {
                Err("Batch size must be greater than 0")
            } else if *input > 1000 {
                Err("Batch size must be 1000 or less")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    ollama.set_protocol(protocol)?;
    ollama.set_host(host)?;
    ollama.set_port(port)?;
    ollama.set_embedding_model(embedding_model)?;
    ollama.set_chat_model(chat_model)?;
    ollama.set_batch_size(batch_size)?;

    Ok(())
}

fn configure_answering(config: &mut Config) -> Result<()> {
    let document: String = Input::new()
        .with_prompt("Résumé document path")
        .default(config.document.path.display().to_string())
        .validate_with(not_blank("Document path cannot be empty"))
        .interact_text()?;

    let subject: String = Input::new()
        .with_prompt("Whose résumé is this?")
        .default(config.answer.subject.clone())
        .validate_with(not_blank("Subject cannot be empty"))
        .interact_text()?;

    let top_k: usize = Input::new()
        .with_prompt("Chunks of context per question")
        .default(config.retrieval.top_k)
        .validate_with(|input: &usize| -> Result<(), &str> {
            if (1..=50).contains(input) {
                Ok(())
            } else {
                Err("Top K must be between 1 and 50")
            }
        })
        .interact_text()?;

    config.document.path = PathBuf::from(document.trim());
    config.answer.subject = subject.trim().to_string();
    config.retrieval.top_k = top_k;

    Ok(())
}

fn not_blank(message: &'static str) -> impl Fn(&String) -> Result<(), &'static str> {
    move |input: &String| {
        if input.trim().is_empty() {
            Err(message)
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum ConnectionStatus {
    Ready,
    MissingModels(String),
    Unreachable,
}

fn test_ollama_connection(config: &Config) -> ConnectionStatus {
    let Ok(client) = OllamaClient::new(config) else {
        return ConnectionStatus::Unreachable;
    };
    let client = client.with_timeout(std::time::Duration::from_secs(5));

    if client.ping().is_err() {
        return ConnectionStatus::Unreachable;
    }

    match client.health_check() {
        Ok(()) => ConnectionStatus::Ready,
        Err(e) => ConnectionStatus::MissingModels(format!("{:#}", e)),
    }
}
