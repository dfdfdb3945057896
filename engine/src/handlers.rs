//! Command handlers for CLI operations
//!
//! - serve: Run the HTTP server
//! - ask: Answer one question locally, optionally with a file
//! - config: Print the effective configuration

use anyhow::{Context, Result};
use serde_json::json;
use std::path::Path;

use crate::answer::Dispatcher;
use crate::config::Config;
use crate::extract;
use crate::server;
use sdk::EngineError;

/// Output format for command results
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

/// Run the HTTP server until Ctrl-C
pub async fn handle_serve(mut config: Config, bind: Option<String>) -> Result<()> {
    if let Some(bind) = bind {
        config.server.bind = bind;
    }

    server::serve(&config).await?;
    Ok(())
}

/// Answer a question and print the result
pub async fn handle_ask(
    question: String,
    file: Option<&Path>,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let answer = ask(&question, file, config).await?;

    match format {
        OutputFormat::Text => println!("{}", answer),
        OutputFormat::Json => {
            let output = json!({ "answer": answer });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

/// Answer a question the same way the HTTP endpoint does.
///
/// The file is copied into a scratch directory first so extraction never
/// writes next to the caller's file.
pub async fn ask(question: &str, file: Option<&Path>, config: &Config) -> Result<String> {
    let question = question.trim();
    if question.is_empty() {
        return Err(EngineError::MissingQuestion.into());
    }

    let dispatcher = Dispatcher::from_config(config)?;
    let scratch = server::scratch_dir(config.server.scratch_dir.as_deref())
        .context("Failed to create scratch directory")?;

    let facts = match file {
        Some(path) => {
            let client_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| anyhow::anyhow!("Invalid file path: {}", path.display()))?;

            let file_name = server::sanitize_filename(client_name);
            if !server::is_allowed_extension(&file_name, &config.server.allowed_extensions) {
                return Err(EngineError::FileTypeNotAllowed(client_name.to_string()).into());
            }

            let dest = scratch.path().join(&file_name);
            tokio::fs::copy(path, &dest)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;

            tracing::debug!(file = %file_name, "Copied file into scratch directory");
            Some(extract::extract(&dest, &file_name))
        }
        None => None,
    };

    Ok(dispatcher.answer(question, facts.as_ref()).await)
}

/// Print the effective configuration
pub fn handle_config(config: &Config, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            let text = toml::to_string_pretty(config).context("Failed to serialize config")?;
            println!("{}", text);

            let token = if config.llm.api_token().is_some() {
                "set"
            } else {
                "not set"
            };
            println!("# {}: {}", config.llm.api_key_env, token);
        }
        OutputFormat::Json => {
            let output = json!({
                "config": config,
                "token_set": config.llm.api_token().is_some(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
