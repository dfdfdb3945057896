// Assignment question solver
// Main entry point for the solver binary

use clap::Parser;
use sdk::{EngineError, SolverErrorExt};
use solver_engine::cli::{Cli, Command};
use solver_engine::config::Config;
use solver_engine::handlers::{handle_ask, handle_config, handle_serve, OutputFormat};
use solver_engine::telemetry::init_telemetry_with_level;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration (or use custom path if provided)
    let config = if let Some(config_path) = &cli.config {
        Config::load_from_path(config_path)?
    } else {
        Config::load_or_create()?
    };

    // --log wins over the config file; RUST_LOG wins over both
    let level = cli.log.as_deref().unwrap_or(&config.core.log_level);
    init_telemetry_with_level(level);

    let version = env!("CARGO_PKG_VERSION");
    let commit = env!("GIT_COMMIT_HASH");
    let timestamp = env!("BUILD_TIMESTAMP");

    tracing::info!("Solver v{} ({} - {})", version, commit, timestamp);

    // Determine output format
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    // Handle commands
    let result = match cli.command {
        Command::Serve { bind } => {
            tracing::info!("Starting server...");
            handle_serve(config, bind).await
        }

        Command::Ask { question, file } => {
            tracing::info!("Answering question");
            handle_ask(question, file.as_deref(), &config, format).await
        }

        Command::Config => handle_config(&config, format),
    };

    if let Err(err) = &result {
        if let Some(engine_err) = err.downcast_ref::<EngineError>() {
            eprintln!("Hint: {}", engine_err.user_hint());
        }
    }

    result
}
