//! CLI interface for the solver
//!
//! This module provides the command-line interface using clap's derive API.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Assignment question solver
///
/// Answers course-assignment questions over HTTP, optionally using an
/// uploaded data file.
#[derive(Parser, Debug)]
#[command(name = "solver")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP server
    Serve {
        /// Override the configured bind address
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },

    /// Answer a single question and print the result
    Ask {
        /// The question to answer
        question: String,

        /// Data file to attach
        #[arg(short, long, value_name = "PATH")]
        file: Option<PathBuf>,
    },

    /// Print the effective configuration
    Config,
}
