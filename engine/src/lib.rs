//! Solver Engine Library
//!
//! This library provides the core functionality of the solver.
//! It is used by both the main binary and integration tests.

/// Configuration management module
pub mod config;

/// Secret handling module
pub mod secrets;

/// Telemetry and Observability
pub mod telemetry;

/// Command execution security module
pub mod command_executor;

/// SHA-256 helpers
pub mod digest;

/// Remote completion client
pub mod llm;

/// Uploaded file extraction
pub mod extract;

/// Answer dispatcher
pub mod answer;

/// HTTP intake
pub mod server;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;
