//! Error types and handling
//!
//! This module provides the error types shared by the solver crates.
//! All errors implement the `SolverErrorExt` trait which provides user-friendly
//! hints and indicates whether errors are recoverable.
//!
//! # Security
//!
//! Hints are static strings. They never carry the API token, scratch paths
//! or the raw text of upstream responses.

use thiserror::Error;

/// Trait for solver error extensions
///
/// Provides additional context for errors: a user-friendly hint and
/// recoverability information.
pub trait SolverErrorExt {
    /// Returns a user-friendly hint for the error
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors can be retried or worked around. Non-recoverable
    /// errors require a configuration change or restart.
    fn is_recoverable(&self) -> bool;
}

/// Main engine error type
///
/// # Error Categories
///
/// - **Configuration**: Invalid or missing configuration
/// - **Request**: Missing question, disallowed upload, malformed form data
/// - **Network**: Binding the listener, building HTTP clients
/// - **LLM Provider**: API failures, authentication errors
///
/// # Examples
///
/// ```
/// use sdk::errors::{EngineError, SolverErrorExt};
///
/// let error = EngineError::MissingQuestion;
/// assert_eq!(error.to_string(), "No question provided");
/// assert!(error.is_recoverable());
///
/// let fatal = EngineError::Config("bad log level".to_string());
/// assert!(!fatal.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Request errors
    #[error("No question provided")]
    MissingQuestion,

    #[error("File type not allowed: {0}")]
    FileTypeNotAllowed(String),

    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    // LLM provider errors
    #[error("LLM provider error: {0}")]
    LLMProvider(String),

    // Network errors
    #[error("Network error: {0}")]
    Network(String),

    // Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SolverErrorExt for EngineError {
    fn user_hint(&self) -> &str {
        match self {
            Self::Config(_) => "Check your config.toml file for errors",

            Self::MissingQuestion => "Send a non-empty 'question' form field",
            Self::FileTypeNotAllowed(_) => "Upload a csv, xlsx, xls, zip or md file",
            Self::InvalidUpload(_) => "Send the request as multipart/form-data",

            Self::LLMProvider(_) => "Language model unavailable. Check your API token and network",

            Self::Network(_) => "Network operation failed. Check your connection",

            Self::Io(_) => "File system operation failed",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            // Non-recoverable errors
            Self::Config(_) => false,

            // All other errors are potentially recoverable
            _ => true,
        }
    }
}
