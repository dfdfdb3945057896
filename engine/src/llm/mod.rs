//! Remote completion client
//!
//! The dispatcher's last-resort branch hands the question (plus any file
//! summary) to a hosted model. The `LLMProvider` trait is the seam between
//! the dispatcher and the HTTP client so the fallback can be exercised
//! without network access.

use async_trait::async_trait;
use sdk::FileFacts;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod gemini;

/// Result type for LLM operations
pub type Result<T> = std::result::Result<T, LLMError>;

/// Fixed instruction sent with every completion request
pub const SYSTEM_INSTRUCTION: &str = "You are an assistant that answers graded assignment \
questions. Reply with the literal answer only: no explanation, no markdown, no surrounding \
quotes. If the answer is a number, reply with just the number.";

/// Errors that can occur during LLM operations
#[derive(Debug, thiserror::Error)]
pub enum LLMError {
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Timeout")]
    Timeout,

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Message in a prompt
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Role of the message sender
    pub role: MessageRole,

    /// Content of the message
    pub content: String,
}

impl Message {
    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }
}

/// Role of a message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// User message
    User,

    /// System message
    System,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::System => write!(f, "system"),
        }
    }
}

/// LLM Provider trait for the remote completion service
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Returns the name of the provider
    fn name(&self) -> &str;

    /// Generate a completion and return its first text segment
    ///
    /// # Arguments
    /// * `messages` - System instruction followed by the user message
    async fn generate(&self, messages: &[Message]) -> Result<String>;
}

/// Build the prompt for a question and optional file context.
///
/// The user message carries the question, then a `File summary:` block when a
/// file was uploaded, and the extracted `answer` column value if one was found.
pub fn build_prompt(question: &str, facts: Option<&FileFacts>) -> Vec<Message> {
    let mut user = format!("Question:\n{}", question.trim());

    if let Some(facts) = facts {
        user.push_str(&format!(
            "\n\nAttached file: {} ({})\nFile summary:\n{}",
            facts.file_name, facts.kind, facts.summary
        ));
        if let Some(answer) = &facts.csv_answer {
            user.push_str(&format!("\n\nValue of the 'answer' column: {}", answer));
        }
    }

    vec![Message::system(SYSTEM_INSTRUCTION), Message::user(user)]
}
