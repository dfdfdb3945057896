//! Solver SDK
//!
//! Shared types and the error taxonomy used by the engine and its tests.

/// Error types and handling
pub mod errors;

/// Request-scoped data types
pub mod types;

// Re-export commonly used types
pub use errors::{EngineError, SolverErrorExt};
pub use types::{AnswerResponse, ErrorResponse, FileFacts, FileKind};
