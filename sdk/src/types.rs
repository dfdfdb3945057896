//! Request-scoped data types shared between the extractor, the dispatcher and the API

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Detected type of an uploaded file
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FileKind {
    /// Zip archive, summarized entry by entry
    Archive,

    /// Comma separated values
    TabularCsv,

    /// Excel-style workbook (xlsx, xls)
    TabularSpreadsheet,

    /// Markdown text
    Markdown,

    /// Anything else
    Unknown,
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileKind::Archive => write!(f, "archive"),
            FileKind::TabularCsv => write!(f, "tabular-csv"),
            FileKind::TabularSpreadsheet => write!(f, "tabular-spreadsheet"),
            FileKind::Markdown => write!(f, "markdown"),
            FileKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// Facts extracted from an uploaded file.
///
/// A value exists only when a file was uploaded, and lives for a single request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileFacts {
    /// Location of the saved upload inside the request's scratch directory
    pub path: PathBuf,

    /// Sanitized client-side file name
    pub file_name: String,

    /// Detected file type
    pub kind: FileKind,

    /// Human-readable summary used as model context
    pub summary: String,

    /// First value of an `answer` column, when a CSV carried one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csv_answer: Option<String>,
}

impl FileFacts {
    /// Create facts with no extracted answer value
    pub fn new(
        path: impl Into<PathBuf>,
        file_name: impl Into<String>,
        kind: FileKind,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            file_name: file_name.into(),
            kind,
            summary: summary.into(),
            csv_answer: None,
        }
    }

    /// Attach an extracted answer value
    pub fn with_csv_answer(mut self, answer: Option<String>) -> Self {
        self.csv_answer = answer;
        self
    }
}

/// Successful API response body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnswerResponse {
    pub answer: String,
}

/// Error API response body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}
