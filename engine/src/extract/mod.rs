//! File materializer
//!
//! Turns a saved upload into [`FileFacts`]: a detected [`FileKind`] plus a
//! human-readable summary that is handed to the completion client as context.
//!
//! # Summaries
//!
//! - **CSV**: row/column counts, the header and the first rows
//! - **Spreadsheet**: the same for every sheet of the workbook
//! - **Markdown**: the raw text
//! - **Archive**: one summary per entry, each entry extracted to scratch
//!   storage, summarized, then deleted
//!
//! Archive entries larger than [`MAX_ENTRY_BYTES`] are not extracted, and
//! every summary is cut to [`MAX_SUMMARY_BYTES`].
//!
//! Extraction never fails a request. Unsupported content becomes
//! `Unsupported file type: <name>` and read errors become
//! `Error reading <name>: <reason>` inside the summary.

use calamine::{open_workbook_auto, Data, Reader};
use sdk::{FileFacts, FileKind};
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use zip::ZipArchive;

/// Number of data rows shown in a tabular preview
pub const HEAD_ROWS: usize = 5;

/// Maximum nesting of archives inside archives
pub const MAX_ARCHIVE_DEPTH: usize = 3;

/// Largest archive entry that is extracted for summarizing
pub const MAX_ENTRY_BYTES: u64 = 10 * 1024 * 1024;

/// Upper bound on the length of any summary
pub const MAX_SUMMARY_BYTES: usize = 64 * 1024;

const TRUNCATED_MARKER: &str = "\n[truncated]";

/// Local file header signature of a zip archive
const ZIP_MAGIC: &[u8; 4] = b"PK\x03\x04";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Csv(#[from] csv::Error),

    #[error("{0}")]
    Spreadsheet(String),

    #[error("{0}")]
    Archive(#[from] zip::result::ZipError),
}

/// Summary of one file, before it is attached to a path
struct Summary {
    kind: FileKind,
    text: String,
    csv_answer: Option<String>,
}

/// Extract facts from a saved upload.
///
/// `file_name` is the sanitized client-side name; it drives type detection
/// and appears in messages.
pub fn extract(path: &Path, file_name: &str) -> FileFacts {
    let summary = summarize(path, file_name, 0);

    tracing::debug!(
        file = file_name,
        kind = %summary.kind,
        summary_len = summary.text.len(),
        "Extracted upload"
    );

    FileFacts::new(path, file_name, summary.kind, summary.text).with_csv_answer(summary.csv_answer)
}

/// Detect the type of a file by extension, then by magic bytes.
pub fn detect_kind(path: &Path, file_name: &str) -> FileKind {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("zip") => return FileKind::Archive,
        Some("csv") => return FileKind::TabularCsv,
        Some("xlsx") | Some("xls") => return FileKind::TabularSpreadsheet,
        Some("md") | Some("markdown") => return FileKind::Markdown,
        _ => {}
    }

    let mut header = [0u8; 4];
    let sniffed = File::open(path)
        .and_then(|mut f| f.read_exact(&mut header))
        .is_ok();

    if sniffed && &header == ZIP_MAGIC {
        FileKind::Archive
    } else {
        FileKind::Unknown
    }
}

fn summarize(path: &Path, file_name: &str, depth: usize) -> Summary {
    let kind = detect_kind(path, file_name);

    let result = match kind {
        FileKind::TabularCsv => summarize_csv(path),
        FileKind::TabularSpreadsheet => summarize_spreadsheet(path).map(|text| (text, None)),
        FileKind::Markdown => read_markdown(path).map(|text| (text, None)),
        FileKind::Archive => summarize_archive(path, depth),
        FileKind::Unknown => Ok((format!("Unsupported file type: {}", file_name), None)),
    };

    match result {
        Ok((text, csv_answer)) => Summary {
            kind,
            text: truncate_summary(text),
            csv_answer,
        },
        Err(e) => {
            tracing::warn!(file = file_name, error = %e, "Failed to summarize file");
            Summary {
                kind,
                text: format!("Error reading {}: {}", file_name, e),
                csv_answer: None,
            }
        }
    }
}

/// Cut `text` to at most [`MAX_SUMMARY_BYTES`], marking the cut.
fn truncate_summary(mut text: String) -> String {
    if text.len() <= MAX_SUMMARY_BYTES {
        return text;
    }

    let mut cut = MAX_SUMMARY_BYTES - TRUNCATED_MARKER.len();
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
    text.push_str(TRUNCATED_MARKER);
    text
}

fn read_markdown(path: &Path) -> Result<String, ExtractError> {
    let mut bytes = Vec::new();
    File::open(path)?
        .take(MAX_SUMMARY_BYTES as u64 + 1)
        .read_to_end(&mut bytes)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Render a tabular preview shared by CSV and spreadsheet summaries.
fn format_table(headers: &[String], rows: &[Vec<String>], total_rows: usize) -> String {
    let mut out = format!(
        "Rows: {}, Columns: {}\nColumns: {}",
        total_rows,
        headers.len(),
        headers.join(", ")
    );

    if !rows.is_empty() {
        out.push_str(&format!("\nFirst {} rows:", rows.len()));
        for row in rows {
            out.push('\n');
            out.push_str(&row.join(" | "));
        }
    }

    out
}

fn summarize_csv(path: &Path) -> Result<(String, Option<String>), ExtractError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let answer_col = headers.iter().position(|h| h == "answer");

    let mut head = Vec::new();
    let mut total_rows = 0usize;
    let mut csv_answer = None;

    for result in reader.records() {
        let record = result?;
        if total_rows == 0 {
            csv_answer = answer_col.and_then(|i| record.get(i)).map(|v| v.to_string());
        }
        if head.len() < HEAD_ROWS {
            head.push(record.iter().map(String::from).collect());
        }
        total_rows += 1;
    }

    Ok((format_table(&headers, &head, total_rows), csv_answer))
}

fn summarize_spreadsheet(path: &Path) -> Result<String, ExtractError> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| ExtractError::Spreadsheet(format!("Failed to open workbook: {}", e)))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    if sheet_names.is_empty() {
        return Err(ExtractError::Spreadsheet(
            "Workbook contains no sheets".to_string(),
        ));
    }

    let mut sections = Vec::with_capacity(sheet_names.len());
    for sheet_name in &sheet_names {
        let range = workbook.worksheet_range(sheet_name).map_err(|e| {
            ExtractError::Spreadsheet(format!("Failed to read sheet '{}': {}", sheet_name, e))
        })?;

        let mut rows = range.rows();
        let headers: Vec<String> = rows
            .next()
            .map(|r| r.iter().map(cell_text).collect())
            .unwrap_or_default();
        let head: Vec<Vec<String>> = rows
            .by_ref()
            .take(HEAD_ROWS)
            .map(|r| r.iter().map(cell_text).collect())
            .collect();
        let total_rows = range.height().saturating_sub(1);

        sections.push(format!(
            "Sheet: {}\n{}",
            sheet_name,
            format_table(&headers, &head, total_rows)
        ));
    }

    Ok(sections.join("\n\n"))
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

fn summarize_archive(path: &Path, depth: usize) -> Result<(String, Option<String>), ExtractError> {
    if depth >= MAX_ARCHIVE_DEPTH {
        return Ok(("Archive nested too deeply; not expanded".to_string(), None));
    }

    let mut archive = ZipArchive::new(File::open(path)?)?;

    // Entries are materialized next to the archive and removed with this directory
    let scratch_parent = path.parent().unwrap_or_else(|| Path::new("."));
    let scratch = tempfile::Builder::new()
        .prefix("entries")
        .tempdir_in(scratch_parent)?;

    let mut sections = Vec::new();
    let mut summary_len = 0usize;
    let mut csv_answer = None;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if entry.is_dir() {
            continue;
        }

        let entry_name = entry.name().to_string();
        let Some(enclosed) = entry.enclosed_name() else {
            tracing::warn!(entry = %entry_name, "Skipping archive entry with unsafe path");
            continue;
        };
        let base_name = enclosed
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("entry")
            .to_string();

        let entry_path = scratch.path().join(format!("{}_{}", index, base_name));
        let copied = copy_entry(&mut entry, &entry_path);

        let summary = match copied {
            Ok(()) => summarize(&entry_path, &base_name, depth + 1),
            Err(reason) => {
                tracing::warn!(entry = %entry_name, %reason, "Skipping archive entry");
                Summary {
                    kind: FileKind::Unknown,
                    text: format!("Error reading {}: {}", entry_name, reason),
                    csv_answer: None,
                }
            }
        };
        fs::remove_file(&entry_path).ok();

        if csv_answer.is_none() {
            csv_answer = summary.csv_answer;
        }

        let section = format!("--- {} ---\n{}", entry_name, summary.text);
        summary_len += section.len() + 2;
        sections.push(section);
        if summary_len > MAX_SUMMARY_BYTES {
            break;
        }
    }

    if sections.is_empty() {
        return Ok(("Archive contains no files".to_string(), csv_answer));
    }

    Ok((sections.join("\n\n"), csv_answer))
}

/// Copy one archive entry to `dest`, refusing entries over [`MAX_ENTRY_BYTES`].
///
/// The declared size is checked first; the copy itself is bounded as well
/// since the declared size comes from the archive.
fn copy_entry<R: Read>(
    entry: &mut zip::read::ZipFile<'_, R>,
    dest: &Path,
) -> Result<(), String> {
    if entry.size() > MAX_ENTRY_BYTES {
        return Err("entry too large".to_string());
    }

    let mut out = File::create(dest).map_err(|e| e.to_string())?;
    let copied = std::io::copy(&mut entry.by_ref().take(MAX_ENTRY_BYTES + 1), &mut out)
        .map_err(|e| e.to_string())?;

    if copied > MAX_ENTRY_BYTES {
        return Err("entry too large".to_string());
    }
    Ok(())
}
