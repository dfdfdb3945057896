//! Upload file name handling

use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Name used when nothing usable is left after sanitizing
const DEFAULT_NAME: &str = "upload";

/// Reduce a client-supplied file name to a safe basename.
///
/// Directory components are dropped, whitespace becomes `_`, and every
/// character outside `[A-Za-z0-9._-]` is removed. Leading dots and
/// underscores are stripped so the result is never hidden or relative.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);

    let cleaned: String = base
        .chars()
        .filter_map(|c| {
            if c.is_whitespace() {
                Some('_')
            } else if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                Some(c)
            } else {
                None
            }
        })
        .collect();

    let trimmed = cleaned.trim_start_matches(['.', '_']);
    if trimmed.is_empty() {
        DEFAULT_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Whether the name's extension is in the allow-list (case-insensitive)
pub fn is_allowed_extension(name: &str, allowed: &[String]) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            allowed.iter().any(|a| a == &ext)
        })
        .unwrap_or(false)
}

/// Create a per-request scratch directory, under `root` when given.
///
/// The directory and everything in it is removed when the handle drops.
pub fn scratch_dir(root: Option<&Path>) -> io::Result<TempDir> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("solver");
    match root {
        Some(root) => builder.tempdir_in(root),
        None => builder.tempdir(),
    }
}

/// Write an upload into a fresh scratch directory.
pub async fn save_upload(
    root: Option<&Path>,
    file_name: &str,
    bytes: &[u8],
) -> io::Result<(TempDir, PathBuf)> {
    let scratch = scratch_dir(root)?;
    let path = scratch.path().join(file_name);
    tokio::fs::write(&path, bytes).await?;
    Ok((scratch, path))
}
