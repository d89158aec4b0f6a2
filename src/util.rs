#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use which::which;

use crate::error::ConfigError;

/// Finds and returns the path to the configured compiler binary.
pub fn compiler_path(program: &str) -> Result<OsString> {
    which(program)
        .map(PathBuf::into_os_string)
        .with_context(|| format!("Cannot find a C++ compiler on path ({program})"))
}

/// Lists the entries of `dir` sorted by file name.
///
/// Sorting keeps enumeration order, and with it the run report, stable
/// across filesystems.
pub fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let listing_error = |source| ConfigError::DirectoryListing {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = std::fs::read_dir(dir)
        .map_err(listing_error)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(listing_error)?;

    entries.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(entries)
}

/// Returns the file name of `path` without its extension.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Returns the file name of `path`, or an empty string.
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Truncates `content` to the provided `limit`, appending a notice to indicate
/// omitted text.
pub fn truncate_with_notice(content: &str, limit: usize) -> String {
    if content.len() <= limit {
        return content.to_string();
    }

    let mut end = limit;
    while end > 0 && !content.is_char_boundary(end) {
        end -= 1;
    }

    let mut truncated = content[..end].to_string();
    if let Some(index) = truncated.rfind('\n') {
        truncated.truncate(index);
    }

    truncated.push_str("\n...[TRUNCATED]");
    truncated
}
