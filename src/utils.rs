use crate::errors::PackError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tokio::fs as async_fs;

static TRAILING_WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?mR)[ \t]+$").expect("trailing whitespace regex is valid"));
static BLANK_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("blank run regex is valid"));

/// Converts a filesystem path to the slash-separated form used as a file key,
/// dropping any leading `./`.
pub fn normalize_path(path: &Path) -> String {
    let normalized = path.strip_prefix("./").unwrap_or(path);
    normalized.to_string_lossy().replace('\\', "/")
}

/// Strips trailing spaces and tabs from every line, collapses three or more
/// newlines into two, and trims the result.
pub fn compact_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let stripped = TRAILING_WHITESPACE.replace_all(text, "");
    let collapsed = BLANK_RUNS.replace_all(&stripped, "\n\n");
    collapsed.trim().to_owned()
}

/// Coarse token estimate: one token per four UTF-16 code units, rounded up.
pub fn estimate_tokens(text: &str) -> u64 {
    let units = text.encode_utf16().count() as u64;
    units.div_ceil(4)
}

/// File name for exporting a single file: path separators become `_`.
pub fn export_name_for(path: &str, suffix: &str) -> String {
    format!("{}{}", path.replace('/', "_"), suffix)
}

pub async fn read_file_bytes(path: &Path) -> Result<Vec<u8>, PackError> {
    async_fs::read(path)
        .await
        .map_err(|err| PackError::IoError(format!("{}: {}", path.display(), err)))
}

pub async fn write_file(path: &Path, contents: &str) -> Result<(), PackError> {
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent).await?;
    }
    async_fs::write(path, contents)
        .await
        .map_err(|err| PackError::IoError(format!("{}: {}", path.display(), err)))
}
