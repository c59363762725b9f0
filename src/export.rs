use crate::errors::PackError;
use crate::utils::write_file;
use arboard::Clipboard;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const MARKDOWN_FILENAME: &str = "promptpack.md";
pub const RAW_FILENAME: &str = "promptpack.raw.txt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportTarget {
    Markdown,
    Raw,
    /// The active file's text, verbatim.
    ActiveFile,
    /// The active file's text, compacted.
    ActiveFileRaw,
}

/// A named text artifact ready to be handed to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub filename: String,
    pub contents: String,
}

impl Export {
    /// Refuses blank contents so callers never produce an empty artifact.
    pub fn new(filename: impl Into<String>, contents: impl Into<String>) -> Result<Self, PackError> {
        let filename = filename.into();
        let contents = contents.into();
        if contents.trim().is_empty() {
            return Err(PackError::NothingToExport(format!("{} would be empty", filename)));
        }
        Ok(Export { filename, contents })
    }
}

#[async_trait]
pub trait Exporter: Send + Sync {
    async fn export(&self, export: &Export) -> Result<(), PackError>;
}

/// Writes exports into a directory under their suggested file names.
pub struct FileExporter {
    out_dir: PathBuf,
}

impl FileExporter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        FileExporter {
            out_dir: out_dir.into(),
        }
    }

    pub fn path_for(&self, export: &Export) -> PathBuf {
        self.out_dir.join(&export.filename)
    }
}

#[async_trait]
impl Exporter for FileExporter {
    async fn export(&self, export: &Export) -> Result<(), PackError> {
        let path = self.path_for(export);
        debug!("Writing {} bytes to {}", export.contents.len(), path.display());
        write_file(&path, &export.contents).await?;
        info!("Wrote {}", path.display());
        Ok(())
    }
}

pub struct ClipboardExporter;

#[async_trait]
impl Exporter for ClipboardExporter {
    async fn export(&self, export: &Export) -> Result<(), PackError> {
        let mut clipboard =
            Clipboard::new().map_err(|e| PackError::ClipboardError(e.to_string()))?;
        clipboard
            .set_text(export.contents.clone())
            .map_err(|e| PackError::ClipboardError(e.to_string()))?;
        info!("Copied {} to clipboard ({} bytes)", export.filename, export.contents.len());
        Ok(())
    }
}

/// Writes every export into `out_dir`, returning the written paths.
pub async fn write_exports(out_dir: &Path, exports: &[Export]) -> Result<Vec<PathBuf>, PackError> {
    let exporter = FileExporter::new(out_dir);
    let mut written = Vec::with_capacity(exports.len());
    for export in exports {
        exporter.export(export).await?;
        written.push(exporter.path_for(export));
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_blank_export_is_refused() {
        assert!(matches!(
            Export::new(RAW_FILENAME, " \n\t"),
            Err(PackError::NothingToExport(_))
        ));
        assert!(Export::new(RAW_FILENAME, "FILE:a.ts\nx").is_ok());
    }

    #[tokio::test]
    async fn test_write_exports_creates_files() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("nested/out");
        let exports = vec![
            Export::new(MARKDOWN_FILENAME, "## File: a.ts\n").unwrap(),
            Export::new(RAW_FILENAME, "FILE:a.ts\nx").unwrap(),
        ];
        let written = write_exports(&out, &exports).await.unwrap();
        assert_eq!(written, vec![out.join(MARKDOWN_FILENAME), out.join(RAW_FILENAME)]);
        let raw = tokio::fs::read_to_string(out.join(RAW_FILENAME)).await.unwrap();
        assert_eq!(raw, "FILE:a.ts\nx");
    }
}
