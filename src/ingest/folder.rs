use super::{LoadedSource, SourceKind};
use crate::errors::PackError;
use crate::file::VFile;
use crate::utils::{normalize_path, read_file_bytes};
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Reads every regular file under `root`. Paths are relative to `root`.
/// Entries that cannot be walked or read are skipped.
pub async fn load_folder(root: &Path) -> Result<LoadedSource, PackError> {
    if !root.is_dir() {
        return Err(PackError::IoError(format!("{} is not a directory", root.display())));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let path = normalize_path(relative);
        match read_file_bytes(entry.path()).await {
            Ok(bytes) => {
                debug!("Read {} ({} bytes)", path, bytes.len());
                files.push(VFile::new(path, &bytes));
            }
            Err(e) => warn!("Skipping {}: {}", path, e),
        }
    }

    let label = root
        .canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "folder".to_owned());
    info!("Loaded {} files from folder {}", files.len(), label);

    Ok(LoadedSource {
        kind: SourceKind::Folder,
        label,
        files,
    })
}
