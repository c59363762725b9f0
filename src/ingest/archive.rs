use super::{LoadedSource, SourceKind};
use crate::errors::PackError;
use crate::file::VFile;
use crate::utils::read_file_bytes;
use std::collections::HashSet;
use std::io::{Cursor, Read};
use std::path::Path;
use tracing::{debug, info, warn};
use zip::ZipArchive;

/// Reads every file entry of a ZIP archive. When all entries sit under one
/// top-level folder (as in GitHub zipballs) that folder is stripped.
pub fn read_zip(bytes: &[u8]) -> Result<Vec<VFile>, PackError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut entries: Vec<(String, Vec<u8>)> = Vec::with_capacity(archive.len());

    for index in 0..archive.len() {
        let mut entry = match archive.by_index(index) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable ZIP entry #{}: {}", index, e);
                continue;
            }
        };
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().replace('\\', "/");
        let mut data = Vec::with_capacity(prealloc_len(entry.size()));
        if let Err(e) = entry.read_to_end(&mut data) {
            warn!("Skipping ZIP entry {}: {}", name, e);
            continue;
        }
        entries.push((name.trim_start_matches('/').to_owned(), data));
    }

    let root = common_root(entries.iter().map(|(name, _)| name.as_str()));
    if let Some(root) = &root {
        debug!("Stripping archive root folder {}", root);
    }

    let mut seen = HashSet::new();
    let mut files = Vec::with_capacity(entries.len());
    for (name, data) in entries {
        let path = match &root {
            Some(root) => name[root.len() + 1..].to_owned(),
            None => name,
        };
        if path.is_empty() || path.ends_with('/') {
            continue;
        }
        if !seen.insert(path.clone()) {
            warn!("Duplicate ZIP entry {}, keeping the first", path);
            continue;
        }
        files.push(VFile::new(path, &data));
    }
    Ok(files)
}

/// The declared size comes from the archive header, so the up-front
/// reservation is capped; larger entries grow while reading.
const MAX_PREALLOC: u64 = 1 << 24;

fn prealloc_len(declared: u64) -> usize {
    declared.min(MAX_PREALLOC) as usize
}

fn common_root<'a>(mut names: impl Iterator<Item = &'a str>) -> Option<String> {
    let first = names.next()?;
    let (root, _) = first.split_once('/')?;
    let prefix = format!("{}/", root);
    names
        .all(|name| name.starts_with(&prefix))
        .then(|| root.to_owned())
}

pub async fn load_zip_bytes(bytes: Vec<u8>, kind: SourceKind, label: String) -> Result<LoadedSource, PackError> {
    let files = tokio::task::spawn_blocking(move || read_zip(&bytes))
        .await
        .map_err(|e| PackError::ArchiveError(e.to_string()))??;
    info!("Loaded {} files from {} archive {}", files.len(), kind, label);
    Ok(LoadedSource { kind, label, files })
}

pub async fn load_zip_file(path: &Path) -> Result<LoadedSource, PackError> {
    let bytes = read_file_bytes(path).await?;
    let label = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "archive.zip".to_owned());
    load_zip_bytes(bytes, SourceKind::Zip, label).await
}
