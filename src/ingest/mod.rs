use crate::errors::PackError;
use crate::file::VFile;
use async_trait::async_trait;
use std::path::PathBuf;

pub mod archive;
pub mod folder;
pub mod github;

pub use archive::{load_zip_bytes, load_zip_file, read_zip};
pub use folder::load_folder;
pub use github::{load_github, GitHubClient, RepoRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Zip,
    Folder,
    GitHub,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Zip => write!(f, "ZIP"),
            SourceKind::Folder => write!(f, "FOLDER"),
            SourceKind::GitHub => write!(f, "GIT"),
        }
    }
}

/// A complete file set from one source. Loading always replaces the whole
/// working set with one of these.
#[derive(Debug, Clone)]
pub struct LoadedSource {
    pub kind: SourceKind,
    pub label: String,
    pub files: Vec<VFile>,
}

#[async_trait]
pub trait Ingestor: Send + Sync {
    async fn ingest(&self) -> Result<LoadedSource, PackError>;
}

pub struct FolderIngestor {
    pub root: PathBuf,
}

#[async_trait]
impl Ingestor for FolderIngestor {
    async fn ingest(&self) -> Result<LoadedSource, PackError> {
        load_folder(&self.root).await
    }
}

pub struct ZipIngestor {
    pub path: PathBuf,
}

#[async_trait]
impl Ingestor for ZipIngestor {
    async fn ingest(&self) -> Result<LoadedSource, PackError> {
        load_zip_file(&self.path).await
    }
}

pub struct GitHubIngestor {
    pub client: GitHubClient,
    pub repo: RepoRef,
    pub git_ref: Option<String>,
}

#[async_trait]
impl Ingestor for GitHubIngestor {
    async fn ingest(&self) -> Result<LoadedSource, PackError> {
        load_github(&self.client, &self.repo, self.git_ref.as_deref()).await
    }
}
