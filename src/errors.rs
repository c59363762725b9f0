use thiserror::Error;

#[derive(Error, Debug)]
pub enum PackError {
    #[error("Pattern must not be empty")]
    EmptyPattern,

    #[error("Pattern '{pattern}' is already in the {set} set")]
    DuplicatePattern { set: PatternSetKind, pattern: String },

    #[error("Pattern '{pattern}' is not in the {set} set")]
    PatternNotFound { set: PatternSetKind, pattern: String },

    #[error("Token budget must be a positive integer, got {0}")]
    InvalidBudget(u64),

    #[error("Unknown path: {0}")]
    UnknownPath(String),

    #[error("Not a selectable text file under the current filters: {0}")]
    NotSelectable(String),

    #[error("Nothing to export: {0}")]
    NothingToExport(String),

    #[error("IO Error: {0}")]
    IoError(String),

    #[error("Archive error: {0}")]
    ArchiveError(String),

    #[error("Invalid repository reference: {0}")]
    InvalidRepository(String),

    #[error("GitHub responded with status {status}: {body}")]
    GitHubError { status: u16, body: String },

    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("Clipboard error: {0}")]
    ClipboardError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Which of the two pattern lists an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternSetKind {
    Include,
    Exclude,
}

impl std::fmt::Display for PatternSetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatternSetKind::Include => write!(f, "include"),
            PatternSetKind::Exclude => write!(f, "exclude"),
        }
    }
}

impl From<std::io::Error> for PackError {
    fn from(err: std::io::Error) -> Self {
        PackError::IoError(err.to_string())
    }
}

impl From<zip::result::ZipError> for PackError {
    fn from(err: zip::result::ZipError) -> Self {
        PackError::ArchiveError(err.to_string())
    }
}

impl From<reqwest::Error> for PackError {
    fn from(err: reqwest::Error) -> Self {
        PackError::HttpError(err.to_string())
    }
}

impl From<serde_json::Error> for PackError {
    fn from(err: serde_json::Error) -> Self {
        PackError::SerializationError(err.to_string())
    }
}
