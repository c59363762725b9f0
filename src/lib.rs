pub mod bundle;
pub mod config;
pub mod errors;
pub mod export;
pub mod file;
pub mod filter;
pub mod ingest;
pub mod logger;
pub mod matcher;
pub mod reporting;
pub mod selection;
pub mod serialize;
pub mod tree;
pub mod utils;
pub mod workspace;

pub use bundle::{Bundle, PromptSpec};
pub use config::PackConfig;
pub use errors::PackError;
pub use file::VFile;
pub use workspace::{SharedWorkspace, Workspace, WorkspaceEvent};
