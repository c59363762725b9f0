use crate::file::VFile;
use crate::matcher::GlobMatcher;
use std::sync::Arc;
use tracing::debug;

const MATCH_ALL: &[&str] = &["**/*"];

/// Include/exclude matchers with the empty-list defaults applied: an empty
/// include list admits everything, an empty exclude list rejects nothing.
pub struct FileFilter {
    include: GlobMatcher,
    exclude: GlobMatcher,
}

impl FileFilter {
    pub fn new(include: &[String], exclude: &[String]) -> Self {
        let include = if include.is_empty() {
            GlobMatcher::new(MATCH_ALL)
        } else {
            GlobMatcher::new(include)
        };
        FileFilter {
            include,
            exclude: GlobMatcher::new(exclude),
        }
    }

    pub fn accepts(&self, path: &str) -> bool {
        self.include.is_match(path) && !self.exclude.is_match(path)
    }

    pub fn apply(&self, files: &[Arc<VFile>]) -> Vec<Arc<VFile>> {
        files
            .iter()
            .filter(|f| self.accepts(&f.path))
            .cloned()
            .collect()
    }
}

/// Returns the files passing `include` and not matching `exclude`, in input order.
pub fn filter_files(files: &[Arc<VFile>], include: &[String], exclude: &[String]) -> Vec<Arc<VFile>> {
    let filtered = FileFilter::new(include, exclude).apply(files);
    debug!("Filtered {} of {} files", filtered.len(), files.len());
    filtered
}

/// Paths of the filtered, non-binary files: the universe a selection lives in.
pub fn selectable_paths(files: &[Arc<VFile>], include: &[String], exclude: &[String]) -> Vec<String> {
    filter_files(files, include, exclude)
        .iter()
        .filter(|f| !f.binary)
        .map(|f| f.path.clone())
        .collect()
}
