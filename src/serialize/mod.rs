use crate::file::VFile;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

pub mod markdown;
pub mod raw;

pub use markdown::to_markdown;
pub use raw::to_raw;

/// Resolves file text by path. Implementations may load lazily; `None` means
/// the text is unavailable and serializers substitute an empty string.
#[async_trait]
pub trait TextSource: Send + Sync {
    async fn text(&self, path: &str) -> Option<String>;
}

/// Text lookup over an in-memory file set.
pub struct FileTextSource {
    by_path: HashMap<String, Arc<VFile>>,
}

impl FileTextSource {
    pub fn new(files: &[Arc<VFile>]) -> Self {
        let by_path = files
            .iter()
            .map(|f| (f.path.clone(), Arc::clone(f)))
            .collect();
        FileTextSource { by_path }
    }
}

#[async_trait]
impl TextSource for FileTextSource {
    async fn text(&self, path: &str) -> Option<String> {
        self.by_path.get(path).and_then(|f| f.text.clone())
    }
}

#[async_trait]
impl TextSource for HashMap<String, String> {
    async fn text(&self, path: &str) -> Option<String> {
        self.get(path).cloned()
    }
}
