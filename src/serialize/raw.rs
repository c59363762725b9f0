use super::TextSource;
use crate::bundle::PromptSpec;
use crate::utils::compact_text;
use tracing::{debug, trace};

/// Renders the prompt spec as `FILE:<path>` blocks of trimmed text, then compacts the
/// result. Files whose text is blank or unavailable are left out.
pub async fn to_raw(spec: &PromptSpec, source: &dyn TextSource) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(spec.files.len());
    for entry in &spec.files {
        let text = source.text(&entry.path).await.unwrap_or_default();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            trace!("Skipping blank file {} in raw bundle", entry.path);
            continue;
        }
        parts.push(format!("FILE:{}\n{}", entry.path, trimmed));
    }
    let raw = compact_text(&parts.join("\n\n"));
    debug!("Rendered raw bundle: {} bytes from {} files", raw.len(), parts.len());
    raw
}
