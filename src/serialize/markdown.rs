use super::TextSource;
use crate::bundle::PromptSpec;
use tracing::{debug, warn};

/// Renders every spec entry as a `## File:` heading followed by a bare fenced
/// block holding the untouched file text.
pub async fn to_markdown(spec: &PromptSpec, source: &dyn TextSource) -> String {
    let mut lines: Vec<String> = Vec::with_capacity(spec.files.len() * 6);
    for entry in &spec.files {
        let text = match source.text(&entry.path).await {
            Some(text) => text,
            None => {
                warn!("No text available for {}, rendering it empty", entry.path);
                String::new()
            }
        };
        lines.push(format!("## File: {}", entry.path));
        lines.push(String::new());
        lines.push("```".to_owned());
        lines.push(text);
        lines.push("```".to_owned());
        lines.push(String::new());
    }
    let markdown = lines.join("\n");
    debug!("Rendered markdown bundle: {} bytes", markdown.len());
    markdown
}
