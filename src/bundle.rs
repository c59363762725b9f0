use crate::file::VFile;
use crate::selection::Selection;
use crate::serialize::{to_markdown, to_raw, FileTextSource};
use crate::utils::estimate_tokens;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

pub const SPEC_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    Single,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileMode {
    Stripped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFileEntry {
    pub path: String,
    pub mode: FileMode,
    pub token_estimate: u64,
}

impl PromptFileEntry {
    pub fn stripped(path: impl Into<String>, token_estimate: u64) -> Self {
        PromptFileEntry {
            path: path.into(),
            mode: FileMode::Stripped,
            token_estimate,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecMetadata {
    pub total_tokens_estimate: u64,
    pub warnings: Vec<String>,
}

/// The result of a build: which files go into the bundle and what they cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptSpec {
    pub version: u32,
    pub model_preset: String,
    pub target_token_budget: u64,
    pub layout: Layout,
    pub files: Vec<PromptFileEntry>,
    pub metadata: SpecMetadata,
}

impl PromptSpec {
    pub fn new(model_preset: impl Into<String>, target_token_budget: u64) -> Self {
        PromptSpec {
            version: SPEC_VERSION,
            model_preset: model_preset.into(),
            target_token_budget,
            layout: Layout::Single,
            files: Vec::new(),
            metadata: SpecMetadata::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.iter().any(|e| e.path == path)
    }
}

/// A built spec with both serializations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    pub spec: PromptSpec,
    pub markdown: String,
    pub raw: String,
}

pub fn budget_warning(total: u64, budget: u64) -> Option<String> {
    (total > budget).then(|| format!("Estimated tokens ({}) exceed budget ({})", total, budget))
}

/// Builds the prompt spec for the selected, non-binary files, in selection order.
/// Selected paths that are unknown or binary are skipped.
pub fn build_spec(
    files: &[Arc<VFile>],
    selection: &Selection,
    model_preset: &str,
    budget: u64,
) -> PromptSpec {
    let by_path: HashMap<&str, &VFile> = files.iter().map(|f| (f.path.as_str(), f.as_ref())).collect();
    let mut spec = PromptSpec::new(model_preset, budget);

    for path in selection.iter() {
        let Some(file) = by_path.get(path) else {
            warn!("Selected path {} is not loaded, skipping", path);
            continue;
        };
        if file.binary {
            trace!("Skipping binary file {}", path);
            continue;
        }
        let token_estimate = estimate_tokens(file.text_or_empty());
        trace!("File {} estimated at {} tokens", path, token_estimate);
        spec.files.push(PromptFileEntry::stripped(path, token_estimate));
    }

    let total: u64 = spec.files.iter().map(|e| e.token_estimate).sum();
    spec.metadata.total_tokens_estimate = total;
    if let Some(warning) = budget_warning(total, budget) {
        warn!("{}", warning);
        spec.metadata.warnings.push(warning);
    }
    debug!("Built spec with {} files, {} tokens", spec.files.len(), total);
    spec
}

/// Builds the prompt spec and renders it in both formats.
pub async fn build_bundle(
    files: &[Arc<VFile>],
    selection: &Selection,
    model_preset: &str,
    budget: u64,
) -> Bundle {
    let spec = build_spec(files, selection, model_preset, budget);
    let source = FileTextSource::new(files);
    let markdown = to_markdown(&spec, &source).await;
    let raw = to_raw(&spec, &source).await;
    info!(
        "Bundle built: {} files, ~{} tokens (budget {})",
        spec.files.len(),
        spec.metadata.total_tokens_estimate,
        spec.target_token_budget
    );
    Bundle { spec, markdown, raw }
}
