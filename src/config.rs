use crate::errors::{PackError, PatternSetKind};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

pub const DEFAULT_INCLUDE_PATTERNS: &[&str] = &["**/*"];

pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &[
    // Dependencies
    "**/node_modules/**",
    "**/target/**",
    "**/.venv/**",
    "**/__pycache__/**",
    // Version control
    "**/.git/**",
    "**/.hg/**",
    "**/.svn/**",
    // Binaries
    "**/*.png",
    "**/*.jpg",
    "**/*.jpeg",
    "**/*.gif",
    "**/*.zip",
    "**/*.pdf",
];

pub const DEFAULT_MODEL_PRESET: &str = "Claude 3 Opus (200k)";
pub const DEFAULT_TOKEN_BUDGET: u64 = 180_000;

/// Known model presets as `(label, display name)`. The preset is recorded in
/// the prompt spec and has no other effect, so unlisted labels are accepted too.
pub const MODEL_PRESETS: &[(&str, &str)] = &[
    ("claude-200k", "Claude 3 Opus (200k)"),
    ("gpt-128k", "GPT-4 Turbo (128k)"),
    ("gemini-1.5", "Gemini 1.5 Pro"),
];

/// Maps a preset label to its display name, passing unknown labels through.
pub fn preset_display_name(label: &str) -> &str {
    MODEL_PRESETS
        .iter()
        .find(|(key, _)| *key == label)
        .map(|(_, name)| *name)
        .unwrap_or(label)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PackConfig {
    pub model_preset: String,
    pub target_token_budget: u64,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl Default for PackConfig {
    fn default() -> Self {
        PackConfig {
            model_preset: DEFAULT_MODEL_PRESET.to_owned(),
            target_token_budget: DEFAULT_TOKEN_BUDGET,
            include: DEFAULT_INCLUDE_PATTERNS.iter().map(|s| s.to_string()).collect(),
            exclude: DEFAULT_EXCLUDE_PATTERNS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl PackConfig {
    pub fn from_json_str(json: &str) -> Result<Self, PackError> {
        let config: PackConfig = serde_json::from_str(json)
            .map_err(|e| PackError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub async fn from_json_file(path: &Path) -> Result<Self, PackError> {
        debug!("Loading configuration from {}", path.display());
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| PackError::ConfigError(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), PackError> {
        validate_budget(self.target_token_budget)?;
        check_duplicates(PatternSetKind::Include, &self.include)?;
        check_duplicates(PatternSetKind::Exclude, &self.exclude)?;
        Ok(())
    }
}

pub fn validate_budget(budget: u64) -> Result<(), PackError> {
    if budget == 0 {
        return Err(PackError::InvalidBudget(budget));
    }
    Ok(())
}

pub fn check_duplicates(set: PatternSetKind, patterns: &[String]) -> Result<(), PackError> {
    let mut seen = HashSet::new();
    for pattern in patterns {
        if !seen.insert(pattern.as_str()) {
            return Err(PackError::DuplicatePattern {
                set,
                pattern: pattern.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PackConfig::default();
        assert_eq!(config.include, vec!["**/*".to_string()]);
        assert!(config.exclude.iter().any(|p| p == "**/.git/**"));
        assert!(config.exclude.iter().any(|p| p == "**/node_modules/**"));
        assert_eq!(config.target_token_budget, 180_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config = PackConfig::from_json_str(r#"{"targetTokenBudget": 40000}"#).unwrap();
        assert_eq!(config.target_token_budget, 40_000);
        assert_eq!(config.model_preset, DEFAULT_MODEL_PRESET);
        assert_eq!(config.include, vec!["**/*".to_string()]);
    }

    #[test]
    fn test_rejects_zero_budget_and_duplicates() {
        assert!(matches!(
            PackConfig::from_json_str(r#"{"targetTokenBudget": 0}"#),
            Err(PackError::InvalidBudget(0))
        ));
        assert!(matches!(
            PackConfig::from_json_str(r#"{"exclude": ["a/**", "a/**"]}"#),
            Err(PackError::DuplicatePattern { set: PatternSetKind::Exclude, .. })
        ));
        assert!(matches!(
            PackConfig::from_json_str("not json"),
            Err(PackError::ConfigError(_))
        ));
    }

    #[test]
    fn test_preset_display_name() {
        assert_eq!(preset_display_name("gpt-128k"), "GPT-4 Turbo (128k)");
        assert_eq!(preset_display_name("my-model"), "my-model");
    }
}
