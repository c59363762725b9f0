use glob::{MatchOptions, Pattern};
use tracing::{trace, warn};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

struct GlobRule {
    negated: bool,
    // None when the pattern failed to compile; such a rule never matches.
    pattern: Option<Pattern>,
}

impl GlobRule {
    fn compile(raw: &str) -> Self {
        let (negated, body) = split_negation(raw);
        let pattern = match Pattern::new(body) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                warn!("Invalid glob pattern '{}': {}", raw, e);
                None
            }
        };
        GlobRule { negated, pattern }
    }

    fn matches(&self, path: &str) -> bool {
        self.pattern
            .as_ref()
            .is_some_and(|pattern| pattern.matches_with(path, MATCH_OPTIONS))
    }
}

/// A compiled pattern list.
///
/// A path matches when at least one plain pattern matches it and no `!`
/// pattern does. Any matching `!` pattern vetoes the whole list. The matcher
/// evaluates exactly what it was given, so an empty list matches nothing.
pub struct GlobMatcher {
    rules: Vec<GlobRule>,
}

impl GlobMatcher {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        let rules = patterns
            .iter()
            .map(|p| GlobRule::compile(p.as_ref()))
            .collect();
        GlobMatcher { rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn is_match(&self, path: &str) -> bool {
        let mut matched = false;
        for rule in &self.rules {
            if rule.matches(path) {
                if rule.negated {
                    trace!("Path {} vetoed by negated pattern", path);
                    return false;
                }
                matched = true;
            }
        }
        matched
    }
}

/// One-shot form of [`GlobMatcher::is_match`].
pub fn matches<S: AsRef<str>>(path: &str, patterns: &[S]) -> bool {
    GlobMatcher::new(patterns).is_match(path)
}

/// Whether a pattern (optionally `!`-prefixed) compiles. Callers use this to
/// flag patterns for display; the matcher itself never fails.
pub fn is_valid_glob(pattern: &str) -> bool {
    let (_, body) = split_negation(pattern);
    Pattern::new(body).is_ok()
}

fn split_negation(raw: &str) -> (bool, &str) {
    match raw.strip_prefix('!') {
        Some(body) => (true, body),
        None => (false, raw),
    }
}
