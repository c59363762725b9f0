use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static BINARY_EXTENSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\.(png|jpe?g|gif|bmp|ico|pdf|zip|exe|dll|so|dylib|mp3|mp4|mov|woff2?|ttf)$")
        .expect("binary extension regex is valid")
});

/// Language tag inferred from a file's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Ts,
    Tsx,
    Js,
    Jsx,
    Py,
    Json,
    Md,
    Yml,
    Sh,
    Docker,
    Other,
}

impl Language {
    pub fn from_path(path: &str) -> Self {
        if path.ends_with("Dockerfile") {
            return Language::Docker;
        }
        match path.rsplit_once('.').map(|(_, ext)| ext) {
            Some("ts") => Language::Ts,
            Some("tsx") => Language::Tsx,
            Some("js") => Language::Js,
            Some("jsx") => Language::Jsx,
            Some("py") => Language::Py,
            Some("json") => Language::Json,
            Some("md") => Language::Md,
            Some("yml") | Some("yaml") => Language::Yml,
            Some("sh") => Language::Sh,
            _ => Language::Other,
        }
    }
}

pub fn is_binary_path(path: &str) -> bool {
    BINARY_EXTENSION.is_match(path)
}

/// A snapshot of one source file. Binary files carry no text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VFile {
    pub path: String,
    pub size: u64,
    pub language: Language,
    pub binary: bool,
    pub text: Option<String>,
}

impl VFile {
    /// Builds a file from raw bytes, deciding binary-ness from the path.
    pub fn new(path: impl Into<String>, bytes: &[u8]) -> Self {
        let path = path.into();
        let binary = is_binary_path(&path);
        let text = if binary {
            None
        } else {
            Some(String::from_utf8_lossy(bytes).into_owned())
        };
        VFile {
            language: Language::from_path(&path),
            size: bytes.len() as u64,
            binary,
            text,
            path,
        }
    }

    pub fn text(path: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(path, text.as_bytes())
    }

    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_inference() {
        assert_eq!(Language::from_path("src/app.tsx"), Language::Tsx);
        assert_eq!(Language::from_path("ci/deploy.yaml"), Language::Yml);
        assert_eq!(Language::from_path("docker/Dockerfile"), Language::Docker);
        assert_eq!(Language::from_path("Makefile"), Language::Other);
    }

    #[test]
    fn test_binary_files_have_no_text() {
        let logo = VFile::new("assets/LOGO.PNG", &[0x89, 0x50, 0x4e, 0x47]);
        assert!(logo.binary);
        assert_eq!(logo.text, None);
        assert_eq!(logo.size, 4);

        let font = VFile::new("fonts/a.woff2", b"wOF2");
        assert!(font.binary);

        let source = VFile::text("a.ts", "const x=1;\n");
        assert!(!source.binary);
        assert_eq!(source.text_or_empty(), "const x=1;\n");
    }
}
