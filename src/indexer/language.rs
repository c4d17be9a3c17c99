//! Source language detection from file extensions

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Languages with a symbol provider backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SourceLanguage {
    /// Rust (trait/impl model)
    Rust,
    /// Java (class model)
    Java,
}

impl SourceLanguage {
    /// Detect language from a file extension
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_lowercase().as_str() {
            "rs" => Some(Self::Rust),
            "java" => Some(Self::Java),
            _ => None,
        }
    }

    /// Parse a language name as written in requests (`rust`, `java`, or an extension)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "rust" => Some(Self::Rust),
            "java" => Some(Self::Java),
            other => Self::from_extension(other),
        }
    }

    /// Detect language from a path's extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// File extension used by sources of this language
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Rust => "rs",
            Self::Java => "java",
        }
    }

    /// Visibility modifiers stripped from incoming signatures.
    ///
    /// Ordered so that restricted forms are tried before the bare keyword.
    pub fn visibility_modifiers(&self) -> &'static [&'static str] {
        match self {
            Self::Rust => &["pub(crate)", "pub(super)", "pub(self)", "pub"],
            Self::Java => &["public", "protected", "private"],
        }
    }

    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Rust => "Rust",
            Self::Java => "Java",
        }
    }
}

impl fmt::Display for SourceLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_language() {
        assert_eq!(SourceLanguage::from_extension("rs"), Some(SourceLanguage::Rust));
        assert_eq!(SourceLanguage::from_extension("JAVA"), Some(SourceLanguage::Java));
        assert_eq!(SourceLanguage::from_extension("py"), None);
    }

    #[test]
    fn test_from_name() {
        assert_eq!(SourceLanguage::from_name("Rust"), Some(SourceLanguage::Rust));
        assert_eq!(SourceLanguage::from_name(" java "), Some(SourceLanguage::Java));
        assert_eq!(SourceLanguage::from_name("rs"), Some(SourceLanguage::Rust));
        assert_eq!(SourceLanguage::from_name("kotlin"), None);
    }

    #[test]
    fn test_from_path() {
        assert_eq!(
            SourceLanguage::from_path(Path::new("src/lib.rs")),
            Some(SourceLanguage::Rust)
        );
        assert_eq!(SourceLanguage::from_path(Path::new("Makefile")), None);
    }

    #[test]
    fn test_visibility_order() {
        let mods = SourceLanguage::Rust.visibility_modifiers();
        assert_eq!(mods.last(), Some(&"pub"));
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_string(&SourceLanguage::Java).unwrap();
        assert_eq!(json, "\"java\"");
    }
}
