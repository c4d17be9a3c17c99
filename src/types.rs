use crate::config::ExtractionConfig;
use crate::context::ExtractOptions;
use crate::indexer::SourceLanguage;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Request to extract the type context of one function
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExtractRequest {
    /// Workspace root directory
    pub workspace: String,
    /// Source file declaring the function, relative to the workspace or absolute
    pub file: String,
    /// Function signature as written in the source (visibility and body are ignored)
    pub signature: String,
    /// Source language (`rust` or `java`); detected from the file extension when omitted
    #[serde(default)]
    pub language: Option<String>,
    /// Merge scattered impl blocks of one type (default from config: true)
    #[serde(default)]
    pub merge_impls: Option<bool>,
    /// Prefix type cards with their project-relative path (default from config: false)
    #[serde(default)]
    pub include_path: Option<bool>,
    /// Keep standard-library types as leaf cards (default from config: true)
    #[serde(default)]
    pub ignore_std: Option<bool>,
    /// Keep trait impls of dependent types (default from config: false)
    #[serde(default)]
    pub include_trait_impls: Option<bool>,
}

impl ExtractRequest {
    /// Request with every option taken from configuration
    pub fn new(
        workspace: impl Into<String>,
        file: impl Into<String>,
        signature: impl Into<String>,
    ) -> Self {
        Self {
            workspace: workspace.into(),
            file: file.into(),
            signature: signature.into(),
            language: None,
            merge_impls: None,
            include_path: None,
            ignore_std: None,
            include_trait_impls: None,
        }
    }

    /// Validate request fields before touching the filesystem
    pub fn validate(&self) -> Result<(), String> {
        if self.workspace.trim().is_empty() {
            return Err("workspace cannot be empty".to_string());
        }
        if self.file.trim().is_empty() {
            return Err("file cannot be empty".to_string());
        }
        if self.signature.trim().is_empty() {
            return Err("signature cannot be empty".to_string());
        }
        if let Some(language) = &self.language
            && SourceLanguage::from_name(language).is_none()
        {
            return Err(format!("unsupported language: {}", language));
        }
        Ok(())
    }

    /// Explicit language if given, otherwise the one implied by the file extension
    pub fn language(&self) -> Option<SourceLanguage> {
        match &self.language {
            Some(name) => SourceLanguage::from_name(name),
            None => SourceLanguage::from_path(Path::new(&self.file)),
        }
    }

    /// Extraction switches: request overrides on top of configuration
    pub fn options(&self, config: &ExtractionConfig) -> ExtractOptions {
        let mut options = ExtractOptions::from(config);
        if let Some(merge) = self.merge_impls {
            options.merge_impls = merge;
        }
        if let Some(include_path) = self.include_path {
            options.include_path = include_path;
        }
        if let Some(ignore_std) = self.ignore_std {
            options.ignore_std = ignore_std;
        }
        if let Some(trait_impls) = self.include_trait_impls {
            options.include_trait_impls = trait_impls;
        }
        options
    }
}

/// Response from an extraction
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExtractResponse {
    /// Rendered type context, empty when no dependent type resolved
    pub context: String,
    /// Language the extraction ran with
    pub language: SourceLanguage,
    /// Number of distinct types visited
    pub types_visited: usize,
    /// Number of declaration blocks in the context
    pub entries: usize,
    /// Time taken in milliseconds
    pub duration_ms: u64,
}

/// Outcome of one request in a batch
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BatchExtractResult {
    pub file: String,
    pub signature: String,
    /// Rendered context, empty when the extraction failed
    pub context: String,
    /// Failure message, if any
    #[serde(default)]
    pub error: Option<String>,
}

impl BatchExtractResult {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}
