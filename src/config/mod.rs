/// Configuration system for type-context
///
/// Supports loading from multiple sources with priority:
/// CLI args > Environment variables > Config file > Defaults
use crate::error::{ConfigError, ContextError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Context extraction behaviour
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Symbol provider configuration
    #[serde(default)]
    pub provider: ProviderConfig,
}

/// Context extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Merge scattered impl blocks of one type into a single synthesized body
    #[serde(default = "default_true")]
    pub merge_impls: bool,

    /// Prefix each type card with its path relative to the project root marker
    #[serde(default)]
    pub include_path: bool,

    /// Do not descend into types declared in standard-library or external roots
    #[serde(default = "default_true")]
    pub ignore_std: bool,

    /// Keep `impl Trait for Type` blocks for dependent types
    #[serde(default)]
    pub include_trait_impls: bool,

    /// Path segment marking the project root when trimming paths
    #[serde(default = "default_project_root_marker")]
    pub project_root_marker: String,

    /// Upper bound for one whole extraction call, in seconds
    #[serde(default = "default_extraction_timeout")]
    pub timeout_secs: u64,
}

/// Symbol provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Budget for a single provider query, in milliseconds
    #[serde(default = "default_query_timeout")]
    pub query_timeout_ms: u64,

    /// Maximum source file size to index (in bytes)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: usize,

    /// Patterns excluded from the workspace index
    #[serde(default = "default_exclude_patterns")]
    pub exclude_patterns: Vec<String>,

    /// Path fragments identifying standard-library sources
    #[serde(default = "default_std_path_markers")]
    pub std_path_markers: Vec<String>,

    /// Extra source roots indexed as external (e.g. a rust-src checkout)
    #[serde(default)]
    pub external_roots: Vec<PathBuf>,
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_project_root_marker() -> String {
    "src".to_string()
}

fn default_extraction_timeout() -> u64 {
    120
}

fn default_query_timeout() -> u64 {
    5_000
}

fn default_max_file_size() -> usize {
    1_048_576 // 1 MB
}

fn default_exclude_patterns() -> Vec<String> {
    vec![
        "target".to_string(),
        ".git".to_string(),
        "node_modules".to_string(),
        "build".to_string(),
        "out".to_string(),
    ]
}

fn default_std_path_markers() -> Vec<String> {
    vec!["/lib/rustlib/src/rust".to_string()]
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            merge_impls: true,
            include_path: false,
            ignore_std: true,
            include_trait_impls: false,
            project_root_marker: default_project_root_marker(),
            timeout_secs: default_extraction_timeout(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            query_timeout_ms: default_query_timeout(),
            max_file_size: default_max_file_size(),
            exclude_patterns: default_exclude_patterns(),
            std_path_markers: default_std_path_markers(),
            external_roots: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn from_file(path: &Path) -> Result<Self, ContextError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()).into());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadFailed(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseFailed(format!("Invalid TOML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default location or create default
    pub fn load_or_default() -> Result<Self, ContextError> {
        let config_path = crate::paths::PlatformPaths::default_config_path();

        if config_path.exists() {
            tracing::info!("Loading config from: {}", config_path.display());
            Self::from_file(&config_path)
        } else {
            tracing::debug!("No config file found, using defaults");
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<(), ContextError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::SaveFailed(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SaveFailed(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| ConfigError::SaveFailed(format!("Failed to write config file: {}", e)))?;

        tracing::info!("Saved config to: {}", path.display());
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ContextError> {
        if self.extraction.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "extraction.timeout_secs".to_string(),
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        if self.extraction.project_root_marker.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "extraction.project_root_marker".to_string(),
                reason: "must not be empty".to_string(),
            }
            .into());
        }

        if self.extraction.project_root_marker.contains('/') {
            return Err(ConfigError::InvalidValue {
                key: "extraction.project_root_marker".to_string(),
                reason: format!(
                    "must be a single path segment, got '{}'",
                    self.extraction.project_root_marker
                ),
            }
            .into());
        }

        if self.provider.query_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "provider.query_timeout_ms".to_string(),
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        if self.provider.max_file_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "provider.max_file_size".to_string(),
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var("TYPE_CONTEXT_MERGE_IMPLS")
            && let Some(flag) = parse_flag(&value)
        {
            self.extraction.merge_impls = flag;
        }

        if let Ok(value) = std::env::var("TYPE_CONTEXT_INCLUDE_PATH")
            && let Some(flag) = parse_flag(&value)
        {
            self.extraction.include_path = flag;
        }

        if let Ok(value) = std::env::var("TYPE_CONTEXT_IGNORE_STD")
            && let Some(flag) = parse_flag(&value)
        {
            self.extraction.ignore_std = flag;
        }

        if let Ok(value) = std::env::var("TYPE_CONTEXT_TIMEOUT_SECS")
            && let Ok(secs) = value.parse()
        {
            self.extraction.timeout_secs = secs;
        }

        if let Ok(value) = std::env::var("TYPE_CONTEXT_QUERY_TIMEOUT_MS")
            && let Ok(millis) = value.parse()
        {
            self.provider.query_timeout_ms = millis;
        }

        if let Ok(roots) = std::env::var("TYPE_CONTEXT_EXTERNAL_ROOTS") {
            self.provider.external_roots = roots
                .split(':')
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from)
                .collect();
        }
    }

    /// Create a new Config with defaults and environment overrides
    pub fn new() -> Result<Self, ContextError> {
        let mut config = Self::load_or_default()?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
