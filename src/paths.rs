/// Centralized path computation
///
/// Platform config locations follow the XDG Base Directory specification on
/// Unix-like systems. Workspace paths are canonicalized once per call and
/// rendered relative to the project root marker in type cards.
use crate::error::{ContextError, ValidationError};
use std::path::{Path, PathBuf};

/// Platform-agnostic path utilities
pub struct PlatformPaths;

impl PlatformPaths {
    /// Get the appropriate config directory for the current platform
    ///
    /// - Windows: %APPDATA%
    /// - macOS: ~/Library/Application Support
    /// - Linux/Unix: $XDG_CONFIG_HOME or ~/.config
    pub fn config_dir() -> PathBuf {
        if cfg!(target_os = "windows") {
            std::env::var("APPDATA")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("."))
        } else if cfg!(target_os = "macos") {
            std::env::var("HOME")
                .map(|home| PathBuf::from(home).join("Library/Application Support"))
                .unwrap_or_else(|_| PathBuf::from("."))
        } else {
            std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .or_else(|_| std::env::var("HOME").map(|home| PathBuf::from(home).join(".config")))
                .unwrap_or_else(|_| PathBuf::from("."))
        }
    }

    /// Returns: {config_dir}/type-context
    pub fn project_config_dir() -> PathBuf {
        Self::config_dir().join("type-context")
    }

    /// Returns: {config_dir}/type-context/config.toml
    pub fn default_config_path() -> PathBuf {
        Self::project_config_dir().join("config.toml")
    }
}

/// Canonicalize a workspace directory, rejecting missing or non-directory paths
pub fn normalize_workspace(path: &str) -> Result<PathBuf, ContextError> {
    let path = Path::new(path);
    if !path.exists() {
        return Err(ValidationError::PathNotFound(path.display().to_string()).into());
    }
    let canonical = path.canonicalize()?;
    if !canonical.is_dir() {
        return Err(ValidationError::NotADirectory(canonical.display().to_string()).into());
    }
    Ok(canonical)
}

/// Resolve `file` against `workspace` unless it is already absolute
pub fn resolve_in_workspace(workspace: &Path, file: &str) -> PathBuf {
    let file = Path::new(file);
    if file.is_absolute() {
        file.to_path_buf()
    } else {
        workspace.join(file)
    }
}

/// Trim every segment before the one preceding the last `marker` segment.
///
/// `xxx/yyy/src/zzz.rs` becomes `yyy/src/zzz.rs`. Paths without the marker
/// are returned unchanged.
pub fn trim_to_project_root(path: &str, marker: &str) -> String {
    let parts: Vec<&str> = path.split('/').collect();
    match parts.iter().rposition(|part| *part == marker) {
        Some(idx) => parts[idx.saturating_sub(1)..].join("/"),
        None => path.to_string(),
    }
}
