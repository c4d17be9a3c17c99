//! File information structure for indexed source files

use super::language::SourceLanguage;
use std::path::PathBuf;

/// Information about a discovered source file
#[derive(Debug, Clone)]
pub struct FileInfo {
    pub path: PathBuf,
    pub relative_path: String,
    pub root_path: String,
    pub language: Option<SourceLanguage>,
    pub content: String,
}
