//! File walking functionality for directory traversal

use super::file_info::FileInfo;
use super::language::SourceLanguage;
use crate::glob_utils::matches_any_pattern;
use anyhow::{Context, Result};
use ignore::WalkBuilder;
use std::fs;
use std::path::{Path, PathBuf};

pub struct FileWalker {
    pub(crate) root: PathBuf,
    pub(crate) max_file_size: usize,
    pub(crate) exclude_patterns: Vec<String>,
    pub(crate) language: Option<SourceLanguage>,
}

impl FileWalker {
    pub fn new(root: impl AsRef<Path>, max_file_size: usize) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            max_file_size,
            exclude_patterns: vec![],
            language: None,
        }
    }

    pub fn with_exclude_patterns(mut self, exclude_patterns: Vec<String>) -> Self {
        self.exclude_patterns = exclude_patterns;
        self
    }

    /// Only collect files of the given language
    pub fn with_language(mut self, language: SourceLanguage) -> Self {
        self.language = Some(language);
        self
    }

    /// Walk the directory and collect all eligible source files.
    ///
    /// Files are returned sorted by path so that every consumer sees the
    /// same order across runs.
    pub fn walk(&self) -> Result<Vec<FileInfo>> {
        if !self.root.exists() {
            anyhow::bail!("Root directory does not exist: {:?}", self.root);
        }
        if !self.root.is_dir() {
            anyhow::bail!("Root path is not a directory: {:?}", self.root);
        }

        let mut files = Vec::new();

        let walker = WalkBuilder::new(&self.root)
            .standard_filters(true) // Respect .gitignore, .ignore, etc.
            .hidden(false)
            .git_ignore(true)
            .git_exclude(true)
            .git_global(false) // A workspace must index the same way on every machine
            .require_git(false)
            .build();

        for entry in walker {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_dir() {
                continue;
            }

            let language = SourceLanguage::from_path(path);
            if language.is_none() {
                continue;
            }
            if self.language.is_some() && language != self.language {
                continue;
            }

            let relative_path = path
                .strip_prefix(&self.root)
                .unwrap_or(path)
                .to_string_lossy()
                .to_string();

            if matches_any_pattern(&relative_path, &self.exclude_patterns) {
                tracing::debug!("Skipping excluded file: {:?}", path);
                continue;
            }

            if let Ok(metadata) = fs::metadata(path)
                && metadata.len() > self.max_file_size as u64
            {
                tracing::debug!("Skipping large file: {:?}", path);
                continue;
            }

            let content = match fs::read_to_string(path) {
                Ok(c) => c,
                Err(e) => {
                    tracing::debug!(
                        "Skipping file that can't be read as UTF-8: {:?}: {}",
                        path,
                        e
                    );
                    continue;
                }
            };

            files.push(FileInfo {
                path: path.to_path_buf(),
                relative_path,
                root_path: self.root.to_string_lossy().to_string(),
                language,
                content,
            });
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        tracing::debug!("Found {} source files under {:?}", files.len(), self.root);
        Ok(files)
    }
}
