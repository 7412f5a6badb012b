//! File walking functionality for directory traversal

use super::file_info::SourceUnit;
use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticsSink};
use crate::error::IndexingError;
use anyhow::{Context, Result};
use ignore::WalkBuilder;
use std::fs;
use std::path::{Path, PathBuf};

pub struct FileWalker {
    pub(crate) root: PathBuf,
    pub(crate) max_file_size: usize,
    pub(crate) extensions: Vec<String>,
    pub(crate) exclude_patterns: Vec<String>,
}

impl FileWalker {
    /// Walker over `.py` files below `root`
    pub fn new(root: impl AsRef<Path>, max_file_size: usize) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            max_file_size,
            extensions: vec!["py".to_string()],
            exclude_patterns: vec![],
        }
    }

    /// Replace the accepted file extensions (compared case-insensitively, without the dot)
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.trim_start_matches('.').to_lowercase())
            .collect();
        self
    }

    pub fn with_exclude_patterns(mut self, exclude_patterns: Vec<String>) -> Self {
        self.exclude_patterns = exclude_patterns;
        self
    }

    /// Walk the directory and read every eligible file into a [`SourceUnit`]
    ///
    /// Files that cannot be read as UTF-8 are reported to `sink` and skipped.
    /// Units are sorted by `source_id` so repeated walks are deterministic.
    pub fn walk(&self, sink: &dyn DiagnosticsSink) -> Result<Vec<SourceUnit>> {
        if !self.root.exists() {
            return Err(IndexingError::DirectoryNotFound(self.root.display().to_string()).into());
        }
        if !self.root.is_dir() {
            return Err(IndexingError::NotADirectory(self.root.display().to_string()).into());
        }

        let mut units = Vec::new();

        let walker = WalkBuilder::new(&self.root)
            .standard_filters(true) // Respect .gitignore, .ignore, etc.
            .hidden(false)
            .git_ignore(true)
            .git_exclude(true)
            .git_global(true)
            .require_git(false)
            .build();

        for entry in walker {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_dir() {
                continue;
            }

            if path.components().any(|c| c.as_os_str() == ".git") {
                continue;
            }

            if !self.has_accepted_extension(path) || !self.matches_patterns(path) {
                continue;
            }

            if let Ok(metadata) = fs::metadata(path)
                && metadata.len() > self.max_file_size as u64
            {
                tracing::debug!("Skipping large file: {:?}", path);
                continue;
            }

            let source_id = self.source_id_for(path);

            let text = match fs::read_to_string(path) {
                Ok(text) => text,
                Err(e) => {
                    sink.report(Diagnostic::new(
                        source_id,
                        DiagnosticKind::Read,
                        format!("failed to read as UTF-8 text: {}", e),
                    ));
                    continue;
                }
            };

            units.push(SourceUnit::new(source_id, text).with_path(path));
        }

        units.sort_by(|a, b| a.source_id.cmp(&b.source_id));
        tracing::info!("Found {} source files under {:?}", units.len(), self.root);
        Ok(units)
    }

    pub(crate) fn has_accepted_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .is_some_and(|e| self.extensions.contains(&e))
    }

    /// File must not match any exclude pattern
    pub(crate) fn matches_patterns(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let path_str = relative.to_string_lossy();

        !self
            .exclude_patterns
            .iter()
            .any(|pattern| path_str.contains(pattern.as_str()))
    }

    /// Relative path with `/` separators on every platform
    pub(crate) fn source_id_for(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}
