//! Source unit handed to the extractor

use std::path::PathBuf;

/// Raw source text plus the identifier chunks will carry
#[derive(Debug, Clone)]
pub struct SourceUnit {
    /// Logical identifier, normally the path relative to the indexed root
    pub source_id: String,
    pub text: String,
    /// Location on disk, when the unit came from a file
    pub path: Option<PathBuf>,
}

impl SourceUnit {
    pub fn new(source_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            text: text.into(),
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }
}
