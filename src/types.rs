use crate::diagnostics::Diagnostic;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Kind of declaration a chunk was extracted from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkKind {
    Class,
    /// Plain and `async` functions, including methods
    Function,
}

impl ChunkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkKind::Class => "class",
            ChunkKind::Function => "function",
        }
    }

    /// Parse the stored name of a kind
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "class" => Some(ChunkKind::Class),
            "function" => Some(ChunkKind::Function),
            _ => None,
        }
    }
}

impl fmt::Display for ChunkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 1-based, inclusive line span of a declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

impl LineRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// A range is valid when it starts at line 1 or later and does not run backwards
    pub fn is_valid(&self) -> bool {
        self.start >= 1 && self.start <= self.end
    }

    pub fn line_count(&self) -> usize {
        self.end.saturating_sub(self.start) + 1
    }
}

/// Metadata stored with each code chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Identifier of the originating source unit (usually a relative file path)
    pub source_id: String,
    pub kind: ChunkKind,
    /// Declared identifier of the class or function
    pub name: String,
    pub line_range: LineRange,
    /// Nearest enclosing class. Enclosing functions are never recorded here.
    pub parent_name: Option<String>,
    /// Names invoked directly or as the trailing member of an attribute call
    pub dependencies: BTreeSet<String>,
}

/// Separator used when building chunk ids
pub const CHUNK_ID_SEPARATOR: char = ':';

impl ChunkMetadata {
    /// Addressable identity of a chunk: `source_id:name:start_line`
    ///
    /// Unique within a source unit because no two declarations share both a
    /// name and a start line.
    pub fn chunk_id(&self) -> String {
        format!(
            "{}{sep}{}{sep}{}",
            self.source_id,
            self.name,
            self.line_range.start,
            sep = CHUNK_ID_SEPARATOR
        )
    }
}

/// Summary of one indexing run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexReport {
    /// Number of source files read from disk
    pub files_scanned: usize,
    /// Number of chunks handed to the store
    pub chunks_indexed: usize,
    /// Parse and read failures, one per affected unit
    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
    /// Time taken in milliseconds
    pub duration_ms: u64,
}
