//! Source discovery and syntax-tree chunk extraction
//!
//! Provides functionality to walk directories for Python sources, parse them
//! with tree-sitter, and turn class and function declarations into chunks.

mod ast_parser;
mod batch;
mod file_info;
mod file_walker;

pub use ast_parser::ChunkExtractor;
pub use batch::extract_batch;
pub use file_info::SourceUnit;
pub use file_walker::FileWalker;

use crate::types::ChunkMetadata;
use serde::{Deserialize, Serialize};

/// A class or function declaration ready for storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeChunk {
    /// Exact source text of the declaration, nested declarations included
    pub content: String,
    /// Metadata about this chunk (source, kind, scope, dependencies)
    pub metadata: ChunkMetadata,
}
