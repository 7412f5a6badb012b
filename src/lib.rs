//! # python-ast-rag - Syntax-Aware Chunking and Search for Python Code
//!
//! Splits Python source into one chunk per class and per function, records
//! the enclosing class and the names each chunk calls, and stores the chunks
//! in a vector store for later retrieval.
//!
//! ## Overview
//!
//! Chunk boundaries come from the tree-sitter syntax tree, never from line
//! counts, so a retrieved chunk is always a complete declaration. Metadata is
//! flattened to a scalar-only record on the way into the store and rebuilt on
//! the way out; records that cannot be rebuilt are reported, not dropped.
//!
//! ## Architecture
//!
//! ```text
//! FileWalker ──► ChunkExtractor (rayon, one per worker) ──► StoreAdapter ──► ChunkStore
//!                      │                                        │          (LanceDB / memory)
//!                      └──────────► DiagnosticsSink ◄───────────┘
//! ```
//!
//! ## Modules
//!
//! - [`indexer`]: File walking and syntax-tree chunk extraction
//! - [`vector_db`]: Metadata codec, store contract, adapter and stores
//! - [`embedding`]: Embedding generation using FastEmbed
//! - [`client`]: High-level index/search client
//! - [`diagnostics`]: Per-unit failure reporting
//! - [`config`]: Configuration management with environment variable support
//! - [`types`]: Chunk metadata and report types
//! - [`error`]: Error types
//! - [`paths`]: Platform-specific default paths
//!
//! ## Usage Example
//!
//! ```no_run
//! use python_ast_rag::{ChunkExtractor, CollectingSink};
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut extractor = ChunkExtractor::new()?;
//!     let sink = CollectingSink::new();
//!
//!     let source = "class A:\n    def m(self):\n        helper()\n";
//!     for chunk in extractor.extract(source, "a.py", &sink) {
//!         println!("{} {:?}", chunk.metadata.chunk_id(), chunk.metadata.dependencies);
//!     }
//!     Ok(())
//! }
//! ```

/// High-level client tying walker, extractor and store together
pub mod client;

/// Configuration management with environment variable overrides
pub mod config;

/// Diagnostics reported for units and records that fail
pub mod diagnostics;

/// Embedding generation using FastEmbed
pub mod embedding;

/// Error types and utilities
pub mod error;

/// File walking and Python chunk extraction
pub mod indexer;

/// Platform-specific default paths
pub mod paths;

/// Chunk metadata and report types
pub mod types;

/// Metadata codec, store contract and chunk stores
pub mod vector_db;

pub use client::CodeRagClient;
pub use config::Config;
pub use diagnostics::{CollectingSink, Diagnostic, DiagnosticKind, DiagnosticsSink, TracingSink};
pub use error::{CodecError, DecodeError, RagError};
pub use indexer::{ChunkExtractor, CodeChunk, SourceUnit, extract_batch};
pub use types::{ChunkKind, ChunkMetadata, IndexReport, LineRange};
pub use vector_db::{ChunkStore, SearchOutcome, StoreAdapter};
