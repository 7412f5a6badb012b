//! Core library client for python-ast-rag
//!
//! Ties the walker, the extractor and a chunk store together. Use it as a
//! library entry point or through the `python-ast-rag` binary.

use crate::config::Config;
use crate::diagnostics::{CollectingSink, Diagnostic, DiagnosticsSink, TracingSink};
use crate::embedding::FastEmbedManager;
use crate::error::VectorDbError;
use crate::indexer::{ChunkExtractor, CodeChunk, FileWalker, extract_batch};
use crate::types::IndexReport;
use crate::vector_db::{
    ChunkStore, InMemoryChunkStore, LanceChunkStore, SearchOutcome, StoreAdapter,
};
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Main client for indexing Python code and searching the indexed chunks
///
/// # Example
///
/// ```no_run
/// use python_ast_rag::{CodeRagClient, Config};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let mut config = Config::default();
///     config.vector_db.backend = "memory".to_string();
///
///     let client = CodeRagClient::with_config(config).await?;
///     let report = client.index_directory("/path/to/project").await?;
///     println!("Indexed {} chunks", report.chunks_indexed);
///
///     let outcome = client.search("load configuration", 5).await?;
///     for chunk in outcome.chunks {
///         println!("{}", chunk.metadata.chunk_id());
///     }
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct CodeRagClient {
    pub(crate) config: Arc<Config>,
    pub(crate) adapter: StoreAdapter,
}

impl CodeRagClient {
    /// Create a client with configuration loaded from the default location
    pub async fn new() -> Result<Self> {
        let config = Config::new().context("Failed to load configuration")?;
        Self::with_config(config).await
    }

    /// Create a client for the store backend named in `config`
    pub async fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        tracing::info!("Initializing client with '{}' backend", config.vector_db.backend);

        let store: Arc<dyn ChunkStore> = match config.vector_db.backend.as_str() {
            "memory" => Arc::new(InMemoryChunkStore::new()),
            "lancedb" => {
                tracing::debug!("Embedding model: {}", config.embedding.model_name);
                let embedder = Arc::new(
                    FastEmbedManager::from_model_name(&config.embedding.model_name)
                        .context("Failed to initialize embedding provider")?
                        .with_batch_size(Some(config.embedding.batch_size)),
                );
                Arc::new(
                    LanceChunkStore::with_path(
                        &config.vector_db.lancedb_path.to_string_lossy(),
                        embedder,
                    )
                    .await
                    .context("Failed to initialize LanceDB store")?
                    .with_table_name(config.vector_db.table_name.clone()),
                )
            }
            other => return Err(VectorDbError::UnknownBackend(other.to_string()).into()),
        };

        Ok(Self::with_store(config, store))
    }

    /// Create a client over an existing store
    pub fn with_store(config: Config, store: Arc<dyn ChunkStore>) -> Self {
        let adapter = StoreAdapter::new(store, Arc::new(TracingSink))
            .with_batch_size(config.embedding.batch_size);
        Self {
            config: Arc::new(config),
            adapter,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Walk `root`, extract chunks from every Python file and store them
    ///
    /// Files that fail to read or parse are listed in the report's
    /// diagnostics and contribute no chunks; the rest are still indexed.
    pub async fn index_directory(&self, root: impl AsRef<Path>) -> Result<IndexReport> {
        let start = Instant::now();
        let root = root.as_ref().to_path_buf();
        tracing::info!("Indexing {}", root.display());

        let indexing = self.config.indexing.clone();
        let collector = Arc::new(CollectingSink::new());
        let sink = collector.clone();

        // Walking and parsing are CPU/disk bound; keep them off the async workers
        let (files_scanned, chunks) =
            tokio::task::spawn_blocking(move || -> Result<(usize, Vec<CodeChunk>)> {
                let walker = FileWalker::new(&root, indexing.max_file_size)
                    .with_extensions(indexing.extensions)
                    .with_exclude_patterns(indexing.exclude_patterns);
                let units = walker.walk(&*sink)?;
                let chunks = extract_batch(&units, &*sink);
                Ok((units.len(), chunks))
            })
            .await
            .context("Indexing task panicked")??;

        let chunks_indexed = self.adapter.add_chunks(&chunks).await?;

        let diagnostics = collector.drain();
        for diagnostic in &diagnostics {
            TracingSink.report(diagnostic.clone());
        }

        let report = IndexReport {
            files_scanned,
            chunks_indexed,
            diagnostics,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        tracing::info!(
            "Indexed {} chunks from {} files in {} ms ({} diagnostics)",
            report.chunks_indexed,
            report.files_scanned,
            report.duration_ms,
            report.diagnostics.len()
        );
        Ok(report)
    }

    /// Search stored chunks; records that fail to decode are listed in the outcome
    pub async fn search(&self, query: &str, limit: usize) -> Result<SearchOutcome> {
        tracing::debug!("Searching for '{}' (limit {})", query, limit);
        self.adapter.search(query, limit).await
    }

    /// Number of records currently in the store
    pub async fn stored_chunks(&self) -> Result<usize> {
        self.adapter.store().count().await
    }

    /// Extract chunks from a single file without touching the store
    ///
    /// The file path as given is used as the chunk `source_id`.
    pub fn extract_file(path: impl AsRef<Path>) -> Result<(Vec<CodeChunk>, Vec<Diagnostic>)> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let source_id = path.to_string_lossy().replace('\\', "/");

        let sink = CollectingSink::new();
        let chunks = ChunkExtractor::new()?.extract(&text, &source_id, &sink);
        Ok((chunks, sink.drain()))
    }
}

#[cfg(test)]
mod tests;
