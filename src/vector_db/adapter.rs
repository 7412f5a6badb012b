use super::flat_record::{self, fields};
use super::{ChunkStore, StoreRecord};
use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticsSink};
use crate::error::CodecError;
use crate::indexer::CodeChunk;
use anyhow::Result;
use std::sync::Arc;

/// Default number of records per `add` call
pub const DEFAULT_ADD_BATCH_SIZE: usize = 256;

/// A store record that could not be decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFailure {
    /// Position of the record in the store's ranking (0-based)
    pub rank: usize,
    /// `source_id` of the record if it had a readable one
    pub source_id: Option<String>,
    pub error: CodecError,
}

/// Result of a search: decoded chunks plus the records that failed to decode
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    /// Chunks in the store's ranking order
    pub chunks: Vec<CodeChunk>,
    pub failures: Vec<RecordFailure>,
}

/// Bridges chunks and a [`ChunkStore`]
///
/// Computes record ids on the way in and decodes records on the way out. It
/// adds no retries; store errors reach the caller unchanged.
#[derive(Clone)]
pub struct StoreAdapter {
    store: Arc<dyn ChunkStore>,
    sink: Arc<dyn DiagnosticsSink>,
    batch_size: usize,
}

impl StoreAdapter {
    pub fn new(store: Arc<dyn ChunkStore>, sink: Arc<dyn DiagnosticsSink>) -> Self {
        Self {
            store,
            sink,
            batch_size: DEFAULT_ADD_BATCH_SIZE,
        }
    }

    /// Records per `add` call; zero is treated as one
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn store(&self) -> &Arc<dyn ChunkStore> {
        &self.store
    }

    /// Build the record written for `chunk`
    pub fn to_store_record(chunk: &CodeChunk) -> Result<StoreRecord, CodecError> {
        Ok(StoreRecord {
            id: chunk.metadata.chunk_id(),
            content: chunk.content.clone(),
            metadata: flat_record::encode(&chunk.metadata)?,
        })
    }

    /// Persist chunks, returning how many records were written
    ///
    /// Every chunk is encoded before the store is touched, so a schema
    /// violation fails the call without a partial write.
    pub async fn add_chunks(&self, chunks: &[CodeChunk]) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let records = chunks
            .iter()
            .map(Self::to_store_record)
            .collect::<Result<Vec<_>, _>>()?;

        for batch in records.chunks(self.batch_size) {
            self.store.add(batch.to_vec()).await?;
        }

        tracing::info!("Stored {} chunk records", records.len());
        Ok(records.len())
    }

    /// Query the store and decode every hit
    ///
    /// Hits that fail to decode are reported to the diagnostics sink and
    /// listed in [`SearchOutcome::failures`]; the remaining hits are returned
    /// in store order.
    pub async fn search(&self, text: &str, k: usize) -> Result<SearchOutcome> {
        let hits = self.store.query(text, k).await?;
        let mut outcome = SearchOutcome::default();

        for (rank, hit) in hits.into_iter().enumerate() {
            match flat_record::decode(&hit.metadata) {
                Ok(metadata) => outcome.chunks.push(CodeChunk {
                    content: hit.content,
                    metadata,
                }),
                Err(error) => {
                    let source_id = hit.metadata.get_str(fields::SOURCE_ID).map(str::to_string);
                    self.sink.report(Diagnostic::new(
                        source_id.clone().unwrap_or_else(|| format!("<result #{}>", rank)),
                        DiagnosticKind::Decode,
                        error.to_string(),
                    ));
                    outcome.failures.push(RecordFailure {
                        rank,
                        source_id,
                        error,
                    });
                }
            }
        }

        tracing::debug!(
            "Search returned {} chunks ({} undecodable)",
            outcome.chunks.len(),
            outcome.failures.len()
        );
        Ok(outcome)
    }
}
