/// Integration tests for storing chunks and reading them back
use anyhow::Result;
use async_trait::async_trait;
use python_ast_rag::vector_db::{
    FlatRecord, InMemoryChunkStore, StoreRecord, StoredHit, flat_record,
};
use python_ast_rag::{
    ChunkExtractor, ChunkStore, CodecError, CollectingSink, DecodeError, DiagnosticKind,
    StoreAdapter,
};
use std::sync::Arc;

const SOURCE: &str = "\
class Repository:
    def save(self, item):
        validate(item)
        self.backend.write(item)

def validate(item):
    if not item:
        raise ValueError()
";

fn extract_chunks() -> Vec<python_ast_rag::CodeChunk> {
    let mut extractor = ChunkExtractor::new().unwrap();
    extractor.extract(SOURCE, "repo.py", &CollectingSink::new())
}

#[tokio::test]
async fn test_extracted_chunks_round_trip_through_store() -> Result<()> {
    let chunks = extract_chunks();
    assert_eq!(chunks.len(), 3);

    let store = Arc::new(InMemoryChunkStore::new());
    let adapter = StoreAdapter::new(store.clone(), Arc::new(CollectingSink::new()));

    assert_eq!(adapter.add_chunks(&chunks).await?, 3);
    assert_eq!(store.count().await?, 3);

    let outcome = adapter.search("save", 10).await?;
    assert!(outcome.failures.is_empty());
    assert_eq!(outcome.chunks.len(), 3);
    for chunk in &chunks {
        assert!(outcome.chunks.contains(chunk));
    }

    let save = outcome
        .chunks
        .iter()
        .find(|c| c.metadata.name == "save")
        .unwrap();
    assert_eq!(save.metadata.parent_name.as_deref(), Some("Repository"));
    assert!(save.metadata.dependencies.contains("validate"));
    assert!(save.metadata.dependencies.contains("write"));

    Ok(())
}

#[tokio::test]
async fn test_records_without_dependencies_round_trip() -> Result<()> {
    let mut extractor = ChunkExtractor::new()?;
    let chunks = extractor.extract("class Marker:\n    pass\n", "m.py", &CollectingSink::new());

    let record = flat_record::encode(&chunks[0].metadata)?;
    assert_eq!(record.get_str(flat_record::fields::DEPENDENCIES), Some(""));
    assert_eq!(flat_record::decode(&record)?, chunks[0].metadata);
    Ok(())
}

/// Store that hands back whatever it was given plus one corrupt row
struct CorruptingStore {
    inner: InMemoryChunkStore,
}

#[async_trait]
impl ChunkStore for CorruptingStore {
    async fn add(&self, records: Vec<StoreRecord>) -> Result<()> {
        self.inner.add(records).await
    }

    async fn query(&self, text: &str, k: usize) -> Result<Vec<StoredHit>> {
        let mut hits = self.inner.query(text, k).await?;
        let mut corrupt = FlatRecord::new();
        corrupt.insert(flat_record::fields::SOURCE_ID, "legacy.py");
        corrupt.insert(flat_record::fields::KIND, "function");
        corrupt.insert(flat_record::fields::NAME, "old");
        corrupt.insert(flat_record::fields::START_LINE, "12");
        corrupt.insert(flat_record::fields::END_LINE, 14i64);
        corrupt.insert(flat_record::fields::DEPENDENCIES, "");
        hits.insert(0, StoredHit {
            content: "def old(): pass".to_string(),
            metadata: corrupt,
        });
        Ok(hits)
    }

    async fn count(&self) -> Result<usize> {
        self.inner.count().await
    }
}

#[tokio::test]
async fn test_corrupt_record_is_reported_not_dropped() -> Result<()> {
    let store = Arc::new(CorruptingStore {
        inner: InMemoryChunkStore::new(),
    });
    let sink = Arc::new(CollectingSink::new());
    let adapter = StoreAdapter::new(store, sink.clone());

    adapter.add_chunks(&extract_chunks()).await?;
    let outcome = adapter.search("validate", 10).await?;

    assert_eq!(outcome.chunks.len(), 3);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].rank, 0);
    assert!(matches!(
        outcome.failures[0].error,
        CodecError::Decode(DecodeError::WrongType { ref field, .. }) if field == "start_line"
    ));

    let diagnostics = sink.drain();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].source_id, "legacy.py");
    assert_eq!(diagnostics[0].kind, DiagnosticKind::Decode);
    Ok(())
}
