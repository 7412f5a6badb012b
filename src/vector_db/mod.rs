//! Storage of chunks in a searchable store
//!
//! The store is reached only through the [`ChunkStore`] contract: an
//! idempotent `add` keyed by chunk id and a ranked `query`. Stores see chunk
//! metadata exclusively as [`FlatRecord`]s; [`StoreAdapter`] does the
//! conversion in both directions.

pub mod adapter;
pub mod flat_record;
pub mod lance_store;
pub mod memory_store;

pub use adapter::{RecordFailure, SearchOutcome, StoreAdapter};
pub use flat_record::{FieldValue, FlatRecord};
pub use lance_store::LanceChunkStore;
pub use memory_store::InMemoryChunkStore;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// One row written to the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreRecord {
    /// `source_id:name:start_line`
    pub id: String,
    pub content: String,
    pub metadata: FlatRecord,
}

/// One row returned by a query, in the store's ranking order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredHit {
    pub content: String,
    pub metadata: FlatRecord,
}

/// Contract required of a chunk store
#[async_trait::async_trait]
pub trait ChunkStore: Send + Sync {
    /// Upsert records keyed by `id`; re-adding an id replaces the stored row
    async fn add(&self, records: Vec<StoreRecord>) -> Result<()>;

    /// Return at most `k` records ranked by the store's own similarity
    async fn query(&self, text: &str, k: usize) -> Result<Vec<StoredHit>>;

    /// Number of stored records
    async fn count(&self) -> Result<usize>;
}
