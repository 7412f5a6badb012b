//! In-process chunk store
//!
//! Ranks by token overlap between the query and the stored content. Useful
//! for tests and for one-off extraction runs that do not need an embedding
//! model on disk.

use super::{ChunkStore, StoreRecord, StoredHit};
use anyhow::Result;
use std::collections::{BTreeMap, HashSet};
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemoryChunkStore {
    records: RwLock<BTreeMap<String, StoreRecord>>,
}

impl InMemoryChunkStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn clear(&self) {
        self.records.write().await.clear();
    }
}

fn tokenize(text: &str) -> HashSet<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn overlap(query: &HashSet<String>, record: &StoreRecord) -> usize {
    let mut tokens = tokenize(&record.content);
    for (_, value) in record.metadata.iter() {
        if let Some(text) = value.as_str() {
            tokens.extend(tokenize(text));
        }
    }
    query.intersection(&tokens).count()
}

#[async_trait::async_trait]
impl ChunkStore for InMemoryChunkStore {
    async fn add(&self, records: Vec<StoreRecord>) -> Result<()> {
        let mut guard = self.records.write().await;
        for record in records {
            guard.insert(record.id.clone(), record);
        }
        Ok(())
    }

    async fn query(&self, text: &str, k: usize) -> Result<Vec<StoredHit>> {
        let query = tokenize(text);
        let guard = self.records.read().await;

        // BTreeMap iteration is id-ordered and the sort is stable, so ties keep id order
        let mut scored: Vec<(usize, &StoreRecord)> =
            guard.values().map(|r| (overlap(&query, r), r)).collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(_, r)| StoredHit {
                content: r.content.clone(),
                metadata: r.metadata.clone(),
            })
            .collect())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.records.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_db::FlatRecord;

    fn record(id: &str, content: &str) -> StoreRecord {
        let mut metadata = FlatRecord::new();
        metadata.insert("name", id);
        StoreRecord {
            id: id.to_string(),
            content: content.to_string(),
            metadata,
        }
    }

    #[tokio::test]
    async fn test_add_replaces_same_id() {
        let store = InMemoryChunkStore::new();
        store.add(vec![record("a", "old body")]).await.unwrap();
        store.add(vec![record("a", "new body")]).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        let hits = store.query("body", 5).await.unwrap();
        assert_eq!(hits[0].content, "new body");
    }

    #[tokio::test]
    async fn test_query_ranks_by_overlap() {
        let store = InMemoryChunkStore::new();
        store
            .add(vec![
                record("a", "def parse(): pass"),
                record("b", "def parse_config(): load_config()"),
                record("c", "load config from disk"),
            ])
            .await
            .unwrap();

        let hits = store.query("load config", 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].content, "load config from disk");
    }

    #[tokio::test]
    async fn test_ties_keep_id_order() {
        let store = InMemoryChunkStore::new();
        store
            .add(vec![record("z", "nothing"), record("m", "nothing"), record("a", "nothing")])
            .await
            .unwrap();

        let hits = store.query("unrelated", 3).await.unwrap();
        let names: Vec<_> = hits
            .iter()
            .map(|h| h.metadata.get_str("name").unwrap())
            .collect();
        assert_eq!(names, vec!["a", "m", "z"]);
    }

    #[tokio::test]
    async fn test_query_empty_store_and_zero_limit() {
        let store = InMemoryChunkStore::new();
        assert!(store.query("anything", 10).await.unwrap().is_empty());

        store.add(vec![record("a", "x")]).await.unwrap();
        assert!(store.query("x", 0).await.unwrap().is_empty());

        store.clear().await;
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[test]
    fn test_tokenize_splits_on_punctuation() {
        let tokens = tokenize("self.helper(Value_1)");
        assert!(tokens.contains("self"));
        assert!(tokens.contains("helper"));
        assert!(tokens.contains("value_1"));
        assert_eq!(tokens.len(), 3);
    }
}
