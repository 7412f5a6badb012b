//! LanceDB chunk store (embedded, no server required)
//!
//! Contents are embedded with an [`EmbeddingProvider`] on the way in and the
//! query text is embedded the same way on the way out. Flat metadata fields
//! are stored as their own columns so rows stay inspectable with any Lance
//! reader.

use super::flat_record::fields;
use super::{ChunkStore, FlatRecord, StoreRecord, StoredHit};
use crate::embedding::EmbeddingProvider;
use crate::error::{EmbeddingError, VectorDbError};
use anyhow::{Context, Result};
use arrow_array::{
    Array, FixedSizeListArray, Int64Array, RecordBatch, RecordBatchIterator, StringArray,
    types::Float32Type,
};
use arrow_schema::{DataType, Field, Schema};
use futures::stream::TryStreamExt;
use lancedb::Table;
use lancedb::connection::Connection;
use lancedb::query::{ExecutableQuery, QueryBase};
use std::sync::Arc;

pub const DEFAULT_TABLE_NAME: &str = "code_chunks";

const ID: &str = "id";
const CONTENT: &str = "content";
const VECTOR: &str = "vector";

/// Metadata columns stored as UTF-8 strings, none nullable
const STRING_COLUMNS: [&str; 4] = [
    fields::SOURCE_ID,
    fields::KIND,
    fields::NAME,
    fields::DEPENDENCIES,
];
const INT_COLUMNS: [&str; 2] = [fields::START_LINE, fields::END_LINE];

pub struct LanceChunkStore {
    connection: Connection,
    table_name: String,
    db_path: String,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl LanceChunkStore {
    /// Connect to (or create) a database directory
    pub async fn with_path(db_path: &str, embedder: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        tracing::info!("Connecting to LanceDB at: {}", db_path);

        let connection = lancedb::connect(db_path)
            .execute()
            .await
            .map_err(|e| VectorDbError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            connection,
            table_name: DEFAULT_TABLE_NAME.to_string(),
            db_path: db_path.to_string(),
            embedder,
        })
    }

    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Create schema for the chunk table
    ///
    /// Column order matches the arrays built in `create_record_batch`.
    fn create_schema(dimension: usize) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new(ID, DataType::Utf8, false),
            Field::new(CONTENT, DataType::Utf8, false),
            Field::new(
                VECTOR,
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    dimension as i32,
                ),
                false,
            ),
            Field::new(fields::SOURCE_ID, DataType::Utf8, false),
            Field::new(fields::KIND, DataType::Utf8, false),
            Field::new(fields::NAME, DataType::Utf8, false),
            Field::new(fields::DEPENDENCIES, DataType::Utf8, false),
            Field::new(fields::START_LINE, DataType::Int64, false),
            Field::new(fields::END_LINE, DataType::Int64, false),
            Field::new(fields::PARENT_NAME, DataType::Utf8, true),
        ]))
    }

    async fn table_exists(&self) -> Result<bool> {
        let table_names = self
            .connection
            .table_names()
            .execute()
            .await
            .context("Failed to list tables")?;
        Ok(table_names.contains(&self.table_name))
    }

    /// Open the chunk table, creating it empty on first use
    async fn ensure_table(&self) -> Result<Table> {
        if !self.table_exists().await? {
            let schema = Self::create_schema(self.embedder.dimension());
            let empty_batch = RecordBatch::new_empty(schema.clone());
            let batches = RecordBatchIterator::new(vec![empty_batch].into_iter().map(Ok), schema);

            self.connection
                .create_table(&self.table_name, Box::new(batches))
                .execute()
                .await
                .context("Failed to create table")?;
            tracing::info!("Created table '{}' in {}", self.table_name, self.db_path);
        }

        self.connection
            .open_table(&self.table_name)
            .execute()
            .await
            .context("Failed to open table")
    }

    /// Embed on a blocking thread; ONNX inference is CPU-bound
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let embedder = self.embedder.clone();
        let expected_rows = texts.len();
        let embeddings = tokio::task::spawn_blocking(move || embedder.embed_batch(texts))
            .await
            .context("Embedding task panicked")??;

        if embeddings.len() != expected_rows {
            anyhow::bail!(
                "Embedding provider returned {} vectors for {} texts",
                embeddings.len(),
                expected_rows
            );
        }
        let dimension = self.embedder.dimension();
        if let Some(bad) = embeddings.iter().find(|v| v.len() != dimension) {
            return Err(EmbeddingError::DimensionMismatch {
                expected: dimension,
                actual: bad.len(),
            }
            .into());
        }
        Ok(embeddings)
    }

    /// Convert records and their embeddings to a RecordBatch
    fn create_record_batch(
        records: &[StoreRecord],
        embeddings: Vec<Vec<f32>>,
        schema: Arc<Schema>,
    ) -> Result<RecordBatch> {
        let dimension = embeddings.first().map(Vec::len).unwrap_or_default();

        let vector_array = FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(
            embeddings
                .into_iter()
                .map(|v| Some(v.into_iter().map(Some))),
            dimension as i32,
        );
        let id_array = StringArray::from(records.iter().map(|r| r.id.as_str()).collect::<Vec<_>>());
        let content_array = StringArray::from(
            records
                .iter()
                .map(|r| r.content.as_str())
                .collect::<Vec<_>>(),
        );

        let mut columns: Vec<Arc<dyn Array>> = vec![
            Arc::new(id_array),
            Arc::new(content_array),
            Arc::new(vector_array),
        ];

        for field in STRING_COLUMNS {
            let values = records
                .iter()
                .map(|r| required_str(r, field))
                .collect::<Result<Vec<_>>>()?;
            columns.push(Arc::new(StringArray::from(values)));
        }
        for field in INT_COLUMNS {
            let values = records
                .iter()
                .map(|r| {
                    r.metadata.get_int(field).ok_or_else(|| {
                        anyhow::Error::from(VectorDbError::StoreFailed(format!(
                            "record '{}' has no integer '{}'",
                            r.id, field
                        )))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            columns.push(Arc::new(Int64Array::from(values)));
        }
        columns.push(Arc::new(StringArray::from(
            records
                .iter()
                .map(|r| r.metadata.get_str(fields::PARENT_NAME))
                .collect::<Vec<_>>(),
        )));

        RecordBatch::try_new(schema, columns).context("Failed to create RecordBatch")
    }

    /// Rebuild flat records from a result batch
    ///
    /// Null cells become absent keys, so a row with a missing required value
    /// surfaces as a decode failure for that row only.
    fn hits_from_batch(batch: &RecordBatch) -> Result<Vec<StoredHit>> {
        let content_array = string_column(batch, CONTENT)?;
        let string_arrays = STRING_COLUMNS
            .iter()
            .chain([&fields::PARENT_NAME])
            .map(|name| -> Result<_> { Ok((*name, string_column(batch, name)?)) })
            .collect::<Result<Vec<_>>>()?;
        let int_arrays = INT_COLUMNS
            .iter()
            .map(|name| -> Result<_> {
                let array = batch
                    .column_by_name(name)
                    .and_then(|c| c.as_any().downcast_ref::<Int64Array>())
                    .ok_or_else(|| VectorDbError::InvalidColumn(name.to_string()))?;
                Ok((*name, array))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut hits = Vec::with_capacity(batch.num_rows());
        for i in 0..batch.num_rows() {
            let mut metadata = FlatRecord::new();
            for (name, array) in &string_arrays {
                if !array.is_null(i) {
                    metadata.insert(*name, array.value(i));
                }
            }
            for (name, array) in &int_arrays {
                if !array.is_null(i) {
                    metadata.insert(*name, array.value(i));
                }
            }
            hits.push(StoredHit {
                content: content_array.value(i).to_string(),
                metadata,
            });
        }
        Ok(hits)
    }
}

fn required_str<'a>(record: &'a StoreRecord, field: &str) -> Result<&'a str> {
    record.metadata.get_str(field).ok_or_else(|| {
        VectorDbError::StoreFailed(format!("record '{}' has no string '{}'", record.id, field))
            .into()
    })
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| VectorDbError::InvalidColumn(name.to_string()).into())
}

#[async_trait::async_trait]
impl ChunkStore for LanceChunkStore {
    async fn add(&self, records: Vec<StoreRecord>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let table = self.ensure_table().await?;
        let texts = records.iter().map(|r| r.content.clone()).collect();
        let embeddings = self.embed(texts).await?;

        let schema = Self::create_schema(self.embedder.dimension());
        let batch = Self::create_record_batch(&records, embeddings, schema)?;
        let batch_schema = batch.schema();
        let reader = Box::new(RecordBatchIterator::new(
            vec![batch].into_iter().map(Ok),
            batch_schema,
        ));

        // Upsert keyed by chunk id
        let mut merge = table.merge_insert(&[ID]);
        merge
            .when_matched_update_all(None)
            .when_not_matched_insert_all();
        merge
            .execute(reader)
            .await
            .context("Failed to upsert records")?;

        tracing::debug!("Upserted {} records into '{}'", records.len(), self.table_name);
        Ok(())
    }

    async fn query(&self, text: &str, k: usize) -> Result<Vec<StoredHit>> {
        if k == 0 || !self.table_exists().await? {
            return Ok(vec![]);
        }

        let table = self.ensure_table().await?;
        let query_vector = self
            .embed(vec![text.to_string()])
            .await?
            .pop()
            .context("Embedding provider returned no vector for the query")?;

        let stream = table
            .vector_search(query_vector)
            .context("Failed to create vector search")?
            .limit(k)
            .execute()
            .await
            .context("Failed to execute search")?;

        let results: Vec<RecordBatch> = stream
            .try_collect()
            .await
            .context("Failed to collect search results")?;

        let mut hits = Vec::new();
        for batch in &results {
            hits.extend(Self::hits_from_batch(batch)?);
        }
        Ok(hits)
    }

    async fn count(&self) -> Result<usize> {
        if !self.table_exists().await? {
            return Ok(0);
        }
        let table = self.ensure_table().await?;
        table.count_rows(None).await.context("Failed to count rows")
    }
}
