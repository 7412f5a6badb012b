use super::EmbeddingProvider;
use crate::error::EmbeddingError;
use anyhow::Result;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::sync::Mutex;

/// Model used when the configuration does not name one
pub const DEFAULT_MODEL_NAME: &str = "all-MiniLM-L6-v2";

/// Map a configured model name to the FastEmbed model and its vector dimension
pub(crate) fn resolve_model(name: &str) -> Result<(EmbeddingModel, usize), EmbeddingError> {
    match name {
        "all-MiniLM-L6-v2" => Ok((EmbeddingModel::AllMiniLML6V2, 384)),
        "all-MiniLM-L12-v2" => Ok((EmbeddingModel::AllMiniLML12V2, 384)),
        "BAAI/bge-small-en-v1.5" => Ok((EmbeddingModel::BGESmallENV15, 384)),
        "BAAI/bge-base-en-v1.5" => Ok((EmbeddingModel::BGEBaseENV15, 768)),
        other => Err(EmbeddingError::UnknownModel(other.to_string())),
    }
}

/// FastEmbed-based embedding provider
///
/// `TextEmbedding::embed` needs `&mut self`, so the model sits behind a mutex.
/// Callers run embedding on blocking threads and never hold the lock across
/// an await point.
pub struct FastEmbedManager {
    model: Mutex<TextEmbedding>,
    model_name: String,
    dimension: usize,
    batch_size: Option<usize>,
}

impl FastEmbedManager {
    /// Create a new FastEmbedManager with the default model (all-MiniLM-L6-v2)
    pub fn new() -> Result<Self> {
        Self::from_model_name(DEFAULT_MODEL_NAME)
    }

    /// Create a manager for a model named in the configuration
    pub fn from_model_name(name: &str) -> Result<Self> {
        let (model, dimension) = resolve_model(name)?;
        tracing::info!("Initializing FastEmbed model: {} ({} dims)", name, dimension);

        let mut options = InitOptions::default();
        options.model_name = model;
        options.show_download_progress = true;

        let embedding_model = TextEmbedding::try_new(options)
            .map_err(|e| EmbeddingError::InitializationFailed(e.to_string()))?;

        Ok(Self {
            model: Mutex::new(embedding_model),
            model_name: name.to_string(),
            dimension,
            batch_size: None,
        })
    }

    /// Texts per ONNX run; `None` keeps FastEmbed's default
    pub fn with_batch_size(mut self, batch_size: Option<usize>) -> Self {
        self.batch_size = batch_size;
        self
    }
}

impl EmbeddingProvider for FastEmbedManager {
    fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        tracing::debug!("Generating embeddings for {} texts", texts.len());

        let mut model = self
            .model
            .lock()
            .map_err(|e| anyhow::anyhow!("Embedding model lock poisoned: {}", e))?;
        let embeddings = model
            .embed(texts, self.batch_size)
            .map_err(|e| EmbeddingError::GenerationFailed(e.to_string()))?;

        if let Some(actual) = embeddings.first().map(Vec::len)
            && actual != self.dimension
        {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual,
            }
            .into());
        }

        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
