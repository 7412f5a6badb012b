/// Centralized error types for python-ast-rag using thiserror
///
/// Provides domain-specific error types for better error handling and user-facing messages.
use thiserror::Error;

/// Main error type for the RAG system
#[derive(Error, Debug)]
pub enum RagError {
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Vector database error: {0}")]
    VectorDb(#[from] VectorDbError),

    #[error("Indexing error: {0}")]
    Indexing(#[from] IndexingError),

    #[error("Chunking error: {0}")]
    Chunking(#[from] ChunkingError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Other(String),
}

/// Errors related to embedding generation
#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Failed to initialize embedding model: {0}")]
    InitializationFailed(String),

    #[error("Failed to generate embeddings: {0}")]
    GenerationFailed(String),

    #[error("Unknown embedding model: {0}")]
    UnknownModel(String),

    #[error("Invalid embedding dimension: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Errors related to vector database operations
#[derive(Error, Debug)]
pub enum VectorDbError {
    #[error("Failed to connect to vector database: {0}")]
    ConnectionFailed(String),

    #[error("Failed to store records: {0}")]
    StoreFailed(String),

    #[error("Column '{0}' missing or of unexpected type")]
    InvalidColumn(String),

    #[error("Unknown store backend: {0}")]
    UnknownBackend(String),
}

/// Errors related to source discovery
#[derive(Error, Debug)]
pub enum IndexingError {
    #[error("Directory not found: {0}")]
    DirectoryNotFound(String),

    #[error("Path is not a directory: {0}")]
    NotADirectory(String),
}

/// Errors related to syntax-tree chunk extraction
#[derive(Error, Debug)]
pub enum ChunkingError {
    #[error("Failed to parse '{source_id}': {reason}")]
    ParseFailed { source_id: String, reason: String },

    #[error("Failed to initialize Python grammar: {0}")]
    GrammarUnavailable(String),
}

/// Errors raised while converting chunk metadata to and from flat records
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A stored record could not be turned back into metadata
    #[error("Decode failure: {0}")]
    Decode(#[from] DecodeError),

    /// Metadata that has no lossless flat representation
    #[error("Schema violation on '{field}': {reason}")]
    SchemaViolation { field: String, reason: String },
}

/// Reasons a flat record fails to decode
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("missing required field '{0}'")]
    MissingField(String),

    #[error("field '{field}' must be {expected}")]
    WrongType { field: String, expected: String },

    #[error("unknown chunk kind '{0}'")]
    UnknownKind(String),

    #[error("invalid line range {start}..={end}")]
    InvalidLineRange { start: i64, end: i64 },

    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration file: {0}")]
    LoadFailed(String),

    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    #[error("Invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Failed to save configuration: {0}")]
    SaveFailed(String),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),
}

// Conversion from anyhow::Error to RagError
impl From<anyhow::Error> for RagError {
    fn from(err: anyhow::Error) -> Self {
        RagError::Other(format!("{:#}", err))
    }
}

impl CodecError {
    /// Shorthand for a schema violation on a named field
    pub fn schema_violation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        CodecError::SchemaViolation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// Helper methods for RagError
impl RagError {
    /// Create a new error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        RagError::Other(msg.into())
    }

    /// Check if this is a user error (bad input or config) vs system error
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            RagError::Config(ConfigError::InvalidValue { .. })
                | RagError::Indexing(IndexingError::DirectoryNotFound(_))
                | RagError::Indexing(IndexingError::NotADirectory(_))
                | RagError::Codec(CodecError::SchemaViolation { .. })
        )
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, RagError::VectorDb(VectorDbError::ConnectionFailed(_)))
    }
}
