use super::*;
use tempfile::{NamedTempFile, TempDir};

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.vector_db.backend, "lancedb");
    assert_eq!(config.vector_db.table_name, "code_chunks");
    assert_eq!(config.embedding.model_name, "all-MiniLM-L6-v2");
    assert_eq!(config.embedding.batch_size, 32);
    assert_eq!(config.indexing.extensions, vec!["py"]);
    assert_eq!(config.search.limit, 10);
}

#[test]
fn test_validate_valid_config() {
    let config = Config::default();
    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_memory_backend() {
    let mut config = Config::default();
    config.vector_db.backend = "memory".to_string();
    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_invalid_backend() {
    let mut config = Config::default();
    config.vector_db.backend = "chroma".to_string();
    let err = config.validate().unwrap_err();
    assert!(matches!(
        err,
        RagError::Config(ConfigError::InvalidValue { ref key, .. }) if key == "vector_db.backend"
    ));
    assert!(err.is_user_error());
}

#[test]
fn test_validate_invalid_batch_size() {
    let mut config = Config::default();
    config.embedding.batch_size = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_empty_extensions() {
    let mut config = Config::default();
    config.indexing.extensions.clear();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_empty_exclude_pattern() {
    let mut config = Config::default();
    config.indexing.exclude_patterns.push(String::new());
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_zero_limit() {
    let mut config = Config::default();
    config.search.limit = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_save_and_load() {
    let temp_file = NamedTempFile::new().unwrap();
    let path = temp_file.path();

    let mut config = Config::default();
    config.embedding.batch_size = 64;
    config.indexing.exclude_patterns = vec!["migrations".to_string()];

    config.save(path).unwrap();
    let loaded = Config::from_file(path).unwrap();

    assert_eq!(loaded.embedding.batch_size, 64);
    assert_eq!(loaded.indexing.exclude_patterns, vec!["migrations"]);
}

#[test]
fn test_save_creates_parent_directory() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("config.toml");

    Config::default().save(&path).unwrap();
    assert!(path.exists());
}

#[test]
fn test_partial_file_uses_defaults() {
    let temp_file = NamedTempFile::new().unwrap();
    std::fs::write(temp_file.path(), "[search]\nlimit = 3\n").unwrap();

    let loaded = Config::from_file(temp_file.path()).unwrap();
    assert_eq!(loaded.search.limit, 3);
    assert_eq!(loaded.vector_db.backend, "lancedb");
    assert_eq!(loaded.embedding.batch_size, 32);
}

#[test]
fn test_invalid_toml() {
    let temp_file = NamedTempFile::new().unwrap();
    std::fs::write(temp_file.path(), "[search\nlimit = ").unwrap();

    let result = Config::from_file(temp_file.path());
    assert!(matches!(
        result.unwrap_err(),
        RagError::Config(ConfigError::ParseFailed(_))
    ));
}

#[test]
fn test_file_with_invalid_value_fails_validation() {
    let temp_file = NamedTempFile::new().unwrap();
    std::fs::write(temp_file.path(), "[vector_db]\nbackend = \"qdrant\"\n").unwrap();

    assert!(matches!(
        Config::from_file(temp_file.path()).unwrap_err(),
        RagError::Config(ConfigError::InvalidValue { .. })
    ));
}

#[test]
fn test_load_nonexistent_file() {
    let result = Config::from_file(Path::new("/nonexistent/config.toml"));
    assert!(matches!(
        result.unwrap_err(),
        RagError::Config(ConfigError::FileNotFound(_))
    ));
}

#[test]
fn test_toml_serialization() {
    let config = Config::default();
    let toml_str = toml::to_string(&config).unwrap();
    assert!(toml_str.contains("backend"));
    assert!(toml_str.contains("model_name"));
    assert!(toml_str.contains("exclude_patterns"));
}

#[test]
fn test_apply_env_overrides() {
    // Safety: these variables are only read by this test
    unsafe {
        std::env::set_var("PY_AST_RAG_BACKEND", "memory");
        std::env::set_var("PY_AST_RAG_TABLE", "chunks_v2");
        std::env::set_var("PY_AST_RAG_MODEL", "BAAI/bge-base-en-v1.5");
        std::env::set_var("PY_AST_RAG_BATCH_SIZE", "64");
        std::env::set_var("PY_AST_RAG_SEARCH_LIMIT", "not-a-number");
    }

    let mut config = Config::default();
    config.apply_env_overrides();

    assert_eq!(config.vector_db.backend, "memory");
    assert_eq!(config.vector_db.table_name, "chunks_v2");
    assert_eq!(config.embedding.model_name, "BAAI/bge-base-en-v1.5");
    assert_eq!(config.embedding.batch_size, 64);
    // Unparseable numbers leave the previous value
    assert_eq!(config.search.limit, 10);

    // Safety: cleaning up the variables set above
    unsafe {
        std::env::remove_var("PY_AST_RAG_BACKEND");
        std::env::remove_var("PY_AST_RAG_TABLE");
        std::env::remove_var("PY_AST_RAG_MODEL");
        std::env::remove_var("PY_AST_RAG_BATCH_SIZE");
        std::env::remove_var("PY_AST_RAG_SEARCH_LIMIT");
    }
}

#[test]
fn test_default_exclude_patterns() {
    let config = Config::default();
    assert!(
        config
            .indexing
            .exclude_patterns
            .contains(&"__pycache__".to_string())
    );
    assert!(config.indexing.exclude_patterns.contains(&".venv".to_string()));
}
