use super::*;
use crate::diagnostics::DiagnosticKind;
use crate::types::ChunkKind;
use std::fs;
use tempfile::TempDir;

fn memory_config() -> Config {
    let mut config = Config::default();
    config.vector_db.backend = "memory".to_string();
    config
}

fn write_project(dir: &Path) {
    let pkg = dir.join("shop");
    fs::create_dir_all(&pkg).unwrap();
    fs::write(
        pkg.join("cart.py"),
        "class Cart:\n    def total(self):\n        return sum_prices(self.items)\n\n    def clear(self):\n        self.items.clear()\n",
    )
    .unwrap();
    fs::write(
        dir.join("util.py"),
        "def sum_prices(items):\n    return sum(i.price for i in items)\n",
    )
    .unwrap();
    fs::write(dir.join("broken.py"), "def f(:\n").unwrap();
    fs::write(dir.join("notes.txt"), "def not_python(): pass\n").unwrap();
}

#[tokio::test]
async fn test_with_config_memory_backend() {
    let client = CodeRagClient::with_config(memory_config()).await.unwrap();
    assert_eq!(client.config().vector_db.backend, "memory");
    assert_eq!(client.stored_chunks().await.unwrap(), 0);
}

#[tokio::test]
async fn test_with_config_rejects_invalid_config() {
    let mut config = memory_config();
    config.vector_db.backend = "chroma".to_string();
    assert!(CodeRagClient::with_config(config).await.is_err());
}

#[tokio::test]
async fn test_index_directory_reports_chunks_and_diagnostics() {
    let temp_dir = TempDir::new().unwrap();
    write_project(temp_dir.path());

    let client = CodeRagClient::with_config(memory_config()).await.unwrap();
    let report = client.index_directory(temp_dir.path()).await.unwrap();

    assert_eq!(report.files_scanned, 3);
    // Cart, total, clear, sum_prices
    assert_eq!(report.chunks_indexed, 4);
    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(report.diagnostics[0].source_id, "broken.py");
    assert_eq!(report.diagnostics[0].kind, DiagnosticKind::Parse);
    assert_eq!(client.stored_chunks().await.unwrap(), 4);
}

#[tokio::test]
async fn test_reindex_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    write_project(temp_dir.path());

    let client = CodeRagClient::with_config(memory_config()).await.unwrap();
    client.index_directory(temp_dir.path()).await.unwrap();
    client.index_directory(temp_dir.path()).await.unwrap();

    assert_eq!(client.stored_chunks().await.unwrap(), 4);
}

#[tokio::test]
async fn test_search_returns_decoded_chunks() {
    let temp_dir = TempDir::new().unwrap();
    write_project(temp_dir.path());

    let client = CodeRagClient::with_config(memory_config()).await.unwrap();
    client.index_directory(temp_dir.path()).await.unwrap();

    let outcome = client.search("sum_prices price", 1).await.unwrap();
    assert!(outcome.failures.is_empty());
    assert_eq!(outcome.chunks.len(), 1);

    let top = &outcome.chunks[0].metadata;
    assert_eq!(top.source_id, "util.py");
    assert_eq!(top.name, "sum_prices");
    assert_eq!(top.kind, ChunkKind::Function);
    assert_eq!(top.parent_name, None);
}

#[tokio::test]
async fn test_method_metadata_survives_store() {
    let temp_dir = TempDir::new().unwrap();
    write_project(temp_dir.path());

    let client = CodeRagClient::with_config(memory_config()).await.unwrap();
    client.index_directory(temp_dir.path()).await.unwrap();

    let outcome = client.search("total", 10).await.unwrap();
    let total = outcome
        .chunks
        .iter()
        .find(|c| c.metadata.name == "total")
        .unwrap();
    assert_eq!(total.metadata.source_id, "shop/cart.py");
    assert_eq!(total.metadata.parent_name.as_deref(), Some("Cart"));
    assert!(total.metadata.dependencies.contains("sum_prices"));
    assert_eq!(total.metadata.line_range.start, 2);
    assert_eq!(total.metadata.line_range.end, 3);
}

#[tokio::test]
async fn test_index_nonexistent_directory() {
    let client = CodeRagClient::with_config(memory_config()).await.unwrap();
    let err = client
        .index_directory("/nonexistent/path/12345")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Directory not found"));
}

#[tokio::test]
async fn test_index_respects_exclude_patterns() {
    let temp_dir = TempDir::new().unwrap();
    write_project(temp_dir.path());

    let mut config = memory_config();
    config.indexing.exclude_patterns = vec!["shop/".to_string()];
    let client = CodeRagClient::with_config(config).await.unwrap();

    let report = client.index_directory(temp_dir.path()).await.unwrap();
    assert_eq!(report.files_scanned, 2);
    assert_eq!(report.chunks_indexed, 1);
}

#[test]
fn test_extract_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("single.py");
    fs::write(&path, "class A:\n    def m(self):\n        helper()\n").unwrap();

    let (chunks, diagnostics) = CodeRagClient::extract_file(&path).unwrap();
    assert!(diagnostics.is_empty());
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].metadata.name, "A");
    assert_eq!(chunks[1].metadata.parent_name.as_deref(), Some("A"));
}

#[test]
fn test_extract_file_with_syntax_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("bad.py");
    fs::write(&path, "def f(:\n").unwrap();

    let (chunks, diagnostics) = CodeRagClient::extract_file(&path).unwrap();
    assert!(chunks.is_empty());
    assert_eq!(diagnostics.len(), 1);
}

#[test]
fn test_extract_missing_file() {
    assert!(CodeRagClient::extract_file("/nonexistent/file.py").is_err());
}
