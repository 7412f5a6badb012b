//! Default on-disk locations
//!
//! Platform directories come from `dirs` (XDG on Linux, `Application Support`
//! on macOS, `%APPDATA%` on Windows). When the platform reports none, paths
//! fall back to the working directory.

use std::path::PathBuf;

pub const APP_DIR_NAME: &str = "python-ast-rag";

fn app_dir(base: Option<PathBuf>) -> PathBuf {
    base.unwrap_or_else(|| PathBuf::from(".")).join(APP_DIR_NAME)
}

/// `{data_dir}/python-ast-rag/lancedb`
pub fn default_lancedb_path() -> PathBuf {
    app_dir(dirs::data_dir()).join("lancedb")
}

/// `{config_dir}/python-ast-rag/config.toml`
pub fn default_config_path() -> PathBuf {
    app_dir(dirs::config_dir()).join("config.toml")
}
