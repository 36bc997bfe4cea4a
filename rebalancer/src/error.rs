//! Error types for the rebalancer CLI.

use std::path::PathBuf;

/// All errors that can occur during a rebalancer run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("failed to import positions from {path}: {source}")]
    Import { path: PathBuf, source: csv::Error },

    #[error("failed to read positions file {path}: {source}")]
    ImportRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("no file matching '{pattern}' found in {dir}")]
    NoInputFile { dir: PathBuf, pattern: String },

    #[error(transparent)]
    Plan(#[from] portfoli::Error),

    #[error("failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
