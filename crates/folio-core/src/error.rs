use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FolioError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Failure while computing an assistant response.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResponseError {
    #[error("response source unavailable: {0}")]
    Unavailable(String),

    #[error("response task failed: {0}")]
    TaskFailed(String),
}

pub type Result<T> = std::result::Result<T, FolioError>;
