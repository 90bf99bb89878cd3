use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IdeError>;

#[derive(Debug, Error)]
pub enum IdeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("scores directory not found: {0}")]
    MissingRoot(PathBuf),

    #[error("invalid name: {0:?}")]
    InvalidName(String),

    #[error("invalid view pattern: {0}")]
    InvalidView(String),

    #[error("repository error: {0}")]
    Repository(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}
