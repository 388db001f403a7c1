use thiserror::Error;
use updraft_core::{CacheError, ConfigError, InvalidReason};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("{}: {}", .0.code(), .0.message())]
    Rejected(InvalidReason),

    #[error("failed to encode output: {0}")]
    Output(#[from] serde_json::Error),
}
