//! Embedding-layer errors.

#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("provider probe failed: {message}")]
    ProbeFailed { message: String },

    #[error("no embedding provider available")]
    NoProviderAvailable,

    #[error("embedding service not initialized; call initialize() first")]
    NotInitialized,

    #[error("http request failed: {message}")]
    Http { message: String },

    #[error("invalid requested dimensions: {dims}")]
    InvalidDimensions { dims: usize },

    #[error(transparent)]
    Storage(#[from] recall_storage::StorageError),
}

pub type Result<T> = std::result::Result<T, EmbeddingError>;

impl From<reqwest::Error> for EmbeddingError {
    fn from(e: reqwest::Error) -> Self {
        EmbeddingError::Http {
            message: e.to_string(),
        }
    }
}

impl From<EmbeddingError> for recall_core::RecallError {
    fn from(e: EmbeddingError) -> Self {
        recall_core::RecallError::Embedding(e.to_string())
    }
}
