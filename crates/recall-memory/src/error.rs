#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    #[error(transparent)]
    Storage(#[from] recall_storage::StorageError),
    #[error(transparent)]
    Embedding(#[from] recall_embeddings::EmbeddingError),
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("memory not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, MemoryError>;

impl From<MemoryError> for recall_core::RecallError {
    fn from(e: MemoryError) -> Self {
        match e {
            MemoryError::NotFound(id) => recall_core::RecallError::MemoryNotFound { id },
            other => recall_core::RecallError::Storage(other.to_string()),
        }
    }
}
