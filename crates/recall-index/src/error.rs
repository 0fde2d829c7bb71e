//! Indexer-layer errors.

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error(transparent)]
    Storage(#[from] recall_storage::StorageError),

    #[error(transparent)]
    Graph(#[from] recall_graph::GraphError),

    #[error(transparent)]
    Extract(#[from] recall_extract::ExtractError),

    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),
}

pub type Result<T> = std::result::Result<T, IndexError>;

impl From<IndexError> for recall_core::RecallError {
    fn from(e: IndexError) -> Self {
        recall_core::RecallError::Index(e.to_string())
    }
}
