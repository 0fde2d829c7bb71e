//! Graph-layer errors.

#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("lock poisoned: {0}")]
    Concurrency(String),

    #[error("unresolved target: {0}")]
    UnresolvedTarget(String),

    #[error(transparent)]
    Storage(#[from] recall_storage::StorageError),
}

pub type Result<T> = std::result::Result<T, GraphError>;

impl From<GraphError> for recall_core::RecallError {
    fn from(e: GraphError) -> Self {
        recall_core::RecallError::Graph(e.to_string())
    }
}
