//! Retrieval-layer errors. Every public entry point in this crate degrades
//! rather than propagates (§4.7 "pipeline never throws"); this type exists
//! for the internal plumbing that does need to fail loudly (bad params,
//! malformed embeddings) before being caught at the boundary.

#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error(transparent)]
    Storage(#[from] recall_storage::StorageError),

    #[error(transparent)]
    Graph(#[from] recall_graph::GraphError),

    #[error(transparent)]
    Embedding(#[from] recall_embeddings::EmbeddingError),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, RetrievalError>;

impl From<RetrievalError> for recall_core::RecallError {
    fn from(e: RetrievalError) -> Self {
        recall_core::RecallError::Retrieval(e.to_string())
    }
}
