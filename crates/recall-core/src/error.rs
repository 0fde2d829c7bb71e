//! Aggregating error type for the recall workspace.
//!
//! Leaf crates define their own `thiserror` enums and convert into
//! [`RecallError`] via `#[from]`, mirroring the upstream split between a
//! top-level error and per-subsystem errors.

/// Errors surfaced by any recall component.
#[derive(Debug, thiserror::Error)]
pub enum RecallError {
    #[error("memory not found: {id}")]
    MemoryNotFound { id: String },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("embedding error: {0}")]
    Embedding(String),

    #[error("graph error: {0}")]
    Graph(String),

    #[error("extraction error: {0}")]
    Extract(String),

    #[error("index error: {0}")]
    Index(String),

    #[error("retrieval error: {0}")]
    Retrieval(String),

    #[error("bridge error: {0}")]
    Bridge(String),

    #[error("contract violation: {0}")]
    ContractViolation(String),

    #[error("schema/startup failure: {0}")]
    SchemaFailure(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("concurrency error: {0}")]
    Concurrency(String),
}

/// Result alias used across the workspace.
pub type Result<T> = std::result::Result<T, RecallError>;

impl RecallError {
    /// True for the "transient I/O" taxonomy kind (§7): callers degrade
    /// rather than propagate.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            RecallError::Storage(_)
                | RecallError::Embedding(_)
                | RecallError::Graph(_)
                | RecallError::Extract(_)
                | RecallError::Index(_)
                | RecallError::Retrieval(_)
                | RecallError::Bridge(_)
        )
    }
}
