#[derive(Debug, thiserror::Error)]
pub enum DeciderError {
    #[error(transparent)]
    Storage(#[from] recall_storage::StorageError),
    #[error(transparent)]
    Memory(#[from] recall_memory::MemoryError),
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, DeciderError>;
