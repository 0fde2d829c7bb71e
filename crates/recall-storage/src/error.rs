//! Storage-layer errors, mirroring `drift-core`'s `StorageError` split.

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("sqlite error: {message}")]
    Sqlite { message: String },

    #[error("migration failed at version {version}: {message}")]
    MigrationFailed { version: u32, message: String },

    #[error("writer thread disconnected")]
    WriterDisconnected,

    #[error("writer thread panicked")]
    WriterPanicked,

    #[error("row decode error: {message}")]
    RowDecode { message: String },
}

pub type Result<T> = std::result::Result<T, StorageError>;

impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        StorageError::Sqlite {
            message: e.to_string(),
        }
    }
}

impl From<StorageError> for recall_core::RecallError {
    fn from(e: StorageError) -> Self {
        recall_core::RecallError::Storage(e.to_string())
    }
}
