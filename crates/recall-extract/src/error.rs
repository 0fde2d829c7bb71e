use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported language for path: {0}")]
    UnsupportedLanguage(String),
    #[error("failed to build grammar for {language}: {message}")]
    GrammarSetup { language: String, message: String },
}

pub type Result<T> = std::result::Result<T, ExtractError>;

impl From<ExtractError> for recall_core::RecallError {
    fn from(err: ExtractError) -> Self {
        recall_core::RecallError::Extract(err.to_string())
    }
}
