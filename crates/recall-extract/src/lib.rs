pub mod chunker;
pub mod error;
pub mod extractor;
pub mod language;
pub mod queries;
pub mod registry;

pub use chunker::Chunker;
pub use error::{ExtractError, Result};
pub use extractor::{AstExtractor, ExtractedEdge, ExtractedNode, FileExtraction};
pub use language::Language;
pub use registry::GrammarRegistry;
