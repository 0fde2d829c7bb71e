pub mod closure;
pub mod db;
pub mod error;
pub mod impact;
pub mod mirror;
pub mod service;

pub use error::{GraphError, Result};
pub use impact::ImpactAnalysis;
pub use mirror::GraphMirror;
pub use service::GraphDatabase;
