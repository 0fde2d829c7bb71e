pub mod debounce;
pub mod error;
pub mod indexer;
pub mod paths;
pub mod state;
pub mod walker;
pub mod watcher;

pub use error::{IndexError, Result};
pub use indexer::IncrementalIndexer;
pub use watcher::ProjectWatcher;
