pub mod error;
pub mod migrations;
pub mod schema;
pub mod store;
pub mod value;
pub mod writer;

pub use error::{Result, StorageError};
pub use store::Store;
pub use value::{SqlValue, Statement};
