// Daybook storage layer
// Decision: one storage port (StorageBackend) over two engines, PostgreSQL
// for production and an in-memory store for dev mode and tests

pub mod backend;
pub mod error;
pub mod memory;
pub mod models;
pub mod password;
pub mod repositories;

pub use backend::StorageBackend;
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryStore;
pub use models::*;
pub use repositories::Database;
