// Persistent key-value storage for the dashboard
// SQLite on disk, plain memory for tests and as a fallback

pub mod memory;
pub mod store;

pub use memory::MemoryStore;
pub use store::{KeyValueStore, SqliteStore, StorageError};
