//! Persistence adapters

mod in_memory_store;

pub use in_memory_store::{DEFAULT_RETENTION_DAYS, InMemoryStore};
