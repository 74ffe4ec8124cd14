//! Store Module
//!
//! The durable backing-store port and its bundled implementations.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use thiserror::Error;

// == Store Error ==
/// Failure reported by a backing-store operation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted data could not be decoded
    #[error("Corrupt data file: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// The store could not be reached
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

// == Store Trait ==
/// Durable key-value persistence behind the cache.
///
/// Implementations are called synchronously on the worker handling the
/// request, so a slow store stalls that one worker and nothing else. Any
/// retry or reconnect logic belongs inside the implementation; callers treat
/// a returned error as final for the current request.
///
/// Contract:
/// - `put` is an upsert;
/// - `get` returns `Ok(None)` for an absent key;
/// - `delete` of an absent key succeeds (idempotent).
pub trait Store: Send + Sync {
    /// Creates or updates a key-value pair.
    fn put(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Retrieves the value for a key, if any.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Removes a key-value pair.
    fn delete(&self, key: &str) -> Result<(), StoreError>;
}
