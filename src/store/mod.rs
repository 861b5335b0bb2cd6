//! Persistence layer — one storage slot per assistant, holding a JSON
//! session record.
//!
//! The store never interprets what it holds; sessions serialize themselves
//! and the engine decides what a stored record means. Keys are fixed per
//! assistant, so starting over writes through the same slot.

pub mod libsql_store;
pub mod memory;

pub use libsql_store::LibSqlStore;
pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::error::StoreError;

/// Keyed storage for serialized session records.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetch the record under `key`, if any.
    async fn fetch(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write (or overwrite) the record under `key`.
    async fn put(&self, key: &str, record: &str) -> Result<(), StoreError>;

    /// Remove the record under `key`. Removing an absent key is fine.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}
