//! In-memory session store, for tests and ephemeral runs.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::store::SessionStore;

#[derive(Default)]
pub struct MemoryStore {
    slots: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn fetch(&self, key: &str) -> Result<Option<String>, StoreError> {
        let slots = self
            .slots
            .read()
            .map_err(|_| StoreError::Query("store lock poisoned".into()))?;
        Ok(slots.get(key).cloned())
    }

    async fn put(&self, key: &str, record: &str) -> Result<(), StoreError> {
        let mut slots = self
            .slots
            .write()
            .map_err(|_| StoreError::Query("store lock poisoned".into()))?;
        slots.insert(key.to_string(), record.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut slots = self
            .slots
            .write()
            .map_err(|_| StoreError::Query("store lock poisoned".into()))?;
        slots.remove(key);
        Ok(())
    }
}
