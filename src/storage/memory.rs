// src/storage/memory.rs

use crate::error::Result;
use crate::storage::{KeyValueStore, StoredEntry};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::trace;

/// In-memory implementation of key/value storage
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<RwLock<HashMap<String, StoredEntry>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries held, expired ones included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        trace!("InMemoryStore::get: waiting for read lock");
        {
            let entries_guard = self.entries.read().await;
            match entries_guard.get(key) {
                None => return Ok(None),
                Some(entry) if !entry.is_expired() => return Ok(Some(entry.value.clone())),
                Some(_) => {}
            }
        }

        trace!(key, "InMemoryStore::get: purging expired entry");
        let mut entries_guard = self.entries.write().await;
        // Another writer may have replaced the entry between the two locks.
        if entries_guard.get(key).is_some_and(StoredEntry::is_expired) {
            entries_guard.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<()> {
        trace!("InMemoryStore::set: waiting for write lock");
        let mut entries_guard = self.entries.write().await;
        entries_guard.insert(key.to_string(), StoredEntry::new(value, ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        trace!("InMemoryStore::delete: waiting for write lock");
        let mut entries_guard = self.entries.write().await;
        entries_guard.remove(key);
        Ok(())
    }
}
