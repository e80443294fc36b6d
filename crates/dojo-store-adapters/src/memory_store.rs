use async_trait::async_trait;
use dojo_contract::storage::{check_sequence_advances, CheckpointStore, CheckpointStoreError};
use dojo_contract::Checkpoint;
use std::collections::HashMap;

/// In-memory checkpoint storage for testing and local development.
#[derive(Default)]
pub struct MemoryStore {
    entries: tokio::sync::RwLock<HashMap<String, Checkpoint>>,
}

impl MemoryStore {
    /// Create a new in-memory storage.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CheckpointStore for MemoryStore {
    async fn get(&self, thread_id: &str) -> Result<Option<Checkpoint>, CheckpointStoreError> {
        let entries = self.entries.read().await;
        Ok(entries.get(thread_id).cloned())
    }

    async fn put(&self, checkpoint: &Checkpoint) -> Result<(), CheckpointStoreError> {
        let mut entries = self.entries.write().await;
        check_sequence_advances(entries.get(&checkpoint.thread_id), checkpoint)?;
        entries.insert(checkpoint.thread_id.clone(), checkpoint.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>, CheckpointStoreError> {
        let entries = self.entries.read().await;
        let mut ids: Vec<String> = entries.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    async fn delete(&self, thread_id: &str) -> Result<(), CheckpointStoreError> {
        let mut entries = self.entries.write().await;
        entries.remove(thread_id);
        Ok(())
    }
}
