use async_trait::async_trait;
use dojo_contract::storage::{check_sequence_advances, CheckpointStore, CheckpointStoreError};
use dojo_contract::Checkpoint;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;

/// Stores one pretty-printed JSON document per thread under `base_path`.
pub struct FileStore {
    base_path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl FileStore {
    /// Create a new file storage with the given base path.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn base_path(&self) -> &std::path::Path {
        &self.base_path
    }

    pub(crate) fn thread_path(&self, thread_id: &str) -> Result<PathBuf, CheckpointStoreError> {
        Self::validate_thread_id(thread_id)?;
        Ok(self.base_path.join(format!("{thread_id}.json")))
    }

    /// Validate that a thread ID is safe for use as a filename.
    /// Rejects path separators, `..`, and control characters.
    fn validate_thread_id(thread_id: &str) -> Result<(), CheckpointStoreError> {
        if thread_id.is_empty() {
            return Err(CheckpointStoreError::InvalidId(
                "thread id cannot be empty".to_string(),
            ));
        }
        if thread_id.contains('/')
            || thread_id.contains('\\')
            || thread_id.contains("..")
            || thread_id.contains('\0')
        {
            return Err(CheckpointStoreError::InvalidId(format!(
                "thread id contains invalid characters: {thread_id:?}"
            )));
        }
        if thread_id.chars().any(|c| c.is_control()) {
            return Err(CheckpointStoreError::InvalidId(format!(
                "thread id contains control characters: {thread_id:?}"
            )));
        }
        Ok(())
    }

    async fn load(&self, thread_id: &str) -> Result<Option<Checkpoint>, CheckpointStoreError> {
        let path = self.thread_path(thread_id)?;
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let checkpoint: Checkpoint = serde_json::from_str(&content)
            .map_err(|e| CheckpointStoreError::Serialization(e.to_string()))?;
        Ok(Some(checkpoint))
    }

    /// Write a checkpoint through a temp file and rename it into place.
    async fn save(&self, checkpoint: &Checkpoint) -> Result<(), CheckpointStoreError> {
        let path = self.thread_path(&checkpoint.thread_id)?;
        tokio::fs::create_dir_all(&self.base_path).await?;

        let content = serde_json::to_string_pretty(checkpoint)
            .map_err(|e| CheckpointStoreError::Serialization(e.to_string()))?;

        let tmp_path = self.base_path.join(format!(
            ".{}.{}.tmp",
            checkpoint.thread_id,
            uuid::Uuid::new_v4().simple()
        ));

        let write_result = async {
            let mut file = tokio::fs::File::create(&tmp_path).await?;
            file.write_all(content.as_bytes()).await?;
            file.flush().await?;
            file.sync_all().await?;
            drop(file);
            match tokio::fs::rename(&tmp_path, &path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    tokio::fs::remove_file(&path).await?;
                    tokio::fs::rename(&tmp_path, &path).await?;
                }
                Err(e) => return Err(e),
            }
            Ok::<(), std::io::Error>(())
        }
        .await;

        if let Err(e) = write_result {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(CheckpointStoreError::Io(e));
        }
        Ok(())
    }
}

#[async_trait]
impl CheckpointStore for FileStore {
    async fn get(&self, thread_id: &str) -> Result<Option<Checkpoint>, CheckpointStoreError> {
        self.load(thread_id).await
    }

    async fn put(&self, checkpoint: &Checkpoint) -> Result<(), CheckpointStoreError> {
        let _guard = self.write_lock.lock().await;
        let stored = self.load(&checkpoint.thread_id).await?;
        check_sequence_advances(stored.as_ref(), checkpoint)?;
        self.save(checkpoint).await?;
        tracing::debug!(
            thread_id = %checkpoint.thread_id,
            sequence = checkpoint.sequence,
            status = ?checkpoint.status,
            "checkpoint written"
        );
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>, CheckpointStoreError> {
        let mut entries = match tokio::fs::read_dir(&self.base_path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(id) = path.file_stem().and_then(|stem| stem.to_str()) {
                    if !id.starts_with('.') {
                        ids.push(id.to_string());
                    }
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    async fn delete(&self, thread_id: &str) -> Result<(), CheckpointStoreError> {
        let path = self.thread_path(thread_id)?;
        let _guard = self.write_lock.lock().await;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dojo_contract::{CheckpointStatus, Message, PendingInterrupt, ToolCall};
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn completed(thread_id: &str, n: usize) -> Checkpoint {
        let messages = (0..n).map(|i| Message::human(format!("msg-{i}"))).collect();
        Checkpoint::empty(thread_id).successor(CheckpointStatus::Completed, messages, None)
    }

    #[tokio::test]
    async fn put_then_get_roundtrips_from_disk() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());
        let cp = completed("t1", 3);

        store.put(&cp).await.unwrap();
        assert!(temp_dir.path().join("t1.json").exists());

        let reopened = FileStore::new(temp_dir.path());
        let loaded = reopened.get("t1").await.unwrap().unwrap();
        assert_eq!(loaded, cp);
    }

    #[tokio::test]
    async fn interrupted_checkpoint_keeps_pending_interrupt() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());
        let pending = PendingInterrupt::new(
            ToolCall::new("call_1", "check_in_mat", json!({"memberName": "Bob"})),
            json!({"memberName": "Bob", "className": "Jiu Jitsu"}),
        );
        let cp = Checkpoint::empty("t1").successor(
            CheckpointStatus::Interrupted,
            vec![Message::human("check in Bob")],
            Some(pending.clone()),
        );
        store.put(&cp).await.unwrap();

        let loaded = store.get("t1").await.unwrap().unwrap();
        assert!(loaded.is_interrupted());
        assert_eq!(loaded.pending_interrupt, Some(pending));
    }

    #[tokio::test]
    async fn stale_sequence_is_rejected_and_file_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());
        let first = completed("t1", 1);
        let second = first.successor(CheckpointStatus::Completed, vec![], None);
        store.put(&first).await.unwrap();
        store.put(&second).await.unwrap();

        let err = store.put(&first).await.unwrap_err();
        assert!(matches!(
            err,
            CheckpointStoreError::SequenceConflict {
                stored: 2,
                attempted: 1,
                ..
            }
        ));
        assert_eq!(store.get("t1").await.unwrap().unwrap().sequence, 2);
    }

    #[tokio::test]
    async fn missing_thread_and_missing_dir_are_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path().join("not-created"));
        assert!(store.get("nope").await.unwrap().is_none());
        assert!(store.list().await.unwrap().is_empty());
        store.delete("nope").await.unwrap();
    }

    #[tokio::test]
    async fn list_is_sorted_and_skips_temp_files() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());
        store.put(&completed("b", 0)).await.unwrap();
        store.put(&completed("a", 0)).await.unwrap();
        std::fs::write(temp_dir.path().join(".a.123.tmp"), "{}").unwrap();
        std::fs::write(temp_dir.path().join("notes.txt"), "x").unwrap();

        assert_eq!(store.list().await.unwrap(), vec!["a", "b"]);

        store.delete("a").await.unwrap();
        assert_eq!(store.list().await.unwrap(), vec!["b"]);
    }

    #[tokio::test]
    async fn rejects_unsafe_thread_ids() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());
        for bad in ["", "../etc", "a/b", "a\\b", "a\0b", "a\nb"] {
            assert!(
                matches!(store.get(bad).await, Err(CheckpointStoreError::InvalidId(_))),
                "expected InvalidId for {bad:?}"
            );
        }
    }

    #[tokio::test]
    async fn corrupt_file_reports_serialization_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());
        std::fs::write(temp_dir.path().join("t1.json"), "not json").unwrap();
        assert!(matches!(
            store.get("t1").await,
            Err(CheckpointStoreError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn concurrent_writers_leave_one_winner_per_sequence() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(FileStore::new(temp_dir.path()));
        let cp = completed("t1", 1);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            let cp = cp.clone();
            handles.push(tokio::spawn(async move { store.put(&cp).await.is_ok() }));
        }
        let mut wins = 0;
        for handle in handles {
            if handle.await.unwrap() {
                wins += 1;
            }
        }
        assert_eq!(wins, 1);
    }
}
