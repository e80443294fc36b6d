use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::OwnedMutexGuard;

/// Keyed registry of async mutexes serializing turns per thread.
///
/// Entries nobody holds or waits on are pruned on the next acquisition.
#[derive(Clone, Default)]
pub struct ThreadLocks {
    inner: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

impl ThreadLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until `thread_id` is free and hold it until the guard drops.
    pub async fn acquire(&self, thread_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            map.retain(|_, lock| Arc::strong_count(lock) > 1);
            map.entry(thread_id.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Number of threads currently tracked.
    pub fn tracked(&self) -> usize {
        self.inner.lock().map(|map| map.len()).unwrap_or_default()
    }
}
