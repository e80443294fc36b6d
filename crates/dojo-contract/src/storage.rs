//! Checkpoint storage contract.

use crate::thread::{Checkpoint, Sequence};
use async_trait::async_trait;
use thiserror::Error;

/// Storage-level errors.
#[derive(Debug, Error)]
pub enum CheckpointStoreError {
    /// Thread has no checkpoint.
    #[error("thread not found: {0}")]
    NotFound(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Invalid thread id (path traversal, control chars, etc.).
    #[error("invalid thread id: {0}")]
    InvalidId(String),

    /// A write tried to replace a checkpoint with one that is not newer.
    #[error("sequence conflict for thread {thread_id}: stored {stored}, attempted {attempted}")]
    SequenceConflict {
        thread_id: String,
        stored: Sequence,
        attempted: Sequence,
    },
}

/// Store mapping each thread to its current checkpoint.
///
/// A successful `put` must be visible to every subsequent `get`.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Load the current checkpoint of a thread.
    async fn get(&self, thread_id: &str) -> Result<Option<Checkpoint>, CheckpointStoreError>;

    /// Replace the current checkpoint of `checkpoint.thread_id`.
    ///
    /// Implementations reject a checkpoint whose sequence is not strictly greater
    /// than the stored one with [`CheckpointStoreError::SequenceConflict`].
    async fn put(&self, checkpoint: &Checkpoint) -> Result<(), CheckpointStoreError>;

    /// List thread ids with a stored checkpoint, sorted.
    async fn list(&self) -> Result<Vec<String>, CheckpointStoreError>;

    /// Delete a thread. Deleting an unknown thread is not an error.
    async fn delete(&self, thread_id: &str) -> Result<(), CheckpointStoreError>;

    /// Load the current checkpoint or fail with `NotFound`.
    async fn require(&self, thread_id: &str) -> Result<Checkpoint, CheckpointStoreError> {
        self.get(thread_id)
            .await?
            .ok_or_else(|| CheckpointStoreError::NotFound(thread_id.to_string()))
    }
}

/// Reject writes that would not advance the stored sequence.
pub fn check_sequence_advances(
    stored: Option<&Checkpoint>,
    incoming: &Checkpoint,
) -> Result<(), CheckpointStoreError> {
    match stored {
        Some(current) if incoming.sequence <= current.sequence => {
            Err(CheckpointStoreError::SequenceConflict {
                thread_id: incoming.thread_id.clone(),
                stored: current.sequence,
                attempted: incoming.sequence,
            })
        }
        _ => Ok(()),
    }
}
