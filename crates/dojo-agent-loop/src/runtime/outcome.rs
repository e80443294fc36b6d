use dojo_contract::{CheckpointStatus, CheckpointStoreError, Message};
use serde_json::Value;

/// What starts a turn.
#[derive(Debug, Clone)]
pub enum Trigger {
    /// A new human message.
    NewInput(Message),
    /// The value answering the thread's pending interrupt.
    Resume(Value),
}

/// Error type for one turn. Its display string is the `error` event payload.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("thread not found: {0}")]
    ThreadNotFound(String),

    #[error("thread {thread_id} is not awaiting input (status: {status:?})")]
    InvalidResumeState {
        thread_id: String,
        status: CheckpointStatus,
    },

    #[error("thread {0} is waiting for input; resume it before sending a new message")]
    ThreadInterrupted(String),

    #[error("step execution failed: {0}")]
    StepExecutionFailure(String),

    #[error("failed to persist checkpoint: {0}")]
    StoreWriteFailure(#[source] CheckpointStoreError),

    #[error("failed to load checkpoint: {0}")]
    StoreReadFailure(#[source] CheckpointStoreError),
}

impl RunError {
    /// Rejected before any step ran; nothing was persisted.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::ThreadNotFound(_) | Self::InvalidResumeState { .. } | Self::ThreadInterrupted(_)
        )
    }
}
