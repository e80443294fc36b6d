//! Per-thread execution snapshots.

use super::message::{Message, ToolCall};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};

/// Monotonic checkpoint sequence number.
pub type Sequence = u64;

/// Lifecycle status recorded in a checkpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointStatus {
    #[default]
    Running,
    Interrupted,
    Completed,
    Failed,
}

impl CheckpointStatus {
    /// Whether a new human input may start a fresh turn from this status.
    pub fn accepts_new_input(self) -> bool {
        !matches!(self, Self::Interrupted)
    }
}

/// External input a suspended tool call is waiting for.
///
/// `answered` holds values already supplied to earlier `request_input` calls of the
/// same tool call; they are replayed in order before the next resume value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingInterrupt {
    /// Unique interrupt id.
    pub id: String,
    /// Payload describing the input required.
    pub value: Value,
    /// The tool call that suspended.
    pub tool_call: ToolCall,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub answered: Vec<Value>,
    /// Calls of the same agent message that had not started yet.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remaining_calls: Vec<ToolCall>,
}

impl PendingInterrupt {
    pub fn new(tool_call: ToolCall, value: Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            value,
            tool_call,
            answered: Vec::new(),
            remaining_calls: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_answered(mut self, answered: Vec<Value>) -> Self {
        self.answered = answered;
        self
    }

    #[must_use]
    pub fn with_remaining_calls(mut self, calls: Vec<ToolCall>) -> Self {
        self.remaining_calls = calls;
        self
    }
}

/// Immutable snapshot of a thread at a suspension or completion boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub thread_id: String,
    pub sequence: Sequence,
    pub status: CheckpointStatus,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_interrupt: Option<PendingInterrupt>,
    /// Wall clock time of the write, in milliseconds since the Unix epoch.
    #[serde(default)]
    pub updated_at: u64,
}

impl Checkpoint {
    /// Synthesized starting point for a thread with no stored checkpoint.
    pub fn empty(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            sequence: 0,
            status: CheckpointStatus::Running,
            messages: Vec::new(),
            pending_interrupt: None,
            updated_at: 0,
        }
    }

    /// Build the successor checkpoint: `sequence + 1` with the given status and
    /// history, carrying `pending` only for interrupted snapshots.
    pub fn successor(
        &self,
        status: CheckpointStatus,
        messages: Vec<Message>,
        pending: Option<PendingInterrupt>,
    ) -> Self {
        let pending_interrupt = match status {
            CheckpointStatus::Interrupted => pending,
            _ => None,
        };
        Self {
            thread_id: self.thread_id.clone(),
            sequence: self.sequence + 1,
            status,
            messages,
            pending_interrupt,
            updated_at: now_millis(),
        }
    }

    pub fn is_interrupted(&self) -> bool {
        self.status == CheckpointStatus::Interrupted && self.pending_interrupt.is_some()
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
