//! Transient update events emitted while a turn executes.
//!
//! Events are never persisted; they exist only on the wire. Every run emits
//! exactly one terminal event as its last item.

use crate::thread::{Message, PendingInterrupt};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Graph node name of the single reasoning step.
pub const AGENT_NODE: &str = "agent";

/// Interrupt as exposed to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterruptInfo {
    pub id: String,
    pub value: Value,
}

impl From<&PendingInterrupt> for InterruptInfo {
    fn from(pending: &PendingInterrupt) -> Self {
        Self {
            id: pending.id.clone(),
            value: pending.value.clone(),
        }
    }
}

/// Progress notification for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UpdateEvent {
    /// A node produced a message.
    NodeUpdate { node: String, message: Message },
    /// The turn suspended waiting for external input.
    InterruptRequested { interrupt: InterruptInfo },
    /// The turn completed.
    Done,
    /// The turn failed.
    Error { error: String },
}

impl UpdateEvent {
    pub fn node_update(message: Message) -> Self {
        Self::NodeUpdate {
            node: AGENT_NODE.to_string(),
            message,
        }
    }

    pub fn interrupt(pending: &PendingInterrupt) -> Self {
        Self::InterruptRequested {
            interrupt: pending.into(),
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self::Error {
            error: error.into(),
        }
    }

    /// Whether this event ends the stream.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::NodeUpdate { .. })
    }
}
