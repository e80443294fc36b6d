//! Persistent thread model: messages and checkpoints.

pub mod checkpoint;
pub mod message;

pub use checkpoint::{Checkpoint, CheckpointStatus, PendingInterrupt, Sequence};
pub use message::{gen_message_id, Message, Role, ToolCall};
