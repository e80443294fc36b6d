//! Shared contracts for the dojo check-in agent.
//!
//! Defines the persisted thread model ([`Checkpoint`], [`Message`]), the
//! transient [`UpdateEvent`] wire format, the [`CheckpointStore`] trait, the
//! [`Tool`] contract with its interrupt primitive, and the [`LlmExecutor`] seam.

pub mod event;
pub mod runtime;
pub mod storage;
pub mod thread;
pub mod tool;

pub use event::{InterruptInfo, UpdateEvent, AGENT_NODE};
pub use runtime::LlmExecutor;
pub use storage::{check_sequence_advances, CheckpointStore, CheckpointStoreError};
pub use thread::{
    gen_message_id, Checkpoint, CheckpointStatus, Message, PendingInterrupt, Role, Sequence,
    ToolCall,
};
pub use tool::{
    is_approved, is_denied, validate_against_schema, InterruptRequest, ResumeDecision, Tool,
    ToolCallContext, ToolDescriptor, ToolError, ToolResult, ToolStatus, TypedTool,
};
