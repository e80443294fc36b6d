//! Tool contract and per-call context.

pub mod context;
pub mod contract;

pub use context::{is_approved, is_denied, InterruptRequest, ResumeDecision, ToolCallContext};
pub use contract::{
    validate_against_schema, Tool, ToolDescriptor, ToolError, ToolResult, ToolStatus, TypedTool,
};
