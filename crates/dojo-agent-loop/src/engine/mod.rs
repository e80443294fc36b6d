//! Pure building blocks of the agent step: genai conversion and tool execution.

pub mod convert;
pub mod tool_execution;
