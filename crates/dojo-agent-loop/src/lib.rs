//! Agent step execution and the per-thread execution engine.
//!
//! [`ExecutionEngine::run`] loads a thread's checkpoint, executes one `agent`
//! step (inference followed by tool calls, or a replay of a suspended tool
//! call), persists the successor checkpoint, and streams [`UpdateEvent`]s.
//!
//! [`UpdateEvent`]: dojo_contract::UpdateEvent

pub mod engine;
pub mod runtime;

pub use runtime::{
    AgentConfig, ExecutionEngine, GenaiLlmExecutor, RunError, RunStream, StepError, StepOutcome,
    ThreadLocks, Trigger, DEFAULT_STEP_TIMEOUT,
};
