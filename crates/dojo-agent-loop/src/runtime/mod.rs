//! Agent configuration, the `agent` step and the per-thread execution engine.

mod config;
mod engine;
pub mod interrupt;
mod outcome;
pub mod step;
mod thread_locks;

pub use config::{AgentConfig, GenaiLlmExecutor, DEFAULT_STEP_TIMEOUT};
pub use engine::{ExecutionEngine, RunStream};
pub use outcome::{RunError, Trigger};
pub use step::{StepError, StepOutcome};
pub use thread_locks::ThreadLocks;
