//! The single `agent` step.

use super::config::AgentConfig;
use super::interrupt;
use crate::engine::convert::{agent_message_from_response, build_request, tool_response};
use crate::engine::tool_execution::{execute_tools_sequential, ReplaySeed};
use dojo_contract::{Message, PendingInterrupt, ToolCall};
use serde_json::Value;

/// What one step produced.
#[derive(Debug, Clone)]
pub enum StepOutcome {
    /// The step ran to the end; `messages` are appended to history.
    Completed { messages: Vec<Message> },
    /// A tool call is waiting for input; `messages` were produced before it.
    Suspended {
        messages: Vec<Message>,
        pending: PendingInterrupt,
    },
}

/// Step failures that abort the turn.
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("LLM error: {0}")]
    Llm(String),
}

/// Fresh step: one inference over `history`, then every requested tool call in order.
pub async fn run_agent_step(
    config: &AgentConfig,
    thread_id: &str,
    history: &[Message],
) -> Result<StepOutcome, StepError> {
    let request = build_request(&config.system_prompt, history, &config.sorted_tools());
    let executor = config.executor();
    tracing::debug!(
        thread_id,
        model = %config.model,
        executor = executor.name(),
        messages = history.len(),
        "running inference"
    );
    let response = executor
        .exec_chat_response(&config.model, request, config.chat_options.as_ref())
        .await
        .map_err(|e| StepError::Llm(e.to_string()))?;

    let agent_message = agent_message_from_response(&response);
    let calls = agent_message.tool_calls().to_vec();
    Ok(run_tool_calls(config, thread_id, &calls, None, vec![agent_message]).await)
}

/// Resumed step: no inference; replay the suspended call with `resume` queued,
/// then the calls that had not started.
pub async fn replay_suspended(
    config: &AgentConfig,
    thread_id: &str,
    pending: &PendingInterrupt,
    resume: Value,
) -> Result<StepOutcome, StepError> {
    let calls = interrupt::replay_calls(pending);
    let seed = ReplaySeed {
        interrupt_id: pending.id.clone(),
        answers: interrupt::replay_answers(pending, resume),
    };
    Ok(run_tool_calls(config, thread_id, &calls, Some(seed), Vec::new()).await)
}

async fn run_tool_calls(
    config: &AgentConfig,
    thread_id: &str,
    calls: &[ToolCall],
    replay: Option<ReplaySeed>,
    mut messages: Vec<Message>,
) -> StepOutcome {
    let execution = execute_tools_sequential(&config.tools, thread_id, calls, replay).await;
    messages.extend(
        execution
            .finished
            .iter()
            .map(|(call, result)| tool_response(&call.id, result)),
    );
    match execution.suspended {
        Some((call, request, remaining)) => StepOutcome::Suspended {
            messages,
            pending: interrupt::suspend(call, request, remaining),
        },
        None => StepOutcome::Completed { messages },
    }
}
