//! Tool execution utilities.

use dojo_contract::{InterruptRequest, Tool, ToolCall, ToolCallContext, ToolError, ToolResult};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Outcome of one tool call attempt.
#[derive(Debug, Clone)]
pub enum ToolCallOutcome {
    /// The tool finished; failures are carried as error results.
    Finished(ToolResult),
    /// The tool asked for external input.
    Suspended(InterruptRequest),
}

/// Result of one tool call execution.
#[derive(Debug, Clone)]
pub struct ToolExecution {
    pub call: ToolCall,
    pub outcome: ToolCallOutcome,
}

/// Execute a single tool call.
///
/// Unknown tools, schema violations and execution errors become error results.
/// Only an interrupt escapes as [`ToolCallOutcome::Suspended`].
pub async fn execute_single_tool(
    tool: Option<&dyn Tool>,
    call: &ToolCall,
    ctx: &ToolCallContext,
) -> ToolExecution {
    let finished = |result| ToolExecution {
        call: call.clone(),
        outcome: ToolCallOutcome::Finished(result),
    };

    let Some(tool) = tool else {
        return finished(ToolResult::error(
            &call.name,
            format!("Tool '{}' not found", call.name),
        ));
    };

    if let Err(e) = tool.validate_args(&call.arguments) {
        return finished(ToolResult::error(&call.name, e.to_string()));
    }

    match tool.execute(call.arguments.clone(), ctx).await {
        Ok(result) => finished(result),
        Err(ToolError::Interrupted(request)) => ToolExecution {
            call: call.clone(),
            outcome: ToolCallOutcome::Suspended(request),
        },
        Err(e) => finished(ToolResult::error(&call.name, e.to_string())),
    }
}

/// Tool calls executed in order until the first suspension.
#[derive(Debug, Default)]
pub struct SequentialExecution {
    /// Calls that finished, in order.
    pub finished: Vec<(ToolCall, ToolResult)>,
    /// The call that suspended, its request, and the calls that never started.
    pub suspended: Option<(ToolCall, InterruptRequest, Vec<ToolCall>)>,
}

/// Replay journal of a resumed call.
#[derive(Debug, Clone)]
pub struct ReplaySeed {
    /// Id of the interrupt being resumed; scopes the call's side effects.
    pub interrupt_id: String,
    /// Answers fed to `request_input`, in order.
    pub answers: Vec<Value>,
}

/// Execute tool calls sequentially, stopping at the first suspension.
///
/// `replay` applies to the first call only.
pub async fn execute_tools_sequential(
    tools: &HashMap<String, Arc<dyn Tool>>,
    thread_id: &str,
    calls: &[ToolCall],
    mut replay: Option<ReplaySeed>,
) -> SequentialExecution {
    let mut out = SequentialExecution::default();

    for (idx, call) in calls.iter().enumerate() {
        let mut ctx = ToolCallContext::new(&call.id, thread_id);
        if let Some(seed) = replay.take() {
            ctx = ctx.with_scope(seed.interrupt_id).with_answers(seed.answers);
        }
        let exec = execute_single_tool(tools.get(&call.name).map(Arc::as_ref), call, &ctx).await;
        match exec.outcome {
            ToolCallOutcome::Finished(result) => {
                if result.is_error() {
                    tracing::warn!(
                        tool = %call.name,
                        call_id = %call.id,
                        error = result.message.as_deref().unwrap_or_default(),
                        "tool call failed"
                    );
                }
                out.finished.push((exec.call, result));
            }
            ToolCallOutcome::Suspended(request) => {
                out.suspended = Some((exec.call, request, calls[idx + 1..].to_vec()));
                break;
            }
        }
    }
    out
}
