//! Suspension bookkeeping between a tool interrupt and the resume that consumes it.

use dojo_contract::{InterruptRequest, PendingInterrupt, ToolCall};
use serde_json::Value;

/// Record a tool interrupt as the thread's pending interrupt.
pub fn suspend(call: ToolCall, request: InterruptRequest, remaining: Vec<ToolCall>) -> PendingInterrupt {
    PendingInterrupt::new(call, request.payload)
        .with_answered(request.answered)
        .with_remaining_calls(remaining)
}

/// Answer queue for replaying the suspended call: earlier answers, then `resume`.
pub fn replay_answers(pending: &PendingInterrupt, resume: Value) -> Vec<Value> {
    let mut answers = pending.answered.clone();
    answers.push(resume);
    answers
}

/// Calls to run on resume: the suspended call first, then the ones that never started.
pub fn replay_calls(pending: &PendingInterrupt) -> Vec<ToolCall> {
    let mut calls = Vec::with_capacity(pending.remaining_calls.len() + 1);
    calls.push(pending.tool_call.clone());
    calls.extend(pending.remaining_calls.iter().cloned());
    calls
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn replay_preserves_answer_and_call_order() {
        let pending = suspend(
            ToolCall::new("c1", "ask", json!({})),
            InterruptRequest {
                payload: json!("second question"),
                answered: vec![json!("first answer")],
            },
            vec![ToolCall::new("c2", "echo", json!({}))],
        );
        assert_eq!(pending.value, json!("second question"));
        assert_eq!(
            replay_answers(&pending, json!("second answer")),
            vec![json!("first answer"), json!("second answer")]
        );
        let ids: Vec<String> = replay_calls(&pending).into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["c1", "c2"]);
    }
}
