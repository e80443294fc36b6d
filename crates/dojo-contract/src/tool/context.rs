//! Execution context handed to a tool call.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Raised by [`ToolCallContext::request_input`] when no answer is available yet.
///
/// `answered` holds every value consumed by earlier `request_input` calls of the
/// same attempt, in order, so a later replay can feed them back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterruptRequest {
    pub payload: Value,
    #[serde(default)]
    pub answered: Vec<Value>,
}

/// Per-call context.
///
/// On a first attempt the answer queue is empty. When a suspended call is
/// replayed after a resume, the queue is seeded with the previously answered
/// values followed by the resume value.
#[derive(Debug)]
pub struct ToolCallContext {
    call_id: String,
    thread_id: String,
    scope: String,
    answers: Mutex<VecDeque<Value>>,
    consumed: Mutex<Vec<Value>>,
}

impl ToolCallContext {
    pub fn new(call_id: impl Into<String>, thread_id: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            thread_id: thread_id.into(),
            scope: uuid::Uuid::new_v4().simple().to_string(),
            answers: Mutex::new(VecDeque::new()),
            consumed: Mutex::new(Vec::new()),
        }
    }

    /// Pin the attempt scope, e.g. to the id of the interrupt being replayed.
    ///
    /// Every replay of one suspension must share a scope; distinct suspensions
    /// must not, even when the model reuses a call id.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Seed the answers consumed, in order, by successive `request_input` calls.
    #[must_use]
    pub fn with_answers(self, answers: impl IntoIterator<Item = Value>) -> Self {
        if let Ok(mut queue) = self.answers.lock() {
            queue.extend(answers);
        }
        self
    }

    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Key for deduplicating side effects across replays of this call.
    pub fn idempotency_key(&self) -> String {
        format!("{}:{}:{}", self.thread_id, self.scope, self.call_id)
    }

    /// Ask for external input.
    ///
    /// Returns the next seeded answer if there is one. Otherwise returns an
    /// [`InterruptRequest`] carrying `payload`, which the tool must propagate
    /// (it converts into [`ToolError::Interrupted`](crate::tool::ToolError)).
    pub fn request_input(&self, payload: Value) -> Result<Value, InterruptRequest> {
        let next = self
            .answers
            .lock()
            .ok()
            .and_then(|mut queue| queue.pop_front());
        match next {
            Some(answer) => {
                if let Ok(mut consumed) = self.consumed.lock() {
                    consumed.push(answer.clone());
                }
                Ok(answer)
            }
            None => Err(InterruptRequest {
                payload,
                answered: self.answered(),
            }),
        }
    }

    /// Values consumed so far by `request_input`.
    pub fn answered(&self) -> Vec<Value> {
        self.consumed
            .lock()
            .map(|consumed| consumed.clone())
            .unwrap_or_default()
    }
}

/// Interpretation of a resume value as a yes/no decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeDecision {
    Approved,
    Denied,
    /// Neither; the value carries free-form data.
    Other,
}

impl ResumeDecision {
    pub fn of(value: &Value) -> Self {
        if is_approved(value) {
            Self::Approved
        } else if is_denied(value) {
            Self::Denied
        } else {
            Self::Other
        }
    }
}

fn approve_string_token(value: &str) -> bool {
    matches!(
        value,
        "true" | "yes" | "y" | "approved" | "approve" | "allow" | "confirm" | "confirmed" | "ok"
            | "accept" | "accepted"
    )
}

fn deny_string_token(value: &str) -> bool {
    matches!(
        value,
        "false"
            | "no"
            | "n"
            | "denied"
            | "deny"
            | "reject"
            | "rejected"
            | "cancel"
            | "canceled"
            | "cancelled"
            | "abort"
            | "aborted"
    )
}

fn object_flag(obj: &serde_json::Map<String, Value>, token: fn(&str) -> bool) -> bool {
    ["status", "decision", "action", "answer"].iter().any(|key| {
        obj.get(*key)
            .and_then(Value::as_str)
            .map(|v| token(&v.trim().to_lowercase()))
            .unwrap_or(false)
    })
}

/// Whether a resume value reads as approval.
pub fn is_approved(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => approve_string_token(&s.trim().to_lowercase()),
        Value::Object(obj) => {
            obj.get("approved").and_then(Value::as_bool).unwrap_or(false)
                || obj.get("confirmed").and_then(Value::as_bool).unwrap_or(false)
                || object_flag(obj, approve_string_token)
        }
        _ => false,
    }
}

/// Whether a resume value reads as denial.
pub fn is_denied(value: &Value) -> bool {
    match value {
        Value::Bool(b) => !*b,
        Value::String(s) => deny_string_token(&s.trim().to_lowercase()),
        Value::Object(obj) => {
            obj.get("approved").and_then(Value::as_bool).map(|v| !v).unwrap_or(false)
                || ["denied", "rejected", "cancelled", "canceled"]
                    .iter()
                    .any(|key| obj.get(*key).and_then(Value::as_bool).unwrap_or(false))
                || object_flag(obj, deny_string_token)
        }
        _ => false,
    }
}
