use crate::roster::Roster;
use async_trait::async_trait;
use dojo_contract::{ResumeDecision, ToolCallContext, ToolError, ToolResult, TypedTool};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

pub const CHECK_IN_MAT_TOOL_ID: &str = "check_in_mat";

/// Arguments the model supplies to `check_in_mat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckInDetails {
    /// Name of the student to check in.
    pub member_name: String,
    /// Name of the class they are checking in to.
    pub class_name: String,
}

/// Checks a member into a class after a human confirms it.
///
/// Names are resolved against the roster first, so an unknown member or class
/// fails without asking. The confirmation payload echoes the requested names.
pub struct CheckInMatTool {
    roster: Arc<Roster>,
}

impl CheckInMatTool {
    pub fn new(roster: Arc<Roster>) -> Self {
        Self { roster }
    }
}

fn answer_text(answer: &Value) -> String {
    match answer {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl TypedTool for CheckInMatTool {
    type Args = CheckInDetails;

    fn tool_id(&self) -> &str {
        CHECK_IN_MAT_TOOL_ID
    }

    fn name(&self) -> &str {
        "Check In Mat"
    }

    fn description(&self) -> &str {
        "Tool to check in a student to a class. Args: memberName, className"
    }

    async fn execute(
        &self,
        args: CheckInDetails,
        ctx: &ToolCallContext,
    ) -> Result<ToolResult, ToolError> {
        let member = self
            .roster
            .find_member(&args.member_name)
            .await
            .ok_or_else(|| ToolError::NotFound(format!("member {:?}", args.member_name)))?;
        let class = self
            .roster
            .find_class(&args.class_name)
            .await
            .ok_or_else(|| ToolError::NotFound(format!("class {:?}", args.class_name)))?;

        let answer = ctx.request_input(json!({
            "memberName": args.member_name,
            "className": args.class_name,
        }))?;

        if ResumeDecision::of(&answer) != ResumeDecision::Approved {
            tracing::info!(
                member = %member.name,
                class = %class.name,
                answer = %answer,
                "check-in not confirmed"
            );
            return Ok(ToolResult::success_with_message(
                CHECK_IN_MAT_TOOL_ID,
                json!({ "checkedIn": false, "memberName": member.name, "className": class.name }),
                format!("Check in cancelled: {}", answer_text(&answer)),
            ));
        }

        let receipt = self
            .roster
            .check_in(&class.id, &member.id, Some(&ctx.idempotency_key()))
            .await
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;

        let mut data = serde_json::to_value(&receipt)
            .map_err(|e| ToolError::Internal(e.to_string()))?;
        if let Some(obj) = data.as_object_mut() {
            obj.insert("checkedIn".to_string(), Value::Bool(true));
        }
        Ok(ToolResult::success_with_message(
            CHECK_IN_MAT_TOOL_ID,
            data,
            format!("Student check in: {}", answer_text(&answer)),
        ))
    }
}
