use async_trait::async_trait;
use genai::chat::{ChatOptions, ChatRequest, ChatResponse};

/// Provider-neutral LLM execution contract consumed by the agent step.
#[async_trait]
pub trait LlmExecutor: Send + Sync {
    /// Execute one non-streaming chat call.
    async fn exec_chat_response(
        &self,
        model: &str,
        chat_req: ChatRequest,
        options: Option<&ChatOptions>,
    ) -> genai::Result<ChatResponse>;

    /// Stable executor label for debug/telemetry output.
    fn name(&self) -> &'static str {
        "llm_executor"
    }
}
