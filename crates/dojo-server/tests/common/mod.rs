use async_trait::async_trait;
use axum::body::to_bytes;
use axum::http::{Request, StatusCode};
use dojo_agent_loop::{AgentConfig, ExecutionEngine};
use dojo_contract::{CheckpointStore, LlmExecutor};
use dojo_extension_checkin::{CheckInMatTool, Roster};
use dojo_server::service::AppState;
use dojo_store_adapters::MemoryStore;
use genai::chat::{ChatOptions, ChatRequest, ChatResponse, MessageContent, Usage};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

fn chat_response(content: MessageContent) -> ChatResponse {
    let model_iden = genai::ModelIden::new(genai::adapter::AdapterKind::OpenAI, "mock");
    ChatResponse {
        content,
        reasoning_content: None,
        model_iden: model_iden.clone(),
        provider_model_iden: model_iden,
        usage: Usage::default(),
        captured_raw_body: None,
    }
}

pub fn text_response(text: &str) -> ChatResponse {
    chat_response(MessageContent::from_text(text.to_string()))
}

pub fn tool_call_response(call_id: &str, name: &str, args: Value) -> ChatResponse {
    chat_response(MessageContent::from_tool_calls(vec![genai::chat::ToolCall {
        call_id: call_id.to_string(),
        fn_name: name.to_string(),
        fn_arguments: args,
        thought_signatures: None,
    }]))
}

/// Returns canned responses in order, then a fixed closing line.
pub struct ScriptedLlm {
    responses: Mutex<VecDeque<ChatResponse>>,
}

impl ScriptedLlm {
    pub fn new(responses: Vec<ChatResponse>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
        })
    }
}

#[async_trait]
impl LlmExecutor for ScriptedLlm {
    async fn exec_chat_response(
        &self,
        _model: &str,
        _chat_req: ChatRequest,
        _options: Option<&ChatOptions>,
    ) -> genai::Result<ChatResponse> {
        let next = self.responses.lock().expect("lock poisoned").pop_front();
        Ok(next.unwrap_or_else(|| text_response("All set.")))
    }
}

pub struct TestApp {
    pub router: axum::Router,
    pub roster: Arc<Roster>,
    pub store: Arc<dyn CheckpointStore>,
}

/// Router over the sample roster, an in-memory store and a scripted model.
pub fn test_app(responses: Vec<ChatResponse>) -> TestApp {
    let roster = Arc::new(Roster::sample());
    let store: Arc<dyn CheckpointStore> = Arc::new(MemoryStore::new());
    let agent = AgentConfig::new("mock")
        .with_llm_executor(ScriptedLlm::new(responses))
        .with_tool(Arc::new(CheckInMatTool::new(roster.clone())));
    let engine = ExecutionEngine::new(agent, store.clone());
    TestApp {
        router: dojo_server::router(AppState::new(engine)),
        roster,
        store,
    }
}

/// Send a POST request with a JSON body and return `(status, body_text)`.
pub async fn post_sse(app: axum::Router, uri: &str, payload: Value) -> (StatusCode, String) {
    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(axum::body::Body::from(payload.to_string()))
                .expect("request build should succeed"),
        )
        .await
        .expect("app should handle request");

    let status = resp.status();
    let body = to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .expect("response body should be readable");
    let text = String::from_utf8(body.to_vec()).expect("response body must be utf-8");
    (status, text)
}

/// Send a request without a body and return `(status, body_text)`.
#[allow(dead_code)]
pub async fn send_empty(app: axum::Router, method: &str, uri: &str) -> (StatusCode, String) {
    let resp = app
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(axum::body::Body::empty())
                .expect("request build should succeed"),
        )
        .await
        .expect("app should handle request");

    let status = resp.status();
    let body = to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .expect("response body should be readable");
    let text = String::from_utf8(body.to_vec()).expect("response body must be utf-8");
    (status, text)
}

/// Decoded `data:` payloads of an SSE body.
pub fn sse_events(body: &str) -> Vec<Value> {
    body.lines()
        .filter_map(|l| l.strip_prefix("data: "))
        .filter_map(|l| serde_json::from_str::<Value>(l).ok())
        .collect()
}
