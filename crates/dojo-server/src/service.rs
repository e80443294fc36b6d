use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use dojo_agent_loop::ExecutionEngine;
use dojo_contract::{Checkpoint, CheckpointStoreError};

#[derive(Clone)]
pub struct AppState {
    pub engine: ExecutionEngine,
}

impl AppState {
    pub fn new(engine: ExecutionEngine) -> Self {
        Self { engine }
    }

    /// Current checkpoint of `thread_id`.
    pub async fn load_thread(&self, thread_id: &str) -> Result<Checkpoint, ApiError> {
        self.engine
            .store()
            .get(thread_id)
            .await?
            .ok_or_else(|| ApiError::ThreadNotFound(thread_id.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("thread not found: {0}")]
    ThreadNotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = match &self {
            ApiError::ThreadNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (code, body).into_response()
    }
}

impl From<CheckpointStoreError> for ApiError {
    fn from(e: CheckpointStoreError) -> Self {
        match e {
            CheckpointStoreError::NotFound(id) => ApiError::ThreadNotFound(id),
            e @ CheckpointStoreError::InvalidId(_) => ApiError::BadRequest(e.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

/// Trimmed thread id, or `BadRequest` when blank.
pub fn require_thread_id(raw: &str) -> Result<String, ApiError> {
    let id = raw.trim();
    if id.is_empty() {
        return Err(ApiError::BadRequest("thread id must not be empty".to_string()));
    }
    Ok(id.to_string())
}
