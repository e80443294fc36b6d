use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use dojo_contract::Checkpoint;
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};

use crate::service::{require_thread_id, ApiError};
use crate::transport::{sse_body_stream, sse_response};

pub use crate::service::AppState;

/// Health endpoint path.
pub const HEALTH_PATH: &str = "/health";
/// Service banner path.
pub const ROOT_PATH: &str = "/";
/// Thread list endpoint path.
pub const THREADS_PATH: &str = "/chat";
/// Thread detail endpoint path.
pub const THREAD_PATH: &str = "/chat/:thread_id";
/// Start-a-turn endpoint path.
pub const STREAM_PATH: &str = "/chat/:thread_id/stream";
/// Resume-a-turn endpoint path.
pub const RESUME_PATH: &str = "/chat/:thread_id/resume";

pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route(HEALTH_PATH, get(health))
        .route(ROOT_PATH, get(root))
}

/// Conversation routes: start, resume, inspect.
pub fn chat_routes() -> Router<AppState> {
    Router::new()
        .route(THREADS_PATH, get(list_threads))
        .route(THREAD_PATH, get(get_thread).delete(delete_thread))
        .route(STREAM_PATH, post(stream_chat))
        .route(RESUME_PATH, post(resume_chat))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(chat_routes())
        .layer(cors_layer())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn health() -> impl IntoResponse {
    StatusCode::OK
}

async fn root() -> impl IntoResponse {
    Json(json!({ "message": "dojo API is running" }))
}

#[derive(Debug, Deserialize)]
pub struct StreamRequest {
    pub input: String,
}

#[derive(Debug, Deserialize)]
pub struct ResumeRequest {
    pub resume: Value,
}

async fn stream_chat(
    State(st): State<AppState>,
    Path(thread_id): Path<String>,
    Json(req): Json<StreamRequest>,
) -> Result<Response, ApiError> {
    let thread_id = require_thread_id(&thread_id)?;
    if req.input.trim().is_empty() {
        return Err(ApiError::BadRequest("input must not be empty".to_string()));
    }
    tracing::debug!(thread_id = %thread_id, "chat stream requested");
    let events = st.engine.start(thread_id, req.input);
    Ok(sse_response(sse_body_stream(events)))
}

async fn resume_chat(
    State(st): State<AppState>,
    Path(thread_id): Path<String>,
    Json(req): Json<ResumeRequest>,
) -> Result<Response, ApiError> {
    let thread_id = require_thread_id(&thread_id)?;
    tracing::debug!(thread_id = %thread_id, "chat resume requested");
    let events = st.engine.resume(thread_id, req.resume);
    Ok(sse_response(sse_body_stream(events)))
}

async fn list_threads(State(st): State<AppState>) -> Result<Json<Value>, ApiError> {
    let threads = st.engine.store().list().await?;
    Ok(Json(json!({ "threads": threads })))
}

async fn get_thread(
    State(st): State<AppState>,
    Path(thread_id): Path<String>,
) -> Result<Json<Checkpoint>, ApiError> {
    let thread_id = require_thread_id(&thread_id)?;
    Ok(Json(st.load_thread(&thread_id).await?))
}

async fn delete_thread(
    State(st): State<AppState>,
    Path(thread_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let thread_id = require_thread_id(&thread_id)?;
    st.engine.delete(&thread_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
