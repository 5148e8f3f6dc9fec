//! # ragline-api
//!
//! HTTP front-end for the ragline chat pipeline.
//!
//! Routes:
//! - `GET /` liveness text
//! - `GET /health` status and version
//! - `POST /chat` one grounded chat turn

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use uuid::Uuid;

use ragline_chat::{ChatMessage, ChatPipeline, Overrides, RetrievalContext};
use ragline_core::Error;

pub mod telemetry;

/// Request ID generator using UUIDv7 (time-ordered).
#[derive(Clone, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ChatPipeline>,
}

impl AppState {
    pub fn new(pipeline: ChatPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/chat", post(chat))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// =============================================================================
// HANDLERS
// =============================================================================

async fn root() -> &'static str {
    "Hello, World!"
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct RequestContext {
    #[serde(default)]
    pub overrides: Overrides,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub context: RequestContext,
}

#[derive(Debug, Serialize)]
pub struct ChatChoice {
    pub index: usize,
    pub message: ChatMessage,
}

/// Chat-protocol response body.
#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub choices: Vec<ChatChoice>,
    pub context: RetrievalContext,
}

async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatReply>, ApiError> {
    let request_id = headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let Json(request) =
        payload.map_err(|e| ApiError(Error::InvalidInput(e.body_text())))?;

    let response = state
        .pipeline
        .send_chat(&request.messages, request.context.overrides)
        .await
        .map_err(|e| {
            warn!(request_id = %request_id, error_kind = e.kind(), error = %e, "Chat failed");
            ApiError(e)
        })?;

    info!(
        request_id = %request_id,
        subsystem = "api",
        op = "chat",
        result_count = response
            .context
            .grounding_data()
            .last()
            .map(|batch| batch.len())
            .unwrap_or(0),
        "Chat request served"
    );

    Ok(Json(ChatReply {
        choices: vec![ChatChoice {
            index: 0,
            message: response.message,
        }],
        context: response.context,
    }))
}

// =============================================================================
// ERRORS
// =============================================================================

/// Pipeline error rendered as `{ "error": { "kind", "message" } }`.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

/// HTTP status for a pipeline error kind.
pub fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::IntentParse(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::Config(_) | Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
        Error::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        Error::Embedding(_) | Error::Search(_) | Error::Generation(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "error": {
                "kind": self.0.kind(),
                "message": self.0.to_string(),
            }
        }));
        (status_for(&self.0), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&Error::IntentParse("x".into())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(status_for(&Error::Config("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(&Error::Timeout {
                operation: "generate".into(),
                seconds: 60
            }),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(status_for(&Error::Search("x".into())), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status_for(&Error::NotFound("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_request_context_is_optional() {
        let request: ChatRequest =
            serde_json::from_str(r#"{"messages": [{"role": "user", "content": "hi"}]}"#).unwrap();
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.context.overrides.top, None);

        let request: ChatRequest = serde_json::from_str(
            r#"{"messages": [], "context": {"overrides": {"top": 1}}}"#,
        )
        .unwrap();
        assert_eq!(request.context.overrides.top, Some(1));
    }
}
