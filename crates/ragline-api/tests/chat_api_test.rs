//! HTTP routes exercised in-process with `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use ragline_api::{router, AppState};
use ragline_chat::{
    ChatPipeline, ContentRecord, EmbeddingModel, GroundedResponder, IntentResolver, PromptStore,
    RetrievalOrchestrator, GROUNDED_CHAT, INTENT_MAPPING,
};
use ragline_inference::mock::{MockEmbeddingBackend, MockGenerationBackend};
use ragline_search::{DocumentIngestor, InMemorySearchBackend, IndexManager};

const INDEX: &str = "contoso-docs";

async fn app(intent_reply: &str, chat: MockGenerationBackend) -> Router {
    let embedder = Arc::new(MockEmbeddingBackend::new(EmbeddingModel::Ada002));
    let search = Arc::new(InMemorySearchBackend::new());
    let records = vec![
        ContentRecord::new("1", "Hotfix Policy")
            .with_field("content", "A hotfix is an urgent production fix"),
        ContentRecord::new("2", "Deploy Guide")
            .with_field("content", "Deployments happen every Tuesday"),
    ];
    IndexManager::new(
        search.clone(),
        DocumentIngestor::new(embedder.clone(), EmbeddingModel::Ada002),
    )
    .rebuild_from_records(&records, INDEX)
    .await
    .unwrap();

    let store = PromptStore::builtin();
    let intent = MockGenerationBackend::new("intent-model").with_fixed_response(intent_reply);
    let resolver = IntentResolver::new(Arc::new(intent), store.load(INTENT_MAPPING).unwrap());
    let retrieval = RetrievalOrchestrator::new(resolver, embedder, search, INDEX);
    let responder = GroundedResponder::new(Arc::new(chat), store.load(GROUNDED_CHAT).unwrap());

    router(AppState::new(ChatPipeline::new(retrieval, responder)))
}

async fn default_app() -> Router {
    app(
        r#"{"intent": "define hotfix", "search_query": "hotfix"}"#,
        MockGenerationBackend::new("chat-model").with_fixed_response("An urgent fix."),
    )
    .await
}

fn post_chat(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_root_and_health() {
    let app = default_app().await;

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "healthy");
}

#[tokio::test]
async fn test_chat_returns_choice_and_context() {
    let response = default_app()
        .await
        .oneshot(post_chat(json!({
            "messages": [{"role": "user", "content": "What is a hotfix?"}],
            "context": {"overrides": {"top": 1}}
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let body = json_body(response).await;
    assert_eq!(body["choices"][0]["index"], 0);
    assert_eq!(body["choices"][0]["message"]["role"], "assistant");
    assert_eq!(body["choices"][0]["message"]["content"], "An urgent fix.");
    assert_eq!(body["context"]["thoughts"][0]["title"], "Generated search query");
    assert_eq!(body["context"]["thoughts"][0]["description"], "hotfix");
    assert_eq!(body["context"]["grounding_data"][0][0]["id"], "1");
    assert_eq!(
        body["context"]["grounding_data"][0].as_array().unwrap().len(),
        1
    );
}

#[tokio::test]
async fn test_chat_without_context_uses_default_top() {
    let response = default_app()
        .await
        .oneshot(post_chat(json!({
            "messages": [{"role": "user", "content": "What is a hotfix?"}]
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(body["context"]["grounding_data"][0].as_array().unwrap().len() <= 3);
}

#[tokio::test]
async fn test_intent_parse_error_is_422() {
    let response = app(
        "no json here",
        MockGenerationBackend::new("chat-model"),
    )
    .await
    .oneshot(post_chat(json!({
        "messages": [{"role": "user", "content": "What is a hotfix?"}]
    })))
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert_eq!(body["error"]["kind"], "intent_parse_error");
}

#[tokio::test]
async fn test_generation_error_is_502() {
    let response = app(
        r#"{"intent": "x", "search_query": "hotfix"}"#,
        MockGenerationBackend::new("chat-model").failing("model unavailable"),
    )
    .await
    .oneshot(post_chat(json!({
        "messages": [{"role": "user", "content": "What is a hotfix?"}]
    })))
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = json_body(response).await;
    assert_eq!(body["error"]["kind"], "generation_error");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("model unavailable"));
}

#[tokio::test]
async fn test_empty_conversation_is_400() {
    let response = default_app()
        .await
        .oneshot(post_chat(json!({ "messages": [] })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"]["kind"], "invalid_input");
}

#[tokio::test]
async fn test_malformed_body_is_400() {
    let response = default_app()
        .await
        .oneshot(post_chat(json!({ "messages": [{"role": "robot", "content": "hi"}] })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"]["kind"], "invalid_input");
}
