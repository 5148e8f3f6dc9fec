//! Live tests against an OpenAI-compatible endpoint.
//!
//! ```bash
//! RUN_EXTERNAL_TESTS=1 \
//! OPENAI_API_KEY=sk-... \
//! cargo test --package ragline-inference --features openai,integration --test openai_live_test -- --nocapture
//! ```
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | RUN_EXTERNAL_TESTS | (unset) | Set to "1" or "true" to enable tests |
//! | OPENAI_BASE_URL | https://api.openai.com/v1 | API endpoint |
//! | OPENAI_API_KEY | (none) | API key |
//! | EMBEDDINGS_MODEL | text-embedding-ada-002 | Embedding model |
//! | CHAT_MODEL | gpt-4o-mini | Chat model |

#![cfg(all(feature = "openai", feature = "integration"))]

use ragline_core::{
    ChatMessage, EmbeddingBackend, EmbeddingModel, GenerationBackend, GenerationParams,
    InferenceBackend,
};
use ragline_inference::openai::{OpenAIBackend, OpenAIConfig, DEFAULT_OPENAI_URL};

fn should_run_external_tests() -> bool {
    std::env::var("RUN_EXTERNAL_TESTS")
        .map(|v| v == "1" || v.to_lowercase() == "true")
        .unwrap_or(false)
}

fn skip_if_external_tests_disabled(test_name: &str) -> bool {
    if !should_run_external_tests() {
        println!(
            "Skipping {} - set RUN_EXTERNAL_TESTS=1 to enable external API tests",
            test_name
        );
        return true;
    }
    false
}

fn create_backend() -> OpenAIBackend {
    let embed_model: EmbeddingModel = std::env::var("EMBEDDINGS_MODEL")
        .unwrap_or_else(|_| "text-embedding-ada-002".to_string())
        .parse()
        .expect("known embedding model");
    OpenAIBackend::new(OpenAIConfig {
        base_url: std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_OPENAI_URL.into()),
        api_key: std::env::var("OPENAI_API_KEY").ok(),
        embed_model,
        gen_model: std::env::var("CHAT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
        ..Default::default()
    })
    .expect("Failed to create OpenAI backend")
}

#[tokio::test]
async fn test_live_health_check() {
    if skip_if_external_tests_disabled("test_live_health_check") {
        return;
    }
    assert!(create_backend().health_check().await.unwrap());
}

#[tokio::test]
async fn test_live_embedding_dimensions() {
    if skip_if_external_tests_disabled("test_live_embedding_dimensions") {
        return;
    }
    let backend = create_backend();
    let vector = backend.embed_text("What is a hotfix?").await.unwrap();
    assert_eq!(vector.len(), backend.dimension());
}

#[tokio::test]
async fn test_live_json_mode_completion() {
    if skip_if_external_tests_disabled("test_live_json_mode_completion") {
        return;
    }
    let params = GenerationParams {
        temperature: Some(0.0),
        max_tokens: Some(64),
        json_response: true,
    };
    let reply = create_backend()
        .complete(
            &[
                ChatMessage::system("Reply with a JSON object with one key, search_query."),
                ChatMessage::user("What is a hotfix?"),
            ],
            &params,
        )
        .await
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&reply).unwrap();
    assert!(value.get("search_query").is_some());
}
