//! OpenAI-compatible inference backend.
//!
//! Works with any endpoint that speaks the OpenAI `/embeddings` and
//! `/chat/completions` protocol, including:
//!
//! - OpenAI cloud API
//! - Azure-hosted model inference endpoints (`api-key` header)
//! - Ollama (in OpenAI compatibility mode)
//! - vLLM, LocalAI, LM Studio
//!
//! # Example
//!
//! ```rust,no_run
//! use ragline_core::{EmbeddingBackend, EmbeddingModel};
//! use ragline_inference::openai::{OpenAIBackend, OpenAIConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = OpenAIConfig {
//!         base_url: "http://localhost:11434/v1".to_string(),
//!         embed_model: EmbeddingModel::TextEmbedding3Small,
//!         ..Default::default()
//!     };
//!     let backend = OpenAIBackend::new(config).unwrap();
//!
//!     let vector = backend.embed_text("What is a hotfix?").await.unwrap();
//!     assert_eq!(vector.len(), backend.dimension());
//! }
//! ```

mod backend;
mod error;
mod types;

pub use backend::{AuthHeader, OpenAIBackend, OpenAIConfig, DEFAULT_OPENAI_URL};
pub use error::{to_ragline_error, CallKind, OpenAIErrorCode};
pub use types::*;
