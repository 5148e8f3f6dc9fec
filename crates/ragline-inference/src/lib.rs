//! # ragline-inference
//!
//! Embedding and chat completion backends for ragline.
//!
//! This crate provides:
//! - OpenAI-compatible implementation of [`EmbeddingBackend`] and
//!   [`GenerationBackend`] (feature `openai`, on by default)
//! - Deterministic mock backends (feature `mock`)
//!
//! # Feature Flags
//!
//! - `openai` (default): Enable OpenAI-compatible backend
//! - `mock`: Enable mock backends for tests in dependent crates
//! - `integration`: Enable tests against a live endpoint

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export core types
pub use ragline_core::{EmbeddingBackend, GenerationBackend, InferenceBackend};

#[cfg(feature = "openai")]
pub use openai::{AuthHeader, OpenAIBackend, OpenAIConfig};
