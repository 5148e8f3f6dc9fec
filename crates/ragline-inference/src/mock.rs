//! Mock inference backends for deterministic testing.
//!
//! Embeddings are derived from the input text so the same text always maps
//! to the same vector. Generation replays scripted responses. Both backends
//! log every call so tests can assert on what reached the "remote" side.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ragline_core::{EmbeddingBackend, EmbeddingModel};
//! use ragline_inference::mock::MockEmbeddingBackend;
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = MockEmbeddingBackend::new(EmbeddingModel::Ada002);
//!     let vector = backend.embed_text("test text").await.unwrap();
//!     assert_eq!(vector.len(), 1536);
//!     assert_eq!(backend.call_count(), 1);
//! }
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use ragline_core::{
    ChatMessage, EmbeddingBackend, EmbeddingModel, Error, GenerationBackend, GenerationParams,
    Result,
};

/// Mock embedding generator with deterministic output.
pub struct MockEmbeddingGenerator;

impl MockEmbeddingGenerator {
    /// Generate a deterministic unit vector from text.
    ///
    /// Uses character-based hashing, so texts sharing characters land close
    /// to each other. Empty text yields the zero vector.
    pub fn generate(text: &str, dimension: usize) -> Vec<f32> {
        let mut vec = vec![0.0; dimension];
        if dimension == 0 {
            return vec;
        }

        for (i, c) in text.to_lowercase().chars().enumerate() {
            let idx = (c as usize + i) % dimension;
            vec[idx] += 0.1;
        }

        Self::normalize(&mut vec);
        vec
    }

    fn normalize(vec: &mut [f32]) {
        let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in vec.iter_mut() {
                *x /= norm;
            }
        }
    }
}

/// Mock embedding backend.
#[derive(Clone)]
pub struct MockEmbeddingBackend {
    model: EmbeddingModel,
    dimension: usize,
    fail_on: Vec<String>,
    transient_failures: Arc<Mutex<u32>>,
    latency: Duration,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockEmbeddingBackend {
    /// Backend producing vectors of the model's dimensionality.
    pub fn new(model: EmbeddingModel) -> Self {
        Self {
            model,
            dimension: model.dimensions(),
            fail_on: Vec::new(),
            transient_failures: Arc::new(Mutex::new(0)),
            latency: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Override the produced dimensionality (to simulate a misconfigured model).
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    /// Fail with `Error::Embedding` for any text containing `needle`.
    pub fn fail_on(mut self, needle: impl Into<String>) -> Self {
        self.fail_on.push(needle.into());
        self
    }

    /// Fail the next `count` calls with a retryable transport error.
    pub fn with_transient_failures(self, count: u32) -> Self {
        if let Ok(mut remaining) = self.transient_failures.lock() {
            *remaining = count;
        }
        self
    }

    /// Simulated latency for every call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Texts passed to the backend, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls().len()
    }

    fn take_transient_failure(&self) -> bool {
        match self.transient_failures.lock() {
            Ok(mut remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }
}

#[async_trait]
impl EmbeddingBackend for MockEmbeddingBackend {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.extend(texts.iter().cloned());
        }
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.take_transient_failure() {
            return Err(Error::Request("mock embedding service unavailable".to_string()));
        }

        texts
            .iter()
            .map(|text| {
                if let Some(needle) = self.fail_on.iter().find(|n| text.contains(n.as_str())) {
                    return Err(Error::Embedding(format!(
                        "mock embedding failure triggered by '{}'",
                        needle
                    )));
                }
                Ok(MockEmbeddingGenerator::generate(text, self.dimension))
            })
            .collect()
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        self.model.as_str()
    }
}

/// One recorded completion request.
#[derive(Debug, Clone)]
pub struct MockCompletion {
    pub messages: Vec<ChatMessage>,
    pub params: GenerationParams,
}

/// Mock chat completion backend.
#[derive(Clone)]
pub struct MockGenerationBackend {
    model: String,
    scripted: Arc<Mutex<VecDeque<String>>>,
    default_response: String,
    failure: Option<String>,
    latency: Duration,
    calls: Arc<Mutex<Vec<MockCompletion>>>,
}

impl MockGenerationBackend {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            scripted: Arc::new(Mutex::new(VecDeque::new())),
            default_response: "Mock response".to_string(),
            failure: None,
            latency: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Response returned once the scripted queue is empty.
    pub fn with_fixed_response(mut self, response: impl Into<String>) -> Self {
        self.default_response = response.into();
        self
    }

    /// Queue a response for the next unanswered call.
    pub fn with_scripted_response(self, response: impl Into<String>) -> Self {
        if let Ok(mut scripted) = self.scripted.lock() {
            scripted.push_back(response.into());
        }
        self
    }

    /// Fail every call with `Error::Generation`.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Simulated latency for every call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self) -> Vec<MockCompletion> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls().len()
    }
}

#[async_trait]
impl GenerationBackend for MockGenerationBackend {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: &GenerationParams,
    ) -> Result<String> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(MockCompletion {
                messages: messages.to_vec(),
                params: params.clone(),
            });
        }
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if let Some(message) = &self.failure {
            return Err(Error::Generation(message.clone()));
        }

        let scripted = self.scripted.lock().ok().and_then(|mut q| q.pop_front());
        Ok(scripted.unwrap_or_else(|| self.default_response.clone()))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_embedding() {
        let a = MockEmbeddingGenerator::generate("hotfix", 64);
        let b = MockEmbeddingGenerator::generate("hotfix", 64);
        assert_eq!(a, b);
        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let v = MockEmbeddingGenerator::generate("", 8);
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[tokio::test]
    async fn test_embedding_backend_logs_calls() {
        let backend = MockEmbeddingBackend::new(EmbeddingModel::TextEmbedding3Large);
        let vectors = backend
            .embed_texts(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[0].len(), 3072);
        assert_eq!(backend.calls(), vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_embedding_backend_scripted_failure() {
        let backend = MockEmbeddingBackend::new(EmbeddingModel::Ada002).fail_on("poison");
        assert!(backend.embed_text("fine").await.is_ok());
        let err = backend.embed_text("poison pill").await.unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
    }

    #[tokio::test]
    async fn test_transient_failures_are_retryable() {
        let backend = MockEmbeddingBackend::new(EmbeddingModel::Ada002).with_transient_failures(1);
        let err = backend.embed_text("x").await.unwrap_err();
        assert!(err.is_retryable());
        assert!(backend.embed_text("x").await.is_ok());
    }

    #[tokio::test]
    async fn test_generation_scripted_then_default() {
        let backend = MockGenerationBackend::new("gpt-test")
            .with_scripted_response("first")
            .with_fixed_response("fallback");
        let msgs = vec![ChatMessage::user("hi")];
        let params = GenerationParams::default();
        assert_eq!(backend.complete(&msgs, &params).await.unwrap(), "first");
        assert_eq!(backend.complete(&msgs, &params).await.unwrap(), "fallback");
        assert_eq!(backend.call_count(), 2);
    }

    #[tokio::test]
    async fn test_generation_failure() {
        let backend = MockGenerationBackend::new("gpt-test").failing("model overloaded");
        let err = backend
            .generate_with_system("sys", "hello")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Generation(_)));
        let call = &backend.calls()[0];
        assert_eq!(call.messages.len(), 2);
    }
}
