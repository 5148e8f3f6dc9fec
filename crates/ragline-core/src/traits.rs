//! Core traits for ragline's external collaborators.
//!
//! Components receive these as explicitly constructed handles
//! (`Arc<dyn ...>`), which keeps backends pluggable and testable.

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::index::IndexDefinition;
use crate::models::{ChatMessage, GenerationParams, HybridQuery, IndexedDocument, SearchHit};

// =============================================================================
// INFERENCE TRAITS
// =============================================================================

/// Backend for generating embeddings.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Generate embeddings for the given texts.
    ///
    /// Returns one embedding vector per input text, in input order.
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text.
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_texts(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("embedding service returned no vectors".to_string()))
    }

    /// Get the expected dimension of embedding vectors.
    fn dimension(&self) -> usize;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}

/// Backend for chat completion.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Run one completion over role-tagged messages and return its text.
    async fn complete(&self, messages: &[ChatMessage], params: &GenerationParams)
        -> Result<String>;

    /// Generate text with a system message and a single user prompt.
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        let mut messages = Vec::with_capacity(2);
        if !system.is_empty() {
            messages.push(ChatMessage::system(system));
        }
        messages.push(ChatMessage::user(prompt));
        self.complete(&messages, &GenerationParams::default()).await
    }

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}

/// Combined inference backend supporting both embedding and generation.
#[async_trait]
pub trait InferenceBackend: EmbeddingBackend + GenerationBackend {
    /// Check if the backend is available and responding.
    async fn health_check(&self) -> Result<bool>;
}

// =============================================================================
// SEARCH TRAITS
// =============================================================================

/// Vector + text search service.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Create an index from a full definition.
    async fn create_index(&self, definition: &IndexDefinition) -> Result<()>;

    /// Delete an index. Fails with [`Error::NotFound`] when it does not exist.
    async fn delete_index(&self, name: &str) -> Result<()>;

    /// Fetch an index definition. Fails with [`Error::NotFound`] when absent.
    async fn get_index(&self, name: &str) -> Result<IndexDefinition>;

    /// Upload (upsert by key) documents into an index in one call.
    async fn upload_documents(&self, index: &str, documents: &[IndexedDocument]) -> Result<()>;

    /// Run a hybrid query, returning hits in backend rank order.
    async fn search(&self, index: &str, query: &HybridQuery) -> Result<Vec<SearchHit>>;

    /// Number of documents currently stored in an index.
    async fn document_count(&self, index: &str) -> Result<usize>;

    /// Short backend name for logs.
    fn backend_name(&self) -> &str;
}
