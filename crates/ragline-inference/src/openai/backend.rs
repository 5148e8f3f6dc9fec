//! OpenAI-compatible inference backend implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};

use ragline_core::{
    defaults, ChatMessage, EmbeddingBackend, EmbeddingModel, Error, GenerationBackend,
    GenerationParams, InferenceBackend, Result,
};

use super::error::{to_ragline_error, CallKind, OpenAIErrorCode};
use super::types::*;

/// Default OpenAI API endpoint.
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";

/// How the API key is presented to the endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthHeader {
    /// `Authorization: Bearer <key>` (OpenAI, most compatible servers).
    #[default]
    Bearer,
    /// `api-key: <key>` (Azure-hosted model endpoints).
    ApiKey,
}

/// Configuration for OpenAI-compatible backend.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// Base URL for the API endpoint.
    pub base_url: String,
    /// API key for authentication (optional for local endpoints).
    pub api_key: Option<String>,
    /// Header used to send the API key.
    pub auth_header: AuthHeader,
    /// Model to use for embeddings.
    pub embed_model: EmbeddingModel,
    /// Model to use for chat completion.
    pub gen_model: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
    /// Skip TLS verification (for self-signed certs in local environments).
    pub skip_tls_verify: bool,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OPENAI_URL.to_string(),
            api_key: None,
            auth_header: AuthHeader::Bearer,
            embed_model: EmbeddingModel::Ada002,
            gen_model: defaults::GEN_MODEL.to_string(),
            timeout_seconds: defaults::TIMEOUT_SECS,
            skip_tls_verify: false,
        }
    }
}

/// OpenAI-compatible inference backend.
pub struct OpenAIBackend {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIBackend {
    /// Create a new OpenAI backend with the given configuration.
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        let mut client_builder =
            Client::builder().timeout(Duration::from_secs(config.timeout_seconds));

        if config.skip_tls_verify {
            client_builder = client_builder.danger_accept_invalid_certs(true);
        }

        let client = client_builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            subsystem = "inference",
            component = "openai",
            "Initializing OpenAI backend: url={}, embed={}, gen={}",
            config.base_url,
            config.embed_model,
            config.gen_model
        );

        Ok(Self { client, config })
    }

    /// Create with default configuration.
    pub fn with_defaults() -> Result<Self> {
        Self::new(OpenAIConfig::default())
    }

    /// Same endpoint and credentials, different chat model.
    pub fn with_gen_model(&self, gen_model: impl Into<String>) -> Result<Self> {
        Self::new(OpenAIConfig {
            gen_model: gen_model.into(),
            ..self.config.clone()
        })
    }

    /// Get the current configuration.
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint)
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match (&self.config.api_key, self.config.auth_header) {
            (Some(key), AuthHeader::Bearer) => req.header("Authorization", format!("Bearer {}", key)),
            (Some(key), AuthHeader::ApiKey) => req.header("api-key", key),
            (None, _) => req,
        }
    }

    /// Build a POST request with authentication if configured.
    fn build_request(&self, endpoint: &str) -> reqwest::RequestBuilder {
        self.authorize(self.client.post(self.url(endpoint)))
            .header("Content-Type", "application/json")
    }

    /// Build a GET request with authentication.
    fn build_get_request(&self, endpoint: &str) -> reqwest::RequestBuilder {
        self.authorize(self.client.get(self.url(endpoint)))
    }

    /// Turn a non-success response into a ragline error.
    async fn error_from_response(response: reqwest::Response, kind: CallKind) -> Error {
        let status = response.status();
        let (message, error_type) = match response.json::<OpenAIErrorResponse>().await {
            Ok(body) => (
                body.error.message,
                body.error.error_type.or(body.error.code).unwrap_or_default(),
            ),
            Err(_) => ("Unknown error".to_string(), String::new()),
        };
        let code = OpenAIErrorCode::from_response(status.as_u16(), &error_type);
        to_ragline_error(code, kind, &format!("OpenAI returned {}: {}", status, message))
    }
}

/// Transport failures are retryable for embeddings, terminal for generation.
fn transport_error(e: reqwest::Error, kind: CallKind) -> Error {
    match kind {
        CallKind::Embedding => Error::Request(format!("Embedding request failed: {}", e)),
        CallKind::Generation => Error::Generation(format!("Request failed: {}", e)),
    }
}

#[async_trait]
impl EmbeddingBackend for OpenAIBackend {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        debug!(
            model = self.config.embed_model.as_str(),
            input_count = texts.len(),
            "Embedding texts"
        );

        let request = EmbeddingRequest {
            model: self.config.embed_model.as_str().to_string(),
            input: texts.to_vec(),
            encoding_format: Some("float".to_string()),
        };

        let response = self
            .build_request("/embeddings")
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(e, CallKind::Embedding))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response, CallKind::Embedding).await);
        }

        let result: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::Embedding(format!("Failed to parse response: {}", e)))?;

        if result.data.len() != texts.len() {
            return Err(Error::Embedding(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                result.data.len()
            )));
        }

        // Sort by index to ensure correct ordering
        let mut data = result.data;
        data.sort_by_key(|d| d.index);

        let vectors: Vec<Vec<f32>> = data.into_iter().map(|d| d.embedding).collect();

        debug!(result_count = vectors.len(), "Generated embeddings");
        Ok(vectors)
    }

    fn dimension(&self) -> usize {
        self.config.embed_model.dimensions()
    }

    fn model_name(&self) -> &str {
        self.config.embed_model.as_str()
    }
}

#[async_trait]
impl GenerationBackend for OpenAIBackend {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: &GenerationParams,
    ) -> Result<String> {
        debug!(
            model = %self.config.gen_model,
            message_count = messages.len(),
            json_response = params.json_response,
            "Requesting chat completion"
        );

        let request = ChatCompletionRequest {
            model: self.config.gen_model.clone(),
            messages: messages.to_vec(),
            temperature: params.temperature,
            max_tokens: params.max_tokens,
            response_format: params.json_response.then(ResponseFormat::json_object),
        };

        let response = self
            .build_request("/chat/completions")
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(e, CallKind::Generation))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response, CallKind::Generation).await);
        }

        let result: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Generation(format!("Failed to parse response: {}", e)))?;

        let content = result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::Generation("Completion returned no content".to_string()))?;

        debug!(response_len = content.len(), "Chat completion finished");
        Ok(content)
    }

    fn model_name(&self) -> &str {
        &self.config.gen_model
    }
}

#[async_trait]
impl InferenceBackend for OpenAIBackend {
    async fn health_check(&self) -> Result<bool> {
        let response = self
            .build_get_request("/models")
            .timeout(Duration::from_secs(5))
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                info!("OpenAI health check passed");
                Ok(true)
            }
            Ok(resp) => {
                warn!("OpenAI health check failed: {}", resp.status());
                Ok(false)
            }
            Err(e) => {
                warn!("OpenAI health check error: {}", e);
                Ok(false)
            }
        }
    }
}
