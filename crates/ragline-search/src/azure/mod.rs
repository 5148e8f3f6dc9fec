//! Azure AI Search compatible REST backend.
//!
//! Speaks the index management, document indexing and search endpoints of
//! the service's data plane API using an admin `api-key`.

mod types;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, info};

use ragline_core::{
    defaults, Error, HybridQuery, IndexDefinition, IndexedDocument, Result, SearchBackend,
    SearchHit,
};

pub use types::*;

/// Connection settings for an Azure AI Search service.
#[derive(Debug, Clone)]
pub struct AzureSearchConfig {
    /// Service endpoint, e.g. `https://<service>.search.windows.net`.
    pub endpoint: String,
    /// Admin or query key sent as `api-key`.
    pub api_key: Option<String>,
    pub api_version: String,
    pub timeout_seconds: u64,
}

impl AzureSearchConfig {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key,
            api_version: defaults::SEARCH_API_VERSION.to_string(),
            timeout_seconds: defaults::TIMEOUT_SECS,
        }
    }
}

/// Search backend backed by the Azure AI Search REST API.
pub struct AzureSearchBackend {
    client: Client,
    config: AzureSearchConfig,
}

impl AzureSearchBackend {
    pub fn new(config: AzureSearchConfig) -> Result<Self> {
        if !config.endpoint.starts_with("http://") && !config.endpoint.starts_with("https://") {
            return Err(Error::Config(format!(
                "search endpoint must be an http(s) URL, got '{}'",
                config.endpoint
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            subsystem = "search",
            component = "azure",
            endpoint = %config.endpoint,
            api_version = %config.api_version,
            "Initializing Azure search backend"
        );
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &AzureSearchConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}{}?api-version={}",
            self.config.endpoint.trim_end_matches('/'),
            path,
            self.config.api_version
        )
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let req = self.client.request(method, self.url(path));
        match &self.config.api_key {
            Some(key) => req.header("api-key", key),
            None => req,
        }
    }

    async fn send(&self, req: reqwest::RequestBuilder, what: &str) -> Result<Response> {
        let response = req
            .send()
            .await
            .map_err(|e| Error::Request(format!("{} request failed: {}", what, e)))?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(error_from_response(response, what).await)
        }
    }
}

/// Map a failed service response onto the error taxonomy.
///
/// 404 is `NotFound`, throttling and 5xx are retryable `Request` errors,
/// auth failures are configuration errors, everything else is `Search`.
async fn error_from_response(response: Response, what: &str) -> Error {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ServiceErrorResponse>(&text)
        .map(|e| e.error.message)
        .unwrap_or(text);
    let message = format!("{} returned {}: {}", what, status, message);

    match status {
        StatusCode::NOT_FOUND => Error::NotFound(message),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Config(message),
        StatusCode::TOO_MANY_REQUESTS => Error::Request(message),
        s if s.is_server_error() => Error::Request(message),
        _ => Error::Search(message),
    }
}

fn parse_error(what: &str, e: reqwest::Error) -> Error {
    Error::Search(format!("{}: unexpected response body: {}", what, e))
}

#[async_trait]
impl SearchBackend for AzureSearchBackend {
    async fn create_index(&self, definition: &IndexDefinition) -> Result<()> {
        let req = self
            .request(reqwest::Method::POST, "/indexes")
            .json(definition);
        self.send(req, "create index").await?;
        info!(index_name = %definition.name, "Created search index");
        Ok(())
    }

    async fn delete_index(&self, name: &str) -> Result<()> {
        let req = self.request(reqwest::Method::DELETE, &format!("/indexes/{}", name));
        self.send(req, "delete index").await?;
        info!(index_name = name, "Deleted search index");
        Ok(())
    }

    async fn get_index(&self, name: &str) -> Result<IndexDefinition> {
        let req = self.request(reqwest::Method::GET, &format!("/indexes/{}", name));
        let response = self.send(req, "get index").await?;
        response.json().await.map_err(|e| parse_error("get index", e))
    }

    async fn upload_documents(&self, index: &str, documents: &[IndexedDocument]) -> Result<()> {
        if documents.is_empty() {
            return Ok(());
        }
        let req = self
            .request(reqwest::Method::POST, &format!("/indexes/{}/docs/index", index))
            .json(&IndexBatch::upload(documents));
        let response = self.send(req, "upload documents").await?;
        let result: IndexingResponse = response
            .json()
            .await
            .map_err(|e| parse_error("upload documents", e))?;

        let failed: Vec<String> = result
            .value
            .iter()
            .filter(|r| !r.status)
            .map(|r| {
                format!(
                    "{} ({}: {})",
                    r.key,
                    r.status_code,
                    r.error_message.as_deref().unwrap_or("unknown error")
                )
            })
            .collect();
        if !failed.is_empty() {
            return Err(Error::Search(format!(
                "{} of {} documents rejected by index '{}': {}",
                failed.len(),
                documents.len(),
                index,
                failed.join(", ")
            )));
        }

        debug!(
            index_name = index,
            document_count = documents.len(),
            "Uploaded documents"
        );
        Ok(())
    }

    async fn search(&self, index: &str, query: &HybridQuery) -> Result<Vec<SearchHit>> {
        if query.top == 0 {
            return Ok(Vec::new());
        }
        let req = self
            .request(reqwest::Method::POST, &format!("/indexes/{}/docs/search", index))
            .json(&SearchRequest::from(query));
        let response = self.send(req, "search").await?;
        let result: SearchResponse = response.json().await.map_err(|e| parse_error("search", e))?;

        let hits: Vec<SearchHit> = result.value.into_iter().map(SearchResult::into_hit).collect();
        debug!(index_name = index, result_count = hits.len(), "Search completed");
        Ok(hits)
    }

    async fn document_count(&self, index: &str) -> Result<usize> {
        let req = self.request(reqwest::Method::GET, &format!("/indexes/{}/docs/$count", index));
        let response = self.send(req, "count documents").await?;
        let text = response
            .text()
            .await
            .map_err(|e| parse_error("count documents", e))?;
        // Body may carry a UTF-8 BOM before the number.
        text.trim_start_matches('\u{feff}')
            .trim()
            .parse()
            .map_err(|e| Error::Search(format!("count documents: bad count '{}': {}", text, e)))
    }

    fn backend_name(&self) -> &str {
        "azure"
    }
}
