//! Backend construction from configuration.

use std::sync::Arc;

use tracing::{debug, info};

use ragline_core::{EmbeddingBackend, GenerationBackend, Result, SearchBackend};
use ragline_inference::{OpenAIBackend, OpenAIConfig};
use ragline_search::{
    AzureSearchBackend, AzureSearchConfig, DocumentIngestor, HnswSettings, InMemorySearchBackend,
    IndexManager, IndexReport,
};

use crate::config::{RagConfig, SearchBackendKind};

/// Shared backend handles for one process.
///
/// The intent and chat generators talk to the same endpoint with
/// different models.
#[derive(Clone)]
pub struct Backends {
    pub embedder: Arc<dyn EmbeddingBackend>,
    pub intent_generator: Arc<dyn GenerationBackend>,
    pub chat_generator: Arc<dyn GenerationBackend>,
    pub search: Arc<dyn SearchBackend>,
}

impl Backends {
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        let inference = OpenAIBackend::new(OpenAIConfig {
            base_url: config.inference.base_url.clone(),
            api_key: config.inference.api_key.clone(),
            auth_header: config.inference.auth_header.into(),
            embed_model: config.embedding_model()?,
            gen_model: config.inference.chat_model.clone(),
            timeout_seconds: config.retrieval.timeout_secs,
            skip_tls_verify: false,
        })?;
        let intent = inference.with_gen_model(&config.inference.intent_model)?;
        let inference = Arc::new(inference);

        let search: Arc<dyn SearchBackend> = match config.search.backend {
            SearchBackendKind::Azure => {
                let endpoint = config.search.endpoint.clone().unwrap_or_default();
                let mut azure = AzureSearchConfig::new(endpoint, config.search.api_key.clone());
                azure.timeout_seconds = config.retrieval.timeout_secs;
                Arc::new(AzureSearchBackend::new(azure)?)
            }
            SearchBackendKind::Memory => Arc::new(InMemorySearchBackend::new()),
        };

        info!(
            subsystem = "chat",
            component = "bootstrap",
            search_backend = search.backend_name(),
            embedding_model = %config.inference.embedding_model,
            intent_model = %config.inference.intent_model,
            chat_model = %config.inference.chat_model,
            "Backends initialized"
        );

        Ok(Self {
            embedder: inference.clone(),
            intent_generator: Arc::new(intent),
            chat_generator: inference,
            search,
        })
    }
}

/// Index manager wired with the configured model, column, HNSW parameters
/// and call policy.
pub fn index_manager(config: &RagConfig, backends: &Backends) -> Result<IndexManager> {
    let ingestor = DocumentIngestor::new(backends.embedder.clone(), config.embedding_model()?)
        .with_content_column(&config.ingestion.content_column)
        .with_concurrency(config.ingestion.concurrency)
        .with_policy(config.call_policy());

    Ok(IndexManager::new(backends.search.clone(), ingestor)
        .with_hnsw(HnswSettings {
            m: config.search.hnsw_m,
            ef_construction: config.search.hnsw_ef_construction,
            ef_search: config.search.hnsw_ef_search,
        })
        .with_policy(config.call_policy()))
}

/// Build the configured index from `ingestion.source` when the in-memory
/// backend is selected.
///
/// The in-memory backend starts empty, so a process using it calls this
/// once before serving queries. Remote indexes are only rebuilt by an
/// explicit `index` run.
pub async fn index_configured_source(
    config: &RagConfig,
    backends: &Backends,
) -> Result<Option<IndexReport>> {
    let Some(source) = &config.ingestion.source else {
        return Ok(None);
    };
    if config.search.backend != SearchBackendKind::Memory {
        debug!(
            source = %source.display(),
            "Ignoring ingestion.source for a remote search backend"
        );
        return Ok(None);
    }
    let report = index_manager(config, backends)?
        .create_index(source, &config.search.index_name)
        .await?;
    Ok(Some(report))
}
