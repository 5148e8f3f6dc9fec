//! Index manager: destructive full rebuild of a search index.
//!
//! A rebuild loads and embeds the whole source first, then replaces the
//! index (delete, create) and uploads every document in one call. An
//! embedding failure therefore leaves any previous index untouched. The
//! replace and upload steps are not transactional: a failure between
//! deleting the old index and finishing the upload leaves an empty or
//! partially loaded index behind.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{info, warn};

use ragline_core::{
    observe, CallPolicy, ContentRecord, EmbeddingModel, Error, IndexDefinition, PipelineObserver,
    Result, SearchBackend, Stage,
};

use crate::ingest::DocumentIngestor;
use crate::loader::load_records;
use crate::schema::{index_definition_for, HnswSettings};

/// Summary of a completed rebuild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexReport {
    pub index_name: String,
    pub document_count: usize,
    pub dimensions: usize,
    /// Whether an index of the same name existed and was deleted.
    pub replaced_existing: bool,
}

/// Creates and replaces indexes in a search backend.
pub struct IndexManager {
    search: Arc<dyn SearchBackend>,
    ingestor: DocumentIngestor,
    hnsw: HnswSettings,
    policy: CallPolicy,
    observer: Option<Arc<dyn PipelineObserver>>,
}

impl IndexManager {
    pub fn new(search: Arc<dyn SearchBackend>, ingestor: DocumentIngestor) -> Self {
        Self {
            search,
            ingestor,
            hnsw: HnswSettings::default(),
            policy: CallPolicy::default(),
            observer: None,
        }
    }

    pub fn with_hnsw(mut self, hnsw: HnswSettings) -> Self {
        self.hnsw = hnsw;
        self
    }

    pub fn with_policy(mut self, policy: CallPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn model(&self) -> EmbeddingModel {
        self.ingestor.model()
    }

    /// Rebuild `index_name` from the content file at `path`.
    pub async fn create_index(
        &self,
        path: impl AsRef<Path>,
        index_name: &str,
    ) -> Result<IndexReport> {
        let records = load_records(path)?;
        self.rebuild_from_records(&records, index_name).await
    }

    /// Rebuild `index_name` from in-memory records.
    pub async fn rebuild_from_records(
        &self,
        records: &[ContentRecord],
        index_name: &str,
    ) -> Result<IndexReport> {
        let start = Instant::now();
        let observer = self.observer.as_ref();

        let definition = observe(observer, Stage::BuildSchema, async {
            index_definition_for(index_name, self.model(), self.hnsw)
        })
        .await?;

        let documents = self.ingestor.ingest(records).await?;

        let replaced_existing =
            observe(observer, Stage::ReplaceIndex, self.replace_index(&definition)).await?;

        observe(observer, Stage::Upload, async {
            self.policy
                .once(
                    "upload_documents",
                    self.search.upload_documents(&definition.name, &documents),
                )
                .await
                .map_err(|e| e.reclassify(Error::Search))
        })
        .await?;

        let report = IndexReport {
            index_name: definition.name.clone(),
            document_count: documents.len(),
            dimensions: self.model().dimensions(),
            replaced_existing,
        };

        info!(
            subsystem = "search",
            component = "index_manager",
            op = "create_index",
            index_name = %report.index_name,
            backend = self.search.backend_name(),
            document_count = report.document_count,
            dimensions = report.dimensions,
            replaced_existing,
            duration_ms = start.elapsed().as_millis() as u64,
            "Index rebuilt"
        );
        Ok(report)
    }

    /// Delete any existing index of the same name, then create it fresh.
    ///
    /// Returns whether an index was deleted. A missing index is a no-op.
    async fn replace_index(&self, definition: &IndexDefinition) -> Result<bool> {
        let deleted = match self
            .policy
            .once("delete_index", self.search.delete_index(&definition.name))
            .await
        {
            Ok(()) => true,
            Err(Error::NotFound(_)) => false,
            Err(e) => return Err(e.reclassify(Error::Search)),
        };
        if deleted {
            warn!(index_name = %definition.name, "Deleted existing index before rebuild");
        }

        self.policy
            .once("create_index", self.search.create_index(definition))
            .await
            .map_err(|e| e.reclassify(Error::Search))?;
        Ok(deleted)
    }
}
