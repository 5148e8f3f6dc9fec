//! Document ingestor: embeds content records into index-ready documents.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{info, trace};

use ragline_core::{
    check_dimensions, defaults, observe, CallPolicy, ContentRecord, EmbeddingBackend,
    EmbeddingModel, Error, IndexedDocument, PipelineObserver, Result, Stage,
};

/// Turns content records into [`IndexedDocument`]s.
///
/// Each record is embedded independently, with up to `concurrency` calls
/// in flight. Output order matches input order. The first failing record
/// aborts the whole batch.
pub struct DocumentIngestor {
    embedder: Arc<dyn EmbeddingBackend>,
    model: EmbeddingModel,
    content_column: String,
    concurrency: usize,
    policy: CallPolicy,
    observer: Option<Arc<dyn PipelineObserver>>,
}

impl DocumentIngestor {
    pub fn new(embedder: Arc<dyn EmbeddingBackend>, model: EmbeddingModel) -> Self {
        Self {
            embedder,
            model,
            content_column: defaults::CONTENT_COLUMN.to_string(),
            concurrency: defaults::INGEST_CONCURRENCY,
            policy: CallPolicy::default(),
            observer: None,
        }
    }

    /// Column whose value is embedded and stored as `content`.
    pub fn with_content_column(mut self, column: impl Into<String>) -> Self {
        self.content_column = column.into();
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
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
        self.model
    }

    /// Embed every record. All-or-nothing.
    pub async fn ingest(&self, records: &[ContentRecord]) -> Result<Vec<IndexedDocument>> {
        observe(self.observer.as_ref(), Stage::Ingest, self.ingest_inner(records)).await
    }

    async fn ingest_inner(&self, records: &[ContentRecord]) -> Result<Vec<IndexedDocument>> {
        reject_duplicate_ids(records)?;

        let start = Instant::now();
        let documents: Vec<IndexedDocument> = stream::iter(records)
            .map(|record| self.embed_record(record))
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        info!(
            subsystem = "search",
            component = "ingestor",
            op = "ingest",
            model = self.model.as_str(),
            document_count = documents.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Ingested content records"
        );
        Ok(documents)
    }

    async fn embed_record(&self, record: &ContentRecord) -> Result<IndexedDocument> {
        let content = record
            .field(&self.content_column)
            .map_err(|e| e.for_record(&record.id))?;

        let vector = self
            .policy
            .retrying("embed_document", || self.embedder.embed_text(content))
            .await
            .map_err(|e| e.reclassify(Error::Embedding).for_record(&record.id))?;

        check_dimensions(self.model, &vector).map_err(|e| e.for_record(&record.id))?;

        trace!(record_id = %record.id, dimensions = vector.len(), "Embedded record");
        Ok(IndexedDocument::from_record(record, content, vector))
    }
}

/// The record id is the index key, so it must be unique within a batch.
fn reject_duplicate_ids(records: &[ContentRecord]) -> Result<()> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        if !seen.insert(record.id.as_str()) {
            return Err(Error::InvalidInput(format!(
                "duplicate record id '{}' in ingestion batch",
                record.id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragline_core::{RecordingObserver, StageEvent, StageOutcome};
    use ragline_inference::mock::MockEmbeddingBackend;

    fn records() -> Vec<ContentRecord> {
        vec![
            ContentRecord::new("1", "Hotfix Policy").with_field("content", "A hotfix is..."),
            ContentRecord::new("2", "Deploy Guide").with_field("content", "Deployments happen..."),
            ContentRecord::new("3", "Hotfix Policy").with_field("content", "Duplicate title"),
        ]
    }

    fn fast_policy() -> CallPolicy {
        CallPolicy {
            timeout_secs: 5,
            max_retries: 2,
            base_delay_ms: 1,
        }
    }

    #[tokio::test]
    async fn test_ingest_preserves_order_and_derives_paths() {
        let backend = MockEmbeddingBackend::new(EmbeddingModel::Ada002);
        let ingestor = DocumentIngestor::new(Arc::new(backend.clone()), EmbeddingModel::Ada002)
            .with_concurrency(3);

        let docs = ingestor.ingest(&records()).await.unwrap();
        let ids: Vec<_> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(docs[0].filepath, "hotfix-policy");
        assert_eq!(docs[0].url, "/data/hotfix-policy");
        assert_eq!(docs[0].title, "Hotfix Policy");
        assert_eq!(docs[0].content, "A hotfix is...");
        assert_eq!(docs[0].content_vector.len(), 1536);
        // Colliding titles collide on filepath.
        assert_eq!(docs[0].filepath, docs[2].filepath);
        assert_eq!(backend.call_count(), 3);
    }

    #[tokio::test]
    async fn test_embedding_failure_names_record() {
        let backend = MockEmbeddingBackend::new(EmbeddingModel::Ada002).fail_on("Deployments");
        let ingestor = DocumentIngestor::new(Arc::new(backend), EmbeddingModel::Ada002);

        let err = ingestor.ingest(&records()).await.unwrap_err();
        match err {
            Error::Ingestion { record_id, source } => {
                assert_eq!(record_id, "2");
                assert!(matches!(*source, Error::Embedding(_)));
            }
            other => panic!("expected ingestion error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let backend = MockEmbeddingBackend::new(EmbeddingModel::Ada002).with_transient_failures(2);
        let ingestor = DocumentIngestor::new(Arc::new(backend.clone()), EmbeddingModel::Ada002)
            .with_concurrency(1)
            .with_policy(fast_policy());

        let docs = ingestor.ingest(&records()[..1]).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(backend.call_count(), 3);
    }

    #[tokio::test]
    async fn test_exhausted_retries_surface_as_embedding_error() {
        let backend = MockEmbeddingBackend::new(EmbeddingModel::Ada002).with_transient_failures(10);
        let ingestor = DocumentIngestor::new(Arc::new(backend), EmbeddingModel::Ada002)
            .with_concurrency(1)
            .with_policy(fast_policy());

        let err = ingestor.ingest(&records()[..1]).await.unwrap_err();
        match err {
            Error::Ingestion { source, .. } => assert!(matches!(*source, Error::Embedding(_))),
            other => panic!("expected ingestion error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_dimension_mismatch_fails_batch() {
        let backend = MockEmbeddingBackend::new(EmbeddingModel::Ada002).with_dimension(3072);
        let ingestor = DocumentIngestor::new(Arc::new(backend), EmbeddingModel::Ada002);

        let err = ingestor.ingest(&records()).await.unwrap_err();
        match err {
            Error::Ingestion { record_id, source } => {
                assert_eq!(record_id, "1");
                assert!(source.to_string().contains("3072"));
            }
            other => panic!("expected ingestion error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_duplicate_ids_rejected_before_embedding() {
        let backend = MockEmbeddingBackend::new(EmbeddingModel::Ada002);
        let ingestor = DocumentIngestor::new(Arc::new(backend.clone()), EmbeddingModel::Ada002);
        let mut batch = records();
        batch.push(ContentRecord::new("1", "Again").with_field("content", "x"));

        let err = ingestor.ingest(&batch).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_custom_content_column() {
        let backend = MockEmbeddingBackend::new(EmbeddingModel::Ada002);
        let ingestor = DocumentIngestor::new(Arc::new(backend.clone()), EmbeddingModel::Ada002)
            .with_content_column("description");
        let batch = vec![ContentRecord::new("t1", "Trail Tent").with_field("description", "Sleeps two")];

        let docs = ingestor.ingest(&batch).await.unwrap();
        assert_eq!(docs[0].content, "Sleeps two");
        assert_eq!(backend.calls(), vec!["Sleeps two".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_content_column_is_config_error() {
        let backend = MockEmbeddingBackend::new(EmbeddingModel::Ada002);
        let ingestor = DocumentIngestor::new(Arc::new(backend), EmbeddingModel::Ada002)
            .with_content_column("body");

        let err = ingestor.ingest(&records()).await.unwrap_err();
        match err {
            Error::Ingestion { source, .. } => assert!(matches!(*source, Error::Config(_))),
            other => panic!("expected ingestion error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_observer_sees_ingest_stage() {
        let recorder = RecordingObserver::new();
        let backend = MockEmbeddingBackend::new(EmbeddingModel::Ada002);
        let ingestor = DocumentIngestor::new(Arc::new(backend), EmbeddingModel::Ada002)
            .with_observer(Arc::new(recorder.clone()));

        ingestor.ingest(&records()).await.unwrap();
        assert_eq!(
            recorder.events(),
            vec![
                StageEvent::Started(Stage::Ingest),
                StageEvent::Finished(Stage::Ingest, StageOutcome::Ok),
            ]
        );
    }
}
