//! Retrieval orchestrator: intent, query embedding, hybrid search.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, trace};

use ragline_core::{
    defaults, observe, CallPolicy, ChatMessage, EmbeddingBackend, Error, HybridQuery,
    PipelineObserver, Result, RetrievalContext, RetrievedDocument, SearchBackend, SearchHit,
    Stage,
};

use crate::intent::IntentResolver;

/// Drives one query's retrieval steps in order.
///
/// Steps are strictly sequential. The orchestrator itself holds no
/// per-query state, so one instance serves concurrent queries.
pub struct RetrievalOrchestrator {
    resolver: IntentResolver,
    embedder: Arc<dyn EmbeddingBackend>,
    search: Arc<dyn SearchBackend>,
    index_name: String,
    policy: CallPolicy,
    observer: Option<Arc<dyn PipelineObserver>>,
}

impl RetrievalOrchestrator {
    pub fn new(
        resolver: IntentResolver,
        embedder: Arc<dyn EmbeddingBackend>,
        search: Arc<dyn SearchBackend>,
        index_name: impl Into<String>,
    ) -> Self {
        Self {
            resolver,
            embedder,
            search,
            index_name: index_name.into(),
            policy: CallPolicy::default(),
            observer: None,
        }
    }

    pub fn with_policy(mut self, policy: CallPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    /// Retrieve grounding documents for the conversation.
    ///
    /// Resolves the intent, embeds its `search_query`, and runs one hybrid
    /// search with `k = top`. Documents keep the backend's rank order. On
    /// success the resolved query is recorded as a thought and the batch is
    /// appended to `context.grounding_data`. An empty result is not an error.
    pub async fn get_documents(
        &self,
        messages: &[ChatMessage],
        context: &mut RetrievalContext,
    ) -> Result<Vec<RetrievedDocument>> {
        let start = Instant::now();
        let top = context.overrides.top();

        let intent = self.resolver.resolve(messages).await?;
        let search_query = intent.search_query;

        let documents = if top == 0 {
            debug!(query = %search_query, "top is 0, skipping embedding and search");
            Vec::new()
        } else {
            let hits = self.hybrid_search(&search_query, top).await?;
            unique_documents(hits, top)
        };

        for doc in &documents {
            trace!(
                index_name = %self.index_name,
                id = %doc.id,
                filepath = %doc.filepath,
                "Retrieved document"
            );
        }
        debug!(
            subsystem = "chat",
            component = "retrieval",
            op = "get_documents",
            index_name = %self.index_name,
            query = %search_query,
            top,
            result_count = documents.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Retrieved grounding documents"
        );

        context.add_thought(defaults::SEARCH_QUERY_THOUGHT, search_query);
        context.add_grounding(documents.clone());
        Ok(documents)
    }

    async fn hybrid_search(&self, search_query: &str, top: usize) -> Result<Vec<SearchHit>> {
        let observer = self.observer.as_ref();

        let vector = observe(observer, Stage::EmbedQuery, async {
            self.policy
                .retrying("embed_query", || self.embedder.embed_text(search_query))
                .await
                .map_err(|e| e.reclassify(Error::Embedding))
        })
        .await?;

        let query = HybridQuery::new(search_query, vector, top);
        observe(observer, Stage::Search, async {
            self.policy
                .retrying("search", || self.search.search(&self.index_name, &query))
                .await
                .map_err(|e| match e {
                    Error::NotFound(msg) => Error::Search(msg),
                    other => other.reclassify(Error::Search),
                })
        })
        .await
    }
}

/// Drop repeated ids (first occurrence wins) and cap at `top`.
fn unique_documents(hits: Vec<SearchHit>, top: usize) -> Vec<RetrievedDocument> {
    let mut seen = HashSet::new();
    hits.into_iter()
        .map(|hit| hit.document)
        .filter(|doc| seen.insert(doc.id.clone()))
        .take(top)
        .collect()
}
