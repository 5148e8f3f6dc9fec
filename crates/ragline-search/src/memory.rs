//! In-process hybrid search backend.
//!
//! Keeps indexes in memory and answers hybrid queries exactly: a lexical
//! ranking by query-term frequency over searchable string fields, an exact
//! similarity scan over the vector field, and Reciprocal Rank Fusion of the
//! two. Both vector profiles are served by the same exact scan.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, trace};

use ragline_core::{
    Error, HybridQuery, IndexDefinition, IndexedDocument, Result, RetrievedDocument, SearchBackend,
    SearchHit, VectorMetric,
};

use crate::rrf::rrf_fuse;

struct MemoryIndex {
    definition: IndexDefinition,
    documents: BTreeMap<String, IndexedDocument>,
}

/// Search backend holding every index in process memory.
#[derive(Default)]
pub struct InMemorySearchBackend {
    indexes: RwLock<HashMap<String, MemoryIndex>>,
}

impl InMemorySearchBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

fn validate_definition(definition: &IndexDefinition) -> Result<()> {
    let keys = definition.fields.iter().filter(|f| f.key).count();
    if keys != 1 {
        return Err(Error::InvalidInput(format!(
            "index '{}' must have exactly one key field, found {}",
            definition.name, keys
        )));
    }
    for field in definition.vector_fields() {
        if field.dimensions.unwrap_or(0) == 0 {
            return Err(Error::InvalidInput(format!(
                "vector field '{}' has no dimensions",
                field.name
            )));
        }
        if definition.algorithm_for(&field.name).is_none() {
            return Err(Error::InvalidInput(format!(
                "vector field '{}' is not bound to a known algorithm profile",
                field.name
            )));
        }
    }
    Ok(())
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// Text value of a searchable string field.
fn field_text<'a>(doc: &'a IndexedDocument, field: &str) -> Option<&'a str> {
    match field {
        "id" => Some(&doc.id),
        "content" => Some(&doc.content),
        "filepath" => Some(&doc.filepath),
        "title" => Some(&doc.title),
        "url" => Some(&doc.url),
        _ => None,
    }
}

fn similarity(metric: VectorMetric, a: &[f32], b: &[f32]) -> f32 {
    match metric {
        VectorMetric::Cosine => {
            let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
            let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
            let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm_a == 0.0 || norm_b == 0.0 {
                0.0
            } else {
                dot / (norm_a * norm_b)
            }
        }
        VectorMetric::DotProduct => a.iter().zip(b).map(|(x, y)| x * y).sum(),
        VectorMetric::Euclidean => {
            let dist: f32 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum::<f32>().sqrt();
            1.0 / (1.0 + dist)
        }
    }
}

fn to_hit(doc: &IndexedDocument, score: f32) -> SearchHit {
    SearchHit {
        document: doc.to_retrieved(),
        score: Some(score as f64),
    }
}

/// Sort best-first; ties broken by key order.
fn rank(mut scored: Vec<(&IndexedDocument, f32)>) -> Vec<SearchHit> {
    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.id.cmp(&b.0.id))
    });
    scored.into_iter().map(|(doc, score)| to_hit(doc, score)).collect()
}

impl MemoryIndex {
    fn lexical(&self, search_text: &str) -> Vec<SearchHit> {
        let terms = tokenize(search_text);
        if terms.is_empty() {
            return Vec::new();
        }

        let searchable: Vec<&str> = self
            .definition
            .fields
            .iter()
            .filter(|f| f.searchable && !f.is_vector())
            .map(|f| f.name.as_str())
            .collect();

        let scored = self
            .documents
            .values()
            .filter_map(|doc| {
                let score: usize = searchable
                    .iter()
                    .filter_map(|field| field_text(doc, field))
                    .flat_map(tokenize)
                    .filter(|token| terms.contains(token))
                    .count();
                (score > 0).then_some((doc, score as f32))
            })
            .collect();
        rank(scored)
    }

    fn vector(&self, query: &HybridQuery) -> Result<Vec<SearchHit>> {
        let Some(vq) = &query.vector else {
            return Ok(Vec::new());
        };

        let dims = self.definition.vector_dimensions(&vq.field).ok_or_else(|| {
            Error::Search(format!(
                "'{}' is not a vector field of index '{}'",
                vq.field, self.definition.name
            ))
        })?;
        if vq.vector.len() != dims {
            return Err(Error::Search(format!(
                "query vector has {} dimensions, field '{}' expects {}",
                vq.vector.len(),
                vq.field,
                dims
            )));
        }
        let metric = self
            .definition
            .algorithm_for(&vq.field)
            .map(|a| a.metric())
            .unwrap_or(VectorMetric::Cosine);

        let scored = self
            .documents
            .values()
            .map(|doc| (doc, similarity(metric, &vq.vector, &doc.content_vector)))
            .collect();
        let mut hits = rank(scored);
        hits.truncate(vq.k);
        Ok(hits)
    }
}

#[async_trait]
impl SearchBackend for InMemorySearchBackend {
    async fn create_index(&self, definition: &IndexDefinition) -> Result<()> {
        validate_definition(definition)?;
        let mut indexes = self.indexes.write().await;
        if indexes.contains_key(&definition.name) {
            return Err(Error::Search(format!(
                "index '{}' already exists",
                definition.name
            )));
        }
        indexes.insert(
            definition.name.clone(),
            MemoryIndex {
                definition: definition.clone(),
                documents: BTreeMap::new(),
            },
        );
        debug!(index_name = %definition.name, "Created in-memory index");
        Ok(())
    }

    async fn delete_index(&self, name: &str) -> Result<()> {
        match self.indexes.write().await.remove(name) {
            Some(_) => Ok(()),
            None => Err(Error::NotFound(format!("index '{}'", name))),
        }
    }

    async fn get_index(&self, name: &str) -> Result<IndexDefinition> {
        self.indexes
            .read()
            .await
            .get(name)
            .map(|index| index.definition.clone())
            .ok_or_else(|| Error::NotFound(format!("index '{}'", name)))
    }

    async fn upload_documents(&self, index: &str, documents: &[IndexedDocument]) -> Result<()> {
        let mut indexes = self.indexes.write().await;
        let target = indexes
            .get_mut(index)
            .ok_or_else(|| Error::NotFound(format!("index '{}'", index)))?;

        let dims = target
            .definition
            .vector_fields()
            .next()
            .and_then(|f| f.dimensions);
        if let Some(dims) = dims {
            if let Some(bad) = documents.iter().find(|d| d.content_vector.len() != dims) {
                return Err(Error::Search(format!(
                    "document '{}' has {} dimensions, index '{}' expects {}",
                    bad.id,
                    bad.content_vector.len(),
                    index,
                    dims
                )));
            }
        }

        for doc in documents {
            target.documents.insert(doc.id.clone(), doc.clone());
        }
        debug!(
            index_name = index,
            document_count = documents.len(),
            "Uploaded documents to in-memory index"
        );
        Ok(())
    }

    async fn search(&self, index: &str, query: &HybridQuery) -> Result<Vec<SearchHit>> {
        let indexes = self.indexes.read().await;
        let target = indexes
            .get(index)
            .ok_or_else(|| Error::NotFound(format!("index '{}'", index)))?;

        if query.top == 0 {
            return Ok(Vec::new());
        }

        let lexical = target.lexical(&query.search_text);
        let vector = target.vector(query)?;
        trace!(
            lexical_hits = lexical.len(),
            vector_hits = vector.len(),
            "In-memory hybrid candidates"
        );

        let mut hits = rrf_fuse(vec![lexical, vector], query.top);
        for hit in &mut hits {
            project(&mut hit.document, &query.select);
        }
        Ok(hits)
    }

    async fn document_count(&self, index: &str) -> Result<usize> {
        self.indexes
            .read()
            .await
            .get(index)
            .map(|i| i.documents.len())
            .ok_or_else(|| Error::NotFound(format!("index '{}'", index)))
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}

/// Blank out fields that were not selected. An empty selection keeps all.
fn project(doc: &mut RetrievedDocument, select: &[String]) {
    if select.is_empty() {
        return;
    }
    let keep = |name: &str| select.iter().any(|s| s == name);
    if !keep("content") {
        doc.content.clear();
    }
    if !keep("filepath") {
        doc.filepath.clear();
    }
    if !keep("title") {
        doc.title.clear();
    }
    if !keep("url") {
        doc.url.clear();
    }
}
