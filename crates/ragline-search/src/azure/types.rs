//! Request and response bodies of the Azure AI Search REST API.

use serde::{Deserialize, Serialize};

use ragline_core::{HybridQuery, IndexedDocument, RetrievedDocument, SearchHit};

// =============================================================================
// DOCUMENT UPLOAD
// =============================================================================

#[derive(Debug, Serialize)]
pub struct IndexAction<'a> {
    #[serde(rename = "@search.action")]
    pub action: &'static str,
    #[serde(flatten)]
    pub document: &'a IndexedDocument,
}

#[derive(Debug, Serialize)]
pub struct IndexBatch<'a> {
    pub value: Vec<IndexAction<'a>>,
}

impl<'a> IndexBatch<'a> {
    /// Upsert every document (`mergeOrUpload` would keep stale fields).
    pub fn upload(documents: &'a [IndexedDocument]) -> Self {
        Self {
            value: documents
                .iter()
                .map(|document| IndexAction {
                    action: "upload",
                    document,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexingResult {
    pub key: String,
    pub status: bool,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub status_code: u16,
}

#[derive(Debug, Deserialize)]
pub struct IndexingResponse {
    #[serde(default)]
    pub value: Vec<IndexingResult>,
}

// =============================================================================
// SEARCH
// =============================================================================

#[derive(Debug, Serialize)]
pub struct VectorQueryBody {
    pub kind: &'static str,
    pub vector: Vec<f32>,
    pub k: usize,
    pub fields: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub search: String,
    pub top: usize,
    pub select: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub vector_queries: Vec<VectorQueryBody>,
}

impl From<&HybridQuery> for SearchRequest {
    fn from(query: &HybridQuery) -> Self {
        Self {
            search: query.search_text.clone(),
            top: query.top,
            select: query.select.join(","),
            vector_queries: query
                .vector
                .iter()
                .map(|vq| VectorQueryBody {
                    kind: "vector",
                    vector: vq.vector.clone(),
                    k: vq.k,
                    fields: vq.field.clone(),
                })
                .collect(),
        }
    }
}

/// One search result. Unselected fields are absent.
#[derive(Debug, Deserialize)]
pub struct SearchResult {
    #[serde(rename = "@search.score", default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub filepath: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl SearchResult {
    pub fn into_hit(self) -> SearchHit {
        SearchHit {
            document: RetrievedDocument {
                id: self.id.unwrap_or_default(),
                content: self.content.unwrap_or_default(),
                filepath: self.filepath.unwrap_or_default(),
                title: self.title.unwrap_or_default(),
                url: self.url.unwrap_or_default(),
            },
            score: self.score,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub value: Vec<SearchResult>,
}

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ServiceErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ServiceErrorResponse {
    pub error: ServiceErrorBody,
}
