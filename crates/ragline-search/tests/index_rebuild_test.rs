//! File-to-index rebuilds against the in-memory backend.

use std::io::Write;
use std::sync::Arc;

use ragline_inference::mock::MockEmbeddingBackend;
use ragline_search::{
    DocumentIngestor, EmbeddingBackend, EmbeddingModel, Error, HybridQuery, InMemorySearchBackend,
    IndexManager, SearchBackend,
};
use tempfile::NamedTempFile;

const PRODUCTS_CSV: &str = "id,name,content,price\n\
1,Hotfix Policy,A hotfix is an urgent production fix,0\n\
2,Deploy Guide,Deployments happen every Tuesday,0\n";

fn csv_file(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".csv")
        .tempfile()
        .expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write csv");
    file
}

fn manager(search: Arc<InMemorySearchBackend>, embedder: Arc<MockEmbeddingBackend>) -> IndexManager {
    IndexManager::new(search, DocumentIngestor::new(embedder, EmbeddingModel::Ada002))
}

#[tokio::test]
async fn test_create_index_from_csv_twice_is_stable() {
    let file = csv_file(PRODUCTS_CSV);
    let search = Arc::new(InMemorySearchBackend::new());
    let embedder = Arc::new(MockEmbeddingBackend::new(EmbeddingModel::Ada002));
    let mgr = manager(search.clone(), embedder);

    let first = mgr.create_index(file.path(), "contoso-products").await.unwrap();
    let schema_first = search.get_index("contoso-products").await.unwrap();
    let second = mgr.create_index(file.path(), "contoso-products").await.unwrap();
    let schema_second = search.get_index("contoso-products").await.unwrap();

    assert_eq!(first.document_count, 2);
    assert_eq!(second.document_count, first.document_count);
    assert!(!first.replaced_existing);
    assert!(second.replaced_existing);
    assert_eq!(schema_first, schema_second);
}

#[tokio::test]
async fn test_indexed_documents_are_searchable() {
    let file = csv_file(PRODUCTS_CSV);
    let search = Arc::new(InMemorySearchBackend::new());
    let embedder = Arc::new(MockEmbeddingBackend::new(EmbeddingModel::Ada002));
    let mgr = manager(search.clone(), embedder.clone());
    mgr.create_index(file.path(), "contoso-products").await.unwrap();

    let vector = embedder.embed_text("hotfix").await.unwrap();
    let hits = search
        .search("contoso-products", &HybridQuery::new("hotfix", vector, 1))
        .await
        .unwrap();

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].document.id, "1");
    assert_eq!(hits[0].document.url, "/data/hotfix-policy");
}

#[tokio::test]
async fn test_embedding_failure_uploads_nothing() {
    let file = csv_file(PRODUCTS_CSV);
    let search = Arc::new(InMemorySearchBackend::new());
    let embedder = Arc::new(MockEmbeddingBackend::new(EmbeddingModel::Ada002).fail_on("Tuesday"));
    let mgr = manager(search.clone(), embedder);

    let err = mgr
        .create_index(file.path(), "contoso-products")
        .await
        .unwrap_err();

    match err {
        Error::Ingestion { record_id, .. } => assert_eq!(record_id, "2"),
        other => panic!("expected ingestion error, got {:?}", other),
    }
    assert!(matches!(
        search.document_count("contoso-products").await.unwrap_err(),
        Error::NotFound(_)
    ));
}

#[tokio::test]
async fn test_missing_source_file() {
    let search = Arc::new(InMemorySearchBackend::new());
    let embedder = Arc::new(MockEmbeddingBackend::new(EmbeddingModel::Ada002));
    let err = manager(search, embedder.clone())
        .create_index("/nonexistent/products.csv", "contoso-products")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Io(_)));
    assert_eq!(embedder.call_count(), 0);
}

#[tokio::test]
async fn test_jsonl_source() {
    let mut file = tempfile::Builder::new()
        .suffix(".jsonl")
        .tempfile()
        .unwrap();
    writeln!(file, r#"{{"id": "a", "name": "Trail Tent", "content": "Sleeps two"}}"#).unwrap();
    writeln!(file, r#"{{"id": "b", "name": "Camp Stove", "content": "Boils water"}}"#).unwrap();

    let search = Arc::new(InMemorySearchBackend::new());
    let embedder = Arc::new(MockEmbeddingBackend::new(EmbeddingModel::Ada002));
    let report = manager(search, embedder)
        .create_index(file.path(), "gear")
        .await
        .unwrap();
    assert_eq!(report.document_count, 2);
}
