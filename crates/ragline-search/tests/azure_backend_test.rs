//! Azure AI Search REST backend against a mock server.

use ragline_search::{
    build_index_definition, AzureSearchBackend, AzureSearchConfig, Error, HybridQuery,
    IndexedDocument, SearchBackend,
};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend(server: &MockServer) -> AzureSearchBackend {
    AzureSearchBackend::new(AzureSearchConfig::new(
        server.uri(),
        Some("admin-key".to_string()),
    ))
    .expect("backend")
}

fn document(id: &str) -> IndexedDocument {
    IndexedDocument {
        id: id.to_string(),
        content: "A hotfix is...".to_string(),
        filepath: "hotfix-policy".to_string(),
        title: "Hotfix Policy".to_string(),
        url: "/data/hotfix-policy".to_string(),
        content_vector: vec![0.25; 4],
    }
}

#[tokio::test]
async fn test_create_index_posts_definition() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/indexes"))
        .and(query_param("api-version", "2024-07-01"))
        .and(header("api-key", "admin-key"))
        .and(body_partial_json(serde_json::json!({
            "name": "contoso-products",
            "vectorSearch": {
                "profiles": [
                    {"name": "myHnswProfile", "algorithm": "myHnsw"},
                    {"name": "myExhaustiveKnnProfile", "algorithm": "myExhaustiveKnn"}
                ]
            }
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let definition = build_index_definition("contoso-products", "text-embedding-ada-002").unwrap();
    backend(&server).create_index(&definition).await.unwrap();
}

#[tokio::test]
async fn test_delete_missing_index_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/indexes/contoso-products"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "error": {"code": "", "message": "No index with the name 'contoso-products' was found"}
        })))
        .mount(&server)
        .await;

    let err = backend(&server)
        .delete_index("contoso-products")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_get_index_round_trips_definition() {
    let server = MockServer::start().await;
    let definition = build_index_definition("contoso-products", "text-embedding-3-large").unwrap();
    let mut body = serde_json::to_value(&definition).unwrap();
    // Services add metadata the client ignores.
    body["@odata.context"] = serde_json::json!("https://example/$metadata#indexes/$entity");

    Mock::given(method("GET"))
        .and(path("/indexes/contoso-products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let fetched = backend(&server).get_index("contoso-products").await.unwrap();
    assert_eq!(fetched, definition);
}

#[tokio::test]
async fn test_upload_sends_single_batch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/indexes/contoso-products/docs/index"))
        .and(body_partial_json(serde_json::json!({
            "value": [
                {"@search.action": "upload", "id": "1"},
                {"@search.action": "upload", "id": "2"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "value": [
                {"key": "1", "status": true, "errorMessage": null, "statusCode": 201},
                {"key": "2", "status": true, "errorMessage": null, "statusCode": 201}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    backend(&server)
        .upload_documents("contoso-products", &[document("1"), document("2")])
        .await
        .unwrap();
}

#[tokio::test]
async fn test_partial_upload_failure_is_search_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/indexes/contoso-products/docs/index"))
        .respond_with(ResponseTemplate::new(207).set_body_json(serde_json::json!({
            "value": [
                {"key": "1", "status": true, "statusCode": 201},
                {"key": "2", "status": false, "errorMessage": "vector too long", "statusCode": 400}
            ]
        })))
        .mount(&server)
        .await;

    let err = backend(&server)
        .upload_documents("contoso-products", &[document("1"), document("2")])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Search(_)));
    assert!(err.to_string().contains("vector too long"));
}

#[tokio::test]
async fn test_hybrid_search_request_and_ranking() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/indexes/contoso-products/docs/search"))
        .and(body_partial_json(serde_json::json!({
            "search": "hotfix definition",
            "top": 2,
            "select": "id,content,filepath,title,url",
            "vectorQueries": [{"kind": "vector", "k": 2, "fields": "contentVector"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "value": [
                {"@search.score": 0.033, "id": "1", "content": "A hotfix is...", "filepath": "hotfix-policy", "title": "Hotfix Policy", "url": "/data/hotfix-policy"},
                {"@search.score": 0.016, "id": "2", "content": "Deployments happen...", "filepath": "deploy-guide", "title": "Deploy Guide", "url": "/data/deploy-guide"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let hits = backend(&server)
        .search(
            "contoso-products",
            &HybridQuery::new("hotfix definition", vec![0.1; 4], 2),
        )
        .await
        .unwrap();

    let ids: Vec<_> = hits.iter().map(|h| h.document.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2"]);
    assert_eq!(hits[1].document.title, "Deploy Guide");
}

#[tokio::test]
async fn test_throttling_is_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/indexes/contoso-products/docs/search"))
        .respond_with(ResponseTemplate::new(503).set_body_json(serde_json::json!({
            "error": {"code": "ServiceUnavailable", "message": "busy"}
        })))
        .mount(&server)
        .await;

    let err = backend(&server)
        .search("contoso-products", &HybridQuery::text("hotfix", 3))
        .await
        .unwrap_err();
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_bad_request_is_search_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/indexes/contoso-products/docs/search"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": {"code": "InvalidRequestParameter", "message": "Unknown field 'price'"}
        })))
        .mount(&server)
        .await;

    let err = backend(&server)
        .search("contoso-products", &HybridQuery::text("hotfix", 3))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Search(_)));
    assert!(err.to_string().contains("Unknown field"));
}

#[tokio::test]
async fn test_document_count() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/indexes/contoso-products/docs/$count"))
        .respond_with(ResponseTemplate::new(200).set_body_string("\u{feff}42"))
        .mount(&server)
        .await;

    assert_eq!(
        backend(&server)
            .document_count("contoso-products")
            .await
            .unwrap(),
        42
    );
}
