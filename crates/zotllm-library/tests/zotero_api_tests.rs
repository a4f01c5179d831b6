//! Zotero Web API tests against a mock server
//!
//! The client is blocking, so each call runs on `spawn_blocking` while
//! wiremock serves requests on the tokio runtime.

use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zotllm_domain::traits::LibraryClient;
use zotllm_domain::NoteTarget;
use zotllm_library::{LibraryConfig, LibraryError, ZoteroClient};

fn config(server: &MockServer) -> LibraryConfig {
    LibraryConfig::user("42")
        .with_api_key("test-key")
        .with_base_url(server.uri())
}

async fn with_client<T, F>(config: LibraryConfig, f: F) -> T
where
    T: Send + 'static,
    F: FnOnce(&ZoteroClient) -> T + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let client = ZoteroClient::new(&config).expect("client");
        f(&client)
    })
    .await
    .expect("blocking task panicked")
}

fn item_json(key: &str, title: &str, tags: &[&str]) -> serde_json::Value {
    serde_json::json!({
        "key": key,
        "version": 5,
        "data": {
            "key": key,
            "itemType": "journalArticle",
            "title": title,
            "tags": tags.iter().map(|t| serde_json::json!({"tag": t})).collect::<Vec<_>>(),
            "collections": []
        }
    })
}

#[tokio::test]
async fn test_get_item_sends_api_headers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/42/items/ABCD2345"))
        .and(header("Zotero-API-Key", "test-key"))
        .and(header("Zotero-API-Version", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(item_json("ABCD2345", "Paper", &[])))
        .expect(1)
        .mount(&server)
        .await;

    let item = with_client(config(&server), |c| c.get_item("ABCD2345"))
        .await
        .unwrap();
    assert_eq!(item.title, "Paper");
    assert_eq!(item.version, 5);
}

#[tokio::test]
async fn test_status_codes_map_to_errors() {
    let server = MockServer::start().await;

    Mock::given(path("/users/42/items/GONE"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Item not found"))
        .mount(&server)
        .await;
    Mock::given(path("/users/42/items/LOCKED"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
        .mount(&server)
        .await;

    let (gone, locked) = with_client(config(&server), |c| (c.get_item("GONE"), c.get_item("LOCKED"))).await;
    assert!(matches!(gone, Err(LibraryError::NotFound(_))));
    assert!(matches!(locked, Err(LibraryError::Auth(_))));
}

#[tokio::test]
async fn test_listing_follows_pages() {
    let server = MockServer::start().await;

    let first: Vec<_> = (0..2).map(|i| item_json(&format!("K{}", i), "p", &[])).collect();
    let second = vec![item_json("K2", "p", &[])];

    Mock::given(path("/users/42/items/top"))
        .and(query_param("start", "0"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Total-Results", "3")
                .set_body_json(first),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(path("/users/42/items/top"))
        .and(query_param("start", "2"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Total-Results", "3")
                .set_body_json(second),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut cfg = config(&server);
    cfg.page_size = 2;
    let items = with_client(cfg, |c| c.list_all_items()).await.unwrap();
    let keys: Vec<_> = items.iter().map(|i| i.key.as_str()).collect();
    assert_eq!(keys, vec!["K0", "K1", "K2"]);
}

#[tokio::test]
async fn test_rate_limit_retried_once() {
    let server = MockServer::start().await;

    Mock::given(path("/users/42/items/ABCD2345"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(path("/users/42/items/ABCD2345"))
        .respond_with(ResponseTemplate::new(200).set_body_json(item_json("ABCD2345", "Paper", &[])))
        .mount(&server)
        .await;

    let item = with_client(config(&server), |c| c.get_item("ABCD2345")).await;
    assert!(item.is_ok());
}

#[tokio::test]
async fn test_persistent_rate_limit_is_reported() {
    let server = MockServer::start().await;

    Mock::given(path("/users/42/items/ABCD2345"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .expect(2)
        .mount(&server)
        .await;

    let result = with_client(config(&server), |c| c.get_item("ABCD2345")).await;
    assert!(matches!(result, Err(LibraryError::RateLimited { .. })));
}

#[tokio::test]
async fn test_missing_full_text_is_none() {
    let server = MockServer::start().await;

    Mock::given(path("/users/42/items/PDF1/fulltext"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "content": "Indexed body", "indexedPages": 3, "totalPages": 3
        })))
        .mount(&server)
        .await;
    Mock::given(path("/users/42/items/PDF2/fulltext"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let (indexed, missing) = with_client(config(&server), |c| {
        (c.get_full_text("PDF1"), c.get_full_text("PDF2"))
    })
    .await;
    assert_eq!(indexed.unwrap().as_deref(), Some("Indexed body"));
    assert_eq!(missing.unwrap(), None);
}

#[tokio::test]
async fn test_children_split_into_notes_and_attachments() {
    let server = MockServer::start().await;

    Mock::given(path("/users/42/items/P1/children"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"key": "N1", "version": 1, "data": {"itemType": "note", "note": "<p>x</p>",
                "tags": [{"tag": "llm_summary"}], "parentItem": "P1"}},
            {"key": "A1", "version": 1, "data": {"itemType": "attachment", "title": "PDF",
                "contentType": "application/pdf", "parentItem": "P1"}}
        ])))
        .mount(&server)
        .await;

    let children = with_client(config(&server), |c| c.get_children("P1")).await.unwrap();
    assert_eq!(children.notes.len(), 1);
    assert!(children.notes[0].has_tag("llm_summary"));
    assert!(children.has_pdf());
}

#[tokio::test]
async fn test_attachments_grouped_by_parent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/42/items"))
        .and(query_param("itemType", "attachment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"key": "A1", "version": 1, "data": {"itemType": "attachment", "title": "PDF",
                "contentType": "application/pdf", "parentItem": "P1"}},
            {"key": "A2", "version": 1, "data": {"itemType": "attachment", "title": "Snapshot",
                "contentType": "text/html", "parentItem": "P1"}},
            {"key": "A3", "version": 1, "data": {"itemType": "attachment", "title": "Snapshot",
                "contentType": "text/html", "parentItem": "P2"}},
            {"key": "A4", "version": 1, "data": {"itemType": "attachment", "title": "Loose.pdf",
                "contentType": "application/pdf"}}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let grouped = with_client(config(&server), |c| c.list_attachments()).await.unwrap();
    assert_eq!(grouped.len(), 2);
    assert_eq!(grouped["P1"].len(), 2);
    assert!(grouped["P1"].iter().any(|a| a.is_pdf()));
    assert!(!grouped["P2"].iter().any(|a| a.is_pdf()));
}

#[tokio::test]
async fn test_add_tag_patches_with_version() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/42/items/P1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(item_json("P1", "Paper", &["read"])))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/users/42/items/P1"))
        .and(header("If-Unmodified-Since-Version", "5"))
        .and(body_json(serde_json::json!({
            "tags": [{"tag": "read"}, {"tag": "llm_summary"}]
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    with_client(config(&server), |c| c.add_tag("P1", "llm_summary"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_add_present_tag_writes_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/42/items/P1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(item_json("P1", "Paper", &["LLM_Summary"])))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    with_client(config(&server), |c| c.add_tag("P1", "llm_summary"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_version_conflict_is_write_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/42/items/P1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(item_json("P1", "Paper", &[])))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(412).set_body_string("Item has been modified"))
        .mount(&server)
        .await;

    let result = with_client(config(&server), |c| c.add_tag("P1", "x")).await;
    assert!(matches!(result, Err(LibraryError::Write(_))));
}

#[tokio::test]
async fn test_create_child_note() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/users/42/items"))
        .and(body_json(serde_json::json!([{
            "itemType": "note",
            "note": "<h2>LLM Summary</h2>",
            "parentItem": "P1",
            "tags": [{"tag": "llm_summary"}]
        }])))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "successful": {"0": {"key": "NOTE0001"}},
            "success": {"0": "NOTE0001"},
            "unchanged": {},
            "failed": {}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let key = with_client(config(&server), |c| {
        c.create_note(&NoteTarget::Item("P1".into()), "<h2>LLM Summary</h2>", &["llm_summary"])
    })
    .await
    .unwrap();
    assert_eq!(key, "NOTE0001");
}

#[tokio::test]
async fn test_create_collection_reports_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/users/42/collections"))
        .and(body_json(serde_json::json!([{ "name": "#LLM QA", "parentCollection": false }])))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "successful": {}, "success": {}, "unchanged": {},
            "failed": {"0": {"code": 400, "message": "Collection name too long"}}
        })))
        .mount(&server)
        .await;

    let result = with_client(config(&server), |c| c.create_collection(None, "#LLM QA")).await;
    assert!(matches!(result, Err(LibraryError::Write(_))));
}
