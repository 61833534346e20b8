//! Integration tests for cursor-based bulk pagination
//!
//! Runs the client against a mock server that simulates the keyset listing
//! endpoints: sorted keys, inclusive `startkey`, `limit`-sized pages.

use davenport_client::{Client, DavenportError, QueryOptions, ServerConfig};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Simulated server side of a listing endpoint over a fixed key set.
///
/// Keys listed in `error_keys` answer as error rows, the way the server
/// reports per-row failures inside an otherwise successful page.
struct ListingResponder {
    keys: Vec<String>,
    error_keys: Vec<String>,
}

impl ListingResponder {
    fn over(count: usize) -> Self {
        Self { keys: fixture_keys(count), error_keys: Vec::new() }
    }
}

impl Respond for ListingResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let mut limit = usize::MAX;
        let mut start: Option<String> = None;
        for (key, value) in request.url.query_pairs() {
            match key.as_ref() {
                "limit" => limit = value.parse().unwrap_or(usize::MAX),
                // startkey arrives JSON-encoded: a quoted string
                "startkey" => start = serde_json::from_str::<String>(&value).ok(),
                _ => {}
            }
        }

        let rows: Vec<Value> = self
            .keys
            .iter()
            .filter(|key| start.as_ref().map_or(true, |s| key.as_str() >= s.as_str()))
            .take(limit)
            .map(|key| {
                if self.error_keys.contains(key) {
                    json!({ "key": key, "error": "not_found", "reason": "missing" })
                } else {
                    json!({
                        "id": key,
                        "key": key,
                        "value": { "rev": "1-abc" },
                        "doc": { "_id": key, "kind": "fixture" }
                    })
                }
            })
            .collect();

        ResponseTemplate::new(200).set_body_json(json!({
            "total_rows": self.keys.len(),
            "offset": 0,
            "rows": rows
        }))
    }
}

fn fixture_keys(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("doc-{i:04}")).collect()
}

fn client_for(server: &MockServer) -> Client {
    let config = ServerConfig::new(server.uri(), "admin", "secret");
    Client::new(&config).expect("client")
}

#[tokio::test]
async fn all_docs_fetches_a_large_database_completely_and_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/things/_all_docs"))
        .respond_with(ListingResponder::over(1250))
        .mount(&server)
        .await;

    let db = client_for(&server).database("things");
    let docs = db.all_docs(500, QueryOptions::new()).await.unwrap();

    assert_eq!(docs.len(), 1250);
    let ids: Vec<&str> = docs.iter().map(|doc| doc["_id"].as_str().unwrap()).collect();
    let expected = fixture_keys(1250);
    assert_eq!(ids, expected.iter().map(String::as_str).collect::<Vec<_>>());

    // 500 + 500 + 250, plus the empty fetch that confirms termination.
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 4);
    for request in &requests {
        let include_docs = request
            .url
            .query_pairs()
            .find(|(key, _)| key == "include_docs")
            .map(|(_, value)| value.into_owned());
        assert_eq!(include_docs.as_deref(), Some("true"));
    }
}

#[tokio::test]
async fn streaming_delivers_page_sized_chunks_with_the_same_content() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/things/_all_docs"))
        .respond_with(ListingResponder::over(1250))
        .mount(&server)
        .await;

    let db = client_for(&server).database("things");

    let mut chunk_sizes = Vec::new();
    let mut streamed = Vec::new();
    db.all_docs_each(500, QueryOptions::new(), |page| {
        chunk_sizes.push(page.len());
        streamed.extend(page);
        Ok(())
    })
    .await
    .unwrap();

    assert_eq!(chunk_sizes, vec![500, 500, 250]);
    assert_eq!(streamed.len(), 1250);

    let collected = db.all_docs(500, QueryOptions::new()).await.unwrap();
    assert_eq!(streamed, collected);
}

#[tokio::test]
async fn all_ids_excludes_error_rows_and_keeps_paginating() {
    let server = MockServer::start().await;
    let mut responder = ListingResponder::over(25);
    responder.error_keys = vec!["doc-0003".to_owned(), "doc-0011".to_owned()];
    Mock::given(method("GET"))
        .and(path("/things/_all_docs"))
        .respond_with(responder)
        .mount(&server)
        .await;

    let db = client_for(&server).database("things");
    let ids = db.all_ids(10, QueryOptions::new()).await.unwrap();

    assert_eq!(ids.len(), 23);
    assert!(!ids.contains(&"doc-0003".to_owned()));
    assert!(!ids.contains(&"doc-0011".to_owned()));
    // Order of the surviving ids is preserved.
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);
}

#[tokio::test]
async fn view_docs_paginates_on_row_ids_and_unwraps_documents() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/things/_design/stats/_view/by_id"))
        .respond_with(ListingResponder::over(120))
        .mount(&server)
        .await;

    let db = client_for(&server).database("things");
    let docs = db.view_docs("stats", "by_id", 50, QueryOptions::new()).await.unwrap();

    assert_eq!(docs.len(), 120);
    assert_eq!(docs[0]["_id"], "doc-0000");
    assert_eq!(docs[119]["_id"], "doc-0119");

    // 50 + 50 + 20 + empty
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 4);
}

#[tokio::test]
async fn exact_page_multiple_issues_one_extra_confirming_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/things/_all_docs"))
        .respond_with(ListingResponder::over(1000))
        .mount(&server)
        .await;

    let db = client_for(&server).database("things");
    let docs = db.all_docs(500, QueryOptions::new()).await.unwrap();

    assert_eq!(docs.len(), 1000);
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
}

#[tokio::test]
async fn head_probe_is_silent_while_get_raises_on_missing_documents() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/things/ghost"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/things/ghost"))
        .respond_with(ResponseTemplate::new(404).set_body_string("{\"error\":\"not_found\"}"))
        .mount(&server)
        .await;

    let db = client_for(&server).database("things");

    // HEAD: a missing document is an answer, not an error.
    assert_eq!(db.rev("ghost").await.unwrap(), None);

    // GET: the same path raises a structured failure.
    let err = db.get_doc::<Value>("ghost").await.expect_err("should raise");
    match err {
        DavenportError::UnexpectedStatus { method, status, .. } => {
            assert_eq!(method, "GET");
            assert_eq!(status, 404);
        }
        other => panic!("expected UnexpectedStatus, got {:?}", other),
    }
}
