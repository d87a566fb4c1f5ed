//! Gateway HTTP contract tests against a mock server
//!
//! Tests cover:
//! - Shared secret sent as the `key` query parameter
//! - `{ ok, data?, detail? }` envelope decoding and rejection messages
//! - Single automatic retry on HTTP 503, no retry on other statuses
//! - Batch outcome decoding (partial failures)
//! - Snapshot paging over `reviewedHasMore`

use pa_common::api::{DataQuery, UploadKind};
use pa_common::config::GatewayConfig;
use pa_common::models::PhotoStatus;
use pa_dash::feed::fetch_snapshot;
use pa_dash::gateway::{Gateway, GatewayError, HttpGateway};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const KEY: &str = "test-secret";

fn gateway_for(server: &MockServer) -> HttpGateway {
    HttpGateway::new(&GatewayConfig {
        base_url: server.uri(),
        api_key: KEY.to_string(),
        timeout_secs: 5,
        retry_delay_ms: 20,
        max_attempts: 2,
    })
    .expect("client builds")
}

fn ok(data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"ok": true, "data": data}))
}

// =============================================================================
// Envelope and key
// =============================================================================

#[tokio::test]
async fn test_data_page_sends_key_and_tab() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/data"))
        .and(query_param("key", KEY))
        .and(query_param("page", "1"))
        .and(query_param("page_size", "50"))
        .and(query_param("tab", "pending"))
        .respond_with(ok(json!({
            "pending": [{"filename": "a.jpg", "status": "pending"}],
            "reviewed": [],
            "reviewedTotal": 0,
            "reviewedHasMore": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let page = gateway
        .fetch_page(DataQuery::new(1, 50).with_tab(PhotoStatus::Pending))
        .await
        .unwrap();

    assert_eq!(page.pending.len(), 1);
    assert_eq!(page.pending[0].filename, "a.jpg");
    assert_eq!(page.pending[0].status, Some(PhotoStatus::Pending));
}

#[tokio::test]
async fn test_rejection_detail_surfaces_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/analytics"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"ok": false, "detail": "Invalid key"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = gateway_for(&server).analytics().await.unwrap_err();
    assert!(matches!(err, GatewayError::Rejected(ref d) if d == "Invalid key"));
    assert_eq!(err.to_string(), "Invalid key");
}

#[tokio::test]
async fn test_rejection_without_detail_uses_default_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/coaching"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": false})))
        .mount(&server)
        .await;

    let err = gateway_for(&server).coaching().await.unwrap_err();
    assert_eq!(err.to_string(), "server error");
}

#[tokio::test]
async fn test_detail_uses_file_param() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/detail"))
        .and(query_param("file", "x.jpg"))
        .and(query_param("key", KEY))
        .respond_with(ok(json!({"filename": "x.jpg", "score": 8.1, "critica": "Buena luz"})))
        .expect(1)
        .mount(&server)
        .await;

    let detail = gateway_for(&server).fetch_detail("x.jpg").await.unwrap();
    assert_eq!(detail.photo().unwrap().score, Some(8.1));
    assert_eq!(detail.get("critica").unwrap(), "Buena luz");
}

#[tokio::test]
async fn test_review_posts_filename() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/review"))
        .and(query_param("key", KEY))
        .and(body_json(json!({"filename": "x.jpg"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let result = gateway_for(&server).review("x.jpg").await.unwrap();
    assert!(result.is_null());
}

#[tokio::test]
async fn test_success_without_data_is_empty_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/analytics"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    let err = gateway_for(&server).analytics().await.unwrap_err();
    assert!(matches!(err, GatewayError::EmptyResponse("/api/analytics")));
}

// =============================================================================
// Retry
// =============================================================================

#[tokio::test]
async fn test_503_retried_once_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/analytics"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/analytics"))
        .respond_with(ok(json!({"total": 3, "avg_score": 6.0})))
        .expect(1)
        .mount(&server)
        .await;

    let report = gateway_for(&server).analytics().await.unwrap();
    assert_eq!(report.total, 3);
}

#[tokio::test]
async fn test_503_twice_surfaces_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/discard"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let err = gateway_for(&server)
        .discard(&["a.jpg".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Unavailable));
}

#[tokio::test]
async fn test_other_status_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/delete"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let err = gateway_for(&server)
        .delete(&["a.jpg".to_string()])
        .await
        .unwrap_err();
    match err {
        GatewayError::Http { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("unexpected {:?}", other),
    }
}

// =============================================================================
// Batches
// =============================================================================

#[tokio::test]
async fn test_partial_discard_decoding() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/discard"))
        .and(body_json(json!({"filenames": ["a.jpg", "b.jpg"]})))
        .respond_with(ok(json!({"discarded": 1, "errors": 1, "details": {"ok": ["a.jpg"]}})))
        .expect(1)
        .mount(&server)
        .await;

    let requested = vec!["a.jpg".to_string(), "b.jpg".to_string()];
    let outcome = gateway_for(&server).discard(&requested).await.unwrap();

    assert_eq!(outcome.processed, 1);
    assert!(outcome.is_partial());
    assert_eq!(outcome.failed(&requested), vec!["b.jpg"]);
}

#[tokio::test]
async fn test_delete_counter_decoding() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/delete"))
        .respond_with(ok(json!({"deleted": 2, "errors": 0, "details": {"ok": ["a.jpg", "b.jpg"]}})))
        .mount(&server)
        .await;

    let outcome = gateway_for(&server)
        .delete(&["a.jpg".to_string(), "b.jpg".to_string()])
        .await
        .unwrap();
    assert_eq!(outcome.processed, 2);
    assert!(!outcome.is_partial());
}

// =============================================================================
// Snapshots and uploads
// =============================================================================

#[tokio::test]
async fn test_snapshot_pages_reviewed_until_exhausted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/data"))
        .and(query_param("tab", "reviewed"))
        .and(query_param("page", "1"))
        .respond_with(ok(json!({
            "reviewed": [{"filename": "r1.jpg", "score": 7.0}],
            "reviewedTotal": 2,
            "reviewedHasMore": true
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/data"))
        .and(query_param("tab", "reviewed"))
        .and(query_param("page", "2"))
        .respond_with(ok(json!({
            "reviewed": [{"filename": "r2.jpg", "score": 5.0}],
            "reviewedTotal": 2,
            "reviewedHasMore": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let records = fetch_snapshot(&gateway, PhotoStatus::Reviewed, 1).await.unwrap();
    let names: Vec<_> = records.iter().map(|p| p.filename.as_str()).collect();
    assert_eq!(names, vec!["r1.jpg", "r2.jpg"]);
}

#[tokio::test]
async fn test_signed_upload_url_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload-url"))
        .and(body_json(json!({"filename": "a.ARW", "type": "raw"})))
        .respond_with(ok(json!({"url": "https://storage.example/a.ARW", "content_type": "application/octet-stream"})))
        .expect(1)
        .mount(&server)
        .await;

    let signed = gateway_for(&server)
        .signed_upload_url("a.ARW", UploadKind::Raw)
        .await
        .unwrap();
    assert_eq!(signed.url, "https://storage.example/a.ARW");
    assert_eq!(signed.content_type, "application/octet-stream");
}

#[tokio::test]
async fn test_requests_carry_key_and_user_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/analytics"))
        .and(header("user-agent", concat!("pa-dash/", env!("CARGO_PKG_VERSION"))))
        .and(query_param("key", KEY))
        .respond_with(ok(json!({"total": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let report = gateway_for(&server).analytics().await.unwrap();
    assert_eq!(report.total, 1);
}

#[tokio::test]
async fn test_polling_feed_emits_only_on_change() {
    use futures::StreamExt;
    use pa_common::config::FeedConfig;
    use pa_dash::feed::PollingFeed;
    use std::sync::Arc;
    use std::time::Duration;

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/data"))
        .and(query_param("tab", "pending"))
        .respond_with(ok(json!({"pending": [{"filename": "a.jpg"}]})))
        .mount(&server)
        .await;

    let feed = PollingFeed::new(
        Arc::new(gateway_for(&server)),
        &FeedConfig {
            poll_interval_ms: 20,
            first_snapshot_timeout_ms: 1_000,
            page_size: 50,
        },
    );
    let mut snapshots = Box::pin(feed.snapshots(PhotoStatus::Pending));

    let first = snapshots.next().await.unwrap();
    assert_eq!(first.len(), 1);

    let repeat = tokio::time::timeout(Duration::from_millis(200), snapshots.next()).await;
    assert!(repeat.is_err(), "unchanged data must not be re-emitted");
    assert!(server.received_requests().await.unwrap().len() >= 2);
}
