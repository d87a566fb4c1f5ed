//! Direct-upload flow tests against a mock gateway and storage endpoint

use pa_common::config::GatewayConfig;
use pa_common::events::{DashboardEvent, EventBus};
use pa_dash::gateway::HttpGateway;
use pa_dash::upload::{UploadQueue, UploadStatus, Uploader};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn gateway_for(server: &MockServer) -> HttpGateway {
    HttpGateway::new(&GatewayConfig {
        base_url: server.uri(),
        api_key: "k".to_string(),
        timeout_secs: 5,
        retry_delay_ms: 10,
        max_attempts: 2,
    })
    .expect("client builds")
}

fn write_file(dir: &TempDir, name: &str, len: usize) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, vec![7u8; len]).unwrap();
    path
}

async fn mount_signed_url(server: &MockServer, filename: &str, kind: &str) {
    Mock::given(method("POST"))
        .and(path("/api/upload-url"))
        .and(body_json(json!({"filename": filename, "type": kind})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "data": {
                "url": format!("{}/storage/{}", server.uri(), filename),
                "content_type": "image/jpeg"
            }
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_upload_puts_file_and_confirms() {
    let server = MockServer::start().await;
    mount_signed_url(&server, "a.jpg", "jpeg").await;
    Mock::given(method("PUT"))
        .and(path("/storage/a.jpg"))
        .and(header("content-type", "image/jpeg"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/upload-complete"))
        .and(body_json(json!({"filename": "a.jpg", "type": "jpeg"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut queue = UploadQueue::new();
    let report = queue.add_paths([write_file(&dir, "a.jpg", 300 * 1024)]);
    assert_eq!(report.added, 1);

    let gateway = gateway_for(&server);
    let bus = EventBus::default();
    let uploader = Uploader::new(&gateway, gateway.http_client().clone(), bus);
    let summary = uploader.upload_all(&mut queue).await;

    assert_eq!(summary.ok, 1);
    assert_eq!(summary.errors, 0);
    assert_eq!(queue.entries()[0].status, UploadStatus::Done);
    assert_eq!(queue.entries()[0].progress, 100);
    assert_eq!(summary.message().unwrap(), "📤 1 file(s) uploaded");
}

#[tokio::test]
async fn test_rejected_put_marks_entry_failed() {
    let server = MockServer::start().await;
    mount_signed_url(&server, "b.jpg", "jpeg").await;
    Mock::given(method("PUT"))
        .and(path("/storage/b.jpg"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/upload-complete"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut queue = UploadQueue::new();
    queue.add_paths([write_file(&dir, "b.jpg", 10)]);

    let gateway = gateway_for(&server);
    let uploader = Uploader::new(&gateway, gateway.http_client().clone(), EventBus::default());
    let summary = uploader.upload_all(&mut queue).await;

    assert_eq!(summary.ok, 0);
    assert_eq!(summary.errors, 1);
    assert_eq!(queue.entries()[0].status, UploadStatus::Error);
    assert_eq!(queue.entries()[0].progress, 0);
    assert_eq!(summary.message().unwrap(), "⚠️ 1 upload error(s)");
}

#[tokio::test]
async fn test_done_entries_skipped_on_rerun() {
    let server = MockServer::start().await;
    mount_signed_url(&server, "c.jpg", "jpeg").await;
    Mock::given(method("PUT"))
        .and(path("/storage/c.jpg"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/upload-complete"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut queue = UploadQueue::new();
    queue.add_paths([write_file(&dir, "c.jpg", 10)]);

    let gateway = gateway_for(&server);
    let uploader = Uploader::new(&gateway, gateway.http_client().clone(), EventBus::default());
    assert_eq!(uploader.upload_all(&mut queue).await.ok, 1);

    let second = uploader.upload_all(&mut queue).await;
    assert_eq!(second.ok, 0);
    assert!(second.message().is_none());
}

#[tokio::test]
async fn test_progress_moves_through_transfer_band() {
    let server = MockServer::start().await;
    mount_signed_url(&server, "big.jpg", "jpeg").await;
    Mock::given(method("PUT"))
        .and(path("/storage/big.jpg"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/upload-complete"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut queue = UploadQueue::new();
    queue.add_paths([write_file(&dir, "big.jpg", 1024 * 1024)]);

    let gateway = gateway_for(&server);
    let bus = EventBus::default();
    let mut events = bus.subscribe();
    let uploader = Uploader::new(&gateway, gateway.http_client().clone(), bus);
    uploader.upload_all(&mut queue).await;

    let mut progress = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let DashboardEvent::UploadProgress { progress: p, .. } = event {
            progress.push(p);
        }
    }

    assert_eq!(progress.first(), Some(&0));
    assert_eq!(progress.last(), Some(&100));
    assert!(progress.windows(2).all(|w| w[0] <= w[1]), "{:?}", progress);
    assert!(progress.iter().any(|p| (11..90).contains(p)));
    let ninety = progress.iter().position(|p| *p == 90).unwrap();
    assert_eq!(progress[ninety + 1], 95);
}
