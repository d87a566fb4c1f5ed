//! Shared test helpers for pa-dash integration tests

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pa_common::api::{BatchDetails, BatchOutcome, DataQuery, GalleryPage, SignedUpload, UploadKind};
use pa_common::config::SyncConfig;
use pa_common::events::EventBus;
use pa_common::models::{AnalyticsReport, CoachingReport, Photo, PhotoDetail, PhotoStatus};
use pa_dash::feed::FeedUpdate;
use pa_dash::gateway::{Gateway, GatewayError, GatewayResult};
use pa_dash::Dashboard;

/// How the scripted gateway answers discard/delete
#[derive(Debug, Clone)]
pub enum BatchMode {
    /// Every requested filename processed
    AllOk,
    Fixed(BatchOutcome),
    /// The call itself fails
    NetworkError,
}

/// In-memory [`Gateway`] with scripted answers and a call log
pub struct ScriptedGateway {
    failing_reviews: Mutex<HashSet<String>>,
    batch_mode: Mutex<BatchMode>,
    analytics: Mutex<AnalyticsReport>,
    coaching: Mutex<Option<CoachingReport>>,
    /// How long review, discard and delete take to answer
    latency: Mutex<Duration>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self {
            failing_reviews: Mutex::new(HashSet::new()),
            batch_mode: Mutex::new(BatchMode::AllOk),
            analytics: Mutex::new(AnalyticsReport::default()),
            coaching: Mutex::new(None),
            latency: Mutex::new(Duration::ZERO),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_review(&self, filename: &str) {
        self.failing_reviews.lock().unwrap().insert(filename.to_string());
    }

    pub fn set_batch_mode(&self, mode: BatchMode) {
        *self.batch_mode.lock().unwrap() = mode;
    }

    pub fn set_analytics(&self, report: AnalyticsReport) {
        *self.analytics.lock().unwrap() = report;
    }

    pub fn set_coaching(&self, report: CoachingReport) {
        *self.coaching.lock().unwrap() = Some(report);
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    async fn respond_later(&self) {
        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }

    fn batch(&self, filenames: &[String]) -> GatewayResult<BatchOutcome> {
        match self.batch_mode.lock().unwrap().clone() {
            BatchMode::AllOk => Ok(BatchOutcome {
                processed: filenames.len() as u64,
                errors: 0,
                details: BatchDetails {
                    ok: filenames.to_vec(),
                },
            }),
            BatchMode::Fixed(outcome) => Ok(outcome),
            BatchMode::NetworkError => Err(GatewayError::Network("connection reset".into())),
        }
    }
}

#[async_trait]
impl Gateway for ScriptedGateway {
    async fn fetch_page(&self, query: DataQuery) -> GatewayResult<GalleryPage> {
        self.record(format!("data page={}", query.page));
        Ok(GalleryPage::default())
    }

    async fn fetch_detail(&self, filename: &str) -> GatewayResult<PhotoDetail> {
        self.record(format!("detail {}", filename));
        Err(GatewayError::Rejected("not found".into()))
    }

    async fn review(&self, filename: &str) -> GatewayResult<serde_json::Value> {
        self.record(format!("review {}", filename));
        self.respond_later().await;
        if self.failing_reviews.lock().unwrap().contains(filename) {
            return Err(GatewayError::Http {
                status: 500,
                body: "model error".into(),
            });
        }
        Ok(serde_json::json!({"score": 7.5}))
    }

    async fn discard(&self, filenames: &[String]) -> GatewayResult<BatchOutcome> {
        self.record(format!("discard {}", filenames.join(",")));
        self.respond_later().await;
        self.batch(filenames)
    }

    async fn delete(&self, filenames: &[String]) -> GatewayResult<BatchOutcome> {
        self.record(format!("delete {}", filenames.join(",")));
        self.respond_later().await;
        self.batch(filenames)
    }

    async fn analytics(&self) -> GatewayResult<AnalyticsReport> {
        self.record("analytics".to_string());
        Ok(self.analytics.lock().unwrap().clone())
    }

    async fn coaching(&self) -> GatewayResult<CoachingReport> {
        self.record("coaching".to_string());
        self.coaching
            .lock()
            .unwrap()
            .clone()
            .ok_or(GatewayError::Unavailable)
    }

    async fn signed_upload_url(
        &self,
        filename: &str,
        _kind: UploadKind,
    ) -> GatewayResult<SignedUpload> {
        self.record(format!("upload-url {}", filename));
        Err(GatewayError::Rejected("uploads disabled".into()))
    }

    async fn upload_complete(&self, filename: &str, _kind: UploadKind) -> GatewayResult<()> {
        self.record(format!("upload-complete {}", filename));
        Ok(())
    }
}

pub fn photos(names: &[&str], status: PhotoStatus) -> Vec<Photo> {
    names.iter().map(|n| Photo::new(*n, status)).collect()
}

/// Dashboard over a scripted gateway with the default timings
pub fn dashboard() -> (Dashboard, Arc<ScriptedGateway>) {
    let gateway = Arc::new(ScriptedGateway::new());
    let dashboard = Dashboard::new(gateway.clone(), EventBus::default(), SyncConfig::default());
    (dashboard, gateway)
}

/// Apply one snapshot per partition
pub async fn load(dashboard: &Dashboard, pending: &[&str], reviewed: &[&str]) {
    dashboard
        .on_snapshot(FeedUpdate {
            status: PhotoStatus::Pending,
            records: photos(pending, PhotoStatus::Pending),
        })
        .await;
    dashboard
        .on_snapshot(FeedUpdate {
            status: PhotoStatus::Reviewed,
            records: photos(reviewed, PhotoStatus::Reviewed),
        })
        .await;
}
