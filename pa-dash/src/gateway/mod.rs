//! Remote mutation/aggregation gateway
//!
//! The [`Gateway`] trait is the seam between the dashboard controller and the
//! HTTP service. [`HttpGateway`] is the production implementation; tests
//! either point it at a mock server or substitute their own implementation.

mod client;
mod error;
pub mod retry;

pub use client::HttpGateway;
pub use error::{GatewayError, GatewayResult};
pub use retry::{retry_transient, RetryPolicy};

use async_trait::async_trait;
use pa_common::api::{BatchOutcome, DataQuery, GalleryPage, SignedUpload, UploadKind};
use pa_common::models::{AnalyticsReport, CoachingReport, PhotoDetail};

/// Commands and reports offered by the gateway
#[async_trait]
pub trait Gateway: Send + Sync {
    /// `GET /api/data`: one page of the gallery
    async fn fetch_page(&self, query: DataQuery) -> GatewayResult<GalleryPage>;

    /// `GET /api/detail`: full review document for one photo
    async fn fetch_detail(&self, filename: &str) -> GatewayResult<PhotoDetail>;

    /// `POST /api/review`: run one synchronous analysis
    async fn review(&self, filename: &str) -> GatewayResult<serde_json::Value>;

    /// `POST /api/discard`
    async fn discard(&self, filenames: &[String]) -> GatewayResult<BatchOutcome>;

    /// `POST /api/delete`
    async fn delete(&self, filenames: &[String]) -> GatewayResult<BatchOutcome>;

    /// `GET /api/analytics`
    async fn analytics(&self) -> GatewayResult<AnalyticsReport>;

    /// `GET /api/coaching`
    async fn coaching(&self) -> GatewayResult<CoachingReport>;

    /// `POST /api/upload-url`: pre-signed write URL for a direct upload
    async fn signed_upload_url(
        &self,
        filename: &str,
        kind: UploadKind,
    ) -> GatewayResult<SignedUpload>;

    /// `POST /api/upload-complete`: hand the stored file to the pipeline
    async fn upload_complete(&self, filename: &str, kind: UploadKind) -> GatewayResult<()>;
}
