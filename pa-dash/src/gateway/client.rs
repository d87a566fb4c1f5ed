//! HTTP gateway client

use async_trait::async_trait;
use pa_common::api::{
    ApiEnvelope, BatchOutcome, BatchRequest, DataQuery, GalleryPage, ReviewRequest, SignedUpload,
    UploadKind, UploadRequest, KEY_PARAM,
};
use pa_common::config::GatewayConfig;
use pa_common::models::{AnalyticsReport, CoachingReport, PhotoDetail};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::retry::{retry_transient, RetryPolicy};
use super::{Gateway, GatewayError, GatewayResult};

const USER_AGENT: &str = concat!("pa-dash/", env!("CARGO_PKG_VERSION"));

/// reqwest-backed [`Gateway`]
///
/// Every request carries the shared secret as the `key` query parameter and
/// decodes the `{ ok, data?, detail? }` envelope. HTTP 503 is retried per the
/// configured [`RetryPolicy`].
#[derive(Clone)]
pub struct HttpGateway {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    retry: RetryPolicy,
}

impl HttpGateway {
    pub fn new(config: &GatewayConfig) -> GatewayResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout())
            .build()
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            retry: RetryPolicy::new(config.max_attempts, config.retry_delay()),
        })
    }

    /// Override the retry policy (tests shorten the delay)
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Underlying client, shared with the direct-upload transport
    pub fn http_client(&self) -> &reqwest::Client {
        &self.http_client
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn keyed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.query(&[(KEY_PARAM, self.api_key.as_str())])
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &'static str,
        params: &[(&'static str, String)],
    ) -> GatewayResult<Option<T>> {
        retry_transient(path, self.retry, || async move {
            tracing::debug!(path, "Gateway GET");
            let response = self
                .keyed(self.http_client.get(self.endpoint(path)))
                .query(params)
                .send()
                .await?;
            decode(path, response).await
        })
        .await
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &'static str,
        body: &B,
    ) -> GatewayResult<Option<T>> {
        retry_transient(path, self.retry, || async move {
            tracing::debug!(path, "Gateway POST");
            let response = self
                .keyed(self.http_client.post(self.endpoint(path)))
                .json(body)
                .send()
                .await?;
            decode(path, response).await
        })
        .await
    }
}

/// Map status and envelope onto [`GatewayResult`]
async fn decode<T: DeserializeOwned>(
    path: &'static str,
    response: Response,
) -> GatewayResult<Option<T>> {
    let status = response.status();

    if status == StatusCode::SERVICE_UNAVAILABLE {
        return Err(GatewayError::Unavailable);
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(path, status = status.as_u16(), "Gateway returned error status");
        return Err(GatewayError::Http {
            status: status.as_u16(),
            body,
        });
    }

    let envelope: ApiEnvelope<T> = response
        .json()
        .await
        .map_err(|e| GatewayError::Parse(e.to_string()))?;

    envelope.into_result().map_err(|detail| {
        tracing::warn!(path, detail = %detail, "Gateway rejected request");
        GatewayError::Rejected(detail)
    })
}

fn required<T>(path: &'static str, data: Option<T>) -> GatewayResult<T> {
    data.ok_or(GatewayError::EmptyResponse(path))
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn fetch_page(&self, query: DataQuery) -> GatewayResult<GalleryPage> {
        let data = self.get("/api/data", &query.to_pairs()).await?;
        required("/api/data", data)
    }

    async fn fetch_detail(&self, filename: &str) -> GatewayResult<PhotoDetail> {
        let data = self
            .get("/api/detail", &[("file", filename.to_string())])
            .await?;
        required("/api/detail", data)
    }

    async fn review(&self, filename: &str) -> GatewayResult<serde_json::Value> {
        let body = ReviewRequest {
            filename: filename.to_string(),
        };
        let data: Option<serde_json::Value> = self.post("/api/review", &body).await?;
        tracing::info!(filename = %filename, "Analysis completed");
        Ok(data.unwrap_or(serde_json::Value::Null))
    }

    async fn discard(&self, filenames: &[String]) -> GatewayResult<BatchOutcome> {
        let body = BatchRequest {
            filenames: filenames.to_vec(),
        };
        let outcome: BatchOutcome =
            required("/api/discard", self.post("/api/discard", &body).await?)?;
        tracing::info!(
            requested = filenames.len(),
            discarded = outcome.processed,
            errors = outcome.errors,
            "Discard batch completed"
        );
        Ok(outcome)
    }

    async fn delete(&self, filenames: &[String]) -> GatewayResult<BatchOutcome> {
        let body = BatchRequest {
            filenames: filenames.to_vec(),
        };
        let outcome: BatchOutcome =
            required("/api/delete", self.post("/api/delete", &body).await?)?;
        tracing::info!(
            requested = filenames.len(),
            deleted = outcome.processed,
            errors = outcome.errors,
            "Delete batch completed"
        );
        Ok(outcome)
    }

    async fn analytics(&self) -> GatewayResult<AnalyticsReport> {
        let data = self.get("/api/analytics", &[]).await?;
        required("/api/analytics", data)
    }

    async fn coaching(&self) -> GatewayResult<CoachingReport> {
        let data = self.get("/api/coaching", &[]).await?;
        required("/api/coaching", data)
    }

    async fn signed_upload_url(
        &self,
        filename: &str,
        kind: UploadKind,
    ) -> GatewayResult<SignedUpload> {
        let body = UploadRequest {
            filename: filename.to_string(),
            kind,
        };
        let data = self.post("/api/upload-url", &body).await?;
        required("/api/upload-url", data)
    }

    async fn upload_complete(&self, filename: &str, kind: UploadKind) -> GatewayResult<()> {
        let body = UploadRequest {
            filename: filename.to_string(),
            kind,
        };
        let _: Option<serde_json::Value> = self.post("/api/upload-complete", &body).await?;
        Ok(())
    }
}
