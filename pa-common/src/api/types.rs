//! Gateway request/response types

use serde::{Deserialize, Serialize};
use std::fmt;

use super::DEFAULT_REJECTION;
use crate::models::{Photo, PhotoStatus};

// ========================================
// Envelope
// ========================================

/// Response envelope shared by every endpoint: `{ ok, data?, detail? }`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiEnvelope<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl<T> ApiEnvelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            detail: None,
        }
    }

    pub fn rejected(detail: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            detail: Some(detail.into()),
        }
    }

    /// Split into the payload or the rejection message
    ///
    /// `ok: false` yields the `detail` text, or [`DEFAULT_REJECTION`] when the
    /// gateway did not send one. A successful envelope may carry no data.
    pub fn into_result(self) -> Result<Option<T>, String> {
        if self.ok {
            Ok(self.data)
        } else {
            Err(self
                .detail
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_REJECTION.to_string()))
        }
    }
}

// ========================================
// Gallery data
// ========================================

/// Query for `GET /api/data`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataQuery {
    /// 1-indexed page
    pub page: u32,
    pub page_size: u32,
    /// Restrict the response to one partition
    pub tab: Option<PhotoStatus>,
}

impl DataQuery {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
            tab: None,
        }
    }

    pub fn with_tab(mut self, tab: PhotoStatus) -> Self {
        self.tab = Some(tab);
        self
    }

    /// Query pairs in the order the gateway documents them
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("page_size", self.page_size.to_string()),
        ];
        if let Some(tab) = self.tab {
            pairs.push(("tab", tab.as_str().to_string()));
        }
        pairs
    }
}

/// Payload of `GET /api/data`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryPage {
    #[serde(default)]
    pub pending: Vec<Photo>,
    #[serde(default)]
    pub reviewed: Vec<Photo>,
    #[serde(default)]
    pub reviewed_total: u64,
    #[serde(default)]
    pub reviewed_has_more: bool,
}

impl GalleryPage {
    pub fn records(&self, status: PhotoStatus) -> &[Photo] {
        match status {
            PhotoStatus::Pending => &self.pending,
            PhotoStatus::Reviewed => &self.reviewed,
        }
    }
}

// ========================================
// Mutations
// ========================================

/// Body of `POST /api/review`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReviewRequest {
    pub filename: String,
}

/// Body of `POST /api/discard` and `POST /api/delete`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BatchRequest {
    pub filenames: Vec<String>,
}

/// Per-item breakdown of a batch mutation
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct BatchDetails {
    /// Filenames the gateway processed successfully
    #[serde(default)]
    pub ok: Vec<String>,
}

/// Outcome of a batch discard/delete
///
/// The gateway names the success counter after the operation (`discarded`
/// or `deleted`); both decode into `processed`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct BatchOutcome {
    #[serde(default, alias = "discarded", alias = "deleted")]
    pub processed: u64,
    #[serde(default)]
    pub errors: u64,
    #[serde(default)]
    pub details: BatchDetails,
}

impl BatchOutcome {
    pub fn is_partial(&self) -> bool {
        self.errors > 0
    }

    /// Requested filenames not reported as processed
    pub fn failed<'a>(&self, requested: &'a [String]) -> Vec<&'a str> {
        requested
            .iter()
            .filter(|f| !self.details.ok.contains(f))
            .map(String::as_str)
            .collect()
    }
}

// ========================================
// Upload
// ========================================

/// File classification accepted by the upload flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadKind {
    Jpeg,
    Raw,
}

impl UploadKind {
    /// Classify by extension: JPG/JPEG or ARW, case-insensitive
    pub fn from_filename(name: &str) -> Option<Self> {
        let ext = name.rsplit_once('.')?.1.to_ascii_uppercase();
        match ext.as_str() {
            "JPG" | "JPEG" => Some(UploadKind::Jpeg),
            "ARW" => Some(UploadKind::Raw),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UploadKind::Jpeg => "jpeg",
            UploadKind::Raw => "raw",
        }
    }
}

impl fmt::Display for UploadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `POST /api/upload-url` and `POST /api/upload-complete`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadRequest {
    pub filename: String,
    #[serde(rename = "type")]
    pub kind: UploadKind,
}

/// Pre-signed write URL for a direct upload
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SignedUpload {
    pub url: String,
    pub content_type: String,
}

// ========================================
// Tests
// ========================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_envelope_uses_detail() {
        let env: ApiEnvelope<GalleryPage> =
            serde_json::from_str(r#"{"ok": false, "detail": "invalid key"}"#).unwrap();
        assert_eq!(env.into_result().unwrap_err(), "invalid key");
    }

    #[test]
    fn test_rejected_envelope_without_detail() {
        let env: ApiEnvelope<GalleryPage> = serde_json::from_str(r#"{"ok": false}"#).unwrap();
        assert_eq!(env.into_result().unwrap_err(), DEFAULT_REJECTION);
    }

    #[test]
    fn test_gallery_page_camel_case() {
        let json = r#"{"ok": true, "data": {
            "pending": [{"filename": "p.jpg", "status": "pending"}],
            "reviewed": [],
            "reviewedTotal": 42,
            "reviewedHasMore": true
        }}"#;
        let env: ApiEnvelope<GalleryPage> = serde_json::from_str(json).unwrap();
        let page = env.into_result().unwrap().unwrap();
        assert_eq!(page.records(PhotoStatus::Pending).len(), 1);
        assert_eq!(page.reviewed_total, 42);
        assert!(page.reviewed_has_more);
    }

    #[test]
    fn test_batch_outcome_aliases() {
        let discard: BatchOutcome = serde_json::from_str(
            r#"{"discarded": 1, "errors": 1, "details": {"ok": ["a.jpg"]}}"#,
        )
        .unwrap();
        assert_eq!(discard.processed, 1);
        assert!(discard.is_partial());

        let requested = vec!["a.jpg".to_string(), "b.jpg".to_string()];
        assert_eq!(discard.failed(&requested), vec!["b.jpg"]);

        let delete: BatchOutcome = serde_json::from_str(r#"{"deleted": 3, "errors": 0}"#).unwrap();
        assert_eq!(delete.processed, 3);
        assert!(!delete.is_partial());
    }

    #[test]
    fn test_upload_kind_classification() {
        assert_eq!(UploadKind::from_filename("DSC001.JPG"), Some(UploadKind::Jpeg));
        assert_eq!(UploadKind::from_filename("dsc001.jpeg"), Some(UploadKind::Jpeg));
        assert_eq!(UploadKind::from_filename("DSC001.arw"), Some(UploadKind::Raw));
        assert_eq!(UploadKind::from_filename("notes.txt"), None);
        assert_eq!(UploadKind::from_filename("no_extension"), None);
    }

    #[test]
    fn test_upload_request_type_field() {
        let body = UploadRequest {
            filename: "a.ARW".to_string(),
            kind: UploadKind::Raw,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["type"], "raw");
    }

    #[test]
    fn test_data_query_pairs() {
        let q = DataQuery::new(0, 50).with_tab(PhotoStatus::Reviewed);
        assert_eq!(
            q.to_pairs(),
            vec![
                ("page", "1".to_string()),
                ("page_size", "50".to_string()),
                ("tab", "reviewed".to_string())
            ]
        );
    }
}
