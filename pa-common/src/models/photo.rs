//! Photo record and its enumerations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Gallery partition a photo belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhotoStatus {
    /// Uploaded, not yet scored by the AI service
    Pending,
    /// Scored and tagged
    Reviewed,
}

impl PhotoStatus {
    /// Both partitions, in tab order
    pub const ALL: [PhotoStatus; 2] = [PhotoStatus::Pending, PhotoStatus::Reviewed];

    pub fn as_str(&self) -> &'static str {
        match self {
            PhotoStatus::Pending => "pending",
            PhotoStatus::Reviewed => "reviewed",
        }
    }
}

impl fmt::Display for PhotoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PhotoStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(PhotoStatus::Pending),
            "reviewed" => Ok(PhotoStatus::Reviewed),
            other => Err(crate::Error::InvalidInput(format!(
                "unknown photo status '{}' (expected pending or reviewed)",
                other
            ))),
        }
    }
}

/// Fixed category label set assigned by the AI service
///
/// Wire labels are the service's Spanish names. Unknown labels collapse into
/// [`Category::Other`] so a new server-side label never breaks decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Landscapes,
    Pets,
    Architecture,
    People,
    Food,
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Landscapes,
        Category::Pets,
        Category::Architecture,
        Category::People,
        Category::Food,
        Category::Other,
    ];

    /// Wire label
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Landscapes => "paisajes",
            Category::Pets => "mascotas",
            Category::Architecture => "arquitectura",
            Category::People => "personas",
            Category::Food => "comida",
            Category::Other => "otras",
        }
    }

    /// Parse a wire label (case-insensitive); unknown labels become `Other`
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "paisajes" => Category::Landscapes,
            "mascotas" => Category::Pets,
            "arquitectura" => Category::Architecture,
            "personas" => Category::People,
            "comida" => Category::Food,
            _ => Category::Other,
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Category::Landscapes => "🏔️",
            Category::Pets => "🐾",
            Category::Architecture => "🏛️",
            Category::People => "👤",
            Category::Food => "🍽️",
            Category::Other => "📁",
        }
    }
}

impl From<String> for Category {
    fn from(label: String) -> Self {
        Category::from_label(&label)
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.as_str().to_string()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a photo is in the removing overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemovalKind {
    /// Pending photo moved to the discarded area
    Discard,
    /// Reviewed photo and its files deleted
    Delete,
    /// Pending photo analyzed; it leaves the pending list for the reviewed one
    Analyzed,
}

impl RemovalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemovalKind::Discard => "discard",
            RemovalKind::Delete => "delete",
            RemovalKind::Analyzed => "analyzed",
        }
    }
}

impl fmt::Display for RemovalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display band for a score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    High,
    Mid,
    Low,
}

impl ScoreBand {
    /// `High` from 7, `Mid` from 5, `Low` below
    pub fn from_score(score: f64) -> Self {
        if score >= 7.0 {
            ScoreBand::High
        } else if score >= 5.0 {
            ScoreBand::Mid
        } else {
            ScoreBand::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreBand::High => "high",
            ScoreBand::Mid => "mid",
            ScoreBand::Low => "low",
        }
    }
}

/// A photo record as delivered by the live feed
///
/// `filename` is the stable key across the pending and reviewed partitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    /// Unique file name (document id)
    pub filename: String,

    /// Partition; absent once the photo has been deleted upstream
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PhotoStatus>,

    /// AI score, 0-10 (reviewed photos only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,

    /// Comma-delimited free-text tags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,

    /// One-paragraph critique
    #[serde(default, rename = "resumen", skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default)]
    pub best_of: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<DateTime<Utc>>,

    /// Human-readable upload date as formatted by the service
    #[serde(default, rename = "fecha", skip_serializing_if = "Option::is_none")]
    pub display_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumb_url: Option<String>,

    /// Reference to the long-form review document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_id: Option<String>,
}

impl Photo {
    /// Minimal record, used by tests and demo data
    pub fn new(filename: impl Into<String>, status: PhotoStatus) -> Self {
        Self {
            filename: filename.into(),
            status: Some(status),
            score: None,
            category: None,
            tags: None,
            summary: None,
            best_of: false,
            uploaded_at: None,
            display_date: None,
            original_url: None,
            raw_url: None,
            thumb_url: None,
            review_id: None,
        }
    }

    /// Split the tag string on commas, trimmed, empties dropped
    pub fn tag_list(&self) -> Vec<&str> {
        self.tags
            .as_deref()
            .map(|tags| {
                tags.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Thumbnail, falling back to the original
    pub fn thumbnail_url(&self) -> Option<&str> {
        self.thumb_url.as_deref().or(self.original_url.as_deref())
    }

    /// High-resolution image for the lightbox, falling back to the thumbnail
    pub fn high_res_url(&self) -> Option<&str> {
        self.original_url.as_deref().or(self.thumb_url.as_deref())
    }

    pub fn raw_download_url(&self) -> Option<&str> {
        self.raw_url.as_deref().filter(|u| !u.is_empty())
    }

    /// Score treated as 0 when absent
    pub fn score_or_zero(&self) -> f64 {
        self.score.unwrap_or(0.0)
    }

    pub fn score_band(&self) -> ScoreBand {
        ScoreBand::from_score(self.score_or_zero())
    }
}

impl AsRef<Photo> for Photo {
    fn as_ref(&self) -> &Photo {
        self
    }
}

/// Full detail report for the lightbox
///
/// The service returns the stored document verbatim; only the photo fields
/// are typed, everything else is kept as raw JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhotoDetail {
    #[serde(flatten)]
    pub fields: serde_json::Map<String, Value>,
}

impl PhotoDetail {
    /// Typed view of the photo fields, if the document carries a filename
    pub fn photo(&self) -> Option<Photo> {
        serde_json::from_value(Value::Object(self.fields.clone())).ok()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}
