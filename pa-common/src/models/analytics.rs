//! Aggregate analytics report returned by `GET /api/analytics`

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Category;

/// Aggregate statistics over every reviewed photo
///
/// All fields default so a sparse payload (`{"total": 0}`) still decodes;
/// callers check [`AnalyticsReport::has_data`] before charting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub avg_score: f64,
    #[serde(default)]
    pub best_score: f64,
    #[serde(default)]
    pub worst_score: f64,
    #[serde(default)]
    pub median_score: f64,
    #[serde(default, rename = "bestOf_count")]
    pub best_of_count: u64,
    /// Percentage (0-100)
    #[serde(default, rename = "bestOf_rate")]
    pub best_of_rate: f64,
    /// Score range label ("0-3", "3-5", ... "9-10") to photo count
    #[serde(default)]
    pub distribution: BTreeMap<String, u64>,
    #[serde(default)]
    pub categories: Vec<CategoryBreakdown>,
    #[serde(default)]
    pub top5: Vec<RankedPhoto>,
    #[serde(default)]
    pub bottom5: Vec<RankedPhoto>,
    #[serde(default)]
    pub top_tags: Vec<TagCount>,
    #[serde(default)]
    pub timeline: Vec<TimelinePoint>,
}

impl AnalyticsReport {
    /// False when nothing has been reviewed yet
    pub fn has_data(&self) -> bool {
        self.total > 0
    }
}

/// Per-category aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub category: Category,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub avg: f64,
    #[serde(default, rename = "bestOf")]
    pub best_of: u64,
}

/// Entry of the top/bottom rankings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPhoto {
    pub filename: String,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagCount {
    pub tag: String,
    pub count: u64,
}

/// One photo on the score timeline with the running average at that point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelinePoint {
    pub filename: String,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub avg: f64,
}
