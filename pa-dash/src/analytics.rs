//! Analytics view model
//!
//! Turns the gateway's aggregate report into chart-ready series. Rendering is
//! left to the front end.

use pa_common::models::{AnalyticsReport, Category, RankedPhoto, TimelinePoint};

use crate::gateway::GatewayError;

/// State of the analytics tab
#[derive(Debug, Clone, PartialEq)]
pub enum AnalyticsView {
    /// Request in flight
    Loading,
    /// Request failed; message shown verbatim
    Failed(String),
    /// Nothing reviewed yet (`total == 0`)
    InsufficientData,
    Ready(Box<AnalyticsSummary>),
}

impl AnalyticsView {
    pub fn from_result(result: Result<AnalyticsReport, GatewayError>) -> Self {
        match result {
            Ok(report) if !report.has_data() => AnalyticsView::InsufficientData,
            Ok(report) => AnalyticsView::Ready(Box::new(AnalyticsSummary::from_report(report))),
            Err(e) => AnalyticsView::Failed(e.to_string()),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, AnalyticsView::Ready(_))
    }
}

/// Colour class of a score-distribution bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketTone {
    /// 8 and above
    Excellent,
    /// 7-8
    Good,
    /// 5-7
    Fair,
    /// 3-5
    Weak,
    Poor,
}

impl BucketTone {
    fn for_range(range: &str) -> Self {
        match range {
            "9-10" | "8-9" => BucketTone::Excellent,
            "7-8" => BucketTone::Good,
            "5-7" => BucketTone::Fair,
            "3-5" => BucketTone::Weak,
            _ => BucketTone::Poor,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BucketTone::Excellent => "excellent",
            BucketTone::Good => "good",
            BucketTone::Fair => "fair",
            BucketTone::Weak => "weak",
            BucketTone::Poor => "poor",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DistributionBar {
    pub range: String,
    pub count: u64,
    pub tone: BucketTone,
}

/// Category slice for the pie chart and the per-category average bars
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryShare {
    pub category: Category,
    pub count: u64,
    /// Share of all reviewed photos, 0-100
    pub percent: f64,
    pub avg: f64,
    pub best_of: u64,
}

/// Tag with its display weight (font scale 0.7-1.1)
#[derive(Debug, Clone, PartialEq)]
pub struct TagWeight {
    pub tag: String,
    pub count: u64,
    pub weight: f64,
}

/// Chart-ready analytics
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsSummary {
    pub total: u64,
    pub avg_score: f64,
    pub best_score: f64,
    pub worst_score: f64,
    pub median_score: f64,
    pub best_of_count: u64,
    pub best_of_rate: f64,
    pub distribution: Vec<DistributionBar>,
    pub categories: Vec<CategoryShare>,
    pub top: Vec<RankedPhoto>,
    pub bottom: Vec<RankedPhoto>,
    pub tags: Vec<TagWeight>,
    pub timeline: Vec<TimelinePoint>,
}

impl AnalyticsSummary {
    pub fn from_report(report: AnalyticsReport) -> Self {
        let mut distribution: Vec<DistributionBar> = report
            .distribution
            .iter()
            .map(|(range, count)| DistributionBar {
                range: range.clone(),
                count: *count,
                tone: BucketTone::for_range(range),
            })
            .collect();
        distribution.sort_by(|a, b| range_start(&a.range).total_cmp(&range_start(&b.range)));

        let total = report.total;
        let categories = report
            .categories
            .iter()
            .map(|c| CategoryShare {
                category: c.category,
                count: c.count,
                percent: if total == 0 {
                    0.0
                } else {
                    c.count as f64 * 100.0 / total as f64
                },
                avg: c.avg,
                best_of: c.best_of,
            })
            .collect();

        let tags = report
            .top_tags
            .iter()
            .map(|t| TagWeight {
                tag: t.tag.clone(),
                count: t.count,
                weight: tag_weight(t.count),
            })
            .collect();

        Self {
            total,
            avg_score: report.avg_score,
            best_score: report.best_score,
            worst_score: report.worst_score,
            median_score: report.median_score,
            best_of_count: report.best_of_count,
            best_of_rate: report.best_of_rate,
            distribution,
            categories,
            top: report.top5,
            bottom: report.bottom5,
            tags,
            timeline: report.timeline,
        }
    }
}

/// Lower bound of a "a-b" range label; unparseable labels sort last
fn range_start(range: &str) -> f64 {
    range
        .split('-')
        .next()
        .and_then(|s| s.trim().parse::<f64>().ok())
        .unwrap_or(f64::MAX)
}

fn tag_weight(count: u64) -> f64 {
    (0.6 + count as f64 * 0.08).clamp(0.7, 1.1)
}
