//! Gallery filtering, sorting and summary statistics

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use pa_common::models::{Category, Photo};

/// Sort order of the reviewed gallery
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Filename descending (upload names carry the timestamp)
    #[default]
    Newest,
    Oldest,
    /// Highest score first
    Best,
    Worst,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Newest => "newest",
            SortOrder::Oldest => "oldest",
            SortOrder::Best => "best",
            SortOrder::Worst => "worst",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "newest" => Ok(SortOrder::Newest),
            "oldest" => Ok(SortOrder::Oldest),
            "best" => Ok(SortOrder::Best),
            "worst" => Ok(SortOrder::Worst),
            other => Err(format!("unknown sort order: {}", other)),
        }
    }
}

/// Reviewed-gallery filter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewedQuery {
    /// Case-insensitive substring; empty matches everything
    pub search: String,
    /// `None` means all categories
    pub category: Option<Category>,
    pub sort: SortOrder,
}

impl ReviewedQuery {
    pub fn matches(&self, photo: &Photo) -> bool {
        if let Some(category) = self.category {
            if photo.category != Some(category) {
                return false;
            }
        }

        let needle = self.search.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }

        let category = photo.category.map(|c| c.as_str()).unwrap_or_default();
        [
            photo.filename.as_str(),
            photo.tags.as_deref().unwrap_or_default(),
            category,
            photo.summary.as_deref().unwrap_or_default(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// Ordering of two photos under `order`
pub fn compare(a: &Photo, b: &Photo, order: SortOrder) -> Ordering {
    match order {
        SortOrder::Newest => b.filename.cmp(&a.filename),
        SortOrder::Oldest => a.filename.cmp(&b.filename),
        SortOrder::Best => b.score_or_zero().total_cmp(&a.score_or_zero()),
        SortOrder::Worst => a.score_or_zero().total_cmp(&b.score_or_zero()),
    }
}

/// Filter then sort; works on photos or rendered rows
pub fn filter_reviewed<T: AsRef<Photo>>(items: Vec<T>, query: &ReviewedQuery) -> Vec<T> {
    let mut kept: Vec<T> = items
        .into_iter()
        .filter(|item| query.matches(item.as_ref()))
        .collect();
    kept.sort_by(|a, b| compare(a.as_ref(), b.as_ref(), query.sort));
    kept
}

/// Header statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GalleryStats {
    pub pending: usize,
    pub reviewed: usize,
    /// Mean reviewed score rounded to one decimal; `None` when nothing is reviewed
    pub average_score: Option<f64>,
    pub best_of: usize,
}

impl GalleryStats {
    pub fn compute(pending: &[Photo], reviewed: &[Photo]) -> Self {
        let average_score = if reviewed.is_empty() {
            None
        } else {
            let sum: f64 = reviewed.iter().map(Photo::score_or_zero).sum();
            Some((sum / reviewed.len() as f64 * 10.0).round() / 10.0)
        };

        Self {
            pending: pending.len(),
            reviewed: reviewed.len(),
            average_score,
            best_of: reviewed.iter().filter(|p| p.best_of).count(),
        }
    }

    /// Average as displayed, a dash when unknown
    pub fn average_label(&self) -> String {
        match self.average_score {
            Some(avg) => format!("{:.1}", avg),
            None => "—".to_string(),
        }
    }
}
