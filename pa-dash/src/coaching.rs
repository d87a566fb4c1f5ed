//! Coaching view model

use pa_common::models::CoachingReport;

/// State of the coaching tab
#[derive(Debug, Clone, PartialEq)]
pub enum CoachingView {
    /// Never generated; the user has to request it
    NotLoaded,
    Failed(String),
    Ready {
        report: Box<CoachingReport>,
        /// Served from the local cache rather than a fresh request
        cached: bool,
    },
}

impl CoachingView {
    pub fn report(&self) -> Option<&CoachingReport> {
        match self {
            CoachingView::Ready { report, .. } => Some(report),
            _ => None,
        }
    }
}

/// Example file names of a coaching item, split on commas
pub fn example_photos(list: Option<&str>) -> Vec<&str> {
    list.map(|l| {
        l.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_photos_split() {
        assert_eq!(
            example_photos(Some("a.jpg, b.jpg,,")),
            vec!["a.jpg", "b.jpg"]
        );
        assert!(example_photos(None).is_empty());
    }

    #[test]
    fn test_report_accessor() {
        let view = CoachingView::Ready {
            report: Box::default(),
            cached: true,
        };
        assert!(view.report().is_some());
        assert!(CoachingView::NotLoaded.report().is_none());
    }
}
