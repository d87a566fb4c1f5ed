//! Plain-text rendering for the command-line front end

use std::fmt::Write;

use pa_common::events::{DashboardEvent, NoticeLevel};
use pa_common::models::PhotoDetail;

use crate::analytics::AnalyticsView;
use crate::coaching::{example_photos, CoachingView};
use crate::filters::GalleryStats;
use crate::sync::PhotoRow;

/// One line per row: markers, score, category, name, tags
pub fn render_rows(rows: &[PhotoRow]) -> String {
    if rows.is_empty() {
        return "(no photos)\n".to_string();
    }

    let mut out = String::new();
    for row in rows {
        let marker = if row.processing {
            "⏳"
        } else if let Some(kind) = row.removing {
            match kind {
                pa_common::RemovalKind::Analyzed => "✔",
                _ => "✖",
            }
        } else if row.selected {
            "☑"
        } else {
            "☐"
        };

        let photo = &row.photo;
        let score = photo
            .score
            .map(|s| format!("{:>4.1}", s))
            .unwrap_or_else(|| "   -".to_string());
        let category = photo
            .category
            .map(|c| format!("{} {}", c.icon(), c))
            .unwrap_or_default();
        let best = if photo.best_of { " ⭐" } else { "" };

        let _ = write!(out, "{} {} {}{}", marker, score, photo.filename, best);
        if !category.is_empty() {
            let _ = write!(out, "  [{}]", category);
        }
        let tags = photo.tag_list();
        if !tags.is_empty() {
            let _ = write!(out, "  #{}", tags.join(" #"));
        }
        out.push('\n');
    }
    out
}

pub fn render_stats(stats: &GalleryStats) -> String {
    format!(
        "pending: {}  reviewed: {}  average: {}  best-of: {}\n",
        stats.pending,
        stats.reviewed,
        stats.average_label(),
        stats.best_of
    )
}

pub fn render_analytics(view: &AnalyticsView) -> String {
    let summary = match view {
        AnalyticsView::Loading => return "Loading analytics...\n".to_string(),
        AnalyticsView::Failed(msg) => return format!("Analytics unavailable: {}\n", msg),
        AnalyticsView::InsufficientData => {
            return "📊 Not enough data yet: analyze some photos first\n".to_string()
        }
        AnalyticsView::Ready(summary) => summary,
    };

    let mut out = String::new();
    let _ = writeln!(
        out,
        "total: {}  avg: {:.1}  median: {:.1}  best: {:.1}  worst: {:.1}  best-of: {} ({:.0}%)",
        summary.total,
        summary.avg_score,
        summary.median_score,
        summary.best_score,
        summary.worst_score,
        summary.best_of_count,
        summary.best_of_rate
    );

    let _ = writeln!(out, "\nScore distribution");
    let max = summary.distribution.iter().map(|d| d.count).max().unwrap_or(0).max(1);
    for bar in &summary.distribution {
        let width = (bar.count * 30 / max) as usize;
        let _ = writeln!(
            out,
            "  {:>5} {:<30} {} ({})",
            bar.range,
            "█".repeat(width),
            bar.count,
            bar.tone.as_str()
        );
    }

    if !summary.categories.is_empty() {
        let _ = writeln!(out, "\nCategories");
        for c in &summary.categories {
            let _ = writeln!(
                out,
                "  {} {:<13} {:>4} ({:>4.1}%)  avg {:.1}  best-of {}",
                c.category.icon(),
                c.category.as_str(),
                c.count,
                c.percent,
                c.avg,
                c.best_of
            );
        }
    }

    if !summary.top.is_empty() {
        let _ = writeln!(out, "\nTop");
        for (i, p) in summary.top.iter().enumerate() {
            let _ = writeln!(out, "  #{} {:.1} {}", i + 1, p.score, p.filename);
        }
    }
    if !summary.bottom.is_empty() {
        let _ = writeln!(out, "\nBottom");
        let total = summary.total as usize;
        for (i, p) in summary.bottom.iter().enumerate() {
            let _ = writeln!(out, "  #{} {:.1} {}", total.saturating_sub(i), p.score, p.filename);
        }
    }

    if !summary.tags.is_empty() {
        let tags: Vec<String> = summary
            .tags
            .iter()
            .map(|t| format!("{} ({})", t.tag, t.count))
            .collect();
        let _ = writeln!(out, "\nTags: {}", tags.join(", "));
    }

    out
}

pub fn render_coaching(view: &CoachingView) -> String {
    let (report, cached) = match view {
        CoachingView::NotLoaded => {
            return "No coaching report yet; run `pa-dash coaching --refresh`\n".to_string()
        }
        CoachingView::Failed(msg) => return format!("Coaching failed: {}\n", msg),
        CoachingView::Ready { report, cached } => (report, *cached),
    };

    let mut out = String::new();
    if cached {
        let _ = writeln!(out, "(cached report)");
    }
    if let Some(level) = &report.level_summary {
        let _ = writeln!(out, "{}\n", level);
    }

    for (title, items) in [("Strengths", &report.strengths), ("Weaknesses", &report.weaknesses)] {
        if items.is_empty() {
            continue;
        }
        let _ = writeln!(out, "{}", title);
        for item in items {
            let _ = writeln!(out, "  • {}: {}", item.title, item.detail);
            let examples = example_photos(item.example_photos.as_deref());
            if !examples.is_empty() {
                let _ = writeln!(out, "    e.g. {}", examples.join(", "));
            }
        }
    }

    if let Some(pattern) = &report.error_pattern {
        let _ = writeln!(out, "\nRecurring mistakes: {}", pattern);
    }
    if let Some(mission) = &report.weekly_mission {
        let _ = writeln!(out, "\nWeekly mission: {}\n  {}", mission.title, mission.description);
        if let Some(exercise) = &mission.exercise {
            let _ = writeln!(out, "  Exercise: {}", exercise);
        }
        if let Some(settings) = &mission.suggested_settings {
            let _ = writeln!(out, "  Settings: {}", settings);
        }
    }
    if let Some(spot) = &report.sweet_spot {
        let _ = writeln!(out, "\nSweet spot: {}", spot);
    }
    if let Some(goal) = &report.next_goal {
        let _ = writeln!(out, "Next goal: {}", goal);
    }
    out
}

pub fn render_detail(detail: &PhotoDetail) -> String {
    serde_json::to_string_pretty(&detail.fields).unwrap_or_default()
}

/// Console line for an event; `None` for events not worth printing
pub fn render_event(event: &DashboardEvent) -> Option<String> {
    match event {
        DashboardEvent::NoticeRaised { notice } => {
            let prefix = match notice.level {
                NoticeLevel::Info => "info",
                NoticeLevel::Warning => "warn",
                NoticeLevel::Error => "error",
            };
            Some(format!("[{}] {}", prefix, notice.message))
        }
        DashboardEvent::SnapshotApplied {
            status,
            count,
            confirmed,
            ..
        } if !confirmed.is_empty() => Some(format!(
            "{}: {} photo(s), confirmed {}",
            status,
            count,
            confirmed.join(", ")
        )),
        DashboardEvent::SnapshotApplied { status, count, .. } => {
            Some(format!("{}: {} photo(s)", status, count))
        }
        DashboardEvent::OverlaySwept { filenames, .. } => {
            Some(format!("cleared unconfirmed: {}", filenames.join(", ")))
        }
        DashboardEvent::UploadProgress {
            filename, progress, ..
        } => Some(format!("{} {}%", filename, progress)),
        _ => None,
    }
}
