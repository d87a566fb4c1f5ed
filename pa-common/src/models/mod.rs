//! Domain models shared by the dashboard crates
//!
//! All models deserialize from the gateway/feed wire format, which keeps the
//! original camelCase and Spanish field names. Rust-side names are English;
//! `#[serde(rename)]` bridges the two.

mod analytics;
mod coaching;
mod photo;

pub use analytics::{AnalyticsReport, CategoryBreakdown, RankedPhoto, TagCount, TimelinePoint};
pub use coaching::{CoachingItem, CoachingReport, WeeklyMission};
pub use photo::{Category, Photo, PhotoDetail, PhotoStatus, RemovalKind, ScoreBand};
