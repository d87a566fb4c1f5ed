//! pa-dash library
//!
//! Headless photo-curation dashboard: gallery state synchronization over a
//! live feed, the gateway client for mutations and reports, the local cache
//! and the upload flow. The `pa-dash` binary is a thin CLI over this crate.

pub mod analytics;
pub mod cache;
pub mod coaching;
pub mod dashboard;
pub mod error;
pub mod feed;
pub mod filters;
pub mod gateway;
pub mod notices;
pub mod render;
pub mod sync;
pub mod upload;

pub use dashboard::{AnalyzeSummary, Dashboard};
pub use error::{DashError, DashResult};
