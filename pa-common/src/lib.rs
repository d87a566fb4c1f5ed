//! # Photo Analyzer Common Library
//!
//! Shared code for the Photo Analyzer dashboard crates including:
//! - Photo, analytics and coaching models (wire-compatible with the gateway)
//! - Gateway request/response envelope types
//! - Dashboard event types and the EventBus
//! - Configuration loading and resolution
//! - Common error type

pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod models;

pub use error::{Error, Result};
pub use models::{Category, Photo, PhotoStatus, RemovalKind};
