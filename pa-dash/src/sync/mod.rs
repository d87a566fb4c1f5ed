//! Gallery state synchronization
//!
//! [`GalleryState`] reconciles the authoritative feed snapshots with the
//! client-local overlays (selection, processing, removing). [`view`] merges
//! them into the rows a front end renders.

mod state;
mod view;

pub use state::{GalleryState, RemovingEntry, SelectOutcome};
pub use view::{view, PhotoRow};
