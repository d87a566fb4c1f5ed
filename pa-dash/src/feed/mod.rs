//! Live gallery feed
//!
//! A [`FeedSource`] pushes full snapshots of one partition whenever it
//! changes. The [`FeedAdapter`] subscribes to both partitions and adds the
//! first-snapshot watchdog.

mod adapter;
mod manual;
mod poll;

pub use adapter::{FeedAdapter, FeedSignal};
pub use manual::ManualFeed;
pub use poll::{fetch_snapshot, PollingFeed};

use pa_common::models::{Photo, PhotoStatus};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Full snapshot of one partition
#[derive(Debug, Clone, PartialEq)]
pub struct FeedUpdate {
    pub status: PhotoStatus,
    pub records: Vec<Photo>,
}

/// Source of live snapshots
pub trait FeedSource: Send + Sync {
    /// Start delivering snapshots for `status` into `tx`
    ///
    /// Delivery stops when the returned [`Subscription`] is dropped or the
    /// receiver goes away.
    fn subscribe(&self, status: PhotoStatus, tx: mpsc::Sender<FeedUpdate>) -> Subscription;
}

/// Handle for one live query; dropping it unsubscribes
#[derive(Debug)]
pub struct Subscription {
    status: PhotoStatus,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn new(status: PhotoStatus, task: Option<JoinHandle<()>>) -> Self {
        Self { status, task }
    }

    pub fn status(&self) -> PhotoStatus {
        self.status
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::debug!(status = %self.status, "Feed subscription closed");
        }
    }
}
