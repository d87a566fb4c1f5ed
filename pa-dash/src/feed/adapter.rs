//! Feed adapter with first-snapshot watchdog

use std::time::Duration;

use pa_common::models::PhotoStatus;
use tokio::sync::mpsc;
use tokio::time::Instant;

use super::{FeedSource, FeedUpdate, Subscription};

const CHANNEL_CAPACITY: usize = 16;

/// What the adapter delivers to the dashboard
#[derive(Debug, Clone, PartialEq)]
pub enum FeedSignal {
    Snapshot(FeedUpdate),
    /// No first snapshot within the timeout; stop waiting and warn
    SlowConnection { waited: Duration },
    /// Every subscription ended
    Closed,
}

/// Subscribes to both partitions and multiplexes their snapshots
///
/// Until the first snapshot of either partition arrives, [`FeedAdapter::next`]
/// waits at most `first_snapshot_timeout` and then yields a single
/// [`FeedSignal::SlowConnection`]. After that it waits indefinitely.
pub struct FeedAdapter {
    rx: mpsc::Receiver<FeedUpdate>,
    subscriptions: Vec<Subscription>,
    first_snapshot_timeout: Duration,
    deadline: Instant,
    first_seen: bool,
    timed_out: bool,
}

impl FeedAdapter {
    pub fn connect(source: &dyn FeedSource, first_snapshot_timeout: Duration) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let subscriptions = PhotoStatus::ALL
            .iter()
            .map(|status| source.subscribe(*status, tx.clone()))
            .collect();

        Self {
            rx,
            subscriptions,
            first_snapshot_timeout,
            deadline: Instant::now() + first_snapshot_timeout,
            first_seen: false,
            timed_out: false,
        }
    }

    /// Whether any snapshot has been delivered yet
    pub fn has_first_snapshot(&self) -> bool {
        self.first_seen
    }

    /// Next signal; cancel-safe
    pub async fn next(&mut self) -> FeedSignal {
        if !self.first_seen && !self.timed_out {
            return match tokio::time::timeout_at(self.deadline, self.rx.recv()).await {
                Ok(Some(update)) => self.deliver(update),
                Ok(None) => FeedSignal::Closed,
                Err(_) => {
                    self.timed_out = true;
                    tracing::warn!(
                        waited_ms = self.first_snapshot_timeout.as_millis() as u64,
                        "No feed snapshot yet, continuing without it"
                    );
                    FeedSignal::SlowConnection {
                        waited: self.first_snapshot_timeout,
                    }
                }
            };
        }

        match self.rx.recv().await {
            Some(update) => self.deliver(update),
            None => FeedSignal::Closed,
        }
    }

    fn deliver(&mut self, update: FeedUpdate) -> FeedSignal {
        if !self.first_seen {
            self.first_seen = true;
            tracing::info!(status = %update.status, count = update.records.len(), "First feed snapshot received");
        }
        FeedSignal::Snapshot(update)
    }

    /// Unsubscribe from both live queries
    pub fn shutdown(&mut self) {
        self.subscriptions.clear();
        self.rx.close();
    }
}
