//! In-process feed driven by explicit pushes

use std::collections::HashMap;
use std::sync::Mutex;

use pa_common::models::{Photo, PhotoStatus};
use tokio::sync::mpsc;

use super::{FeedSource, FeedUpdate, Subscription};

/// [`FeedSource`] whose snapshots are pushed by the owner
///
/// Used for replaying recorded snapshots and in tests.
#[derive(Default)]
pub struct ManualFeed {
    senders: Mutex<HashMap<PhotoStatus, mpsc::Sender<FeedUpdate>>>,
}

impl ManualFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a snapshot; false if nobody subscribed to `status`
    pub async fn push(&self, status: PhotoStatus, records: Vec<Photo>) -> bool {
        let sender = match self.senders.lock() {
            Ok(senders) => senders.get(&status).cloned(),
            Err(_) => None,
        };
        match sender {
            Some(tx) => tx.send(FeedUpdate { status, records }).await.is_ok(),
            None => false,
        }
    }

    pub fn is_subscribed(&self, status: PhotoStatus) -> bool {
        self.senders
            .lock()
            .map(|senders| senders.get(&status).is_some_and(|tx| !tx.is_closed()))
            .unwrap_or(false)
    }
}

impl FeedSource for ManualFeed {
    fn subscribe(&self, status: PhotoStatus, tx: mpsc::Sender<FeedUpdate>) -> Subscription {
        if let Ok(mut senders) = self.senders.lock() {
            senders.insert(status, tx);
        }
        Subscription::new(status, None)
    }
}
