//! Auto-dismissing user notices

use std::collections::VecDeque;
use std::time::Duration;

use pa_common::events::{DashboardEvent, Notice};
use tokio::sync::broadcast;
use tokio::time::Instant;
use uuid::Uuid;

/// Upper bound on notices kept at once; the oldest goes first
const MAX_ACTIVE: usize = 32;

/// Keeps raised notices until their time-to-live runs out
#[derive(Debug)]
pub struct NoticeCenter {
    ttl: Duration,
    active: VecDeque<(Instant, Notice)>,
}

impl NoticeCenter {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            active: VecDeque::new(),
        }
    }

    pub fn push(&mut self, notice: Notice, now: Instant) {
        if self.active.len() >= MAX_ACTIVE {
            self.active.pop_front();
        }
        self.active.push_back((now, notice));
    }

    /// Notices still visible at `now`, oldest first
    pub fn active(&mut self, now: Instant) -> Vec<Notice> {
        self.prune(now);
        self.active.iter().map(|(_, n)| n.clone()).collect()
    }

    /// Drop expired notices, returning how many went
    pub fn prune(&mut self, now: Instant) -> usize {
        let before = self.active.len();
        let ttl = self.ttl;
        self.active
            .retain(|(raised, _)| now.saturating_duration_since(*raised) < ttl);
        before - self.active.len()
    }

    /// Manual close
    pub fn dismiss(&mut self, id: Uuid) -> bool {
        let before = self.active.len();
        self.active.retain(|(_, n)| n.id != id);
        before != self.active.len()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

/// Every notice raised on the bus since `events` subscribed, expired or not
///
/// Lets a one-shot command report per-item notices from a run that outlived
/// their time-to-live.
pub fn drain_raised(events: &mut broadcast::Receiver<DashboardEvent>) -> Vec<Notice> {
    let mut raised = Vec::new();
    loop {
        match events.try_recv() {
            Ok(DashboardEvent::NoticeRaised { notice }) => raised.push(notice),
            Ok(_) => {}
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Notice backlog overflowed");
            }
            Err(_) => break,
        }
    }
    raised
}
