//! Event types for the dashboard event system
//!
//! Provides the shared `DashboardEvent` enum and the `EventBus` that carries
//! it from the dashboard controller to any observer (CLI printer, tests).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::{PhotoStatus, RemovalKind};

/// Loading state of the gallery view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadPhase {
    /// Waiting for the first feed snapshot
    Loading,
    /// At least one snapshot arrived
    Ready,
    /// No snapshot within the first-snapshot timeout; rendering anyway
    Degraded,
}

/// Severity of a user notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Toast-style user message
///
/// Notices are transient: the notice center drops them after their TTL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub id: Uuid,
    pub level: NoticeLevel,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            level,
            message: message.into(),
            raised_at: Utc::now(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

/// Dashboard event types
///
/// Events are broadcast via EventBus and serialize with a `type` tag so an
/// observer can forward them verbatim as JSON lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DashboardEvent {
    /// A feed snapshot replaced the authoritative list for one partition
    SnapshotApplied {
        status: PhotoStatus,
        /// Records in the new snapshot
        count: usize,
        /// Removing-overlay entries confirmed (purged) by this snapshot
        confirmed: Vec<String>,
        timestamp: DateTime<Utc>,
    },

    /// Gallery loading state changed
    LoadPhaseChanged {
        old_phase: LoadPhase,
        new_phase: LoadPhase,
        timestamp: DateTime<Utc>,
    },

    /// Neither feed delivered a first snapshot in time
    SlowConnection {
        waited_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// A user-visible notice was raised
    NoticeRaised { notice: Notice },

    /// A batch entered the removing overlay and its mutation was dispatched
    RemovalDispatched {
        kind: RemovalKind,
        filenames: Vec<String>,
        timestamp: DateTime<Utc>,
    },

    /// A failed batch call restored its filenames
    RemovalRolledBack {
        filenames: Vec<String>,
        timestamp: DateTime<Utc>,
    },

    /// Stale removing entries were force-cleared
    OverlaySwept {
        filenames: Vec<String>,
        timestamp: DateTime<Utc>,
    },

    /// One analysis call resolved
    AnalysisFinished {
        filename: String,
        success: bool,
        timestamp: DateTime<Utc>,
    },

    /// Upload queue entry progressed
    UploadProgress {
        filename: String,
        /// 0-100
        progress: u8,
        timestamp: DateTime<Utc>,
    },
}

impl DashboardEvent {
    /// Event type name (matches the serialized `type` tag)
    pub fn event_type(&self) -> &str {
        match self {
            DashboardEvent::SnapshotApplied { .. } => "SnapshotApplied",
            DashboardEvent::LoadPhaseChanged { .. } => "LoadPhaseChanged",
            DashboardEvent::SlowConnection { .. } => "SlowConnection",
            DashboardEvent::NoticeRaised { .. } => "NoticeRaised",
            DashboardEvent::RemovalDispatched { .. } => "RemovalDispatched",
            DashboardEvent::RemovalRolledBack { .. } => "RemovalRolledBack",
            DashboardEvent::OverlaySwept { .. } => "OverlaySwept",
            DashboardEvent::AnalysisFinished { .. } => "AnalysisFinished",
            DashboardEvent::UploadProgress { .. } => "UploadProgress",
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution for the dashboard
///
/// Uses tokio::broadcast internally:
/// - Any number of subscribers, each sees every event emitted after it subscribed
/// - Slow subscribers lag (oldest events dropped) instead of blocking emitters
/// - Cloning the bus shares the same channel
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<DashboardEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before dropping old events
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            capacity: capacity.max(1),
        }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: DashboardEvent,
    ) -> Result<usize, broadcast::error::SendError<DashboardEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring the no-subscriber case
    ///
    /// Use for informational events where nobody listening is normal.
    pub fn emit_lossy(&self, event: DashboardEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
