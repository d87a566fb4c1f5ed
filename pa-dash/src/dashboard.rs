//! Dashboard controller
//!
//! Owns the gallery state and wires user actions to the gateway:
//! - analyze: sequential background review with a settle delay per photo
//! - discard / delete: optimistic removing overlay, rolled back if the call fails
//! - feed pump: snapshots in, cache and events out
//!
//! The state lock is never held across an `.await`.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use pa_common::api::BatchOutcome;
use pa_common::config::SyncConfig;
use pa_common::events::{DashboardEvent, EventBus, LoadPhase, Notice};
use pa_common::models::{PhotoDetail, PhotoStatus, RemovalKind};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::analytics::AnalyticsView;
use crate::cache::LocalCache;
use crate::coaching::CoachingView;
use crate::error::DashResult;
use crate::feed::{FeedAdapter, FeedSignal, FeedUpdate};
use crate::filters::{filter_reviewed, GalleryStats, ReviewedQuery};
use crate::gateway::Gateway;
use crate::notices::NoticeCenter;
use crate::sync::{view, GalleryState, PhotoRow, SelectOutcome};

/// How often the feed pump looks for stale removing entries
const SWEEP_INTERVAL: Duration = Duration::from_secs(15);

/// Result of one analyze run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalyzeSummary {
    pub ok: Vec<String>,
    pub failed: Vec<String>,
}

impl AnalyzeSummary {
    fn notice(&self) -> Option<Notice> {
        match (self.ok.len(), self.failed.len()) {
            (0, 0) => None,
            (0, errors) => Some(Notice::error(format!("⚠️ {} analysis error(s)", errors))),
            (ok, 0) => Some(Notice::info(format!("✅ {} photo(s) analyzed", ok))),
            (ok, errors) => Some(Notice::warning(format!(
                "✅ {} photo(s) analyzed · ⚠️ {} error(s)",
                ok, errors
            ))),
        }
    }
}

/// Dashboard controller; cheap to clone, clones share state
#[derive(Clone)]
pub struct Dashboard {
    state: Arc<RwLock<GalleryState>>,
    phase: Arc<RwLock<LoadPhase>>,
    notices: Arc<Mutex<NoticeCenter>>,
    gateway: Arc<dyn Gateway>,
    cache: Option<LocalCache>,
    gallery_ttl: Duration,
    bus: EventBus,
    settings: SyncConfig,
}

impl Dashboard {
    pub fn new(gateway: Arc<dyn Gateway>, bus: EventBus, settings: SyncConfig) -> Self {
        Self {
            state: Arc::new(RwLock::new(GalleryState::new())),
            phase: Arc::new(RwLock::new(LoadPhase::Loading)),
            notices: Arc::new(Mutex::new(NoticeCenter::new(settings.notice_ttl()))),
            gateway,
            cache: None,
            gallery_ttl: Duration::from_secs(300),
            bus,
            settings,
        }
    }

    /// Attach the local cache used for first paint and the coaching report
    pub fn with_cache(mut self, cache: LocalCache, gallery_ttl: Duration) -> Self {
        self.cache = Some(cache);
        self.gallery_ttl = gallery_ttl;
        self
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn gateway(&self) -> Arc<dyn Gateway> {
        self.gateway.clone()
    }

    // ========================================
    // Feed
    // ========================================

    /// Seed the gallery from the cached snapshot, if fresh
    pub async fn restore_from_cache(&self) -> bool {
        let Some(cache) = &self.cache else {
            return false;
        };

        match cache.load_gallery(self.gallery_ttl).await {
            Ok(Some(page)) => {
                info!(
                    pending = page.pending.len(),
                    reviewed = page.reviewed.len(),
                    "Restored gallery from cache"
                );
                self.state.write().await.seed_from_cache(page);
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!(error = %e, "Failed to read gallery cache");
                false
            }
        }
    }

    /// Apply one adapter signal; false once the feed has closed
    pub async fn apply_signal(&self, signal: FeedSignal) -> bool {
        match signal {
            FeedSignal::Snapshot(update) => {
                self.on_snapshot(update).await;
                true
            }
            FeedSignal::SlowConnection { waited } => {
                self.set_phase(LoadPhase::Degraded).await;
                self.bus.emit_lossy(DashboardEvent::SlowConnection {
                    waited_ms: waited.as_millis() as u64,
                    timestamp: Utc::now(),
                });
                self.notify(Notice::warning(
                    "⚠️ Slow connection: the gallery is taking longer than usual",
                ));
                true
            }
            FeedSignal::Closed => {
                warn!("Gallery feed closed");
                false
            }
        }
    }

    /// Apply a feed snapshot and confirm the removals it reflects
    pub async fn on_snapshot(&self, update: FeedUpdate) {
        let FeedUpdate { status, records } = update;
        let count = records.len();

        let (confirmed, page) = {
            let mut state = self.state.write().await;
            let confirmed = state.on_feed_snapshot(status, records);
            let complete = PhotoStatus::ALL
                .iter()
                .all(|s| state.has_live_snapshot(*s));
            (confirmed, complete.then(|| state.to_page()))
        };

        debug!(status = %status, count, confirmed = confirmed.len(), "Applied feed snapshot");

        self.set_phase(LoadPhase::Ready).await;
        self.bus.emit_lossy(DashboardEvent::SnapshotApplied {
            status,
            count,
            confirmed,
            timestamp: Utc::now(),
        });

        if let (Some(cache), Some(page)) = (&self.cache, page) {
            if let Err(e) = cache.save_gallery(&page).await {
                warn!(error = %e, "Failed to write gallery cache");
            }
        }
    }

    /// Pump adapter signals until the feed closes or `shutdown` resolves
    ///
    /// Also sweeps stale removing entries and expired notices periodically.
    pub async fn run_feed<F>(&self, mut adapter: FeedAdapter, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut tick = tokio::time::interval(SWEEP_INTERVAL);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                signal = adapter.next() => {
                    if !self.apply_signal(signal).await {
                        break;
                    }
                }
                _ = tick.tick() => {
                    self.sweep_stale().await;
                    self.prune_notices();
                }
                _ = &mut shutdown => {
                    info!("Feed pump stopping");
                    break;
                }
            }
        }

        adapter.shutdown();
    }

    async fn set_phase(&self, new_phase: LoadPhase) {
        let old_phase = {
            let mut phase = self.phase.write().await;
            let old = *phase;
            // Ready is terminal
            if old == new_phase || old == LoadPhase::Ready {
                return;
            }
            *phase = new_phase;
            old
        };

        info!(?old_phase, ?new_phase, "Gallery load phase changed");
        self.bus.emit_lossy(DashboardEvent::LoadPhaseChanged {
            old_phase,
            new_phase,
            timestamp: Utc::now(),
        });
    }

    pub async fn phase(&self) -> LoadPhase {
        *self.phase.read().await
    }

    /// Clear removing entries the feed never confirmed
    pub async fn sweep_stale(&self) -> Vec<String> {
        let Some(max_age) = self.settings.stale_removing_after() else {
            return Vec::new();
        };

        let swept = self
            .state
            .write()
            .await
            .sweep_stale_removing(Instant::now(), max_age);

        if !swept.is_empty() {
            self.bus.emit_lossy(DashboardEvent::OverlaySwept {
                filenames: swept.clone(),
                timestamp: Utc::now(),
            });
        }
        swept
    }

    // ========================================
    // Views and selection
    // ========================================

    pub async fn rows(&self, tab: PhotoStatus) -> Vec<PhotoRow> {
        view(&*self.state.read().await, tab)
    }

    /// Reviewed rows after search, category filter and sort
    pub async fn reviewed_rows(&self, query: &ReviewedQuery) -> Vec<PhotoRow> {
        filter_reviewed(self.rows(PhotoStatus::Reviewed).await, query)
    }

    pub async fn stats(&self) -> GalleryStats {
        let state = self.state.read().await;
        GalleryStats::compute(
            state.records(PhotoStatus::Pending),
            state.records(PhotoStatus::Reviewed),
        )
    }

    pub async fn toggle_select(&self, filename: &str) -> SelectOutcome {
        self.state.write().await.toggle_select(filename)
    }

    /// Select every visible, selectable row of `tab`
    ///
    /// `query` narrows the reviewed tab the way the gallery filter does.
    pub async fn select_all(&self, tab: PhotoStatus, query: Option<&ReviewedQuery>) -> usize {
        let mut state = self.state.write().await;
        let visible: Vec<String> = match (tab, query) {
            (PhotoStatus::Reviewed, Some(query)) => {
                filter_reviewed(state.records(tab).to_vec(), query)
                    .into_iter()
                    .map(|p| p.filename)
                    .collect()
            }
            _ => state
                .records(tab)
                .iter()
                .map(|p| p.filename.clone())
                .collect(),
        };
        state.select_all(visible.iter().map(String::as_str))
    }

    pub async fn clear_selection(&self) {
        self.state.write().await.clear_selection();
    }

    pub async fn selection(&self) -> Vec<String> {
        self.state.read().await.selection().iter().cloned().collect()
    }

    pub async fn is_selectable(&self, filename: &str) -> bool {
        self.state.read().await.is_selectable(filename)
    }

    // ========================================
    // Analyze
    // ========================================

    /// Analyze the selection in the background
    ///
    /// Returns `None` when nothing selectable was selected.
    pub async fn analyze_selected(&self) -> Option<JoinHandle<AnalyzeSummary>> {
        let batch = {
            let mut state = self.state.write().await;
            let selection = state.take_selection();
            state.begin_processing(&selection)
        };
        if batch.is_empty() {
            return None;
        }

        self.notify(Notice::info(format!("🔄 Analyzing {} photo(s)...", batch.len())));
        let this = self.clone();
        Some(tokio::spawn(async move { this.run_analysis(batch).await }))
    }

    /// Analyze `filenames` in the foreground, skipping overlayed ones
    pub async fn analyze(&self, filenames: &[String]) -> AnalyzeSummary {
        let batch = self.state.write().await.begin_processing(filenames);
        if batch.is_empty() {
            return AnalyzeSummary::default();
        }
        self.notify(Notice::info(format!("🔄 Analyzing {} photo(s)...", batch.len())));
        self.run_analysis(batch).await
    }

    async fn run_analysis(&self, batch: Vec<String>) -> AnalyzeSummary {
        let mut summary = AnalyzeSummary::default();

        for filename in batch {
            let result = self.gateway.review(&filename).await;

            {
                let mut state = self.state.write().await;
                state.end_processing(&filename);
                if result.is_ok() {
                    state.begin_removing(&[filename.as_str()], RemovalKind::Analyzed);
                }
            }

            self.bus.emit_lossy(DashboardEvent::AnalysisFinished {
                filename: filename.clone(),
                success: result.is_ok(),
                timestamp: Utc::now(),
            });

            match result {
                Ok(_) => summary.ok.push(filename),
                Err(e) => {
                    error!(filename = %filename, error = %e, "Analysis failed");
                    self.notify(Notice::error(format!("⚠️ Analysis failed for {}: {}", filename, e)));
                    summary.failed.push(filename);
                }
            }

            tokio::time::sleep(self.settings.settle_delay()).await;
        }

        info!(ok = summary.ok.len(), errors = summary.failed.len(), "Analyze run finished");
        if let Some(notice) = summary.notice() {
            self.notify(notice);
        }
        summary
    }

    // ========================================
    // Discard / delete
    // ========================================

    /// Discard the selection; `Ok(None)` when nothing was selected
    pub async fn discard_selected(&self) -> DashResult<Option<BatchOutcome>> {
        let selection = self.state.write().await.take_selection();
        if selection.is_empty() {
            return Ok(None);
        }
        self.discard(&selection).await.map(Some)
    }

    /// Delete the selection; `Ok(None)` when nothing was selected
    pub async fn delete_selected(&self) -> DashResult<Option<BatchOutcome>> {
        let selection = self.state.write().await.take_selection();
        if selection.is_empty() {
            return Ok(None);
        }
        self.delete(&selection).await.map(Some)
    }

    pub async fn discard(&self, filenames: &[String]) -> DashResult<BatchOutcome> {
        self.remove_batch(filenames, RemovalKind::Discard).await
    }

    pub async fn delete(&self, filenames: &[String]) -> DashResult<BatchOutcome> {
        self.remove_batch(filenames, RemovalKind::Delete).await
    }

    async fn remove_batch(
        &self,
        filenames: &[String],
        kind: RemovalKind,
    ) -> DashResult<BatchOutcome> {
        let batch = self.state.write().await.begin_removing(filenames, kind);
        if batch.len() < filenames.len() {
            warn!(
                kind = %kind,
                requested = filenames.len(),
                accepted = batch.len(),
                "Skipped filenames that are busy or no longer listed"
            );
        }
        if batch.is_empty() {
            return Ok(BatchOutcome::default());
        }

        self.bus.emit_lossy(DashboardEvent::RemovalDispatched {
            kind,
            filenames: batch.clone(),
            timestamp: Utc::now(),
        });

        let result = match kind {
            RemovalKind::Delete => self.gateway.delete(&batch).await,
            _ => self.gateway.discard(&batch).await,
        };

        match result {
            Ok(outcome) => {
                self.state
                    .write()
                    .await
                    .resolve_removing(&batch, Instant::now());

                let verb = if kind == RemovalKind::Delete {
                    "deleted"
                } else {
                    "discarded"
                };
                if outcome.is_partial() {
                    warn!(
                        kind = %kind,
                        failed = ?outcome.failed(&batch),
                        "Batch partially failed"
                    );
                    self.notify(Notice::warning(format!(
                        "🗑️ {} photo(s) {} · ⚠️ {} error(s)",
                        outcome.processed, verb, outcome.errors
                    )));
                } else {
                    self.notify(Notice::info(format!(
                        "🗑️ {} photo(s) {}",
                        outcome.processed, verb
                    )));
                }
                Ok(outcome)
            }
            Err(e) => {
                let restored = self.state.write().await.rollback_removing(&batch);
                error!(kind = %kind, error = %e, restored = restored.len(), "Batch call failed, rolled back");
                self.bus.emit_lossy(DashboardEvent::RemovalRolledBack {
                    filenames: restored,
                    timestamp: Utc::now(),
                });
                self.notify(Notice::error(format!("Error: {}", e)));
                Err(e.into())
            }
        }
    }

    // ========================================
    // Detail, analytics, coaching
    // ========================================

    /// Full review document; failures are logged only
    pub async fn open_detail(&self, filename: &str) -> Option<PhotoDetail> {
        match self.gateway.fetch_detail(filename).await {
            Ok(detail) => Some(detail),
            Err(e) => {
                warn!(filename = %filename, error = %e, "Failed to load photo detail");
                None
            }
        }
    }

    pub async fn refresh_analytics(&self) -> AnalyticsView {
        AnalyticsView::from_result(self.gateway.analytics().await)
    }

    /// Cached coaching report, or `NotLoaded`
    pub async fn coaching(&self) -> CoachingView {
        let Some(cache) = &self.cache else {
            return CoachingView::NotLoaded;
        };
        match cache.load_coaching().await {
            Ok(Some(report)) => CoachingView::Ready {
                report: Box::new(report),
                cached: true,
            },
            Ok(None) => CoachingView::NotLoaded,
            Err(e) => {
                warn!(error = %e, "Failed to read coaching cache");
                CoachingView::NotLoaded
            }
        }
    }

    /// Generate a fresh coaching report and cache it
    pub async fn refresh_coaching(&self) -> CoachingView {
        match self.gateway.coaching().await {
            Ok(report) => {
                if let Some(cache) = &self.cache {
                    if let Err(e) = cache.save_coaching(&report).await {
                        warn!(error = %e, "Failed to write coaching cache");
                    }
                }
                CoachingView::Ready {
                    report: Box::new(report),
                    cached: false,
                }
            }
            Err(e) => {
                error!(error = %e, "Coaching request failed");
                CoachingView::Failed(e.to_string())
            }
        }
    }

    // ========================================
    // Notices
    // ========================================

    fn notify(&self, notice: Notice) {
        if let Ok(mut center) = self.notices.lock() {
            center.push(notice.clone(), Instant::now());
        }
        self.bus.emit_lossy(DashboardEvent::NoticeRaised { notice });
    }

    /// Notices still visible
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .map(|mut center| center.active(Instant::now()))
            .unwrap_or_default()
    }

    pub fn dismiss_notice(&self, id: Uuid) -> bool {
        self.notices
            .lock()
            .map(|mut center| center.dismiss(id))
            .unwrap_or(false)
    }

    fn prune_notices(&self) {
        if let Ok(mut center) = self.notices.lock() {
            center.prune(Instant::now());
        }
    }
}
