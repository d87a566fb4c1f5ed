//! Gallery state machine
//!
//! Holds, per partition, the latest authoritative snapshot together with the
//! three local overlays. Methods are the only mutators; each one is a short
//! synchronous step so the owner can hold a lock around it without awaiting.
//!
//! Overlay rules:
//! - processing entries are cleared by the caller when the remote call
//!   resolves, independently of the feed
//! - removing entries are cleared by a snapshot that no longer lists the
//!   filename (success), by [`GalleryState::rollback_removing`] (failed call),
//!   or by [`GalleryState::sweep_stale_removing`] once their call has resolved
//! - a selected filename is never in either overlay

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use pa_common::api::GalleryPage;
use pa_common::models::{Photo, PhotoStatus, RemovalKind};
use tokio::time::Instant;

/// One removing-overlay entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemovingEntry {
    pub kind: RemovalKind,
    /// When the remote call resolved; `None` while it is still in flight.
    /// The stale sweep only ages resolved entries.
    pub resolved_at: Option<Instant>,
}

/// Result of [`GalleryState::toggle_select`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    Selected,
    Deselected,
    /// Unknown to the feed or overlayed; selection unchanged
    Rejected,
}

/// Authoritative snapshot for one partition
#[derive(Debug, Default)]
struct Partition {
    records: Vec<Photo>,
    /// A live snapshot has been applied (cache seeding does not count)
    live: bool,
}

impl Partition {
    fn contains(&self, filename: &str) -> bool {
        self.records.iter().any(|p| p.filename == filename)
    }
}

/// Client-side gallery state
#[derive(Debug, Default)]
pub struct GalleryState {
    pending: Partition,
    reviewed: Partition,
    selection: BTreeSet<String>,
    processing: BTreeSet<String>,
    removing: BTreeMap<String, RemovingEntry>,
}

impl GalleryState {
    pub fn new() -> Self {
        Self::default()
    }

    fn partition(&self, status: PhotoStatus) -> &Partition {
        match status {
            PhotoStatus::Pending => &self.pending,
            PhotoStatus::Reviewed => &self.reviewed,
        }
    }

    fn partition_mut(&mut self, status: PhotoStatus) -> &mut Partition {
        match status {
            PhotoStatus::Pending => &mut self.pending,
            PhotoStatus::Reviewed => &mut self.reviewed,
        }
    }

    // ========================================
    // Feed
    // ========================================

    /// Replace the authoritative list for `status` and purge confirmed removals
    ///
    /// Returns the removing-overlay filenames this snapshot confirmed.
    pub fn on_feed_snapshot(&mut self, status: PhotoStatus, records: Vec<Photo>) -> Vec<String> {
        let partition = self.partition_mut(status);
        partition.records = records;
        partition.live = true;

        let confirmed: Vec<String> = self
            .removing
            .iter()
            .filter(|(filename, entry)| self.is_confirmed(filename, entry.kind))
            .map(|(filename, _)| filename.clone())
            .collect();

        for filename in &confirmed {
            self.removing.remove(filename);
        }

        // Rows that vanished cannot stay selected
        let pending = &self.pending;
        let reviewed = &self.reviewed;
        self.selection
            .retain(|f| pending.contains(f) || reviewed.contains(f));

        if !confirmed.is_empty() {
            tracing::debug!(
                status = %status,
                confirmed = confirmed.len(),
                "Snapshot confirmed pending removals"
            );
        }

        confirmed
    }

    /// Whether the feed already reflects a removal of `kind`
    ///
    /// An analyzed photo moves to the reviewed list, so it only has to leave
    /// pending. Discarded and deleted photos must be gone from both lists.
    fn is_confirmed(&self, filename: &str, kind: RemovalKind) -> bool {
        match kind {
            RemovalKind::Analyzed => !self.pending.contains(filename),
            RemovalKind::Discard | RemovalKind::Delete => {
                !self.pending.contains(filename) && !self.reviewed.contains(filename)
            }
        }
    }

    /// Seed both lists from a cached snapshot for first paint
    ///
    /// Ignored for a partition that already received a live snapshot.
    pub fn seed_from_cache(&mut self, page: GalleryPage) {
        if !self.pending.live {
            self.pending.records = page.pending;
        }
        if !self.reviewed.live {
            self.reviewed.records = page.reviewed;
        }
    }

    /// Both partitions as a cacheable page
    pub fn to_page(&self) -> GalleryPage {
        GalleryPage {
            pending: self.pending.records.clone(),
            reviewed: self.reviewed.records.clone(),
            reviewed_total: self.reviewed.records.len() as u64,
            reviewed_has_more: false,
        }
    }

    pub fn records(&self, status: PhotoStatus) -> &[Photo] {
        &self.partition(status).records
    }

    pub fn has_live_snapshot(&self, status: PhotoStatus) -> bool {
        self.partition(status).live
    }

    /// Present in either partition of the current feed
    pub fn in_feed(&self, filename: &str) -> bool {
        self.pending.contains(filename) || self.reviewed.contains(filename)
    }

    // ========================================
    // Processing overlay
    // ========================================

    /// Mark filenames as analysis-in-flight
    ///
    /// Filenames already processing or removing are skipped. Marked filenames
    /// leave the selection. Returns the filenames actually marked.
    pub fn begin_processing<S: AsRef<str>>(&mut self, filenames: &[S]) -> Vec<String> {
        let mut marked = Vec::new();
        for filename in filenames {
            let filename = filename.as_ref();
            if self.is_overlayed(filename) {
                continue;
            }
            self.processing.insert(filename.to_string());
            self.selection.remove(filename);
            marked.push(filename.to_string());
        }
        marked
    }

    /// Idempotent; returns whether the filename was processing
    pub fn end_processing(&mut self, filename: &str) -> bool {
        self.processing.remove(filename)
    }

    pub fn is_processing(&self, filename: &str) -> bool {
        self.processing.contains(filename)
    }

    pub fn processing(&self) -> &BTreeSet<String> {
        &self.processing
    }

    // ========================================
    // Removing overlay
    // ========================================

    /// Mark a batch as removing and drop it from the selection
    ///
    /// Discard and delete are marked before their call is dispatched and only
    /// accept selectable filenames: listed in the feed and in neither overlay.
    /// Their entries stay unresolved until [`GalleryState::resolve_removing`].
    ///
    /// [`RemovalKind::Analyzed`] is marked after the review call resolved, so
    /// its entries are resolved on creation, and a filename the pending
    /// snapshot no longer lists is confirmed on the spot instead of marked.
    ///
    /// Returns the filenames actually marked.
    pub fn begin_removing<S: AsRef<str>>(
        &mut self,
        filenames: &[S],
        kind: RemovalKind,
    ) -> Vec<String> {
        let resolved_at = (kind == RemovalKind::Analyzed).then(Instant::now);
        let mut marked = Vec::new();

        for filename in filenames {
            let filename = filename.as_ref();

            let accepted = match kind {
                RemovalKind::Analyzed => {
                    !self.is_overlayed(filename)
                        && !(self.pending.live && self.is_confirmed(filename, kind))
                }
                _ => self.is_selectable(filename),
            };
            self.selection.remove(filename);
            if !accepted {
                continue;
            }

            self.removing
                .insert(filename.to_string(), RemovingEntry { kind, resolved_at });
            marked.push(filename.to_string());
        }

        marked
    }

    /// Start the stale clock for entries whose batch call has returned
    ///
    /// Filenames the feed already confirmed are ignored.
    pub fn resolve_removing<S: AsRef<str>>(&mut self, filenames: &[S], now: Instant) {
        for filename in filenames {
            if let Some(entry) = self.removing.get_mut(filename.as_ref()) {
                entry.resolved_at.get_or_insert(now);
            }
        }
    }

    /// Clear removing entries after the batch call itself failed
    ///
    /// Returns the filenames that were removing.
    pub fn rollback_removing<S: AsRef<str>>(&mut self, filenames: &[S]) -> Vec<String> {
        filenames
            .iter()
            .filter_map(|f| {
                self.removing
                    .remove_entry(f.as_ref())
                    .map(|(filename, _)| filename)
            })
            .collect()
    }

    /// Force-clear resolved removing entries older than `max_age`
    ///
    /// Entries whose call is still in flight are never swept.
    pub fn sweep_stale_removing(&mut self, now: Instant, max_age: Duration) -> Vec<String> {
        let stale: Vec<String> = self
            .removing
            .iter()
            .filter(|(_, entry)| {
                entry
                    .resolved_at
                    .is_some_and(|at| now.saturating_duration_since(at) >= max_age)
            })
            .map(|(filename, _)| filename.clone())
            .collect();

        for filename in &stale {
            self.removing.remove(filename);
        }

        if !stale.is_empty() {
            tracing::warn!(
                count = stale.len(),
                max_age_secs = max_age.as_secs(),
                "Cleared removing entries the feed never confirmed"
            );
        }

        stale
    }

    pub fn removing_kind(&self, filename: &str) -> Option<RemovalKind> {
        self.removing.get(filename).map(|entry| entry.kind)
    }

    pub fn removing(&self) -> &BTreeMap<String, RemovingEntry> {
        &self.removing
    }

    pub fn is_overlayed(&self, filename: &str) -> bool {
        self.processing.contains(filename) || self.removing.contains_key(filename)
    }

    // ========================================
    // Selection
    // ========================================

    /// Present in the feed and in neither overlay
    pub fn is_selectable(&self, filename: &str) -> bool {
        self.in_feed(filename) && !self.is_overlayed(filename)
    }

    pub fn toggle_select(&mut self, filename: &str) -> SelectOutcome {
        if self.selection.remove(filename) {
            return SelectOutcome::Deselected;
        }
        if !self.is_selectable(filename) {
            return SelectOutcome::Rejected;
        }
        self.selection.insert(filename.to_string());
        SelectOutcome::Selected
    }

    /// Replace the selection with the selectable subset of `filenames`
    ///
    /// Returns the new selection size.
    pub fn select_all<'a, I>(&mut self, filenames: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        let selectable: BTreeSet<String> = filenames
            .into_iter()
            .filter(|f| self.is_selectable(f))
            .map(str::to_string)
            .collect();
        self.selection = selectable;
        self.selection.len()
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Empty the selection, returning it in filename order
    pub fn take_selection(&mut self) -> Vec<String> {
        std::mem::take(&mut self.selection).into_iter().collect()
    }

    pub fn selection(&self) -> &BTreeSet<String> {
        &self.selection
    }

    pub fn selected_count(&self) -> usize {
        self.selection.len()
    }

    pub fn is_selected(&self, filename: &str) -> bool {
        self.selection.contains(filename)
    }
}
