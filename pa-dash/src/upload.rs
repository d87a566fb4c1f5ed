//! Upload queue and direct-to-storage transfer
//!
//! Each file goes through: signed URL request, streamed `PUT` of the bytes
//! to that URL, then a completion call so the pipeline picks it up.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::StreamExt;
use pa_common::api::UploadKind;
use pa_common::events::{DashboardEvent, EventBus};
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use tracing::{error, info};

use crate::error::{DashError, DashResult};
use crate::gateway::{Gateway, GatewayError};

const CHUNK_SIZE: usize = 256 * 1024;

/// How often the queue entry copies the byte counter during a transfer
const PROGRESS_SYNC: Duration = Duration::from_millis(100);

/// Upload state of one queue entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStatus {
    Pending,
    Uploading,
    Done,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadEntry {
    pub path: PathBuf,
    pub filename: String,
    pub kind: UploadKind,
    pub status: UploadStatus,
    /// 0-100
    pub progress: u8,
}

/// Files rejected by [`UploadQueue::add_paths`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddReport {
    pub added: usize,
    /// Not JPG/JPEG/ARW
    pub unsupported: Vec<String>,
    /// Same file name already queued
    pub duplicates: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadSummary {
    pub ok: usize,
    pub errors: usize,
}

impl UploadSummary {
    /// Notice text; `None` when nothing was attempted
    pub fn message(&self) -> Option<String> {
        match (self.ok, self.errors) {
            (0, 0) => None,
            (0, errors) => Some(format!("⚠️ {} upload error(s)", errors)),
            (ok, 0) => Some(format!("📤 {} file(s) uploaded", ok)),
            (ok, errors) => Some(format!("📤 {} file(s) uploaded · ⚠️ {} error(s)", ok, errors)),
        }
    }
}

/// Ordered list of files to upload
#[derive(Debug, Default)]
pub struct UploadQueue {
    entries: Vec<UploadEntry>,
}

impl UploadQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify and queue files; unsupported and duplicate names are skipped
    pub fn add_paths<I, P>(&mut self, paths: I) -> AddReport
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut report = AddReport::default();

        for path in paths {
            let path = path.as_ref();
            let filename = match path.file_name() {
                Some(name) => name.to_string_lossy().into_owned(),
                None => {
                    report.unsupported.push(path.display().to_string());
                    continue;
                }
            };

            let Some(kind) = UploadKind::from_filename(&filename) else {
                report.unsupported.push(filename);
                continue;
            };

            if self.entries.iter().any(|e| e.filename == filename) {
                report.duplicates.push(filename);
                continue;
            }

            self.entries.push(UploadEntry {
                path: path.to_path_buf(),
                filename,
                kind,
                status: UploadStatus::Pending,
                progress: 0,
            });
            report.added += 1;
        }

        report
    }

    pub fn remove(&mut self, index: usize) -> Option<UploadEntry> {
        (index < self.entries.len()).then(|| self.entries.remove(index))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[UploadEntry] {
        &self.entries
    }

    pub fn count_kind(&self, kind: UploadKind) -> usize {
        self.entries.iter().filter(|e| e.kind == kind).count()
    }

    /// Entries a run would attempt (pending or previously failed)
    pub fn pending_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.status, UploadStatus::Pending | UploadStatus::Error))
            .count()
    }
}

/// Uploads queue entries one at a time
pub struct Uploader<'a> {
    gateway: &'a dyn Gateway,
    http: reqwest::Client,
    bus: EventBus,
}

impl<'a> Uploader<'a> {
    pub fn new(gateway: &'a dyn Gateway, http: reqwest::Client, bus: EventBus) -> Self {
        Self { gateway, http, bus }
    }

    /// Upload every entry not already done
    ///
    /// A failed entry is marked `Error` with progress 0 and the run continues.
    pub async fn upload_all(&self, queue: &mut UploadQueue) -> UploadSummary {
        let mut summary = UploadSummary::default();

        for entry in queue.entries.iter_mut() {
            if entry.status == UploadStatus::Done {
                continue;
            }

            entry.status = UploadStatus::Uploading;
            self.set_progress(entry, 0);

            match self.upload_one(entry).await {
                Ok(()) => {
                    entry.status = UploadStatus::Done;
                    self.set_progress(entry, 100);
                    summary.ok += 1;
                    info!(filename = %entry.filename, kind = %entry.kind, "Upload complete");
                }
                Err(e) => {
                    entry.status = UploadStatus::Error;
                    self.set_progress(entry, 0);
                    summary.errors += 1;
                    error!(filename = %entry.filename, error = %e, "Upload failed");
                }
            }
        }

        summary
    }

    async fn upload_one(&self, entry: &mut UploadEntry) -> DashResult<()> {
        let signed = self
            .gateway
            .signed_upload_url(&entry.filename, entry.kind)
            .await?;
        self.set_progress(entry, 10);

        let bytes = tokio::fs::read(&entry.path).await?;
        let transfer = TransferCounter::new(bytes.len() as u64);
        let body = self.progress_body(entry.filename.clone(), bytes, transfer.clone());

        let send = self
            .http
            .put(&signed.url)
            .header(CONTENT_TYPE, signed.content_type.as_str())
            .header(CONTENT_LENGTH, transfer.total)
            .body(body)
            .send();
        tokio::pin!(send);

        let mut sync = tokio::time::interval(PROGRESS_SYNC);
        let response = loop {
            tokio::select! {
                result = &mut send => break result.map_err(GatewayError::from)?,
                _ = sync.tick() => entry.progress = entry.progress.max(transfer.percent()),
            }
        };
        entry.progress = entry.progress.max(transfer.percent());

        if !response.status().is_success() {
            return Err(DashError::Gateway(GatewayError::UploadStatus(
                response.status().as_u16(),
            )));
        }
        self.set_progress(entry, 95);

        self.gateway
            .upload_complete(&entry.filename, entry.kind)
            .await?;
        Ok(())
    }

    /// Streamed request body feeding `transfer` and the bus as chunks are sent
    fn progress_body(
        &self,
        filename: String,
        bytes: Vec<u8>,
        transfer: TransferCounter,
    ) -> reqwest::Body {
        let bus = self.bus.clone();

        let chunks: Vec<Vec<u8>> = bytes.chunks(CHUNK_SIZE).map(<[u8]>::to_vec).collect();
        let stream = futures::stream::iter(chunks).map(move |chunk| {
            let progress = transfer.record(chunk.len() as u64);
            bus.emit_lossy(DashboardEvent::UploadProgress {
                filename: filename.clone(),
                progress,
                timestamp: Utc::now(),
            });
            Ok::<_, std::io::Error>(chunk)
        });

        reqwest::Body::wrap_stream(stream)
    }

    fn set_progress(&self, entry: &mut UploadEntry, progress: u8) {
        entry.progress = progress;
        self.bus.emit_lossy(DashboardEvent::UploadProgress {
            filename: entry.filename.clone(),
            progress,
            timestamp: Utc::now(),
        });
    }
}

/// Bytes handed to the HTTP body so far, shared with the uploader
#[derive(Debug, Clone)]
struct TransferCounter {
    sent: Arc<AtomicU64>,
    total: u64,
}

impl TransferCounter {
    fn new(total: u64) -> Self {
        Self {
            sent: Arc::new(AtomicU64::new(0)),
            total,
        }
    }

    /// Count a chunk; returns the new percentage
    fn record(&self, bytes: u64) -> u8 {
        let sent = self.sent.fetch_add(bytes, Ordering::Relaxed) + bytes;
        transfer_progress(sent, self.total)
    }

    fn percent(&self) -> u8 {
        transfer_progress(self.sent.load(Ordering::Relaxed), self.total)
    }
}

/// Byte transfer mapped onto the 10-90 band
fn transfer_progress(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 90;
    }
    let pct = (sent.min(total) * 80 + total / 2) / total;
    (pct + 10) as u8
}
