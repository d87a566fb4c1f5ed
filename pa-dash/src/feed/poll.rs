//! Polling feed over `GET /api/data`

use std::sync::Arc;
use std::time::Duration;

use futures::{Stream, StreamExt};
use pa_common::api::DataQuery;
use pa_common::config::FeedConfig;
use pa_common::models::{Photo, PhotoStatus};
use tokio::sync::mpsc;

use super::{FeedSource, FeedUpdate, Subscription};
use crate::gateway::{Gateway, GatewayResult};

/// Upper bound on pages fetched for one snapshot
const MAX_PAGES: u32 = 500;

/// Fetch the complete current list for one partition
///
/// Reviewed photos are paged until `reviewedHasMore` is false; the pending
/// list arrives in one page.
pub async fn fetch_snapshot(
    gateway: &dyn Gateway,
    status: PhotoStatus,
    page_size: u32,
) -> GatewayResult<Vec<Photo>> {
    let mut records = Vec::new();
    let mut page = 1;

    loop {
        let query = DataQuery::new(page, page_size).with_tab(status);
        let data = gateway.fetch_page(query).await?;
        records.extend_from_slice(data.records(status));

        let more = status == PhotoStatus::Reviewed && data.reviewed_has_more;
        if !more {
            break;
        }
        if page >= MAX_PAGES {
            tracing::warn!(status = %status, pages = page, "Snapshot truncated at page limit");
            break;
        }
        page += 1;
    }

    tracing::trace!(status = %status, count = records.len(), "Fetched feed snapshot");
    Ok(records)
}

/// [`FeedSource`] that polls the gateway on a fixed interval
///
/// A snapshot is emitted only when its content differs from the previous
/// emission. A failed poll is logged and skipped: the last snapshot stands.
#[derive(Clone)]
pub struct PollingFeed {
    gateway: Arc<dyn Gateway>,
    interval: Duration,
    page_size: u32,
}

impl PollingFeed {
    pub fn new(gateway: Arc<dyn Gateway>, config: &FeedConfig) -> Self {
        Self {
            gateway,
            interval: config.poll_interval(),
            page_size: config.page_size.max(1),
        }
    }

    /// Endless stream of changed snapshots for `status`
    pub fn snapshots(&self, status: PhotoStatus) -> impl Stream<Item = Vec<Photo>> + Send + 'static {
        let gateway = self.gateway.clone();
        let interval = self.interval;
        let page_size = self.page_size;

        async_stream::stream! {
            let mut last: Option<Vec<Photo>> = None;

            loop {
                match fetch_snapshot(gateway.as_ref(), status, page_size).await {
                    Ok(records) => {
                        if last.as_ref() != Some(&records) {
                            last = Some(records.clone());
                            yield records;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(status = %status, error = %e, "Feed poll failed, keeping last snapshot");
                    }
                }

                tokio::time::sleep(interval).await;
            }
        }
    }
}

impl FeedSource for PollingFeed {
    fn subscribe(&self, status: PhotoStatus, tx: mpsc::Sender<FeedUpdate>) -> Subscription {
        let stream = self.snapshots(status);

        let task = tokio::spawn(async move {
            futures::pin_mut!(stream);
            while let Some(records) = stream.next().await {
                if tx.send(FeedUpdate { status, records }).await.is_err() {
                    tracing::debug!(status = %status, "Feed receiver dropped, stopping poller");
                    break;
                }
            }
        });

        tracing::info!(status = %status, interval_ms = self.interval.as_millis() as u64, "Polling feed subscribed");
        Subscription::new(status, Some(task))
    }
}
