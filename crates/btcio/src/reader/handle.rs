use std::{future::Future, sync::Arc, time::Duration};

use covbridge_common::ChainProvider;
use tokio::sync::{mpsc, watch};

use super::{ctx::IngestionCtx, cursor::ScanCursor, event::L1Event, task::ingestion_task};

/// Default ms to wait between height polls, and between height retries.
const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;
/// Default ms a single chain query may take.
const DEFAULT_QUERY_TIMEOUT_MS: u64 = 5_000;
/// Default number of undelivered events buffered before the task waits.
const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Handle for consuming ingestion events and stopping the task.
///
/// Dropping the handle also stops the task.
#[derive(Debug)]
pub struct IngestionHandle {
    stop_tx: watch::Sender<bool>,
    events_rx: mpsc::Receiver<L1Event>,
}

impl IngestionHandle {
    /// Waits for the next event. Returns `None` once the task has exited and the buffer is drained.
    pub async fn next_event(&mut self) -> Option<L1Event> {
        self.events_rx.recv().await
    }

    /// Signals the task to stop after its current query.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }
}

/// Builder for the L1 ingestion task.
#[derive(Debug)]
pub struct IngestionBuilder<P> {
    provider: Arc<P>,
    last_scanned: u64,
    poll_interval_ms: Option<u64>,
    query_timeout_ms: Option<u64>,
    channel_capacity: Option<usize>,
}

impl<P> IngestionBuilder<P> {
    /// Creates a builder that scans from `last_scanned + 1`.
    pub fn new(provider: Arc<P>, last_scanned: u64) -> Self {
        Self {
            provider,
            last_scanned,
            poll_interval_ms: None,
            query_timeout_ms: None,
            channel_capacity: None,
        }
    }

    /// Sets the polling interval in milliseconds.
    pub fn with_poll_interval_ms(mut self, v: u64) -> Self {
        self.poll_interval_ms = Some(v);
        self
    }

    /// Sets the per-query timeout in milliseconds.
    pub fn with_query_timeout_ms(mut self, v: u64) -> Self {
        self.query_timeout_ms = Some(v);
        self
    }

    pub fn with_channel_capacity(mut self, v: usize) -> Self {
        self.channel_capacity = Some(v);
        self
    }

    /// Builds and returns the ingestion handle and task.
    pub fn build(self) -> (IngestionHandle, impl Future<Output = ()>)
    where
        P: ChainProvider,
    {
        let (stop_tx, stop_rx) = watch::channel(false);
        let (events_tx, events_rx) =
            mpsc::channel(self.channel_capacity.unwrap_or(DEFAULT_CHANNEL_CAPACITY).max(1));
        let handle = IngestionHandle { stop_tx, events_rx };
        let ctx = IngestionCtx {
            provider: self.provider,
            events_tx,
            poll_interval: Duration::from_millis(
                self.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS),
            ),
            query_timeout: Duration::from_millis(
                self.query_timeout_ms.unwrap_or(DEFAULT_QUERY_TIMEOUT_MS),
            ),
        };
        let task = ingestion_task(ScanCursor::new(self.last_scanned), ctx, stop_rx);

        (handle, task)
    }
}
