use std::{future::Future, sync::Arc, time::Duration};

use covbridge_common::ChainProviderError;
use tokio::sync::mpsc;

use super::{error::IngestionError, event::L1Event};

pub(crate) struct IngestionCtx<P> {
    pub provider: Arc<P>,
    pub events_tx: mpsc::Sender<L1Event>,
    pub poll_interval: Duration,
    pub query_timeout: Duration,
}

impl<P> IngestionCtx<P> {
    /// Hands an event to the consumer, waiting for room in the channel.
    pub(crate) async fn emit(&self, event: L1Event) -> Result<(), IngestionError> {
        self.events_tx
            .send(event)
            .await
            .map_err(|_| IngestionError::ChannelClosed)
    }

    /// Runs a chain query, turning an overrun into [`ChainProviderError::Timeout`].
    pub(crate) async fn query<T>(
        &self,
        fut: impl Future<Output = Result<T, ChainProviderError>>,
    ) -> Result<T, ChainProviderError> {
        tokio::time::timeout(self.query_timeout, fut)
            .await
            .map_err(|_| ChainProviderError::Timeout)?
    }
}
