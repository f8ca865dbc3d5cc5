use covbridge_common::ChainProviderError;
use thiserror::Error;

/// Error type for a single ingestion tick.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Chain query failed. The window is rescanned on the next tick.
    #[error("chain provider: {0}")]
    Chain(#[from] ChainProviderError),

    /// Nobody is listening for events anymore.
    #[error("event channel closed")]
    ChannelClosed,
}

impl IngestionError {
    /// Returns true if the loop can keep going after this error.
    pub fn is_recoverable(&self) -> bool {
        match self {
            IngestionError::Chain(_) => true,
            IngestionError::ChannelClosed => false,
        }
    }
}
