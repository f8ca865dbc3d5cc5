use async_trait::async_trait;
use bitcoin::Txid;
use covbridge_types::Deposit;
use thiserror::Error;

/// Read access to the base chain.
///
/// Implementations are thin adapters over a node RPC client. Callers apply their own timeouts
/// and retry policy.
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait ChainProvider: Send + Sync {
    /// Returns the height of the current chain tip.
    async fn current_height(&self) -> Result<u64, ChainProviderError>;

    /// Fetches the consensus-serialized transaction with the given id.
    async fn get_raw_transaction(&self, txid: &Txid) -> Result<Vec<u8>, ChainProviderError>;

    /// Lists deposits confirmed in blocks `from..=to`.
    async fn list_deposits(&self, from: u64, to: u64) -> Result<Vec<Deposit>, ChainProviderError>;
}

/// Lists deposits with validation.
///
/// This is a checked version of [`ChainProvider::list_deposits`] that validates:
/// - `from <= to`
/// - every returned deposit was confirmed inside the requested range
pub async fn list_deposits_checked(
    provider: &impl ChainProvider,
    from: u64,
    to: u64,
) -> Result<Vec<Deposit>, ChainProviderError> {
    if from > to {
        return Err(ChainProviderError::InvalidRange { from, to });
    }
    let deposits = provider.list_deposits(from, to).await?;
    if let Some(dep) = deposits
        .iter()
        .find(|d| !(from..=to).contains(&d.origin.block_height))
    {
        return Err(ChainProviderError::DepositOutsideRange {
            height: dep.origin.block_height,
            from,
            to,
        });
    }
    Ok(deposits)
}

/// Errors that can occur when querying the base chain.
#[derive(Debug, Error)]
pub enum ChainProviderError {
    /// The requested height range is empty.
    #[error("invalid range: from ({from}) must not exceed to ({to})")]
    InvalidRange { from: u64, to: u64 },

    /// The provider returned a deposit outside the requested range.
    #[error("deposit at height {height} outside requested range [{from}, {to}]")]
    DepositOutsideRange { height: u64, from: u64, to: u64 },

    /// The transaction is not known to the node.
    #[error("transaction {0} not found")]
    NotFound(Txid),

    /// The query did not complete in time.
    #[error("query timed out")]
    Timeout,

    /// Network-related error occurred.
    #[error("network error: {0}")]
    Network(String),

    /// RPC call failed.
    #[error("rpc error: {0}")]
    Rpc(String),

    /// Other unspecified error.
    #[error(transparent)]
    Other(#[from] eyre::Error),
}

impl ChainProviderError {
    /// Creates a network error.
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Creates an RPC error.
    pub fn rpc(msg: impl Into<String>) -> Self {
        Self::Rpc(msg.into())
    }

    /// Whether the same query may succeed if simply repeated.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout | Self::Network(_) | Self::Rpc(_))
    }
}
