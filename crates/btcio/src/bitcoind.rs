use std::{fmt, sync::Arc};

use async_trait::async_trait;
use bitcoin::{consensus, Txid};
use bitcoind_async_client::traits::Reader;
use covbridge_common::{ChainProvider, ChainProviderError};
use covbridge_l1tx::{extract_deposit, DepositFilterConfig};
use covbridge_types::Deposit;
use tracing::*;

/// [`ChainProvider`] backed by a bitcoind RPC client.
///
/// Deposits are found by scanning every transaction of every block in the requested range.
pub struct BitcoindChainProvider<R> {
    client: Arc<R>,
    filter: DepositFilterConfig,
}

impl<R> BitcoindChainProvider<R> {
    pub fn new(client: Arc<R>, filter: DepositFilterConfig) -> Self {
        Self { client, filter }
    }
}

impl<R> fmt::Debug for BitcoindChainProvider<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitcoindChainProvider")
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<R> ChainProvider for BitcoindChainProvider<R>
where
    R: Reader + Send + Sync,
{
    async fn current_height(&self) -> Result<u64, ChainProviderError> {
        let info = self
            .client
            .get_blockchain_info()
            .await
            .map_err(|e| ChainProviderError::rpc(e.to_string()))?;
        Ok(info.blocks.into())
    }

    async fn get_raw_transaction(&self, txid: &Txid) -> Result<Vec<u8>, ChainProviderError> {
        let tx = self
            .client
            .get_raw_transaction_verbosity_zero(txid)
            .await
            .map_err(|e| ChainProviderError::rpc(e.to_string()))?
            .0;
        Ok(consensus::serialize(&tx))
    }

    async fn list_deposits(&self, from: u64, to: u64) -> Result<Vec<Deposit>, ChainProviderError> {
        let mut deposits = Vec::new();
        for height in from..=to {
            let block = self
                .client
                .get_block_at(height)
                .await
                .map_err(|e| ChainProviderError::rpc(e.to_string()))?;
            deposits.extend(
                block
                    .txdata
                    .iter()
                    .filter_map(|tx| extract_deposit(tx, height, &self.filter)),
            );
        }
        debug!(%from, %to, count = deposits.len(), "scanned blocks for deposits");
        Ok(deposits)
    }
}
