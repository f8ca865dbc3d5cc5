use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;
use bitcoin::{consensus, Transaction, Txid};
use covbridge_common::{ChainProvider, ChainProviderError};
use covbridge_types::Deposit;

#[derive(Debug, Default)]
struct Inner {
    height: u64,
    txs: HashMap<Txid, Vec<u8>>,
    deposits: Vec<Deposit>,
}

/// [`ChainProvider`] over transactions and deposits registered by the test.
#[derive(Debug, Default)]
pub struct InMemoryChainProvider {
    inner: Mutex<Inner>,
}

impl InMemoryChainProvider {
    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("test provider lock poisoned")
    }

    pub fn insert_tx(&self, tx: &Transaction) {
        self.insert_raw(tx.compute_txid(), consensus::serialize(tx));
    }

    /// Serves `raw` under `txid`, whether or not it hashes to it.
    pub fn insert_raw(&self, txid: Txid, raw: Vec<u8>) {
        self.inner().txs.insert(txid, raw);
    }

    pub fn set_height(&self, height: u64) {
        self.inner().height = height;
    }

    pub fn add_deposit(&self, deposit: Deposit) {
        self.inner().deposits.push(deposit);
    }
}

#[async_trait]
impl ChainProvider for InMemoryChainProvider {
    async fn current_height(&self) -> Result<u64, ChainProviderError> {
        Ok(self.inner().height)
    }

    async fn get_raw_transaction(&self, txid: &Txid) -> Result<Vec<u8>, ChainProviderError> {
        self.inner()
            .txs
            .get(txid)
            .cloned()
            .ok_or(ChainProviderError::NotFound(*txid))
    }

    async fn list_deposits(&self, from: u64, to: u64) -> Result<Vec<Deposit>, ChainProviderError> {
        Ok(self
            .inner()
            .deposits
            .iter()
            .filter(|d| (from..=to).contains(&d.origin.block_height))
            .cloned()
            .collect())
    }
}
