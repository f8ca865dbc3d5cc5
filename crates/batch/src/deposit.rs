use bitcoin::{hashes::Hash as _, Txid};
use covbridge_tree::{batch_height, compute_level};
use covbridge_types::{sha256, CovenantState, Deposit, Hash256, L2TxHash};
use serde::Serialize;
use tracing::*;

use crate::{
    errors::{BatchError, FailureKind},
    status::BatchStatus,
};

/// A power-of-two set of deposits travelling from L1 to L2 together.
#[derive(Clone, Debug, Serialize)]
pub struct DepositBatch {
    deposits: Vec<Deposit>,
    status: BatchStatus,
    failure_reason: Option<String>,
    batch_id: Option<Hash256>,
    finalize_tx: Option<Txid>,
    deposit_tx: Option<L2TxHash>,
    verify_tx: Option<Txid>,
    aggregation_levels: Vec<Vec<CovenantState>>,
    aggregation_txs: Vec<Vec<Txid>>,
}

impl DepositBatch {
    /// Opens a batch over `deposits`. Level 0 is materialized by the deposit transactions.
    pub fn new(deposits: Vec<Deposit>) -> Result<Self, BatchError> {
        let leaves = compute_level(&deposits, 0)?;
        let leaf_txs = deposits.iter().map(|d| d.origin.txid).collect();
        Ok(Self {
            deposits,
            status: BatchStatus::Created,
            failure_reason: None,
            batch_id: None,
            finalize_tx: None,
            deposit_tx: None,
            verify_tx: None,
            aggregation_levels: vec![leaves],
            aggregation_txs: vec![leaf_txs],
        })
    }

    pub fn deposits(&self) -> &[Deposit] {
        &self.deposits
    }

    pub fn status(&self) -> BatchStatus {
        self.status
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    pub fn height(&self) -> u32 {
        // checked on construction
        batch_height(self.deposits.len()).unwrap_or_default()
    }

    pub fn aggregation_levels(&self) -> &[Vec<CovenantState>] {
        &self.aggregation_levels
    }

    pub fn aggregation_txs(&self) -> &[Vec<Txid>] {
        &self.aggregation_txs
    }

    pub fn deposit_tx(&self) -> Option<L2TxHash> {
        self.deposit_tx
    }

    pub fn verify_tx(&self) -> Option<Txid> {
        self.verify_tx
    }

    /// The id stored when the batch was finalized. Prefer [`Self::deposit_batch_id`].
    pub fn stored_batch_id(&self) -> Option<Hash256> {
        self.batch_id
    }

    fn check_transition(&self, to: BatchStatus) -> Result<(), BatchError> {
        if self.status.next() != Some(to) {
            return Err(BatchError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        Ok(())
    }

    fn advance(&mut self, to: BatchStatus) -> Result<(), BatchError> {
        self.check_transition(to)?;
        debug!(from = ?self.status, ?to, "deposit batch transition");
        self.status = to;
        Ok(())
    }

    /// Records the transactions that put the next aggregation level on L1.
    pub fn record_aggregation_level(&mut self, txids: Vec<Txid>) -> Result<(), BatchError> {
        if self.status != BatchStatus::Created {
            return Err(BatchError::InvalidTransition {
                from: self.status,
                to: BatchStatus::Aggregated,
            });
        }

        let level = self.aggregation_levels.len() as u32;
        let states = compute_level(&self.deposits, level)?;
        if states.len() != txids.len() {
            return Err(BatchError::LevelTxCountMismatch {
                level,
                expected: states.len(),
                got: txids.len(),
            });
        }
        self.aggregation_levels.push(states);
        self.aggregation_txs.push(txids);
        Ok(())
    }

    /// Moves to `AGGREGATED` once every level up to the root is recorded.
    pub fn mark_aggregated(&mut self) -> Result<(), BatchError> {
        let need = self.height() as usize + 1;
        let have = self.aggregation_levels.len();
        if have != need {
            return Err(BatchError::IncompleteAggregation { have, need });
        }
        self.advance(BatchStatus::Aggregated)
    }

    /// Records the L1 transaction merging the batch root into the bridge.
    pub fn finalize(&mut self, txid: Txid) -> Result<(), BatchError> {
        self.check_transition(BatchStatus::Finalized)?;
        let batch_id = self.batch_id_for(&txid)?;
        self.advance(BatchStatus::Finalized)?;
        self.finalize_tx = Some(txid);
        self.batch_id = Some(batch_id);
        info!(%txid, %batch_id, "deposit batch finalized");
        Ok(())
    }

    pub fn submit_to_l2(&mut self, l2_tx: L2TxHash) -> Result<(), BatchError> {
        self.advance(BatchStatus::SubmittedToL2)?;
        self.deposit_tx = Some(l2_tx);
        Ok(())
    }

    pub fn mark_deposited(&mut self) -> Result<(), BatchError> {
        self.advance(BatchStatus::Deposited)
    }

    pub fn submit_for_completion(&mut self, txid: Txid) -> Result<(), BatchError> {
        self.advance(BatchStatus::SubmittedForCompletion)?;
        self.verify_tx = Some(txid);
        Ok(())
    }

    pub fn complete(&mut self) -> Result<(), BatchError> {
        self.advance(BatchStatus::Completed)
    }

    /// Moves a non-terminal batch to `FAILED`.
    pub fn fail(&mut self, kind: FailureKind, reason: impl Into<String>) -> Result<(), BatchError> {
        let to = BatchStatus::Failed(kind);
        if self.status.is_terminal() {
            return Err(BatchError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        let reason = reason.into();
        warn!(from = ?self.status, ?kind, %reason, "deposit batch failed");
        self.status = to;
        self.failure_reason = Some(reason);
        Ok(())
    }

    /// The L1 transaction that finalized the batch.
    pub fn finalize_l1_txid(&self) -> Result<Txid, BatchError> {
        match self.finalize_tx {
            Some(txid) if self.status.is_finalized() => Ok(txid),
            _ => Err(BatchError::NotFinalized(self.status)),
        }
    }

    /// `sha256(root_state_hash || finalize_txid)`, recomputed from the deposits on every call.
    pub fn deposit_batch_id(&self) -> Result<Hash256, BatchError> {
        self.batch_id_for(&self.finalize_l1_txid()?)
    }

    fn batch_id_for(&self, txid: &Txid) -> Result<Hash256, BatchError> {
        let root = compute_level(&self.deposits, self.height())?;
        let root_hash = root
            .first()
            .map(CovenantState::hash)
            .ok_or(BatchError::IncompleteAggregation { have: 0, need: 1 })?;

        let mut buf = [0u8; 64];
        buf[..32].copy_from_slice(root_hash.as_ref());
        buf[32..].copy_from_slice(&txid.to_byte_array());
        Ok(sha256(&buf))
    }
}
