use bitcoin::Txid;
use covbridge_tree::ExpansionTree;
use covbridge_types::{CovenantState, Hash256, L2TxHash, Withdrawal, MAX_LEVEL_FOR_DISTRIBUTE};
use serde::Serialize;
use tracing::*;

use crate::{
    errors::{BatchError, FailureKind},
    status::WithdrawalStatus,
};

/// A set of withdrawals paid out together by unwinding one expander tree on L1.
#[derive(Clone, Debug, Serialize)]
pub struct WithdrawalBatch {
    id: u64,
    withdrawals: Vec<Withdrawal>,
    status: WithdrawalStatus,
    failure_reason: Option<String>,
    hash: Hash256,
    close_withdrawal_batch_tx: Option<L2TxHash>,
    withdraw_batch_tx: Option<Txid>,
    expansion_levels: Vec<Vec<CovenantState>>,
    expansion_txs: Vec<Vec<Txid>>,
    #[serde(skip)]
    plan: ExpansionTree,
}

impl WithdrawalBatch {
    pub fn new(id: u64, withdrawals: Vec<Withdrawal>) -> Result<Self, BatchError> {
        let plan = ExpansionTree::build(&withdrawals)?;
        Ok(Self {
            id,
            withdrawals,
            status: WithdrawalStatus::Pending,
            failure_reason: None,
            hash: plan.root_hash(),
            close_withdrawal_batch_tx: None,
            withdraw_batch_tx: None,
            expansion_levels: Vec::new(),
            expansion_txs: Vec::new(),
            plan,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn withdrawals(&self) -> &[Withdrawal] {
        &self.withdrawals
    }

    pub fn status(&self) -> WithdrawalStatus {
        self.status
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    /// Root state hash the L2 bridge closed the batch with.
    pub fn hash(&self) -> Hash256 {
        self.hash
    }

    pub fn plan(&self) -> &ExpansionTree {
        &self.plan
    }

    pub fn expansion_levels(&self) -> &[Vec<CovenantState>] {
        &self.expansion_levels
    }

    pub fn expansion_txs(&self) -> &[Vec<Txid>] {
        &self.expansion_txs
    }

    pub fn withdraw_batch_tx(&self) -> Option<Txid> {
        self.withdraw_batch_tx
    }

    fn advance(&mut self, to: WithdrawalStatus) -> Result<(), BatchError> {
        if self.status.next() != Some(to) {
            return Err(BatchError::InvalidWithdrawalTransition {
                from: self.status,
                to,
            });
        }
        debug!(id = self.id, from = ?self.status, ?to, "withdrawal batch transition");
        self.status = to;
        Ok(())
    }

    pub fn close(&mut self, l2_tx: L2TxHash) -> Result<(), BatchError> {
        self.advance(WithdrawalStatus::Closed)?;
        self.close_withdrawal_batch_tx = Some(l2_tx);
        Ok(())
    }

    /// Records the batch creation transaction funding the root expander.
    pub fn create(&mut self, txid: Txid) -> Result<(), BatchError> {
        self.advance(WithdrawalStatus::Created)?;
        self.withdraw_batch_tx = Some(txid);
        self.expansion_levels.push(vec![self.plan.root().clone()]);
        self.expansion_txs.push(vec![txid]);
        info!(id = self.id, %txid, root = %self.hash, "withdrawal batch created");
        Ok(())
    }

    /// Records the states observed on L1 at the next depth, checked against the plan.
    pub fn record_expansion_level(
        &mut self,
        states: Vec<CovenantState>,
        txids: Vec<Txid>,
    ) -> Result<(), BatchError> {
        if !matches!(
            self.status,
            WithdrawalStatus::Created | WithdrawalStatus::Expanding
        ) {
            return Err(BatchError::InvalidWithdrawalTransition {
                from: self.status,
                to: WithdrawalStatus::Expanding,
            });
        }

        let depth = self.expansion_levels.len() as u32;
        let expected = self.plan.depth(depth)?;
        if states.as_slice() != expected {
            return Err(BatchError::ExpansionMismatch(depth));
        }
        if txids.len() != states.len() {
            return Err(BatchError::LevelTxCountMismatch {
                level: depth,
                expected: states.len(),
                got: txids.len(),
            });
        }

        if self.status == WithdrawalStatus::Created {
            self.advance(WithdrawalStatus::Expanding)?;
        }
        self.expansion_levels.push(states);
        self.expansion_txs.push(txids);

        if depth == self.plan.height() {
            self.advance(WithdrawalStatus::Expanded)?;
        }
        Ok(())
    }

    /// Marks the batch paid out once the remaining subtrees are shallow enough to distribute.
    pub fn mark_expanded(&mut self) -> Result<(), BatchError> {
        let reached = self.expansion_levels.len().saturating_sub(1) as u32;
        let needed = self.plan.height().saturating_sub(MAX_LEVEL_FOR_DISTRIBUTE);
        if self.expansion_levels.is_empty() || reached < needed {
            return Err(BatchError::InvalidWithdrawalTransition {
                from: self.status,
                to: WithdrawalStatus::Expanded,
            });
        }
        if self.status == WithdrawalStatus::Created {
            self.advance(WithdrawalStatus::Expanding)?;
        }
        self.advance(WithdrawalStatus::Expanded)
    }

    pub fn fail(&mut self, kind: FailureKind, reason: impl Into<String>) -> Result<(), BatchError> {
        let to = WithdrawalStatus::Failed(kind);
        if self.status.is_terminal() {
            return Err(BatchError::InvalidWithdrawalTransition {
                from: self.status,
                to,
            });
        }
        let reason = reason.into();
        warn!(id = self.id, from = ?self.status, ?kind, %reason, "withdrawal batch failed");
        self.status = to;
        self.failure_reason = Some(reason);
        Ok(())
    }
}
