use covbridge_l1tx::BacktraceError;
use covbridge_tree::TreeError;
use covbridge_types::StateError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::status::{BatchStatus, WithdrawalStatus};

/// Category of the error that moved a batch to its failed state.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    Range,
    InvalidBatchShape,
    LevelOutOfRange,
    NotFinalized,
    TxidMismatch,
    TransientChain,
    UnsupportedTransactionShape,
    Other,
}

impl From<&StateError> for FailureKind {
    fn from(err: &StateError) -> Self {
        match err {
            StateError::AmountOutOfRange(_) | StateError::AmountOverflow(..) => Self::Range,
            _ => Self::Other,
        }
    }
}

impl From<&TreeError> for FailureKind {
    fn from(err: &TreeError) -> Self {
        match err {
            TreeError::InvalidBatchShape(_) => Self::InvalidBatchShape,
            TreeError::LevelOutOfRange { .. } => Self::LevelOutOfRange,
            TreeError::State(e) => e.into(),
            _ => Self::Other,
        }
    }
}

impl From<&BacktraceError> for FailureKind {
    fn from(err: &BacktraceError) -> Self {
        match err {
            BacktraceError::TxidMismatch { .. } => Self::TxidMismatch,
            BacktraceError::UnsupportedTransactionShape(_) | BacktraceError::Decode(_) => {
                Self::UnsupportedTransactionShape
            }
            BacktraceError::State(e) => e.into(),
            e if e.is_recoverable() => Self::TransientChain,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("invalid transition {from:?} -> {to:?}")]
    InvalidTransition { from: BatchStatus, to: BatchStatus },

    #[error("invalid transition {from:?} -> {to:?}")]
    InvalidWithdrawalTransition {
        from: WithdrawalStatus,
        to: WithdrawalStatus,
    },

    #[error("batch not finalized (status {0:?})")]
    NotFinalized(BatchStatus),

    #[error("aggregation incomplete: {have} of {need} levels")]
    IncompleteAggregation { have: usize, need: usize },

    #[error("level {level} has {expected} states but {got} transactions")]
    LevelTxCountMismatch {
        level: u32,
        expected: usize,
        got: usize,
    },

    #[error("expansion at depth {0} does not match the batch plan")]
    ExpansionMismatch(u32),

    #[error("tree: {0}")]
    Tree(#[from] TreeError),
}

impl BatchError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::NotFinalized(_) => FailureKind::NotFinalized,
            Self::Tree(e) => e.into(),
            _ => FailureKind::Other,
        }
    }
}
