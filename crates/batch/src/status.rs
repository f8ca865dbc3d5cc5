use serde::{Deserialize, Serialize};

use crate::errors::FailureKind;

/// Stage of a deposit batch.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchStatus {
    /// Deposits collected, aggregation not started.
    Created,
    /// Every aggregation level is on L1.
    Aggregated,
    /// Root merged into the bridge covenant.
    Finalized,
    /// Deposit batch submitted to the L2 bridge contract.
    SubmittedToL2,
    /// L2 credited the recipients.
    Deposited,
    /// L1 completion transaction sent.
    SubmittedForCompletion,
    Completed,
    Failed(FailureKind),
}

impl BatchStatus {
    /// The only stage this one may advance to, failure aside.
    pub fn next(&self) -> Option<BatchStatus> {
        use BatchStatus::*;
        match self {
            Created => Some(Aggregated),
            Aggregated => Some(Finalized),
            Finalized => Some(SubmittedToL2),
            SubmittedToL2 => Some(Deposited),
            Deposited => Some(SubmittedForCompletion),
            SubmittedForCompletion => Some(Completed),
            Completed | Failed(_) => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed(_))
    }

    /// Whether the finalize transaction exists.
    pub fn is_finalized(&self) -> bool {
        matches!(
            self,
            Self::Finalized
                | Self::SubmittedToL2
                | Self::Deposited
                | Self::SubmittedForCompletion
                | Self::Completed
        )
    }
}

/// Stage of a withdrawal batch.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WithdrawalStatus {
    /// Collecting withdrawals on L2.
    Pending,
    /// Closed on L2, no more withdrawals accepted.
    Closed,
    /// Root expander funded on L1.
    Created,
    Expanding,
    /// Every withdrawal paid out.
    Expanded,
    Failed(FailureKind),
}

impl WithdrawalStatus {
    pub fn next(&self) -> Option<WithdrawalStatus> {
        use WithdrawalStatus::*;
        match self {
            Pending => Some(Closed),
            Closed => Some(Created),
            Created => Some(Expanding),
            Expanding => Some(Expanded),
            Expanded | Failed(_) => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Expanded | Self::Failed(_))
    }
}
