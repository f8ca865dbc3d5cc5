//! Withdrawal requests coming from L2.

use std::fmt;

use arbitrary::Arbitrary;
use bitcoin::ScriptBuf;
use serde::{Deserialize, Serialize};

use crate::{amount::AmountField, hash::Hash256, CovenantState};

/// Hash of the L2 transaction that requested a withdrawal.
#[derive(
    Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Arbitrary, Serialize, Deserialize,
)]
pub struct L2TxHash(pub Hash256);

impl From<Hash256> for L2TxHash {
    fn from(value: Hash256) -> Self {
        Self(value)
    }
}

impl fmt::Display for L2TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.0)
    }
}

impl fmt::Debug for L2TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L2TxHash({})", self.0)
    }
}

/// A withdrawal to be paid out on L1.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Withdrawal {
    pub recipient_script: ScriptBuf,
    pub amount: AmountField,
    pub origin: L2TxHash,
}

impl Withdrawal {
    pub fn new(recipient_script: ScriptBuf, amount: AmountField, origin: L2TxHash) -> Self {
        Self {
            recipient_script,
            amount,
            origin,
        }
    }

    pub fn leaf_state(&self) -> CovenantState {
        CovenantState::Leaf {
            payout_script: self.recipient_script.to_bytes(),
            amount: self.amount,
        }
    }
}
