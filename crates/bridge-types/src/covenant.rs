//! Logical covenant state and its canonical hashing.

use arbitrary::Arbitrary;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::{
    amount::{encode_amount, AmountField},
    errors::StateError,
    hash::{sha256, Hash256},
};

/// State held by an aggregator or expander covenant.
///
/// Leaves sit at height 0 and carry a payout. Internal nodes only carry the totals and hashes of
/// their two children, so a whole subtree is summarized by the root's hash.
#[derive(
    Clone,
    Debug,
    Eq,
    PartialEq,
    Hash,
    Arbitrary,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CovenantState {
    Leaf {
        /// L2 recipient on the deposit side, L1 payout script on the withdrawal side.
        #[serde(with = "hex::serde")]
        payout_script: Vec<u8>,
        amount: AmountField,
    },
    Internal {
        left_amount: AmountField,
        right_amount: AmountField,
        left_child_hash: Hash256,
        right_child_hash: Hash256,
    },
}

impl CovenantState {
    pub fn leaf(payout_script: impl Into<Vec<u8>>, amount: u64) -> Result<Self, StateError> {
        Ok(Self::Leaf {
            payout_script: payout_script.into(),
            amount: AmountField::try_new(amount)?,
        })
    }

    /// The filler leaf used to pad withdrawal sets and distributions.
    pub fn empty() -> Self {
        Self::Leaf {
            payout_script: Vec::new(),
            amount: AmountField::ZERO,
        }
    }

    /// Combines two sibling states into their parent.
    pub fn internal(left: &CovenantState, right: &CovenantState) -> Result<Self, StateError> {
        let left_amount = left.total_amount()?;
        let right_amount = right.total_amount()?;
        // the parent total must stay representable too
        left_amount.checked_add(right_amount)?;
        Ok(Self::Internal {
            left_amount,
            right_amount,
            left_child_hash: left.hash(),
            right_child_hash: right.hash(),
        })
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf { .. })
    }

    pub fn is_empty_leaf(&self) -> bool {
        matches!(
            self,
            Self::Leaf { payout_script, amount } if payout_script.is_empty() && amount.get() == 0
        )
    }

    /// Total value locked under this state.
    pub fn total_amount(&self) -> Result<AmountField, StateError> {
        match self {
            Self::Leaf { amount, .. } => Ok(*amount),
            Self::Internal {
                left_amount,
                right_amount,
                ..
            } => left_amount.checked_add(*right_amount),
        }
    }

    /// Canonical byte encoding the covenant hashes.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Self::Leaf {
                payout_script,
                amount,
            } => {
                let mut buf = Vec::with_capacity(payout_script.len() + 8);
                buf.extend_from_slice(payout_script);
                buf.extend_from_slice(&amount.to_bytes());
                buf
            }
            Self::Internal {
                left_amount,
                right_amount,
                left_child_hash,
                right_child_hash,
            } => {
                let mut buf = Vec::with_capacity(2 * (8 + 32));
                buf.extend_from_slice(&left_amount.to_bytes());
                buf.extend_from_slice(left_child_hash.as_ref());
                buf.extend_from_slice(&right_amount.to_bytes());
                buf.extend_from_slice(right_child_hash.as_ref());
                buf
            }
        }
    }

    pub fn hash(&self) -> Hash256 {
        sha256(&self.encode())
    }
}

/// `sha256(payout_script || amount)`.
pub fn hash_leaf(payout_script: &[u8], amount: u64) -> Result<Hash256, StateError> {
    let mut buf = Vec::with_capacity(payout_script.len() + 8);
    buf.extend_from_slice(payout_script);
    buf.extend_from_slice(&encode_amount(amount)?);
    Ok(sha256(&buf))
}

/// `sha256(left_amount || left_hash || right_amount || right_hash)`.
pub fn hash_internal(
    left_amount: u64,
    left_hash: &Hash256,
    right_amount: u64,
    right_hash: &Hash256,
) -> Result<Hash256, StateError> {
    let mut buf = Vec::with_capacity(2 * (8 + 32));
    buf.extend_from_slice(&encode_amount(left_amount)?);
    buf.extend_from_slice(left_hash.as_ref());
    buf.extend_from_slice(&encode_amount(right_amount)?);
    buf.extend_from_slice(right_hash.as_ref());
    Ok(sha256(&buf))
}

pub fn hash_state(state: &CovenantState) -> Hash256 {
    state.hash()
}
