//! Deposit records observed on L1.

use std::{fmt, str::FromStr};

use arbitrary::Arbitrary;
use bitcoin::Txid;
use serde::{Deserialize, Serialize};

use crate::{amount::AmountField, constants::HASH_SIZE, errors::StateError, CovenantState};

/// A 32-byte L2 account address.
///
/// Parsed from a hex string with an optional `0x` prefix and at most 64 digits; shorter inputs
/// are left-padded with zeros.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Arbitrary, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct L2Address([u8; HASH_SIZE]);

impl L2Address {
    pub const fn new(bytes: [u8; HASH_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn parse(s: &str) -> Result<Self, StateError> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        if digits.len() > 2 * HASH_SIZE {
            return Err(StateError::InvalidL2Address(s.to_owned()));
        }
        let padded = format!("{digits:0>64}");
        let mut bytes = [0u8; HASH_SIZE];
        hex::decode_to_slice(&padded, &mut bytes)
            .map_err(|_| StateError::InvalidL2Address(s.to_owned()))?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    /// Normalized 64-digit hex form, without prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl FromStr for L2Address {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for L2Address {
    type Error = StateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<L2Address> for String {
    fn from(value: L2Address) -> Self {
        value.to_hex()
    }
}

impl fmt::Display for L2Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl fmt::Debug for L2Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L2Address({self})")
    }
}

/// Where on L1 a deposit was observed.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct L1TxRef {
    pub txid: Txid,
    pub vout: u32,
    pub block_height: u64,
}

impl L1TxRef {
    pub fn new(txid: Txid, vout: u32, block_height: u64) -> Self {
        Self {
            txid,
            vout,
            block_height,
        }
    }
}

/// A confirmed deposit waiting to be batched.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Deposit {
    pub recipient: L2Address,
    pub amount: AmountField,
    pub origin: L1TxRef,
}

impl Deposit {
    pub fn new(recipient: L2Address, amount: AmountField, origin: L1TxRef) -> Self {
        Self {
            recipient,
            amount,
            origin,
        }
    }

    /// Leaf state this deposit occupies at level 0 of an aggregation tree.
    pub fn leaf_state(&self) -> CovenantState {
        CovenantState::Leaf {
            payout_script: self.recipient.as_bytes().to_vec(),
            amount: self.amount,
        }
    }
}
