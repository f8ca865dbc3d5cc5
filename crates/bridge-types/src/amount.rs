//! Amount field shared by every covenant state.
//!
//! The covenant VM does its arithmetic on 32-bit signed script numbers, so amounts are capped at
//! `i32::MAX` even though they occupy an 8-byte slot on the wire.

use std::io::{self, Read};

use arbitrary::{Arbitrary, Unstructured};
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::errors::StateError;

/// Largest amount the covenants can represent.
pub const MAX_AMOUNT: u64 = 0x7fff_ffff;

/// An amount already checked against [`MAX_AMOUNT`].
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    BorshSerialize,
    Serialize,
    Deserialize,
)]
#[serde(try_from = "u64", into = "u64")]
pub struct AmountField(u64);

impl AmountField {
    pub const ZERO: AmountField = AmountField(0);

    pub fn try_new(amount: u64) -> Result<Self, StateError> {
        if amount > MAX_AMOUNT {
            return Err(StateError::AmountOutOfRange(amount));
        }
        Ok(Self(amount))
    }

    pub fn get(&self) -> u64 {
        self.0
    }

    /// Sum of two amounts, failing when the total leaves the representable range.
    pub fn checked_add(self, other: AmountField) -> Result<Self, StateError> {
        let sum = self
            .0
            .checked_add(other.0)
            .ok_or(StateError::AmountOverflow(self.0, other.0))?;
        Self::try_new(sum)
    }

    pub fn to_bytes(self) -> [u8; 8] {
        self.0.to_le_bytes()
    }
}

impl<'a> Arbitrary<'a> for AmountField {
    fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
        Ok(Self(u.int_in_range(0..=MAX_AMOUNT)?))
    }
}

impl BorshDeserialize for AmountField {
    fn deserialize_reader<R: Read>(reader: &mut R) -> io::Result<Self> {
        let raw = u64::deserialize_reader(reader)?;
        Self::try_new(raw).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
    }
}

impl TryFrom<u64> for AmountField {
    type Error = StateError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::try_new(value)
    }
}

impl From<AmountField> for u64 {
    fn from(value: AmountField) -> Self {
        value.0
    }
}

/// Encodes `amount` as the 8-byte field the covenants read.
///
/// The covenant serializes the minimal script number and right-pads it with zeros. For values
/// in range that is exactly the little-endian `u64` layout.
pub fn encode_amount(amount: u64) -> Result<[u8; 8], StateError> {
    AmountField::try_new(amount).map(AmountField::to_bytes)
}
