//! Errors raised while encoding covenant state.

use thiserror::Error;

use crate::amount::MAX_AMOUNT;

/// Failures of the state codec. All of them are local precondition failures and are never
/// worth retrying.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// The amount cannot be represented by the covenant VM's 32-bit signed arithmetic.
    #[error("amount {0} outside representable range [0, {MAX_AMOUNT:#x}]")]
    AmountOutOfRange(u64),

    /// Summing two subtree amounts overflowed.
    #[error("amount overflow adding {0} and {1}")]
    AmountOverflow(u64, u64),

    /// A hash argument did not have the expected byte length.
    #[error("invalid {which} length: expected 32 bytes, got {len}")]
    InvalidHashLength { which: &'static str, len: usize },

    /// A covenant locking script did not have the expected byte length.
    #[error("invalid contract script length: expected 34 bytes, got {0}")]
    InvalidScriptLength(usize),

    /// The script is not a state commitment script.
    #[error("malformed state commitment script: {0}")]
    MalformedStateOutput(&'static str),

    /// The L2 address is not a hex string of at most 32 bytes.
    #[error("invalid l2 address {0:?}")]
    InvalidL2Address(String),
}
