//! Fixtures spanning several crates.

mod withdrawal_chain;

pub use withdrawal_chain::{WithdrawalChain, BRIDGE_AMOUNT};
