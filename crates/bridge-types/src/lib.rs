//! Covenant state model and the canonical encodings shared by every bridge component.
//!
//! This crate is the state codec: it maps the logical state of a covenant to the bytes the
//! on-chain scripts commit to, and defines the deposit/withdrawal records that feed the trees.

mod amount;
mod commitment;
mod constants;
mod covenant;
mod deposit;
mod errors;
mod hash;
mod withdrawal;

pub use amount::{encode_amount, AmountField, MAX_AMOUNT};
pub use commitment::{
    build_contract_output, build_state_commitment_output, split_state_hashes,
    state_commitment_script, StateHashes,
};
pub use constants::*;
pub use covenant::{hash_internal, hash_leaf, hash_state, CovenantState};
pub use deposit::{Deposit, L1TxRef, L2Address};
pub use errors::StateError;
pub use hash::{sha256, sha256d, Hash256};
pub use withdrawal::{L2TxHash, Withdrawal};
