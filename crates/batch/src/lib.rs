//! Lifecycle of deposit and withdrawal batches.
//!
//! Batches only ever move forward through their stages, one stage at a time, and may drop into
//! a terminal failed state from anywhere before completion. Every derived value (batch id, root
//! hash) is recomputed from the batch contents rather than trusted from storage.

mod deposit;
mod errors;
mod status;
mod withdrawal;

pub use deposit::DepositBatch;
pub use errors::{BatchError, FailureKind};
pub use status::{BatchStatus, WithdrawalStatus};
pub use withdrawal::WithdrawalBatch;
