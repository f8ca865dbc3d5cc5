use bitcoin::Txid;
use covbridge_common::{ChainProviderError, SignerError};
use covbridge_types::{Hash256, StateError};
use thiserror::Error;

use crate::scripts::CovenantKind;

/// Errors raised while reconstructing covenant state from L1 transactions.
#[derive(Debug, Error)]
pub enum BacktraceError {
    /// The transaction does not follow any covenant output layout.
    #[error("unsupported transaction shape: {0}")]
    UnsupportedTransactionShape(&'static str),

    /// The raw bytes are not a valid transaction.
    #[error("failed to decode transaction: {0}")]
    Decode(String),

    /// The re-serialized transaction does not hash to the txid it was fetched under.
    #[error("txid mismatch: expected {expected}, computed {computed}")]
    TxidMismatch { expected: Txid, computed: Txid },

    /// The utxo is not locked by the expected covenant.
    #[error("utxo {vout} is not locked by the {kind} covenant")]
    ScriptMismatch { kind: CovenantKind, vout: u32 },

    /// The state claimed for a utxo is not the one committed on chain.
    #[error("state hash mismatch: committed {committed}, claimed {claimed}")]
    StateHashMismatch { committed: Hash256, claimed: Hash256 },

    /// The utxo value differs from the state's total.
    #[error("amount mismatch: output holds {output}, state claims {claimed}")]
    AmountMismatch { output: u64, claimed: u64 },

    /// No covenant output exists at the requested index.
    #[error("no covenant output at index {0}")]
    MissingOutput(u32),

    /// The history did not reach a batch creation within the hop limit.
    #[error("lineage longer than {0} hops")]
    LineageTooLong(usize),

    #[error("state: {0}")]
    State(#[from] StateError),

    #[error("chain: {0}")]
    Chain(#[from] ChainProviderError),
}

impl BacktraceError {
    /// Whether repeating the same backtrace may succeed.
    ///
    /// Only transient chain failures qualify. A txid mismatch in particular means the provider
    /// served a different transaction and is never retried.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Chain(e) if e.is_transient())
    }
}

/// Errors raised while building covenant call arguments.
#[derive(Debug, Error)]
pub enum CallError {
    #[error("expected {expected} distribution targets, got {got}")]
    WrongFanout { expected: usize, got: usize },

    #[error("subtree of height {0} is too tall to distribute directly")]
    NotDistributable(u32),

    #[error("leaf state cannot be expanded")]
    LeafNotExpandable,

    #[error("distribution pays {paid} but the covenant holds {held}")]
    AmountMismatch { paid: u64, held: u64 },

    #[error("no sighash preimage for input {0}")]
    MissingPreimage(usize),

    #[error("signer: {0}")]
    Signer(#[from] SignerError),

    #[error("state: {0}")]
    State(#[from] StateError),
}

/// Reasons a transaction is not recognized as a deposit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DepositParseError {
    #[error("not an aggregator leaf transaction")]
    NotAggregatorTx,

    #[error("contract output is not locked by the deposit aggregator")]
    WrongAggregatorScript,

    #[error("missing deposit data output")]
    MissingDepositData,

    #[error("malformed deposit data output")]
    MalformedDepositData,

    #[error("magic bytes mismatch")]
    MagicMismatch,

    #[error("committed leaf hash does not match recipient and amount")]
    LeafHashMismatch,

    #[error("state: {0}")]
    State(#[from] StateError),
}

/// Errors loading precompiled covenant scripts.
#[derive(Debug, Error)]
pub enum ScriptLoadError {
    #[error("invalid hex for {kind} script: {source}")]
    Hex {
        kind: CovenantKind,
        source: hex::FromHexError,
    },

    #[error("{kind} script must be 34 bytes, got {len}")]
    Length { kind: CovenantKind, len: usize },
}
