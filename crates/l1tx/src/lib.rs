//! Parsing, verification and spend construction for the covenant transactions on L1.
//!
//! Covenant transactions are never trusted as fetched: every parsed view is re-serialized from
//! its fields and must hash back to the txid it was requested under before any state committed
//! in it is used.

mod aggregator;
mod backtrace;
mod calls;
mod deposit;
mod errors;
mod expander;
mod scripts;
mod utils;

pub use aggregator::{parse_aggregator_transaction, AggregatorTransaction};
pub use backtrace::{
    backtrace_aggregator, backtrace_expander, fetch_transaction, trace_lineage, CovenantUtxo,
    TracedAggregator, TracedExpander,
};
pub use calls::{ExpanderArgs, ExpanderCall, ExpanderMethod, InputCtx};
pub use deposit::{
    deposit_data_script, extract_deposit, parse_deposit, DepositFilterConfig,
    DEPOSIT_DATA_SCRIPT_LEN,
};
pub use errors::{BacktraceError, CallError, DepositParseError, ScriptLoadError};
pub use expander::{
    parse_expander_transaction, parse_transaction, verify_continuity, ExpanderTransaction, TxShape,
};
pub use scripts::{CovenantKind, CovenantScripts, StaticCovenantScripts};
pub use utils::ContractOutput;
