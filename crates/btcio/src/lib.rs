//! L1 input/output: the polling ingestion pipeline and the bitcoind chain adapter.

mod bitcoind;
pub mod reader;

pub use bitcoind::BitcoindChainProvider;
pub use reader::{
    IngestionBuilder, IngestionError, IngestionHandle, L1Event, ScanCursor, ScanWindow,
};
