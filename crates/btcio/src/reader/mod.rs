mod ctx;
mod cursor;
mod error;
mod event;
mod handle;
mod task;

pub use cursor::{ScanCursor, ScanWindow};
pub use error::IngestionError;
pub use event::L1Event;
pub use handle::{IngestionBuilder, IngestionHandle};
