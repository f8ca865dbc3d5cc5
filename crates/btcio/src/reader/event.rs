use covbridge_types::Deposit;

/// Events emitted by the ingestion task, in chain order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum L1Event {
    /// The tip moved to a height different from the last one reported.
    BlockHeight(u64),

    /// Deposits confirmed in the window scanned after the last height event.
    Deposits(Vec<Deposit>),
}
