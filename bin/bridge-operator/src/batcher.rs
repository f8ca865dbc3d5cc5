use covbridge_batch::{BatchError, DepositBatch};
use covbridge_tree::{batch_height, AggregationTree, TreeError};
use covbridge_types::Deposit;
use tracing::*;

/// Groups incoming deposits into fixed-size batches in arrival order.
#[derive(Debug)]
pub(crate) struct DepositBatcher {
    batch_size: usize,
    pending: Vec<Deposit>,
}

impl DepositBatcher {
    /// `batch_size` must be a power of two.
    pub(crate) fn new(batch_size: usize) -> Result<Self, TreeError> {
        batch_height(batch_size)?;
        Ok(Self {
            batch_size,
            pending: Vec::new(),
        })
    }

    pub(crate) fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Queues `deposits` and opens a batch for every full group.
    pub(crate) fn push(&mut self, deposits: Vec<Deposit>) -> Result<Vec<DepositBatch>, BatchError> {
        self.pending.extend(deposits);

        let mut batches = Vec::new();
        while self.pending.len() >= self.batch_size {
            let group: Vec<_> = self.pending.drain(..self.batch_size).collect();
            batches.push(DepositBatch::new(group)?);
        }
        Ok(batches)
    }
}

/// Logs the aggregation plan of a freshly opened batch.
pub(crate) fn log_aggregation_plan(batch: &DepositBatch) -> Result<(), TreeError> {
    let tree = AggregationTree::build(batch.deposits())?;
    let total = tree.root().total_amount()?;
    info!(
        deposits = batch.deposits().len(),
        height = tree.height(),
        root = %tree.root_hash(),
        total = total.get(),
        "opened deposit batch"
    );
    for level in 1..=tree.height() {
        let hashes = tree.level_hashes(level)?;
        debug!(%level, count = hashes.len(), ?hashes, "aggregation level");
    }
    Ok(())
}
