//! Bottom-up aggregation of deposits.

use std::mem;

use covbridge_types::{CovenantState, Deposit, Hash256};
use serde::{Deserialize, Serialize};

use crate::errors::TreeError;

/// Height of the tree over `len` entries, which must be a power of two.
pub fn batch_height(len: usize) -> Result<u32, TreeError> {
    if !len.is_power_of_two() {
        return Err(TreeError::InvalidBatchShape(len));
    }
    Ok(len.trailing_zeros())
}

/// Pairs up adjacent states into their parents.
///
/// An odd-length level can only come from a broken batch, so it is reported instead of being
/// padded.
pub(crate) fn combine_level(prev: &[CovenantState]) -> Result<Vec<CovenantState>, TreeError> {
    if prev.len() % 2 != 0 {
        return Err(TreeError::InvalidBatchShape(prev.len()));
    }
    prev.chunks_exact(2)
        .map(|pair| CovenantState::internal(&pair[0], &pair[1]).map_err(TreeError::from))
        .collect()
}

/// Builds every level from `leaves` up to and including `up_to`, bottom first.
pub(crate) fn build_levels(
    leaves: Vec<CovenantState>,
    up_to: u32,
) -> Result<Vec<Vec<CovenantState>>, TreeError> {
    let mut levels = Vec::with_capacity(up_to as usize + 1);
    let mut current = leaves;
    for _ in 0..up_to {
        let next = combine_level(&current)?;
        levels.push(mem::replace(&mut current, next));
    }
    levels.push(current);
    Ok(levels)
}

/// Checks that bottom-first `levels` are exactly what [`build_levels`] yields from their leaves.
pub(crate) fn check_levels(levels: &[Vec<CovenantState>]) -> Result<(), TreeError> {
    let leaves = levels.first().ok_or(TreeError::InvalidBatchShape(0))?;
    if !leaves.iter().all(CovenantState::is_leaf) {
        return Err(TreeError::MalformedLevels);
    }
    let height = batch_height(leaves.len())?;
    if build_levels(leaves.clone(), height)?.as_slice() != levels {
        return Err(TreeError::MalformedLevels);
    }
    Ok(())
}

/// Serialized form of a tree, checked before it becomes one.
#[derive(Deserialize)]
pub(crate) struct TreeLevels {
    pub(crate) levels: Vec<Vec<CovenantState>>,
}

/// States of the deposit batch at `level`, where level 0 is one leaf per deposit.
pub fn compute_level(deposits: &[Deposit], level: u32) -> Result<Vec<CovenantState>, TreeError> {
    let height = batch_height(deposits.len())?;
    if level > height {
        return Err(TreeError::LevelOutOfRange { level, height });
    }

    let mut states: Vec<CovenantState> = deposits.iter().map(Deposit::leaf_state).collect();
    for _ in 0..level {
        states = combine_level(&states)?;
    }
    Ok(states)
}

/// Every level of a deposit batch's aggregation tree.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TreeLevels")]
pub struct AggregationTree {
    levels: Vec<Vec<CovenantState>>,
}

impl TryFrom<TreeLevels> for AggregationTree {
    type Error = TreeError;

    fn try_from(raw: TreeLevels) -> Result<Self, Self::Error> {
        check_levels(&raw.levels)?;
        Ok(Self { levels: raw.levels })
    }
}

impl AggregationTree {
    pub fn build(deposits: &[Deposit]) -> Result<Self, TreeError> {
        let height = batch_height(deposits.len())?;
        let leaves = deposits.iter().map(Deposit::leaf_state).collect();
        let levels = build_levels(leaves, height)?;
        Ok(Self { levels })
    }

    pub fn height(&self) -> u32 {
        (self.levels.len() - 1) as u32
    }

    pub fn levels(&self) -> &[Vec<CovenantState>] {
        &self.levels
    }

    pub fn level(&self, level: u32) -> Result<&[CovenantState], TreeError> {
        self.levels
            .get(level as usize)
            .map(Vec::as_slice)
            .ok_or(TreeError::LevelOutOfRange {
                level,
                height: self.height(),
            })
    }

    pub fn level_hashes(&self, level: u32) -> Result<Vec<Hash256>, TreeError> {
        Ok(self.level(level)?.iter().map(CovenantState::hash).collect())
    }

    pub fn root(&self) -> &CovenantState {
        &self.levels[self.levels.len() - 1][0]
    }

    pub fn root_hash(&self) -> Hash256 {
        self.root().hash()
    }
}
