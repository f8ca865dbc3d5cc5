//! Top-down expansion plan of a withdrawal batch.

use std::array;

use covbridge_types::{
    CovenantState, Hash256, Withdrawal, DISTRIBUTE_FANOUT, MAX_LEVEL_FOR_DISTRIBUTE,
};
use serde::{Deserialize, Serialize};

use crate::{
    aggregation::{batch_height, build_levels, check_levels, TreeLevels},
    errors::TreeError,
};

/// The full tree a withdrawal batch unwinds through, indexed by depth (root at depth 0).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TreeLevels")]
pub struct ExpansionTree {
    levels: Vec<Vec<CovenantState>>,
}

impl TryFrom<TreeLevels> for ExpansionTree {
    type Error = TreeError;

    fn try_from(raw: TreeLevels) -> Result<Self, Self::Error> {
        let mut levels = raw.levels;
        levels.reverse();
        check_levels(&levels)?;
        levels.reverse();
        Ok(Self { levels })
    }
}

impl ExpansionTree {
    /// Builds the plan, padding the withdrawal set with empty leaves up to a power of two.
    pub fn build(withdrawals: &[Withdrawal]) -> Result<Self, TreeError> {
        let leaves = withdrawals.iter().map(Withdrawal::leaf_state).collect();
        Self::from_leaves(leaves)
    }

    pub fn from_leaves(mut leaves: Vec<CovenantState>) -> Result<Self, TreeError> {
        if leaves.is_empty() {
            return Err(TreeError::InvalidBatchShape(0));
        }
        leaves.resize(leaves.len().next_power_of_two(), CovenantState::empty());

        let height = batch_height(leaves.len())?;
        let mut levels = build_levels(leaves, height)?;
        levels.reverse();
        Ok(Self { levels })
    }

    pub fn height(&self) -> u32 {
        (self.levels.len() - 1) as u32
    }

    pub fn root(&self) -> &CovenantState {
        &self.levels[0][0]
    }

    pub fn root_hash(&self) -> Hash256 {
        self.root().hash()
    }

    pub fn levels(&self) -> &[Vec<CovenantState>] {
        &self.levels
    }

    pub fn depth(&self, depth: u32) -> Result<&[CovenantState], TreeError> {
        self.levels
            .get(depth as usize)
            .map(Vec::as_slice)
            .ok_or(TreeError::LevelOutOfRange {
                level: depth,
                height: self.height(),
            })
    }

    pub fn node(&self, depth: u32, index: usize) -> Result<&CovenantState, TreeError> {
        self.depth(depth)?
            .get(index)
            .ok_or(TreeError::NodeOutOfRange { depth, index })
    }

    /// Height of the subtrees rooted at `depth`.
    pub fn subtree_height(&self, depth: u32) -> u32 {
        self.height().saturating_sub(depth)
    }

    /// The two children an internal node expands into, checked against its commitment.
    pub fn children(
        &self,
        depth: u32,
        index: usize,
    ) -> Result<(&CovenantState, &CovenantState), TreeError> {
        let parent = self.node(depth, index)?;
        let CovenantState::Internal {
            left_child_hash,
            right_child_hash,
            ..
        } = parent
        else {
            return Err(TreeError::LeafNode { depth, index });
        };

        let left = self.node(depth + 1, 2 * index)?;
        let right = self.node(depth + 1, 2 * index + 1)?;
        if left.hash() != *left_child_hash || right.hash() != *right_child_hash {
            return Err(TreeError::ChildHashMismatch { depth, index });
        }
        Ok((left, right))
    }

    /// The four leaves a distribute call pays out for the node at `(depth, index)`.
    ///
    /// Only nodes whose subtree height is at most [`MAX_LEVEL_FOR_DISTRIBUTE`] qualify; smaller
    /// subtrees are padded with empty leaves.
    pub fn distribution_targets(
        &self,
        depth: u32,
        index: usize,
    ) -> Result<[CovenantState; DISTRIBUTE_FANOUT], TreeError> {
        self.node(depth, index)?;
        let sub_height = self.subtree_height(depth);
        if sub_height > MAX_LEVEL_FOR_DISTRIBUTE {
            return Err(TreeError::NotDistributable(sub_height));
        }

        let leaves = self.depth(self.height())?;
        let start = index << sub_height;
        let end = (index + 1) << sub_height;
        let mut targets: [CovenantState; DISTRIBUTE_FANOUT] =
            array::from_fn(|_| CovenantState::empty());
        for (slot, leaf) in targets.iter_mut().zip(&leaves[start..end]) {
            *slot = leaf.clone();
        }
        Ok(targets)
    }
}
