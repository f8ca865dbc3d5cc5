use covbridge_types::StateError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("invalid batch shape: {0} entries is not a power of two")]
    InvalidBatchShape(usize),

    #[error("level {level} out of range for tree of height {height}")]
    LevelOutOfRange { level: u32, height: u32 },

    #[error("no node at depth {depth} index {index}")]
    NodeOutOfRange { depth: u32, index: usize },

    #[error("node at depth {depth} index {index} is a leaf")]
    LeafNode { depth: u32, index: usize },

    #[error("subtree of height {0} is too tall to distribute directly")]
    NotDistributable(u32),

    #[error("children of depth {depth} index {index} do not match the parent commitment")]
    ChildHashMismatch { depth: u32, index: usize },

    #[error("tree levels do not rebuild from their leaves")]
    MalformedLevels,

    #[error("state: {0}")]
    State(#[from] StateError),
}
