//! Aggregation and expansion trees over covenant states.
//!
//! Both trees are kept as flat per-level arrays. Aggregation levels are indexed bottom-up (level 0
//! holds the leaves), expansion levels top-down (depth 0 holds the root), matching the order in
//! which each side materializes them on chain.

mod aggregation;
mod errors;
mod expansion;

pub use aggregation::{batch_height, compute_level, AggregationTree};
pub use errors::TreeError;
pub use expansion::ExpansionTree;
