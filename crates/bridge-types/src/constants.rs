//! Layout constants of the covenant outputs.

/// The size (in bytes) of a state hash.
pub const HASH_SIZE: usize = 32;

/// Length of a covenant locking script (a segwit v1 program: `OP_1 <32 bytes>`).
pub const CONTRACT_SCRIPT_LEN: usize = 34;

/// Length of the state commitment script carrying a single hash:
/// `OP_RETURN <push 32> <hash>`.
pub const ONE_STATE_OUTPUT_SCRIPT_LEN: usize = 2 + HASH_SIZE;

/// Length of the state commitment script carrying two hashes:
/// `OP_RETURN <push 64> <hash1> <hash2>`.
pub const TWO_STATE_OUTPUT_SCRIPT_LEN: usize = 2 + 2 * HASH_SIZE;

/// Number of recipients a single distribute call pays out to.
pub const DISTRIBUTE_FANOUT: usize = 4;

/// Highest subtree height that can still be paid out directly with one distribute call.
pub const MAX_LEVEL_FOR_DISTRIBUTE: u32 = 2;
