//! Deterministic fixtures shared by the bridge crates' tests.

mod arbitrary_generator;
mod chain;
mod fixtures;
mod keys;
mod scripts;
mod tx;

pub use arbitrary_generator::ArbitraryGenerator;
pub use chain::InMemoryChainProvider;
pub use fixtures::{gen_deposits, gen_withdrawals, test_l2_address};
pub use keys::{test_signer, TEST_SECRET};
pub use scripts::{
    aggregator_script, bridge_script, expander_script, payout_script, test_covenant_scripts,
};
pub use tx::{
    batch_creation_tx, covenant_tx, deposit_tx, single_output_tx, test_outpoint, two_children_tx,
    with_change, TEST_MAGIC,
};
