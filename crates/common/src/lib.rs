//! Capabilities the bridge consumes from the outside world, and the shared logging setup.

pub mod logging;
mod traits;

#[cfg(any(test, feature = "test-utils"))]
pub use traits::{chain::MockChainProvider, signer::MockSigner};
pub use traits::{
    chain::{list_deposits_checked, ChainProvider, ChainProviderError},
    signer::{KeypairSigner, Signer, SignerError},
};
