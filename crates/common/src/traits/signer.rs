use std::fmt;

use bitcoin::{Address, Network};
use secp256k1::{schnorr, Keypair, Message, SecretKey, XOnlyPublicKey, SECP256K1};
use thiserror::Error;

/// Operator key used to authorize covenant spends.
///
/// Signing is synchronous and only invoked once the sighash preimage of the input being spent
/// is known.
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
pub trait Signer: Send + Sync {
    fn public_key(&self) -> XOnlyPublicKey;

    /// Key-path taproot address of the operator key.
    fn address(&self, network: Network) -> Address;

    /// Produces a BIP-340 signature over a 32-byte digest.
    fn sign(&self, digest: &[u8; 32]) -> Result<schnorr::Signature, SignerError>;
}

#[derive(Debug, Error)]
pub enum SignerError {
    #[error("invalid secret key: {0}")]
    InvalidKey(#[from] secp256k1::Error),

    #[error("signer unavailable: {0}")]
    Unavailable(String),
}

/// [`Signer`] backed by an in-memory keypair.
pub struct KeypairSigner {
    keypair: Keypair,
}

impl KeypairSigner {
    pub fn new(secret: SecretKey) -> Self {
        Self {
            keypair: Keypair::from_secret_key(SECP256K1, &secret),
        }
    }

    pub fn from_secret_bytes(bytes: &[u8; 32]) -> Result<Self, SignerError> {
        Ok(Self::new(SecretKey::from_slice(bytes)?))
    }
}

impl fmt::Debug for KeypairSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeypairSigner")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

impl Signer for KeypairSigner {
    fn public_key(&self) -> XOnlyPublicKey {
        self.keypair.x_only_public_key().0
    }

    fn address(&self, network: Network) -> Address {
        Address::p2tr(SECP256K1, self.public_key(), None, network)
    }

    fn sign(&self, digest: &[u8; 32]) -> Result<schnorr::Signature, SignerError> {
        let msg = Message::from_digest(*digest);
        Ok(SECP256K1.sign_schnorr_no_aux_rand(&msg, &self.keypair))
    }
}
