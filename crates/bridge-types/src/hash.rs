use std::fmt;

use arbitrary::Arbitrary;
use bitcoin::{hashes::Hash as _, Txid};
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{constants::HASH_SIZE, errors::StateError};

/// A 32-byte hash committed to by covenant state.
#[derive(
    Copy,
    Clone,
    Default,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Arbitrary,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub struct Hash256(#[serde(with = "hex::serde")] [u8; HASH_SIZE]);

impl Hash256 {
    /// The all-zero hash, used where a commitment slot is empty.
    pub const ZERO: Hash256 = Hash256([0; HASH_SIZE]);

    pub const fn new(bytes: [u8; HASH_SIZE]) -> Self {
        Self(bytes)
    }

    /// Builds a hash from a slice, failing unless it is exactly 32 bytes long.
    pub fn from_slice(which: &'static str, buf: &[u8]) -> Result<Self, StateError> {
        let bytes: [u8; HASH_SIZE] = buf.try_into().map_err(|_| StateError::InvalidHashLength {
            which,
            len: buf.len(),
        })?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0; HASH_SIZE]
    }
}

impl AsRef<[u8]> for Hash256 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; HASH_SIZE]> for Hash256 {
    fn from(value: [u8; HASH_SIZE]) -> Self {
        Self(value)
    }
}

impl From<Hash256> for [u8; HASH_SIZE] {
    fn from(value: Hash256) -> Self {
        value.0
    }
}

/// Txids keep their internal (non-reversed) byte order.
impl From<Txid> for Hash256 {
    fn from(value: Txid) -> Self {
        Self(value.to_byte_array())
    }
}

impl From<Hash256> for Txid {
    fn from(value: Hash256) -> Self {
        Txid::from_byte_array(value.0)
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash256({self})")
    }
}

/// Single SHA-256 over `buf`.
pub fn sha256(buf: &[u8]) -> Hash256 {
    Hash256(Sha256::digest(buf).into())
}

/// Double SHA-256 over `buf`, as used for Bitcoin txids.
pub fn sha256d(buf: &[u8]) -> Hash256 {
    sha256(sha256(buf).as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_slice_rejects_wrong_length() {
        let err = Hash256::from_slice("hash1", &[0u8; 31]).unwrap_err();
        assert_eq!(
            err,
            StateError::InvalidHashLength {
                which: "hash1",
                len: 31
            }
        );
    }

    #[test]
    fn test_sha256d_matches_bitcoin_txid_hash() {
        let data = b"covbridge";
        let ours = sha256d(data);
        let theirs = bitcoin::hashes::sha256d::Hash::hash(data);
        assert_eq!(ours.as_bytes(), &theirs.to_byte_array());
    }

    #[test]
    fn test_serde_as_hex() {
        let h = Hash256::new([0xab; 32]);
        let json = serde_json::to_string(&h).unwrap();
        assert_eq!(json, format!("\"{}\"", "ab".repeat(32)));
        let back: Hash256 = serde_json::from_str(&json).unwrap();
        assert_eq!(back, h);
    }
}
