use covbridge_common::KeypairSigner;

/// Fixed operator secret used across tests.
pub const TEST_SECRET: [u8; 32] = [0x11; 32];

pub fn test_signer() -> KeypairSigner {
    KeypairSigner::from_secret_bytes(&TEST_SECRET).expect("valid test secret")
}
