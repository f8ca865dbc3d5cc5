//! Stand-in covenant locking scripts.
//!
//! Each is a segwit v1 program (`OP_1 <32 bytes>`) filled with a distinct byte, which is all the
//! parsers look at.

use bitcoin::ScriptBuf;

fn v1_program(fill: u8) -> ScriptBuf {
    let mut buf = vec![0x51, 0x20];
    buf.extend_from_slice(&[fill; 32]);
    ScriptBuf::from_bytes(buf)
}

pub fn bridge_script() -> ScriptBuf {
    v1_program(0xb1)
}

pub fn aggregator_script() -> ScriptBuf {
    v1_program(0xa1)
}

pub fn expander_script() -> ScriptBuf {
    v1_program(0xe1)
}

/// `(bridge, deposit aggregator, withdrawal expander)`.
pub fn test_covenant_scripts() -> (ScriptBuf, ScriptBuf, ScriptBuf) {
    (bridge_script(), aggregator_script(), expander_script())
}

/// P2WPKH-shaped payout script for the `i`th test withdrawal.
pub fn payout_script(i: u8) -> ScriptBuf {
    let mut buf = vec![0x00, 0x14];
    buf.extend_from_slice(&[i; 20]);
    ScriptBuf::from_bytes(buf)
}
