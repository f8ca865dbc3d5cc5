use bitcoin::{
    consensus::{self, encode::VarInt},
    hashes::Hash as _,
    Amount, ScriptBuf, Transaction, TxIn, TxOut, Txid,
};
use covbridge_types::{
    build_contract_output, encode_amount, sha256d, Hash256, StateError, CONTRACT_SCRIPT_LEN,
};

use crate::errors::BacktraceError;

/// A covenant output together with the state hash committed for it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ContractOutput {
    pub script_pubkey: ScriptBuf,
    pub amount: u64,
    pub state_hash: Hash256,
}

impl ContractOutput {
    pub(crate) fn from_txout(out: &TxOut, state_hash: Hash256) -> Result<Self, BacktraceError> {
        if out.script_pubkey.len() != CONTRACT_SCRIPT_LEN {
            return Err(BacktraceError::UnsupportedTransactionShape(
                "contract output script length",
            ));
        }
        let amount = out.value.to_sat();
        encode_amount(amount)?;
        Ok(Self {
            script_pubkey: out.script_pubkey.clone(),
            amount,
            state_hash,
        })
    }

    /// `amount:8 || 0x22 || spk`.
    pub fn serialize(&self) -> Result<Vec<u8>, StateError> {
        build_contract_output(self.amount, self.script_pubkey.as_bytes())
    }

    pub fn txout(&self) -> TxOut {
        TxOut {
            value: Amount::from_sat(self.amount),
            script_pubkey: self.script_pubkey.clone(),
        }
    }
}

/// Inputs in their txid serialization, count prefix included and witnesses excluded.
pub(crate) fn serialize_inputs(inputs: &[TxIn]) -> Vec<u8> {
    consensus::serialize(&inputs.to_vec())
}

pub(crate) fn decode_transaction(raw: &[u8]) -> Result<Transaction, BacktraceError> {
    consensus::deserialize(raw).map_err(|e| BacktraceError::Decode(e.to_string()))
}

/// `sha256d(version || inputs || n_outputs || outputs || locktime)` as a txid.
pub(crate) fn txid_from_parts(
    version: i32,
    inputs: &[u8],
    outputs: &[Vec<u8>],
    locktime: u32,
) -> Txid {
    let mut buf = Vec::new();
    buf.extend_from_slice(&version.to_le_bytes());
    buf.extend_from_slice(inputs);
    buf.extend_from_slice(&consensus::serialize(&VarInt(outputs.len() as u64)));
    for out in outputs {
        buf.extend_from_slice(out);
    }
    buf.extend_from_slice(&locktime.to_le_bytes());
    Txid::from_byte_array(*sha256d(&buf).as_bytes())
}
