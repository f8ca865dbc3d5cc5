//! State commitment and contract output encodings.
//!
//! Every covenant transaction carries its state hashes in output 0 as
//! `OP_RETURN <push hash1 || hash2>`, followed by the contract outputs themselves.

use bitcoin::{opcodes::all::OP_RETURN, Amount, Script, ScriptBuf, TxOut};

use crate::{
    amount::encode_amount,
    constants::{
        CONTRACT_SCRIPT_LEN, HASH_SIZE, ONE_STATE_OUTPUT_SCRIPT_LEN, TWO_STATE_OUTPUT_SCRIPT_LEN,
    },
    errors::StateError,
    hash::Hash256,
};

/// Hashes recovered from a state commitment script.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct StateHashes {
    pub first: Hash256,
    pub second: Option<Hash256>,
}

impl StateHashes {
    pub fn single(first: Hash256) -> Self {
        Self {
            first,
            second: None,
        }
    }

    pub fn pair(first: Hash256, second: Hash256) -> Self {
        Self {
            first,
            second: Some(second),
        }
    }

    /// Hash committed for the contract output at `vout`, counting contract outputs from 1.
    pub fn for_output(&self, vout: u32) -> Option<Hash256> {
        match vout {
            1 => Some(self.first),
            2 => self.second,
            _ => None,
        }
    }

    pub fn script(&self) -> ScriptBuf {
        let mut buf = Vec::with_capacity(TWO_STATE_OUTPUT_SCRIPT_LEN);
        let push_len = if self.second.is_some() {
            2 * HASH_SIZE
        } else {
            HASH_SIZE
        };
        buf.push(OP_RETURN.to_u8());
        buf.push(push_len as u8);
        buf.extend_from_slice(self.first.as_ref());
        if let Some(second) = &self.second {
            buf.extend_from_slice(second.as_ref());
        }
        ScriptBuf::from_bytes(buf)
    }

    /// The zero-value output carrying this commitment.
    pub fn txout(&self) -> TxOut {
        TxOut {
            value: Amount::ZERO,
            script_pubkey: self.script(),
        }
    }
}

fn validate_hashes(hash1: &[u8], hash2: Option<&[u8]>) -> Result<StateHashes, StateError> {
    let first = Hash256::from_slice("hash1", hash1)?;
    let second = match hash2 {
        None => None,
        Some(h) if h.is_empty() => None,
        Some(h) => Some(Hash256::from_slice("hash2", h)?),
    };
    Ok(StateHashes { first, second })
}

/// Builds `OP_RETURN <push hash1 || hash2>`. An empty `hash2` is treated as absent.
pub fn state_commitment_script(
    hash1: &[u8],
    hash2: Option<&[u8]>,
) -> Result<ScriptBuf, StateError> {
    Ok(validate_hashes(hash1, hash2)?.script())
}

/// Serialized state commitment output: `value:8 || script_len || script`, value always zero.
pub fn build_state_commitment_output(
    hash1: &[u8],
    hash2: Option<&[u8]>,
) -> Result<Vec<u8>, StateError> {
    let script = state_commitment_script(hash1, hash2)?;
    let mut buf = Vec::with_capacity(8 + 1 + script.len());
    buf.extend_from_slice(&[0; 8]);
    buf.push(script.len() as u8);
    buf.extend_from_slice(script.as_bytes());
    Ok(buf)
}

/// Serialized contract output: `amount:8 || 0x22 || spk`.
pub fn build_contract_output(amount: u64, spk: &[u8]) -> Result<Vec<u8>, StateError> {
    if spk.len() != CONTRACT_SCRIPT_LEN {
        return Err(StateError::InvalidScriptLength(spk.len()));
    }
    let mut buf = Vec::with_capacity(8 + 1 + CONTRACT_SCRIPT_LEN);
    buf.extend_from_slice(&encode_amount(amount)?);
    buf.push(CONTRACT_SCRIPT_LEN as u8);
    buf.extend_from_slice(spk);
    Ok(buf)
}

/// Parses a state commitment script back into its hashes.
pub fn split_state_hashes(script: &Script) -> Result<StateHashes, StateError> {
    let bytes = script.as_bytes();
    if bytes.first() != Some(&OP_RETURN.to_u8()) {
        return Err(StateError::MalformedStateOutput("missing OP_RETURN"));
    }

    match bytes.len() {
        ONE_STATE_OUTPUT_SCRIPT_LEN if bytes[1] as usize == HASH_SIZE => {
            let first = Hash256::from_slice("hash1", &bytes[2..])?;
            Ok(StateHashes::single(first))
        }
        TWO_STATE_OUTPUT_SCRIPT_LEN if bytes[1] as usize == 2 * HASH_SIZE => {
            let first = Hash256::from_slice("hash1", &bytes[2..2 + HASH_SIZE])?;
            let second = Hash256::from_slice("hash2", &bytes[2 + HASH_SIZE..])?;
            Ok(StateHashes::pair(first, second))
        }
        _ => Err(StateError::MalformedStateOutput("unexpected push layout")),
    }
}
