//! Withdrawal expander transactions.
//!
//! Output 0 always commits the state hashes. What follows depends on the shape:
//!
//! - single output: one expander output at 1, committed by a single hash
//! - two children: two expander outputs at 1 and 2 sharing a locking script
//! - batch creation: the bridge remainder at 1 and the withdrawal root at 2
//!
//! An optional change output comes last.

use bitcoin::{consensus, OutPoint, ScriptBuf, Transaction, TxOut, Txid};
use covbridge_types::{
    build_state_commitment_output, split_state_hashes, StateHashes, ONE_STATE_OUTPUT_SCRIPT_LEN,
};

use crate::{
    errors::BacktraceError,
    utils::{decode_transaction, serialize_inputs, txid_from_parts, ContractOutput},
};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TxShape {
    SingleOutput,
    TwoChildren,
    BatchCreation,
}

/// Flattened view of an expander transaction.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExpanderTransaction {
    pub version: i32,
    /// Inputs in txid serialization.
    pub inputs: Vec<u8>,
    /// Outpoints spent by the inputs, in order.
    pub spent: Vec<OutPoint>,
    pub shape: TxShape,
    /// Bridge remainder, only present on a batch creation.
    pub bridge: Option<ContractOutput>,
    /// Expander outputs, in output order.
    pub children: Vec<ContractOutput>,
    pub change: Option<TxOut>,
    pub locktime: u32,
}

impl ExpanderTransaction {
    pub fn is_create_withdrawal_tx(&self) -> bool {
        self.shape == TxShape::BatchCreation
    }

    /// The covenant output at `vout`, bridge included.
    pub fn contract_output(&self, vout: u32) -> Option<&ContractOutput> {
        let idx = (vout as usize).checked_sub(1)?;
        self.bridge.iter().chain(&self.children).nth(idx)
    }

    /// Position of `vout` among the expander outputs, skipping the bridge.
    pub fn expander_index(&self, vout: u32) -> Option<usize> {
        let idx = (vout as usize).checked_sub(1 + usize::from(self.bridge.is_some()))?;
        (idx < self.children.len()).then_some(idx)
    }

    pub fn state_hashes(&self) -> StateHashes {
        let mut hashes = self.bridge.iter().chain(&self.children).map(|o| o.state_hash);
        // parsing guarantees at least one contract output
        let first = hashes.next().unwrap_or_default();
        StateHashes {
            first,
            second: hashes.next(),
        }
    }

    /// Recomputes the txid from the parsed fields.
    pub fn compute_txid(&self) -> Result<Txid, BacktraceError> {
        let hashes = self.state_hashes();
        let second = hashes.second.as_ref().map(|h| h.as_ref());
        let mut outputs = vec![build_state_commitment_output(hashes.first.as_ref(), second)?];
        for out in self.bridge.iter().chain(&self.children) {
            outputs.push(out.serialize()?);
        }
        if let Some(change) = &self.change {
            outputs.push(consensus::serialize(change));
        }
        Ok(txid_from_parts(
            self.version,
            &self.inputs,
            &outputs,
            self.locktime,
        ))
    }
}

/// Decodes and parses a consensus-serialized expander transaction.
pub fn parse_transaction(raw: &[u8]) -> Result<ExpanderTransaction, BacktraceError> {
    parse_expander_transaction(&decode_transaction(raw)?)
}

pub fn parse_expander_transaction(
    tx: &Transaction,
) -> Result<ExpanderTransaction, BacktraceError> {
    let outs = &tx.output;
    let state_out = outs
        .first()
        .ok_or(BacktraceError::UnsupportedTransactionShape("no outputs"))?;
    if state_out.value.to_sat() != 0 {
        return Err(BacktraceError::UnsupportedTransactionShape(
            "state output carries value",
        ));
    }
    let hashes = split_state_hashes(&state_out.script_pubkey)
        .map_err(|_| BacktraceError::UnsupportedTransactionShape("no state commitment"))?;

    let single = state_out.script_pubkey.len() == ONE_STATE_OUTPUT_SCRIPT_LEN;
    let n_contract = if single { 1 } else { 2 };
    if outs.len() < 1 + n_contract {
        return Err(BacktraceError::UnsupportedTransactionShape(
            "missing contract outputs",
        ));
    }
    if outs.len() > 2 + n_contract {
        return Err(BacktraceError::UnsupportedTransactionShape(
            "too many outputs",
        ));
    }

    let (shape, bridge, children) = match hashes.second {
        None => {
            let child = ContractOutput::from_txout(&outs[1], hashes.first)?;
            (TxShape::SingleOutput, None, vec![child])
        }
        Some(second) => {
            let first_out = ContractOutput::from_txout(&outs[1], hashes.first)?;
            let second_out = ContractOutput::from_txout(&outs[2], second)?;
            if first_out.script_pubkey != second_out.script_pubkey {
                (TxShape::BatchCreation, Some(first_out), vec![second_out])
            } else {
                (TxShape::TwoChildren, None, vec![first_out, second_out])
            }
        }
    };

    // change is the output locked by neither contract script
    let contract_scripts: Vec<&ScriptBuf> = bridge
        .iter()
        .chain(&children)
        .map(|o| &o.script_pubkey)
        .collect();
    let mut leftover = outs[1..]
        .iter()
        .filter(|out| !contract_scripts.contains(&&out.script_pubkey));
    let change = leftover.next().cloned();
    if leftover.next().is_some() || outs.len() != 1 + n_contract + usize::from(change.is_some()) {
        return Err(BacktraceError::UnsupportedTransactionShape(
            "extra contract output",
        ));
    }

    Ok(ExpanderTransaction {
        version: tx.version.0,
        inputs: serialize_inputs(&tx.input),
        spent: tx.input.iter().map(|i| i.previous_output).collect(),
        shape,
        bridge,
        children,
        change,
        locktime: tx.lock_time.to_consensus_u32(),
    })
}

/// Checks that `prev` re-serializes to `expected`.
pub fn verify_continuity(
    prev: &ExpanderTransaction,
    expected: &Txid,
) -> Result<(), BacktraceError> {
    let computed = prev.compute_txid()?;
    if computed != *expected {
        return Err(BacktraceError::TxidMismatch {
            expected: *expected,
            computed,
        });
    }
    Ok(())
}
