//! Deposit aggregator transactions.
//!
//! Layout: state commitment at 0, the aggregator output at 1, then an optional deposit data
//! output (`OP_RETURN`, zero value) and an optional change output.

use bitcoin::{consensus, Amount, OutPoint, ScriptBuf, Transaction, TxOut, Txid};
use covbridge_types::{build_state_commitment_output, split_state_hashes, Hash256};

use crate::{
    errors::BacktraceError,
    utils::{serialize_inputs, txid_from_parts, ContractOutput},
};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AggregatorTransaction {
    pub version: i32,
    pub inputs: Vec<u8>,
    pub spent: Vec<OutPoint>,
    pub contract: ContractOutput,
    /// Script of the deposit data output, present on deposit leaf transactions.
    pub deposit_data: Option<ScriptBuf>,
    pub change: Option<TxOut>,
    pub locktime: u32,
}

impl AggregatorTransaction {
    pub fn state_hash(&self) -> Hash256 {
        self.contract.state_hash
    }

    pub fn compute_txid(&self) -> Result<Txid, BacktraceError> {
        let mut outputs = vec![
            build_state_commitment_output(self.contract.state_hash.as_ref(), None)?,
            self.contract.serialize()?,
        ];
        if let Some(data) = &self.deposit_data {
            outputs.push(consensus::serialize(&TxOut {
                value: Amount::ZERO,
                script_pubkey: data.clone(),
            }));
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

pub fn parse_aggregator_transaction(
    tx: &Transaction,
) -> Result<AggregatorTransaction, BacktraceError> {
    let outs = &tx.output;
    if outs.len() < 2 || outs.len() > 4 {
        return Err(BacktraceError::UnsupportedTransactionShape(
            "aggregator output count",
        ));
    }
    if outs[0].value.to_sat() != 0 {
        return Err(BacktraceError::UnsupportedTransactionShape(
            "state output carries value",
        ));
    }
    let hashes = split_state_hashes(&outs[0].script_pubkey)
        .map_err(|_| BacktraceError::UnsupportedTransactionShape("no state commitment"))?;
    if hashes.second.is_some() {
        return Err(BacktraceError::UnsupportedTransactionShape(
            "aggregator commits a single state",
        ));
    }
    let contract = ContractOutput::from_txout(&outs[1], hashes.first)?;

    let is_data = |out: &TxOut| out.script_pubkey.is_op_return() && out.value.to_sat() == 0;
    let (deposit_data, change) = match &outs[2..] {
        [] => (None, None),
        [one] if is_data(one) => (Some(one.script_pubkey.clone()), None),
        [one] => (None, Some(one.clone())),
        [data, change] if is_data(data) => (Some(data.script_pubkey.clone()), Some(change.clone())),
        _ => {
            return Err(BacktraceError::UnsupportedTransactionShape(
                "unexpected trailing outputs",
            ))
        }
    };

    Ok(AggregatorTransaction {
        version: tx.version.0,
        inputs: serialize_inputs(&tx.input),
        spent: tx.input.iter().map(|i| i.previous_output).collect(),
        contract,
        deposit_data,
        change,
        locktime: tx.lock_time.to_consensus_u32(),
    })
}
