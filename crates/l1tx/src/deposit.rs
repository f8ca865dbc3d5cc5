//! Recognition of deposit leaf transactions.
//!
//! A user deposits by funding a deposit aggregator leaf: output 1 locks the amount under the
//! aggregator covenant, output 0 commits `hash_leaf(recipient, amount)` and output 2 carries
//! `OP_RETURN <magic:4 || recipient:32>`.

use bitcoin::{opcodes::all::OP_RETURN, ScriptBuf, Transaction};
use covbridge_types::{hash_leaf, AmountField, Deposit, L1TxRef, L2Address, HASH_SIZE};
use tracing::*;

use crate::{aggregator::parse_aggregator_transaction, errors::DepositParseError};

const MAGIC_LEN: usize = 4;

/// `OP_RETURN <push 36> <magic> <recipient>`.
pub const DEPOSIT_DATA_SCRIPT_LEN: usize = 2 + MAGIC_LEN + HASH_SIZE;

/// What identifies a deposit for this bridge instance.
#[derive(Clone, Debug)]
pub struct DepositFilterConfig {
    pub aggregator_spk: ScriptBuf,
    pub magic: [u8; MAGIC_LEN],
}

/// Builds the deposit data script for `recipient`.
pub fn deposit_data_script(magic: [u8; MAGIC_LEN], recipient: &L2Address) -> ScriptBuf {
    let mut buf = Vec::with_capacity(DEPOSIT_DATA_SCRIPT_LEN);
    buf.push(OP_RETURN.to_u8());
    buf.push((MAGIC_LEN + HASH_SIZE) as u8);
    buf.extend_from_slice(&magic);
    buf.extend_from_slice(recipient.as_bytes());
    ScriptBuf::from_bytes(buf)
}

/// Parses `tx` as a deposit confirmed at `height`.
pub fn parse_deposit(
    tx: &Transaction,
    height: u64,
    config: &DepositFilterConfig,
) -> Result<Deposit, DepositParseError> {
    let agg = parse_aggregator_transaction(tx).map_err(|_| DepositParseError::NotAggregatorTx)?;
    if agg.contract.script_pubkey != config.aggregator_spk {
        return Err(DepositParseError::WrongAggregatorScript);
    }

    let data = agg
        .deposit_data
        .as_ref()
        .ok_or(DepositParseError::MissingDepositData)?;
    let bytes = data.as_bytes();
    if bytes.len() != DEPOSIT_DATA_SCRIPT_LEN || bytes[1] as usize != MAGIC_LEN + HASH_SIZE {
        return Err(DepositParseError::MalformedDepositData);
    }
    if bytes[2..2 + MAGIC_LEN] != config.magic {
        return Err(DepositParseError::MagicMismatch);
    }

    let mut recipient = [0u8; HASH_SIZE];
    recipient.copy_from_slice(&bytes[2 + MAGIC_LEN..]);
    let recipient = L2Address::new(recipient);

    let amount = AmountField::try_new(agg.contract.amount)?;
    if hash_leaf(recipient.as_bytes(), amount.get())? != agg.state_hash() {
        return Err(DepositParseError::LeafHashMismatch);
    }

    Ok(Deposit::new(
        recipient,
        amount,
        L1TxRef::new(tx.compute_txid(), 1, height),
    ))
}

/// Extracts the deposit in `tx`, if it is one.
pub fn extract_deposit(
    tx: &Transaction,
    height: u64,
    config: &DepositFilterConfig,
) -> Option<Deposit> {
    match parse_deposit(tx, height, config) {
        Ok(deposit) => Some(deposit),
        Err(DepositParseError::NotAggregatorTx) => None,
        Err(err) => {
            debug!(%err, txid = %tx.compute_txid(), %height, "skipping aggregator-shaped tx");
            None
        }
    }
}
