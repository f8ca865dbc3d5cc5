//! Synthetic covenant transactions.

use bitcoin::{
    absolute::LockTime, hashes::Hash as _, transaction::Version, Amount, OutPoint, ScriptBuf,
    Sequence, Transaction, TxIn, TxOut, Txid, Witness,
};
use covbridge_types::{hash_leaf, CovenantState, Hash256, L2Address, StateHashes};

use crate::scripts::{aggregator_script, bridge_script, expander_script, payout_script};

/// Magic bytes tagging test deposits.
pub const TEST_MAGIC: [u8; 4] = *b"CVBR";

/// A deterministic outpoint distinct per `n`.
pub fn test_outpoint(n: u8) -> OutPoint {
    OutPoint::new(Txid::from_byte_array([n; 32]), n as u32)
}

fn input(prevout: OutPoint) -> TxIn {
    TxIn {
        previous_output: prevout,
        script_sig: ScriptBuf::new(),
        sequence: Sequence::ENABLE_RBF_NO_LOCKTIME,
        witness: Witness::from_slice(&[[0x5a; 64]]),
    }
}

fn state_amount(state: &CovenantState) -> Amount {
    Amount::from_sat(state.total_amount().expect("test state in range").get())
}

/// A covenant transaction committing `hashes` at output 0, followed by `outputs`.
pub fn covenant_tx(inputs: Vec<OutPoint>, hashes: StateHashes, outputs: Vec<TxOut>) -> Transaction {
    let mut output = vec![hashes.txout()];
    output.extend(outputs);
    Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input: inputs.into_iter().map(input).collect(),
        output,
    }
}

/// Creates a withdrawal batch: the bridge keeps `bridge_amount` at 1, `root` is funded at 2.
pub fn batch_creation_tx(
    bridge_amount: u64,
    bridge_state: Hash256,
    root: &CovenantState,
) -> Transaction {
    covenant_tx(
        vec![test_outpoint(0xb0), test_outpoint(0xf0)],
        StateHashes::pair(bridge_state, root.hash()),
        vec![
            TxOut {
                value: Amount::from_sat(bridge_amount),
                script_pubkey: bridge_script(),
            },
            TxOut {
                value: state_amount(root),
                script_pubkey: expander_script(),
            },
        ],
    )
}

/// Expands the expander at `parent` into `left` at 1 and `right` at 2.
pub fn two_children_tx(
    parent: OutPoint,
    left: &CovenantState,
    right: &CovenantState,
) -> Transaction {
    covenant_tx(
        vec![parent, test_outpoint(0xf1)],
        StateHashes::pair(left.hash(), right.hash()),
        vec![
            TxOut {
                value: state_amount(left),
                script_pubkey: expander_script(),
            },
            TxOut {
                value: state_amount(right),
                script_pubkey: expander_script(),
            },
        ],
    )
}

/// Moves the expander at `parent` into a single expander holding `state`.
pub fn single_output_tx(parent: OutPoint, state: &CovenantState) -> Transaction {
    covenant_tx(
        vec![parent, test_outpoint(0xf2)],
        StateHashes::single(state.hash()),
        vec![TxOut {
            value: state_amount(state),
            script_pubkey: expander_script(),
        }],
    )
}

/// A deposit aggregator leaf crediting `amount` to `recipient`.
pub fn deposit_tx(recipient: L2Address, amount: u64, magic: [u8; 4]) -> Transaction {
    let leaf_hash = hash_leaf(recipient.as_bytes(), amount).expect("test amount in range");

    let mut data = vec![0x6a, 36];
    data.extend_from_slice(&magic);
    data.extend_from_slice(recipient.as_bytes());

    // distinct funding per recipient and amount so txids never collide
    let mut seed = [0u8; 32];
    seed[..8].copy_from_slice(&amount.to_le_bytes());
    seed[8..].copy_from_slice(&recipient.as_bytes()[8..]);

    covenant_tx(
        vec![OutPoint::new(Txid::from_byte_array(seed), 0)],
        StateHashes::single(leaf_hash),
        vec![
            TxOut {
                value: Amount::from_sat(amount),
                script_pubkey: aggregator_script(),
            },
            TxOut {
                value: Amount::ZERO,
                script_pubkey: ScriptBuf::from_bytes(data),
            },
        ],
    )
}

/// Appends a change output of `amount`.
pub fn with_change(mut tx: Transaction, amount: u64) -> Transaction {
    tx.output.push(TxOut {
        value: Amount::from_sat(amount),
        script_pubkey: payout_script(0xcc),
    });
    tx
}
