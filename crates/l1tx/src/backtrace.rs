//! Reconstruction of a covenant's state from the transaction that created it.

use bitcoin::{OutPoint, ScriptBuf, Transaction, Txid};
use covbridge_common::ChainProvider;
use covbridge_types::CovenantState;
use tracing::*;

use crate::{
    aggregator::{parse_aggregator_transaction, AggregatorTransaction},
    errors::BacktraceError,
    expander::{parse_expander_transaction, verify_continuity, ExpanderTransaction},
    scripts::{CovenantKind, CovenantScripts},
    utils::{decode_transaction, ContractOutput},
};

/// A covenant utxo together with the state the operator believes it holds.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CovenantUtxo {
    pub outpoint: OutPoint,
    pub script_pubkey: ScriptBuf,
    pub amount: u64,
    pub state: CovenantState,
}

/// An expander utxo whose state was checked against its funding transaction.
#[derive(Clone, Debug)]
pub struct TracedExpander {
    pub outpoint: OutPoint,
    pub state: CovenantState,
    pub prev_tx: ExpanderTransaction,
    pub raw_prev_tx: Transaction,
}

impl TracedExpander {
    /// Whether the utxo is the first expander output of the transaction that funded it.
    pub fn is_first_expander_output(&self) -> bool {
        self.prev_tx.expander_index(self.outpoint.vout) == Some(0)
    }
}

/// An aggregator utxo whose state was checked against its funding transaction.
#[derive(Clone, Debug)]
pub struct TracedAggregator {
    pub state: CovenantState,
    pub prev_tx: AggregatorTransaction,
    pub raw_prev_tx: Transaction,
}

/// Fetches and decodes a transaction.
pub async fn fetch_transaction(
    txid: &Txid,
    provider: &impl ChainProvider,
) -> Result<Transaction, BacktraceError> {
    let raw = provider.get_raw_transaction(txid).await?;
    decode_transaction(&raw)
}

fn check_utxo_script(
    utxo: &CovenantUtxo,
    kind: CovenantKind,
    scripts: &impl CovenantScripts,
) -> Result<(), BacktraceError> {
    if utxo.script_pubkey != scripts.locking_script(kind) {
        return Err(BacktraceError::ScriptMismatch {
            kind,
            vout: utxo.outpoint.vout,
        });
    }
    Ok(())
}

fn check_committed(
    utxo: &CovenantUtxo,
    kind: CovenantKind,
    out: Option<&ContractOutput>,
) -> Result<(), BacktraceError> {
    let out = out.ok_or(BacktraceError::MissingOutput(utxo.outpoint.vout))?;
    if out.script_pubkey != utxo.script_pubkey {
        return Err(BacktraceError::ScriptMismatch {
            kind,
            vout: utxo.outpoint.vout,
        });
    }

    let claimed = utxo.state.hash();
    if out.state_hash != claimed {
        return Err(BacktraceError::StateHashMismatch {
            committed: out.state_hash,
            claimed,
        });
    }

    let total = utxo.state.total_amount()?.get();
    if out.amount != utxo.amount || out.amount != total {
        return Err(BacktraceError::AmountMismatch {
            output: out.amount,
            claimed: total,
        });
    }
    Ok(())
}

/// Verifies that `utxo` is a withdrawal expander output holding the state it claims.
pub async fn backtrace_expander(
    utxo: &CovenantUtxo,
    scripts: &impl CovenantScripts,
    provider: &impl ChainProvider,
) -> Result<TracedExpander, BacktraceError> {
    let kind = CovenantKind::WithdrawalExpander;
    check_utxo_script(utxo, kind, scripts)?;

    let txid = utxo.outpoint.txid;
    let raw_prev_tx = fetch_transaction(&txid, provider).await?;
    let prev_tx = parse_expander_transaction(&raw_prev_tx)?;
    verify_continuity(&prev_tx, &txid)?;

    // on a batch creation output 1 is the bridge, never an expander
    let out = match (prev_tx.is_create_withdrawal_tx(), utxo.outpoint.vout) {
        (true, 1) => None,
        (_, vout) => prev_tx.contract_output(vout),
    };
    check_committed(utxo, kind, out)?;

    debug!(%txid, vout = %utxo.outpoint.vout, shape = ?prev_tx.shape, "traced expander utxo");
    Ok(TracedExpander {
        outpoint: utxo.outpoint,
        state: utxo.state.clone(),
        prev_tx,
        raw_prev_tx,
    })
}

/// Verifies that `utxo` is a deposit aggregator output holding the state it claims.
pub async fn backtrace_aggregator(
    utxo: &CovenantUtxo,
    scripts: &impl CovenantScripts,
    provider: &impl ChainProvider,
) -> Result<TracedAggregator, BacktraceError> {
    let kind = CovenantKind::DepositAggregator;
    check_utxo_script(utxo, kind, scripts)?;

    let txid = utxo.outpoint.txid;
    let raw_prev_tx = fetch_transaction(&txid, provider).await?;
    let prev_tx = parse_aggregator_transaction(&raw_prev_tx)?;
    let computed = prev_tx.compute_txid()?;
    if computed != txid {
        return Err(BacktraceError::TxidMismatch {
            expected: txid,
            computed,
        });
    }

    let out = (utxo.outpoint.vout == 1).then_some(&prev_tx.contract);
    check_committed(utxo, kind, out)?;

    debug!(%txid, "traced aggregator utxo");
    Ok(TracedAggregator {
        state: utxo.state.clone(),
        prev_tx,
        raw_prev_tx,
    })
}

/// Walks expander history back from `txid` to the batch creation transaction.
///
/// Returns the verified transactions newest first, ending with the batch creation. Each hop is
/// verified before the next one is fetched.
pub async fn trace_lineage(
    txid: Txid,
    max_hops: usize,
    provider: &impl ChainProvider,
) -> Result<Vec<(Txid, ExpanderTransaction)>, BacktraceError> {
    let mut lineage = Vec::new();
    let mut cur = txid;

    for _ in 0..max_hops {
        let tx = fetch_transaction(&cur, provider).await?;
        let parsed = parse_expander_transaction(&tx)?;
        verify_continuity(&parsed, &cur)?;
        trace!(txid = %cur, shape = ?parsed.shape, "verified lineage hop");

        if parsed.is_create_withdrawal_tx() {
            lineage.push((cur, parsed));
            return Ok(lineage);
        }

        // input 0 spends the parent expander output
        let parent = parsed
            .spent
            .first()
            .ok_or(BacktraceError::UnsupportedTransactionShape("no inputs"))?
            .txid;
        lineage.push((cur, parsed));
        cur = parent;
    }

    Err(BacktraceError::LineageTooLong(max_hops))
}
