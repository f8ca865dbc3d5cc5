//! Withdrawal side: unwinding an expander tree on L1 and verifying its history.

#![allow(
    unused_crate_dependencies,
    reason = "test dependencies shared across test suite"
)]

use std::collections::HashMap;

use bitcoin::{consensus, hashes::Hash as _, Amount, OutPoint, ScriptBuf, Txid};
use covbridge_batch::{WithdrawalBatch, WithdrawalStatus};
use covbridge_l1tx::{
    backtrace_expander, fetch_transaction, parse_expander_transaction, trace_lineage,
    verify_continuity, BacktraceError, ExpanderCall, ExpanderMethod, InputCtx,
    StaticCovenantScripts, TxShape,
};
use covbridge_test_utils::{bridge_script, test_covenant_scripts, test_signer};
use covbridge_types::{Hash256, L2TxHash};
use integration_tests::harness::{WithdrawalChain, BRIDGE_AMOUNT};

fn scripts() -> StaticCovenantScripts {
    let (bridge, aggregator, expander) = test_covenant_scripts();
    StaticCovenantScripts::new(bridge, aggregator, expander).unwrap()
}

#[test]
fn test_batch_creation_round_trip() {
    let chain = WithdrawalChain::build(&[10, 20, 30, 40]);
    let parsed = parse_expander_transaction(&chain.creation).unwrap();

    assert_eq!(parsed.shape, TxShape::BatchCreation);
    assert!(parsed.is_create_withdrawal_tx());
    let bridge = parsed.bridge.as_ref().unwrap();
    assert_eq!(bridge.amount, BRIDGE_AMOUNT);
    assert_eq!(bridge.script_pubkey, bridge_script());
    assert_eq!(parsed.children[0].amount, 100);
    assert_eq!(parsed.children[0].state_hash, chain.plan.root_hash());
    verify_continuity(&parsed, &chain.creation.compute_txid()).unwrap();
}

#[tokio::test]
async fn test_every_node_backtraces() {
    let chain = WithdrawalChain::build(&[10, 20, 30, 40, 50, 60, 70, 80]);
    let scripts = scripts();

    for depth in 0..=chain.plan.height() {
        for index in 0..chain.outpoints[depth as usize].len() {
            let traced = backtrace_expander(&chain.utxo(depth, index), &scripts, &chain.provider)
                .await
                .unwrap();
            assert_eq!(&traced.state, chain.state(depth, index));
        }
    }
}

#[tokio::test]
async fn test_backtrace_rejects_forgeries() {
    let chain = WithdrawalChain::build(&[10, 20, 30, 40]);
    let scripts = scripts();

    let mut wrong_script = chain.utxo(1, 0);
    wrong_script.script_pubkey = bridge_script();
    assert!(matches!(
        backtrace_expander(&wrong_script, &scripts, &chain.provider).await,
        Err(BacktraceError::ScriptMismatch { .. })
    ));

    // sibling holds a different state under the same transaction
    let mut swapped = chain.utxo(1, 0);
    swapped.state = chain.state(1, 1).clone();
    swapped.amount = swapped.state.total_amount().unwrap().get();
    assert!(matches!(
        backtrace_expander(&swapped, &scripts, &chain.provider).await,
        Err(BacktraceError::StateHashMismatch { .. })
    ));

    // the bridge output of the batch creation is not an expander
    let mut bridge_slot = chain.utxo(0, 0);
    bridge_slot.outpoint.vout = 1;
    assert!(backtrace_expander(&bridge_slot, &scripts, &chain.provider)
        .await
        .is_err());
}

#[tokio::test]
async fn test_tampered_transaction_detected() {
    let chain = WithdrawalChain::build(&[10, 20, 30, 40]);
    let utxo = chain.utxo(2, 3);

    let tx = fetch_transaction(&utxo.outpoint.txid, &chain.provider)
        .await
        .unwrap();
    let mut raw = consensus::serialize(&tx);
    let last = raw.len() - 1;
    raw[last] ^= 0x01;
    chain.provider.insert_raw(utxo.outpoint.txid, raw);

    let err = backtrace_expander(&utxo, &scripts(), &chain.provider)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BacktraceError::TxidMismatch { expected, .. } if expected == utxo.outpoint.txid
    ));
    assert!(!err.is_recoverable());
}

#[tokio::test]
async fn test_tampered_commitment_and_value_detected() {
    let chain = WithdrawalChain::build(&[10, 20, 30, 40]);
    let utxo = chain.utxo(1, 1);
    let txid = utxo.outpoint.txid;
    let tx = fetch_transaction(&txid, &chain.provider).await.unwrap();

    // points the committed hash of output 2 elsewhere
    let mut commitment = tx.clone();
    let mut script = commitment.output[0].script_pubkey.to_bytes();
    let last = script.len() - 1;
    script[last] ^= 0x01;
    commitment.output[0].script_pubkey = ScriptBuf::from_bytes(script);

    let mut value = tx;
    value.output[2].value = Amount::from_sat(value.output[2].value.to_sat() + 1);

    for tampered in [commitment, value] {
        chain.provider.insert_raw(txid, consensus::serialize(&tampered));
        let err = backtrace_expander(&utxo, &scripts(), &chain.provider)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BacktraceError::TxidMismatch { expected, .. } if expected == txid
        ));
    }
}

#[tokio::test]
async fn test_lineage_stops_at_batch_creation() {
    let chain = WithdrawalChain::build(&[10, 20, 30, 40]);
    let leaf = chain.outpoints[2][3].txid;

    let lineage = trace_lineage(leaf, 8, &chain.provider).await.unwrap();
    let txids: Vec<_> = lineage.iter().map(|(txid, _)| *txid).collect();
    assert_eq!(
        txids,
        vec![
            leaf,
            chain.outpoints[1][0].txid,
            chain.creation.compute_txid()
        ]
    );
    assert!(lineage.last().unwrap().1.is_create_withdrawal_tx());
    assert_eq!(lineage[0].1.shape, TxShape::TwoChildren);

    assert!(matches!(
        trace_lineage(leaf, 2, &chain.provider).await,
        Err(BacktraceError::LineageTooLong(2))
    ));
}

#[test]
fn test_withdrawal_batch_follows_chain() {
    let chain = WithdrawalChain::build(&[10, 20, 30, 40]);
    let mut batch = WithdrawalBatch::new(1, chain.withdrawals.clone()).unwrap();
    assert_eq!(batch.hash(), chain.plan.root_hash());

    batch.close(L2TxHash(Hash256::new([0xc1; 32]))).unwrap();
    batch.create(chain.creation.compute_txid()).unwrap();
    for depth in 1..=chain.plan.height() {
        let states = chain.plan.depth(depth).unwrap().to_vec();
        batch
            .record_expansion_level(states, chain.level_txids(depth))
            .unwrap();
    }

    assert_eq!(batch.status(), WithdrawalStatus::Expanded);
    assert_eq!(batch.expansion_txs()[2], chain.level_txids(2));
}

#[tokio::test]
async fn test_distribute_pays_planned_leaves() {
    let chain = WithdrawalChain::build(&[10, 20, 30, 40, 50, 60, 70, 80]);
    let depth = 1;
    let traced = backtrace_expander(&chain.utxo(depth, 1), &scripts(), &chain.provider)
        .await
        .unwrap();
    let targets = chain.plan.distribution_targets(depth, 1).unwrap();
    let funding = OutPoint::new(Txid::from_byte_array([0xfe; 32]), 0);

    let call = ExpanderCall::distribute(
        0,
        &traced,
        chain.plan.subtree_height(depth),
        &targets,
        funding,
    )
    .unwrap();
    let ExpanderMethod::Distribute { scripts, amounts } = &call.method else {
        panic!("expected distribute");
    };
    assert_eq!(amounts, &[50, 60, 70, 80]);
    assert_eq!(scripts[0], chain.withdrawals[4].recipient_script.to_bytes());

    // the root is too tall to distribute from
    assert!(chain.plan.distribution_targets(0, 0).is_err());

    let ctxs = HashMap::from([(
        0,
        InputCtx {
            sh_preimage: vec![0xab; 80],
        },
    )]);
    let args = call.build_args(&ctxs, &test_signer()).unwrap();
    assert_eq!(args.method, call.method);
    assert_eq!(args.sh_preimage.len(), 80);
    // second child of the root split
    assert!(!args.is_first_expander_output);
    assert_eq!(args.prev_tx, traced.prev_tx);
    assert_eq!(args.funding_prevout, funding);
}
