//! Deposit side: recognising deposits on L1, aggregating them and tracking the batch.

#![allow(
    unused_crate_dependencies,
    reason = "test dependencies shared across test suite"
)]

use bitcoin::{hashes::Hash as _, OutPoint, Txid};
use covbridge_batch::{BatchError, BatchStatus, DepositBatch, FailureKind};
use covbridge_l1tx::{
    backtrace_aggregator, extract_deposit, BacktraceError, CovenantUtxo, DepositFilterConfig,
    StaticCovenantScripts,
};
use covbridge_test_utils::{
    aggregator_script, deposit_tx, test_covenant_scripts, test_l2_address, InMemoryChainProvider,
    TEST_MAGIC,
};
use covbridge_tree::{compute_level, AggregationTree};
use covbridge_types::{sha256, Deposit, L2TxHash};

fn filter() -> DepositFilterConfig {
    DepositFilterConfig {
        aggregator_spk: aggregator_script(),
        magic: TEST_MAGIC,
    }
}

fn scripts() -> StaticCovenantScripts {
    let (bridge, aggregator, expander) = test_covenant_scripts();
    StaticCovenantScripts::new(bridge, aggregator, expander).unwrap()
}

/// Puts one deposit per amount on the simulated chain and extracts them back.
fn deposits_on_chain(provider: &InMemoryChainProvider, amounts: &[u64]) -> Vec<Deposit> {
    amounts
        .iter()
        .enumerate()
        .map(|(i, amount)| {
            let tx = deposit_tx(test_l2_address(i as u8), *amount, TEST_MAGIC);
            provider.insert_tx(&tx);
            extract_deposit(&tx, 100 + i as u64, &filter()).expect("recognised deposit")
        })
        .collect()
}

fn aggregator_utxo(deposit: &Deposit) -> CovenantUtxo {
    CovenantUtxo {
        outpoint: OutPoint::new(deposit.origin.txid, deposit.origin.vout),
        script_pubkey: aggregator_script(),
        amount: deposit.amount.get(),
        state: deposit.leaf_state(),
    }
}

#[test]
fn test_scenario_a_aggregation() {
    let provider = InMemoryChainProvider::default();
    let deposits = deposits_on_chain(&provider, &[100, 200, 300, 400]);

    let leaves = compute_level(&deposits, 0).unwrap();
    assert_eq!(leaves.len(), 4);
    assert_eq!(compute_level(&deposits, 1).unwrap().len(), 2);

    let tree = AggregationTree::build(&deposits).unwrap();
    assert_eq!(tree.height(), 2);
    assert_eq!(tree.root().total_amount().unwrap().get(), 1000);
    assert_eq!(compute_level(&deposits, 2).unwrap(), vec![tree.root().clone()]);
}

#[tokio::test]
async fn test_deposit_leaves_trace_back_to_l1() {
    let provider = InMemoryChainProvider::default();
    let deposits = deposits_on_chain(&provider, &[100, 200]);
    let scripts = scripts();

    for deposit in &deposits {
        let traced = backtrace_aggregator(&aggregator_utxo(deposit), &scripts, &provider)
            .await
            .unwrap();
        assert_eq!(traced.state, deposit.leaf_state());
        assert_eq!(traced.raw_prev_tx.compute_txid(), deposit.origin.txid);
    }

    // claiming another deposit's amount fails the committed hash
    let mut forged = aggregator_utxo(&deposits[0]);
    forged.state = deposits[1].leaf_state();
    assert!(matches!(
        backtrace_aggregator(&forged, &scripts, &provider).await,
        Err(BacktraceError::StateHashMismatch { .. })
    ));
}

#[test]
fn test_scenario_c_finalize_txid() {
    let provider = InMemoryChainProvider::default();
    let deposits = deposits_on_chain(&provider, &[100, 200, 300, 400]);
    let mut batch = DepositBatch::new(deposits.clone()).unwrap();

    assert!(matches!(
        batch.finalize_l1_txid(),
        Err(BatchError::NotFinalized(BatchStatus::Created))
    ));

    batch
        .record_aggregation_level(vec![
            Txid::from_byte_array([0x21; 32]),
            Txid::from_byte_array([0x22; 32]),
        ])
        .unwrap();
    batch
        .record_aggregation_level(vec![Txid::from_byte_array([0x31; 32])])
        .unwrap();
    batch.mark_aggregated().unwrap();

    let finalize = Txid::from_byte_array([0x41; 32]);
    batch.finalize(finalize).unwrap();
    assert_eq!(batch.finalize_l1_txid().unwrap(), finalize);

    let root = AggregationTree::build(&deposits).unwrap().root_hash();
    let mut preimage = root.as_bytes().to_vec();
    preimage.extend_from_slice(&finalize.to_byte_array());
    assert_eq!(batch.deposit_batch_id().unwrap(), sha256(&preimage));

    batch
        .submit_to_l2(L2TxHash(sha256(b"deposit batch on l2")))
        .unwrap();
    batch.mark_deposited().unwrap();
    batch
        .submit_for_completion(Txid::from_byte_array([0x51; 32]))
        .unwrap();
    batch.complete().unwrap();

    let snapshot = serde_json::to_value(&batch).unwrap();
    assert_eq!(snapshot["status"], "COMPLETED");
}

#[test]
fn test_failed_batch_keeps_error_kind() {
    let provider = InMemoryChainProvider::default();
    let deposits = deposits_on_chain(&provider, &[5, 6]);
    let mut batch = DepositBatch::new(deposits).unwrap();

    let err = BacktraceError::TxidMismatch {
        expected: Txid::from_byte_array([1; 32]),
        computed: Txid::from_byte_array([2; 32]),
    };
    batch.fail(FailureKind::from(&err), err.to_string()).unwrap();

    let snapshot = serde_json::to_value(&batch).unwrap();
    assert_eq!(snapshot["status"]["FAILED"], "TXID_MISMATCH");
    assert!(batch.mark_aggregated().is_err());
}
