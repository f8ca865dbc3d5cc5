//! L1 ingestion feeding the deposit batcher.

#![allow(
    unused_crate_dependencies,
    reason = "test dependencies shared across test suite"
)]

use std::sync::Arc;

use covbridge_batch::{BatchStatus, DepositBatch};
use covbridge_btcio::{IngestionBuilder, L1Event};
use covbridge_test_utils::{test_l2_address, test_outpoint, InMemoryChainProvider};
use covbridge_types::{AmountField, Deposit, L1TxRef};

fn deposit_at(height: u64, amount: u64) -> Deposit {
    Deposit::new(
        test_l2_address(height as u8),
        AmountField::try_new(amount).unwrap(),
        L1TxRef::new(test_outpoint(height as u8).txid, 1, height),
    )
}

#[tokio::test(start_paused = true)]
async fn test_scenario_b_event_stream() {
    let provider = Arc::new(InMemoryChainProvider::default());
    provider.add_deposit(deposit_at(10, 1));
    provider.add_deposit(deposit_at(11, 250));
    provider.add_deposit(deposit_at(13, 750));
    provider.set_height(10);

    let (mut handle, task) = IngestionBuilder::new(provider.clone(), 10)
        .with_poll_interval_ms(100)
        .build();
    let task = tokio::spawn(task);

    // height 10 was already scanned, so its deposit never shows up
    assert_eq!(handle.next_event().await, Some(L1Event::BlockHeight(10)));

    provider.set_height(11);
    assert_eq!(handle.next_event().await, Some(L1Event::BlockHeight(11)));
    let Some(L1Event::Deposits(first)) = handle.next_event().await else {
        panic!("expected deposits at 11");
    };

    provider.set_height(13);
    assert_eq!(handle.next_event().await, Some(L1Event::BlockHeight(13)));
    let Some(L1Event::Deposits(second)) = handle.next_event().await else {
        panic!("expected deposits at 12..=13");
    };

    handle.stop();
    task.await.unwrap();

    assert_eq!(first, vec![deposit_at(11, 250)]);
    assert_eq!(second, vec![deposit_at(13, 750)]);

    let mut deposits = first;
    deposits.extend(second);
    let batch = DepositBatch::new(deposits).unwrap();
    assert_eq!(batch.status(), BatchStatus::Created);
    assert_eq!(batch.height(), 1);
    assert_eq!(
        batch.aggregation_levels()[0]
            .iter()
            .map(|s| s.total_amount().unwrap().get())
            .sum::<u64>(),
        1000
    );
}
