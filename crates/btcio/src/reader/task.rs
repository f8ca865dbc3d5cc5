use covbridge_common::{list_deposits_checked, ChainProvider};
use tokio::sync::watch;
use tracing::*;

use super::{ctx::IngestionCtx, cursor::ScanCursor, error::IngestionError, event::L1Event};

pub(crate) async fn ingestion_task<P: ChainProvider>(
    mut cursor: ScanCursor,
    ctx: IngestionCtx<P>,
    mut stop_rx: watch::Receiver<bool>,
) {
    info!(last_scanned = %cursor.last_scanned(), "started L1 ingestion task");

    loop {
        tokio::select! {
            biased;
            _ = stop_requested(&mut stop_rx) => break,
            res = process_tick(&mut cursor, &ctx) => {
                if let Err(err) = res {
                    if !err.is_recoverable() {
                        warn!(%err, "L1 ingestion cannot continue");
                        break;
                    }
                    handle_tick_error(&err);
                }
            }
        }

        tokio::select! {
            biased;
            _ = stop_requested(&mut stop_rx) => break,
            _ = tokio::time::sleep(ctx.poll_interval) => {}
        }
    }

    info!(last_scanned = %cursor.last_scanned(), "L1 ingestion task stopped");
}

/// Resolves once a stop was signalled or the handle is gone.
async fn stop_requested(stop_rx: &mut watch::Receiver<bool>) {
    loop {
        if *stop_rx.borrow_and_update() {
            return;
        }
        if stop_rx.changed().await.is_err() {
            return;
        }
    }
}

fn handle_tick_error(err: &IngestionError) {
    warn!(%err, "failed to scan L1 window, will rescan");
}

/// One poll: report the height if it moved, then scan the unscanned window.
pub(crate) async fn process_tick<P: ChainProvider>(
    cursor: &mut ScanCursor,
    ctx: &IngestionCtx<P>,
) -> Result<(), IngestionError> {
    let height = fetch_height_with_retry(ctx).await;
    if cursor.observe_height(height) {
        debug!(%height, "new L1 height");
        ctx.emit(L1Event::BlockHeight(height)).await?;
    }

    let window = cursor.window(height);
    if window.is_empty() {
        trace!(%height, "nothing to scan");
        return Ok(());
    }

    let deposits = ctx
        .query(list_deposits_checked(
            ctx.provider.as_ref(),
            window.from,
            window.to,
        ))
        .await?;
    if !deposits.is_empty() {
        info!(from = %window.from, to = %window.to, count = deposits.len(), "found deposits");
        ctx.emit(L1Event::Deposits(deposits)).await?;
    }

    cursor.advance(window);
    Ok(())
}

/// Polls the tip height until it succeeds, backing off by the poll interval between attempts.
pub(crate) async fn fetch_height_with_retry<P: ChainProvider>(ctx: &IngestionCtx<P>) -> u64 {
    let mut attempt: u64 = 0;
    loop {
        attempt += 1;
        match ctx.query(ctx.provider.current_height()).await {
            Ok(height) => return height,
            Err(err) => {
                warn!(%err, %attempt, "failed to fetch L1 height, retrying");
            }
        }
        tokio::time::sleep(ctx.poll_interval).await;
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::VecDeque,
        future,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc, Mutex,
        },
    };

    use async_trait::async_trait;
    use bitcoin::Txid;
    use covbridge_common::{ChainProviderError, MockChainProvider};
    use covbridge_test_utils::{test_l2_address, test_outpoint};
    use covbridge_types::{AmountField, Deposit, L1TxRef};
    use mockall::predicate::eq;

    use crate::reader::{IngestionBuilder, IngestionHandle};

    use super::*;

    fn deposit_at(height: u64) -> Deposit {
        Deposit::new(
            test_l2_address(height as u8),
            AmountField::try_new(1_000).unwrap(),
            L1TxRef::new(test_outpoint(height as u8).txid, 1, height),
        )
    }

    fn scripted_heights(mock: &mut MockChainProvider, heights: &[u64]) {
        let last = *heights.last().unwrap();
        let queue = Mutex::new(heights.iter().copied().collect::<VecDeque<_>>());
        mock.expect_current_height()
            .returning(move || Ok(queue.lock().unwrap().pop_front().unwrap_or(last)));
    }

    async fn collect(handle: &mut IngestionHandle, n: usize) -> Vec<L1Event> {
        let mut events = Vec::with_capacity(n);
        while events.len() < n {
            events.push(handle.next_event().await.expect("task exited early"));
        }
        events
    }

    #[tokio::test(start_paused = true)]
    async fn test_height_and_deposit_events_in_order() {
        let mut mock = MockChainProvider::new();
        scripted_heights(&mut mock, &[10, 10, 11, 13]);
        mock.expect_list_deposits()
            .with(eq(11), eq(11))
            .times(1)
            .returning(|_, _| Ok(vec![deposit_at(11)]));
        mock.expect_list_deposits()
            .with(eq(12), eq(13))
            .times(1)
            .returning(|_, _| Ok(vec![deposit_at(13)]));

        let (mut handle, task) = IngestionBuilder::new(Arc::new(mock), 10)
            .with_poll_interval_ms(100)
            .build();
        let task = tokio::spawn(task);

        let events = collect(&mut handle, 5).await;
        assert_eq!(
            events,
            vec![
                L1Event::BlockHeight(10),
                L1Event::BlockHeight(11),
                L1Event::Deposits(vec![deposit_at(11)]),
                L1Event::BlockHeight(13),
                L1Event::Deposits(vec![deposit_at(13)]),
            ]
        );

        handle.stop();
        task.await.expect("mock expectations hold");
    }

    #[tokio::test(start_paused = true)]
    async fn test_height_retried_until_success() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut mock = MockChainProvider::new();
        let counter = calls.clone();
        mock.expect_current_height().returning(move || {
            if counter.fetch_add(1, Ordering::SeqCst) < 3 {
                Err(ChainProviderError::network("connection refused"))
            } else {
                Ok(5)
            }
        });
        mock.expect_list_deposits()
            .with(eq(1), eq(5))
            .times(1)
            .returning(|_, _| Ok(vec![]));

        let (mut handle, task) = IngestionBuilder::new(Arc::new(mock), 0)
            .with_poll_interval_ms(50)
            .build();
        let task = tokio::spawn(task);

        assert_eq!(handle.next_event().await, Some(L1Event::BlockHeight(5)));
        assert!(calls.load(Ordering::SeqCst) >= 4);

        handle.stop();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_deposit_failure_rescans_window() {
        let mut mock = MockChainProvider::new();
        mock.expect_current_height().returning(|| Ok(3));
        let failures = AtomicUsize::new(0);
        mock.expect_list_deposits()
            .with(eq(1), eq(3))
            .times(2)
            .returning(move |_, _| {
                if failures.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(ChainProviderError::rpc("block not available"))
                } else {
                    Ok(vec![deposit_at(2)])
                }
            });

        let (mut handle, task) = IngestionBuilder::new(Arc::new(mock), 0)
            .with_poll_interval_ms(10)
            .build();
        let task = tokio::spawn(task);

        let events = collect(&mut handle, 2).await;
        assert_eq!(
            events,
            vec![
                L1Event::BlockHeight(3),
                L1Event::Deposits(vec![deposit_at(2)]),
            ]
        );

        handle.stop();
        task.await.expect("window scanned exactly twice");
    }

    /// Hangs on the first height query, answers afterwards.
    #[derive(Debug, Default)]
    struct HangsOnce {
        height_calls: AtomicUsize,
    }

    #[async_trait]
    impl ChainProvider for HangsOnce {
        async fn current_height(&self) -> Result<u64, ChainProviderError> {
            if self.height_calls.fetch_add(1, Ordering::SeqCst) == 0 {
                future::pending::<()>().await;
            }
            Ok(7)
        }

        async fn get_raw_transaction(&self, txid: &Txid) -> Result<Vec<u8>, ChainProviderError> {
            Err(ChainProviderError::NotFound(*txid))
        }

        async fn list_deposits(
            &self,
            _from: u64,
            _to: u64,
        ) -> Result<Vec<Deposit>, ChainProviderError> {
            Ok(vec![])
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_query_times_out() {
        let provider = Arc::new(HangsOnce::default());
        let (mut handle, task) = IngestionBuilder::new(provider.clone(), 7)
            .with_poll_interval_ms(100)
            .with_query_timeout_ms(500)
            .build();
        let task = tokio::spawn(task);

        assert_eq!(handle.next_event().await, Some(L1Event::BlockHeight(7)));
        assert_eq!(provider.height_calls.load(Ordering::SeqCst), 2);

        handle.stop();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_and_drop_end_task() {
        let mut mock = MockChainProvider::new();
        mock.expect_current_height().returning(|| Ok(1));
        mock.expect_list_deposits().returning(|_, _| Ok(vec![]));
        let (mut handle, task) = IngestionBuilder::new(Arc::new(mock), 0).build();
        let task = tokio::spawn(task);

        assert_eq!(handle.next_event().await, Some(L1Event::BlockHeight(1)));
        handle.stop();
        task.await.unwrap();
        assert_eq!(handle.next_event().await, None);

        let mut mock = MockChainProvider::new();
        mock.expect_current_height().returning(|| Ok(1));
        let (handle, task) = IngestionBuilder::new(Arc::new(mock), 1).build();
        let task = tokio::spawn(task);
        drop(handle);
        task.await.unwrap();
    }
}
