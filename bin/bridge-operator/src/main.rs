//! Covenant bridge operator.
//!
//! Follows L1 for deposits, groups them into batches and plans their aggregation. With
//! `--trace-expander` it instead verifies the expander history of one transaction and exits.

mod args;
mod batcher;
mod helpers;

use std::sync::Arc;

use anyhow::Context;
use args::{Args, EnvArgs};
use batcher::{log_aggregation_plan, DepositBatcher};
use bitcoin::Txid;
use bitcoind_async_client::{Auth, Client};
use covbridge_btcio::{BitcoindChainProvider, IngestionBuilder, IngestionHandle, L1Event};
use covbridge_common::{
    logging::{self, LoggingInitConfig},
    ChainProvider, Signer,
};
use covbridge_config::{BitcoindConfig, Config};
use covbridge_l1tx::trace_lineage;
use helpers::{deposit_filter, load_config, load_covenant_scripts, load_operator_key};
use tracing::*;

const SERVICE_NAME: &str = "bridge-operator";

fn main() -> anyhow::Result<()> {
    let args: Args = argh::from_env();
    if let Err(e) = main_inner(args) {
        eprintln!("FATAL ERROR: {e:#}");

        return Err(e);
    }

    Ok(())
}

fn main_inner(args: Args) -> anyhow::Result<()> {
    let config = load_config(&args.config)?;
    init_logging(&config);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("covbridge-rt")
        .build()
        .context("init: build rt")?;

    let signer = load_operator_key(&config.operator.key_file)?;
    info!(
        pubkey = %signer.public_key(),
        address = %signer.address(config.bitcoind.network),
        "loaded operator key"
    );

    let scripts = load_covenant_scripts(&config.covenants)?;
    let filter = deposit_filter(&config.covenants, &scripts)?;
    let client = create_bitcoin_rpc_client(&config.bitcoind)?;
    let provider = Arc::new(BitcoindChainProvider::new(client, filter));

    if let Some(txid) = args.trace_expander {
        return runtime.block_on(trace_expander(
            txid,
            config.operator.max_lineage_hops,
            provider.as_ref(),
        ));
    }

    let last_scanned = args.start_height.unwrap_or(config.reader.start_height);
    let (handle, task) = IngestionBuilder::new(provider, last_scanned)
        .with_poll_interval_ms(config.reader.poll_interval_ms)
        .with_query_timeout_ms(config.reader.query_timeout_ms)
        .build();
    let batcher = DepositBatcher::new(config.operator.deposit_batch_size)?;

    runtime.block_on(async {
        let task = tokio::spawn(task);
        let res = run_operator(handle, batcher).await;
        task.await.context("ingestion task panicked")?;
        res
    })
}

/// Consumes ingestion events until interrupted or the task exits.
async fn run_operator(
    mut handle: IngestionHandle,
    mut batcher: DepositBatcher,
) -> anyhow::Result<()> {
    loop {
        let event = tokio::select! {
            res = tokio::signal::ctrl_c() => {
                res.context("listening for ctrl-c")?;
                info!("shutdown requested");
                handle.stop();
                continue;
            }
            event = handle.next_event() => event,
        };

        match event {
            Some(L1Event::BlockHeight(height)) => {
                info!(%height, pending = batcher.pending(), "L1 tip moved");
            }
            Some(L1Event::Deposits(deposits)) => {
                for batch in batcher.push(deposits)? {
                    log_aggregation_plan(&batch)?;
                    if enabled!(Level::DEBUG) {
                        let snapshot = serde_json::to_string(&batch)?;
                        debug!(%snapshot, "deposit batch");
                    }
                }
            }
            None => break,
        }
    }

    info!(pending = batcher.pending(), "operator stopped");
    Ok(())
}

async fn trace_expander(
    txid: Txid,
    max_hops: usize,
    provider: &impl ChainProvider,
) -> anyhow::Result<()> {
    let lineage = trace_lineage(txid, max_hops, provider)
        .await
        .with_context(|| format!("tracing expander lineage of {txid}"))?;
    for (hop_txid, tx) in &lineage {
        info!(txid = %hop_txid, shape = ?tx.shape, hashes = ?tx.state_hashes(), "lineage hop");
    }
    info!(%txid, hops = lineage.len(), "expander lineage verified");
    Ok(())
}

fn create_bitcoin_rpc_client(config: &BitcoindConfig) -> anyhow::Result<Arc<Client>> {
    let auth = Auth::UserPass(config.rpc_user.clone(), config.rpc_password.clone());
    let client = Client::new(
        config.rpc_url.clone(),
        auth,
        config.retry_count.map(u16::from),
        config.retry_interval,
        None,
    )
    .map_err(|e| anyhow::anyhow!("init: bitcoind client: {e}"))?;
    Ok(Arc::new(client))
}

/// Sets up logging from the config file, with environment overrides.
fn init_logging(config: &Config) {
    let env_args = EnvArgs::from_env();
    let log_dir = env_args.log_dir.as_ref().or(config.logging.log_dir.as_ref());
    let service_label = env_args
        .service_label
        .as_deref()
        .or(config.logging.service_label.as_deref());

    logging::init_logging_from_config(LoggingInitConfig {
        service_base_name: SERVICE_NAME,
        service_label,
        log_dir,
        log_file_prefix: config.logging.log_file_prefix.as_deref(),
        json_format: config.logging.json_format,
        default_log_prefix: SERVICE_NAME,
    });
}
