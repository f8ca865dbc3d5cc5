use std::{fs, path::Path};

use anyhow::{bail, Context};
use covbridge_common::KeypairSigner;
use covbridge_config::{Config, CovenantsConfig};
use covbridge_l1tx::{CovenantKind, CovenantScripts, DepositFilterConfig, StaticCovenantScripts};
use tracing::debug;

pub(crate) fn load_config(path: &Path) -> anyhow::Result<Config> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
}

/// Loads the operator key from a file holding 32 hex-encoded bytes.
pub(crate) fn load_operator_key(path: &Path) -> anyhow::Result<KeypairSigner> {
    debug!(?path, "loading operator key");
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading operator key {}", path.display()))?;
    let bytes = hex::decode(raw.trim()).context("operator key is not hex")?;
    let Ok(bytes) = <[u8; 32]>::try_from(bytes.as_slice()) else {
        bail!("operator key must be 32 bytes, got {}", bytes.len());
    };
    Ok(KeypairSigner::from_secret_bytes(&bytes)?)
}

pub(crate) fn load_covenant_scripts(
    cfg: &CovenantsConfig,
) -> anyhow::Result<StaticCovenantScripts> {
    Ok(StaticCovenantScripts::from_hex(
        &cfg.bridge,
        &cfg.deposit_aggregator,
        &cfg.withdrawal_expander,
    )?)
}

pub(crate) fn deposit_filter(
    cfg: &CovenantsConfig,
    scripts: &impl CovenantScripts,
) -> anyhow::Result<DepositFilterConfig> {
    let magic = hex::decode(&cfg.deposit_magic).context("deposit magic is not hex")?;
    let Ok(magic) = <[u8; 4]>::try_from(magic.as_slice()) else {
        bail!("deposit magic must be 4 bytes, got {}", magic.len());
    };
    Ok(DepositFilterConfig {
        aggregator_spk: scripts.locking_script(CovenantKind::DepositAggregator),
        magic,
    })
}
