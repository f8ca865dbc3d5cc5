use std::path::PathBuf;

use bitcoin::Network;
use serde::{Deserialize, Serialize};

/// Default value for `poll_interval_ms` in [`ReaderConfig`].
const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;

/// Default value for `query_timeout_ms` in [`ReaderConfig`].
const DEFAULT_QUERY_TIMEOUT_MS: u64 = 5_000;

/// Default number of deposits per batch.
const DEFAULT_DEPOSIT_BATCH_SIZE: usize = 4;

/// Default hop limit when tracing an expander lineage.
const DEFAULT_MAX_LINEAGE_HOPS: usize = 64;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BitcoindConfig {
    pub rpc_url: String,
    pub rpc_user: String,
    pub rpc_password: String,
    pub network: Network,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_count: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_interval: Option<u64>,
}

/// L1 event ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Delay between height polls, also used as the retry backoff.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Upper bound on a single chain query.
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,

    /// Last height considered already scanned.
    #[serde(default)]
    pub start_height: u64,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            query_timeout_ms: DEFAULT_QUERY_TIMEOUT_MS,
            start_height: 0,
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_query_timeout_ms() -> u64 {
    DEFAULT_QUERY_TIMEOUT_MS
}

/// Hex-encoded locking scripts of the deployed covenants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CovenantsConfig {
    pub bridge: String,
    pub deposit_aggregator: String,
    pub withdrawal_expander: String,

    /// 4-byte tag carried by deposit data outputs, hex encoded.
    pub deposit_magic: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorConfig {
    /// File holding the operator's hex-encoded secret key.
    pub key_file: PathBuf,

    #[serde(default = "default_deposit_batch_size")]
    pub deposit_batch_size: usize,

    #[serde(default = "default_max_lineage_hops")]
    pub max_lineage_hops: usize,
}

fn default_deposit_batch_size() -> usize {
    DEFAULT_DEPOSIT_BATCH_SIZE
}

fn default_max_lineage_hops() -> usize {
    DEFAULT_MAX_LINEAGE_HOPS
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    /// Service label to append to the service name (e.g., "prod", "dev").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_label: Option<String>,

    /// Directory path for file-based logging.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,

    /// Prefix for log file names.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file_prefix: Option<String>,

    /// Use JSON format for logs instead of compact format.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_format: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub bitcoind: BitcoindConfig,

    #[serde(default)]
    pub reader: ReaderConfig,

    pub covenants: CovenantsConfig,
    pub operator: OperatorConfig,

    /// Logging configuration (optional section in TOML).
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[cfg(test)]
mod test {
    use super::*;

    const MINIMAL: &str = r#"
        [bitcoind]
        rpc_url = "http://localhost:18332"
        rpc_user = "covbridge"
        rpc_password = "covbridge"
        network = "regtest"

        [covenants]
        bridge = "5120b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1"
        deposit_aggregator = "5120a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1"
        withdrawal_expander = "5120e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1"
        deposit_magic = "43564252"

        [operator]
        key_file = "/path/to/operator.key"
    "#;

    #[test]
    fn test_config_defaults() {
        let config = toml::from_str::<Config>(MINIMAL);
        assert!(
            config.is_ok(),
            "should be able to load minimal TOML config but got: {:?}",
            config.err()
        );
        let config = config.unwrap();

        assert_eq!(config.bitcoind.network, Network::Regtest);
        assert!(config.bitcoind.retry_count.is_none());
        assert_eq!(config.reader.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
        assert_eq!(config.reader.query_timeout_ms, DEFAULT_QUERY_TIMEOUT_MS);
        assert_eq!(config.reader.start_height, 0);
        assert_eq!(config.operator.deposit_batch_size, 4);
        assert_eq!(config.operator.max_lineage_hops, 64);
        assert!(config.logging.log_dir.is_none());
    }

    #[test]
    fn test_config_overrides() {
        let config_string = format!(
            r#"{MINIMAL}
            [reader]
            poll_interval_ms = 200
            query_timeout_ms = 50
            start_height = 812000

            [logging]
            service_label = "dev"
            log_dir = "/var/log/covbridge"
            json_format = true
            "#
        );

        let config = toml::from_str::<Config>(&config_string).unwrap();
        assert_eq!(config.reader.poll_interval_ms, 200);
        assert_eq!(config.reader.query_timeout_ms, 50);
        assert_eq!(config.reader.start_height, 812_000);
        assert_eq!(config.logging.service_label.as_deref(), Some("dev"));
        assert_eq!(config.logging.json_format, Some(true));
    }

    #[test]
    fn test_missing_section_rejected() {
        let config_string = r#"
            [bitcoind]
            rpc_url = "http://localhost:18332"
            rpc_user = "covbridge"
            rpc_password = "covbridge"
            network = "regtest"
        "#;
        assert!(toml::from_str::<Config>(config_string).is_err());
    }
}
