use std::{env, path::PathBuf};

use argh::FromArgs;
use bitcoin::Txid;

/// Configs overridable by environment.
#[derive(Debug, Clone)]
pub(crate) struct EnvArgs {
    /// Directory for file logging
    pub log_dir: Option<PathBuf>,
    /// Service label to include in service name
    pub service_label: Option<String>,
}

impl EnvArgs {
    pub(crate) fn from_env() -> Self {
        Self {
            log_dir: env::var("COVBRIDGE_LOG_DIR").ok().map(PathBuf::from),
            service_label: env::var("COVBRIDGE_SVC_LABEL").ok(),
        }
    }
}

#[derive(Debug, Clone, FromArgs)]
#[argh(description = "Covenant bridge operator")]
pub(crate) struct Args {
    #[argh(option, short = 'c', description = "path to the TOML config file")]
    pub config: PathBuf,

    #[argh(
        option,
        short = 's',
        description = "last L1 height already scanned (overrides config)"
    )]
    pub start_height: Option<u64>,

    #[argh(
        option,
        description = "trace the expander lineage of this txid back to its batch and exit"
    )]
    pub trace_expander: Option<Txid>,
}
