//! Operator configuration, loaded from TOML.

mod config;

pub use config::{
    BitcoindConfig, Config, CovenantsConfig, LoggingConfig, OperatorConfig, ReaderConfig,
};
