//! Covenant locking scripts.
//!
//! Script compilation happens elsewhere; this crate only ever sees the resulting locking
//! scripts, one per covenant kind.

use std::fmt;

use bitcoin::ScriptBuf;
use covbridge_types::CONTRACT_SCRIPT_LEN;

use crate::errors::ScriptLoadError;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum CovenantKind {
    Bridge,
    DepositAggregator,
    WithdrawalExpander,
}

impl fmt::Display for CovenantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bridge => "bridge",
            Self::DepositAggregator => "deposit aggregator",
            Self::WithdrawalExpander => "withdrawal expander",
        };
        f.write_str(name)
    }
}

/// Maps a covenant kind to its locking script.
pub trait CovenantScripts: Send + Sync {
    fn locking_script(&self, kind: CovenantKind) -> ScriptBuf;
}

/// Precompiled scripts loaded once at startup.
#[derive(Clone, Debug)]
pub struct StaticCovenantScripts {
    bridge: ScriptBuf,
    deposit_aggregator: ScriptBuf,
    withdrawal_expander: ScriptBuf,
}

impl StaticCovenantScripts {
    pub fn new(
        bridge: ScriptBuf,
        deposit_aggregator: ScriptBuf,
        withdrawal_expander: ScriptBuf,
    ) -> Result<Self, ScriptLoadError> {
        for (kind, script) in [
            (CovenantKind::Bridge, &bridge),
            (CovenantKind::DepositAggregator, &deposit_aggregator),
            (CovenantKind::WithdrawalExpander, &withdrawal_expander),
        ] {
            if script.len() != CONTRACT_SCRIPT_LEN {
                return Err(ScriptLoadError::Length {
                    kind,
                    len: script.len(),
                });
            }
        }
        Ok(Self {
            bridge,
            deposit_aggregator,
            withdrawal_expander,
        })
    }

    pub fn from_hex(
        bridge: &str,
        deposit_aggregator: &str,
        withdrawal_expander: &str,
    ) -> Result<Self, ScriptLoadError> {
        let decode = |kind, s: &str| {
            hex::decode(s)
                .map(ScriptBuf::from_bytes)
                .map_err(|source| ScriptLoadError::Hex { kind, source })
        };
        Self::new(
            decode(CovenantKind::Bridge, bridge)?,
            decode(CovenantKind::DepositAggregator, deposit_aggregator)?,
            decode(CovenantKind::WithdrawalExpander, withdrawal_expander)?,
        )
    }
}

impl CovenantScripts for StaticCovenantScripts {
    fn locking_script(&self, kind: CovenantKind) -> ScriptBuf {
        match kind {
            CovenantKind::Bridge => self.bridge.clone(),
            CovenantKind::DepositAggregator => self.deposit_aggregator.clone(),
            CovenantKind::WithdrawalExpander => self.withdrawal_expander.clone(),
        }
    }
}
