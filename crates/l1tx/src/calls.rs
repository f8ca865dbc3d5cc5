//! Arguments for the next withdrawal expander invocation.
//!
//! An expander either expands into its two children or, once its subtree is small enough,
//! distributes directly to up to four payout scripts. The call is described first and only
//! turned into witness arguments once the sighash preimage of the input is known, which is also
//! the only point where the operator key is used.

use std::collections::HashMap;

use bitcoin::{OutPoint, TxOut};
use covbridge_common::Signer;
use covbridge_types::{sha256, CovenantState, Hash256, DISTRIBUTE_FANOUT, MAX_LEVEL_FOR_DISTRIBUTE};
use secp256k1::{schnorr, XOnlyPublicKey};

use crate::{backtrace::TracedExpander, errors::CallError, expander::ExpanderTransaction};

/// Per-input signing context, filled in once the spending transaction is assembled.
#[derive(Clone, Debug)]
pub struct InputCtx {
    pub sh_preimage: Vec<u8>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ExpanderMethod {
    Distribute {
        scripts: [Vec<u8>; DISTRIBUTE_FANOUT],
        amounts: [u64; DISTRIBUTE_FANOUT],
    },
    Expand {
        left_amount: u64,
        right_amount: u64,
        left_hash: Hash256,
        right_hash: Hash256,
    },
}

/// A pending expander call on input `input_index` of the spending transaction.
///
/// The covenant re-derives its own outpoint from `prev_tx`, so the call carries the traced
/// funding transaction and which of its expander outputs is being spent.
#[derive(Clone, Debug)]
pub struct ExpanderCall {
    pub input_index: usize,
    pub method: ExpanderMethod,
    pub is_first_expander_output: bool,
    pub prev_tx: ExpanderTransaction,
    /// Fee input of the spending transaction.
    pub funding_prevout: OutPoint,
    pub change: Option<TxOut>,
}

/// Fully materialized call arguments.
#[derive(Clone, Debug)]
pub struct ExpanderArgs {
    pub method: ExpanderMethod,
    pub sh_preimage: Vec<u8>,
    pub signature: schnorr::Signature,
    pub public_key: XOnlyPublicKey,
    pub is_first_expander_output: bool,
    pub prev_tx: ExpanderTransaction,
    pub funding_prevout: OutPoint,
    pub change: Option<TxOut>,
}

impl ExpanderCall {
    /// Pays the leaves of a small subtree directly.
    ///
    /// `targets` must hold exactly four leaves (padded with empty leaves) whose amounts add up
    /// to what the traced expander holds.
    pub fn distribute(
        input_index: usize,
        traced: &TracedExpander,
        subtree_height: u32,
        targets: &[CovenantState],
        funding_prevout: OutPoint,
    ) -> Result<Self, CallError> {
        if subtree_height > MAX_LEVEL_FOR_DISTRIBUTE {
            return Err(CallError::NotDistributable(subtree_height));
        }
        if targets.len() != DISTRIBUTE_FANOUT {
            return Err(CallError::WrongFanout {
                expected: DISTRIBUTE_FANOUT,
                got: targets.len(),
            });
        }

        let mut scripts: [Vec<u8>; DISTRIBUTE_FANOUT] = Default::default();
        let mut amounts = [0u64; DISTRIBUTE_FANOUT];
        for (i, target) in targets.iter().enumerate() {
            let CovenantState::Leaf {
                payout_script,
                amount,
            } = target
            else {
                return Err(CallError::NotDistributable(subtree_height));
            };
            scripts[i] = payout_script.clone();
            amounts[i] = amount.get();
        }

        let paid: u64 = amounts.iter().sum();
        let held = traced.state.total_amount()?.get();
        if paid != held {
            return Err(CallError::AmountMismatch { paid, held });
        }

        Ok(Self::spending(
            input_index,
            traced,
            ExpanderMethod::Distribute { scripts, amounts },
            funding_prevout,
        ))
    }

    /// Splits a traced internal state into its two children.
    pub fn expand(
        input_index: usize,
        traced: &TracedExpander,
        funding_prevout: OutPoint,
    ) -> Result<Self, CallError> {
        let CovenantState::Internal {
            left_amount,
            right_amount,
            left_child_hash,
            right_child_hash,
        } = &traced.state
        else {
            return Err(CallError::LeafNotExpandable);
        };

        let method = ExpanderMethod::Expand {
            left_amount: left_amount.get(),
            right_amount: right_amount.get(),
            left_hash: *left_child_hash,
            right_hash: *right_child_hash,
        };
        Ok(Self::spending(input_index, traced, method, funding_prevout))
    }

    fn spending(
        input_index: usize,
        traced: &TracedExpander,
        method: ExpanderMethod,
        funding_prevout: OutPoint,
    ) -> Self {
        Self {
            input_index,
            method,
            is_first_expander_output: traced.is_first_expander_output(),
            prev_tx: traced.prev_tx.clone(),
            funding_prevout,
            change: None,
        }
    }

    pub fn with_change(mut self, change: TxOut) -> Self {
        self.change = Some(change);
        self
    }

    /// Materializes the arguments, signing the sighash preimage of this call's input.
    pub fn build_args(
        &self,
        input_ctxs: &HashMap<usize, InputCtx>,
        signer: &impl Signer,
    ) -> Result<ExpanderArgs, CallError> {
        let ctx = input_ctxs
            .get(&self.input_index)
            .ok_or(CallError::MissingPreimage(self.input_index))?;

        let digest = sha256(&ctx.sh_preimage);
        let signature = signer.sign(digest.as_bytes())?;

        Ok(ExpanderArgs {
            method: self.method.clone(),
            sh_preimage: ctx.sh_preimage.clone(),
            signature,
            public_key: signer.public_key(),
            is_first_expander_output: self.is_first_expander_output,
            prev_tx: self.prev_tx.clone(),
            funding_prevout: self.funding_prevout,
            change: self.change.clone(),
        })
    }
}
