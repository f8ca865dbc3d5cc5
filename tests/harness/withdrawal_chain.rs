use bitcoin::{OutPoint, Transaction, Txid};
use covbridge_l1tx::CovenantUtxo;
use covbridge_test_utils::{
    batch_creation_tx, expander_script, gen_withdrawals, two_children_tx, InMemoryChainProvider,
};
use covbridge_tree::ExpansionTree;
use covbridge_types::{CovenantState, Hash256, Withdrawal};

/// Bridge balance left behind by the batch creation.
pub const BRIDGE_AMOUNT: u64 = 50_000;

/// A withdrawal batch fully expanded on a simulated chain.
///
/// Every internal node of the plan is split by its own transaction, down to one expander per
/// leaf. All transactions are served by `provider`.
#[derive(Debug)]
pub struct WithdrawalChain {
    pub withdrawals: Vec<Withdrawal>,
    pub plan: ExpansionTree,
    pub provider: InMemoryChainProvider,
    pub creation: Transaction,
    /// Outpoint holding each node, indexed `[depth][index]`.
    pub outpoints: Vec<Vec<OutPoint>>,
}

impl WithdrawalChain {
    pub fn build(amounts: &[u64]) -> Self {
        let withdrawals = gen_withdrawals(amounts);
        let plan = ExpansionTree::build(&withdrawals).expect("valid withdrawals");
        let provider = InMemoryChainProvider::default();

        let creation = batch_creation_tx(BRIDGE_AMOUNT, Hash256::new([0xbb; 32]), plan.root());
        provider.insert_tx(&creation);
        let mut outpoints = vec![vec![OutPoint::new(creation.compute_txid(), 2)]];

        for depth in 0..plan.height() {
            let mut next = Vec::new();
            for (index, parent) in outpoints[depth as usize].iter().enumerate() {
                let (left, right) = plan.children(depth, index).expect("internal node");
                let tx = two_children_tx(*parent, left, right);
                provider.insert_tx(&tx);
                let txid = tx.compute_txid();
                next.push(OutPoint::new(txid, 1));
                next.push(OutPoint::new(txid, 2));
            }
            outpoints.push(next);
        }

        Self {
            withdrawals,
            plan,
            provider,
            creation,
            outpoints,
        }
    }

    pub fn state(&self, depth: u32, index: usize) -> &CovenantState {
        self.plan.node(depth, index).expect("node in plan")
    }

    /// The expander utxo at `(depth, index)` claiming its planned state.
    pub fn utxo(&self, depth: u32, index: usize) -> CovenantUtxo {
        let state = self.state(depth, index).clone();
        CovenantUtxo {
            outpoint: self.outpoints[depth as usize][index],
            script_pubkey: expander_script(),
            amount: state.total_amount().expect("amount in range").get(),
            state,
        }
    }

    /// One txid per node at `depth`, in node order.
    pub fn level_txids(&self, depth: u32) -> Vec<Txid> {
        self.outpoints[depth as usize]
            .iter()
            .map(|o| o.txid)
            .collect()
    }
}
