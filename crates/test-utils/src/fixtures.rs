use bitcoin::{hashes::Hash as _, Txid};
use covbridge_types::{
    AmountField, Deposit, Hash256, L1TxRef, L2Address, L2TxHash, Withdrawal,
};

use crate::scripts::payout_script;

pub fn test_l2_address(i: u8) -> L2Address {
    let mut bytes = [0u8; 32];
    bytes[31] = i;
    bytes[0] = 0xee;
    L2Address::new(bytes)
}

/// One deposit per amount, confirmed at height 100 in distinct transactions.
pub fn gen_deposits(amounts: &[u64]) -> Vec<Deposit> {
    amounts
        .iter()
        .enumerate()
        .map(|(i, amt)| {
            Deposit::new(
                test_l2_address(i as u8),
                AmountField::try_new(*amt).expect("test amount in range"),
                L1TxRef::new(Txid::from_byte_array([i as u8 + 1; 32]), 1, 100),
            )
        })
        .collect()
}

/// One withdrawal per amount, paying [`payout_script`]`(i)`.
pub fn gen_withdrawals(amounts: &[u64]) -> Vec<Withdrawal> {
    amounts
        .iter()
        .enumerate()
        .map(|(i, amt)| {
            Withdrawal::new(
                payout_script(i as u8),
                AmountField::try_new(*amt).expect("test amount in range"),
                L2TxHash(Hash256::new([i as u8 + 1; 32])),
            )
        })
        .collect()
}
