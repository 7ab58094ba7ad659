use alloy_primitives::{Address, Bytes, B256, U256};
use auto_impl::auto_impl;

use crate::Log;

/// Mutable view of accounts and storage used while executing a block.
///
/// The handle is exclusively borrowed by one block-processing call at a time. Per-transaction
/// boundaries are marked with [`prepare`](Self::prepare) and [`finalise`](Self::finalise);
/// logs are attributed to the transaction hash given to `prepare`.
#[auto_impl(&mut, Box)]
pub trait StateHandle {
    /// Starts a transaction: subsequent logs belong to `tx_hash` at `tx_index` of `block_hash`.
    fn prepare(&mut self, tx_hash: B256, block_hash: B256, tx_index: usize);

    /// Commits the pending changes of the current transaction.
    fn finalise(&mut self, delete_empty_accounts: bool);

    /// Returns the logs recorded for `tx_hash`.
    fn logs(&self, tx_hash: B256) -> Vec<Log>;

    /// Records a log for the current transaction.
    fn add_log(&mut self, log: alloy_primitives::Log);

    /// Hash of the block given to the last `prepare`.
    fn block_hash(&self) -> B256;

    /// Hash of the transaction given to the last `prepare`.
    fn tx_hash(&self) -> B256;

    /// Index of the transaction given to the last `prepare`.
    fn tx_index(&self) -> usize;

    /// Takes a snapshot of the pending state and returns its id.
    fn snapshot(&mut self) -> usize;

    /// Reverts all changes made since snapshot `id` was taken.
    fn revert_to_snapshot(&mut self, id: usize);

    /// Returns `true` if the account exists.
    fn exists(&self, address: Address) -> bool;

    /// Returns the balance of `address`.
    fn balance(&self, address: Address) -> U256;

    /// Credits `amount` to `address`.
    fn add_balance(&mut self, address: Address, amount: U256);

    /// Debits `amount` from `address`.
    fn sub_balance(&mut self, address: Address, amount: U256);

    /// Overwrites the balance of `address`.
    fn set_balance(&mut self, address: Address, amount: U256);

    /// Returns the nonce of `address`.
    fn nonce(&self, address: Address) -> u64;

    /// Overwrites the nonce of `address`.
    fn set_nonce(&mut self, address: Address, nonce: u64);

    /// Returns the code deployed at `address`.
    fn code(&self, address: Address) -> Bytes;

    /// Deploys `code` at `address`.
    fn set_code(&mut self, address: Address, code: Bytes);
}
