use std::collections::{BTreeMap, BTreeSet};

use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

use crate::{Log, StateHandle};

/// An account held by [`MemoryState`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Balance in wei.
    #[serde(default)]
    pub balance: U256,
    /// Nonce.
    #[serde(default)]
    pub nonce: u64,
    /// Deployed code.
    #[serde(default, skip_serializing_if = "<[u8]>::is_empty")]
    pub code: Bytes,
}

impl Account {
    /// Returns `true` if the account has no balance, no nonce and no code.
    pub fn is_empty(&self) -> bool {
        self.balance.is_zero() && self.nonce == 0 && self.code.is_empty()
    }
}

/// The journaled part of [`MemoryState`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Journal {
    accounts: BTreeMap<Address, Account>,
    touched: BTreeSet<Address>,
    logs: BTreeMap<B256, Vec<Log>>,
    log_size: u64,
}

impl Journal {
    fn account_mut(&mut self, address: Address) -> &mut Account {
        self.touched.insert(address);
        self.accounts.entry(address).or_default()
    }
}

/// A [`StateHandle`] keeping every account in memory.
///
/// Snapshots are full copies of the journal, which is fine for the handful of accounts a test
/// touches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryState {
    journal: Journal,
    snapshots: Vec<Journal>,
    tx_hash: B256,
    block_hash: B256,
    tx_index: usize,
}

impl MemoryState {
    /// Creates a state holding `accounts`.
    pub fn from_accounts(accounts: impl IntoIterator<Item = (Address, Account)>) -> Self {
        let journal = Journal { accounts: accounts.into_iter().collect(), ..Default::default() };
        Self { journal, ..Default::default() }
    }

    /// Sets the balance of `address`.
    pub fn account_balance(mut self, address: Address, balance: U256) -> Self {
        self.journal.accounts.entry(address).or_default().balance = balance;
        self
    }

    /// Sets the nonce of `address`.
    pub fn account_nonce(mut self, address: Address, nonce: u64) -> Self {
        self.journal.accounts.entry(address).or_default().nonce = nonce;
        self
    }

    /// Deploys `code` at `address`.
    pub fn account_code(mut self, address: Address, code: Bytes) -> Self {
        self.journal.accounts.entry(address).or_default().code = code;
        self
    }

    /// Returns the account at `address`, if it exists.
    pub fn account(&self, address: Address) -> Option<&Account> {
        self.journal.accounts.get(&address)
    }

    /// Iterates over every account in address order.
    pub fn accounts(&self) -> impl Iterator<Item = (&Address, &Account)> {
        self.journal.accounts.iter()
    }

    /// Returns every log recorded so far, ordered by log index.
    pub fn all_logs(&self) -> Vec<Log> {
        let mut logs: Vec<_> = self.journal.logs.values().flatten().cloned().collect();
        logs.sort_by_key(|log| log.log_index);
        logs
    }
}

impl StateHandle for MemoryState {
    fn prepare(&mut self, tx_hash: B256, block_hash: B256, tx_index: usize) {
        if block_hash != self.block_hash {
            // log indices count from zero in every block
            self.journal.log_size = 0;
        }
        self.tx_hash = tx_hash;
        self.block_hash = block_hash;
        self.tx_index = tx_index;
    }

    fn finalise(&mut self, delete_empty_accounts: bool) {
        let touched = core::mem::take(&mut self.journal.touched);
        if delete_empty_accounts {
            for address in touched {
                if self.journal.accounts.get(&address).is_some_and(Account::is_empty) {
                    self.journal.accounts.remove(&address);
                }
            }
        }
        self.snapshots.clear();
    }

    fn logs(&self, tx_hash: B256) -> Vec<Log> {
        self.journal.logs.get(&tx_hash).cloned().unwrap_or_default()
    }

    fn add_log(&mut self, log: alloy_primitives::Log) {
        let log = Log {
            block_hash: self.block_hash,
            transaction_hash: self.tx_hash,
            transaction_index: self.tx_index as u64,
            log_index: self.journal.log_size,
            ..Log::new(log)
        };
        self.journal.logs.entry(self.tx_hash).or_default().push(log);
        self.journal.log_size += 1;
    }

    fn block_hash(&self) -> B256 {
        self.block_hash
    }

    fn tx_hash(&self) -> B256 {
        self.tx_hash
    }

    fn tx_index(&self) -> usize {
        self.tx_index
    }

    fn snapshot(&mut self) -> usize {
        self.snapshots.push(self.journal.clone());
        self.snapshots.len() - 1
    }

    fn revert_to_snapshot(&mut self, id: usize) {
        self.snapshots.truncate(id + 1);
        if let Some(journal) = self.snapshots.pop() {
            self.journal = journal;
        }
    }

    fn exists(&self, address: Address) -> bool {
        self.journal.accounts.contains_key(&address)
    }

    fn balance(&self, address: Address) -> U256 {
        self.account(address).map(|account| account.balance).unwrap_or_default()
    }

    fn add_balance(&mut self, address: Address, amount: U256) {
        let account = self.journal.account_mut(address);
        account.balance = account.balance.saturating_add(amount);
    }

    fn sub_balance(&mut self, address: Address, amount: U256) {
        let account = self.journal.account_mut(address);
        account.balance = account.balance.saturating_sub(amount);
    }

    fn set_balance(&mut self, address: Address, amount: U256) {
        self.journal.account_mut(address).balance = amount;
    }

    fn nonce(&self, address: Address) -> u64 {
        self.account(address).map(|account| account.nonce).unwrap_or_default()
    }

    fn set_nonce(&mut self, address: Address, nonce: u64) {
        self.journal.account_mut(address).nonce = nonce;
    }

    fn code(&self, address: Address) -> Bytes {
        self.account(address).map(|account| account.code.clone()).unwrap_or_default()
    }

    fn set_code(&mut self, address: Address, code: Bytes) {
        self.journal.account_mut(address).code = code;
    }
}
