use alloy_consensus::Header;
use alloy_primitives::{BlockNumber, B256};

use crate::Transaction;

/// A block: header plus ordered transactions. The hash is computed once on construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    header: Header,
    transactions: Vec<Transaction>,
    hash: B256,
}

impl Block {
    /// Creates a block, sealing the header.
    pub fn new(header: Header, transactions: Vec<Transaction>) -> Self {
        let hash = header.hash_slow();
        Self { header, transactions, hash }
    }

    /// Returns the block header.
    pub const fn header(&self) -> &Header {
        &self.header
    }

    /// Returns the transactions in execution order.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Returns the block hash.
    pub const fn hash(&self) -> B256 {
        self.hash
    }

    /// Returns the block height.
    pub const fn number(&self) -> BlockNumber {
        self.header.number
    }

    /// Returns the declared gas limit.
    pub const fn gas_limit(&self) -> u64 {
        self.header.gas_limit
    }
}
