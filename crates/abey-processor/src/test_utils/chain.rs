use std::collections::BTreeMap;

use alloy_consensus::Header;
use alloy_primitives::{BlockNumber, B256};

use crate::ChainContext;

/// A chain of headers kept in memory, indexed by hash and by number.
#[derive(Debug, Clone, Default)]
pub struct MemoryChain {
    headers: BTreeMap<B256, Header>,
    canonical: BTreeMap<BlockNumber, B256>,
}

impl MemoryChain {
    /// Stores `header` as the canonical header at its height and returns its hash.
    pub fn insert(&mut self, header: Header) -> B256 {
        let hash = header.hash_slow();
        self.canonical.insert(header.number, hash);
        self.headers.insert(hash, header);
        hash
    }

    /// Returns the hash of the canonical header at `number`.
    pub fn hash_by_number(&self, number: BlockNumber) -> Option<B256> {
        self.canonical.get(&number).copied()
    }

    /// Returns the highest canonical header.
    pub fn head(&self) -> Option<&Header> {
        let (_, hash) = self.canonical.last_key_value()?;
        self.headers.get(hash)
    }
}

impl ChainContext for MemoryChain {
    fn header(&self, hash: B256, number: BlockNumber) -> Option<Header> {
        self.headers.get(&hash).filter(|header| header.number == number).cloned()
    }
}
