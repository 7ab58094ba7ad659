use core::{cell::RefCell, fmt};

use alloy_consensus::Header;
use alloy_primitives::{Address, BlockNumber, B256, U256};
use auto_impl::auto_impl;

use crate::{constants::BLOCK_HASH_HISTORY, Message};

/// Read access to historical headers of the canonical chain.
#[auto_impl(&, Box, Arc)]
pub trait ChainContext {
    /// Returns the header with the given hash and number, if known.
    fn header(&self, hash: B256, number: BlockNumber) -> Option<Header>;
}

/// The environment a message executes in.
///
/// Built purely from the message, the block header and the chain, so state-mutating and
/// read-only execution observe identical environments.
pub struct ExecutionContext<'a> {
    /// Sender of the message.
    pub origin: Address,
    /// Recipient, `None` for contract creation.
    pub to: Option<Address>,
    /// Value transferred.
    pub value: U256,
    /// Gas price of the message.
    pub gas_price: U256,
    /// Block beneficiary.
    pub coinbase: Address,
    /// Block height.
    pub number: BlockNumber,
    /// Block timestamp.
    pub timestamp: u64,
    /// Block difficulty.
    pub difficulty: U256,
    /// Block gas limit.
    pub gas_limit: u64,
    parent_hash: B256,
    chain: &'a dyn ChainContext,
    /// `ancestors[i]` is the hash of block `number - 1 - i`.
    ancestors: RefCell<Vec<B256>>,
}

impl fmt::Debug for ExecutionContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("origin", &self.origin)
            .field("to", &self.to)
            .field("number", &self.number)
            .finish_non_exhaustive()
    }
}

impl<'a> ExecutionContext<'a> {
    /// Creates the context for `msg` executing in the block described by `header`.
    pub fn new(msg: &Message, header: &Header, chain: &'a dyn ChainContext) -> Self {
        Self {
            origin: msg.from,
            to: msg.to,
            value: msg.value,
            gas_price: msg.gas_price,
            coinbase: header.beneficiary,
            number: header.number,
            timestamp: header.timestamp,
            difficulty: header.difficulty,
            gas_limit: header.gas_limit,
            parent_hash: header.parent_hash,
            chain,
            ancestors: RefCell::new(Vec::new()),
        }
    }

    /// Returns the hash of ancestor `number`.
    ///
    /// Only the [`BLOCK_HASH_HISTORY`] most recent ancestors are reachable; anything else,
    /// including the current block, yields zero. Hashes are resolved by walking parent links and
    /// cached for the lifetime of the context.
    pub fn block_hash(&self, number: BlockNumber) -> B256 {
        if number >= self.number || self.number - number > BLOCK_HASH_HISTORY {
            return B256::ZERO;
        }
        let index = (self.number - number - 1) as usize;

        let mut ancestors = self.ancestors.borrow_mut();
        if ancestors.is_empty() {
            ancestors.push(self.parent_hash);
        }
        while ancestors.len() <= index {
            let known_hash = ancestors[ancestors.len() - 1];
            let known_number = self.number - ancestors.len() as u64;
            match self.chain.header(known_hash, known_number) {
                Some(header) => ancestors.push(header.parent_hash),
                None => return B256::ZERO,
            }
        }
        ancestors[index]
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{address, Bytes};

    use super::*;
    use crate::test_utils::MemoryChain;

    fn message() -> Message {
        Message {
            from: address!("00000000000000000000000000000000000000a1"),
            to: Some(address!("00000000000000000000000000000000000000b1")),
            payment: None,
            nonce: 0,
            value: U256::from(5),
            fee: None,
            gas_limit: 21_000,
            gas_price: U256::from(3),
            input: Bytes::new(),
            check_nonce: true,
        }
    }

    /// Builds a chain of `len` headers and returns it with the header of the next block.
    fn chain(len: u64) -> (MemoryChain, Header) {
        let mut chain = MemoryChain::default();
        let mut parent_hash = B256::ZERO;
        for number in 0..len {
            let header = Header { number, parent_hash, ..Default::default() };
            parent_hash = chain.insert(header);
        }
        (chain, Header { number: len, parent_hash, gas_limit: 8_000_000, ..Default::default() })
    }

    #[test]
    fn test_context_captures_message_and_header() {
        let (chain, header) = chain(1);
        let msg = message();
        let ctx = ExecutionContext::new(&msg, &header, &chain);
        assert_eq!(ctx.origin, msg.from);
        assert_eq!(ctx.to, msg.to);
        assert_eq!(ctx.value, msg.value);
        assert_eq!(ctx.gas_price, msg.gas_price);
        assert_eq!(ctx.number, 1);
        assert_eq!(ctx.gas_limit, 8_000_000);
    }

    #[test]
    fn test_block_hash_walks_ancestors() {
        let (chain, header) = chain(300);
        let msg = message();
        let ctx = ExecutionContext::new(&msg, &header, &chain);

        assert_eq!(ctx.block_hash(299), header.parent_hash);
        let expected = chain.hash_by_number(100).unwrap();
        assert_eq!(ctx.block_hash(100), expected);
        // served from the cache the second time
        assert_eq!(ctx.block_hash(100), expected);
        assert_eq!(ctx.block_hash(44), chain.hash_by_number(44).unwrap());
    }

    #[test]
    fn test_block_hash_out_of_window() {
        let (chain, header) = chain(300);
        let msg = message();
        let ctx = ExecutionContext::new(&msg, &header, &chain);
        assert_eq!(ctx.block_hash(300), B256::ZERO);
        assert_eq!(ctx.block_hash(301), B256::ZERO);
        assert_eq!(ctx.block_hash(43), B256::ZERO);
    }

    #[test]
    fn test_block_hash_unknown_ancestor() {
        let header = Header { number: 10, parent_hash: B256::repeat_byte(1), ..Default::default() };
        let chain = MemoryChain::default();
        let msg = message();
        let ctx = ExecutionContext::new(&msg, &header, &chain);
        assert_eq!(ctx.block_hash(9), B256::repeat_byte(1));
        assert_eq!(ctx.block_hash(8), B256::ZERO);
    }
}
