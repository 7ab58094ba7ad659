use alloy_primitives::{Address, BlockNumber, Bloom, B256};
use serde::{Deserialize, Serialize};

use crate::{logs_bloom, Log};

/// The outcome of one transaction in a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    /// Whether execution succeeded. A reverted transaction is `false`.
    pub status: bool,
    /// Gas used by this and all preceding transactions of the block.
    pub cumulative_gas_used: u64,
    /// Gas used by this transaction alone.
    pub gas_used: u64,
    /// Bloom filter over [`Self::logs`].
    pub logs_bloom: Bloom,
    /// Logs emitted by the transaction.
    pub logs: Vec<Log>,
    /// Transaction hash under the scheme active at the block height.
    pub transaction_hash: B256,
    /// Address of the deployed contract, set only for contract creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<Address>,
    /// Hash of the containing block.
    pub block_hash: B256,
    /// Number of the containing block.
    pub block_number: BlockNumber,
    /// Index of the transaction in the block.
    pub transaction_index: u64,
}

impl Receipt {
    /// Returns `true` if the transaction executed without reverting.
    pub const fn is_success(&self) -> bool {
        self.status
    }
}

/// Computes the combined bloom filter of `receipts`.
pub fn receipts_bloom(receipts: &[Receipt]) -> Bloom {
    logs_bloom(receipts.iter().flat_map(|receipt| receipt.logs.iter()))
}
