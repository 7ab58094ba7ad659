use alloy_consensus::Header;
use alloy_primitives::{Address, BlockNumber, U256};
use serde::{Deserialize, Serialize};

use crate::{ChainContext, Receipt, StateHandle, Transaction};

/// The consensus engine hook applying block rewards once all transactions executed.
pub trait ConsensusEngine<S: StateHandle + ?Sized> {
    /// Summary of the rewards applied to the block.
    type Reward;

    /// Applies the rewards for `header` to `state`, given the fees collected by the block.
    ///
    /// Returns the finalized header and the reward summary.
    fn finalize(
        &self,
        chain: &dyn ChainContext,
        header: &Header,
        state: &mut S,
        transactions: &[Transaction],
        receipts: &[Receipt],
        fee_amount: U256,
    ) -> Result<(Header, Self::Reward), FinalizeError>;
}

/// Errors raised by the consensus engine during finalization.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FinalizeError {
    /// The header is not acceptable to the engine.
    #[error("invalid header {number}: {reason}")]
    InvalidHeader {
        /// Block height
        number: BlockNumber,
        /// Why the header was refused
        reason: String,
    },
    /// The reward could not be computed or applied.
    #[error("reward computation failed: {0}")]
    Reward(String),
}

/// A single reward credited by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardInfo {
    /// Credited account.
    pub address: Address,
    /// Credited amount.
    pub amount: U256,
}

/// Summary of the rewards applied to one block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainReward {
    /// Rewarded block.
    pub height: BlockNumber,
    /// Reward paid to the block beneficiary, collected fees included.
    pub coinbase: RewardInfo,
    /// Reward paid to the foundation, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foundation: Option<RewardInfo>,
    /// Fees collected from the block's transactions.
    pub fee_amount: U256,
}
