use alloy_consensus::Header;
use alloy_primitives::U256;

use crate::{
    receipts_bloom, ChainContext, ChainReward, ConsensusEngine, FinalizeError, Receipt,
    RewardInfo, StateHandle, Transaction,
};

/// A consensus engine paying a fixed reward plus the collected fees to the block beneficiary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticRewardEngine {
    /// Reward paid to the beneficiary of every block.
    pub block_reward: U256,
    /// Extra reward paid to a foundation account.
    pub foundation: Option<RewardInfo>,
    /// Makes every finalization fail with this reason.
    pub reject: Option<String>,
}

impl StaticRewardEngine {
    /// Creates an engine paying `block_reward` per block.
    pub fn new(block_reward: U256) -> Self {
        Self { block_reward, ..Default::default() }
    }

    /// Also pays `foundation` on every block.
    pub fn with_foundation(mut self, foundation: RewardInfo) -> Self {
        self.foundation = Some(foundation);
        self
    }

    /// Creates an engine refusing every block.
    pub fn rejecting(reason: impl Into<String>) -> Self {
        Self { reject: Some(reason.into()), ..Default::default() }
    }
}

impl<S: StateHandle + ?Sized> ConsensusEngine<S> for StaticRewardEngine {
    type Reward = ChainReward;

    fn finalize(
        &self,
        _chain: &dyn ChainContext,
        header: &Header,
        state: &mut S,
        _transactions: &[Transaction],
        receipts: &[Receipt],
        fee_amount: U256,
    ) -> Result<(Header, Self::Reward), FinalizeError> {
        if let Some(reason) = &self.reject {
            return Err(FinalizeError::Reward(reason.clone()));
        }

        let coinbase = RewardInfo {
            address: header.beneficiary,
            amount: self.block_reward.saturating_add(fee_amount),
        };
        state.add_balance(coinbase.address, coinbase.amount);
        if let Some(foundation) = self.foundation {
            state.add_balance(foundation.address, foundation.amount);
        }
        state.finalise(true);

        let mut header = header.clone();
        header.gas_used = receipts.last().map_or(0, |receipt| receipt.cumulative_gas_used);
        header.logs_bloom = receipts_bloom(receipts);

        let reward =
            ChainReward { height: header.number, coinbase, foundation: self.foundation, fee_amount };
        Ok((header, reward))
    }
}
