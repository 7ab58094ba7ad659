use std::collections::BTreeSet;

use alloy_hardforks::ForkCondition;
use alloy_primitives::{Address, BlockNumber};
use serde::{Deserialize, Serialize};

use crate::{constants, AbeyHardfork, ForkSchedule, HashScheme};

/// Chain configuration consumed by the state processor.
///
/// Fork thresholds are block heights. A missing threshold means the fork never activates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainConfig {
    /// Chain id used by signature recovery.
    pub chain_id: u64,
    /// The first sender deny list applies to blocks strictly above this height.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forbid_v1_block: Option<BlockNumber>,
    /// The second sender deny list applies to blocks strictly above this height.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forbid_v2_block: Option<BlockNumber>,
    /// First block whose transactions are keyed by the TIP10 hash.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tip10_block: Option<BlockNumber>,
    /// Senders rejected once the first deny list is active.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub forbidden_senders: BTreeSet<Address>,
    /// Senders rejected once the second deny list is active.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub forbidden_senders_v2: BTreeSet<Address>,
}

impl ChainConfig {
    /// Creates a configuration for `chain_id` with no fork activated.
    pub const fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            forbid_v1_block: None,
            forbid_v2_block: None,
            tip10_block: None,
            forbidden_senders: BTreeSet::new(),
            forbidden_senders_v2: BTreeSet::new(),
        }
    }

    /// Main network thresholds for the sender deny lists. The deny lists themselves and the
    /// TIP10 height are supplied by the node's genesis configuration.
    pub const fn mainnet() -> Self {
        Self {
            chain_id: constants::MAINNET_CHAIN_ID,
            forbid_v1_block: Some(constants::MAINNET_FORBID_V1_BLOCK),
            forbid_v2_block: Some(constants::MAINNET_FORBID_V2_BLOCK),
            tip10_block: None,
            forbidden_senders: BTreeSet::new(),
            forbidden_senders_v2: BTreeSet::new(),
        }
    }

    /// Sets the TIP10 activation height.
    pub fn with_tip10_block(mut self, block: BlockNumber) -> Self {
        self.tip10_block = Some(block);
        self
    }

    /// Sets the height above which `senders` are rejected.
    pub fn with_forbid_v1(
        mut self,
        block: BlockNumber,
        senders: impl IntoIterator<Item = Address>,
    ) -> Self {
        self.forbid_v1_block = Some(block);
        self.forbidden_senders = senders.into_iter().collect();
        self
    }

    /// Sets the height above which `senders` are rejected by the stricter list.
    pub fn with_forbid_v2(
        mut self,
        block: BlockNumber,
        senders: impl IntoIterator<Item = Address>,
    ) -> Self {
        self.forbid_v2_block = Some(block);
        self.forbidden_senders_v2 = senders.into_iter().collect();
        self
    }

    /// Returns the activation condition of `fork`.
    ///
    /// The deny lists apply strictly above their threshold, TIP10 from its threshold on. A fork
    /// without a threshold never activates.
    pub fn fork_activation(&self, fork: AbeyHardfork) -> ForkCondition {
        let first_block = match fork {
            AbeyHardfork::ForbidV1 => self.forbid_v1_block.and_then(|block| block.checked_add(1)),
            AbeyHardfork::ForbidV2 => self.forbid_v2_block.and_then(|block| block.checked_add(1)),
            AbeyHardfork::Tip10 => self.tip10_block,
        };
        first_block.map_or(ForkCondition::Never, ForkCondition::Block)
    }

    /// Returns `true` if the TIP10 transaction hash is authoritative at `number`.
    ///
    /// This is the only place deciding between the two hash schemes.
    pub fn is_tip10(&self, number: BlockNumber) -> bool {
        self.fork_activation(AbeyHardfork::Tip10).active_at_block(number)
    }

    /// Builds the height-ordered fork schedule for this configuration.
    pub fn fork_schedule(&self) -> Result<ForkSchedule, ConfigError> {
        ForkSchedule::new(self)
    }

    /// Returns the transaction hash scheme used to key receipts and logs at `number`.
    pub fn hash_scheme(&self, number: BlockNumber) -> HashScheme {
        if self.is_tip10(number) {
            HashScheme::Tip10
        } else {
            HashScheme::Legacy
        }
    }
}

/// Execution flags forwarded to the message executor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmConfig {
    /// Ask the executor to record an execution trace.
    #[serde(default)]
    pub trace: bool,
}

/// Error returned for an inconsistent chain configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The stricter deny list must activate after the first one.
    #[error("forbid v2 block {v2} must be above forbid v1 block {v1}")]
    ForkOrder {
        /// First deny list threshold
        v1: BlockNumber,
        /// Second deny list threshold
        v2: BlockNumber,
    },
    /// The stricter deny list cannot exist without the first one.
    #[error("forbid v2 block {0} configured without a forbid v1 block")]
    MissingForbidV1(BlockNumber),
}
