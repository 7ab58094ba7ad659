use std::collections::BTreeSet;

use alloy_hardforks::{hardfork, ForkCondition};
use alloy_primitives::{Address, BlockNumber};
use serde::{Deserialize, Serialize};

use crate::{ChainConfig, ConfigError};

hardfork! {
    /// Height-activated protocol upgrades of the Abey chain, in activation order.
    #[derive(Serialize, Deserialize)]
    AbeyHardfork {
        /// First sender deny list.
        ForbidV1,
        /// Second, stricter sender deny list.
        ForbidV2,
        /// Switch of the transaction hash used to key receipts and logs.
        Tip10,
    }
}

/// Transaction hash derivation used to key per-transaction effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashScheme {
    /// Hash over every transaction field, payer signature included.
    Legacy,
    /// Hash over the sender-signed envelope only.
    Tip10,
}

/// A sender has been rejected by an active deny list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("sender {sender} is forbidden since {fork}")]
pub struct ForbiddenSender {
    /// The rejected sender
    pub sender: Address,
    /// The fork whose deny list matched
    pub fork: AbeyHardfork,
}

/// One entry of the sender policy table.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SenderRule {
    fork: AbeyHardfork,
    activation: ForkCondition,
    denied: BTreeSet<Address>,
}

/// Ordered table of sender rules derived from a [`ChainConfig`].
///
/// Rules are evaluated in activation order on every call. An activated rule stays active for all
/// later heights, which keeps historical replay consistent with the chain's migration history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForkSchedule {
    sender_rules: Vec<SenderRule>,
}

impl ForkSchedule {
    /// Builds the schedule, rejecting thresholds that are not strictly ordered.
    pub fn new(config: &ChainConfig) -> Result<Self, ConfigError> {
        match (config.forbid_v1_block, config.forbid_v2_block) {
            (Some(v1), Some(v2)) if v2 <= v1 => return Err(ConfigError::ForkOrder { v1, v2 }),
            (None, Some(v2)) => return Err(ConfigError::MissingForbidV1(v2)),
            _ => {}
        }

        let sender_rules = [
            (AbeyHardfork::ForbidV1, &config.forbidden_senders),
            (AbeyHardfork::ForbidV2, &config.forbidden_senders_v2),
        ]
        .into_iter()
        .map(|(fork, denied)| SenderRule {
            fork,
            activation: config.fork_activation(fork),
            denied: denied.clone(),
        })
        .collect();

        Ok(Self { sender_rules })
    }

    /// Checks `sender` against every deny list active at `number`.
    pub fn check_sender(&self, number: BlockNumber, sender: Address) -> Result<(), ForbiddenSender> {
        for rule in &self.sender_rules {
            if !rule.activation.active_at_block(number) {
                // rules are ordered, later ones activate even later
                break;
            }
            if rule.denied.contains(&sender) {
                return Err(ForbiddenSender { sender, fork: rule.fork });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::address;
    use rstest::rstest;

    use super::*;

    const FIRST: Address = address!("00000000000000000000000000000000000000f1");
    const SECOND: Address = address!("00000000000000000000000000000000000000f2");

    fn schedule() -> ForkSchedule {
        let config = ChainConfig::new(1)
            .with_forbid_v1(100, [FIRST])
            .with_forbid_v2(200, [SECOND])
            .with_tip10_block(150);
        ForkSchedule::new(&config).unwrap()
    }

    #[rstest]
    #[case::before_v1(100, FIRST, None)]
    #[case::after_v1(101, FIRST, Some(AbeyHardfork::ForbidV1))]
    #[case::second_list_dormant(150, SECOND, None)]
    #[case::at_v2(200, SECOND, None)]
    #[case::after_v2(201, SECOND, Some(AbeyHardfork::ForbidV2))]
    #[case::first_list_still_active(500, FIRST, Some(AbeyHardfork::ForbidV1))]
    fn test_check_sender(
        #[case] number: BlockNumber,
        #[case] sender: Address,
        #[case] expected: Option<AbeyHardfork>,
    ) {
        let result = schedule().check_sender(number, sender);
        assert_eq!(result.err().map(|err| err.fork), expected);
    }

    #[test]
    fn test_unlisted_sender_always_allowed() {
        let schedule = schedule();
        assert!(schedule.check_sender(u64::MAX, Address::ZERO).is_ok());
    }

    #[rstest]
    #[case::forbid_v1("forbidv1", AbeyHardfork::ForbidV1)]
    #[case::forbid_v2("ForbidV2", AbeyHardfork::ForbidV2)]
    #[case::tip10("TIP10", AbeyHardfork::Tip10)]
    fn test_parse_fork_name(#[case] name: &str, #[case] expected: AbeyHardfork) {
        assert_eq!(name.parse::<AbeyHardfork>(), Ok(expected));
        assert_eq!(expected.to_string().parse::<AbeyHardfork>(), Ok(expected));
    }

    #[test]
    fn test_unknown_fork_name() {
        assert!("tip11".parse::<AbeyHardfork>().is_err());
    }

    #[test]
    fn test_rejects_unordered_thresholds() {
        let config = ChainConfig::new(1).with_forbid_v1(200, []).with_forbid_v2(200, []);
        assert_eq!(ForkSchedule::new(&config), Err(ConfigError::ForkOrder { v1: 200, v2: 200 }));

        let config = ChainConfig::new(1).with_forbid_v2(200, []);
        assert_eq!(ForkSchedule::new(&config), Err(ConfigError::MissingForbidV1(200)));
    }

    #[test]
    fn test_threshold_at_max_height_never_activates() {
        let config = ChainConfig::new(1).with_forbid_v1(u64::MAX, [FIRST]);
        let schedule = ForkSchedule::new(&config).unwrap();
        assert!(schedule.check_sender(u64::MAX, FIRST).is_ok());
    }
}
