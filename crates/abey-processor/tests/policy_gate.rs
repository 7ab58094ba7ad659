//! Tests for the height-keyed sender deny lists.

use abey_processor::{
    test_utils::{
        key_address, sign_tx, signing_key, transfer, MemoryChain, MemoryState,
        StaticRewardEngine, TransferExecutor,
    },
    AbeyHardfork, Block, BlockExecutionError, ChainConfig, ConfigError, StateHandle,
    StateProcessor, TxError, VmConfig,
};
use alloy_consensus::Header;
use alloy_primitives::{address, Address, BlockNumber, U256};
use rstest::rstest;

const CHAIN_ID: u64 = 179;
const RECIPIENT: Address = address!("0000000000000000000000000000000000000b0b");

/// Mainnet thresholds with the first key on the first list and the second key on the second.
fn config() -> ChainConfig {
    let mainnet = ChainConfig::mainnet();
    let v1 = mainnet.forbid_v1_block.unwrap();
    let v2 = mainnet.forbid_v2_block.unwrap();
    ChainConfig::new(CHAIN_ID)
        .with_forbid_v1(v1, [key_address(&signing_key(1))])
        .with_forbid_v2(v2, [key_address(&signing_key(2))])
}

fn process(number: BlockNumber, seed: u8) -> Result<MemoryState, BlockExecutionError> {
    let processor = StateProcessor::new(
        config(),
        MemoryChain::default(),
        StaticRewardEngine::default(),
        TransferExecutor,
    )
    .unwrap();
    let key = signing_key(seed);
    let mut state =
        MemoryState::default().account_balance(key_address(&key), U256::from(1_000_000));
    let header = Header { number, gas_limit: 1_000_000, ..Default::default() };
    let block = Block::new(header, vec![sign_tx(CHAIN_ID, transfer(0, RECIPIENT, 1), &key)]);
    processor.process(&block, &mut state, &VmConfig::default()).map(|_| state)
}

#[rstest]
#[case::first_list_at_threshold(6_638_000, 1, None)]
#[case::first_list_above_threshold(6_638_001, 1, Some(AbeyHardfork::ForbidV1))]
#[case::second_list_dormant(6_638_001, 2, None)]
#[case::second_list_at_threshold(24_642_000, 2, None)]
#[case::second_list_above_threshold(24_642_001, 2, Some(AbeyHardfork::ForbidV2))]
#[case::first_list_stays_active(24_642_001, 1, Some(AbeyHardfork::ForbidV1))]
#[case::unlisted_sender(30_000_000, 3, None)]
fn test_deny_lists_by_height(
    #[case] number: BlockNumber,
    #[case] seed: u8,
    #[case] expected: Option<AbeyHardfork>,
) {
    match (process(number, seed), expected) {
        (Ok(state), None) => assert_eq!(state.balance(RECIPIENT), U256::from(1)),
        (
            Err(BlockExecutionError::Transaction { source: TxError::ForbiddenSender(err), .. }),
            Some(fork),
        ) => {
            assert_eq!(err.fork, fork);
            assert_eq!(err.sender, key_address(&signing_key(seed)));
        }
        (result, expected) => panic!("unexpected outcome {result:?} for {expected:?}"),
    }
}

#[test]
fn test_unordered_thresholds_are_rejected() {
    let config = ChainConfig::new(CHAIN_ID).with_forbid_v1(100, []).with_forbid_v2(50, []);
    let err = StateProcessor::new(
        config,
        MemoryChain::default(),
        StaticRewardEngine::default(),
        TransferExecutor,
    )
    .unwrap_err();
    assert_eq!(err, ConfigError::ForkOrder { v1: 100, v2: 50 });
}
