//! Tests for the transaction hash switch at the TIP10 height.

use abey_processor::{
    test_utils::{
        call, key_address, sign_sponsored_tx, signing_key, MemoryChain, MemoryState,
        StaticRewardEngine, TransferExecutor, LOG0,
    },
    Block, ChainConfig, HashScheme, StateHandle, StateProcessor, Transaction, VmConfig,
};
use alloy_consensus::Header;
use alloy_primitives::{address, bytes, Address, BlockNumber, Bytes, U256};
use rstest::rstest;

const CHAIN_ID: u64 = 179;
const TIP10_BLOCK: BlockNumber = 10;
const LOGGER: Address = address!("00000000000000000000000000000000000000a0");

fn sponsored_log_call() -> Transaction {
    sign_sponsored_tx(
        CHAIN_ID,
        call(0, LOGGER, bytes!("c0ffee"), 40_000),
        &signing_key(1),
        &signing_key(2),
    )
}

fn replay(number: BlockNumber, tx: Transaction) -> (MemoryState, Vec<abey_processor::Receipt>) {
    let config = ChainConfig::new(CHAIN_ID).with_tip10_block(TIP10_BLOCK);
    let processor = StateProcessor::new(
        config,
        MemoryChain::default(),
        StaticRewardEngine::default(),
        TransferExecutor,
    )
    .unwrap();
    let mut state = MemoryState::default()
        .account_balance(key_address(&signing_key(1)), U256::from(1_000_000))
        .account_balance(key_address(&signing_key(2)), U256::from(1_000_000))
        .account_code(LOGGER, Bytes::from_static(&[LOG0]));
    let header = Header { number, gas_limit: 1_000_000, ..Default::default() };

    let outcome =
        processor.process(&Block::new(header, vec![tx]), &mut state, &VmConfig::default()).unwrap();
    (state, outcome.receipts)
}

#[rstest]
#[case::before_switch(TIP10_BLOCK - 1, HashScheme::Legacy)]
#[case::at_switch(TIP10_BLOCK, HashScheme::Tip10)]
#[case::after_switch(TIP10_BLOCK + 1_000, HashScheme::Tip10)]
fn test_receipts_keyed_by_active_scheme(
    #[case] number: BlockNumber,
    #[case] expected: HashScheme,
) {
    let tx = sponsored_log_call();
    let config = ChainConfig::new(CHAIN_ID).with_tip10_block(TIP10_BLOCK);
    assert_eq!(config.hash_scheme(number), expected);

    let (state, receipts) = replay(number, tx.clone());
    let hash = tx.hash_with(expected);
    assert_eq!(receipts[0].transaction_hash, hash);
    assert_eq!(receipts[0].logs, state.logs(hash));
    assert_eq!(receipts[0].logs.len(), 1);
    assert_eq!(receipts[0].logs[0].transaction_hash, hash);
}

#[test]
fn test_boundary_replay_resolves_historical_receipt() {
    let tx = sponsored_log_call();
    assert_ne!(tx.hash(), tx.legacy_hash());

    let (legacy_state, legacy) = replay(TIP10_BLOCK - 1, tx.clone());
    let (tip10_state, tip10) = replay(TIP10_BLOCK, tx.clone());

    // effects are identical, only the key differs
    assert_eq!(legacy[0].status, tip10[0].status);
    assert_eq!(legacy[0].gas_used, tip10[0].gas_used);
    assert_eq!(legacy[0].logs_bloom, tip10[0].logs_bloom);

    assert_eq!(legacy[0].transaction_hash, tx.legacy_hash());
    assert_eq!(tip10[0].transaction_hash, tx.hash());
    assert!(legacy_state.logs(tx.hash()).is_empty());
    assert!(tip10_state.logs(tx.legacy_hash()).is_empty());
    assert_eq!(legacy_state.logs(tx.legacy_hash())[0].data, tip10_state.logs(tx.hash())[0].data);
}
