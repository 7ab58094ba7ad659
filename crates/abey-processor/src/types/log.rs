use alloy_primitives::{BlockNumber, Bloom, B256};
use serde::{Deserialize, Serialize};

/// A log emitted during execution, stamped with its position in the chain.
///
/// The state handle fills in the transaction and block fields when the log is recorded; the
/// block number is set by the processor when the receipt is built.
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_more::Deref, derive_more::DerefMut,
)]
#[serde(rename_all = "camelCase")]
pub struct Log {
    /// Address, topics and data.
    #[deref]
    #[deref_mut]
    #[serde(flatten)]
    pub inner: alloy_primitives::Log,
    /// Block containing the transaction.
    pub block_number: BlockNumber,
    /// Hash of the block containing the transaction.
    pub block_hash: B256,
    /// Hash of the emitting transaction.
    pub transaction_hash: B256,
    /// Index of the emitting transaction in the block.
    pub transaction_index: u64,
    /// Index of the log in the block.
    pub log_index: u64,
}

impl Log {
    /// Wraps `inner` with zeroed chain metadata.
    pub const fn new(inner: alloy_primitives::Log) -> Self {
        Self {
            inner,
            block_number: 0,
            block_hash: B256::ZERO,
            transaction_hash: B256::ZERO,
            transaction_index: 0,
            log_index: 0,
        }
    }
}

/// Computes the bloom filter over `logs`.
pub fn logs_bloom<'a>(logs: impl IntoIterator<Item = &'a Log>) -> Bloom {
    let mut bloom = Bloom::ZERO;
    for log in logs {
        bloom.accrue_log(&log.inner);
    }
    bloom
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{address, b256, bytes, BloomInput, LogData};

    use super::*;

    #[test]
    fn test_bloom_contains_address_and_topics() {
        let emitter = address!("00000000000000000000000000000000000000e1");
        let topic = b256!("0000000000000000000000000000000000000000000000000000000000000abc");
        let log = Log::new(alloy_primitives::Log {
            address: emitter,
            data: LogData::new_unchecked(vec![topic], bytes!("01")),
        });

        let bloom = logs_bloom([&log]);
        assert!(bloom.contains_input(BloomInput::Raw(emitter.as_slice())));
        assert!(bloom.contains_input(BloomInput::Raw(topic.as_slice())));
        assert!(!bloom.contains_input(BloomInput::Raw(B256::ZERO.as_slice())));
    }

    #[test]
    fn test_empty_bloom() {
        assert_eq!(logs_bloom(&Vec::<Log>::new()), Bloom::ZERO);
    }
}
