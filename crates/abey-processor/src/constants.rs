//! Constants used by the Abey state processor.

/// Chain id of the Abey main network.
pub const MAINNET_CHAIN_ID: u64 = 179;

/// The first sender deny list applies to blocks strictly above this height.
pub const MAINNET_FORBID_V1_BLOCK: u64 = 6_638_000;

/// The second sender deny list applies to blocks strictly above this height.
pub const MAINNET_FORBID_V2_BLOCK: u64 = 24_642_000;

/// Number of ancestors reachable through the block hash lookup of an execution context.
pub const BLOCK_HASH_HISTORY: u64 = 256;

/// Gas limit of the pool used by read-only execution.
pub const READ_ONLY_GAS_POOL: u64 = u64::MAX;
