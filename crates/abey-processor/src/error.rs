use alloy_primitives::B256;

use crate::{FinalizeError, ForbiddenSender, GasPoolError, InvalidTransaction, SignerError};

/// Reasons a single transaction cannot be applied. Each one invalidates the containing block.
#[derive(Debug, thiserror::Error)]
pub enum TxError {
    /// The signature could not be recovered.
    #[error("invalid transaction signature: {0}")]
    Signer(#[from] SignerError),
    /// The sender is on a deny list active at the block height.
    #[error(transparent)]
    ForbiddenSender(#[from] ForbiddenSender),
    /// The executor refused the message before executing it.
    #[error("transaction rejected: {0}")]
    Rejected(#[from] InvalidTransaction),
}

impl TxError {
    /// Returns `true` if the block ran out of gas for this transaction.
    pub const fn is_gas_limit_reached(&self) -> bool {
        matches!(
            self,
            Self::Rejected(InvalidTransaction::GasPool(GasPoolError::GasLimitReached { .. }))
        )
    }
}

/// Errors that invalidate a whole block.
#[derive(Debug, thiserror::Error)]
pub enum BlockExecutionError {
    /// A transaction could not be applied.
    #[error("transaction {index} ({hash}) invalidates the block: {source}")]
    Transaction {
        /// Position of the transaction in the block
        index: usize,
        /// Transaction hash under the active scheme
        hash: B256,
        /// Why the transaction failed
        #[source]
        source: TxError,
    },
    /// The consensus engine refused to finalize the block.
    #[error("block finalization failed: {0}")]
    Finalize(#[from] FinalizeError),
}

impl BlockExecutionError {
    /// Returns the index of the offending transaction, if a transaction caused the error.
    pub const fn tx_index(&self) -> Option<usize> {
        match self {
            Self::Transaction { index, .. } => Some(*index),
            Self::Finalize(_) => None,
        }
    }
}
