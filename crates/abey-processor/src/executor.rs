use alloy_primitives::{Address, Bytes, U256};
use auto_impl::auto_impl;
use serde::{Deserialize, Serialize};

use crate::{ChainConfig, ExecutionContext, GasPool, GasPoolError, Message, StateHandle, VmConfig};

/// How a message finished executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecutionStatus {
    /// Executed to completion.
    Success,
    /// The call reverted; state changes are undone but gas is charged.
    Revert,
    /// Execution halted exceptionally, consuming all gas.
    Halt,
}

/// Result of a message execution that was accepted by the executor.
///
/// A reverted or halted execution is still a valid result: the transaction is included in the
/// block with a failed receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    /// Gas consumed, after refunds.
    pub gas_used: u64,
    /// Return data, or revert data for a reverted call.
    pub return_data: Bytes,
    /// Outcome of the execution.
    pub status: ExecutionStatus,
}

impl ExecutionResult {
    /// Returns `true` if execution completed without reverting or halting.
    pub const fn is_success(&self) -> bool {
        matches!(self.status, ExecutionStatus::Success)
    }

    /// Returns `true` if execution reverted or halted.
    pub const fn failed(&self) -> bool {
        !self.is_success()
    }

    /// Returns the revert data if the call reverted.
    pub const fn revert_data(&self) -> Option<&Bytes> {
        match self.status {
            ExecutionStatus::Revert => Some(&self.return_data),
            _ => None,
        }
    }
}

/// Reasons for an executor to refuse a message before executing it.
///
/// Unlike a revert these invalidate the whole block.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidTransaction {
    /// The message nonce is behind the account nonce.
    #[error("nonce too low: address {address}, tx={tx} state={state}")]
    NonceTooLow {
        /// Sender
        address: Address,
        /// Nonce of the message
        tx: u64,
        /// Nonce in state
        state: u64,
    },
    /// The message nonce is ahead of the account nonce.
    #[error("nonce too high: address {address}, tx={tx} state={state}")]
    NonceTooHigh {
        /// Sender
        address: Address,
        /// Nonce of the message
        tx: u64,
        /// Nonce in state
        state: u64,
    },
    /// The sender cannot pay for the gas limit.
    #[error("insufficient funds for gas * price: address {payer}, have {balance} want {cost}")]
    InsufficientFundsForGas {
        /// Account paying for gas
        payer: Address,
        /// Its balance
        balance: U256,
        /// Gas limit times gas price
        cost: U256,
    },
    /// The sender cannot pay for the value and fee.
    #[error("insufficient funds for transfer: address {sender}, have {balance} want {cost}")]
    InsufficientFunds {
        /// Sender
        sender: Address,
        /// Its balance
        balance: U256,
        /// Required amount
        cost: U256,
    },
    /// The gas limit does not cover the intrinsic gas.
    #[error("intrinsic gas too low: have {gas_limit}, want {intrinsic}")]
    IntrinsicGas {
        /// Gas limit of the message
        gas_limit: u64,
        /// Intrinsic gas
        intrinsic: u64,
    },
    /// The block gas pool cannot cover the gas limit.
    #[error(transparent)]
    GasPool(#[from] GasPoolError),
    /// Any other executor-specific rejection.
    #[error("{0}")]
    Other(String),
}

/// The bytecode executor: runs one message against the state.
///
/// Implementations debit the gas limit from `gas_pool` when buying gas and return the unused
/// part after execution. They must be deterministic given identical context and state.
#[auto_impl(&, Box, Arc)]
pub trait MessageExecutor<S: StateHandle + ?Sized> {
    /// Executes `msg`, mutating `state`.
    fn execute(
        &self,
        ctx: &ExecutionContext<'_>,
        state: &mut S,
        config: &ChainConfig,
        vm: &VmConfig,
        msg: &Message,
        gas_pool: &mut GasPool,
    ) -> Result<ExecutionResult, InvalidTransaction>;
}
