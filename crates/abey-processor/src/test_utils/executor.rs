use alloy_primitives::{Bytes, LogData, U256};

use crate::{
    ChainConfig, ExecutionContext, ExecutionResult, ExecutionStatus, GasPool, InvalidTransaction,
    Message, MessageExecutor, StateHandle, VmConfig,
};

/// Gas charged for a transaction that is not a contract creation.
pub const TX_GAS: u64 = 21_000;
/// Gas charged for a contract creation transaction.
pub const TX_GAS_CONTRACT_CREATION: u64 = 53_000;
/// Gas per zero byte of call data.
pub const TX_DATA_ZERO_GAS: u64 = 4;
/// Gas per non-zero byte of call data.
pub const TX_DATA_NON_ZERO_GAS: u64 = 16;
/// Base gas of a `LOG0`.
pub const LOG_GAS: u64 = 375;
/// Gas per byte of log data.
pub const LOG_DATA_GAS: u64 = 8;

/// Code that reverts, returning the call data.
pub const REVERT: u8 = 0xfd;
/// Code that halts, consuming all gas.
pub const INVALID: u8 = 0xfe;
/// Code that emits the call data as a `LOG0`.
pub const LOG0: u8 = 0xa0;
/// Code that returns the hash of the parent block.
pub const BLOCKHASH: u8 = 0x40;

/// Returns the intrinsic gas of a message carrying `input`.
pub fn intrinsic_gas(input: &[u8], is_create: bool) -> u64 {
    let base = if is_create { TX_GAS_CONTRACT_CREATION } else { TX_GAS };
    let zeros = input.iter().filter(|byte| **byte == 0).count() as u64;
    let non_zeros = input.len() as u64 - zeros;
    base + zeros * TX_DATA_ZERO_GAS + non_zeros * TX_DATA_NON_ZERO_GAS
}

/// A minimal message executor for value transfers, contract creation and one-opcode contracts.
///
/// The first byte of the callee's code selects the behavior: [`REVERT`], [`INVALID`], [`LOG0`] or
/// [`BLOCKHASH`]; any other code is a plain transfer. Creation deploys the init code verbatim.
///
/// Gas is bought from the payer before execution by debiting the whole gas limit from the pool;
/// the unused part is returned to both afterwards.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransferExecutor;

impl TransferExecutor {
    fn run<S: StateHandle + ?Sized>(
        ctx: &ExecutionContext<'_>,
        state: &mut S,
        msg: &Message,
        nonce: u64,
        intrinsic: u64,
    ) -> (ExecutionStatus, u64, Bytes) {
        state.sub_balance(msg.from, msg.value);
        let Some(to) = msg.to else {
            let address = msg.from.create(nonce);
            state.add_balance(address, msg.value);
            state.set_nonce(address, 1);
            state.set_code(address, msg.input.clone());
            return (ExecutionStatus::Success, intrinsic, Bytes::new());
        };
        state.add_balance(to, msg.value);

        match state.code(to).first().copied() {
            Some(REVERT) => (ExecutionStatus::Revert, intrinsic, msg.input.clone()),
            Some(INVALID) => (ExecutionStatus::Halt, msg.gas_limit, Bytes::new()),
            Some(LOG0) => {
                let gas = intrinsic + LOG_GAS + LOG_DATA_GAS * msg.input.len() as u64;
                if gas > msg.gas_limit {
                    return (ExecutionStatus::Halt, msg.gas_limit, Bytes::new());
                }
                let data = LogData::new_unchecked(Vec::new(), msg.input.clone());
                state.add_log(alloy_primitives::Log { address: to, data });
                (ExecutionStatus::Success, gas, Bytes::new())
            }
            Some(BLOCKHASH) => {
                let hash = ctx.block_hash(ctx.number.saturating_sub(1));
                (ExecutionStatus::Success, intrinsic, Bytes::copy_from_slice(hash.as_slice()))
            }
            _ => (ExecutionStatus::Success, intrinsic, Bytes::new()),
        }
    }
}

impl<S: StateHandle + ?Sized> MessageExecutor<S> for TransferExecutor {
    fn execute(
        &self,
        ctx: &ExecutionContext<'_>,
        state: &mut S,
        _config: &ChainConfig,
        _vm: &VmConfig,
        msg: &Message,
        gas_pool: &mut GasPool,
    ) -> Result<ExecutionResult, InvalidTransaction> {
        let intrinsic = intrinsic_gas(&msg.input, msg.to.is_none());
        if msg.gas_limit < intrinsic {
            return Err(InvalidTransaction::IntrinsicGas { gas_limit: msg.gas_limit, intrinsic });
        }

        let nonce = state.nonce(msg.from);
        if msg.check_nonce {
            if msg.nonce < nonce {
                return Err(InvalidTransaction::NonceTooLow {
                    address: msg.from,
                    tx: msg.nonce,
                    state: nonce,
                });
            }
            if msg.nonce > nonce {
                return Err(InvalidTransaction::NonceTooHigh {
                    address: msg.from,
                    tx: msg.nonce,
                    state: nonce,
                });
            }
        }

        let payer = msg.gas_payer();
        let gas_cost = msg.gas_cost();
        let payer_balance = state.balance(payer);
        if payer_balance < gas_cost {
            return Err(InvalidTransaction::InsufficientFundsForGas {
                payer,
                balance: payer_balance,
                cost: gas_cost,
            });
        }
        let fee = msg.fee.unwrap_or_default();
        let mut required = msg.value.saturating_add(fee);
        if payer == msg.from {
            required = required.saturating_add(gas_cost);
        }
        let balance = state.balance(msg.from);
        if balance < required {
            return Err(InvalidTransaction::InsufficientFunds {
                sender: msg.from,
                balance,
                cost: required,
            });
        }

        gas_pool.sub_gas(msg.gas_limit)?;
        state.sub_balance(payer, gas_cost);
        state.sub_balance(msg.from, fee);
        state.set_nonce(msg.from, nonce + 1);

        let snapshot = state.snapshot();
        let (status, gas_used, return_data) = Self::run(ctx, state, msg, nonce, intrinsic);
        if status != ExecutionStatus::Success {
            state.revert_to_snapshot(snapshot);
        }

        let gas_used = gas_used.min(msg.gas_limit);
        let remaining = msg.gas_limit - gas_used;
        state.add_balance(payer, U256::from(remaining).saturating_mul(msg.gas_price));
        gas_pool.add_gas(remaining);

        Ok(ExecutionResult { gas_used, return_data, status })
    }
}

#[cfg(test)]
mod tests {
    use alloy_consensus::Header;
    use alloy_primitives::{address, bytes, Address};
    use rstest::rstest;

    use super::*;
    use crate::test_utils::{MemoryChain, MemoryState};

    const ALICE: Address = address!("00000000000000000000000000000000000000a1");
    const CONTRACT: Address = address!("00000000000000000000000000000000000000c1");

    fn message(to: Option<Address>, input: Bytes, gas_limit: u64) -> Message {
        Message {
            from: ALICE,
            to,
            payment: None,
            nonce: 0,
            value: U256::from(7),
            fee: None,
            gas_limit,
            gas_price: U256::from(2),
            input,
            check_nonce: true,
        }
    }

    fn execute(
        state: &mut MemoryState,
        msg: &Message,
        pool: &mut GasPool,
    ) -> Result<ExecutionResult, InvalidTransaction> {
        let chain = MemoryChain::default();
        let header = Header { number: 1, ..Default::default() };
        let ctx = ExecutionContext::new(msg, &header, &chain);
        TransferExecutor.execute(&ctx, state, &ChainConfig::new(1), &VmConfig::default(), msg, pool)
    }

    #[rstest]
    #[case::empty(&[], false, 21_000)]
    #[case::mixed(&[0, 1, 0, 2], false, 21_000 + 2 * 4 + 2 * 16)]
    #[case::create(&[0xff], true, 53_016)]
    fn test_intrinsic_gas(#[case] input: &[u8], #[case] is_create: bool, #[case] expected: u64) {
        assert_eq!(intrinsic_gas(input, is_create), expected);
    }

    #[test]
    fn test_transfer_refunds_unused_gas() {
        let mut state = MemoryState::default().account_balance(ALICE, U256::from(1_000_000));
        let mut pool = GasPool::new(100_000);
        let msg = message(Some(CONTRACT), Bytes::new(), 30_000);

        let result = execute(&mut state, &msg, &mut pool).unwrap();
        assert!(result.is_success());
        assert_eq!(result.gas_used, 21_000);
        assert_eq!(pool.gas(), 79_000);
        assert_eq!(state.balance(CONTRACT), U256::from(7));
        assert_eq!(state.balance(ALICE), U256::from(1_000_000 - 7 - 42_000));
        assert_eq!(state.nonce(ALICE), 1);
    }

    #[test]
    fn test_revert_keeps_gas_and_nonce() {
        let mut state = MemoryState::default()
            .account_balance(ALICE, U256::from(1_000_000))
            .account_code(CONTRACT, Bytes::from_static(&[REVERT]));
        let mut pool = GasPool::new(100_000);
        let msg = message(Some(CONTRACT), bytes!("beef"), 30_000);

        let result = execute(&mut state, &msg, &mut pool).unwrap();
        assert_eq!(result.status, ExecutionStatus::Revert);
        assert_eq!(result.revert_data(), Some(&bytes!("beef")));
        assert_eq!(state.balance(CONTRACT), U256::ZERO);
        assert_eq!(state.nonce(ALICE), 1);
        assert_eq!(state.balance(ALICE), U256::from(1_000_000 - 2 * result.gas_used));
    }

    #[test]
    fn test_halt_consumes_all_gas() {
        let mut state = MemoryState::default()
            .account_balance(ALICE, U256::from(1_000_000))
            .account_code(CONTRACT, Bytes::from_static(&[INVALID]));
        let mut pool = GasPool::new(100_000);
        let msg = message(Some(CONTRACT), Bytes::new(), 30_000);

        let result = execute(&mut state, &msg, &mut pool).unwrap();
        assert_eq!(result.status, ExecutionStatus::Halt);
        assert_eq!(result.gas_used, 30_000);
        assert_eq!(pool.gas(), 70_000);
    }

    #[test]
    fn test_rejections_leave_state_untouched() {
        let mut state = MemoryState::default().account_balance(ALICE, U256::from(100));
        let mut pool = GasPool::new(100_000);

        let err = execute(&mut state, &message(Some(CONTRACT), Bytes::new(), 20_000), &mut pool)
            .unwrap_err();
        assert_eq!(err, InvalidTransaction::IntrinsicGas { gas_limit: 20_000, intrinsic: 21_000 });

        let err = execute(&mut state, &message(Some(CONTRACT), Bytes::new(), 21_000), &mut pool)
            .unwrap_err();
        assert!(matches!(err, InvalidTransaction::InsufficientFundsForGas { .. }));

        let mut msg = message(Some(CONTRACT), Bytes::new(), 21_000);
        msg.nonce = 4;
        let err = execute(&mut state, &msg, &mut pool).unwrap_err();
        assert_eq!(err, InvalidTransaction::NonceTooHigh { address: ALICE, tx: 4, state: 0 });

        assert_eq!(state.balance(ALICE), U256::from(100));
        assert_eq!(pool.gas(), 100_000);
    }

    #[test]
    fn test_create_deploys_code() {
        let mut state = MemoryState::default().account_balance(ALICE, U256::from(1_000_000));
        let mut pool = GasPool::new(100_000);
        let msg = message(None, Bytes::from_static(&[LOG0]), 60_000);

        let result = execute(&mut state, &msg, &mut pool).unwrap();
        assert!(result.is_success());
        let deployed = ALICE.create(0);
        assert_eq!(state.code(deployed), Bytes::from_static(&[LOG0]));
        assert_eq!(state.balance(deployed), U256::from(7));
    }
}
