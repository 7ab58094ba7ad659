use core::{fmt, time::Duration};
use std::time::Instant;

use alloy_consensus::Header;
use alloy_primitives::{Bytes, U256};
use tracing::{debug, info, warn};

use crate::{
    constants::READ_ONLY_GAS_POOL, logs_bloom, Block, BlockExecutionError, ChainConfig,
    ChainContext, ConfigError, ConsensusEngine, ExecutionContext, ExecutionStatus, ForkSchedule,
    GasPool, Log, MessageExecutor, Receipt, Signer, StateHandle, Transaction, TxError, VmConfig,
};

/// Running totals of a block being processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockUsage {
    /// Gas used by the transactions applied so far.
    pub gas_used: u64,
    /// `gas_used * gas_price` plus explicit fees of the transactions applied so far.
    pub fee_amount: U256,
}

/// Wall-clock duration of the two phases of [`StateProcessor::process`].
///
/// Both are also logged with the block, as `chain/state/executiontx` and `chain/state/finalize`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessTimings {
    /// Time spent applying transactions.
    pub execution: Duration,
    /// Time spent in the consensus engine.
    pub finalization: Duration,
}

/// Everything produced by processing one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutcome<R> {
    /// One receipt per transaction, in block order.
    pub receipts: Vec<Receipt>,
    /// Logs of all receipts, concatenated in block order.
    pub logs: Vec<Log>,
    /// Total gas used by the block.
    pub gas_used: u64,
    /// Fees collected by the block.
    pub fee_amount: U256,
    /// Reward summary returned by the consensus engine.
    pub reward: R,
    /// Phase timings.
    pub timings: ProcessTimings,
}

/// Output of [`StateProcessor::read_transaction`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOutcome {
    /// Data returned by the call.
    pub return_data: Bytes,
    /// Gas consumed by the call.
    pub gas_used: u64,
    /// How the call finished.
    pub status: ExecutionStatus,
}

/// Transitions state from one block to the next by applying the block's transactions.
///
/// The processor owns the chain configuration and the collaborators shared by every block:
///
/// - `C`: historical header access for the block hash lookup
/// - `E`: the consensus engine applying rewards
/// - `X`: the message executor running bytecode
///
/// It holds no per-block state; independent state handles can be processed concurrently
/// through a shared reference.
pub struct StateProcessor<C, E, X> {
    config: ChainConfig,
    schedule: ForkSchedule,
    chain: C,
    engine: E,
    executor: X,
}

impl<C, E, X> fmt::Debug for StateProcessor<C, E, X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateProcessor")
            .field("config", &self.config)
            .field("schedule", &self.schedule)
            .finish_non_exhaustive()
    }
}

impl<C: ChainContext, E, X> StateProcessor<C, E, X> {
    /// Creates a processor, validating the fork thresholds of `config`.
    pub fn new(config: ChainConfig, chain: C, engine: E, executor: X) -> Result<Self, ConfigError> {
        let schedule = config.fork_schedule()?;
        Ok(Self { config, schedule, chain, engine, executor })
    }

    /// Returns the chain configuration.
    pub const fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Returns the fork schedule derived from the configuration.
    pub const fn schedule(&self) -> &ForkSchedule {
        &self.schedule
    }

    /// Returns the chain context.
    pub const fn chain(&self) -> &C {
        &self.chain
    }

    /// Returns the consensus engine.
    pub const fn engine(&self) -> &E {
        &self.engine
    }

    /// Returns the message executor.
    pub const fn executor(&self) -> &X {
        &self.executor
    }

    /// Processes `block` on top of `state`, which must hold the parent's post-state.
    ///
    /// Transactions are applied strictly in block order. The first transaction that cannot be
    /// applied invalidates the block and no outcome is returned; a reverted transaction is not an
    /// error and yields a failed receipt. After all transactions, the consensus engine finalizes
    /// the block with the collected fees.
    pub fn process<S>(
        &self,
        block: &Block,
        state: &mut S,
        vm: &VmConfig,
    ) -> Result<ProcessOutcome<E::Reward>, BlockExecutionError>
    where
        S: StateHandle + ?Sized,
        E: ConsensusEngine<S>,
        X: MessageExecutor<S>,
    {
        let header = block.header();
        let scheme = self.config.hash_scheme(header.number);
        let mut gas_pool = GasPool::new(header.gas_limit);
        let mut usage = BlockUsage::default();
        let mut receipts = Vec::with_capacity(block.transactions().len());
        let mut logs = Vec::new();

        let started = Instant::now();
        for (index, tx) in block.transactions().iter().enumerate() {
            let hash = tx.hash_with(scheme);
            state.prepare(hash, block.hash(), index);
            let receipt = self
                .apply_transaction(&mut gas_pool, state, header, tx, &mut usage, vm)
                .map_err(|source| {
                    warn!(
                        target: "abey::processor",
                        number = header.number,
                        index,
                        %hash,
                        error = %source,
                        "Transaction invalidates block"
                    );
                    BlockExecutionError::Transaction { index, hash, source }
                })?;
            logs.extend(receipt.logs.iter().cloned());
            receipts.push(receipt);
        }
        let execution = started.elapsed();

        let started = Instant::now();
        let (_, reward) = self
            .engine
            .finalize(
                &self.chain,
                header,
                state,
                block.transactions(),
                &receipts,
                usage.fee_amount,
            )
            .inspect_err(|err| {
                warn!(target: "abey::processor", number = header.number, %err, "Finalize failed");
            })?;
        let finalization = started.elapsed();

        info!(
            target: "abey::processor",
            number = header.number,
            hash = %block.hash(),
            txs = receipts.len(),
            gas_used = usage.gas_used,
            "chain/state/executiontx" = ?execution,
            "chain/state/finalize" = ?finalization,
            "Processed block"
        );

        Ok(ProcessOutcome {
            receipts,
            logs,
            gas_used: usage.gas_used,
            fee_amount: usage.fee_amount,
            reward,
            timings: ProcessTimings { execution, finalization },
        })
    }

    /// Applies one transaction to `state` and returns its receipt.
    ///
    /// `state` must have been prepared for the transaction. On success the pending state is
    /// finalised and `usage` is advanced; on error the block containing the transaction is
    /// invalid.
    pub fn apply_transaction<S>(
        &self,
        gas_pool: &mut GasPool,
        state: &mut S,
        header: &Header,
        tx: &Transaction,
        usage: &mut BlockUsage,
        vm: &VmConfig,
    ) -> Result<Receipt, TxError>
    where
        S: StateHandle + ?Sized,
        X: MessageExecutor<S>,
    {
        let signer = Signer::for_block(&self.config, header.number);
        let msg = tx.as_message(&signer)?;
        self.schedule.check_sender(header.number, msg.from)?;

        let ctx = ExecutionContext::new(&msg, header, &self.chain);
        let result = self.executor.execute(&ctx, state, &self.config, vm, &msg, gas_pool)?;

        state.finalise(true);
        usage.gas_used = usage.gas_used.saturating_add(result.gas_used);
        usage.fee_amount = usage
            .fee_amount
            .saturating_add(U256::from(result.gas_used).saturating_mul(msg.gas_price))
            .saturating_add(msg.fee.unwrap_or_default());

        let transaction_hash = tx.hash_with(self.config.hash_scheme(header.number));
        let block_hash = state.block_hash();
        let transaction_index = state.tx_index() as u64;
        let mut logs = state.logs(transaction_hash);
        for log in &mut logs {
            log.block_number = header.number;
        }

        debug!(
            target: "abey::processor",
            index = transaction_index,
            hash = %transaction_hash,
            gas_used = result.gas_used,
            status = ?result.status,
            "Applied transaction"
        );

        Ok(Receipt {
            status: result.is_success(),
            cumulative_gas_used: usage.gas_used,
            gas_used: result.gas_used,
            logs_bloom: logs_bloom(&logs),
            logs,
            transaction_hash,
            contract_address: msg.to.is_none().then(|| msg.from.create(tx.nonce)),
            block_hash,
            block_number: header.number,
            transaction_index,
        })
    }

    /// Simulates `tx` on top of `state` in the block described by `header`.
    ///
    /// The message is stripped of its payment sponsor and nonce so it can run against any
    /// historical state, and gas is unbounded. Every change, logs included, is reverted before
    /// returning, so the call is repeatable.
    pub fn read_transaction<S>(
        &self,
        state: &mut S,
        header: &Header,
        tx: &Transaction,
        vm: &VmConfig,
    ) -> Result<ReadOutcome, TxError>
    where
        S: StateHandle + ?Sized,
        X: MessageExecutor<S>,
    {
        let signer = Signer::for_block(&self.config, header.number);
        let msg = tx.as_message(&signer)?;
        self.schedule.check_sender(header.number, msg.from)?;
        let msg = msg.into_read_only();

        let ctx = ExecutionContext::new(&msg, header, &self.chain);
        let mut gas_pool = GasPool::new(READ_ONLY_GAS_POOL);
        let snapshot = state.snapshot();
        let result = self.executor.execute(&ctx, state, &self.config, vm, &msg, &mut gas_pool);
        state.revert_to_snapshot(snapshot);
        let result = result?;

        Ok(ReadOutcome {
            return_data: result.return_data,
            gas_used: result.gas_used,
            status: result.status,
        })
    }
}
