use std::path::PathBuf;

use abey_processor::{
    receipts_bloom,
    test_utils::{MemoryChain, MemoryState, StaticRewardEngine, TransferExecutor},
    Block, ChainConfig, Signer, StateProcessor, VmConfig,
};
use alloy_primitives::U256;
use clap::Parser;
use tracing::{info, warn};

use crate::{
    load_from_stdin, load_json, write_json, LogArgs, RejectedBlock, Result, StateAlloc, T8nError,
    T8nOutput, TransitionInputs, TransitionResults,
};

/// Executes one block state transition
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Cmd {
    /// Ask the executor to record an execution trace
    #[arg(long)]
    pub trace: bool,

    /// Specifies where output files are placed. Will be created if it does not exist.
    #[arg(long = "output.basedir")]
    pub output_basedir: Option<PathBuf>,

    /// Determines where to put the `alloc` of the post-state.
    /// `stdout` - into the stdout output
    /// <file> - into the file <file>
    #[arg(long = "output.alloc", default_value = "alloc.json")]
    pub output_alloc: String,

    /// Determines where to put the `result` (receipts, gas used, reward) of the transition.
    /// `stdout` - into the stdout output
    /// <file> - into the file <file>
    #[arg(long = "output.result", default_value = "result.json")]
    pub output_result: String,

    /// File name of where to find the prestate alloc to use.
    #[arg(long = "input.alloc", default_value = "stdin")]
    pub input_alloc: String,

    /// File name of where to find the prestate env to use.
    #[arg(long = "input.env", default_value = "stdin")]
    pub input_env: String,

    /// File name of where to find the transactions to apply.
    #[arg(long = "input.txs", default_value = "stdin")]
    pub input_txs: String,

    /// File name of the chain config. Mainnet fork heights are used when absent.
    #[arg(long = "input.config")]
    pub input_config: Option<String>,

    /// `ChainID` to use when no chain config is given
    #[arg(long = "state.chainid", default_value_t = abey_processor::constants::MAINNET_CHAIN_ID)]
    pub chain_id: u64,

    /// Static block reward paid to the coinbase on top of the collected fees
    #[arg(long = "state.reward", default_value_t = 0)]
    pub reward: u64,

    /// Logging options
    #[command(flatten)]
    pub log: LogArgs,
}

impl Cmd {
    /// Loads the inputs, runs the transition and writes the outputs.
    pub fn run(&self) -> Result<()> {
        let inputs = self.load_inputs()?;
        let output = self.transition(inputs)?;
        self.output_results(&output)
    }

    fn load_inputs(&self) -> Result<TransitionInputs> {
        if self.input_alloc == "stdin" || self.input_env == "stdin" || self.input_txs == "stdin" {
            let mut inputs = load_from_stdin()?;
            if let Some(path) = &self.input_config {
                inputs.config = Some(load_json(path)?);
            }
            return Ok(inputs);
        }

        Ok(TransitionInputs {
            alloc: load_json(&self.input_alloc)?,
            env: load_json(&self.input_env)?,
            txs: load_json(&self.input_txs)?,
            config: self.input_config.as_deref().map(load_json).transpose()?,
        })
    }

    /// Processes the inputs as one block.
    ///
    /// An invalid block is not an error of the tool: the result carries the rejection and the
    /// post-state equals the prestate.
    pub fn transition(&self, inputs: TransitionInputs) -> Result<T8nOutput> {
        let config = inputs
            .config
            .unwrap_or_else(|| ChainConfig { chain_id: self.chain_id, ..ChainConfig::mainnet() });
        let signer = Signer::new(config.chain_id);
        let transactions = inputs
            .txs
            .into_iter()
            .enumerate()
            .map(|(index, tx)| tx.into_transaction(index, &signer))
            .collect::<Result<Vec<_>>>()?;
        let block = Block::new(inputs.env.header(), transactions);

        let processor = StateProcessor::new(
            config,
            MemoryChain::default(),
            StaticRewardEngine::new(U256::from(self.reward)),
            TransferExecutor,
        )?;
        let mut state = MemoryState::from_accounts(
            inputs.alloc.iter().map(|(address, account)| (*address, account.clone().into())),
        );

        let vm = VmConfig { trace: self.trace };
        match processor.process(&block, &mut state, &vm) {
            Ok(outcome) => {
                info!(
                    number = block.number(),
                    txs = outcome.receipts.len(),
                    gas_used = outcome.gas_used,
                    "Transition complete"
                );
                let alloc: StateAlloc =
                    state.accounts().map(|(address, account)| (*address, account.into())).collect();
                let result = TransitionResults {
                    logs_bloom: receipts_bloom(&outcome.receipts),
                    receipts: outcome.receipts,
                    gas_used: outcome.gas_used,
                    fee_amount: outcome.fee_amount,
                    reward: Some(outcome.reward),
                    rejected: None,
                };
                Ok(T8nOutput { alloc, result })
            }
            Err(err) => {
                warn!(number = block.number(), %err, "Block rejected");
                let rejected = RejectedBlock {
                    index: err.tx_index().map(|index| index as u64),
                    error: err.to_string(),
                };
                let result = TransitionResults { rejected: Some(rejected), ..Default::default() };
                Ok(T8nOutput { alloc: inputs.alloc, result })
            }
        }
    }

    fn output_results(&self, output: &T8nOutput) -> Result<()> {
        let json = serde_json::to_string_pretty(output)
            .map_err(|source| T8nError::JsonParse { file: "stdout".to_string(), source })?;
        println!("{json}");

        if self.output_result != "stdout" {
            write_json(&output.result, &self.output_path(&self.output_result))?;
        }
        if self.output_alloc != "stdout" {
            write_json(&output.alloc, &self.output_path(&self.output_alloc))?;
        }
        Ok(())
    }

    fn output_path(&self, file: &str) -> PathBuf {
        match &self.output_basedir {
            Some(base_dir) => base_dir.join(file),
            None => PathBuf::from(file),
        }
    }
}
