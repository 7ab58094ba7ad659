//! Block state transition core for the Abey chain.
//!
//! Takes an ordered block of transactions and a mutable state handle, executes every transaction
//! in order through an external message executor, and derives the receipts, logs, gas usage and
//! the block reward summary produced by the consensus engine.
//!
//! The interpreter, the state database and the reward policy are collaborators reached through
//! the [`MessageExecutor`], [`StateHandle`] and [`ConsensusEngine`] traits.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod constants;

mod config;
pub use config::*;

mod context;
pub use context::*;

mod engine;
pub use engine::*;

mod error;
pub use error::*;

mod executor;
pub use executor::*;

mod gas;
pub use gas::*;

mod hardfork;
pub use hardfork::*;

mod processor;
pub use processor::*;

mod signer;
pub use signer::*;

mod state;
pub use state::*;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

mod types;
pub use types::*;
