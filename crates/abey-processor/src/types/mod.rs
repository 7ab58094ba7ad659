//! Chain data types consumed and produced by the state processor.

mod block;
mod log;
mod message;
mod receipt;
mod transaction;

pub use block::*;
pub use log::*;
pub use message::*;
pub use receipt::*;
pub use transaction::*;
pub(crate) use transaction::keccak_list;
