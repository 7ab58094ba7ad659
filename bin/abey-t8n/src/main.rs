//! Command-line tool running one Abey block state transition.
//!
//! Reads a prestate allocation, a block environment and a list of transactions, processes them as
//! one block and writes the receipts, the reward summary and the post-state allocation.

use clap::Parser;

mod cmd;
pub use cmd::*;

mod error;
pub use error::*;

mod io;
pub use io::*;

mod logging;
pub use logging::*;

mod types;
pub use types::*;

fn main() -> Result<()> {
    let cmd = Cmd::parse();
    cmd.log.init()?;
    cmd.run().inspect_err(|e| eprintln!("{e}"))
}
