//! In-memory collaborators for exercising the state processor.

mod chain;
mod engine;
mod executor;
mod keys;
mod state;

pub use chain::*;
pub use engine::*;
pub use executor::*;
pub use keys::*;
pub use state::*;
