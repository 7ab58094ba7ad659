use core::fmt;

/// Tracks the amount of gas available during execution of the transactions in a block.
///
/// The pool is seeded once with the block gas limit. Executors debit a transaction's gas limit
/// when buying gas and return the unused part after execution, so the pool never drops below
/// zero and never exceeds what the block declared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GasPool(u64);

impl GasPool {
    /// Creates a pool holding `gas` units.
    pub const fn new(gas: u64) -> Self {
        Self(gas)
    }

    /// Makes `amount` of gas available for execution. Saturates at [`u64::MAX`].
    pub fn add_gas(&mut self, amount: u64) -> &mut Self {
        self.0 = self.0.saturating_add(amount);
        self
    }

    /// Deducts `amount` from the pool if enough gas is available.
    pub fn sub_gas(&mut self, amount: u64) -> Result<(), GasPoolError> {
        if self.0 < amount {
            return Err(GasPoolError::GasLimitReached { available: self.0, requested: amount });
        }
        self.0 -= amount;
        Ok(())
    }

    /// Returns the amount of gas remaining in the pool.
    pub const fn gas(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for GasPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error returned when the pool cannot cover a gas purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GasPoolError {
    /// The block does not have enough gas left.
    #[error("gas limit reached: requested={requested} > available={available}")]
    GasLimitReached {
        /// Gas left in the pool
        available: u64,
        /// Gas requested by the transaction
        requested: u64,
    },
}
