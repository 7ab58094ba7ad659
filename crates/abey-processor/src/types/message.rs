use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

/// A transaction with its sender (and payer) resolved, ready for execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Recovered sender.
    pub from: Address,
    /// Recipient, `None` for contract creation.
    pub to: Option<Address>,
    /// Recovered gas sponsor.
    pub payment: Option<Address>,
    /// Sender nonce.
    pub nonce: u64,
    /// Value transferred to the recipient.
    pub value: U256,
    /// Explicit fee added on top of the gas cost.
    pub fee: Option<U256>,
    /// Maximum gas the message may consume.
    pub gas_limit: u64,
    /// Price paid per unit of gas.
    pub gas_price: U256,
    /// Call data or init code.
    pub input: Bytes,
    /// Whether the executor must check the nonce against state.
    pub check_nonce: bool,
}

impl Message {
    /// Returns the account paying for gas.
    pub fn gas_payer(&self) -> Address {
        self.payment.unwrap_or(self.from)
    }

    /// Returns the up-front gas cost, `gas_limit * gas_price`.
    pub fn gas_cost(&self) -> U256 {
        U256::from(self.gas_limit).saturating_mul(self.gas_price)
    }

    /// Rebuilds the message for simulation: no sponsor, zero nonce and no nonce check, so it can
    /// run against any historical state.
    pub fn into_read_only(self) -> Self {
        Self { payment: None, nonce: 0, check_nonce: false, ..self }
    }
}
