use std::collections::BTreeMap;

use abey_processor::{
    test_utils::Account, ChainConfig, ChainReward, Receipt, Signer, Transaction, TxData,
    TxSignature,
};
use alloy_consensus::Header;
use alloy_primitives::{Address, Bloom, Bytes, B256, U256};
use k256::ecdsa::SigningKey;
use serde::{Deserialize, Serialize};

use crate::{Result, T8nError};

/// Prestate account allocation (address -> account mapping)
pub type StateAlloc = BTreeMap<Address, AllocAccount>;

/// One account of the prestate or post-state allocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocAccount {
    /// Balance in wei
    #[serde(default)]
    pub balance: U256,
    /// Account nonce
    #[serde(default, with = "alloy_serde::quantity")]
    pub nonce: u64,
    /// Deployed code
    #[serde(default, skip_serializing_if = "<[u8]>::is_empty")]
    pub code: Bytes,
}

impl From<AllocAccount> for Account {
    fn from(account: AllocAccount) -> Self {
        Self { balance: account.balance, nonce: account.nonce, code: account.code }
    }
}

impl From<&Account> for AllocAccount {
    fn from(account: &Account) -> Self {
        Self { balance: account.balance, nonce: account.nonce, code: account.code.clone() }
    }
}

/// Block environment of the transition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Env {
    /// Block beneficiary
    pub current_coinbase: Address,
    /// Block gas limit
    #[serde(with = "alloy_serde::quantity")]
    pub current_gas_limit: u64,
    /// Block number
    #[serde(with = "alloy_serde::quantity")]
    pub current_number: u64,
    /// Block timestamp
    #[serde(default, with = "alloy_serde::quantity")]
    pub current_timestamp: u64,
    /// Block difficulty
    #[serde(default)]
    pub current_difficulty: U256,
    /// Hash of the parent block
    #[serde(default)]
    pub parent_hash: B256,
}

impl Env {
    /// Builds the header of the block being processed.
    pub fn header(&self) -> Header {
        Header {
            parent_hash: self.parent_hash,
            beneficiary: self.current_coinbase,
            difficulty: self.current_difficulty,
            number: self.current_number,
            gas_limit: self.current_gas_limit,
            timestamp: self.current_timestamp,
            ..Default::default()
        }
    }
}

/// Transaction as read from the input, either signed or carrying the signing keys.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxInput {
    /// Sender nonce
    #[serde(with = "alloy_serde::quantity")]
    pub nonce: u64,
    /// Gas price
    #[serde(default)]
    pub gas_price: U256,
    /// Gas limit
    #[serde(default, alias = "gasLimit", with = "alloy_serde::quantity")]
    pub gas: u64,
    /// Recipient address (None for contract creation)
    #[serde(default)]
    pub to: Option<Address>,
    /// Value to transfer
    #[serde(default)]
    pub value: U256,
    /// Call data or init code
    #[serde(default, alias = "input")]
    pub data: Bytes,
    /// Sponsor paying for gas
    #[serde(default)]
    pub payment: Option<Address>,
    /// Explicit fee
    #[serde(default)]
    pub fee: Option<U256>,
    /// Signature v component
    #[serde(default, with = "alloy_serde::quantity::opt")]
    pub v: Option<u64>,
    /// Signature r component
    #[serde(default)]
    pub r: U256,
    /// Signature s component
    #[serde(default)]
    pub s: U256,
    /// Payer signature v component
    #[serde(default, with = "alloy_serde::quantity::opt")]
    pub payer_v: Option<u64>,
    /// Payer signature r component
    #[serde(default)]
    pub payer_r: U256,
    /// Payer signature s component
    #[serde(default)]
    pub payer_s: U256,
    /// Secret key of the sender (for unsigned transactions)
    #[serde(default)]
    pub secret_key: Option<B256>,
    /// Secret key of the sponsor (for unsigned sponsored transactions)
    #[serde(default)]
    pub payer_secret_key: Option<B256>,
}

impl TxInput {
    /// Builds the signed transaction at position `index`, signing it if keys are given.
    pub fn into_transaction(self, index: usize, signer: &Signer) -> Result<Transaction> {
        let payer_key = self.payer_secret_key.map(|key| signing_key(index, key)).transpose()?;
        let mut data = TxData {
            nonce: self.nonce,
            gas_price: self.gas_price,
            gas_limit: self.gas,
            to: self.to,
            value: self.value,
            input: self.data,
            payment: self.payment,
            fee: self.fee,
        };
        if let Some(key) = &payer_key {
            data.payment = Some(abey_processor::public_key_to_address(key.verifying_key()));
        }

        let tx = match (self.secret_key, self.v) {
            (Some(key), _) => {
                let key = signing_key(index, key)?;
                signer.sign(data, &key).map_err(|source| T8nError::Signing { index, source })?
            }
            (None, Some(v)) => {
                let payer_signature =
                    self.payer_v.map(|v| TxSignature { v, r: self.payer_r, s: self.payer_s });
                return Ok(Transaction::new(
                    data,
                    TxSignature { v, r: self.r, s: self.s },
                    payer_signature,
                ));
            }
            (None, None) => return Err(T8nError::MissingSignature(index)),
        };

        match payer_key {
            Some(key) => signer
                .sign_as_payer(&tx, &key)
                .map_err(|source| T8nError::Signing { index, source }),
            None => Ok(tx),
        }
    }
}

fn signing_key(index: usize, key: B256) -> Result<SigningKey> {
    SigningKey::from_slice(key.as_slice())
        .map_err(|source| T8nError::InvalidSecretKey { index, source })
}

/// Input data for a state transition
#[derive(Debug)]
pub struct TransitionInputs {
    /// Pre-state allocation of accounts
    pub alloc: StateAlloc,
    /// Block environment
    pub env: Env,
    /// Transactions to apply, in block order
    pub txs: Vec<TxInput>,
    /// Chain configuration, mainnet thresholds when absent
    pub config: Option<ChainConfig>,
}

/// Combined stdin input format
#[derive(Debug, Deserialize)]
pub struct StdinInput {
    /// Pre-state allocation of accounts
    pub alloc: StateAlloc,
    /// Block environment
    pub env: Env,
    /// Transactions to apply
    pub txs: Vec<TxInput>,
    /// Chain configuration
    #[serde(default)]
    pub config: Option<ChainConfig>,
}

/// Why the block was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedBlock {
    /// Index of the offending transaction, absent when finalization failed
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "alloy_serde::quantity::opt"
    )]
    pub index: Option<u64>,
    /// Error message
    pub error: String,
}

/// Results of the transition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionResults {
    /// Receipts, in block order
    pub receipts: Vec<Receipt>,
    /// Bloom filter of all logs
    pub logs_bloom: Bloom,
    /// Total gas used in block
    #[serde(with = "alloy_serde::quantity")]
    pub gas_used: u64,
    /// Fees collected by the block
    pub fee_amount: U256,
    /// Reward summary of the consensus engine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward: Option<ChainReward>,
    /// Set when the block is invalid; no receipts are produced then
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected: Option<RejectedBlock>,
}

/// T8N tool output format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct T8nOutput {
    /// Post-state allocation
    pub alloc: StateAlloc,
    /// Transition results
    pub result: TransitionResults,
}

#[cfg(test)]
mod tests {
    use abey_processor::test_utils::{key_address, signing_key as test_key};

    use super::*;

    #[test]
    fn test_parse_env_quantities() {
        let env: Env = serde_json::from_str(
            r#"{
                "currentCoinbase": "0x00000000000000000000000000000000000000c0",
                "currentGasLimit": "0x7a1200",
                "currentNumber": "0x1",
                "currentTimestamp": "0x3e8"
            }"#,
        )
        .unwrap();
        let header = env.header();
        assert_eq!(header.gas_limit, 8_000_000);
        assert_eq!(header.number, 1);
        assert_eq!(header.timestamp, 1_000);
        assert_eq!(header.parent_hash, B256::ZERO);
    }

    #[test]
    fn test_secret_key_signs_transaction() {
        let key = test_key(1);
        let json = format!(
            r#"{{"nonce":"0x0","gasPrice":"0x1","gas":"0x5208","to":"0x00000000000000000000000000000000000000b0","value":"0x5","secretKey":"{}"}}"#,
            B256::from_slice(&key.to_bytes())
        );
        let input: TxInput = serde_json::from_str(&json).unwrap();
        let signer = Signer::new(179);
        let tx = input.into_transaction(0, &signer).unwrap();
        assert_eq!(signer.sender(&tx).unwrap(), key_address(&key));
        assert_eq!(tx.gas_limit, 21_000);
    }

    #[test]
    fn test_payer_secret_key_sponsors_transaction() {
        let (sender, payer) = (test_key(1), test_key(2));
        let json = format!(
            r#"{{"nonce":"0x0","gas":"0x5208","secretKey":"{}","payerSecretKey":"{}"}}"#,
            B256::from_slice(&sender.to_bytes()),
            B256::from_slice(&payer.to_bytes())
        );
        let input: TxInput = serde_json::from_str(&json).unwrap();
        let signer = Signer::new(179);
        let tx = input.into_transaction(0, &signer).unwrap();
        assert_eq!(tx.payment, Some(key_address(&payer)));
        assert_eq!(signer.payer(&tx).unwrap(), Some(key_address(&payer)));
    }

    #[test]
    fn test_unsigned_transaction_is_rejected() {
        let input: TxInput = serde_json::from_str(r#"{"nonce":"0x0"}"#).unwrap();
        let err = input.into_transaction(3, &Signer::new(179)).unwrap_err();
        assert!(matches!(err, T8nError::MissingSignature(3)));
    }
}
