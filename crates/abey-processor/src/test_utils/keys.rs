use alloy_primitives::{Address, Bytes, U256};
use k256::ecdsa::SigningKey;

use crate::{public_key_to_address, Signer, Transaction, TxData};

/// Returns a deterministic key whose scalar is `seed` repeated. `seed` must not be zero.
pub fn signing_key(seed: u8) -> SigningKey {
    SigningKey::from_slice(&[seed; 32]).expect("non-zero seed is a valid scalar")
}

/// Returns the address owning `key`.
pub fn key_address(key: &SigningKey) -> Address {
    public_key_to_address(key.verifying_key())
}

/// Signs `data` with `key` for `chain_id`.
pub fn sign_tx(chain_id: u64, data: TxData, key: &SigningKey) -> Transaction {
    Signer::new(chain_id).sign(data, key).expect("signing a prehash succeeds")
}

/// Signs `data` with `sender`, then sponsors it with `payer`.
pub fn sign_sponsored_tx(
    chain_id: u64,
    mut data: TxData,
    sender: &SigningKey,
    payer: &SigningKey,
) -> Transaction {
    data.payment = Some(key_address(payer));
    let signer = Signer::new(chain_id);
    let tx = signer.sign(data, sender).expect("signing a prehash succeeds");
    signer.sign_as_payer(&tx, payer).expect("signing a prehash succeeds")
}

/// A plain value transfer priced at one wei per gas.
pub fn transfer(nonce: u64, to: Address, value: u64) -> TxData {
    TxData {
        nonce,
        gas_price: U256::from(1),
        gas_limit: 21_000,
        to: Some(to),
        value: U256::from(value),
        ..Default::default()
    }
}

/// A call carrying `input`, with a gas limit of `gas_limit`.
pub fn call(nonce: u64, to: Address, input: Bytes, gas_limit: u64) -> TxData {
    TxData {
        nonce,
        gas_price: U256::from(1),
        gas_limit,
        to: Some(to),
        input,
        ..Default::default()
    }
}

/// A contract creation deploying `code`.
pub fn create(nonce: u64, code: Bytes, gas_limit: u64) -> TxData {
    TxData { nonce, gas_price: U256::from(1), gas_limit, input: code, ..Default::default() }
}
