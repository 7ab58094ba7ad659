//! Transaction signing and sender recovery.

use alloy_primitives::{Address, BlockNumber, PrimitiveSignature, SignatureError, B256};
use alloy_rlp::Encodable;
use k256::ecdsa::{SigningKey, VerifyingKey};

use crate::{keccak_list, ChainConfig, Transaction, TxData, TxSignature};

/// Errors raised while recovering the sender or payer of a transaction.
#[derive(Debug, thiserror::Error)]
pub enum SignerError {
    /// The signature commits to another chain.
    #[error("invalid chain id: expected {expected}, got {got:?}")]
    InvalidChainId {
        /// Chain id of the signer
        expected: u64,
        /// Chain id encoded in `v`, if any
        got: Option<u64>,
    },
    /// The chain id is too large to be encoded in `v`.
    #[error("chain id {0} cannot be encoded in a signature")]
    UnencodableChainId(u64),
    /// The signature is malformed or no key can be recovered from it.
    #[error("invalid signature: {0}")]
    InvalidSignature(#[from] SignatureError),
    /// A sponsored transaction lacks the payer signature.
    #[error("missing payer signature for sponsor {0}")]
    MissingPayerSignature(Address),
    /// The payer signature recovers to an address other than the declared sponsor.
    #[error("payer signature recovers to {recovered}, expected {expected}")]
    PayerMismatch {
        /// Sponsor declared by the transaction
        expected: Address,
        /// Address recovered from the payer signature
        recovered: Address,
    },
}

/// Chain-id aware signer, replay protected in the style of EIP-155.
///
/// Unprotected signatures (`v` of 27 or 28) are accepted and hashed without the chain id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signer {
    chain_id: u64,
}

impl Signer {
    /// Creates a signer for `chain_id`.
    pub const fn new(chain_id: u64) -> Self {
        Self { chain_id }
    }

    /// Returns the signer in force at `number`.
    pub const fn for_block(config: &ChainConfig, _number: BlockNumber) -> Self {
        Self::new(config.chain_id)
    }

    /// Returns the chain id of the signer.
    pub const fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Hash signed by the sender.
    pub fn sender_hash(&self, data: &TxData, chain_id: Option<u64>) -> B256 {
        let suffix = chain_id_suffix_length(chain_id);
        keccak_list(data.fields_length() + suffix, |out| {
            data.encode_fields(out);
            encode_chain_id_suffix(chain_id, out);
        })
    }

    /// Hash signed by the payer: the sender-signed envelope plus the chain id.
    pub fn payer_hash(&self, data: &TxData, signature: &TxSignature, chain_id: Option<u64>) -> B256 {
        let suffix = chain_id_suffix_length(chain_id);
        keccak_list(data.fields_length() + signature.fields_length() + suffix, |out| {
            data.encode_fields(out);
            signature.encode_fields(out);
            encode_chain_id_suffix(chain_id, out);
        })
    }

    /// Recovers the sender of `tx`.
    pub fn sender(&self, tx: &Transaction) -> Result<Address, SignerError> {
        let signature = tx.signature();
        let (chain_id, y_parity) = self.decode_v(signature)?;
        let hash = self.sender_hash(tx.data(), chain_id);
        recover_address(hash, y_parity, signature)
    }

    /// Recovers the gas sponsor of `tx`, checking it against the declared payment address.
    pub fn payer(&self, tx: &Transaction) -> Result<Option<Address>, SignerError> {
        let Some(expected) = tx.payment else {
            return Ok(None);
        };
        let payer_signature =
            tx.payer_signature().ok_or(SignerError::MissingPayerSignature(expected))?;
        let (chain_id, y_parity) = self.decode_v(payer_signature)?;
        let hash = self.payer_hash(tx.data(), tx.signature(), chain_id);
        let recovered = recover_address(hash, y_parity, payer_signature)?;
        if recovered != expected {
            return Err(SignerError::PayerMismatch { expected, recovered });
        }
        Ok(Some(expected))
    }

    /// Signs `data` as the sender with replay protection.
    pub fn sign(&self, data: TxData, key: &SigningKey) -> Result<Transaction, SignerError> {
        let hash = self.sender_hash(&data, Some(self.chain_id));
        let signature = self.sign_hash(hash, key)?;
        Ok(Transaction::new(data, signature, None))
    }

    /// Adds the payer signature to a sender-signed transaction.
    pub fn sign_as_payer(
        &self,
        tx: &Transaction,
        key: &SigningKey,
    ) -> Result<Transaction, SignerError> {
        let hash = self.payer_hash(tx.data(), tx.signature(), Some(self.chain_id));
        let payer_signature = self.sign_hash(hash, key)?;
        Ok(Transaction::new(tx.data().clone(), *tx.signature(), Some(payer_signature)))
    }

    fn sign_hash(&self, hash: B256, key: &SigningKey) -> Result<TxSignature, SignerError> {
        // v = 35 + 2 * chain_id + y_parity
        let base = self
            .chain_id
            .checked_mul(2)
            .and_then(|id| id.checked_add(36))
            .ok_or(SignerError::UnencodableChainId(self.chain_id))?;
        let signature: PrimitiveSignature =
            key.sign_prehash_recoverable(hash.as_slice()).map_err(SignatureError::from)?.into();
        Ok(TxSignature {
            v: base - 1 + u64::from(signature.v()),
            r: signature.r(),
            s: signature.s(),
        })
    }

    /// Splits `v` into the committed chain id and the y parity.
    fn decode_v(&self, signature: &TxSignature) -> Result<(Option<u64>, bool), SignerError> {
        if !signature.is_protected() {
            return Ok((None, signature.v == 28));
        }
        let got = signature.chain_id();
        if got != Some(self.chain_id) {
            return Err(SignerError::InvalidChainId { expected: self.chain_id, got });
        }
        // a matching chain id implies v >= 35
        Ok((Some(self.chain_id), (signature.v - 35) % 2 == 1))
    }
}

/// Derives the address owning `key`.
pub fn public_key_to_address(key: &VerifyingKey) -> Address {
    Address::from_public_key(key)
}

fn recover_address(
    hash: B256,
    y_parity: bool,
    signature: &TxSignature,
) -> Result<Address, SignerError> {
    let signature = PrimitiveSignature::new(signature.r, signature.s, y_parity);
    Ok(signature.recover_address_from_prehash(&hash)?)
}

fn chain_id_suffix_length(chain_id: Option<u64>) -> usize {
    chain_id.map_or(0, |id| id.length() + 2)
}

fn encode_chain_id_suffix(chain_id: Option<u64>, out: &mut dyn alloy_rlp::BufMut) {
    if let Some(id) = chain_id {
        id.encode(out);
        0u8.encode(out);
        0u8.encode(out);
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{address, U256};

    use super::*;

    fn key(seed: u8) -> SigningKey {
        SigningKey::from_slice(&[seed; 32]).unwrap()
    }

    fn data() -> TxData {
        TxData {
            nonce: 1,
            gas_price: U256::from(2),
            gas_limit: 21_000,
            to: Some(address!("00000000000000000000000000000000000000b0")),
            value: U256::from(7),
            ..Default::default()
        }
    }

    #[test]
    fn test_sign_and_recover_sender() {
        let key = key(1);
        let signer = Signer::new(179);
        let tx = signer.sign(data(), &key).unwrap();
        assert_eq!(tx.signature().chain_id(), Some(179));
        assert_eq!(signer.sender(&tx).unwrap(), public_key_to_address(key.verifying_key()));
        assert_eq!(signer.payer(&tx).unwrap(), None);
    }

    #[test]
    fn test_wrong_chain_id_is_rejected() {
        let tx = Signer::new(1).sign(data(), &key(1)).unwrap();
        let err = Signer::new(2).sender(&tx).unwrap_err();
        assert!(matches!(err, SignerError::InvalidChainId { expected: 2, got: Some(1) }));
    }

    #[test]
    fn test_tampered_transaction_recovers_other_sender() {
        let signer = Signer::new(1);
        let key = key(3);
        let tx = signer.sign(data(), &key).unwrap();
        let mut tampered = tx.data().clone();
        tampered.value = U256::from(8);
        let tampered = Transaction::new(tampered, *tx.signature(), None);
        let expected = public_key_to_address(key.verifying_key());
        assert!(signer.sender(&tampered).map_or(true, |sender| sender != expected));
    }

    #[test]
    fn test_zero_signature_is_invalid() {
        let tx = Transaction::new(data(), TxSignature { v: 37, r: U256::ZERO, s: U256::ZERO }, None);
        let err = Signer::new(1).sender(&tx).unwrap_err();
        assert!(matches!(err, SignerError::InvalidSignature(_)));
    }

    #[test]
    fn test_unencodable_chain_id_is_an_error() {
        for chain_id in [u64::MAX, 1 << 63, (u64::MAX - 35) / 2 + 1] {
            let err = Signer::new(chain_id).sign(data(), &key(1)).unwrap_err();
            assert!(matches!(err, SignerError::UnencodableChainId(id) if id == chain_id));
        }
    }

    #[test]
    fn test_largest_encodable_chain_id_round_trips() {
        let chain_id = (u64::MAX - 36) / 2;
        let signer = Signer::new(chain_id);
        let key = key(6);
        let tx = signer.sign(data(), &key).unwrap();
        assert_eq!(tx.signature().chain_id(), Some(chain_id));
        assert_eq!(signer.sender(&tx).unwrap(), Address::from_private_key(&key));
    }

    #[test]
    fn test_foreign_v_is_rejected_for_max_chain_id() {
        let signature = TxSignature { v: u64::MAX, r: U256::from(1), s: U256::from(1) };
        let tx = Transaction::new(data(), signature, None);
        let err = Signer::new(u64::MAX).sender(&tx).unwrap_err();
        assert!(matches!(err, SignerError::InvalidChainId { expected: u64::MAX, .. }));
    }

    #[test]
    fn test_sponsored_transaction() {
        let signer = Signer::new(1);
        let sponsor_key = key(9);
        let sponsor = public_key_to_address(sponsor_key.verifying_key());
        let tx = signer.sign(TxData { payment: Some(sponsor), ..data() }, &key(4)).unwrap();

        let err = signer.payer(&tx).unwrap_err();
        assert!(matches!(err, SignerError::MissingPayerSignature(addr) if addr == sponsor));

        let sponsored = signer.sign_as_payer(&tx, &sponsor_key).unwrap();
        assert_eq!(signer.payer(&sponsored).unwrap(), Some(sponsor));

        let forged = signer.sign_as_payer(&tx, &key(10)).unwrap();
        assert!(matches!(signer.payer(&forged), Err(SignerError::PayerMismatch { .. })));
    }

    #[test]
    fn test_message_carries_recovered_fields() {
        let signer = Signer::new(1);
        let key = key(5);
        let tx = signer.sign(TxData { fee: Some(U256::from(11)), ..data() }, &key).unwrap();
        let msg = tx.as_message(&signer).unwrap();
        assert_eq!(msg.from, public_key_to_address(key.verifying_key()));
        assert_eq!(msg.fee, Some(U256::from(11)));
        assert_eq!(msg.nonce, tx.nonce);
        assert!(msg.check_nonce);
    }
}
