use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_rlp::{BufMut, Encodable, Header as RlpHeader, EMPTY_STRING_CODE};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::{HashScheme, Message, Signer, SignerError};

/// The unsigned content of a transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxData {
    /// Sender nonce.
    pub nonce: u64,
    /// Price paid per unit of gas.
    pub gas_price: U256,
    /// Maximum gas the transaction may consume.
    pub gas_limit: u64,
    /// Recipient, `None` for contract creation.
    pub to: Option<Address>,
    /// Value transferred to the recipient.
    pub value: U256,
    /// Call data or init code.
    pub input: Bytes,
    /// Sponsor paying for gas, authorised by the payer signature.
    pub payment: Option<Address>,
    /// Explicit fee added on top of the gas cost.
    pub fee: Option<U256>,
}

impl TxData {
    /// Returns `true` if the transaction deploys a contract.
    pub const fn is_create(&self) -> bool {
        self.to.is_none()
    }

    pub(crate) fn fields_length(&self) -> usize {
        self.nonce.length() +
            self.gas_price.length() +
            self.gas_limit.length() +
            optional_address_length(self.to.as_ref()) +
            self.value.length() +
            self.input.length() +
            optional_address_length(self.payment.as_ref()) +
            self.fee.unwrap_or_default().length()
    }

    pub(crate) fn encode_fields(&self, out: &mut dyn BufMut) {
        self.nonce.encode(out);
        self.gas_price.encode(out);
        self.gas_limit.encode(out);
        encode_optional_address(self.to.as_ref(), out);
        self.value.encode(out);
        self.input.encode(out);
        encode_optional_address(self.payment.as_ref(), out);
        // an absent fee encodes exactly like a zero fee
        self.fee.unwrap_or_default().encode(out);
    }
}

/// An ECDSA signature over secp256k1 with the chain id folded into `v`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxSignature {
    /// Recovery id, `27/28` or `chain_id * 2 + 35/36`.
    pub v: u64,
    /// `r` scalar.
    pub r: U256,
    /// `s` scalar.
    pub s: U256,
}

impl TxSignature {
    /// Returns `true` if `v` commits to a chain id.
    pub const fn is_protected(&self) -> bool {
        self.v != 27 && self.v != 28
    }

    /// Returns the chain id committed to by `v`, if any.
    pub const fn chain_id(&self) -> Option<u64> {
        if self.is_protected() && self.v >= 35 {
            Some((self.v - 35) / 2)
        } else {
            None
        }
    }

    pub(crate) fn fields_length(&self) -> usize {
        self.v.length() + self.r.length() + self.s.length()
    }

    pub(crate) fn encode_fields(&self, out: &mut dyn BufMut) {
        self.v.encode(out);
        self.r.encode(out);
        self.s.encode(out);
    }
}

/// A signed transaction.
///
/// Both hash derivations are computed lazily and cached, so a transaction can be keyed by
/// either scheme during history replay.
#[derive(Debug, Clone, Serialize, Deserialize, derive_more::Deref)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[deref]
    #[serde(flatten)]
    data: TxData,
    signature: TxSignature,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payer_signature: Option<TxSignature>,
    #[serde(skip)]
    hash: OnceCell<B256>,
    #[serde(skip)]
    legacy_hash: OnceCell<B256>,
}

impl PartialEq for Transaction {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data &&
            self.signature == other.signature &&
            self.payer_signature == other.payer_signature
    }
}

impl Eq for Transaction {}

impl Transaction {
    /// Assembles a transaction from its content and signatures.
    pub fn new(data: TxData, signature: TxSignature, payer_signature: Option<TxSignature>) -> Self {
        Self {
            data,
            signature,
            payer_signature,
            hash: OnceCell::new(),
            legacy_hash: OnceCell::new(),
        }
    }

    /// Returns the unsigned content.
    pub const fn data(&self) -> &TxData {
        &self.data
    }

    /// Returns the sender signature.
    pub const fn signature(&self) -> &TxSignature {
        &self.signature
    }

    /// Returns the payer signature, present on sponsored transactions.
    pub const fn payer_signature(&self) -> Option<&TxSignature> {
        self.payer_signature.as_ref()
    }

    /// Hash of the sender-signed envelope, authoritative from TIP10 on.
    pub fn hash(&self) -> B256 {
        *self.hash.get_or_init(|| {
            let payload_length = self.data.fields_length() + self.signature.fields_length();
            keccak_list(payload_length, |out| {
                self.data.encode_fields(out);
                self.signature.encode_fields(out);
            })
        })
    }

    /// Hash over every field including the payer signature, authoritative before TIP10.
    pub fn legacy_hash(&self) -> B256 {
        *self.legacy_hash.get_or_init(|| keccak256(alloy_rlp::encode(self)))
    }

    /// Returns the hash selected by `scheme`.
    pub fn hash_with(&self, scheme: HashScheme) -> B256 {
        match scheme {
            HashScheme::Legacy => self.legacy_hash(),
            HashScheme::Tip10 => self.hash(),
        }
    }

    /// Recovers the sender (and payer) and returns the message to execute.
    pub fn as_message(&self, signer: &Signer) -> Result<Message, SignerError> {
        let from = signer.sender(self)?;
        let payment = signer.payer(self)?;
        Ok(Message {
            from,
            to: self.data.to,
            payment,
            nonce: self.data.nonce,
            value: self.data.value,
            fee: self.data.fee,
            gas_limit: self.data.gas_limit,
            gas_price: self.data.gas_price,
            input: self.data.input.clone(),
            check_nonce: true,
        })
    }

    fn payer_fields_length(&self) -> usize {
        self.payer_signature.unwrap_or_default().fields_length()
    }
}

impl Encodable for Transaction {
    fn encode(&self, out: &mut dyn BufMut) {
        let payload_length = self.data.fields_length() +
            self.signature.fields_length() +
            self.payer_fields_length();
        RlpHeader { list: true, payload_length }.encode(out);
        self.data.encode_fields(out);
        self.signature.encode_fields(out);
        self.payer_signature.unwrap_or_default().encode_fields(out);
    }

    fn length(&self) -> usize {
        let payload_length = self.data.fields_length() +
            self.signature.fields_length() +
            self.payer_fields_length();
        payload_length + alloy_rlp::length_of_length(payload_length)
    }
}

/// Keccak256 of an RLP list whose payload is written by `encode`.
pub(crate) fn keccak_list(payload_length: usize, encode: impl FnOnce(&mut Vec<u8>)) -> B256 {
    let mut out = Vec::with_capacity(payload_length + alloy_rlp::length_of_length(payload_length));
    RlpHeader { list: true, payload_length }.encode(&mut out);
    encode(&mut out);
    keccak256(&out)
}

fn optional_address_length(address: Option<&Address>) -> usize {
    address.map_or(1, |address| address.length())
}

fn encode_optional_address(address: Option<&Address>, out: &mut dyn BufMut) {
    match address {
        Some(address) => address.encode(out),
        None => out.put_u8(EMPTY_STRING_CODE),
    }
}
