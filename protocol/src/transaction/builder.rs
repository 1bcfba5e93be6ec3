//! Transaction construction.
//!
//! [`TxEngine::construct`] turns a client request segment into a signed
//! [`Transaction`] in one all-or-nothing step: decode, clean, hash, sign.
//! [`TxEngine::decode_signed`] re-admits a signed record received over the
//! wire without touching its values, so the validator and signature check
//! see exactly what the sender signed.
//!
//! # Segment format
//!
//! A JSON object keyed by snake_case field names. Identifiers, nonces and
//! timestamps are JSON integers; amounts are decimal strings; content
//! hashes are hex strings. Unknown keys are ignored.
//!
//! ```json
//! { "from_account_index": 0, "pair_index": 0, "asset_a_min_amount": "10000",
//!   "gas_fee_asset_amount": "3", "expired_at": 1654656781000, "nonce": 1 }
//! ```

use num_bigint::BigUint;
use serde_json::{Map, Value};

use super::packing::AmountCodec;
use super::preimage::PreimageBuilder;
use super::schema::{
    schema_for, FieldDef, Source, TxSchema, EXPIRED_AT, FROM_ACCOUNT_INDEX, NONCE,
};
use super::signing::sign_transaction;
use super::types::{parse_content_hash, parse_decimal, FieldType, FieldValue, TxType};
use crate::config::ProtocolConfig;
use crate::crypto::hash::{MessageHash, MessageHasher, PoseidonHasher};
use crate::crypto::keys::{PrivateKey, Signature};
use crate::error::{CodecError, RangeViolation};

/// JSON key of the kind tag in signed records.
pub const TX_TYPE_KEY: &str = "tx_type";

/// JSON key of the signature in signed records.
pub const SIGNATURE_KEY: &str = "signature";

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// A rollup transaction of any kind.
///
/// `values` is positionally aligned with the kind's schema. There are no
/// setters: a transaction changes only by producing a new one, either by
/// signing or through [`Transaction::with_ledger_amount`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub(crate) tx_type: TxType,
    pub(crate) values: Vec<FieldValue>,
    pub(crate) signature: Signature,
}

impl Transaction {
    pub fn tx_type(&self) -> TxType {
        self.tx_type
    }

    pub fn schema(&self) -> &'static TxSchema {
        schema_for(self.tx_type)
    }

    pub fn from_account_index(&self) -> i64 {
        self.int(FROM_ACCOUNT_INDEX).unwrap_or_default()
    }

    pub fn nonce(&self) -> i64 {
        self.int(NONCE).unwrap_or_default()
    }

    /// Expiry in milliseconds since the epoch.
    pub fn expired_at(&self) -> i64 {
        self.int(EXPIRED_AT).unwrap_or_default()
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        self.schema().index_of(name).and_then(|i| self.values.get(i))
    }

    /// Integer field by name. `None` if the kind has no such integer field.
    pub fn int(&self, name: &str) -> Option<i64> {
        self.value(name).and_then(FieldValue::as_int)
    }

    /// Amount field by name. `None` if absent or unset.
    pub fn amount(&self, name: &str) -> Option<&BigUint> {
        self.value(name).and_then(FieldValue::as_amount)
    }

    pub fn bytes(&self, name: &str) -> Option<&[u8]> {
        self.value(name).and_then(FieldValue::as_bytes)
    }

    /// Schema entries paired with their values, in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&'static FieldDef, &FieldValue)> {
        self.schema().fields.iter().zip(self.values.iter())
    }

    /// Digest of the transaction's hashed fields.
    ///
    /// Covers the kind's hashed fields plus the configured chain id. The
    /// signature never enters it.
    pub fn compute_hash<H: MessageHasher>(
        &self,
        config: &ProtocolConfig,
    ) -> Result<MessageHash, CodecError> {
        let schema = self.schema();
        let mut preimage =
            PreimageBuilder::for_kind(AmountCodec::from_config(config), self.tx_type.code());

        for &name in schema.hashed {
            let (def, value) = self.slot(name)?;
            match (def.ty.precision(), value) {
                (Some(class), FieldValue::Amount(Some(amount))) => {
                    preimage.write_amount(name, amount, class)?;
                }
                (Some(_), FieldValue::Amount(None)) => {
                    return Err(CodecError::range(name, RangeViolation::Unset));
                }
                (None, FieldValue::Int(v)) => {
                    preimage.write_int(name, *v)?;
                }
                (None, FieldValue::Bytes(b)) => {
                    preimage.write_bytes(name, b)?;
                }
                _ => return Err(mismatch(name, def)),
            }
        }
        preimage.write_chain_id(config.chain_id)?;

        let hash = preimage.finish::<H>()?;
        tracing::trace!(tx_type = %self.tx_type, hash = %hash, "computed transaction hash");
        Ok(hash)
    }

    /// The signed record: kind tag, every field by name, signature hex.
    /// Amounts are decimal strings, unset amounts `null`.
    pub fn to_json(&self) -> Value {
        let mut record = Map::new();
        record.insert(TX_TYPE_KEY.to_string(), Value::from(self.tx_type.name()));
        for (def, value) in self.fields() {
            let encoded = match value {
                FieldValue::Int(v) => Value::from(*v),
                FieldValue::Amount(Some(a)) => Value::from(a.to_str_radix(10)),
                FieldValue::Amount(None) => Value::Null,
                FieldValue::Bytes(b) => Value::from(hex::encode(b)),
            };
            record.insert(def.name.to_string(), encoded);
        }
        record.insert(
            SIGNATURE_KEY.to_string(),
            Value::from(self.signature.to_hex()),
        );
        Value::Object(record)
    }

    /// Copy with a ledger-populated amount set. Ledger fields are outside
    /// the preimage, so the signature stays valid.
    pub fn with_ledger_amount(&self, name: &str, amount: BigUint) -> Result<Self, CodecError> {
        self.with_ledger_value(name, FieldValue::Amount(Some(amount)))
    }

    /// Copy with a ledger-populated integer set (e.g. the allocated NFT
    /// index of a mint).
    pub fn with_ledger_int(&self, name: &str, value: i64) -> Result<Self, CodecError> {
        self.with_ledger_value(name, FieldValue::Int(value))
    }

    fn with_ledger_value(&self, name: &str, value: FieldValue) -> Result<Self, CodecError> {
        let schema = self.schema();
        let index = schema
            .index_of(name)
            .ok_or_else(|| CodecError::parse(name, format!("not a field of {}", self.tx_type)))?;
        let def = &schema.fields[index];
        if def.source != Source::Ledger {
            return Err(CodecError::parse(name, "not a ledger field"));
        }
        if std::mem::discriminant(&def.ty.unset()) != std::mem::discriminant(&value) {
            return Err(mismatch(name, def));
        }
        let mut next = self.clone();
        next.values[index] = value;
        Ok(next)
    }

    pub(crate) fn slot(&self, name: &str) -> Result<(&'static FieldDef, &FieldValue), CodecError> {
        let schema = self.schema();
        schema
            .index_of(name)
            .and_then(|i| Some((&schema.fields[i], self.values.get(i)?)))
            .ok_or_else(|| CodecError::parse(name, format!("not a field of {}", self.tx_type)))
    }
}

pub(crate) fn mismatch(name: &str, def: &FieldDef) -> CodecError {
    CodecError::parse(name, format!("value does not match field type {:?}", def.ty))
}

// ---------------------------------------------------------------------------
// TxEngine
// ---------------------------------------------------------------------------

/// The generic construction engine, bound to one deployment.
#[derive(Debug, Clone, Default)]
pub struct TxEngine {
    config: ProtocolConfig,
    codec: AmountCodec,
}

impl TxEngine {
    pub fn new(config: ProtocolConfig) -> Self {
        let codec = AmountCodec::from_config(&config);
        Self { config, codec }
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    pub fn codec(&self) -> &AmountCodec {
        &self.codec
    }

    /// Decodes, cleans, hashes and signs a request segment.
    ///
    /// Nothing is returned unless every stage succeeds.
    pub fn construct(
        &self,
        tx_type: TxType,
        key: &PrivateKey,
        segment: &str,
    ) -> Result<Transaction, CodecError> {
        self.construct_inner(tx_type, key, segment).map_err(|e| {
            tracing::debug!(tx_type = %tx_type, error = %e, "transaction construction failed");
            e
        })
    }

    fn construct_inner(
        &self,
        tx_type: TxType,
        key: &PrivateKey,
        segment: &str,
    ) -> Result<Transaction, CodecError> {
        let schema = schema_for(tx_type);
        let object = parse_object(segment)?;

        let mut values = Vec::with_capacity(schema.fields.len());
        for def in schema.fields {
            let value = match def.source {
                Source::Request => decode_field(def, object.get(def.name), Presence::Required)?,
                Source::Ledger => def.ty.unset(),
            };
            values.push(self.clean(def, value)?);
        }

        let unsigned = Transaction {
            tx_type,
            values,
            signature: Signature::default(),
        };
        let signed = sign_transaction::<PoseidonHasher>(unsigned, key, &self.config)?;
        tracing::debug!(
            tx_type = %tx_type,
            from = signed.from_account_index(),
            nonce = signed.nonce(),
            "constructed transaction"
        );
        Ok(signed)
    }

    /// Decodes a signed record as produced by [`Transaction::to_json`].
    ///
    /// Values are taken verbatim, without cleaning, and nothing is
    /// re-signed. Unset amounts (`null`) and missing ledger fields are
    /// allowed; the validator reports them.
    pub fn decode_signed(&self, tx_type: TxType, record: &str) -> Result<Transaction, CodecError> {
        let object = parse_object(record)?;

        if let Some(tag) = object.get(TX_TYPE_KEY) {
            let tag = tag
                .as_str()
                .ok_or_else(|| CodecError::parse(TX_TYPE_KEY, "expected a string"))?;
            if tag != tx_type.name() {
                return Err(CodecError::parse(
                    TX_TYPE_KEY,
                    format!("record is {}, expected {}", tag, tx_type.name()),
                ));
            }
        }

        let schema = schema_for(tx_type);
        let values = schema
            .fields
            .iter()
            .map(|def| {
                let presence = match def.source {
                    Source::Request => Presence::Nullable,
                    Source::Ledger => Presence::Optional,
                };
                decode_field(def, object.get(def.name), presence)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let signature = match object.get(SIGNATURE_KEY) {
            None | Some(Value::Null) => Signature::default(),
            Some(Value::String(s)) => Signature::from_hex(s)?,
            Some(_) => return Err(CodecError::parse(SIGNATURE_KEY, "expected a hex string")),
        };

        Ok(Transaction {
            tx_type,
            values,
            signature,
        })
    }

    fn clean(&self, def: &FieldDef, value: FieldValue) -> Result<FieldValue, CodecError> {
        match (def.ty.precision(), value) {
            (Some(class), FieldValue::Amount(Some(amount))) => Ok(FieldValue::Amount(Some(
                self.codec.clean_field(def.name, &amount, class)?,
            ))),
            (_, other) => Ok(other),
        }
    }
}

// ---------------------------------------------------------------------------
// Segment decoding
// ---------------------------------------------------------------------------

/// How strictly a missing or `null` value is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Presence {
    /// Request segments: every field must be present and typed.
    Required,
    /// Signed records: amounts may be `null` (unset).
    Nullable,
    /// Ledger fields in signed records: may be absent entirely.
    Optional,
}

fn parse_object(raw: &str) -> Result<Map<String, Value>, CodecError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(CodecError::parse("segment", "expected a JSON object")),
        Err(e) => Err(CodecError::parse("segment", e.to_string())),
    }
}

fn decode_field(
    def: &FieldDef,
    raw: Option<&Value>,
    presence: Presence,
) -> Result<FieldValue, CodecError> {
    let raw = match (raw, presence) {
        (None | Some(Value::Null), Presence::Optional) => return Ok(def.ty.unset()),
        (Some(Value::Null), Presence::Nullable) if def.ty.is_amount() => {
            return Ok(def.ty.unset())
        }
        (None, _) => return Err(CodecError::parse(def.name, "missing field")),
        (Some(v), _) => v,
    };

    match def.ty {
        FieldType::Amount | FieldType::Fee => {
            let text = raw
                .as_str()
                .ok_or_else(|| CodecError::parse(def.name, "expected a decimal string"))?;
            let amount = parse_decimal(text).map_err(|e| CodecError::parse(def.name, e))?;
            Ok(FieldValue::Amount(Some(amount)))
        }
        FieldType::ContentHash => {
            let text = raw
                .as_str()
                .ok_or_else(|| CodecError::parse(def.name, "expected a hex string"))?;
            let bytes = parse_content_hash(text).map_err(|e| CodecError::parse(def.name, e))?;
            Ok(FieldValue::Bytes(bytes))
        }
        _ => match raw {
            Value::Number(n) => n
                .as_i64()
                .map(FieldValue::Int)
                .ok_or_else(|| CodecError::parse(def.name, format!("{} is not a 64-bit integer", n))),
            _ => Err(CodecError::parse(def.name, "expected an integer")),
        },
    }
}
