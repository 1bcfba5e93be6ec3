//! Transaction verification: range validation and signature checks.
//!
//! [`Transaction::validate`] is purely structural. It walks the kind's
//! `checked` list in order and stops at the first violation, so a
//! transaction breaking several bounds always reports the same one.
//! [`Transaction::verify_signature`] recomputes the hash and checks the
//! signature against a public key. [`verify_transaction`] runs both,
//! cheapest first.

use num_bigint::BigUint;

use super::builder::{mismatch, Transaction};
use super::packing::{AmountCodec, PrecisionClass};
use super::types::{FieldType, FieldValue};
use crate::config::{FieldBounds, IndexRange, ProtocolConfig, PREIMAGE_WORD_SIZE};
use crate::crypto::hash::{MessageHasher, PoseidonHasher};
use crate::crypto::keys::PublicKey;
use crate::crypto::signatures::{parse_public_key, verify};
use crate::error::{CodecError, RangeViolation};

impl Transaction {
    /// Checks every validated field against the deployment's bounds.
    ///
    /// Amount-bearing fields are first checked for presence, then for
    /// bounds, then for being exactly packable: a stored amount must be the
    /// value its packed word signs for. Nonces have a floor only. Expiry is
    /// never compared against a clock.
    pub fn validate(&self, config: &ProtocolConfig) -> Result<(), CodecError> {
        let bounds = &config.bounds;
        let codec = AmountCodec::from_config(config);
        for &name in self.schema().checked {
            let (def, value) = self.slot(name)?;
            match (def.ty, value) {
                (FieldType::Nonce, FieldValue::Int(v)) => {
                    if *v < bounds.min_nonce {
                        return Err(CodecError::range(
                            name,
                            RangeViolation::BelowMin(bounds.min_nonce.to_string()),
                        ));
                    }
                }
                (FieldType::ExpiredAt, _) => {}
                (ty, FieldValue::Int(v)) => {
                    let range = index_range(bounds, ty).ok_or_else(|| mismatch(name, def))?;
                    check_closed(name, v, &range.min, &range.max)?;
                }
                (FieldType::Amount, FieldValue::Amount(amount)) => {
                    let amount = amount
                        .as_ref()
                        .ok_or_else(|| CodecError::range(name, RangeViolation::Unset))?;
                    check_closed(
                        name,
                        amount,
                        &bounds.min_asset_amount,
                        &bounds.max_asset_amount,
                    )?;
                    check_packable(&codec, name, amount, PrecisionClass::Amount)?;
                }
                (FieldType::Fee, FieldValue::Amount(amount)) => {
                    let amount = amount
                        .as_ref()
                        .ok_or_else(|| CodecError::range(name, RangeViolation::Unset))?;
                    check_closed(
                        name,
                        amount,
                        &bounds.min_packed_fee_amount,
                        &bounds.max_packed_fee_amount,
                    )?;
                    check_packable(&codec, name, amount, PrecisionClass::Fee)?;
                }
                (FieldType::ContentHash, FieldValue::Bytes(bytes)) => {
                    if bytes.is_empty() {
                        return Err(CodecError::range(name, RangeViolation::Unset));
                    }
                    if bytes.len() > PREIMAGE_WORD_SIZE {
                        return Err(CodecError::range(
                            name,
                            RangeViolation::AboveMax(format!("{} bytes", PREIMAGE_WORD_SIZE)),
                        ));
                    }
                }
                _ => return Err(mismatch(name, def)),
            }
        }
        Ok(())
    }

    /// Recomputes the hash and verifies the signature against a hex public
    /// key. A signature that does not verify is a `Signature` error.
    pub fn verify_signature(
        &self,
        config: &ProtocolConfig,
        public_key_hex: &str,
    ) -> Result<(), CodecError> {
        let public_key = parse_public_key(public_key_hex)?;
        self.verify_signature_with::<PoseidonHasher>(config, &public_key)
    }

    /// Same as [`Transaction::verify_signature`] with an explicit hasher and
    /// an already parsed key.
    pub fn verify_signature_with<H: MessageHasher>(
        &self,
        config: &ProtocolConfig,
        public_key: &PublicKey,
    ) -> Result<(), CodecError> {
        let hash = self.compute_hash::<H>(config)?;
        if verify::<H>(public_key, self.signature.as_bytes(), &hash)? {
            Ok(())
        } else {
            tracing::debug!(
                tx_type = %self.tx_type,
                from = self.from_account_index(),
                "signature does not verify"
            );
            Err(CodecError::Signature(format!(
                "{} signature does not verify against {}",
                self.tx_type, public_key
            )))
        }
    }
}

/// Validates, then checks the signature.
pub fn verify_transaction(
    tx: &Transaction,
    config: &ProtocolConfig,
    public_key_hex: &str,
) -> Result<(), CodecError> {
    tx.validate(config)?;
    tx.verify_signature(config, public_key_hex)
}

fn index_range(bounds: &FieldBounds, ty: FieldType) -> Option<IndexRange> {
    match ty {
        FieldType::AccountIndex => Some(bounds.account_index),
        FieldType::AssetId => Some(bounds.asset_id),
        FieldType::PairIndex => Some(bounds.pair_index),
        FieldType::NftIndex => Some(bounds.nft_index),
        FieldType::CollectionId => Some(bounds.collection_id),
        FieldType::TreasuryRate => Some(bounds.treasury_rate),
        _ => None,
    }
}

fn check_packable(
    codec: &AmountCodec,
    name: &str,
    amount: &BigUint,
    class: PrecisionClass,
) -> Result<(), CodecError> {
    let cleaned = codec.clean_field(name, amount, class)?;
    if &cleaned != amount {
        return Err(CodecError::range(
            name,
            RangeViolation::Imprecise(cleaned.to_string()),
        ));
    }
    Ok(())
}

fn check_closed<T: PartialOrd + ToString>(
    name: &str,
    value: &T,
    min: &T,
    max: &T,
) -> Result<(), CodecError> {
    if value < min {
        return Err(CodecError::range(
            name,
            RangeViolation::BelowMin(min.to_string()),
        ));
    }
    if value > max {
        return Err(CodecError::range(
            name,
            RangeViolation::AboveMax(max.to_string()),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::PrivateKey;
    use crate::transaction::builder::TxEngine;
    use crate::transaction::packing::PackingParams;
    use crate::transaction::types::TxType;
    use serde_json::{json, Value};

    fn key() -> PrivateKey {
        PrivateKey::from_seed(&[3u8; 32]).unwrap()
    }

    fn mint_record() -> Value {
        json!({
            "from_account_index": 1,
            "to_account_index": 2,
            "nft_content_hash": "0xabcdef",
            "creator_treasury_rate": 250,
            "nft_collection_id": 4,
            "gas_account_index": 1,
            "gas_fee_asset_id": 0,
            "gas_fee_asset_amount": "5",
            "expired_at": 1700000000000i64,
            "nonce": 0
        })
    }

    fn decode(record: &Value) -> Transaction {
        TxEngine::default()
            .decode_signed(TxType::MintNft, &record.to_string())
            .unwrap()
    }

    fn range_violation(err: CodecError) -> (String, RangeViolation) {
        match err {
            CodecError::Range { field, violation } => (field, violation),
            other => panic!("expected range error, got {:?}", other),
        }
    }

    #[test]
    fn valid_transaction_passes() {
        let config = ProtocolConfig::default();
        let tx = TxEngine::new(config.clone())
            .construct(TxType::MintNft, &key(), &mint_record().to_string())
            .unwrap();
        assert!(tx.validate(&config).is_ok());
        assert!(verify_transaction(&tx, &config, &key().public_key().to_hex()).is_ok());
    }

    #[test]
    fn rejects_treasury_rate_above_max() {
        let mut record = mint_record();
        record["creator_treasury_rate"] = json!(10_001);
        let (field, violation) =
            range_violation(decode(&record).validate(&ProtocolConfig::default()).unwrap_err());
        assert_eq!(field, "creator_treasury_rate");
        assert_eq!(violation, RangeViolation::AboveMax("10000".to_string()));
    }

    #[test]
    fn rejects_negative_nonce() {
        let mut record = mint_record();
        record["nonce"] = json!(-1);
        let (field, violation) =
            range_violation(decode(&record).validate(&ProtocolConfig::default()).unwrap_err());
        assert_eq!(field, "nonce");
        assert_eq!(violation, RangeViolation::BelowMin("0".to_string()));
    }

    #[test]
    fn nonce_has_no_upper_bound() {
        let mut record = mint_record();
        record["nonce"] = json!(i64::MAX);
        assert!(decode(&record).validate(&ProtocolConfig::default()).is_ok());
    }

    #[test]
    fn expiry_is_not_checked() {
        let mut record = mint_record();
        record["expired_at"] = json!(-5);
        assert!(decode(&record).validate(&ProtocolConfig::default()).is_ok());
    }

    #[test]
    fn unset_fee_is_reported() {
        let mut record = mint_record();
        record["gas_fee_asset_amount"] = Value::Null;
        let (field, violation) =
            range_violation(decode(&record).validate(&ProtocolConfig::default()).unwrap_err());
        assert_eq!(field, "gas_fee_asset_amount");
        assert_eq!(violation, RangeViolation::Unset);
    }

    #[test]
    fn fee_above_max_is_reported() {
        let config = ProtocolConfig::default();
        let mut record = mint_record();
        let too_much = &config.bounds.max_packed_fee_amount + BigUint::from(1u32);
        record["gas_fee_asset_amount"] = json!(too_much.to_string());
        let (field, violation) = range_violation(decode(&record).validate(&config).unwrap_err());
        assert_eq!(field, "gas_fee_asset_amount");
        assert!(matches!(violation, RangeViolation::AboveMax(_)));
    }

    #[test]
    fn lossy_fee_is_reported() {
        let mut record = mint_record();
        record["gas_fee_asset_amount"] = json!("20400");
        assert!(decode(&record).validate(&ProtocolConfig::default()).is_ok());

        record["gas_fee_asset_amount"] = json!("20409");
        let (field, violation) =
            range_violation(decode(&record).validate(&ProtocolConfig::default()).unwrap_err());
        assert_eq!(field, "gas_fee_asset_amount");
        assert_eq!(violation, RangeViolation::Imprecise("20400".to_string()));
    }

    #[test]
    fn edited_fee_cannot_ride_an_existing_signature() {
        let config = ProtocolConfig::default();
        let engine = TxEngine::new(config.clone());
        let mut segment = mint_record();
        segment["gas_fee_asset_amount"] = json!("20400");
        let tx = engine
            .construct(TxType::MintNft, &key(), &segment.to_string())
            .unwrap();
        let pk = key().public_key().to_hex();
        assert!(verify_transaction(&tx, &config, &pk).is_ok());

        // 20409 packs to the same word as 20400, so the signature alone
        // still checks out.
        let mut record = tx.to_json();
        record["gas_fee_asset_amount"] = json!("20409");
        let edited = engine
            .decode_signed(TxType::MintNft, &record.to_string())
            .unwrap();
        assert!(edited.verify_signature(&config, &pk).is_ok());
        let err = verify_transaction(&edited, &config, &pk).unwrap_err();
        assert_eq!(err.field(), Some("gas_fee_asset_amount"));
    }

    #[test]
    fn lossy_amount_is_reported_with_custom_budget() {
        let mut config = ProtocolConfig::default();
        config.amount_packing = PackingParams::new(4, 5);
        config.bounds = FieldBounds::for_packing(config.amount_packing, config.fee_packing);
        let tx = TxEngine::default()
            .decode_signed(
                TxType::Transfer,
                &json!({
                    "from_account_index": 1,
                    "to_account_index": 2,
                    "asset_id": 0,
                    "asset_amount": "17",
                    "gas_account_index": 1,
                    "gas_fee_asset_id": 0,
                    "gas_fee_asset_amount": "5",
                    "expired_at": 0,
                    "nonce": 0
                })
                .to_string(),
            )
            .unwrap();
        let (field, violation) = range_violation(tx.validate(&config).unwrap_err());
        assert_eq!(field, "asset_amount");
        assert_eq!(violation, RangeViolation::Imprecise("10".to_string()));
    }

    #[test]
    fn first_violation_wins() {
        let mut record = mint_record();
        record["from_account_index"] = json!(-1);
        record["nonce"] = json!(-1);
        record["creator_treasury_rate"] = json!(20_000);
        let (field, _) =
            range_violation(decode(&record).validate(&ProtocolConfig::default()).unwrap_err());
        assert_eq!(field, "from_account_index");
    }

    #[test]
    fn custom_bounds_are_honoured() {
        let mut config = ProtocolConfig::default();
        config.bounds.collection_id = IndexRange::new(0, 3);
        let (field, violation) =
            range_violation(decode(&mint_record()).validate(&config).unwrap_err());
        assert_eq!(field, "nft_collection_id");
        assert_eq!(violation, RangeViolation::AboveMax("3".to_string()));
    }

    #[test]
    fn wrong_key_is_signature_error() {
        let config = ProtocolConfig::default();
        let tx = TxEngine::new(config.clone())
            .construct(TxType::MintNft, &key(), &mint_record().to_string())
            .unwrap();
        let other = PrivateKey::from_seed(&[4u8; 32]).unwrap();
        let err = tx
            .verify_signature(&config, &other.public_key().to_hex())
            .unwrap_err();
        assert!(matches!(err, CodecError::Signature(_)));
    }

    #[test]
    fn malformed_key_is_decode_error() {
        let tx = decode(&mint_record());
        let err = tx
            .verify_signature(&ProtocolConfig::default(), "not-a-key")
            .unwrap_err();
        assert!(matches!(err, CodecError::Decode(_)));
    }

    #[test]
    fn unsigned_record_is_decode_error() {
        let tx = decode(&mint_record());
        let err = tx
            .verify_signature(&ProtocolConfig::default(), &key().public_key().to_hex())
            .unwrap_err();
        assert!(matches!(err, CodecError::Decode(_)));
    }

    #[test]
    fn signature_is_bound_to_chain_id() {
        let tx = TxEngine::new(ProtocolConfig::mainnet())
            .construct(TxType::MintNft, &key(), &mint_record().to_string())
            .unwrap();
        let pk = key().public_key().to_hex();
        assert!(tx.verify_signature(&ProtocolConfig::mainnet(), &pk).is_ok());
        assert!(tx.verify_signature(&ProtocolConfig::testnet(), &pk).is_err());
        assert!(tx.verify_signature(&ProtocolConfig::legacy(), &pk).is_err());
    }
}
