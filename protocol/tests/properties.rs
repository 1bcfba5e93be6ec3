//! Property tests for packing, validation, hashing and signatures.
//!
//! Case counts default low because every signed case runs Poseidon and
//! curve arithmetic; raise them with `PROPTEST_CASES`.

use num_bigint::BigUint;
use proptest::prelude::*;
use serde_json::{json, Value};

use legend_protocol::config::{MAX_ACCOUNT_INDEX, MIN_ACCOUNT_INDEX};
use legend_protocol::crypto::{PoseidonHasher, PrivateKey};
use legend_protocol::error::{CodecError, RangeViolation};
use legend_protocol::transaction::{
    schema_for, AmountCodec, FieldType, PrecisionClass, TxEngine, TxType,
};

fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(24);
    ProptestConfig {
        cases,
        ..ProptestConfig::default()
    }
}

fn arb_class() -> impl Strategy<Value = PrecisionClass> {
    prop_oneof![Just(PrecisionClass::Amount), Just(PrecisionClass::Fee)]
}

prop_compose! {
    /// Amounts spread over many magnitudes: a 64-bit mantissa times a power
    /// of ten, so both exact and lossy packings show up.
    fn arb_amount()(mantissa in any::<u64>(), exponent in 0u32..40) -> BigUint {
        BigUint::from(mantissa) * BigUint::from(10u32).pow(exponent)
    }
}

fn arb_kind() -> impl Strategy<Value = TxType> {
    prop::sample::select(TxType::ALL.to_vec())
}

/// A request segment for any kind. Amounts are small enough that adding
/// up to 1000 stays exact in both packing budgets.
fn small_segment(tx_type: TxType) -> Value {
    let mut segment = json!({
        "from_account_index": 4,
        "gas_account_index": 1,
        "gas_fee_asset_id": 0,
        "gas_fee_asset_amount": "25",
        "expired_at": 1654656781000i64,
        "nonce": 9
    });
    let extra = match tx_type {
        TxType::Transfer => json!({
            "to_account_index": 5, "asset_id": 2, "asset_amount": "700"
        }),
        TxType::Swap => json!({
            "pair_index": 3, "asset_a_id": 1, "asset_a_amount": "100",
            "asset_b_id": 2, "asset_b_min_amount": "90"
        }),
        TxType::AddLiquidity => json!({
            "pair_index": 0, "asset_a_id": 1, "asset_a_amount": "10",
            "asset_b_id": 2, "asset_b_amount": "100", "lp_amount": "30"
        }),
        TxType::RemoveLiquidity => json!({
            "pair_index": 0, "asset_a_id": 1, "asset_a_min_amount": "10",
            "asset_b_id": 2, "asset_b_min_amount": "100", "lp_amount": "30",
            "asset_a_amount_delta": "0", "asset_b_amount_delta": "0"
        }),
        TxType::MintNft => json!({
            "to_account_index": 4, "nft_content_hash": "0x1234abcd",
            "creator_treasury_rate": 500, "nft_collection_id": 1
        }),
        TxType::TransferNft => json!({ "to_account_index": 6, "nft_index": 1234 }),
    };
    for (k, v) in extra.as_object().unwrap() {
        segment[k] = v.clone();
    }
    segment
}

/// Shifts one field of a segment to a different value of the same type.
fn perturb(segment: &mut Value, tx_type: TxType, name: &str, delta: u64) {
    let def = schema_for(tx_type).field(name).unwrap();
    let value = match def.ty {
        FieldType::Amount | FieldType::Fee => {
            let base: u64 = segment[name].as_str().unwrap().parse().unwrap();
            json!((base + delta).to_string())
        }
        FieldType::ContentHash => json!(format!("0x{:08x}", 0x1234_abcdu64 ^ delta)),
        _ => json!(segment[name].as_i64().unwrap() + delta as i64),
    };
    segment[name] = value;
}

prop_compose! {
    fn arb_transfer()(from in 0i64..=MAX_ACCOUNT_INDEX,
                      to in 0i64..=MAX_ACCOUNT_INDEX,
                      asset in 0i64..1 << 16,
                      amount in 0u64..1 << 35,
                      fee in 0u64..2048,
                      expired_at in 0i64..i64::MAX,
                      nonce in 0i64..i64::MAX) -> Value
    {
        json!({
            "from_account_index": from,
            "to_account_index": to,
            "asset_id": asset,
            "asset_amount": amount.to_string(),
            "gas_account_index": 1,
            "gas_fee_asset_id": 0,
            "gas_fee_asset_amount": fee.to_string(),
            "expired_at": expired_at,
            "nonce": nonce
        })
    }
}

proptest! {
    #![proptest_config(proptest_config())]

    #[test]
    fn clean_never_overstates(x in arb_amount(), class in arb_class()) {
        let codec = AmountCodec::default();
        if let Ok(cleaned) = codec.clean(&x, class) {
            prop_assert!(cleaned <= x);
            prop_assert!(cleaned <= codec.max_representable(class));
            prop_assert_eq!(codec.clean(&cleaned, class).unwrap(), cleaned.clone());
            let packed = codec.pack(&x, class).unwrap();
            prop_assert_eq!(codec.unpack(packed, class), cleaned);
        }
    }

    #[test]
    fn representable_amounts_always_pack(x in arb_amount(), class in arb_class()) {
        let codec = AmountCodec::default();
        prop_assume!(x <= codec.max_representable(class));
        prop_assert!(codec.pack(&x, class).is_ok());
    }

    #[test]
    fn amounts_above_max_are_rejected(excess in arb_amount(), class in arb_class()) {
        let codec = AmountCodec::default();
        let x = codec.max_representable(class) + BigUint::from(1u32) + excess;
        let packed = codec.pack(&x, class);
        prop_assert!(
            matches!(
                packed,
                Err(CodecError::Range { violation: RangeViolation::Unrepresentable(_), .. })
            ),
            "{} packed to {:?}",
            x,
            packed
        );
        prop_assert!(codec.clean(&x, class).is_err());
    }

    #[test]
    fn every_hashed_field_moves_the_hash(tx_type in arb_kind(),
                                         pick in any::<prop::sample::Index>(),
                                         delta in 1u64..1000) {
        let engine = TxEngine::default();
        let key = PrivateKey::from_seed(&[1u8; 32]).unwrap();
        let hashed = schema_for(tx_type).hashed;
        let name = hashed[pick.index(hashed.len())];

        let segment = small_segment(tx_type);
        let mut changed = segment.clone();
        perturb(&mut changed, tx_type, name, delta);

        let base = engine.construct(tx_type, &key, &segment.to_string()).unwrap();
        let moved = engine.construct(tx_type, &key, &changed.to_string()).unwrap();
        prop_assert_ne!(
            base.compute_hash::<PoseidonHasher>(engine.config()).unwrap(),
            moved.compute_hash::<PoseidonHasher>(engine.config()).unwrap(),
            "{} {} did not move the hash",
            tx_type,
            name
        );
    }

    #[test]
    fn account_bounds_are_enforced(segment in arb_transfer(), to in any::<i64>()) {
        let mut record = segment;
        record["to_account_index"] = json!(to);
        let engine = TxEngine::default();
        let tx = engine.decode_signed(TxType::Transfer, &record.to_string()).unwrap();
        let in_range = (MIN_ACCOUNT_INDEX..=MAX_ACCOUNT_INDEX).contains(&to);
        match tx.validate(engine.config()) {
            Ok(()) => prop_assert!(in_range),
            Err(CodecError::Range { field, .. }) => {
                prop_assert!(!in_range);
                prop_assert_eq!(field, "to_account_index");
            }
            Err(other) => prop_assert!(false, "unexpected error {:?}", other),
        }
    }

    #[test]
    fn hash_is_deterministic_and_nonce_sensitive(segment in arb_transfer()) {
        let engine = TxEngine::default();
        let key = PrivateKey::from_seed(&[1u8; 32]).unwrap();
        let a = engine.construct(TxType::Transfer, &key, &segment.to_string()).unwrap();
        let b = engine.construct(TxType::Transfer, &key, &segment.to_string()).unwrap();
        prop_assert_eq!(
            a.compute_hash::<PoseidonHasher>(engine.config()).unwrap(),
            b.compute_hash::<PoseidonHasher>(engine.config()).unwrap()
        );

        let mut bumped = segment.clone();
        bumped["nonce"] = json!(a.nonce().wrapping_add(1) & i64::MAX);
        let c = engine.construct(TxType::Transfer, &key, &bumped.to_string()).unwrap();
        prop_assert_ne!(
            a.compute_hash::<PoseidonHasher>(engine.config()).unwrap(),
            c.compute_hash::<PoseidonHasher>(engine.config()).unwrap()
        );
    }

    #[test]
    fn constructed_transactions_verify(seed in prop::array::uniform32(any::<u8>()),
                                       segment in arb_transfer()) {
        let key = PrivateKey::from_seed(&seed);
        prop_assume!(key.is_ok());
        let key = key.unwrap();
        let engine = TxEngine::default();
        let tx = engine.construct(TxType::Transfer, &key, &segment.to_string()).unwrap();
        prop_assert!(tx.validate(engine.config()).is_ok());
        prop_assert!(tx.verify_signature(engine.config(), &key.public_key().to_hex()).is_ok());

        let stranger = PrivateKey::from_seed(&[0xEE; 32]).unwrap();
        prop_assume!(stranger != key);
        prop_assert!(tx.verify_signature(engine.config(), &stranger.public_key().to_hex()).is_err());
    }
}
