//! # Protocol Configuration & Constants
//!
//! Every bound the circuit enforces lives here. If a range check somewhere
//! else hardcodes a number, it is out of sync with the prover waiting to
//! happen.
//!
//! The constants describe mainnet. Deployments that differ (a testnet with a
//! different chain id, a legacy network whose preimages carry no chain id at
//! all) load a [`ProtocolConfig`] instead of patching constants.

use std::fs;
use std::path::Path;

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::transaction::packing::PackingParams;

// ---------------------------------------------------------------------------
// Chain Identifiers
// ---------------------------------------------------------------------------

/// Chain id bound into mainnet signatures.
pub const CHAIN_ID_MAINNET: i64 = 56;

/// Chain id bound into testnet signatures.
pub const CHAIN_ID_TESTNET: i64 = 97;

/// Protocol version string reported by tooling.
pub const PROTOCOL_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Identifier Bounds
// ---------------------------------------------------------------------------

pub const MIN_ACCOUNT_INDEX: i64 = 0;
pub const MAX_ACCOUNT_INDEX: i64 = (1 << 32) - 1;

pub const MIN_ASSET_ID: i64 = 0;
pub const MAX_ASSET_ID: i64 = (1 << 16) - 1;

pub const MIN_PAIR_INDEX: i64 = 0;
pub const MAX_PAIR_INDEX: i64 = (1 << 16) - 1;

pub const MIN_NFT_INDEX: i64 = 0;
pub const MAX_NFT_INDEX: i64 = (1 << 40) - 1;

pub const MIN_COLLECTION_ID: i64 = 0;
pub const MAX_COLLECTION_ID: i64 = (1 << 16) - 1;

/// Creator treasury rates are basis points; 10_000 is 100%.
pub const MIN_TREASURY_RATE: i64 = 0;
pub const MAX_TREASURY_RATE: i64 = 10_000;

/// Nonces only have a floor. The ledger owns the counter.
pub const MIN_NONCE: i64 = 0;

// ---------------------------------------------------------------------------
// Packing Budgets
// ---------------------------------------------------------------------------

/// Ordinary amounts: 35-bit mantissa, 5-bit decimal exponent (40 bits total).
pub const AMOUNT_MANTISSA_BITS: u32 = 35;
pub const AMOUNT_EXPONENT_BITS: u32 = 5;

/// Fees: 11-bit mantissa, 5-bit decimal exponent (16 bits total).
pub const FEE_MANTISSA_BITS: u32 = 11;
pub const FEE_EXPONENT_BITS: u32 = 5;

/// Hash preimage word width. One BN254 scalar per field.
pub const PREIMAGE_WORD_SIZE: usize = 32;

// ---------------------------------------------------------------------------
// ProtocolConfig
// ---------------------------------------------------------------------------

/// Errors while loading a deployment configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid packing budget for {class}: {mantissa_bits}+{exponent_bits} bits does not fit a 63-bit word")]
    PackingBudget {
        class: &'static str,
        mantissa_bits: u32,
        exponent_bits: u32,
    },

    #[error("invalid bound for {field}: min {min} is larger than max {max}")]
    InvertedBound {
        field: &'static str,
        min: String,
        max: String,
    },

    #[error("invalid bound for {field}: max {max} exceeds the packable maximum {packable}")]
    BoundExceedsBudget {
        field: &'static str,
        max: String,
        packable: String,
    },

    #[error("invalid chain id {0}: must not be negative")]
    NegativeChainId(i64),
}

/// An inclusive identifier range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRange {
    pub min: i64,
    pub max: i64,
}

impl IndexRange {
    pub const fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }
}

/// Closed-interval bounds the validator enforces, one entry per field type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldBounds {
    pub account_index: IndexRange,
    pub asset_id: IndexRange,
    pub pair_index: IndexRange,
    pub nft_index: IndexRange,
    pub collection_id: IndexRange,
    pub treasury_rate: IndexRange,
    pub min_nonce: i64,
    #[serde(with = "decimal")]
    pub min_asset_amount: BigUint,
    #[serde(with = "decimal")]
    pub max_asset_amount: BigUint,
    #[serde(with = "decimal")]
    pub min_packed_fee_amount: BigUint,
    #[serde(with = "decimal")]
    pub max_packed_fee_amount: BigUint,
}

impl FieldBounds {
    /// Amount bounds derived from the packing budgets: the maximum is the
    /// largest value the packed word can carry.
    pub fn for_packing(amount: PackingParams, fee: PackingParams) -> Self {
        Self {
            account_index: IndexRange::new(MIN_ACCOUNT_INDEX, MAX_ACCOUNT_INDEX),
            asset_id: IndexRange::new(MIN_ASSET_ID, MAX_ASSET_ID),
            pair_index: IndexRange::new(MIN_PAIR_INDEX, MAX_PAIR_INDEX),
            nft_index: IndexRange::new(MIN_NFT_INDEX, MAX_NFT_INDEX),
            collection_id: IndexRange::new(MIN_COLLECTION_ID, MAX_COLLECTION_ID),
            treasury_rate: IndexRange::new(MIN_TREASURY_RATE, MAX_TREASURY_RATE),
            min_nonce: MIN_NONCE,
            min_asset_amount: BigUint::from(0u32),
            max_asset_amount: amount.max_value(),
            min_packed_fee_amount: BigUint::from(0u32),
            max_packed_fee_amount: fee.max_value(),
        }
    }
}

impl Default for FieldBounds {
    fn default() -> Self {
        Self::for_packing(PackingParams::AMOUNT, PackingParams::FEE)
    }
}

/// Per-deployment protocol parameters.
///
/// Threaded through hashing, signing and validation so a single build can
/// serve several networks. `Default` is mainnet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Appended as the last preimage word when set. `None` reproduces the
    /// legacy preimage that carried no network binding.
    pub chain_id: Option<i64>,
    pub amount_packing: PackingParams,
    pub fee_packing: PackingParams,
    pub bounds: FieldBounds,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self::mainnet()
    }
}

impl ProtocolConfig {
    pub fn mainnet() -> Self {
        Self::with_chain_id(Some(CHAIN_ID_MAINNET))
    }

    pub fn testnet() -> Self {
        Self::with_chain_id(Some(CHAIN_ID_TESTNET))
    }

    /// Parameters of the pre-chain-id network.
    pub fn legacy() -> Self {
        Self::with_chain_id(None)
    }

    pub fn with_chain_id(chain_id: Option<i64>) -> Self {
        Self {
            chain_id,
            amount_packing: PackingParams::AMOUNT,
            fee_packing: PackingParams::FEE,
            bounds: FieldBounds::default(),
        }
    }

    /// Loads and checks a JSON deployment file. Missing keys fall back to
    /// mainnet values.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    ///
    /// Amount maxima the file leaves out follow the file's packing budgets,
    /// not the mainnet ones.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let value: serde_json::Value = serde_json::from_str(raw)?;
        let declared = |key: &str| {
            value
                .get("bounds")
                .and_then(|bounds| bounds.get(key))
                .is_some()
        };
        let (amount_declared, fee_declared) =
            (declared("max_asset_amount"), declared("max_packed_fee_amount"));

        let mut config: Self = serde_json::from_value(value)?;
        config.check_packing()?;
        if !amount_declared {
            config.bounds.max_asset_amount = config.amount_packing.max_value();
        }
        if !fee_declared {
            config.bounds.max_packed_fee_amount = config.fee_packing.max_value();
        }
        config.check()?;
        Ok(config)
    }

    /// Rejects budgets that overflow the packed word, a negative chain id,
    /// inverted ranges and amount maxima the budgets cannot pack.
    pub fn check(&self) -> Result<(), ConfigError> {
        self.check_packing()?;
        if let Some(id) = self.chain_id.filter(|id| *id < 0) {
            return Err(ConfigError::NegativeChainId(id));
        }

        let b = &self.bounds;
        let ranges = [
            ("account_index", b.account_index),
            ("asset_id", b.asset_id),
            ("pair_index", b.pair_index),
            ("nft_index", b.nft_index),
            ("collection_id", b.collection_id),
            ("treasury_rate", b.treasury_rate),
        ];
        for (field, range) in ranges {
            if range.min > range.max {
                return Err(ConfigError::InvertedBound {
                    field,
                    min: range.min.to_string(),
                    max: range.max.to_string(),
                });
            }
        }
        if b.min_asset_amount > b.max_asset_amount {
            return Err(ConfigError::InvertedBound {
                field: "asset_amount",
                min: b.min_asset_amount.to_string(),
                max: b.max_asset_amount.to_string(),
            });
        }
        if b.min_packed_fee_amount > b.max_packed_fee_amount {
            return Err(ConfigError::InvertedBound {
                field: "packed_fee_amount",
                min: b.min_packed_fee_amount.to_string(),
                max: b.max_packed_fee_amount.to_string(),
            });
        }

        let maxima = [
            ("asset_amount", &b.max_asset_amount, self.amount_packing),
            ("packed_fee_amount", &b.max_packed_fee_amount, self.fee_packing),
        ];
        for (field, max, params) in maxima {
            let packable = params.max_value();
            if *max > packable {
                return Err(ConfigError::BoundExceedsBudget {
                    field,
                    max: max.to_string(),
                    packable: packable.to_string(),
                });
            }
        }
        Ok(())
    }

    fn check_packing(&self) -> Result<(), ConfigError> {
        for (class, params) in [("amount", self.amount_packing), ("fee", self.fee_packing)] {
            if !params.fits_word() {
                return Err(ConfigError::PackingBudget {
                    class,
                    mantissa_bits: params.mantissa_bits,
                    exponent_bits: params.exponent_bits,
                });
            }
        }
        Ok(())
    }
}

/// Friendly name for a chain id, mainly for logging.
pub fn network_name(chain_id: Option<i64>) -> String {
    match chain_id {
        Some(CHAIN_ID_MAINNET) => "mainnet".to_string(),
        Some(CHAIN_ID_TESTNET) => "testnet".to_string(),
        Some(other) => format!("custom({})", other),
        None => "legacy".to_string(),
    }
}

/// Serde adapter that carries big integers as decimal strings, the same
/// convention request segments use for amounts.
pub(crate) mod decimal {
    use num_bigint::BigUint;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_str_radix(10))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigUint, D::Error> {
        let raw = String::deserialize(deserializer)?;
        crate::transaction::types::parse_decimal(&raw).map_err(D::Error::custom)
    }
}
