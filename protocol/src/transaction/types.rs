//! Core type definitions for rollup transactions.
//!
//! These types form the vocabulary of the generic engine: the kind tag, the
//! semantic type of each field, and the values a field can hold. Decimal
//! strings stop here; everything past request decoding is an exact integer.

use std::fmt;
use std::str::FromStr;

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use super::packing::PrecisionClass;
use crate::config::PREIMAGE_WORD_SIZE;

// ---------------------------------------------------------------------------
// TxType
// ---------------------------------------------------------------------------

/// Discriminant for the operation a transaction represents.
///
/// The numeric codes are part of the protocol; the circuit dispatches on
/// them, so they never change once assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxType {
    /// Move an asset between two accounts.
    Transfer,
    /// Trade one side of a liquidity pair for the other.
    Swap,
    /// Deposit both sides of a pair and receive LP tokens.
    AddLiquidity,
    /// Burn LP tokens and withdraw both sides of a pair.
    RemoveLiquidity,
    /// Mint a new NFT into a creator's collection.
    MintNft,
    /// Hand an NFT to another account.
    TransferNft,
}

impl TxType {
    /// Every kind the registry knows, in code order.
    pub const ALL: [TxType; 6] = [
        TxType::Transfer,
        TxType::Swap,
        TxType::AddLiquidity,
        TxType::RemoveLiquidity,
        TxType::MintNft,
        TxType::TransferNft,
    ];

    /// Protocol code of this kind.
    pub fn code(&self) -> u8 {
        match self {
            Self::Transfer => 6,
            Self::Swap => 7,
            Self::AddLiquidity => 8,
            Self::RemoveLiquidity => 9,
            Self::MintNft => 12,
            Self::TransferNft => 13,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }

    /// Snake-case name, as used on the command line and in JSON records.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Transfer => "transfer",
            Self::Swap => "swap",
            Self::AddLiquidity => "add_liquidity",
            Self::RemoveLiquidity => "remove_liquidity",
            Self::MintNft => "mint_nft",
            Self::TransferNft => "transfer_nft",
        }
    }
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transfer => write!(f, "Transfer"),
            Self::Swap => write!(f, "Swap"),
            Self::AddLiquidity => write!(f, "AddLiquidity"),
            Self::RemoveLiquidity => write!(f, "RemoveLiquidity"),
            Self::MintNft => write!(f, "MintNft"),
            Self::TransferNft => write!(f, "TransferNft"),
        }
    }
}

impl FromStr for TxType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| format!("unknown transaction type: {}", s))
    }
}

// ---------------------------------------------------------------------------
// FieldType
// ---------------------------------------------------------------------------

/// Semantic type of a transaction field. Decides how the field is decoded,
/// which bound the validator applies, and how it is written to the preimage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    AccountIndex,
    AssetId,
    PairIndex,
    NftIndex,
    CollectionId,
    TreasuryRate,
    Nonce,
    /// Millisecond timestamp. Carried and hashed, never range-checked.
    ExpiredAt,
    /// Token amount packed with the ordinary budget.
    Amount,
    /// Gas fee packed with the fee budget.
    Fee,
    /// Opaque content digest, at most one preimage word long.
    ContentHash,
}

impl FieldType {
    /// Packing budget for amount-bearing fields, `None` otherwise.
    pub fn precision(&self) -> Option<PrecisionClass> {
        match self {
            Self::Amount => Some(PrecisionClass::Amount),
            Self::Fee => Some(PrecisionClass::Fee),
            _ => None,
        }
    }

    pub fn is_amount(&self) -> bool {
        self.precision().is_some()
    }

    /// Value a field of this type holds before anything populates it.
    pub fn unset(&self) -> FieldValue {
        match self {
            Self::Amount | Self::Fee => FieldValue::Amount(None),
            Self::ContentHash => FieldValue::Bytes(Vec::new()),
            _ => FieldValue::Int(0),
        }
    }
}

// ---------------------------------------------------------------------------
// FieldValue
// ---------------------------------------------------------------------------

/// The value of one field of a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Identifier, nonce or timestamp.
    Int(i64),
    /// Amount in base units. `None` is the unset sentinel the validator
    /// rejects.
    Amount(Option<BigUint>),
    /// Raw bytes (content hashes).
    Bytes(Vec<u8>),
}

impl FieldValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_amount(&self) -> Option<&BigUint> {
        match self {
            Self::Amount(v) => v.as_ref(),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(v) => Some(v),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Boundary parsers
// ---------------------------------------------------------------------------

/// Strict base-10 parser for amounts carried as strings.
///
/// Accepts ASCII digits only: no sign, no whitespace, no separators, no
/// empty string. Leading zeros are allowed.
pub fn parse_decimal(raw: &str) -> Result<BigUint, String> {
    if raw.is_empty() {
        return Err("empty decimal string".to_string());
    }
    if let Some(bad) = raw.chars().find(|c| !c.is_ascii_digit()) {
        return Err(format!("invalid digit {:?} in {:?}", bad, raw));
    }
    BigUint::parse_bytes(raw.as_bytes(), 10).ok_or_else(|| format!("invalid decimal {:?}", raw))
}

/// Parses a hex content hash (optional `0x` prefix) of 1 to 32 bytes.
pub fn parse_content_hash(raw: &str) -> Result<Vec<u8>, String> {
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    let bytes = hex::decode(digits).map_err(|e| format!("invalid hex: {}", e))?;
    if bytes.is_empty() || bytes.len() > PREIMAGE_WORD_SIZE {
        return Err(format!(
            "expected 1 to {} bytes, got {}",
            PREIMAGE_WORD_SIZE,
            bytes.len()
        ));
    }
    Ok(bytes)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
