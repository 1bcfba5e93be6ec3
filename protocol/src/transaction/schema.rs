//! Per-kind field schemas.
//!
//! A transaction kind is fully described by three static lists: the fields
//! it carries, the order they enter the hash preimage, and the order the
//! validator checks them. The builder, hasher and validator are generic and
//! read only these tables, so adding a kind means adding a schema here and a
//! code in [`TxType`].
//!
//! Pair-keyed operations (swap, liquidity) carry their asset ids for the
//! executor but neither hash nor check them: the pair already pins both
//! assets.

use super::types::{FieldType, TxType};

/// Where a field's value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Decoded from the client's request segment.
    Request,
    /// Filled by the ledger executor after admission. Unset at construction
    /// and never part of the preimage or the validator's walk.
    Ledger,
}

/// One field of a transaction kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub ty: FieldType,
    pub source: Source,
}

const fn req(name: &'static str, ty: FieldType) -> FieldDef {
    FieldDef {
        name,
        ty,
        source: Source::Request,
    }
}

const fn ledger(name: &'static str, ty: FieldType) -> FieldDef {
    FieldDef {
        name,
        ty,
        source: Source::Ledger,
    }
}

/// Static description of one transaction kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxSchema {
    pub tx_type: TxType,
    /// Every field, in declaration order. Transaction values are
    /// positionally aligned with this list.
    pub fields: &'static [FieldDef],
    /// Preimage order, chain id excluded.
    pub hashed: &'static [&'static str],
    /// Validation order.
    pub checked: &'static [&'static str],
}

impl TxSchema {
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&'static FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn request_fields(&self) -> impl Iterator<Item = &'static FieldDef> {
        self.fields.iter().filter(|f| f.source == Source::Request)
    }
}

// ---------------------------------------------------------------------------
// Field names shared by every kind
// ---------------------------------------------------------------------------

pub const FROM_ACCOUNT_INDEX: &str = "from_account_index";
pub const GAS_ACCOUNT_INDEX: &str = "gas_account_index";
pub const GAS_FEE_ASSET_ID: &str = "gas_fee_asset_id";
pub const GAS_FEE_ASSET_AMOUNT: &str = "gas_fee_asset_amount";
pub const EXPIRED_AT: &str = "expired_at";
pub const NONCE: &str = "nonce";

// ---------------------------------------------------------------------------
// Schemas
// ---------------------------------------------------------------------------

pub static TRANSFER: TxSchema = TxSchema {
    tx_type: TxType::Transfer,
    fields: &[
        req(FROM_ACCOUNT_INDEX, FieldType::AccountIndex),
        req("to_account_index", FieldType::AccountIndex),
        req("asset_id", FieldType::AssetId),
        req("asset_amount", FieldType::Amount),
        req(GAS_ACCOUNT_INDEX, FieldType::AccountIndex),
        req(GAS_FEE_ASSET_ID, FieldType::AssetId),
        req(GAS_FEE_ASSET_AMOUNT, FieldType::Fee),
        req(EXPIRED_AT, FieldType::ExpiredAt),
        req(NONCE, FieldType::Nonce),
    ],
    hashed: &[
        FROM_ACCOUNT_INDEX,
        "to_account_index",
        "asset_id",
        "asset_amount",
        GAS_ACCOUNT_INDEX,
        GAS_FEE_ASSET_ID,
        GAS_FEE_ASSET_AMOUNT,
        EXPIRED_AT,
        NONCE,
    ],
    checked: &[
        FROM_ACCOUNT_INDEX,
        "to_account_index",
        "asset_id",
        "asset_amount",
        GAS_ACCOUNT_INDEX,
        GAS_FEE_ASSET_ID,
        GAS_FEE_ASSET_AMOUNT,
        NONCE,
    ],
};

pub static SWAP: TxSchema = TxSchema {
    tx_type: TxType::Swap,
    fields: &[
        req(FROM_ACCOUNT_INDEX, FieldType::AccountIndex),
        req("pair_index", FieldType::PairIndex),
        req("asset_a_id", FieldType::AssetId),
        req("asset_a_amount", FieldType::Amount),
        req("asset_b_id", FieldType::AssetId),
        req("asset_b_min_amount", FieldType::Amount),
        ledger("asset_b_amount_delta", FieldType::Amount),
        req(GAS_ACCOUNT_INDEX, FieldType::AccountIndex),
        req(GAS_FEE_ASSET_ID, FieldType::AssetId),
        req(GAS_FEE_ASSET_AMOUNT, FieldType::Fee),
        req(EXPIRED_AT, FieldType::ExpiredAt),
        req(NONCE, FieldType::Nonce),
    ],
    hashed: &[
        FROM_ACCOUNT_INDEX,
        "pair_index",
        "asset_a_amount",
        "asset_b_min_amount",
        GAS_ACCOUNT_INDEX,
        GAS_FEE_ASSET_ID,
        GAS_FEE_ASSET_AMOUNT,
        EXPIRED_AT,
        NONCE,
    ],
    checked: &[
        FROM_ACCOUNT_INDEX,
        "pair_index",
        "asset_a_amount",
        "asset_b_min_amount",
        GAS_ACCOUNT_INDEX,
        GAS_FEE_ASSET_ID,
        GAS_FEE_ASSET_AMOUNT,
        NONCE,
    ],
};

pub static ADD_LIQUIDITY: TxSchema = TxSchema {
    tx_type: TxType::AddLiquidity,
    fields: &[
        req(FROM_ACCOUNT_INDEX, FieldType::AccountIndex),
        req("pair_index", FieldType::PairIndex),
        req("asset_a_id", FieldType::AssetId),
        req("asset_a_amount", FieldType::Amount),
        req("asset_b_id", FieldType::AssetId),
        req("asset_b_amount", FieldType::Amount),
        req("lp_amount", FieldType::Amount),
        ledger("k_last", FieldType::Amount),
        ledger("treasury_amount", FieldType::Amount),
        req(GAS_ACCOUNT_INDEX, FieldType::AccountIndex),
        req(GAS_FEE_ASSET_ID, FieldType::AssetId),
        req(GAS_FEE_ASSET_AMOUNT, FieldType::Fee),
        req(EXPIRED_AT, FieldType::ExpiredAt),
        req(NONCE, FieldType::Nonce),
    ],
    hashed: &[
        FROM_ACCOUNT_INDEX,
        "pair_index",
        "asset_a_amount",
        "asset_b_amount",
        GAS_ACCOUNT_INDEX,
        GAS_FEE_ASSET_ID,
        GAS_FEE_ASSET_AMOUNT,
        EXPIRED_AT,
        NONCE,
    ],
    checked: &[
        FROM_ACCOUNT_INDEX,
        "pair_index",
        "asset_a_amount",
        "asset_b_amount",
        "lp_amount",
        GAS_ACCOUNT_INDEX,
        GAS_FEE_ASSET_ID,
        GAS_FEE_ASSET_AMOUNT,
        NONCE,
    ],
};

pub static REMOVE_LIQUIDITY: TxSchema = TxSchema {
    tx_type: TxType::RemoveLiquidity,
    fields: &[
        req(FROM_ACCOUNT_INDEX, FieldType::AccountIndex),
        req("pair_index", FieldType::PairIndex),
        req("asset_a_id", FieldType::AssetId),
        req("asset_a_min_amount", FieldType::Amount),
        req("asset_b_id", FieldType::AssetId),
        req("asset_b_min_amount", FieldType::Amount),
        req("lp_amount", FieldType::Amount),
        req("asset_a_amount_delta", FieldType::Amount),
        req("asset_b_amount_delta", FieldType::Amount),
        ledger("k_last", FieldType::Amount),
        ledger("treasury_amount", FieldType::Amount),
        req(GAS_ACCOUNT_INDEX, FieldType::AccountIndex),
        req(GAS_FEE_ASSET_ID, FieldType::AssetId),
        req(GAS_FEE_ASSET_AMOUNT, FieldType::Fee),
        req(EXPIRED_AT, FieldType::ExpiredAt),
        req(NONCE, FieldType::Nonce),
    ],
    hashed: &[
        FROM_ACCOUNT_INDEX,
        "pair_index",
        "asset_a_min_amount",
        "asset_b_min_amount",
        "lp_amount",
        GAS_ACCOUNT_INDEX,
        GAS_FEE_ASSET_ID,
        GAS_FEE_ASSET_AMOUNT,
        EXPIRED_AT,
        NONCE,
    ],
    checked: &[
        FROM_ACCOUNT_INDEX,
        "pair_index",
        "asset_a_min_amount",
        "asset_b_min_amount",
        "lp_amount",
        GAS_ACCOUNT_INDEX,
        GAS_FEE_ASSET_ID,
        GAS_FEE_ASSET_AMOUNT,
        NONCE,
    ],
};

pub static MINT_NFT: TxSchema = TxSchema {
    tx_type: TxType::MintNft,
    fields: &[
        req(FROM_ACCOUNT_INDEX, FieldType::AccountIndex),
        req("to_account_index", FieldType::AccountIndex),
        ledger("nft_index", FieldType::NftIndex),
        req("nft_content_hash", FieldType::ContentHash),
        req("creator_treasury_rate", FieldType::TreasuryRate),
        req("nft_collection_id", FieldType::CollectionId),
        req(GAS_ACCOUNT_INDEX, FieldType::AccountIndex),
        req(GAS_FEE_ASSET_ID, FieldType::AssetId),
        req(GAS_FEE_ASSET_AMOUNT, FieldType::Fee),
        req(EXPIRED_AT, FieldType::ExpiredAt),
        req(NONCE, FieldType::Nonce),
    ],
    hashed: &[
        FROM_ACCOUNT_INDEX,
        "to_account_index",
        "nft_content_hash",
        "creator_treasury_rate",
        "nft_collection_id",
        GAS_ACCOUNT_INDEX,
        GAS_FEE_ASSET_ID,
        GAS_FEE_ASSET_AMOUNT,
        EXPIRED_AT,
        NONCE,
    ],
    checked: &[
        FROM_ACCOUNT_INDEX,
        "to_account_index",
        "nft_content_hash",
        "creator_treasury_rate",
        "nft_collection_id",
        GAS_ACCOUNT_INDEX,
        GAS_FEE_ASSET_ID,
        GAS_FEE_ASSET_AMOUNT,
        NONCE,
    ],
};

pub static TRANSFER_NFT: TxSchema = TxSchema {
    tx_type: TxType::TransferNft,
    fields: &[
        req(FROM_ACCOUNT_INDEX, FieldType::AccountIndex),
        req("to_account_index", FieldType::AccountIndex),
        req("nft_index", FieldType::NftIndex),
        req(GAS_ACCOUNT_INDEX, FieldType::AccountIndex),
        req(GAS_FEE_ASSET_ID, FieldType::AssetId),
        req(GAS_FEE_ASSET_AMOUNT, FieldType::Fee),
        req(EXPIRED_AT, FieldType::ExpiredAt),
        req(NONCE, FieldType::Nonce),
    ],
    hashed: &[
        FROM_ACCOUNT_INDEX,
        "to_account_index",
        "nft_index",
        GAS_ACCOUNT_INDEX,
        GAS_FEE_ASSET_ID,
        GAS_FEE_ASSET_AMOUNT,
        EXPIRED_AT,
        NONCE,
    ],
    checked: &[
        FROM_ACCOUNT_INDEX,
        "to_account_index",
        "nft_index",
        GAS_ACCOUNT_INDEX,
        GAS_FEE_ASSET_ID,
        GAS_FEE_ASSET_AMOUNT,
        NONCE,
    ],
};

/// The registry: schema of a kind.
pub fn schema_for(tx_type: TxType) -> &'static TxSchema {
    match tx_type {
        TxType::Transfer => &TRANSFER,
        TxType::Swap => &SWAP,
        TxType::AddLiquidity => &ADD_LIQUIDITY,
        TxType::RemoveLiquidity => &REMOVE_LIQUIDITY,
        TxType::MintNft => &MINT_NFT,
        TxType::TransferNft => &TRANSFER_NFT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const COMMON: [&str; 6] = [
        FROM_ACCOUNT_INDEX,
        GAS_ACCOUNT_INDEX,
        GAS_FEE_ASSET_ID,
        GAS_FEE_ASSET_AMOUNT,
        EXPIRED_AT,
        NONCE,
    ];

    #[test]
    fn registry_is_keyed_by_type() {
        for t in TxType::ALL {
            assert_eq!(schema_for(t).tx_type, t);
        }
    }

    #[test]
    fn field_names_are_unique() {
        for t in TxType::ALL {
            let schema = schema_for(t);
            let names: HashSet<_> = schema.fields.iter().map(|f| f.name).collect();
            assert_eq!(names.len(), schema.fields.len(), "{}", t);
        }
    }

    #[test]
    fn every_kind_carries_common_fields() {
        for t in TxType::ALL {
            for name in COMMON {
                let def = schema_for(t).field(name).unwrap();
                assert_eq!(def.source, Source::Request, "{}.{}", t, name);
            }
        }
    }

    #[test]
    fn hashed_and_checked_fields_are_request_fields() {
        for t in TxType::ALL {
            let schema = schema_for(t);
            for name in schema.hashed.iter().chain(schema.checked) {
                let def = schema
                    .field(name)
                    .unwrap_or_else(|| panic!("{} lists unknown field {}", t, name));
                assert_eq!(def.source, Source::Request, "{}.{}", t, name);
            }
        }
    }

    #[test]
    fn expired_at_is_hashed_but_never_checked() {
        for t in TxType::ALL {
            let schema = schema_for(t);
            assert!(schema.hashed.contains(&EXPIRED_AT));
            assert!(!schema.checked.contains(&EXPIRED_AT));
            assert_eq!(schema.hashed.last(), Some(&NONCE));
            assert_eq!(schema.checked.last(), Some(&NONCE));
        }
    }

    #[test]
    fn remove_liquidity_preimage_order() {
        assert_eq!(
            REMOVE_LIQUIDITY.hashed,
            &[
                "from_account_index",
                "pair_index",
                "asset_a_min_amount",
                "asset_b_min_amount",
                "lp_amount",
                "gas_account_index",
                "gas_fee_asset_id",
                "gas_fee_asset_amount",
                "expired_at",
                "nonce",
            ]
        );
    }

    #[test]
    fn add_liquidity_checks_lp_amount_without_hashing_it() {
        assert!(ADD_LIQUIDITY.checked.contains(&"lp_amount"));
        assert!(!ADD_LIQUIDITY.hashed.contains(&"lp_amount"));
    }

    #[test]
    fn index_of_matches_declaration_order() {
        assert_eq!(REMOVE_LIQUIDITY.index_of(FROM_ACCOUNT_INDEX), Some(0));
        assert_eq!(REMOVE_LIQUIDITY.index_of("k_last"), Some(9));
        assert_eq!(REMOVE_LIQUIDITY.index_of("missing"), None);
        assert_eq!(MINT_NFT.request_fields().count(), MINT_NFT.fields.len() - 1);
    }
}
