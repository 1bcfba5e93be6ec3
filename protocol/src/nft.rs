//! NFT records as the NFT store keeps them.
//!
//! The store is a sparse tree indexed by NFT index; slots that were never
//! minted hold [`NftRecord::empty`], a placeholder whose content hash is a
//! single zero byte. A minted record is derived from the signed
//! [`TxType::MintNft`] transaction plus the index the ledger allocated.

use num_bigint::BigUint;
use num_traits::Zero;

use crate::crypto::hash::{MessageHash, MessageHasher};
use crate::error::CodecError;
use crate::transaction::packing::AmountCodec;
use crate::transaction::preimage::PreimageBuilder;
use crate::transaction::schema::FROM_ACCOUNT_INDEX;
use crate::transaction::{Transaction, TxType};

/// Bits in each half of the L1 token id as written into the leaf.
const TOKEN_ID_HALF_BITS: u64 = 128;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NftRecord {
    pub nft_index: i64,
    pub nft_content_hash: Vec<u8>,
    pub creator_account_index: i64,
    pub owner_account_index: i64,
    pub nft_l1_address: BigUint,
    pub nft_l1_token_id: BigUint,
    pub creator_treasury_rate: i64,
    pub collection_id: i64,
}

impl NftRecord {
    /// Placeholder for an unallocated slot.
    pub fn empty(nft_index: i64) -> Self {
        Self {
            nft_index,
            nft_content_hash: vec![0],
            creator_account_index: 0,
            owner_account_index: 0,
            nft_l1_address: BigUint::zero(),
            nft_l1_token_id: BigUint::zero(),
            creator_treasury_rate: 0,
            collection_id: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::empty(self.nft_index)
    }

    /// Record created by a mint. The NFT index comes from the ledger, since
    /// the minter does not choose it.
    pub fn from_mint(tx: &Transaction, nft_index: i64) -> Result<Self, CodecError> {
        if tx.tx_type() != TxType::MintNft {
            return Err(CodecError::parse(
                "tx_type",
                format!("expected {}, got {}", TxType::MintNft, tx.tx_type()),
            ));
        }
        let int = |name: &str| {
            tx.int(name)
                .ok_or_else(|| CodecError::parse(name, "missing from mint transaction"))
        };
        let content_hash = tx
            .bytes("nft_content_hash")
            .ok_or_else(|| CodecError::parse("nft_content_hash", "missing from mint transaction"))?;

        Ok(Self {
            nft_index,
            nft_content_hash: content_hash.to_vec(),
            creator_account_index: int(FROM_ACCOUNT_INDEX)?,
            owner_account_index: int("to_account_index")?,
            nft_l1_address: BigUint::zero(),
            nft_l1_token_id: BigUint::zero(),
            creator_treasury_rate: int("creator_treasury_rate")?,
            collection_id: int("nft_collection_id")?,
        })
    }

    /// Leaf digest: creator, owner, content hash, L1 address, token id
    /// (high then low 128 bits), treasury rate, collection. The index is the
    /// leaf's position and is not hashed.
    pub fn leaf_hash<H: MessageHasher>(&self) -> Result<MessageHash, CodecError> {
        let mask = (BigUint::from(1u8) << TOKEN_ID_HALF_BITS) - 1u8;
        let token_hi = &self.nft_l1_token_id >> TOKEN_ID_HALF_BITS;
        let token_lo = &self.nft_l1_token_id & &mask;
        if token_hi > mask {
            return Err(CodecError::parse(
                "nft_l1_token_id",
                "wider than 256 bits",
            ));
        }

        let mut preimage = PreimageBuilder::new(AmountCodec::default());
        preimage
            .write_int("creator_account_index", self.creator_account_index)?
            .write_int("owner_account_index", self.owner_account_index)?
            .write_bytes("nft_content_hash", &self.nft_content_hash)?
            .write_bytes("nft_l1_address", &self.nft_l1_address.to_bytes_be())?
            .write_bytes("nft_l1_token_id", &token_hi.to_bytes_be())?
            .write_bytes("nft_l1_token_id", &token_lo.to_bytes_be())?
            .write_int("creator_treasury_rate", self.creator_treasury_rate)?
            .write_int("collection_id", self.collection_id)?;
        preimage.finish::<H>()
    }
}
