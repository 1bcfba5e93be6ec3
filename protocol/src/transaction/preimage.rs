//! Canonical hash preimage of a transaction.
//!
//! Each field becomes one 32-byte big-endian word, which the hasher absorbs
//! as one field element:
//!
//! | Field kind        | Word                                   |
//! |-------------------|----------------------------------------|
//! | identifier / time | the integer, big-endian                |
//! | amount / fee      | the packed fixed-point word            |
//! | content hash      | the raw bytes, left-padded with zeros  |
//! | chain id          | appended last when the deployment sets one |
//!
//! The words carry no kind tag. [`PreimageBuilder::for_kind`] instead tags
//! the hasher domain with the kind's code, and the hasher frames the input
//! with its length.
//!
//! The layout is byte-exact with what the circuit rebuilds, so any change
//! here is a hard fork.

use num_bigint::BigUint;

use super::packing::{AmountCodec, PrecisionClass};
use crate::config::PREIMAGE_WORD_SIZE;
use crate::crypto::hash::{MessageHash, MessageHasher};
use crate::error::{CodecError, RangeViolation};

/// Accumulates preimage words in order.
#[derive(Debug, Clone)]
pub struct PreimageBuilder {
    codec: AmountCodec,
    domain: u64,
    buf: Vec<u8>,
}

impl PreimageBuilder {
    /// Builder in the default hasher domain.
    pub fn new(codec: AmountCodec) -> Self {
        Self::for_kind(codec, 0)
    }

    /// Builder whose digest is computed in the domain of a transaction kind.
    pub fn for_kind(codec: AmountCodec, kind_code: u8) -> Self {
        Self {
            codec,
            domain: u64::from(kind_code),
            buf: Vec::with_capacity(PREIMAGE_WORD_SIZE * 12),
        }
    }

    /// Writes a non-negative integer word.
    pub fn write_int(&mut self, field: &str, value: i64) -> Result<&mut Self, CodecError> {
        let unsigned = u64::try_from(value)
            .map_err(|_| CodecError::range(field, RangeViolation::Negative(value)))?;
        self.push_u64(unsigned);
        Ok(self)
    }

    /// Packs an amount with its precision class and writes the packed word.
    pub fn write_amount(
        &mut self,
        field: &str,
        amount: &BigUint,
        class: PrecisionClass,
    ) -> Result<&mut Self, CodecError> {
        let packed = self.codec.pack_field(field, amount, class)?;
        self.push_u64(packed);
        Ok(self)
    }

    /// Writes at most one word of raw bytes, left-padded.
    pub fn write_bytes(&mut self, field: &str, bytes: &[u8]) -> Result<&mut Self, CodecError> {
        if bytes.len() > PREIMAGE_WORD_SIZE {
            return Err(CodecError::range(
                field,
                RangeViolation::AboveMax(format!("{} bytes", PREIMAGE_WORD_SIZE)),
            ));
        }
        self.buf
            .extend(std::iter::repeat(0u8).take(PREIMAGE_WORD_SIZE - bytes.len()));
        self.buf.extend_from_slice(bytes);
        Ok(self)
    }

    /// Appends the chain id when one is configured.
    pub fn write_chain_id(&mut self, chain_id: Option<i64>) -> Result<&mut Self, CodecError> {
        if let Some(id) = chain_id {
            self.write_int("chain_id", id)?;
        }
        Ok(self)
    }

    /// Number of words written so far.
    pub fn word_count(&self) -> usize {
        self.buf.len() / PREIMAGE_WORD_SIZE
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Hashes the preimage with a fresh hasher instance.
    pub fn finish<H: MessageHasher>(self) -> Result<MessageHash, CodecError> {
        let mut hasher = H::with_domain(self.domain);
        hasher.update(&self.buf);
        hasher.finalize()
    }

    fn push_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&[0u8; PREIMAGE_WORD_SIZE - 8]);
        self.buf.extend_from_slice(&value.to_be_bytes());
    }
}
