//! # Proving-Field Hashing
//!
//! Transaction digests are computed with Poseidon over the BN254 scalar
//! field, the same field the circuit works in, so the prover can recompute
//! the digest cheaply inside the proof.
//!
//! ## Scoped instances
//!
//! A [`MessageHasher`] is created for exactly one digest and consumed by
//! [`MessageHasher::finalize`]. There is no reset: the type system rules
//! out a half-written hasher leaking into the next computation, and two
//! threads can never share one.
//!
//! ## Input framing
//!
//! Before any data the sponge absorbs two header elements: the hasher's
//! domain tag and the input length in bytes. Inputs of different lengths
//! or different domains therefore never share a sponge state, so
//! `H(w)` and `H(w || 0)` differ and a digest of one transaction kind cannot
//! stand in for another kind whose words happen to line up.
//!
//! The input bytes are then cut into 32-byte big-endian blocks and each
//! block is absorbed as one field element. A block whose integer value is
//! not below the field modulus is rejected rather than silently reduced. A
//! trailing short block is left-padded with zeros.
//!
//! ## Parameters
//!
//! Width 3 (rate 2, capacity 1), 8 full rounds, 57 partial rounds, x^5
//! S-box. The MDS matrix is the Cauchy matrix `1 / (i + j + 3)`; round
//! constants are SHA-256 expansions of a fixed domain tag, reduced into the
//! field.

use std::fmt;
use std::sync::OnceLock;

use ark_bn254::Fr;
use ark_crypto_primitives::sponge::poseidon::{PoseidonConfig, PoseidonSponge};
use ark_crypto_primitives::sponge::CryptographicSponge;
use ark_ff::{BigInteger, Field, PrimeField};
use sha2::{Digest, Sha256};

use crate::config::PREIMAGE_WORD_SIZE;
use crate::error::CodecError;

/// Number of full rounds (beginning + end)
const FULL_ROUNDS: usize = 8;

/// Number of partial rounds
const PARTIAL_ROUNDS: usize = 57;

/// S-box exponent
const ALPHA: u64 = 5;

const RATE: usize = 2;
const CAPACITY: usize = 1;

/// Domain tag the round constants are expanded from.
const ROUND_CONSTANT_DOMAIN: &[u8] = b"legend-poseidon-bn254-ark";

// ---------------------------------------------------------------------------
// MessageHash
// ---------------------------------------------------------------------------

/// A 32-byte transaction digest: one canonical BN254 scalar, big-endian.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageHash([u8; 32]);

impl MessageHash {
    pub fn from_field(element: Fr) -> Self {
        Self(field_to_bytes(&element))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_field(&self) -> Fr {
        Fr::from_be_bytes_mod_order(&self.0)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Raw digest bytes. Not necessarily canonical; tampering tests use this.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for MessageHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MessageHash({})", self.to_hex())
    }
}

impl fmt::Display for MessageHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

// ---------------------------------------------------------------------------
// MessageHasher
// ---------------------------------------------------------------------------

/// A single-use hash computation over the proving field.
pub trait MessageHasher: Sized {
    /// Fresh instance in the given domain. Digests from different domains
    /// are unrelated even over identical bytes.
    fn with_domain(domain: u64) -> Self;

    /// Fresh instance in the default domain.
    fn new() -> Self {
        Self::with_domain(0)
    }

    /// Buffers more input.
    fn update(&mut self, data: &[u8]);

    /// Consumes the instance and produces the digest.
    fn finalize(self) -> Result<MessageHash, CodecError>;

    /// One-shot convenience.
    fn digest(data: &[u8]) -> Result<MessageHash, CodecError> {
        let mut hasher = Self::new();
        hasher.update(data);
        hasher.finalize()
    }
}

/// The protocol hasher: Poseidon sponge over BN254 `Fr`.
#[derive(Debug, Clone, Default)]
pub struct PoseidonHasher {
    domain: u64,
    buf: Vec<u8>,
}

impl MessageHasher for PoseidonHasher {
    fn with_domain(domain: u64) -> Self {
        Self {
            domain,
            buf: Vec::new(),
        }
    }

    fn update(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    fn finalize(self) -> Result<MessageHash, CodecError> {
        let mut sponge = PoseidonSponge::<Fr>::new(poseidon_config());
        sponge.absorb(&Fr::from(self.domain));
        sponge.absorb(&Fr::from(self.buf.len() as u64));
        for (index, block) in self.buf.chunks(PREIMAGE_WORD_SIZE).enumerate() {
            let element = block_to_field(block).ok_or_else(|| {
                CodecError::Hash(format!(
                    "block {} is not a canonical field element",
                    index
                ))
            })?;
            sponge.absorb(&element);
        }
        let squeezed: Vec<Fr> = sponge.squeeze_field_elements(1);
        let element = squeezed
            .into_iter()
            .next()
            .ok_or_else(|| CodecError::Hash("sponge produced no output".to_string()))?;
        Ok(MessageHash::from_field(element))
    }
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

/// Big-endian 32-byte encoding of a field element.
pub fn field_to_bytes(element: &Fr) -> [u8; 32] {
    let bytes = element.into_bigint().to_bytes_be();
    let mut out = [0u8; 32];
    out[32 - bytes.len()..].copy_from_slice(&bytes);
    out
}

/// Interprets up to 32 big-endian bytes as a field element, `None` when the
/// value is not below the modulus.
pub fn block_to_field(block: &[u8]) -> Option<Fr> {
    if block.len() > PREIMAGE_WORD_SIZE {
        return None;
    }
    let mut padded = [0u8; 32];
    padded[32 - block.len()..].copy_from_slice(block);
    let element = Fr::from_be_bytes_mod_order(&padded);
    (field_to_bytes(&element) == padded).then_some(element)
}

/// The Poseidon parameters, built once per process.
pub fn poseidon_config() -> &'static PoseidonConfig<Fr> {
    static CONFIG: OnceLock<PoseidonConfig<Fr>> = OnceLock::new();
    CONFIG.get_or_init(build_poseidon_config)
}

fn build_poseidon_config() -> PoseidonConfig<Fr> {
    let width = RATE + CAPACITY;

    // Cauchy matrix: every square submatrix is invertible, hence MDS.
    let mds = (0..width)
        .map(|i| {
            (0..width)
                .map(|j| Fr::ONE / Fr::from((i + j + width) as u64))
                .collect()
        })
        .collect();

    let mut ark = Vec::with_capacity(FULL_ROUNDS + PARTIAL_ROUNDS);
    for round in 0..FULL_ROUNDS + PARTIAL_ROUNDS {
        let constants = (0..width)
            .map(|lane| {
                let digest = Sha256::new()
                    .chain_update(ROUND_CONSTANT_DOMAIN)
                    .chain_update((round as u32).to_be_bytes())
                    .chain_update((lane as u32).to_be_bytes())
                    .finalize();
                Fr::from_be_bytes_mod_order(&digest)
            })
            .collect();
        ark.push(constants);
    }

    PoseidonConfig {
        full_rounds: FULL_ROUNDS,
        partial_rounds: PARTIAL_ROUNDS,
        alpha: ALPHA,
        ark,
        mds,
        rate: RATE,
        capacity: CAPACITY,
    }
}
