//! # Key Management
//!
//! EdDSA keys on Baby Jubjub, the twisted Edwards curve whose base field is
//! the BN254 scalar field. Keeping signatures on a curve native to the
//! proving field lets the circuit check them without non-native arithmetic.
//!
//! ## Derivation
//!
//! A 32-byte seed is expanded with SHA-512. The low half, reduced modulo the
//! subgroup order, is the secret scalar; the high half is the nonce prefix
//! that makes signing deterministic. A seed whose scalar reduces to zero is
//! rejected.
//!
//! ## Signatures
//!
//! ```text
//! r = SHA-512(prefix || msg) mod l       R = r * G
//! h = H(R.x, R.y, A.x, A.y, msg) mod l   S = r + h * s
//! sig = compress(R) || le_bytes(S)
//! ```
//!
//! `H` is the proving-field hasher, so the challenge can be recomputed in
//! circuit. Key bytes are never logged and `Debug` redacts them.

use std::fmt;

use ark_ec::{AffineRepr, CurveGroup};
use ark_ed_on_bn254::{EdwardsAffine, Fr as SubgroupScalar};
use ark_ff::{PrimeField, Zero};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha512};
use thiserror::Error;

use super::hash::{field_to_bytes, MessageHash, MessageHasher};
use crate::error::CodecError;

/// Length of a compressed Baby Jubjub point.
pub const PUBLIC_KEY_LENGTH: usize = 32;

/// Length of an encoded signature: compressed `R` then `S`.
pub const SIGNATURE_LENGTH: usize = 64;

/// Length of a private key seed.
pub const SEED_LENGTH: usize = 32;

/// Errors that can occur during key operations.
///
/// Deliberately coarse; none of them carry key material.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("invalid secret key: expected {SEED_LENGTH} hex-encoded bytes")]
    InvalidSecretKey,

    #[error("seed derives a zero scalar")]
    DegenerateSeed,

    #[error("invalid public key: not a compressed subgroup point")]
    InvalidPublicKey,
}

// ---------------------------------------------------------------------------
// PrivateKey
// ---------------------------------------------------------------------------

/// A signing key. Never serialized implicitly; use [`PrivateKey::to_hex`]
/// when the seed really has to leave the process.
#[derive(Clone)]
pub struct PrivateKey {
    seed: [u8; SEED_LENGTH],
    scalar: SubgroupScalar,
    prefix: [u8; 32],
    public: PublicKey,
}

impl PrivateKey {
    /// Derives a key deterministically from a 32-byte seed.
    pub fn from_seed(seed: &[u8; SEED_LENGTH]) -> Result<Self, KeyError> {
        let expanded = Sha512::digest(seed);
        let scalar = SubgroupScalar::from_le_bytes_mod_order(&expanded[..32]);
        if scalar.is_zero() {
            return Err(KeyError::DegenerateSeed);
        }
        let mut prefix = [0u8; 32];
        prefix.copy_from_slice(&expanded[32..]);

        let point = (EdwardsAffine::generator() * scalar).into_affine();
        let public = PublicKey::from_point(point)?;

        Ok(Self {
            seed: *seed,
            scalar,
            prefix,
            public,
        })
    }

    /// Parses a hex seed, with or without a `0x` prefix.
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let digits = hex_str.trim().strip_prefix("0x").unwrap_or(hex_str.trim());
        let bytes = hex::decode(digits).map_err(|_| KeyError::InvalidSecretKey)?;
        let seed: [u8; SEED_LENGTH] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::InvalidSecretKey)?;
        Self::from_seed(&seed)
    }

    /// Fresh key from the OS RNG.
    pub fn generate() -> Self {
        loop {
            let mut seed = [0u8; SEED_LENGTH];
            OsRng.fill_bytes(&mut seed);
            // A zero scalar has probability ~2^-251; draw again if it happens.
            if let Ok(key) = Self::from_seed(&seed) {
                return key;
            }
        }
    }

    pub fn public_key(&self) -> PublicKey {
        self.public
    }

    /// Exports the seed. Handle with care.
    pub fn to_hex(&self) -> String {
        hex::encode(self.seed)
    }

    /// Deterministic EdDSA signature over a transaction digest.
    pub fn sign<H: MessageHasher>(&self, message: &MessageHash) -> Result<Signature, CodecError> {
        let nonce_digest = Sha512::new()
            .chain_update(self.prefix)
            .chain_update(message.as_bytes())
            .finalize();
        let r = SubgroupScalar::from_le_bytes_mod_order(&nonce_digest);
        let r_point = (EdwardsAffine::generator() * r).into_affine();

        let h = challenge::<H>(&r_point, &self.public.point, message)?;
        let s = r + h * self.scalar;

        let mut bytes = Vec::with_capacity(SIGNATURE_LENGTH);
        r_point
            .serialize_compressed(&mut bytes)
            .map_err(|e| CodecError::Signature(format!("cannot encode R: {}", e)))?;
        s.serialize_compressed(&mut bytes)
            .map_err(|e| CodecError::Signature(format!("cannot encode S: {}", e)))?;
        Ok(Signature { bytes })
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKey(pub={})", self.public.to_hex())
    }
}

impl PartialEq for PrivateKey {
    /// Compared through the public key; secret material is never compared.
    fn eq(&self, other: &Self) -> bool {
        self.public == other.public
    }
}

impl Eq for PrivateKey {}

// ---------------------------------------------------------------------------
// PublicKey
// ---------------------------------------------------------------------------

/// A verification key: a prime-order Baby Jubjub point other than the
/// identity.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKey {
    point: EdwardsAffine,
    bytes: [u8; PUBLIC_KEY_LENGTH],
}

impl PublicKey {
    fn from_point(point: EdwardsAffine) -> Result<Self, KeyError> {
        if AffineRepr::is_zero(&point) {
            return Err(KeyError::InvalidPublicKey);
        }
        let mut encoded = Vec::with_capacity(PUBLIC_KEY_LENGTH);
        point
            .serialize_compressed(&mut encoded)
            .map_err(|_| KeyError::InvalidPublicKey)?;
        let bytes = encoded
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::InvalidPublicKey)?;
        Ok(Self { point, bytes })
    }

    /// Decodes a compressed point, checking it is on the curve and in the
    /// prime-order subgroup.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() != PUBLIC_KEY_LENGTH {
            return Err(KeyError::InvalidPublicKey);
        }
        let point =
            EdwardsAffine::deserialize_compressed(bytes).map_err(|_| KeyError::InvalidPublicKey)?;
        Self::from_point(point)
    }

    /// Parses the hex form, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let digits = s.trim().strip_prefix("0x").unwrap_or(s.trim());
        let bytes = hex::decode(digits).map_err(|_| KeyError::InvalidPublicKey)?;
        Self::from_bytes(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.bytes
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Checks `S * G == R + h * A`.
    ///
    /// `Ok(false)` means a well-formed signature that does not verify.
    /// Encodings that cannot be decoded at all are `Err(Decode)`.
    pub fn verify<H: MessageHasher>(
        &self,
        signature: &[u8],
        message: &MessageHash,
    ) -> Result<bool, CodecError> {
        if signature.len() != SIGNATURE_LENGTH {
            return Err(CodecError::Decode(format!(
                "signature must be {} bytes, got {}",
                SIGNATURE_LENGTH,
                signature.len()
            )));
        }
        let (r_bytes, s_bytes) = signature.split_at(PUBLIC_KEY_LENGTH);
        let r_point = EdwardsAffine::deserialize_compressed(r_bytes)
            .map_err(|_| CodecError::Decode("signature R is not a subgroup point".to_string()))?;
        let s = SubgroupScalar::deserialize_compressed(s_bytes)
            .map_err(|_| CodecError::Decode("signature S is not a canonical scalar".to_string()))?;

        let h = challenge::<H>(&r_point, &self.point, message)?;
        let lhs = EdwardsAffine::generator() * s;
        let rhs = r_point.into_group() + self.point * h;
        Ok(lhs == rhs)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", &self.to_hex()[..16])
    }
}

// ---------------------------------------------------------------------------
// Signature
// ---------------------------------------------------------------------------

/// An encoded EdDSA signature.
///
/// Held as `Vec<u8>` so records decoded off the wire can carry whatever
/// length they arrived with; [`PublicKey::verify`] rejects anything that is
/// not [`SIGNATURE_LENGTH`] bytes.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Signature {
    bytes: Vec<u8>,
}

impl Signature {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    pub fn from_hex(s: &str) -> Result<Self, CodecError> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes =
            hex::decode(digits).map_err(|e| CodecError::Decode(format!("signature hex: {}", e)))?;
        Ok(Self { bytes })
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", self.to_hex())
    }
}

/// Fiat-Shamir challenge over the proving field, reduced into the subgroup
/// scalar field.
fn challenge<H: MessageHasher>(
    r_point: &EdwardsAffine,
    public: &EdwardsAffine,
    message: &MessageHash,
) -> Result<SubgroupScalar, CodecError> {
    let mut hasher = H::new();
    for coordinate in [r_point.x, r_point.y, public.x, public.y] {
        hasher.update(&field_to_bytes(&coordinate));
    }
    hasher.update(message.as_bytes());
    let digest = hasher.finalize()?;
    Ok(SubgroupScalar::from_be_bytes_mod_order(digest.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hash::PoseidonHasher;

    fn key(fill: u8) -> PrivateKey {
        PrivateKey::from_seed(&[fill; 32]).unwrap()
    }

    fn message(v: u8) -> MessageHash {
        let mut bytes = [0u8; 32];
        bytes[31] = v;
        MessageHash::from_bytes(bytes)
    }

    #[test]
    fn test_seed_derivation_is_deterministic() {
        assert_eq!(key(7).public_key(), key(7).public_key());
        assert_ne!(key(7).public_key(), key(8).public_key());
    }

    #[test]
    fn test_sign_and_verify() {
        let sk = key(1);
        let msg = message(42);
        let sig = sk.sign::<PoseidonHasher>(&msg).unwrap();
        assert_eq!(sig.as_bytes().len(), SIGNATURE_LENGTH);
        assert!(sk.public_key().verify::<PoseidonHasher>(sig.as_bytes(), &msg).unwrap());
    }

    #[test]
    fn test_signatures_are_deterministic() {
        let sk = key(2);
        let a = sk.sign::<PoseidonHasher>(&message(1)).unwrap();
        let b = sk.sign::<PoseidonHasher>(&message(1)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_wrong_message_fails() {
        let sk = key(3);
        let sig = sk.sign::<PoseidonHasher>(&message(1)).unwrap();
        assert!(!sk
            .public_key()
            .verify::<PoseidonHasher>(sig.as_bytes(), &message(2))
            .unwrap());
    }

    #[test]
    fn test_wrong_key_fails() {
        let sig = key(4).sign::<PoseidonHasher>(&message(1)).unwrap();
        assert!(!key(5)
            .public_key()
            .verify::<PoseidonHasher>(sig.as_bytes(), &message(1))
            .unwrap());
    }

    #[test]
    fn test_short_signature_is_decode_error() {
        let err = key(6)
            .public_key()
            .verify::<PoseidonHasher>(&[0u8; 63], &message(1))
            .unwrap_err();
        assert!(matches!(err, CodecError::Decode(_)));
    }

    #[test]
    fn test_non_canonical_s_is_decode_error() {
        let sk = key(6);
        let mut sig = sk.sign::<PoseidonHasher>(&message(1)).unwrap().as_bytes().to_vec();
        for b in &mut sig[32..] {
            *b = 0xFF;
        }
        let err = sk
            .public_key()
            .verify::<PoseidonHasher>(&sig, &message(1))
            .unwrap_err();
        assert!(matches!(err, CodecError::Decode(_)));
    }

    #[test]
    fn test_public_key_hex_roundtrip() {
        let pk = key(9).public_key();
        assert_eq!(PublicKey::from_hex(&pk.to_hex()).unwrap(), pk);
        assert_eq!(PublicKey::from_hex(&format!("0x{}", pk.to_hex())).unwrap(), pk);
    }

    #[test]
    fn test_invalid_public_keys_rejected() {
        assert_eq!(PublicKey::from_hex("zz"), Err(KeyError::InvalidPublicKey));
        assert_eq!(PublicKey::from_bytes(&[1u8; 31]), Err(KeyError::InvalidPublicKey));
    }

    #[test]
    fn test_identity_public_key_rejected() {
        let mut encoded = Vec::new();
        <EdwardsAffine as AffineRepr>::zero()
            .serialize_compressed(&mut encoded).unwrap();
        assert_eq!(PublicKey::from_bytes(&encoded), Err(KeyError::InvalidPublicKey));
    }

    #[test]
    fn test_private_key_hex_roundtrip() {
        let sk = PrivateKey::generate();
        let restored = PrivateKey::from_hex(&sk.to_hex()).unwrap();
        assert_eq!(restored, sk);
        assert!(PrivateKey::from_hex("abcd").is_err());
    }

    #[test]
    fn test_debug_redacts_seed() {
        let sk = key(0x11);
        let debug = format!("{:?}", sk);
        assert!(!debug.contains(&sk.to_hex()));
        assert!(debug.contains(&sk.public_key().to_hex()));
    }
}
