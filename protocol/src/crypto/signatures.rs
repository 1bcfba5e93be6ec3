//! # Digital Signatures
//!
//! The signing and verification entry points the transaction layer calls.
//! They wrap [`PrivateKey::sign`] and [`PublicKey::verify`] so that every
//! signature in the codebase passes through one place, and translate key
//! parsing failures into [`CodecError`].
//!
//! ## Strictness
//!
//! Verification rejects `R` points outside the prime-order subgroup and `S`
//! scalars that are not reduced. A signature that decodes but does not
//! satisfy the verification equation is `Ok(false)`, never an error.

use super::hash::{MessageHash, MessageHasher};
use super::keys::{PrivateKey, PublicKey, Signature};
use crate::error::CodecError;

/// Sign a transaction digest.
///
/// Deterministic: the same key and digest always give the same signature.
/// The only state touched is the challenge hasher, created fresh per call.
pub fn sign<H: MessageHasher>(
    key: &PrivateKey,
    message: &MessageHash,
) -> Result<Signature, CodecError> {
    key.sign::<H>(message)
}

/// Verify a signature against a public key and digest.
pub fn verify<H: MessageHasher>(
    public_key: &PublicKey,
    signature: &[u8],
    message: &MessageHash,
) -> Result<bool, CodecError> {
    public_key.verify::<H>(signature, message)
}

/// Parse a hex-encoded compressed public key (optional `0x` prefix).
pub fn parse_public_key(hex_str: &str) -> Result<PublicKey, CodecError> {
    PublicKey::from_hex(hex_str).map_err(|e| CodecError::Decode(e.to_string()))
}

/// Verify a batch of signatures.
///
/// Fails on the first item that does not verify and reports its position.
pub fn batch_verify<H: MessageHasher>(
    items: &[(PublicKey, MessageHash, Signature)],
) -> Result<(), CodecError> {
    for (index, (public_key, message, signature)) in items.iter().enumerate() {
        if !verify::<H>(public_key, signature.as_bytes(), message)? {
            return Err(CodecError::Signature(format!(
                "batch item {} does not verify",
                index
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hash::PoseidonHasher;

    fn digest(v: u64) -> MessageHash {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&v.to_be_bytes());
        MessageHash::from_bytes(bytes)
    }

    #[test]
    fn test_sign_and_verify() {
        let key = PrivateKey::generate();
        let msg = digest(1);
        let sig = sign::<PoseidonHasher>(&key, &msg).unwrap();
        assert!(verify::<PoseidonHasher>(&key.public_key(), sig.as_bytes(), &msg).unwrap());
    }

    #[test]
    fn test_parse_public_key() {
        let key = PrivateKey::generate();
        let parsed = parse_public_key(&key.public_key().to_hex()).unwrap();
        assert_eq!(parsed, key.public_key());
    }

    #[test]
    fn test_parse_public_key_rejects_garbage() {
        let all_ff = "ff".repeat(32);
        for bad in ["", "0x", "not hex", "00", all_ff.as_str()] {
            assert!(
                matches!(parse_public_key(bad), Err(CodecError::Decode(_))),
                "accepted {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_batch_verify_success() {
        let items: Vec<_> = (0..5)
            .map(|i| {
                let key = PrivateKey::generate();
                let msg = digest(i);
                let sig = sign::<PoseidonHasher>(&key, &msg).unwrap();
                (key.public_key(), msg, sig)
            })
            .collect();
        assert!(batch_verify::<PoseidonHasher>(&items).is_ok());
    }

    #[test]
    fn test_batch_verify_one_bad_apple() {
        let a = PrivateKey::generate();
        let b = PrivateKey::generate();
        let sig_a = sign::<PoseidonHasher>(&a, &digest(1)).unwrap();
        let sig_b = sign::<PoseidonHasher>(&b, &digest(2)).unwrap();
        let items = vec![
            (a.public_key(), digest(1), sig_a),
            (a.public_key(), digest(2), sig_b),
        ];
        let err = batch_verify::<PoseidonHasher>(&items).unwrap_err();
        assert_eq!(
            err,
            CodecError::Signature("batch item 1 does not verify".to_string())
        );
    }

    #[test]
    fn test_batch_verify_empty() {
        assert!(batch_verify::<PoseidonHasher>(&[]).is_ok());
    }
}
