//! Transaction signing.
//!
//! Signing is its own step so a transaction can be hashed and inspected
//! without key material. The signed message is
//! [`Transaction::compute_hash`], which never covers the signature, so
//! re-signing an already signed transaction yields the same signature.

use super::builder::Transaction;
use crate::config::ProtocolConfig;
use crate::crypto::hash::MessageHasher;
use crate::crypto::keys::PrivateKey;
use crate::crypto::signatures::sign;
use crate::error::CodecError;

/// Signs a transaction and returns it with the signature attached.
///
/// 1. Hash the packed field values (plus chain id) with a fresh `H`.
/// 2. Produce a deterministic EdDSA signature over that digest.
/// 3. Replace whatever signature the transaction carried.
pub fn sign_transaction<H: MessageHasher>(
    tx: Transaction,
    key: &PrivateKey,
    config: &ProtocolConfig,
) -> Result<Transaction, CodecError> {
    let hash = tx.compute_hash::<H>(config)?;
    let signature = sign::<H>(key, &hash)?;
    Ok(Transaction { signature, ..tx })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
