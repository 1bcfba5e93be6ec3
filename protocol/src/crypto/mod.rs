//! # Cryptographic Primitives
//!
//! Everything here works over BN254 so the prover can redo it in circuit:
//!
//! - **Poseidon** over the BN254 scalar field for transaction digests.
//! - **EdDSA on Baby Jubjub** for signatures; the curve's base field is the
//!   same BN254 scalar field.
//! - **SHA-512** only off-circuit, for key expansion and nonce derivation.
//!
//! Nothing is implemented from scratch: curve and field arithmetic come from
//! arkworks, the sponge from `ark-crypto-primitives`.

pub mod hash;
pub mod keys;
pub mod signatures;

pub use hash::{MessageHash, MessageHasher, PoseidonHasher};
pub use keys::{KeyError, PrivateKey, PublicKey, Signature};
pub use signatures::{batch_verify, parse_public_key, sign, verify};
