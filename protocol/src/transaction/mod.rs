//! # Transaction Module
//!
//! Construction, hashing, signing and validation of rollup transactions.
//! Every kind (transfer, swap, liquidity, NFT) runs through the same
//! generic engine; what differs between kinds is a static schema.
//!
//! ## Architecture
//!
//! ```text
//! types.rs        — TxType, field types and values, boundary parsers
//! packing.rs      — AmountCodec: fixed-point packing of amounts and fees
//! schema.rs       — per-kind field lists, preimage order, check order
//! preimage.rs     — 32-byte-word preimage builder
//! builder.rs      — Transaction, TxEngine (construct, decode_signed)
//! signing.rs      — hash-then-sign
//! verification.rs — range validation and signature checks
//! ```
//!
//! ## Transaction Lifecycle
//!
//! 1. **Construct** — [`TxEngine::construct`] decodes a request segment,
//!    cleans every amount, hashes and signs.
//! 2. **Ship** — [`Transaction::to_json`] produces the signed record.
//! 3. **Re-admit** — [`TxEngine::decode_signed`] reads a record back.
//! 4. **Verify** — [`verify_transaction`] validates bounds, then the
//!    signature.
//! 5. **Execute** — the ledger fills its own fields through
//!    [`Transaction::with_ledger_amount`] without invalidating the signature.
//!
//! ## Design Decisions
//!
//! - Amounts are exact big integers from the moment they leave the request
//!   segment; decimal strings exist only on the wire.
//! - The stored amount is the cleaned one, so what the validator checks is
//!   exactly what the circuit proves.
//! - The chain id is deployment configuration, not a constant.

pub mod builder;
pub mod packing;
pub mod preimage;
pub mod schema;
pub mod signing;
pub mod types;
pub mod verification;

pub use builder::{Transaction, TxEngine};
pub use packing::{AmountCodec, PackingParams, PrecisionClass};
pub use preimage::PreimageBuilder;
pub use schema::{schema_for, FieldDef, Source, TxSchema};
pub use signing::sign_transaction;
pub use types::{FieldType, FieldValue, TxType};
pub use verification::verify_transaction;
