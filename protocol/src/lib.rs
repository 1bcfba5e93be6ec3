// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Legend Protocol — Transaction Codec
//!
//! Client-side transaction handling for the Legend zk-rollup: everything
//! that happens between "the user filled in a form" and "a signed
//! transaction the prover will accept".
//!
//! The rollup proves its state transitions in a circuit over the BN254
//! scalar field, so everything a transaction commits to is shaped for that
//! field: amounts are packed into short fixed-point words, the digest is
//! Poseidon over BN254, and signatures are EdDSA on Baby Jubjub, whose base
//! field is BN254's scalar field.
//!
//! ## Architecture
//!
//! - **transaction** — the parse → pack → hash → sign pipeline, one generic
//!   engine over per-kind schemas, plus validation.
//! - **crypto** — Poseidon hashing, Baby Jubjub keys, signatures.
//! - **nft** — NFT store records and the empty-slot placeholder.
//! - **config** — protocol bounds, packing budgets, chain ids.
//! - **error** — the error taxonomy shared by every stage.
//!
//! ## Example
//!
//! ```rust,no_run
//! use legend_protocol::config::ProtocolConfig;
//! use legend_protocol::crypto::PrivateKey;
//! use legend_protocol::transaction::{TxEngine, TxType};
//!
//! let key = PrivateKey::generate();
//! let engine = TxEngine::new(ProtocolConfig::mainnet());
//! let segment = r#"{"from_account_index":0,"to_account_index":1,"nft_index":5,
//!     "gas_account_index":1,"gas_fee_asset_id":0,"gas_fee_asset_amount":"3",
//!     "expired_at":1654656781000,"nonce":1}"#;
//! let tx = engine.construct(TxType::TransferNft, &key, segment).unwrap();
//! tx.validate(engine.config()).unwrap();
//! tx.verify_signature(engine.config(), &key.public_key().to_hex()).unwrap();
//! ```

pub mod config;
pub mod crypto;
pub mod error;
pub mod nft;
pub mod transaction;

pub use error::{CodecError, RangeViolation};
