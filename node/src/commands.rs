//! Subcommand handlers. Each returns the JSON report `main` prints.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use num_bigint::BigUint;
use serde_json::{json, Value};

use legend_protocol::config::{network_name, ProtocolConfig};
use legend_protocol::crypto::{PoseidonHasher, PrivateKey};
use legend_protocol::transaction::types::parse_decimal;
use legend_protocol::transaction::{verify_transaction, PrecisionClass, TxEngine};

use crate::cli::{GlobalArgs, Network, PackArgs, RecordArgs, SignArgs, VerifyArgs};

/// Deployment parameters from `--config`, else from `--network`.
pub fn load_config(global: &GlobalArgs) -> Result<ProtocolConfig> {
    if let Some(path) = &global.config {
        return ProtocolConfig::from_json_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()));
    }
    Ok(match global.network {
        Network::Mainnet => ProtocolConfig::mainnet(),
        Network::Testnet => ProtocolConfig::testnet(),
        Network::Legacy => ProtocolConfig::legacy(),
    })
}

/// Reads the whole input file, or stdin for `None` and `-`.
pub fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(p) if p != Path::new("-") => std::fs::read_to_string(p)
            .with_context(|| format!("failed to read {}", p.display())),
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            Ok(buf)
        }
    }
}

pub fn sign(engine: &TxEngine, args: &SignArgs, segment: &str) -> Result<Value> {
    let key = PrivateKey::from_hex(&args.key).context("invalid signing key")?;
    let tx = engine
        .construct(args.tx_type, &key, segment)
        .with_context(|| format!("failed to construct {}", args.tx_type))?;

    tracing::info!(
        tx_type = %tx.tx_type(),
        from = tx.from_account_index(),
        nonce = tx.nonce(),
        network = %network_name(engine.config().chain_id),
        "transaction signed"
    );
    Ok(tx.to_json())
}

pub fn verify(engine: &TxEngine, args: &VerifyArgs, record: &str) -> Result<Value> {
    let tx = engine
        .decode_signed(args.record.tx_type, record)
        .context("malformed signed record")?;
    verify_transaction(&tx, engine.config(), &args.public_key)
        .with_context(|| format!("{} rejected", tx.tx_type()))?;
    let hash = tx.compute_hash::<PoseidonHasher>(engine.config())?;

    tracing::info!(tx_type = %tx.tx_type(), hash = %hash, "signature verified");
    Ok(json!({
        "tx_type": tx.tx_type().name(),
        "valid": true,
        "hash": hash.to_hex(),
    }))
}

pub fn validate(engine: &TxEngine, args: &RecordArgs, record: &str) -> Result<Value> {
    let tx = engine
        .decode_signed(args.tx_type, record)
        .context("malformed signed record")?;
    tx.validate(engine.config())
        .with_context(|| format!("{} rejected", tx.tx_type()))?;
    Ok(json!({
        "tx_type": tx.tx_type().name(),
        "valid": true,
    }))
}

pub fn keygen() -> Value {
    let key = PrivateKey::generate();
    tracing::info!(public_key = %key.public_key(), "generated signing key");
    json!({
        "private_key": key.to_hex(),
        "public_key": key.public_key().to_hex(),
    })
}

pub fn pack(engine: &TxEngine, args: &PackArgs) -> Result<Value> {
    let amount: BigUint = parse_decimal(&args.amount)
        .map_err(|reason| anyhow::anyhow!("invalid amount {:?}: {}", args.amount, reason))?;
    let class = PrecisionClass::from(args.class);
    let codec = engine.codec();
    let packed = codec.pack(&amount, class)?;
    let cleaned = codec.unpack(packed, class);

    if cleaned != amount {
        tracing::warn!(%amount, %cleaned, %class, "amount rounded down to fit the packing budget");
    }
    Ok(json!({
        "class": class.to_string(),
        "amount": amount.to_str_radix(10),
        "cleaned": cleaned.to_str_radix(10),
        "packed": packed,
    }))
}
