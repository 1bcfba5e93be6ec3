//! Walk-through of a transaction's life in the Legend codec.
//!
//! Generates a key, signs a liquidity removal, ships it as a JSON record,
//! decodes and checks it on the other side, then shows what a tampered fee
//! and a foreign network do to the signature.
//!
//! Run with:
//!   cargo run --example lifecycle --release

use std::time::Instant;

use legend_protocol::config::{network_name, ProtocolConfig};
use legend_protocol::crypto::{PoseidonHasher, PrivateKey};
use legend_protocol::nft::NftRecord;
use legend_protocol::transaction::{verify_transaction, PrecisionClass, TxEngine, TxType};

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";

const SEGMENT: &str = r#"{
    "from_account_index": 0, "pair_index": 0,
    "asset_a_id": 1, "asset_a_min_amount": "100000000000000000123",
    "asset_b_id": 2, "asset_b_min_amount": "100",
    "lp_amount": "1000", "asset_a_amount_delta": "0", "asset_b_amount_delta": "0",
    "gas_account_index": 1, "gas_fee_asset_id": 3, "gas_fee_asset_amount": "12345",
    "expired_at": 1654656781000, "nonce": 1
}"#;

fn step(n: u32, title: &str) {
    println!();
    println!("{BOLD}{CYAN}[{n}]{RESET} {BOLD}{title}{RESET}");
}

fn detail(label: &str, value: impl std::fmt::Display) {
    println!("    {DIM}{label:<18}{RESET} {value}");
}

fn outcome<T, E: std::fmt::Display>(result: Result<T, E>) {
    match result {
        Ok(_) => println!("    {GREEN}accepted{RESET}"),
        Err(e) => println!("    {RED}rejected{RESET} {DIM}({e}){RESET}"),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ProtocolConfig::mainnet();
    let engine = TxEngine::new(config.clone());

    step(1, "Key generation");
    let key = PrivateKey::generate();
    let public_key = key.public_key().to_hex();
    detail("network", network_name(config.chain_id));
    detail("public key", &public_key);

    step(2, "Construct and sign a liquidity removal");
    let started = Instant::now();
    let tx = engine.construct(TxType::RemoveLiquidity, &key, SEGMENT)?;
    detail("took", format!("{:?}", started.elapsed()));
    detail(
        "asset_a_min",
        format!("100000000000000000123 -> {}", tx.amount("asset_a_min_amount").ok_or("unset")?),
    );
    detail(
        "gas fee",
        format!("12345 -> {}", tx.amount("gas_fee_asset_amount").ok_or("unset")?),
    );
    detail("hash", tx.compute_hash::<PoseidonHasher>(&config)?);

    step(3, "Ship the signed record");
    let wire = tx.to_json().to_string();
    detail("record bytes", wire.len());

    step(4, "Decode, validate, verify");
    let received = engine.decode_signed(TxType::RemoveLiquidity, &wire)?;
    outcome(verify_transaction(&received, &config, &public_key));

    step(5, "Tamper with the packed fee");
    let codec = engine.codec();
    let fee = received.amount("gas_fee_asset_amount").ok_or("unset")?;
    let packed = codec.pack(fee, PrecisionClass::Fee)? ^ 0x01;
    let mut record = received.to_json();
    record["gas_fee_asset_amount"] = codec.unpack(packed, PrecisionClass::Fee).to_string().into();
    detail("new fee", &record["gas_fee_asset_amount"]);
    let tampered = engine.decode_signed(TxType::RemoveLiquidity, &record.to_string())?;
    outcome(tampered.verify_signature(&config, &public_key));

    step(6, "Replay on testnet");
    outcome(received.verify_signature(&ProtocolConfig::testnet(), &public_key));

    step(7, "Empty NFT slot");
    let empty = NftRecord::empty(0);
    detail("leaf hash", empty.leaf_hash::<PoseidonHasher>()?);
    detail("max amount", codec.max_representable(PrecisionClass::Amount));
    detail("max fee", codec.max_representable(PrecisionClass::Fee));

    println!();
    Ok(())
}
