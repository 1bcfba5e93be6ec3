// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Legend Signer
//!
//! Entry point for the `legend-signer` binary: an offline tool around the
//! `legend-protocol` codec. Parses CLI arguments, initializes logging,
//! runs one subcommand and prints its JSON report on stdout.
//!
//! - `sign`     — build and sign a transaction from a request segment
//! - `verify`   — validate a signed record and check its signature
//! - `validate` — check a signed record against the protocol bounds
//! - `keygen`   — generate a signing key
//! - `pack`     — show how an amount packs

mod cli;
mod commands;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;

use legend_protocol::config::{network_name, PROTOCOL_VERSION};
use legend_protocol::transaction::TxEngine;

use cli::{Commands, LegendSignerCli};
use logging::DEFAULT_DIRECTIVES;

fn main() -> Result<()> {
    let cli = LegendSignerCli::parse();
    logging::init_logging(DEFAULT_DIRECTIVES, cli.global.log_format.into());

    let config = commands::load_config(&cli.global)?;
    tracing::debug!(
        network = %network_name(config.chain_id),
        protocol = PROTOCOL_VERSION,
        "configuration loaded"
    );
    let engine = TxEngine::new(config);

    let report = match &cli.command {
        Commands::Sign(args) => {
            let segment = commands::read_input(args.input.as_deref())?;
            commands::sign(&engine, args, &segment)?
        }
        Commands::Verify(args) => {
            let record = commands::read_input(args.record.input.as_deref())?;
            commands::verify(&engine, args, &record)?
        }
        Commands::Validate(args) => {
            let record = commands::read_input(args.input.as_deref())?;
            commands::validate(&engine, args, &record)?
        }
        Commands::Keygen => commands::keygen(),
        Commands::Pack(args) => commands::pack(&engine, args)?,
    };

    let rendered = serde_json::to_string_pretty(&report).context("failed to render report")?;
    println!("{}", rendered);
    Ok(())
}
