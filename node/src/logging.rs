//! # Structured Logging
//!
//! Initializes the `tracing` subscriber with a pretty or JSON format and
//! `RUST_LOG` filtering.
//!
//! Everything goes to stderr: stdout carries the signed records and
//! reports, and is usually piped into another tool.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::LogFormatArg;

/// Default directives when `RUST_LOG` is unset.
pub const DEFAULT_DIRECTIVES: &str = "legend_signer=info,legend_protocol=warn";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable output for interactive use.
    Pretty,
    /// JSON lines, for log aggregation.
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

/// Initialize the global tracing subscriber.
///
/// Call this once, early in `main()`. `RUST_LOG` overrides
/// `default_directives` when set, e.g.:
///
/// ```text
/// RUST_LOG=legend_signer=debug,legend_protocol=trace
/// ```
pub fn init_logging(default_directives: &str, format: LogFormat) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    match format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_file(false),
                )
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_target(true),
                )
                .init();
        }
    }

    tracing::debug!(?format, "logging initialized");
}
