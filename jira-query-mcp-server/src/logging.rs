//! Logging setup
//!
//! Logs always go to stderr: stdout carries the MCP protocol stream.

use crate::config::level_directive;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence; otherwise `level` (DEBUG, INFO, WARNING,
/// ERROR or CRITICAL) sets the filter. Calling this twice is harmless.
pub fn init_logging(level: &str) -> Result<(), ParseError> {
    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level_directive(level)))?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_ansi(false);

    // A subscriber may already be installed, e.g. by a test harness.
    let _ = tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init();

    Ok(())
}
