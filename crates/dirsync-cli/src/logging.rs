use std::io::IsTerminal;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Filter used when `RUST_LOG` is unset and `--verbose` is given
const VERBOSE_FILTER: &str = "dirsync=debug,dirsync_core=debug";

/// Install the global tracing subscriber
///
/// Logs go to stderr. `RUST_LOG` takes precedence over `verbose`; colours are
/// only used when stderr is a terminal.
pub fn init(verbose: bool) -> anyhow::Result<()> {
    let default = if verbose { VERBOSE_FILTER } else { "info" };
    let filter_layer = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default))?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(verbose)
        .compact();

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
