use anyhow::{Error, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Installs the console subscriber, filtered by `RUST_LOG` and defaulting to `info`.
pub(crate) fn init() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .try_init()
        .map_err(Error::msg)
}
