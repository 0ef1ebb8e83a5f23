//! Tracing setup shared by both binaries

use anyhow::{Result, anyhow};
use std::io::IsTerminal;
use std::str::FromStr;
use tracing::Level;

/// Install the fmt subscriber at `level` (default `info`)
///
/// Colour only when stderr is a terminal: the companion's stderr is a pipe
/// read by `remote-launch`, which forwards each line verbatim.
pub fn init(level: Option<&str>) -> Result<()> {
    let level = match level {
        Some(level) => Level::from_str(level).map_err(|_| anyhow!("invalid log level '{}'", level))?,
        None => Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(level)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}
