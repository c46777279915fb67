// Debug logging for twopong
// Writes to a file behind --debug, since stderr output would corrupt the TUI

use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;
use std::time::SystemTime;

use anyhow::{Context, Result};
use tracing::Level;

pub const LOG_FILE_PATH: &str = "/tmp/twopong-debug.log";

/// Install the global subscriber. With `enabled == false` nothing is
/// installed and every `tracing` macro is a no-op.
pub fn init(enabled: bool) -> Result<()> {
    if !enabled {
        return Ok(());
    }

    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(LOG_FILE_PATH)
        .with_context(|| format!("opening {}", LOG_FILE_PATH))?;

    writeln!(file, "=== twopong Debug Log ===")?;
    writeln!(file, "Session started: {:?}", SystemTime::now())?;
    writeln!(file, "To monitor: tail -f {}", LOG_FILE_PATH)?;
    writeln!(file, "========================================\n")?;

    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
        .context("installing log subscriber")?;

    Ok(())
}
