use color_eyre::{Result, eyre::WrapErr};
use std::{fs::File, path::Path};
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "EVM_ACCOUNT_TUI_LOG";
pub const LOG_FILE: &str = "evm-account-tui.log";

/// Routes `tracing` output to a file next to the data store; the terminal belongs to ratatui.
pub fn init(dir: &Path) -> Result<()> {
    let path = dir.join(LOG_FILE);
    let file = File::create(&path)
        .wrap_err_with(|| format!("failed to create log file at {}", path.display()))?;
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(file)
        .with_ansi(false)
        .init();
    Ok(())
}
