//! CLI command implementations

pub mod currency;
pub mod demo;
pub mod export;
pub mod logs;
pub mod rate;
pub mod show;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use coinbook_core::services::{EntryPoint, LogEvent, LoggingService};
use coinbook_core::{CoinbookContext, Error, LoadError, Wallet};
use dialoguer::Password;
use rust_decimal::Decimal;

use crate::output;

/// Environment variable holding the wallet password
pub const ENV_PASSWORD: &str = "COINBOOK_PASSWORD";

/// Options shared by commands that load a wallet and convert amounts
#[derive(Args, Debug, Clone)]
pub struct WalletArgs {
    /// Wallet file (.json or .duckdb)
    pub wallet: PathBuf,
    /// Password for encrypted wallets (falls back to COINBOOK_PASSWORD, then a prompt)
    #[arg(short, long)]
    pub password: Option<String>,
    /// Fiat currency for this run (overrides settings)
    #[arg(long)]
    pub currency: Option<String>,
    /// Exchange rate for this run, in fiat units per native unit
    #[arg(long)]
    pub rate: Option<Decimal>,
}

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize (shouldn't block operations)
pub fn get_logger() -> Option<LoggingService> {
    let coinbook_dir = get_coinbook_dir().ok()?;
    std::fs::create_dir_all(&coinbook_dir).ok()?;
    LoggingService::new(&coinbook_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION")).ok()
}

/// Log an event, ignoring any errors (logging should never break the app)
pub fn log_event(logger: &Option<LoggingService>, event: LogEvent) {
    if let Some(l) = logger {
        let _ = l.log(event);
    }
}

/// Get the coinbook directory from environment or default
pub fn get_coinbook_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("COINBOOK_DIR") {
        return Ok(PathBuf::from(dir));
    }
    Ok(dirs::home_dir()
        .context("Could not find home directory; set COINBOOK_DIR")?
        .join(".coinbook"))
}

/// Create the coinbook context
pub fn get_context() -> Result<CoinbookContext> {
    let coinbook_dir = get_coinbook_dir()?;

    std::fs::create_dir_all(&coinbook_dir)
        .with_context(|| format!("Failed to create coinbook directory: {:?}", coinbook_dir))?;

    let ctx = CoinbookContext::new(&coinbook_dir).context("Failed to initialize coinbook context")?;
    for warning in ctx.warnings() {
        output::warning(&format!("settings.json: {}", warning));
    }
    Ok(ctx)
}

/// Create the context and apply per-run currency/rate overrides
///
/// A currency override discards the stored rate, which was quoted in the
/// configured currency.
pub fn get_context_for(args: &WalletArgs) -> Result<CoinbookContext> {
    let ctx = get_context()?;
    if let Some(code) = &args.currency {
        ctx.converter.initialise(code)?;
    }
    if let Some(rate) = args.rate {
        ctx.converter.set_rate(rate)?;
    }
    Ok(ctx)
}

/// Password from --password flag or COINBOOK_PASSWORD
pub fn password_from_flag_or_env(password_flag: Option<String>) -> Option<String> {
    password_flag.or_else(|| std::env::var(ENV_PASSWORD).ok())
}

/// Load a wallet, prompting for a password if it turns out to need one
///
/// The prompt only happens on an interactive terminal and only when no
/// password was supplied by flag or environment.
pub fn load_wallet(ctx: &CoinbookContext, path: &Path, password_flag: Option<String>) -> Result<Wallet> {
    let password = password_from_flag_or_env(password_flag);

    match ctx.load_wallet(path, password.as_deref()) {
        Err(Error::Load(LoadError::RequiresDecryption { .. }))
            if password.is_none() && atty::is(atty::Stream::Stdin) =>
        {
            let prompted = Password::new()
                .with_prompt(format!("Password for {}", path.display()))
                .interact()?;
            Ok(ctx.load_wallet(path, Some(&prompted))?)
        }
        other => Ok(other?),
    }
}
