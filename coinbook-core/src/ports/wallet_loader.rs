//! Wallet loader port
//!
//! Decodes a persisted wallet into the ledger consumed by the export
//! pipeline. Implementations either return a complete wallet or a
//! `LoadError`; a partially populated ledger is never handed out.

use std::path::Path;

use crate::domain::result::LoadError;
use crate::domain::Wallet;

/// Wallet store trait
pub trait WalletLoader: Send + Sync {
    /// Store name (e.g., "json", "duckdb")
    fn name(&self) -> &str;

    /// Whether this store understands the file at `path`
    fn handles(&self, path: &Path) -> bool;

    /// Load a wallet
    ///
    /// # Arguments
    /// * `path` - Wallet file
    /// * `password` - Password for encrypted wallets, if the caller has one
    fn load_wallet(&self, path: &Path, password: Option<&str>) -> Result<Wallet, LoadError>;
}
