//! Demo service - writes the reference demo wallet
//!
//! The demo wallet lets a new user try `show` and `export` without a real
//! wallet file.

use std::path::Path;

use anyhow::Result;

use crate::adapters::demo::demo_wallet;
use crate::domain::Wallet;

use super::wallet::WalletService;

/// Service for creating demo wallets
pub struct DemoService<'a> {
    wallets: &'a WalletService,
}

impl<'a> DemoService<'a> {
    pub fn new(wallets: &'a WalletService) -> Self {
        Self { wallets }
    }

    /// Write the demo wallet to `path`, replacing any file there
    ///
    /// The format follows the extension.
    pub fn write(&self, path: &Path) -> Result<Wallet> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let wallet = demo_wallet(path)?;
        self.wallets.save(&wallet, path)?;
        Ok(wallet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_demo_duckdb_wallet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("demo.duckdb");
        let wallets = WalletService::new();

        let written = DemoService::new(&wallets).write(&path).unwrap();
        let loaded = wallets.load(&path, None).unwrap();
        assert_eq!(loaded.transactions(), written.transactions());
    }
}
