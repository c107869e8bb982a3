//! Wallet service - picks a wallet store by file type

use std::path::Path;

use anyhow::{bail, Result};

use crate::adapters::duckdb::DuckDbWalletStore;
use crate::adapters::json_wallet::JsonWalletStore;
use crate::domain::result::LoadError;
use crate::domain::Wallet;
use crate::ports::WalletLoader;

/// Loads and saves wallets through the store matching the file extension
#[derive(Debug, Default, Clone)]
pub struct WalletService {
    json: JsonWalletStore,
    duckdb: DuckDbWalletStore,
}

impl WalletService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that understands `path`, if any
    pub fn loader_for(&self, path: &Path) -> Option<&dyn WalletLoader> {
        let loaders: [&dyn WalletLoader; 2] = [&self.json, &self.duckdb];
        loaders.into_iter().find(|l| l.handles(path))
    }

    /// Load a wallet
    ///
    /// A file no store recognizes is reported as corrupt, unless it does not
    /// exist at all.
    pub fn load(&self, path: &Path, password: Option<&str>) -> Result<Wallet, LoadError> {
        match self.loader_for(path) {
            Some(loader) => loader.load_wallet(path, password),
            None if !path.exists() => Err(LoadError::NotFound(path.to_path_buf())),
            None => Err(LoadError::corrupt(
                path,
                "unsupported wallet format (expected .json or .duckdb)",
            )),
        }
    }

    /// Save a wallet in the format implied by the extension of `path`
    pub fn save(&self, wallet: &Wallet, path: &Path) -> Result<()> {
        match self.loader_for(path).map(|l| l.name()) {
            Some("json") => self.json.save(wallet, path),
            Some("duckdb") => self.duckdb.save(wallet, path),
            _ => bail!(
                "Unsupported wallet format for {} (expected .json or .duckdb)",
                path.display()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::demo::demo_wallet;

    #[test]
    fn test_dispatch_by_extension() {
        let service = WalletService::new();
        assert_eq!(service.loader_for(Path::new("a.json")).map(|l| l.name()), Some("json"));
        assert_eq!(service.loader_for(Path::new("a.duckdb")).map(|l| l.name()), Some("duckdb"));
        assert!(service.loader_for(Path::new("a.wallet")).is_none());
    }

    #[test]
    fn test_unknown_format() {
        let dir = tempfile::tempdir().unwrap();
        let service = WalletService::new();

        let missing = dir.path().join("missing.wallet");
        assert!(matches!(service.load(&missing, None), Err(LoadError::NotFound(_))));

        let present = dir.path().join("present.wallet");
        std::fs::write(&present, b"\x00\x01").unwrap();
        assert!(matches!(service.load(&present, None), Err(LoadError::Corrupt { .. })));
        assert!(service.save(&demo_wallet(&present).unwrap(), &present).is_err());
    }

    #[test]
    fn test_json_round_trip_through_service() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.json");
        let service = WalletService::new();

        let wallet = demo_wallet(&path).unwrap();
        service.save(&wallet, &path).unwrap();
        let loaded = service.load(&path, None).unwrap();
        assert_eq!(loaded.transactions(), wallet.transactions());
    }

    #[test]
    fn test_duckdb_round_trip_through_service() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.duckdb");
        let service = WalletService::new();

        let wallet = demo_wallet(&path).unwrap();
        service.save(&wallet, &path).unwrap();
        let loaded = service.load(&path, None).unwrap();
        assert_eq!(loaded.transactions(), wallet.transactions());
    }
}
