//! JSON wallet store
//!
//! A versioned JSON document holding the ledger. Useful for fixtures and
//! hand-edited wallets; encrypted JSON wallets are recognized but cannot be
//! opened here.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::result::LoadError;
use crate::domain::{Transaction, Wallet};
use crate::ports::WalletLoader;

/// Only document version this store reads and writes
pub const WALLET_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct WalletDocument {
    version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default)]
    encrypted: bool,
    transactions: Vec<Transaction>,
}

/// Reads and writes `*.json` wallets
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonWalletStore;

impl JsonWalletStore {
    pub fn new() -> Self {
        Self
    }

    /// Write `wallet` to `path`, replacing any existing file
    pub fn save(&self, wallet: &Wallet, path: &Path) -> Result<()> {
        let document = WalletDocument {
            version: WALLET_FORMAT_VERSION,
            description: wallet.description().map(str::to_string),
            encrypted: false,
            transactions: wallet.transactions().to_vec(),
        };
        let content = serde_json::to_string_pretty(&document)?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write wallet {}", path.display()))?;
        Ok(())
    }
}

impl WalletLoader for JsonWalletStore {
    fn name(&self) -> &str {
        "json"
    }

    fn handles(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false)
    }

    fn load_wallet(&self, path: &Path, _password: Option<&str>) -> Result<Wallet, LoadError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(LoadError::NotFound(path.to_path_buf()))
            }
            Err(e) => return Err(LoadError::corrupt(path, e.to_string())),
        };

        // Inspect the envelope first: an encrypted document has no readable
        // transaction list.
        let value: serde_json::Value = serde_json::from_str(&content)
            .map_err(|e| LoadError::corrupt(path, format!("invalid JSON: {}", e)))?;

        let version = value.get("version").and_then(|v| v.as_u64());
        if version != Some(WALLET_FORMAT_VERSION as u64) {
            return Err(LoadError::corrupt(
                path,
                match version {
                    Some(v) => format!("unsupported wallet version {}", v),
                    None => "missing wallet version".to_string(),
                },
            ));
        }

        if value.get("encrypted").and_then(|v| v.as_bool()) == Some(true) {
            return Err(LoadError::requires_decryption(
                path,
                "encrypted JSON wallets are not supported",
            ));
        }

        let document: WalletDocument = serde_json::from_value(value)
            .map_err(|e| LoadError::corrupt(path, format!("invalid wallet document: {}", e)))?;

        Ok(Wallet::new(path, document.transactions)?.with_description(document.description))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    const HASH_A: &str = "28916ed8592a4cf216d8eac7e5ccb5a08771f439e508ec2861b7ff612e15b827";
    const HASH_B: &str = "5eeabb42d0522c40cc63dace7746d5f82cd51292bc50a38c4dd68a854ec6cd77";

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_handles_json_extension_only() {
        let store = JsonWalletStore::new();
        assert!(store.handles(Path::new("w.json")));
        assert!(store.handles(Path::new("W.JSON")));
        assert!(!store.handles(Path::new("w.duckdb")));
        assert!(!store.handles(Path::new("json")));
    }

    #[test]
    fn test_load_preserves_order_and_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "w.json",
            &format!(
                r#"{{
                    "version": 1,
                    "description": "test wallet",
                    "transactions": [
                        {{"hash": "{}", "timestamp": "2013-07-29T09:23:00Z", "netValue": "-0.015", "address": "1CQH"}},
                        {{"hash": "{}", "timestamp": null, "netValue": "0.015", "address": "1Gt", "label": "北京"}}
                    ]
                }}"#,
                HASH_A,
                HASH_B.to_uppercase()
            ),
        );

        let wallet = JsonWalletStore::new().load_wallet(&path, None).unwrap();
        assert_eq!(wallet.description(), Some("test wallet"));
        assert_eq!(wallet.len(), 2);

        let first = &wallet.transactions()[0];
        assert_eq!(first.hash, HASH_A);
        assert_eq!(first.net_value, Decimal::from_str("-0.015").unwrap());
        assert_eq!(first.timestamp, Some(Utc.with_ymd_and_hms(2013, 7, 29, 9, 23, 0).unwrap()));
        assert_eq!(first.label, None);

        let second = &wallet.transactions()[1];
        assert_eq!(second.hash, HASH_B);
        assert_eq!(second.timestamp, None);
        assert_eq!(second.label.as_deref(), Some("北京"));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = JsonWalletStore::new()
            .load_wallet(&dir.path().join("nope.json"), None)
            .unwrap_err();
        assert!(matches!(err, LoadError::NotFound(_)));
    }

    #[test]
    fn test_garbage_and_bad_version_are_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonWalletStore::new();

        let garbage = write(&dir, "g.json", "not json at all");
        assert!(matches!(store.load_wallet(&garbage, None), Err(LoadError::Corrupt { .. })));

        let future = write(&dir, "f.json", r#"{"version": 2, "transactions": []}"#);
        let err = store.load_wallet(&future, None).unwrap_err();
        assert!(err.to_string().contains("unsupported wallet version 2"));

        let no_version = write(&dir, "n.json", r#"{"transactions": []}"#);
        assert!(matches!(store.load_wallet(&no_version, None), Err(LoadError::Corrupt { .. })));
    }

    #[test]
    fn test_missing_transaction_list_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonWalletStore::new();

        let missing = write(&dir, "m.json", r#"{"version": 1, "description": "no ledger"}"#);
        let err = store.load_wallet(&missing, None).unwrap_err();
        match err {
            LoadError::Corrupt { reason, .. } => assert!(reason.contains("transactions"), "{reason}"),
            other => panic!("unexpected error: {other}"),
        }

        // an explicit empty list is a valid empty wallet
        let empty = write(&dir, "e.json", r#"{"version": 1, "transactions": []}"#);
        assert!(store.load_wallet(&empty, None).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_hash_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let tx = format!(r#"{{"hash": "{}", "netValue": "1", "address": "a"}}"#, HASH_A);
        let path = write(
            &dir,
            "d.json",
            &format!(r#"{{"version": 1, "transactions": [{}, {}]}}"#, tx, tx),
        );
        assert!(matches!(
            JsonWalletStore::new().load_wallet(&path, None),
            Err(LoadError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_encrypted_document_requires_decryption() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "e.json", r#"{"version": 1, "encrypted": true, "payload": "..."}"#);
        let err = JsonWalletStore::new()
            .load_wallet(&path, Some("password"))
            .unwrap_err();
        assert!(matches!(err, LoadError::RequiresDecryption { .. }));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved.json");
        let wallet = Wallet::new(
            &path,
            vec![Transaction::new(HASH_A, None, Decimal::from_str("-0.5").unwrap(), "addr").with_label("shop")],
        )
        .unwrap()
        .with_description(Some("saved".to_string()));

        let store = JsonWalletStore::new();
        store.save(&wallet, &path).unwrap();
        let loaded = store.load_wallet(&path, None).unwrap();

        assert_eq!(loaded.transactions(), wallet.transactions());
        assert_eq!(loaded.description(), Some("saved"));
    }
}
