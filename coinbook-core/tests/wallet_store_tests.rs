//! Integration tests for the wallet stores
//!
//! Uses real DuckDB files in temporary directories.
//!
//! Run with: cargo test --test wallet_store_tests -- --nocapture

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Instant;

use tempfile::TempDir;

use coinbook_core::adapters::demo::{demo_wallet, DEMO_CREDIT_HASH, DEMO_DEBIT_HASH};
use coinbook_core::config::Config;
use coinbook_core::services::WalletService;
use coinbook_core::{CoinbookContext, Error, LoadError};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn write_demo(dir: &TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    WalletService::new()
        .save(&demo_wallet(&path).unwrap(), &path)
        .expect("Failed to write demo wallet");
    path
}

#[test]
fn test_json_and_duckdb_load_the_same_ledger() {
    let temp_dir = TempDir::new().unwrap();
    let service = WalletService::new();

    let from_json = service.load(&fixture("protobuf1.json"), None).unwrap();
    let db_path = temp_dir.path().join("copy.duckdb");
    service.save(&from_json, &db_path).unwrap();
    let from_db = service.load(&db_path, None).unwrap();

    assert_eq!(from_json.transactions(), from_db.transactions());
    assert_eq!(from_db.transactions()[0].hash, DEMO_DEBIT_HASH);
    assert_eq!(from_db.transactions()[1].hash, DEMO_CREDIT_HASH);
}

#[test]
fn test_load_errors_surface_through_context() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = CoinbookContext::with_config(temp_dir.path(), Config::default());

    let missing = ctx.load_wallet(&temp_dir.path().join("missing.duckdb"), None);
    assert!(matches!(missing, Err(Error::Load(LoadError::NotFound(_)))));

    let garbage = temp_dir.path().join("garbage.json");
    fs::write(&garbage, "{{{{").unwrap();
    assert!(matches!(
        ctx.load_wallet(&garbage, None),
        Err(Error::Load(LoadError::Corrupt { .. }))
    ));
}

#[test]
fn test_encrypted_json_wallet_requires_decryption() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("locked.json");
    fs::write(&path, r#"{"version": 1, "encrypted": true, "payload": "AAAA"}"#).unwrap();

    let ctx = CoinbookContext::with_config(temp_dir.path(), Config::default());
    assert!(matches!(
        ctx.load_wallet(&path, Some("secret")),
        Err(Error::Load(LoadError::RequiresDecryption { .. }))
    ));
}

#[test]
fn test_leftover_partial_file_is_replaced() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("wallet.duckdb");
    let partial = temp_dir.path().join("wallet.duckdb.partial");
    fs::write(&partial, b"interrupted save").unwrap();

    WalletService::new()
        .save(&demo_wallet(&path).unwrap(), &path)
        .unwrap();

    assert!(!partial.exists());
    assert_eq!(WalletService::new().load(&path, None).unwrap().len(), 2);
}

/// Several threads open the same wallet at once; all must succeed
#[test]
fn test_concurrent_loads() {
    let temp_dir = TempDir::new().unwrap();
    let path = Arc::new(write_demo(&temp_dir, "shared.duckdb"));
    let barrier = Arc::new(Barrier::new(3));

    let handles: Vec<_> = (0..3)
        .map(|i| {
            let path = Arc::clone(&path);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let start = Instant::now();
                let result = WalletService::new().load(&path, None);
                println!("Thread {}: finished after {:?}", i, start.elapsed());
                result.map(|w| w.len()).map_err(|e| e.to_string())
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), Ok(2));
    }
}

#[test]
fn test_repeated_save_and_load_cycles() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("cycle.duckdb");
    let service = WalletService::new();

    for i in 0..5 {
        let wallet = demo_wallet(&path)
            .unwrap()
            .with_description(Some(format!("cycle {}", i)));
        service.save(&wallet, &path).unwrap();

        let loaded = service.load(&path, None).unwrap();
        assert_eq!(loaded.description(), Some(format!("cycle {}", i).as_str()));
        assert_eq!(loaded.len(), 2);
    }
}
