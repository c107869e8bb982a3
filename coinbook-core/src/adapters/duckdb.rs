//! DuckDB wallet store

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::{TimeZone, Utc};
use duckdb::{params, AccessMode, Connection};
use rust_decimal::Decimal;

use crate::domain::result::LoadError;
use crate::domain::{Transaction, Wallet};
use crate::migrations::MIGRATIONS;
use crate::ports::WalletLoader;
use crate::services::MigrationService;

/// Maximum number of retries when database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400, 800ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

/// Alias of the attached database for encrypted wallets
const ATTACHED_DB: &str = "wallet_db";

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    // Windows error messages
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        // Unix/macOS error messages
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("file is already open")
        || lower.contains("could not set lock")
}

/// Quote a value for use inside a SQL string literal
fn sql_literal(value: &str) -> String {
    value.replace('\'', "''")
}

/// `path` with `suffix` appended to the file name
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
    }
}

/// Reads and writes `*.duckdb` wallets
///
/// Wallets encrypted with DuckDB's database encryption can be read when the
/// caller supplies the key; this store only ever writes plain wallets.
#[derive(Debug, Default, Clone, Copy)]
pub struct DuckDbWalletStore;

impl DuckDbWalletStore {
    pub fn new() -> Self {
        Self
    }

    /// Open a wallet database
    ///
    /// Includes retry logic with exponential backoff for file locking errors,
    /// which occur when another process holds the wallet open for writing.
    fn open(db_path: &Path, encryption_key: Option<&str>, read_only: bool) -> Result<Connection> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            match Self::try_open_connection(db_path, encryption_key, read_only) {
                Ok(conn) => return Ok(conn),
                Err(e) => {
                    let err_msg = e.to_string();
                    if is_retryable_error(&err_msg) && attempt < MAX_RETRIES - 1 {
                        let delay =
                            Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                        eprintln!(
                            "[coinbook] Wallet busy, retrying in {}ms (attempt {}/{}): {}",
                            delay.as_millis(),
                            attempt + 1,
                            MAX_RETRIES,
                            err_msg
                        );
                        thread::sleep(delay);
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| anyhow!("Failed to open wallet after {} retries", MAX_RETRIES)))
    }

    /// Attempt to open a database connection (called by open() with retry logic)
    fn try_open_connection(
        db_path: &Path,
        encryption_key: Option<&str>,
        read_only: bool,
    ) -> Result<Connection> {
        // Extension autoloading stays off; nothing here needs an extension
        let conn = if let Some(key) = encryption_key {
            // Encrypted database: open in-memory first, then ATTACH the file with its key
            let config = duckdb::Config::default().enable_autoload_extension(false)?;
            let conn = Connection::open_in_memory_with_flags(config)?;
            let mode = if read_only { "READ_ONLY, " } else { "" };
            conn.execute(
                &format!(
                    "ATTACH '{}' AS {} ({}ENCRYPTION_KEY '{}')",
                    sql_literal(&db_path.display().to_string()),
                    ATTACHED_DB,
                    mode,
                    sql_literal(key)
                ),
                [],
            )?;
            conn.execute(&format!("USE {}", ATTACHED_DB), [])?;
            conn
        } else {
            let mut config = duckdb::Config::default().enable_autoload_extension(false)?;
            if read_only {
                config = config.access_mode(AccessMode::ReadOnly)?;
            }
            Connection::open_with_flags(db_path, config)?
        };

        Ok(conn)
    }

    /// Write `wallet` to `path`, replacing any existing wallet there
    ///
    /// The new wallet is built next to the target as `<path>.partial` and
    /// renamed over it only once complete, so a failed save leaves the
    /// previous wallet untouched.
    pub fn save(&self, wallet: &Wallet, path: &Path) -> Result<()> {
        let partial = with_suffix(path, ".partial");
        let partial_wal = with_suffix(&partial, ".wal");
        remove_if_exists(&partial)?;
        remove_if_exists(&partial_wal)?;

        let written = Self::open(&partial, None, false).and_then(|mut conn| {
            Self::write_wallet(&mut conn, wallet)?;
            conn.execute_batch("CHECKPOINT")?;
            Ok(())
        });
        if let Err(e) = written {
            let _ = remove_if_exists(&partial);
            let _ = remove_if_exists(&partial_wal);
            return Err(e.context(format!("Failed to write wallet {}", path.display())));
        }

        // a WAL left by the old file must not be replayed against the new one
        remove_if_exists(&with_suffix(path, ".wal"))?;
        fs::rename(&partial, path)
            .with_context(|| format!("Failed to replace wallet {}", path.display()))?;
        Ok(())
    }

    /// Create the schema and insert the ledger in one transaction
    fn write_wallet(conn: &mut Connection, wallet: &Wallet) -> Result<()> {
        MigrationService::new(conn, MIGRATIONS).run_pending()?;

        let tx = conn.transaction()?;
        if let Some(description) = wallet.description() {
            tx.execute(
                "INSERT INTO wallet_meta (key, value) VALUES ('description', ?)",
                params![description],
            )?;
        }
        for (position, t) in wallet.transactions().iter().enumerate() {
            tx.execute(
                "INSERT INTO wallet_transactions (position, hash, timestamp_ms, net_value, address, label)
                 VALUES (?, ?, ?, ?, ?, ?)",
                params![
                    position as i64,
                    t.hash,
                    t.timestamp.map(|ts| ts.timestamp_millis()),
                    t.net_value.to_string(),
                    t.counterparty_address,
                    t.label,
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn read_wallet(conn: &Connection, path: &Path) -> Result<Wallet, LoadError> {
        let corrupt = |e: duckdb::Error| LoadError::corrupt(path, e.to_string());

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = 'wallet_transactions'",
                [],
                |row| row.get(0),
            )
            .map_err(corrupt)?;
        if tables == 0 {
            return Err(LoadError::corrupt(path, "not a wallet database (no wallet_transactions table)"));
        }

        let description: Option<String> = conn
            .query_row(
                "SELECT value FROM wallet_meta WHERE key = 'description'",
                [],
                |row| row.get(0),
            )
            .ok();

        let mut stmt = conn
            .prepare(
                "SELECT hash, timestamp_ms, net_value, address, label
                 FROM wallet_transactions ORDER BY position",
            )
            .map_err(corrupt)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<i64>>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            })
            .map_err(corrupt)?;

        let mut transactions = Vec::new();
        for row in rows {
            let (hash, timestamp_ms, net_value, address, label) = row.map_err(corrupt)?;

            let net_value: Decimal = net_value.parse().map_err(|_| {
                LoadError::corrupt(path, format!("transaction {} has an invalid value '{}'", hash, net_value))
            })?;
            let timestamp = match timestamp_ms {
                Some(ms) => Some(Utc.timestamp_millis_opt(ms).single().ok_or_else(|| {
                    LoadError::corrupt(path, format!("transaction {} has an invalid timestamp", hash))
                })?),
                None => None,
            };

            let mut tx = Transaction::new(hash, timestamp, net_value, address);
            tx.label = label;
            transactions.push(tx);
        }

        Ok(Wallet::new(path, transactions)?.with_description(description))
    }
}

impl WalletLoader for DuckDbWalletStore {
    fn name(&self) -> &str {
        "duckdb"
    }

    fn handles(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("duckdb") || e.eq_ignore_ascii_case("db"))
            .unwrap_or(false)
    }

    fn load_wallet(&self, path: &Path, password: Option<&str>) -> Result<Wallet, LoadError> {
        if !path.exists() {
            return Err(LoadError::NotFound(path.to_path_buf()));
        }

        let conn = match Self::open(path, None, true) {
            Ok(conn) => conn,
            Err(e) => {
                let reason = e.to_string();
                if !reason.to_lowercase().contains("encrypt") {
                    return Err(LoadError::corrupt(path, reason));
                }
                let Some(password) = password else {
                    return Err(LoadError::requires_decryption(path, "a password is required"));
                };
                Self::open(path, Some(password), true).map_err(|e| {
                    LoadError::requires_decryption(
                        path,
                        format!("wrong password or damaged file: {}", e),
                    )
                })?
            }
        };

        Self::read_wallet(&conn, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    const HASH_A: &str = "28916ed8592a4cf216d8eac7e5ccb5a08771f439e508ec2861b7ff612e15b827";
    const HASH_B: &str = "5eeabb42d0522c40cc63dace7746d5f82cd51292bc50a38c4dd68a854ec6cd77";

    fn sample_wallet(path: &Path) -> Wallet {
        Wallet::new(
            path,
            vec![
                Transaction::new(
                    HASH_B,
                    Some(Utc.timestamp_millis_opt(1375089780000).unwrap()),
                    Decimal::from_str("0.015").unwrap(),
                    "1GtMdodCNN5ewFcEUxxVBziBrLtQzSuZvq",
                )
                .with_label("protobuf 1.1.北京"),
                Transaction::new(HASH_A, None, Decimal::from_str("-0.015").unwrap(), "1CQH7Hp9nNQVDcKtFVwbA8tqPMNWDBvqE3"),
            ],
        )
        .unwrap()
        .with_description(Some("sample".to_string()))
    }

    /// Write `wallet` into a DuckDB-encrypted database at `path`
    ///
    /// The bundled DuckDB only writes encrypted files with the unsafe
    /// crypto module forced on, which is acceptable for a test fixture.
    fn write_encrypted(wallet: &Wallet, path: &Path, key: &str) {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("SET force_mbedtls_unsafe = 'true'").unwrap();
        conn.execute_batch(&format!(
            "ATTACH '{}' AS enc (ENCRYPTION_KEY '{}'); USE enc;",
            sql_literal(&path.display().to_string()),
            sql_literal(key)
        ))
        .unwrap();
        DuckDbWalletStore::write_wallet(&mut conn, wallet).unwrap();
        conn.execute_batch("CHECKPOINT").unwrap();
    }

    #[test]
    fn test_retryable_errors() {
        assert!(is_retryable_error("IO Error: Could not set lock on file"));
        assert!(is_retryable_error("The process cannot access the file because it is being used by another process"));
        assert!(!is_retryable_error("IO Error: not a valid DuckDB database file"));
    }

    #[test]
    fn test_sql_literal_escapes_quotes() {
        assert_eq!(sql_literal("/tmp/o'brien.duckdb"), "/tmp/o''brien.duckdb");
        assert_eq!(sql_literal("pa'ss"), "pa''ss");
    }

    #[test]
    fn test_save_then_load_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wallet.duckdb");
        let wallet = sample_wallet(&path);

        let store = DuckDbWalletStore::new();
        store.save(&wallet, &path).unwrap();
        let loaded = store.load_wallet(&path, None).unwrap();

        assert_eq!(loaded.transactions(), wallet.transactions());
        assert_eq!(loaded.description(), Some("sample"));
        assert_eq!(loaded.transactions()[0].hash, HASH_B);
        assert!(!with_suffix(&path, ".partial").exists());
    }

    #[test]
    fn test_save_replaces_existing_wallet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wallet.duckdb");
        let store = DuckDbWalletStore::new();

        store.save(&sample_wallet(&path), &path).unwrap();
        store.save(&Wallet::new(&path, Vec::new()).unwrap(), &path).unwrap();

        let loaded = store.load_wallet(&path, None).unwrap();
        assert!(loaded.is_empty());
        assert_eq!(loaded.description(), None);
    }

    #[test]
    fn test_failed_save_keeps_previous_wallet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wallet.duckdb");
        let store = DuckDbWalletStore::new();
        store.save(&sample_wallet(&path), &path).unwrap();

        // a directory where the partial file should go makes the write fail
        fs::create_dir(with_suffix(&path, ".partial")).unwrap();
        assert!(store.save(&Wallet::new(&path, Vec::new()).unwrap(), &path).is_err());

        let loaded = store.load_wallet(&path, None).unwrap();
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn test_plain_wallet_ignores_password() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.duckdb");
        let store = DuckDbWalletStore::new();
        store.save(&sample_wallet(&path), &path).unwrap();

        let loaded = store.load_wallet(&path, Some("unused")).unwrap();
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn test_encrypted_wallet_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("locked.duckdb");
        let wallet = sample_wallet(&path);
        write_encrypted(&wallet, &path, "correct horse");

        let loaded = DuckDbWalletStore::new()
            .load_wallet(&path, Some("correct horse"))
            .unwrap();
        assert_eq!(loaded.transactions(), wallet.transactions());
        assert_eq!(loaded.description(), Some("sample"));
    }

    #[test]
    fn test_encrypted_wallet_without_password_requires_decryption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("locked.duckdb");
        write_encrypted(&sample_wallet(&path), &path, "correct horse");

        let err = DuckDbWalletStore::new().load_wallet(&path, None).unwrap_err();
        assert!(matches!(err, LoadError::RequiresDecryption { .. }), "got {err}");
    }

    #[test]
    fn test_encrypted_wallet_wrong_password_requires_decryption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("locked.duckdb");
        write_encrypted(&sample_wallet(&path), &path, "correct horse");

        let err = DuckDbWalletStore::new()
            .load_wallet(&path, Some("battery staple"))
            .unwrap_err();
        match err {
            LoadError::RequiresDecryption { reason, .. } => assert!(reason.contains("wrong password")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = DuckDbWalletStore::new()
            .load_wallet(&dir.path().join("missing.duckdb"), None)
            .unwrap_err();
        assert!(matches!(err, LoadError::NotFound(_)));
    }

    #[test]
    fn test_garbage_file_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.duckdb");
        fs::write(&path, vec![0x42u8; 8192]).unwrap();

        let err = DuckDbWalletStore::new().load_wallet(&path, Some("pw")).unwrap_err();
        assert!(matches!(err, LoadError::Corrupt { .. }), "got {err}");
    }

    #[test]
    fn test_foreign_database_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("other.duckdb");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch("CREATE TABLE something (x INTEGER)").unwrap();
        }

        let err = DuckDbWalletStore::new().load_wallet(&path, None).unwrap_err();
        match err {
            LoadError::Corrupt { reason, .. } => assert!(reason.contains("wallet_transactions")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_handles_extensions() {
        let store = DuckDbWalletStore::new();
        assert!(store.handles(Path::new("a.duckdb")));
        assert!(store.handles(Path::new("a.db")));
        assert!(!store.handles(Path::new("a.json")));
    }
}
