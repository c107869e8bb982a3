//! Event log - what the CLI did, stored in `logs.duckdb`
//!
//! Only command names, fiat currency codes, row counts and error messages
//! are recorded. Addresses, labels, hashes and amounts never reach the log.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use duckdb::types::Value;
use duckdb::{params_from_iter, Connection};
use serde::{Deserialize, Serialize};

use crate::log_migrations::LOG_MIGRATIONS;
use crate::services::MigrationService;

/// File name of the event log inside the coinbook directory
pub const LOG_DB_FILE: &str = "logs.duckdb";

/// Who wrote an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryPoint {
    Cli,
    Library,
}

impl EntryPoint {
    fn as_str(&self) -> &'static str {
        match self {
            EntryPoint::Cli => "cli",
            EntryPoint::Library => "library",
        }
    }
}

/// The events coinbook records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    CommandExecuted,
    ExportCompleted,
    ExportFailed,
    RateSet,
    CurrencySet,
}

impl EventKind {
    pub const ALL: [EventKind; 5] = [
        EventKind::CommandExecuted,
        EventKind::ExportCompleted,
        EventKind::ExportFailed,
        EventKind::RateSet,
        EventKind::CurrencySet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::CommandExecuted => "command_executed",
            EventKind::ExportCompleted => "export_completed",
            EventKind::ExportFailed => "export_failed",
            EventKind::RateSet => "rate_set",
            EventKind::CurrencySet => "currency_set",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('-', "_").to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(EventKind::as_str).collect();
                format!("unknown event '{}' (expected one of: {})", s, known.join(", "))
            })
    }
}

/// One event to record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    pub kind: EventKind,
    pub command: Option<String>,
    pub currency: Option<String>,
    pub rows: Option<u64>,
    pub error_message: Option<String>,
    pub error_details: Option<String>,
}

impl LogEvent {
    fn of(kind: EventKind, command: &str) -> Self {
        Self {
            kind,
            command: Some(command.to_string()),
            currency: None,
            rows: None,
            error_message: None,
            error_details: None,
        }
    }

    /// A CLI command started
    pub fn command(command: &str) -> Self {
        Self::of(EventKind::CommandExecuted, command)
    }

    /// An export finished writing `rows` rows priced in `currency`
    pub fn export_completed(currency: &str, rows: usize) -> Self {
        Self {
            currency: Some(currency.to_string()),
            rows: Some(rows as u64),
            ..Self::of(EventKind::ExportCompleted, "export")
        }
    }

    /// An export was aborted
    ///
    /// The message is the top-level error; details hold the cause chain.
    pub fn export_failed(currency: &str, error: &anyhow::Error) -> Self {
        Self {
            currency: Some(currency.to_string()),
            error_message: Some(error.to_string()),
            error_details: Some(format!("{:#}", error)),
            ..Self::of(EventKind::ExportFailed, "export")
        }
    }

    /// A new exchange rate was stored for `currency`
    pub fn rate_set(currency: &str) -> Self {
        Self {
            currency: Some(currency.to_string()),
            ..Self::of(EventKind::RateSet, "rate set")
        }
    }

    /// The preferred currency changed to `currency`
    pub fn currency_set(currency: &str) -> Self {
        Self {
            currency: Some(currency.to_string()),
            ..Self::of(EventKind::CurrencySet, "currency set")
        }
    }
}

/// A stored entry
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub id: i64,
    pub timestamp: i64,
    pub entry_point: String,
    pub app_version: String,
    pub platform: String,
    pub event: String,
    pub command: Option<String>,
    pub currency: Option<String>,
    pub rows: Option<u64>,
    pub error_message: Option<String>,
    pub error_details: Option<String>,
}

/// Which entries `LoggingService::entries` returns
#[derive(Debug, Clone)]
pub struct LogFilter {
    pub kind: Option<EventKind>,
    pub errors_only: bool,
    pub limit: usize,
}

impl Default for LogFilter {
    fn default() -> Self {
        Self {
            kind: None,
            errors_only: false,
            limit: 50,
        }
    }
}

/// Export activity for one fiat currency
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportStats {
    pub currency: String,
    pub completed: u64,
    pub failed: u64,
    pub rows: u64,
}

/// Totals over the whole log
#[derive(Debug, Clone, Serialize)]
pub struct LogSummary {
    pub total: u64,
    pub errors: u64,
    pub oldest: Option<i64>,
    pub newest: Option<i64>,
}

/// Which entries `LoggingService::prune` deletes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prune {
    All,
    /// Entries strictly older than this unix timestamp (ms)
    Before(i64),
}

const ENTRY_COLUMNS: &str = "id, timestamp, entry_point, app_version, platform, \
                             event, command, currency, rows, error_message, error_details";

fn row_to_entry(row: &duckdb::Row) -> duckdb::Result<LogEntry> {
    Ok(LogEntry {
        id: row.get(0)?,
        timestamp: row.get(1)?,
        entry_point: row.get(2)?,
        app_version: row.get(3)?,
        platform: row.get(4)?,
        event: row.get(5)?,
        command: row.get(6)?,
        currency: row.get(7)?,
        rows: row.get::<_, Option<i64>>(8)?.map(|r| r as u64),
        error_message: row.get(9)?,
        error_details: row.get(10)?,
    })
}

/// Appends to and queries the event log
pub struct LoggingService {
    conn: Mutex<Connection>,
    db_path: PathBuf,
    entry_point: EntryPoint,
    app_version: String,
}

impl LoggingService {
    /// Open (or create) `logs.duckdb` in `coinbook_dir` and migrate it
    pub fn new(
        coinbook_dir: &Path,
        entry_point: EntryPoint,
        app_version: impl Into<String>,
    ) -> Result<Self> {
        let db_path = coinbook_dir.join(LOG_DB_FILE);
        let conn = Connection::open(&db_path)
            .with_context(|| format!("Failed to open event log {}", db_path.display()))?;
        MigrationService::new(&conn, LOG_MIGRATIONS).run_pending()?;

        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
            entry_point,
            app_version: app_version.into(),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| anyhow!("Event log lock poisoned: {}", e))
    }

    /// Record an event, stamped with time, entry point, version and OS
    pub fn log(&self, event: LogEvent) -> Result<()> {
        self.conn()?.execute(
            "INSERT INTO sys_logs (
                timestamp, entry_point, app_version, platform,
                event, command, currency, rows, error_message, error_details
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            duckdb::params![
                Utc::now().timestamp_millis(),
                self.entry_point.as_str(),
                &self.app_version,
                std::env::consts::OS,
                event.kind.as_str(),
                &event.command,
                &event.currency,
                event.rows.map(|r| r as i64),
                &event.error_message,
                &event.error_details,
            ],
        )?;
        Ok(())
    }

    /// Entries matching `filter`, newest first
    pub fn entries(&self, filter: &LogFilter) -> Result<Vec<LogEntry>> {
        let mut conditions = Vec::new();
        let mut args: Vec<Value> = Vec::new();
        if let Some(kind) = filter.kind {
            conditions.push("event = ?");
            args.push(Value::Text(kind.as_str().to_string()));
        }
        if filter.errors_only {
            conditions.push("error_message IS NOT NULL");
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        args.push(Value::BigInt(filter.limit as i64));

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM sys_logs {} ORDER BY timestamp DESC, id DESC LIMIT ?",
            ENTRY_COLUMNS, where_clause
        ))?;
        let entries = stmt
            .query_map(params_from_iter(args), row_to_entry)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Completed and failed exports, and rows written, per fiat currency
    pub fn export_stats(&self) -> Result<Vec<ExportStats>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT currency,
                    COUNT(*) FILTER (WHERE event = 'export_completed'),
                    COUNT(*) FILTER (WHERE event = 'export_failed'),
                    CAST(COALESCE(SUM(rows) FILTER (WHERE event = 'export_completed'), 0) AS BIGINT)
             FROM sys_logs
             WHERE event IN ('export_completed', 'export_failed') AND currency IS NOT NULL
             GROUP BY currency
             ORDER BY currency",
        )?;
        let stats = stmt
            .query_map([], |row| {
                Ok(ExportStats {
                    currency: row.get(0)?,
                    completed: row.get::<_, i64>(1)? as u64,
                    failed: row.get::<_, i64>(2)? as u64,
                    rows: row.get::<_, i64>(3)? as u64,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(stats)
    }

    /// Entry and error counts plus the time span covered
    pub fn summary(&self) -> Result<LogSummary> {
        let conn = self.conn()?;
        let summary = conn.query_row(
            "SELECT COUNT(*), COUNT(error_message), MIN(timestamp), MAX(timestamp) FROM sys_logs",
            [],
            |row| {
                Ok(LogSummary {
                    total: row.get::<_, i64>(0)? as u64,
                    errors: row.get::<_, i64>(1)? as u64,
                    oldest: row.get(2)?,
                    newest: row.get(3)?,
                })
            },
        )?;
        Ok(summary)
    }

    /// Delete entries; returns how many were removed
    pub fn prune(&self, prune: Prune) -> Result<u64> {
        let conn = self.conn()?;
        let deleted = match prune {
            Prune::All => conn.execute("DELETE FROM sys_logs", [])?,
            Prune::Before(ms) => conn.execute("DELETE FROM sys_logs WHERE timestamp < ?", [ms])?,
        };
        Ok(deleted as u64)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}
