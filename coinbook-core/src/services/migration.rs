//! Migration service - embedded schema migrations for DuckDB files
//!
//! Both the wallet database and the event log carry a `sys_migrations`
//! table listing the migrations already applied. A migration set is a
//! `&'static [Migration]` (see `crate::migrations` and
//! `crate::log_migrations`) whose first entry creates that table.

use std::collections::HashSet;

use anyhow::{bail, Context, Result};
use duckdb::Connection;

/// `(file name, sql)` of one embedded migration
pub type Migration = (&'static str, &'static str);

/// Outcome of `MigrationService::run_pending`
#[derive(Debug)]
pub struct MigrationResult {
    /// Migrations applied by this run, in order
    pub applied: Vec<String>,
    /// Migrations of the set that were applied by an earlier run
    pub already_applied: usize,
}

/// Applies one migration set to one connection
pub struct MigrationService<'a> {
    conn: &'a Connection,
    migrations: &'static [Migration],
}

impl<'a> MigrationService<'a> {
    pub fn new(conn: &'a Connection, migrations: &'static [Migration]) -> Self {
        Self { conn, migrations }
    }

    /// Apply every migration of the set not yet recorded in `sys_migrations`
    ///
    /// Each migration runs in its own transaction together with the row
    /// recording it, so a failing migration leaves no trace and is retried
    /// on the next run.
    pub fn run_pending(&self) -> Result<MigrationResult> {
        let Some((tracking, tracking_sql)) = self.migrations.first() else {
            bail!("empty migration set");
        };
        // idempotent: CREATE TABLE IF NOT EXISTS
        self.conn
            .execute_batch(tracking_sql)
            .with_context(|| format!("Migration {} failed", tracking))?;

        let before = self.applied()?;
        let mut applied = Vec::new();
        for (name, sql) in self.migrations {
            if before.contains(*name) {
                continue;
            }
            self.apply(name, sql)?;
            applied.push(name.to_string());
        }

        Ok(MigrationResult {
            applied,
            already_applied: self
                .migrations
                .iter()
                .filter(|(name, _)| before.contains(*name))
                .count(),
        })
    }

    /// Names of the migrations not yet applied, in set order
    pub fn pending(&self) -> Result<Vec<&'static str>> {
        let applied = self.applied()?;
        Ok(self
            .migrations
            .iter()
            .map(|(name, _)| *name)
            .filter(|name| !applied.contains(*name))
            .collect())
    }

    /// Names recorded in `sys_migrations`; empty on a fresh database
    pub fn applied(&self) -> Result<HashSet<String>> {
        if !self.tracking_table_exists() {
            return Ok(HashSet::new());
        }
        let mut stmt = self.conn.prepare("SELECT migration_name FROM sys_migrations")?;
        let names = stmt.query_map([], |row| row.get::<_, String>(0))?;
        names
            .collect::<Result<HashSet<_>, _>>()
            .context("Failed to read sys_migrations")
    }

    fn tracking_table_exists(&self) -> bool {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = 'sys_migrations'",
                [],
                |row| row.get::<_, i64>(0),
            )
            .map(|count| count > 0)
            .unwrap_or(false)
    }

    fn apply(&self, name: &str, sql: &str) -> Result<()> {
        self.conn.execute_batch("BEGIN TRANSACTION")?;
        let result = self.conn.execute_batch(sql).and_then(|_| {
            self.conn
                .execute("INSERT INTO sys_migrations (migration_name) VALUES (?)", [name])
                .map(|_| ())
        });
        match result {
            Ok(()) => {
                self.conn.execute_batch("COMMIT")?;
                Ok(())
            }
            Err(e) => {
                let _ = self.conn.execute_batch("ROLLBACK");
                Err(e).with_context(|| format!("Migration {} failed", name))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log_migrations::LOG_MIGRATIONS;
    use crate::migrations::MIGRATIONS;

    static BROKEN: &[Migration] = &[
        ("000_migrations.sql", include_str!("../migrations/000_migrations.sql")),
        ("001_ok.sql", "CREATE TABLE kept (x INTEGER);"),
        ("002_broken.sql", "CREATE TABLE half (x INTEGER); SELECT * FROM no_such_table;"),
    ];

    #[test]
    fn test_sets_start_with_tracking_table_and_are_ordered() {
        for set in [MIGRATIONS, LOG_MIGRATIONS] {
            assert_eq!(set[0].0, "000_migrations.sql");
            let names: Vec<&str> = set.iter().map(|(n, _)| *n).collect();
            let mut sorted = names.clone();
            sorted.sort();
            assert_eq!(names, sorted);
        }
    }

    #[test]
    fn test_wallet_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        let service = MigrationService::new(&conn, MIGRATIONS);

        let first = service.run_pending().unwrap();
        assert_eq!(first.applied.len(), MIGRATIONS.len());
        assert_eq!(first.already_applied, 0);

        let second = service.run_pending().unwrap();
        assert!(second.applied.is_empty());
        assert_eq!(second.already_applied, MIGRATIONS.len());

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM wallet_transactions", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_pending_on_fresh_and_migrated_databases() {
        let conn = Connection::open_in_memory().unwrap();
        let service = MigrationService::new(&conn, LOG_MIGRATIONS);

        assert_eq!(service.pending().unwrap().len(), LOG_MIGRATIONS.len());
        service.run_pending().unwrap();
        assert!(service.pending().unwrap().is_empty());
    }

    #[test]
    fn test_failed_migration_is_rolled_back() {
        let conn = Connection::open_in_memory().unwrap();
        let service = MigrationService::new(&conn, BROKEN);

        let err = service.run_pending().unwrap_err();
        assert!(format!("{:#}", err).contains("002_broken.sql"));

        assert_eq!(service.pending().unwrap(), vec!["002_broken.sql"]);
        let half: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = 'half'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(half, 0);
    }
}
