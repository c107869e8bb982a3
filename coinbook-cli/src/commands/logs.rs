//! Logs command - inspect the event log of past commands and exports

use anyhow::Result;
use chrono::{TimeZone, Utc};
use clap::Subcommand;
use colored::Colorize;
use comfy_table::{ContentArrangement, Table};

use super::get_coinbook_dir;
use coinbook_core::services::{EntryPoint, EventKind, LogEntry, LogFilter, LoggingService, Prune};

#[derive(Subcommand)]
pub enum LogsCommands {
    /// Show recent log entries
    List {
        /// Number of entries to show
        #[arg(short, long, default_value = "50")]
        limit: usize,
        /// Show only entries carrying an error
        #[arg(long)]
        errors: bool,
        /// Show only one kind of event (e.g. export-completed, export-failed)
        #[arg(long)]
        event: Option<EventKind>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete log entries
    Clear {
        /// Delete entries older than N days
        #[arg(long, default_value = "30")]
        older_than_days: u64,
        /// Delete every entry regardless of age
        #[arg(long)]
        all: bool,
        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Summarise the log: exports per currency, error count, database path
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn get_logging_service() -> Result<LoggingService> {
    let coinbook_dir = get_coinbook_dir()?;
    std::fs::create_dir_all(&coinbook_dir)?;
    LoggingService::new(&coinbook_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION"))
}

fn format_timestamp(timestamp_ms: i64) -> String {
    Utc.timestamp_millis_opt(timestamp_ms)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp_ms.to_string())
}

fn entry_context(entry: &LogEntry) -> String {
    let rows = entry.rows.map(|r| format!("{} rows", r));
    [entry.command.as_deref(), entry.currency.as_deref(), rows.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(", ")
}

fn list(filter: LogFilter, json: bool) -> Result<()> {
    let service = get_logging_service()?;
    let entries = service.entries(&filter)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No log entries found.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Time", "Entry", "Event", "Context", "Error"]);

    for entry in &entries {
        let event = if entry.event == EventKind::ExportFailed.as_str() {
            entry.event.red().to_string()
        } else {
            entry.event.clone()
        };
        table.add_row(vec![
            format_timestamp(entry.timestamp),
            entry.entry_point.clone(),
            event,
            entry_context(entry),
            entry.error_message.clone().unwrap_or_default(),
        ]);
    }

    println!("{}", table);

    // Full error chains only when the listing is about errors
    if filter.errors_only || filter.kind == Some(EventKind::ExportFailed) {
        for entry in entries.iter().filter(|e| e.error_details.is_some()) {
            println!();
            println!(
                "{} {}",
                format_timestamp(entry.timestamp).dimmed(),
                entry.error_details.as_deref().unwrap_or_default()
            );
        }
    }

    Ok(())
}

fn clear(older_than_days: u64, all: bool, force: bool, json: bool) -> Result<()> {
    let service = get_logging_service()?;

    if !force && !json {
        use dialoguer::Confirm;
        let prompt = if all {
            "Delete all log entries?".to_string()
        } else {
            format!("Delete log entries older than {} days?", older_than_days)
        };
        if !Confirm::new().with_prompt(prompt).default(false).interact()? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let prune = if all {
        Prune::All
    } else {
        let cutoff = Utc::now() - chrono::Duration::days(older_than_days as i64);
        Prune::Before(cutoff.timestamp_millis())
    };
    let deleted = service.prune(prune)?;

    if json {
        println!("{}", serde_json::json!({ "deleted": deleted }));
    } else {
        println!("Deleted {} log entries", deleted);
    }
    Ok(())
}

fn stats(json: bool) -> Result<()> {
    let service = get_logging_service()?;
    let summary = service.summary()?;
    let exports = service.export_stats()?;
    let db_path = service.db_path().to_path_buf();
    let size_bytes = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "summary": summary,
                "exports": exports,
                "database_path": db_path.to_string_lossy(),
                "database_size_bytes": size_bytes
            }))?
        );
        return Ok(());
    }

    println!("{}", "Log Statistics".bold());
    println!("  Total entries: {}", summary.total);
    println!("  Errors: {}", summary.errors);
    if let (Some(oldest), Some(newest)) = (summary.oldest, summary.newest) {
        println!(
            "  Span: {} .. {}",
            format_timestamp(oldest),
            format_timestamp(newest)
        );
    }
    println!("  Database: {}", db_path.display());
    println!("  Size: {}", crate::output::format_size(size_bytes));

    if exports.is_empty() {
        return Ok(());
    }

    println!();
    println!("{}", "Exports".bold());
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Currency", "Completed", "Failed", "Rows"]);
    for stat in &exports {
        let failed = if stat.failed > 0 {
            stat.failed.to_string().red().to_string()
        } else {
            stat.failed.to_string()
        };
        table.add_row(vec![
            stat.currency.clone(),
            stat.completed.to_string(),
            failed,
            stat.rows.to_string(),
        ]);
    }
    println!("{}", table);

    Ok(())
}

pub fn run(command: LogsCommands) -> Result<()> {
    match command {
        LogsCommands::List {
            limit,
            errors,
            event,
            json,
        } => list(
            LogFilter {
                kind: event,
                errors_only: errors,
                limit,
            },
            json,
        ),
        LogsCommands::Clear {
            older_than_days,
            all,
            force,
            json,
        } => clear(older_than_days, all, force, json),
        LogsCommands::Stats { json } => stats(json),
    }
}
