//! Coinbook CLI - wallet transaction export in your terminal

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{currency, demo, export, logs, rate, show};

/// Coinbook - export wallet transactions to CSV
#[derive(Parser)]
#[command(name = "cb", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a wallet's transactions to a CSV file
    Export(export::ExportArgs),

    /// Show the rows an export would contain
    Show {
        #[command(flatten)]
        wallet: commands::WalletArgs,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage the stored exchange rate
    Rate {
        #[command(subcommand)]
        command: rate::RateCommands,
    },

    /// Manage the fiat display currency
    Currency {
        #[command(subcommand)]
        command: currency::CurrencyCommands,
    },

    /// Write a demo wallet to try the other commands on
    Demo {
        /// Destination (.json or .duckdb)
        path: PathBuf,
    },

    /// View and manage the event log
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Export(args) => export::run(args),
        Commands::Show { wallet, json } => show::run(wallet, json),
        Commands::Rate { command } => rate::run(command),
        Commands::Currency { command } => currency::run(command),
        Commands::Demo { path } => demo::run(path),
        Commands::Logs { command } => logs::run(command),
    }
}
