//! Export command - write a wallet's transactions as CSV

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use coinbook_core::services::{LineEnding, LogEvent, OverwritePolicy};

use super::{get_context_for, get_logger, load_wallet, log_event, WalletArgs};
use crate::output;

/// Flags for the export command
#[derive(clap::Args, Debug)]
pub struct ExportArgs {
    #[command(flatten)]
    pub wallet: WalletArgs,
    /// Destination file, or `-` for stdout
    pub output: PathBuf,
    /// Column delimiter: comma, semicolon or tab (overrides settings)
    #[arg(long)]
    pub delimiter: Option<String>,
    /// Terminate lines with CRLF instead of LF
    #[arg(long)]
    pub crlf: bool,
    /// Fail instead of overwriting an existing file
    #[arg(long)]
    pub no_overwrite: bool,
    /// Output summary as JSON
    #[arg(long)]
    pub json: bool,
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

pub fn run(args: ExportArgs) -> Result<()> {
    let logger = get_logger();
    log_event(&logger, LogEvent::command("export"));

    let mut ctx = get_context_for(&args.wallet)?;
    if let Some(delimiter) = args.delimiter {
        ctx.config.csv_delimiter = delimiter;
    }

    let wallet = load_wallet(&ctx, &args.wallet.wallet, args.wallet.password.clone())?;

    let mut options = ctx.export_options();
    if args.crlf {
        options.line_ending = LineEnding::CrLf;
    }
    if args.no_overwrite {
        options.overwrite = OverwritePolicy::FailIfExists;
    }

    let currency = ctx.converter.currency();
    let to_stdout = args.output.as_os_str() == "-";

    let progress = (!args.json && !to_stdout).then(|| spinner("Exporting transactions..."));
    let result = if to_stdout {
        ctx.export_to_writer(&wallet, io::stdout().lock(), options)
    } else {
        ctx.export_with(&wallet, &args.output, options)
    };
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let summary = match result {
        Ok(summary) => summary,
        Err(e) => {
            let e = anyhow::Error::from(e);
            log_event(&logger, LogEvent::export_failed(currency.code, &e));
            return Err(e);
        }
    };

    log_event(&logger, LogEvent::export_completed(currency.code, summary.rows));

    if to_stdout {
        return Ok(());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    if ctx.converter.rate().is_none() {
        output::warning(&format!(
            "No {} exchange rate set; the fiat column was left empty. Use 'cb rate set <rate>' or --rate.",
            currency.code
        ));
    }
    output::success(&format!(
        "Exported {} transactions to {}",
        summary.rows,
        summary.path.display()
    ));
    println!(
        "  {} {}  {} {}",
        "Size:".dimmed(),
        output::format_size(summary.bytes),
        "SHA-256:".dimmed(),
        summary.sha256
    );

    Ok(())
}
