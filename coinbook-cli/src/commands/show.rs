//! Show command - preview export rows in the terminal

use anyhow::Result;
use colored::Colorize;

use coinbook_core::services::LogEvent;

use super::{get_context_for, get_logger, load_wallet, log_event, WalletArgs};
use crate::output;

pub fn run(args: WalletArgs, json: bool) -> Result<()> {
    let logger = get_logger();
    log_event(&logger, LogEvent::command("show"));

    let ctx = get_context_for(&args)?;
    let wallet = load_wallet(&ctx, &args.wallet, args.password.clone())?;
    let header = ctx.header()?;
    let rows = ctx.project_rows(&wallet);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "header": header,
                "rows": rows,
            }))?
        );
        return Ok(());
    }

    if let Some(description) = wallet.description() {
        println!("{}", description.bold());
    }
    println!("{}", wallet.source_path().display().to_string().dimmed());
    println!();

    if rows.is_empty() {
        println!("No transactions.");
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(header.to_vec());
    for row in &rows {
        table.add_row(row.fields().to_vec());
    }
    println!("{}", table);

    match ctx.converter.rate() {
        Some(rate) => println!(
            "{} transactions, 1 native unit = {} {}",
            rows.len(),
            rate.rate,
            rate.currency.code
        ),
        None => println!("{} transactions, no exchange rate set", rows.len()),
    }

    Ok(())
}
