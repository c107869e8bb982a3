//! Currency command - choose the fiat display currency

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use coinbook_core::services::LogEvent;
use coinbook_core::{FiatCurrency, SUPPORTED_CURRENCIES};

use super::{get_context, get_logger, log_event};
use crate::output;

#[derive(Subcommand)]
pub enum CurrencyCommands {
    /// Set the preferred fiat currency
    Set {
        /// ISO 4217 code, e.g. EUR
        code: String,
    },
    /// List supported currencies
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(command: CurrencyCommands) -> Result<()> {
    let logger = get_logger();

    match command {
        CurrencyCommands::Set { code } => {
            log_event(&logger, LogEvent::command("currency set"));
            let currency = FiatCurrency::from_code(&code)?;

            let mut ctx = get_context()?;
            let changed = ctx.converter.currency() != currency;
            ctx.converter.initialise(currency.code)?;
            ctx.config.fiat_currency = currency.code.to_string();
            if changed {
                // the stored rate was quoted in the previous currency
                ctx.config.exchange_rate = None;
            }
            ctx.save_config()?;

            log_event(&logger, LogEvent::currency_set(currency.code));
            output::success(&format!("Fiat currency set to {} ({})", currency.code, currency.symbol));
            if changed {
                output::warning("Stored exchange rate cleared; set a new one with 'cb rate set <rate>'");
            }
        }
        CurrencyCommands::List { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(SUPPORTED_CURRENCIES)?);
                return Ok(());
            }

            let current = get_context()
                .map(|ctx| ctx.converter.currency())
                .unwrap_or_default();

            let mut table = output::create_table();
            table.set_header(vec!["Code", "Symbol", "Decimals", ""]);
            for currency in SUPPORTED_CURRENCIES {
                let marker = if *currency == current {
                    "current".green().to_string()
                } else {
                    String::new()
                };
                table.add_row(vec![
                    currency.code.to_string(),
                    currency.symbol.to_string(),
                    currency.precision.to_string(),
                    marker,
                ]);
            }
            println!("{}", table);
        }
    }

    Ok(())
}
